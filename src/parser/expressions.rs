use super::*;

impl<'a> Parser<'a> {
    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_assignment_expression()?;
        if self.current == Token::Comma {
            let mut exprs = vec![expr];
            while self.current == Token::Comma {
                self.advance()?;
                exprs.push(self.parse_assignment_expression()?);
            }
            Ok(Expression::Sequence(exprs))
        } else {
            Ok(expr)
        }
    }

    /// Runs `f` with the `in` operator allowed again, as inside brackets.
    fn with_in_allowed<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let result = f(self);
        self.no_in = saved_no_in;
        result
    }

    fn validate_assignment_target(&self, expr: &Expression) -> Result<(), ParseError> {
        match expr {
            Expression::Identifier(name) => {
                if self.strict && (name == "eval" || name == "arguments") {
                    return Err(self.error("Assignment to 'eval' or 'arguments' in strict mode"));
                }
                Ok(())
            }
            Expression::Member(..) => Ok(()),
            _ => Err(self.error("Invalid left-hand side in assignment")),
        }
    }

    pub(super) fn parse_assignment_expression(&mut self) -> Result<Expression, ParseError> {
        let cover_allowed = std::mem::take(&mut self.cover_allowed);
        let left = self.parse_conditional_expression()?;

        let op = match &self.current {
            Token::Assign => AssignOp::Assign,
            Token::PlusAssign => AssignOp::AddAssign,
            Token::MinusAssign => AssignOp::SubAssign,
            Token::StarAssign => AssignOp::MulAssign,
            Token::SlashAssign => AssignOp::DivAssign,
            Token::PercentAssign => AssignOp::ModAssign,
            Token::ExponentAssign => AssignOp::ExpAssign,
            Token::LeftShiftAssign => AssignOp::LShiftAssign,
            Token::RightShiftAssign => AssignOp::RShiftAssign,
            Token::UnsignedRightShiftAssign => AssignOp::URShiftAssign,
            Token::AmpersandAssign => AssignOp::BitAndAssign,
            Token::PipeAssign => AssignOp::BitOrAssign,
            Token::CaretAssign => AssignOp::BitXorAssign,
            _ => {
                if !cover_allowed && Self::has_cover_initialized_name(&left) {
                    return Err(self.error("Invalid shorthand property initializer"));
                }
                return Ok(left);
            }
        };

        // `{a = 1}` is only valid as a cover for a pattern, which plain
        // assignment does not destructure here.
        if op == AssignOp::Assign && matches!(left, Expression::Array(_) | Expression::Object(_)) {
            return Err(self.error("Destructuring assignment is not supported"));
        }
        self.validate_assignment_target(&left)?;
        self.advance()?;
        let right = self.parse_assignment_expression()?;
        Ok(Expression::Assign(op, Box::new(left), Box::new(right)))
    }

    fn parse_conditional_expression(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_nullish_coalescing()?;
        if self.current == Token::Question {
            self.advance()?;
            let consequent = self.with_in_allowed(Self::parse_assignment_expression)?;
            self.eat(&Token::Colon)?;
            let alternate = self.parse_assignment_expression()?;
            Ok(Expression::Conditional(
                Box::new(expr),
                Box::new(consequent),
                Box::new(alternate),
            ))
        } else {
            Ok(expr)
        }
    }

    fn parse_nullish_coalescing(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_logical_or()?;
        while self.current == Token::NullishCoalescing {
            self.advance()?;
            let right = self.parse_logical_or()?;
            left = Expression::Logical(
                LogicalOp::NullishCoalescing,
                Box::new(left),
                Box::new(right),
            );
        }
        Ok(left)
    }

    fn parse_logical_or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_logical_and()?;
        while self.current == Token::LogicalOr {
            self.advance()?;
            let right = self.parse_logical_and()?;
            left = Expression::Logical(LogicalOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_binary(0)?;
        while self.current == Token::LogicalAnd {
            self.advance()?;
            let right = self.parse_binary(0)?;
            left = Expression::Logical(LogicalOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// Binding power of the current token as a left-associative binary
    /// operator, from `|` (lowest) to `* / %`.
    fn binary_operator(&self) -> Option<(BinaryOp, u8)> {
        let op = match &self.current {
            Token::Pipe => (BinaryOp::BitOr, 1),
            Token::Caret => (BinaryOp::BitXor, 2),
            Token::Ampersand => (BinaryOp::BitAnd, 3),
            Token::Equal => (BinaryOp::Eq, 4),
            Token::NotEqual => (BinaryOp::NotEq, 4),
            Token::StrictEqual => (BinaryOp::StrictEq, 4),
            Token::StrictNotEqual => (BinaryOp::StrictNotEq, 4),
            Token::LessThan => (BinaryOp::Lt, 5),
            Token::GreaterThan => (BinaryOp::Gt, 5),
            Token::LessThanEqual => (BinaryOp::LtEq, 5),
            Token::GreaterThanEqual => (BinaryOp::GtEq, 5),
            Token::Keyword(Keyword::Instanceof) => (BinaryOp::Instanceof, 5),
            Token::Keyword(Keyword::In) if !self.no_in => (BinaryOp::In, 5),
            Token::LeftShift => (BinaryOp::LShift, 6),
            Token::RightShift => (BinaryOp::RShift, 6),
            Token::UnsignedRightShift => (BinaryOp::URShift, 6),
            Token::Plus => (BinaryOp::Add, 7),
            Token::Minus => (BinaryOp::Sub, 7),
            Token::Star => (BinaryOp::Mul, 8),
            Token::Slash => (BinaryOp::Div, 8),
            Token::Percent => (BinaryOp::Mod, 8),
            _ => return None,
        };
        Some(op)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expression, ParseError> {
        let mut left = self.parse_exponentiation()?;
        while let Some((op, prec)) = self.binary_operator() {
            if prec <= min_prec {
                break;
            }
            self.advance()?;
            let right = self.parse_binary(prec)?;
            left = Expression::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_exponentiation(&mut self) -> Result<Expression, ParseError> {
        let starts_with_unary = matches!(
            self.current,
            Token::Plus
                | Token::Minus
                | Token::Bang
                | Token::Tilde
                | Token::Keyword(Keyword::Typeof)
                | Token::Keyword(Keyword::Void)
                | Token::Keyword(Keyword::Delete)
        );
        let base = self.parse_unary()?;
        if self.current == Token::Exponent {
            if starts_with_unary {
                return Err(self.error(
                    "Unary operator used immediately before exponentiation expression",
                ));
            }
            self.advance()?;
            let exp = self.parse_exponentiation()?; // right-associative
            Ok(Expression::Binary(
                BinaryOp::Exp,
                Box::new(base),
                Box::new(exp),
            ))
        } else {
            Ok(base)
        }
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let op = match &self.current {
            Token::Keyword(Keyword::Delete) => {
                self.advance()?;
                let expr = self.parse_unary()?;
                if self.strict && matches!(&expr, Expression::Identifier(_)) {
                    return Err(self.error("Delete of an unqualified identifier in strict mode"));
                }
                return Ok(Expression::Delete(Box::new(expr)));
            }
            Token::Keyword(Keyword::Void) => {
                self.advance()?;
                return Ok(Expression::Void(Box::new(self.parse_unary()?)));
            }
            Token::Keyword(Keyword::Typeof) => {
                self.advance()?;
                return Ok(Expression::Typeof(Box::new(self.parse_unary()?)));
            }
            Token::Increment | Token::Decrement => {
                let op = if self.current == Token::Increment {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                self.advance()?;
                let expr = self.parse_unary()?;
                self.validate_assignment_target(&expr)?;
                return Ok(Expression::Update(op, true, Box::new(expr)));
            }
            Token::Plus => UnaryOp::Plus,
            Token::Minus => UnaryOp::Minus,
            Token::Tilde => UnaryOp::BitNot,
            Token::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.advance()?;
        let expr = self.parse_unary()?;
        Ok(Expression::Unary(op, Box::new(expr)))
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_left_hand_side_expression()?;
        if !self.prev_line_terminator {
            let op = match self.current {
                Token::Increment => Some(UpdateOp::Increment),
                Token::Decrement => Some(UpdateOp::Decrement),
                _ => None,
            };
            if let Some(op) = op {
                self.validate_assignment_target(&expr)?;
                self.advance()?;
                return Ok(Expression::Update(op, false, Box::new(expr)));
            }
        }
        Ok(expr)
    }

    fn parse_dot_member_property(&mut self) -> Result<MemberKey, ParseError> {
        let name = match &self.current {
            Token::Identifier(n) => n.clone(),
            Token::Keyword(kw) => kw.to_string(),
            Token::BooleanLiteral(b) => b.to_string(),
            Token::NullLiteral => "null".to_string(),
            _ => return Err(self.error("Expected identifier after '.'")),
        };
        self.advance()?;
        Ok(MemberKey::Dot(name))
    }

    /// `.name` and `[expr]` suffixes; calls too unless parsing a `new` callee.
    fn parse_member_suffixes(
        &mut self,
        mut expr: Expression,
        allow_call: bool,
    ) -> Result<Expression, ParseError> {
        loop {
            match &self.current {
                Token::Dot => {
                    self.advance()?;
                    let prop = self.parse_dot_member_property()?;
                    expr = Expression::Member(Box::new(expr), prop);
                }
                Token::LeftBracket => {
                    self.advance()?;
                    let prop = self.with_in_allowed(Self::parse_expression)?;
                    self.eat(&Token::RightBracket)?;
                    expr = Expression::Member(
                        Box::new(expr),
                        MemberKey::Computed(Box::new(prop)),
                    );
                }
                Token::LeftParen if allow_call => {
                    let args = self.parse_arguments()?;
                    expr = Expression::Call(Box::new(expr), args);
                }
                _ => return Ok(expr),
            }
        }
    }

    pub(super) fn parse_left_hand_side_expression(&mut self) -> Result<Expression, ParseError> {
        let expr = if self.current == Token::Keyword(Keyword::New) {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };
        self.parse_member_suffixes(expr, true)
    }

    fn parse_new_expression(&mut self) -> Result<Expression, ParseError> {
        self.advance()?; // new
        let callee = if self.current == Token::Keyword(Keyword::New) {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };
        let callee = self.parse_member_suffixes(callee, false)?;
        let args = if self.current == Token::LeftParen {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expression::New(Box::new(callee), args))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        self.eat(&Token::LeftParen)?;
        let args = self.with_in_allowed(|p| {
            let mut args = Vec::new();
            while p.current != Token::RightParen {
                args.push(p.parse_assignment_expression()?);
                if p.current == Token::Comma {
                    p.advance()?;
                } else if p.current != Token::RightParen {
                    return Err(p.error(format!("Unexpected token {:?}", p.current)));
                }
            }
            Ok(args)
        })?;
        self.eat(&Token::RightParen)?;
        Ok(args)
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, ParseError> {
        match &self.current {
            Token::Keyword(Keyword::This) => {
                self.advance()?;
                Ok(Expression::This)
            }
            Token::Identifier(_) | Token::Keyword(Keyword::Let) => {
                let Some(name) = self.current_identifier_name() else {
                    return Err(self.error(format!("Unexpected reserved word {:?}", self.current)));
                };
                self.advance()?;
                if self.current == Token::Arrow && !self.prev_line_terminator {
                    self.check_strict_binding_identifier(&name)?;
                    return self.parse_arrow_function(vec![Pattern::Identifier(name)]);
                }
                Ok(Expression::Identifier(name))
            }
            Token::NullLiteral => {
                self.advance()?;
                Ok(Expression::Literal(Literal::Null))
            }
            Token::BooleanLiteral(b) => {
                let b = *b;
                self.advance()?;
                Ok(Expression::Literal(Literal::Boolean(b)))
            }
            Token::NumericLiteral(n) => {
                let n = *n;
                self.advance()?;
                Ok(Expression::Literal(Literal::Number(n)))
            }
            Token::LegacyOctalLiteral(n) => {
                if self.strict {
                    return Err(self.error("Octal literals are not allowed in strict mode"));
                }
                let n = *n;
                self.advance()?;
                Ok(Expression::Literal(Literal::Number(n)))
            }
            Token::StringLiteral(s) => {
                let s = s.clone();
                self.advance()?;
                Ok(Expression::Literal(Literal::String(s)))
            }
            Token::LeftParen => self.parse_parenthesized_or_arrow(),
            Token::LeftBracket => self.parse_array_literal(),
            Token::LeftBrace => self.parse_object_literal(),
            Token::Keyword(Keyword::Function) => self.parse_function_expression(),
            Token::Eof => Err(self.error("Unexpected end of input")),
            _ => Err(self.error(format!("Unexpected token: {:?}", self.current))),
        }
    }

    /// `( ... )`: a parenthesized expression or the parameter list of an
    /// arrow function, decided once the closing paren is seen.
    fn parse_parenthesized_or_arrow(&mut self) -> Result<Expression, ParseError> {
        self.advance()?; // (
        let (exprs, rest) = self.with_in_allowed(|p| {
            let mut exprs = Vec::new();
            let mut rest = None;
            while p.current != Token::RightParen {
                if p.current == Token::Ellipsis {
                    p.advance()?;
                    rest = Some(p.parse_binding_pattern()?);
                    break;
                }
                p.cover_allowed = true;
                exprs.push(p.parse_assignment_expression()?);
                if p.current == Token::Comma {
                    p.advance()?;
                } else if p.current != Token::RightParen {
                    return Err(p.error(format!("Unexpected token {:?}", p.current)));
                }
            }
            Ok((exprs, rest))
        })?;
        self.eat(&Token::RightParen)?;

        if self.current == Token::Arrow && !self.prev_line_terminator {
            let mut params: Vec<Pattern> = exprs
                .into_iter()
                .map(|e| expr_to_pattern(e, self.strict))
                .collect::<Result<_, _>>()?;
            if params.iter().any(|p| matches!(p, Pattern::Member(_))) {
                return Err(self.error("Invalid destructuring assignment target"));
            }
            if let Some(rest) = rest {
                params.push(Pattern::Rest(Box::new(rest)));
            }
            return self.parse_arrow_function(params);
        }

        if rest.is_some() || exprs.is_empty() {
            return Err(self.error("Unexpected token )"));
        }
        if exprs.iter().any(Self::has_cover_initialized_name) {
            return Err(self.error("Invalid shorthand property initializer"));
        }
        let mut exprs = exprs;
        if exprs.len() == 1 {
            return Ok(exprs.remove(0));
        }
        Ok(Expression::Sequence(exprs))
    }

    /// Everything after the arrow's parameter list, from `=>`.
    fn parse_arrow_function(&mut self, params: Vec<Pattern>) -> Result<Expression, ParseError> {
        self.eat(&Token::Arrow)?;
        let (body, body_strict) = if self.current == Token::LeftBrace {
            self.parse_function_body()?
        } else {
            let expr = self.parse_assignment_expression()?;
            (vec![Statement::Return(Some(expr))], false)
        };
        let def = self.finish_function(None, FunctionKind::Arrow, params, body, body_strict)?;
        Ok(Expression::Function(def))
    }

    fn parse_array_literal(&mut self) -> Result<Expression, ParseError> {
        self.advance()?; // [
        let elements = self.with_in_allowed(|p| {
            let mut elements = Vec::new();
            while p.current != Token::RightBracket {
                if p.current == Token::Comma {
                    elements.push(None);
                    p.advance()?;
                    continue;
                }
                elements.push(Some(p.parse_assignment_expression()?));
                if p.current == Token::Comma {
                    p.advance()?;
                } else if p.current != Token::RightBracket {
                    return Err(p.error(format!("Unexpected token {:?}", p.current)));
                }
            }
            Ok(elements)
        })?;
        self.eat(&Token::RightBracket)?;
        Ok(Expression::Array(elements))
    }

    fn has_cover_initialized_name(expr: &Expression) -> bool {
        if let Expression::Object(props) = expr {
            props.iter().any(|p| {
                p.shorthand && matches!(&p.value, Expression::Assign(AssignOp::Assign, ..))
            })
        } else {
            false
        }
    }

    fn parse_object_literal(&mut self) -> Result<Expression, ParseError> {
        self.advance()?; // {
        let props = self.with_in_allowed(|p| {
            let mut props = Vec::new();
            while p.current != Token::RightBrace {
                props.push(p.parse_object_property()?);
                if p.current == Token::Comma {
                    p.advance()?;
                } else if p.current != Token::RightBrace {
                    return Err(p.error(format!("Unexpected token {:?}", p.current)));
                }
            }
            Ok(props)
        })?;
        self.eat(&Token::RightBrace)?;
        Ok(Expression::Object(props))
    }

    fn parse_object_property(&mut self) -> Result<Property, ParseError> {
        let shorthand_name = self.current_identifier_name();
        let key = self.parse_property_name()?;
        match &self.current {
            Token::Colon => {
                self.advance()?;
                let value = self.parse_assignment_expression()?;
                Ok(Property {
                    key,
                    value,
                    shorthand: false,
                })
            }
            Token::LeftParen => {
                let name = match &key {
                    PropertyKey::Identifier(n) | PropertyKey::String(n) => Some(n.clone()),
                    PropertyKey::Number(n) => Some(crate::types::number_ops::to_string(*n)),
                    PropertyKey::Computed(_) => None,
                };
                let def = self.parse_function_rest(name, FunctionKind::Method)?;
                Ok(Property {
                    key,
                    value: Expression::Function(def),
                    shorthand: false,
                })
            }
            _ => {
                let Some(name) = shorthand_name else {
                    return Err(self.error(format!("Unexpected token {:?}", self.current)));
                };
                let value = if self.current == Token::Assign {
                    // CoverInitializedName, only valid once reinterpreted
                    // as a pattern.
                    self.advance()?;
                    let init = self.parse_assignment_expression()?;
                    Expression::Assign(
                        AssignOp::Assign,
                        Box::new(Expression::Identifier(name)),
                        Box::new(init),
                    )
                } else {
                    Expression::Identifier(name)
                };
                Ok(Property {
                    key,
                    value,
                    shorthand: true,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parser::Parser;

    fn expr(src: &str) -> Expression {
        let prog = Parser::new(src).unwrap().parse_program().unwrap();
        match prog.body.into_iter().next() {
            Some(Statement::Expression(e)) => e,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        let e = expr("1 + 2 * 3");
        let Expression::Binary(BinaryOp::Add, _, right) = e else {
            panic!()
        };
        assert!(matches!(*right, Expression::Binary(BinaryOp::Mul, ..)));
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let e = expr("1 - 2 - 3");
        let Expression::Binary(BinaryOp::Sub, left, _) = e else {
            panic!()
        };
        assert!(matches!(*left, Expression::Binary(BinaryOp::Sub, ..)));
    }

    #[test]
    fn shift_below_additive_above_relational() {
        let e = expr("1 << 2 + 3 < 4");
        let Expression::Binary(BinaryOp::Lt, left, _) = e else {
            panic!()
        };
        let Expression::Binary(BinaryOp::LShift, _, shifted) = *left else {
            panic!()
        };
        assert!(matches!(*shifted, Expression::Binary(BinaryOp::Add, ..)));
    }

    #[test]
    fn exponent_is_right_associative() {
        let e = expr("2 ** 3 ** 2");
        let Expression::Binary(BinaryOp::Exp, _, right) = e else {
            panic!()
        };
        assert!(matches!(*right, Expression::Binary(BinaryOp::Exp, ..)));
    }

    #[test]
    fn update_expressions() {
        assert!(matches!(
            expr("a.x++"),
            Expression::Update(UpdateOp::Increment, false, _)
        ));
        assert!(matches!(
            expr("--a[0]"),
            Expression::Update(UpdateOp::Decrement, true, _)
        ));
    }

    #[test]
    fn new_binds_arguments_before_member_call() {
        let e = expr("new F(2).x");
        let Expression::Member(obj, MemberKey::Dot(name)) = e else {
            panic!()
        };
        assert_eq!(name, "x");
        assert!(matches!(*obj, Expression::New(_, ref args) if args.len() == 1));
    }

    #[test]
    fn keywords_as_property_names() {
        let e = expr("a.delete + b.null");
        assert!(matches!(e, Expression::Binary(BinaryOp::Add, ..)));
        let e = expr("({ in: 1, if: 2 })");
        assert!(matches!(e, Expression::Object(ref p) if p.len() == 2));
    }

    #[test]
    fn arrow_forms() {
        for src in ["x => x", "() => 1", "(a, b) => a", "(a = 1, ...r) => r", "({a}) => a"] {
            let Expression::Function(f) = expr(src) else {
                panic!("{src} is not a function")
            };
            assert!(f.is_arrow(), "{src}");
        }
    }

    #[test]
    fn parenthesized_sequence() {
        assert!(matches!(expr("(1, 2)"), Expression::Sequence(ref v) if v.len() == 2));
    }

    #[test]
    fn method_shorthand_is_named() {
        let Expression::Object(props) = expr("({ m() { return 1; } })") else {
            panic!()
        };
        let Expression::Function(f) = &props[0].value else {
            panic!()
        };
        assert_eq!(f.name.as_deref(), Some("m"));
        assert_eq!(f.kind, FunctionKind::Method);
    }

    #[test]
    fn typeof_delete_void() {
        assert!(matches!(expr("typeof x"), Expression::Typeof(_)));
        assert!(matches!(expr("delete a.x"), Expression::Delete(_)));
        assert!(matches!(expr("void 0"), Expression::Void(_)));
    }

    #[test]
    fn rejects_cover_initializer_outside_pattern() {
        assert!(
            Parser::new("({a = 1});")
                .unwrap()
                .parse_program()
                .is_err()
        );
    }
}
