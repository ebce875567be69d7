use super::*;
use std::rc::Rc;

impl<'a> Parser<'a> {
    pub(super) fn parse_var_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // var
        let bindings = self.parse_binding_list(VarKind::Var)?;
        self.eat_semicolon()?;
        Ok(Statement::Decl(VarDecl {
            kind: VarKind::Var,
            bindings,
        }))
    }

    pub(super) fn parse_lexical_declaration(&mut self) -> Result<Statement, ParseError> {
        let kind = match &self.current {
            Token::Keyword(Keyword::Let) => VarKind::Let,
            Token::Keyword(Keyword::Const) => VarKind::Const,
            _ => return Err(self.error("Expected let or const")),
        };
        self.advance()?;
        let bindings = self.parse_binding_list(kind)?;
        if kind == VarKind::Const && bindings.iter().any(|d| d.init.is_none()) {
            return Err(self.error("Missing initializer in const declaration"));
        }
        self.eat_semicolon()?;
        Ok(Statement::Decl(VarDecl { kind, bindings }))
    }

    /// Declarators up to the end of the list. `const` initializers are
    /// checked by the caller because `for (const k in o)` has none.
    pub(super) fn parse_binding_list(
        &mut self,
        kind: VarKind,
    ) -> Result<Vec<VarBinding>, ParseError> {
        let mut decls = Vec::new();
        loop {
            let pattern = self.parse_binding_pattern()?;
            if kind.is_lexical() {
                let mut names = Vec::new();
                pattern.bound_names(&mut names);
                if names.iter().any(|n| n == "let") {
                    return Err(self
                        .error("'let' is not allowed as a variable name in lexical bindings"));
                }
            }
            let init = if self.current == Token::Assign {
                self.advance()?;
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };
            decls.push(VarBinding { pattern, init });
            if self.current == Token::Comma {
                self.advance()?;
            } else {
                break;
            }
        }
        Ok(decls)
    }

    pub(super) fn parse_binding_pattern(&mut self) -> Result<Pattern, ParseError> {
        if let Some(name) = self.current_identifier_name() {
            self.check_strict_binding_identifier(&name)?;
            self.advance()?;
            return Ok(Pattern::Identifier(name));
        }
        match &self.current {
            Token::LeftBracket => self.parse_array_pattern(),
            Token::LeftBrace => self.parse_object_pattern(),
            _ => Err(self.error(format!("Expected binding pattern, got {:?}", self.current))),
        }
    }

    /// A binding element: a pattern with an optional `= default`.
    fn parse_binding_element(&mut self) -> Result<Pattern, ParseError> {
        let pat = self.parse_binding_pattern()?;
        if self.current == Token::Assign {
            self.advance()?;
            let prev_no_in = std::mem::replace(&mut self.no_in, false);
            let default = self.parse_assignment_expression();
            self.no_in = prev_no_in;
            return Ok(Pattern::Assign(Box::new(pat), Box::new(default?)));
        }
        Ok(pat)
    }

    fn parse_array_pattern(&mut self) -> Result<Pattern, ParseError> {
        self.eat(&Token::LeftBracket)?;
        let mut elements = Vec::new();
        while self.current != Token::RightBracket {
            if self.current == Token::Comma {
                elements.push(None);
                self.advance()?;
                continue;
            }
            if self.current == Token::Ellipsis {
                self.advance()?;
                let rest = self.parse_binding_pattern()?;
                elements.push(Some(Pattern::Rest(Box::new(rest))));
                break;
            }
            elements.push(Some(self.parse_binding_element()?));
            if self.current == Token::Comma {
                self.advance()?;
            }
        }
        self.eat(&Token::RightBracket)?;
        Ok(Pattern::Array(elements))
    }

    fn parse_object_pattern(&mut self) -> Result<Pattern, ParseError> {
        self.eat(&Token::LeftBrace)?;
        let mut props = Vec::new();
        while self.current != Token::RightBrace {
            let shorthand_name = self.current_identifier_name();
            let key = self.parse_property_name()?;
            if self.current == Token::Colon {
                self.advance()?;
                let pat = self.parse_binding_element()?;
                props.push(PatternProp::KeyValue(key, pat));
            } else {
                let Some(name) = shorthand_name else {
                    return Err(self.error("Expected identifier for shorthand pattern"));
                };
                self.check_strict_binding_identifier(&name)?;
                if self.current == Token::Assign {
                    self.advance()?;
                    let default = self.parse_assignment_expression()?;
                    let pat =
                        Pattern::Assign(Box::new(Pattern::Identifier(name)), Box::new(default));
                    props.push(PatternProp::KeyValue(key, pat));
                } else {
                    props.push(PatternProp::Shorthand(name));
                }
            }
            if self.current == Token::Comma {
                self.advance()?;
            } else if self.current != Token::RightBrace {
                return Err(self.error(format!("Unexpected token {:?}", self.current)));
            }
        }
        self.eat(&Token::RightBrace)?;
        Ok(Pattern::Object(props))
    }

    pub(super) fn parse_property_name(&mut self) -> Result<PropertyKey, ParseError> {
        let key = match &self.current {
            Token::LeftBracket => {
                self.advance()?;
                let prev_no_in = std::mem::replace(&mut self.no_in, false);
                let expr = self.parse_assignment_expression();
                self.no_in = prev_no_in;
                self.eat(&Token::RightBracket)?;
                return Ok(PropertyKey::Computed(Box::new(expr?)));
            }
            Token::Identifier(name) => PropertyKey::Identifier(name.clone()),
            Token::Keyword(kw) => PropertyKey::Identifier(kw.to_string()),
            Token::BooleanLiteral(b) => PropertyKey::Identifier(b.to_string()),
            Token::NullLiteral => PropertyKey::Identifier("null".to_string()),
            Token::StringLiteral(s) => PropertyKey::String(s.clone()),
            Token::NumericLiteral(n) => PropertyKey::Number(*n),
            Token::LegacyOctalLiteral(n) => {
                if self.strict {
                    return Err(self.error("Octal literals are not allowed in strict mode"));
                }
                PropertyKey::Number(*n)
            }
            _ => return Err(self.error(format!("Expected property name, got {:?}", self.current))),
        };
        self.advance()?;
        Ok(key)
    }

    pub(super) fn parse_function_declaration(&mut self) -> Result<Statement, ParseError> {
        self.eat(&Token::Keyword(Keyword::Function))?;
        let name = match self.current_identifier_name() {
            Some(n) => {
                self.check_strict_binding_identifier(&n)?;
                self.advance()?;
                n
            }
            None => return Err(self.error("Expected function name")),
        };
        let def = self.parse_function_rest(Some(name), FunctionKind::Declaration)?;
        Ok(Statement::Function(def))
    }

    pub(super) fn parse_function_expression(&mut self) -> Result<Expression, ParseError> {
        self.eat(&Token::Keyword(Keyword::Function))?;
        let name = match self.current_identifier_name() {
            Some(n) => {
                self.check_strict_binding_identifier(&n)?;
                self.advance()?;
                Some(n)
            }
            None if self.current == Token::LeftParen => None,
            None => return Err(self.error(format!("Unexpected token {:?}", self.current))),
        };
        let def = self.parse_function_rest(name, FunctionKind::Expression)?;
        Ok(Expression::Function(def))
    }

    /// Parameters and body of a `function` form, from the opening `(`.
    pub(super) fn parse_function_rest(
        &mut self,
        name: Option<String>,
        kind: FunctionKind,
    ) -> Result<Rc<FunctionDef>, ParseError> {
        let params = self.parse_formal_parameters()?;
        let (body, body_strict) = self.parse_function_body()?;
        self.finish_function(name, kind, params, body, body_strict)
    }

    /// Applies the checks that depend on the body's strictness, which is
    /// only known after the parameters have been parsed.
    pub(super) fn finish_function(
        &self,
        name: Option<String>,
        kind: FunctionKind,
        params: Vec<Pattern>,
        body: Vec<Statement>,
        body_strict: bool,
    ) -> Result<Rc<FunctionDef>, ParseError> {
        let is_strict = self.strict || body_strict;
        let simple = params.iter().all(|p| matches!(p, Pattern::Identifier(_)));
        if body_strict && !simple {
            return Err(self.error(
                "Illegal 'use strict' directive in function with non-simple parameter list",
            ));
        }
        if is_strict {
            let mut names: Vec<String> = name.iter().cloned().collect();
            for p in &params {
                p.bound_names(&mut names);
            }
            if let Some(n) = names.iter().find(|n| *n == "eval" || *n == "arguments") {
                return Err(self.error(format!(
                    "'{n}' can't be used as a binding identifier in strict mode"
                )));
            }
        }
        if is_strict || !simple || kind == FunctionKind::Arrow {
            self.check_duplicate_params(&params)?;
        }
        Ok(Rc::new(FunctionDef {
            name,
            kind,
            params,
            body,
            is_strict,
        }))
    }

    pub(super) fn parse_formal_parameters(&mut self) -> Result<Vec<Pattern>, ParseError> {
        self.eat(&Token::LeftParen)?;
        let prev_no_in = std::mem::replace(&mut self.no_in, false);
        let mut params = Vec::new();
        let result = loop {
            if self.current == Token::RightParen {
                break Ok(());
            }
            if self.current == Token::Ellipsis {
                self.advance()?;
                let pat = self.parse_binding_pattern()?;
                params.push(Pattern::Rest(Box::new(pat)));
                break Ok(());
            }
            match self.parse_binding_element() {
                Ok(pat) => params.push(pat),
                Err(e) => break Err(e),
            }
            if self.current == Token::Comma {
                self.advance()?;
            } else if self.current != Token::RightParen {
                break Err(self.error(format!("Unexpected token {:?}", self.current)));
            }
        };
        self.no_in = prev_no_in;
        result?;
        self.eat(&Token::RightParen)?;
        Ok(params)
    }

    /// `{ ... }` of a function. Returns the statements and whether the body
    /// opted into strict mode itself.
    pub(super) fn parse_function_body(&mut self) -> Result<(Vec<Statement>, bool), ParseError> {
        self.eat(&Token::LeftBrace)?;
        let prev_strict = self.strict;
        let prev_iteration = std::mem::replace(&mut self.in_iteration, 0);
        let prev_switch = std::mem::replace(&mut self.in_switch, 0);
        let prev_labels = std::mem::take(&mut self.labels);
        let prev_no_in = std::mem::replace(&mut self.no_in, false);
        self.in_function += 1;

        let result = self.parse_directive_body(&Token::RightBrace);

        self.in_function -= 1;
        self.in_iteration = prev_iteration;
        self.in_switch = prev_switch;
        self.labels = prev_labels;
        self.no_in = prev_no_in;
        let (stmts, has_use_strict) = result?;
        // Restore before the `}` so the following token is lexed in the
        // enclosing mode.
        self.set_strict(prev_strict);
        self.eat(&Token::RightBrace)?;
        Ok((stmts, has_use_strict))
    }
}
