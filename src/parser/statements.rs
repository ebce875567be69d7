use super::*;

impl<'a> Parser<'a> {
    pub(super) fn parse_statement_or_declaration(&mut self) -> Result<Statement, ParseError> {
        if self.at_let_declaration()? {
            return self.parse_lexical_declaration();
        }
        match &self.current {
            Token::Keyword(Keyword::Function) => self.parse_function_declaration(),
            Token::Keyword(Keyword::Const) => self.parse_lexical_declaration(),
            _ => self.parse_statement(),
        }
    }

    /// `let` starts a declaration only when a binding follows it; in sloppy
    /// code it is otherwise an identifier.
    fn at_let_declaration(&mut self) -> Result<bool, ParseError> {
        if self.current != Token::Keyword(Keyword::Let) {
            return Ok(false);
        }
        if self.strict {
            return Ok(true);
        }
        let (next, _) = self.peek_next()?;
        Ok(matches!(
            next,
            Token::Identifier(_) | Token::LeftBracket | Token::LeftBrace | Token::Keyword(Keyword::Let)
        ))
    }

    /// Consumes `token` if it is current.
    fn eat_if(&mut self, token: &Token) -> Result<bool, ParseError> {
        if &self.current != token {
            return Ok(false);
        }
        self.advance()?;
        Ok(true)
    }

    /// `( Expression )` after `if`, `while` and `switch`.
    fn parse_condition(&mut self) -> Result<Expression, ParseError> {
        self.eat(&Token::LeftParen)?;
        let cond = self.parse_expression()?;
        self.eat(&Token::RightParen)?;
        Ok(cond)
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let label_chain = self.label_chain_start.take();
        let Token::Keyword(kw) = self.current.clone() else {
            return match self.current {
                Token::LeftBrace => self.parse_block_body().map(Statement::Block),
                Token::Semicolon => {
                    self.advance()?;
                    Ok(Statement::Empty)
                }
                _ => self.parse_expression_statement_or_labeled(label_chain),
            };
        };
        match kw {
            Keyword::Const => {
                Err(self.error("Lexical declaration cannot appear in a single-statement context"))
            }
            Keyword::Var => self.parse_var_statement(),
            Keyword::If => self.parse_if(),
            Keyword::While => self.parse_while(),
            Keyword::Do => self.parse_do_while(),
            Keyword::For => self.parse_for(),
            Keyword::Return => self.parse_return(),
            Keyword::Break => self.parse_jump(false),
            Keyword::Continue => self.parse_jump(true),
            Keyword::Throw => self.parse_throw(),
            Keyword::Try => self.parse_try(),
            Keyword::Switch => self.parse_switch(),
            Keyword::With if self.strict => {
                Err(self.error("Strict mode code may not include a with statement"))
            }
            Keyword::With => Err(self.error("with statements are not supported")),
            Keyword::Class => Err(self.error("class declarations are not supported")),
            Keyword::Debugger => {
                self.advance()?;
                self.eat_semicolon()?;
                Ok(Statement::Debugger)
            }
            _ => self.parse_expression_statement_or_labeled(label_chain),
        }
    }

    fn parse_expression_statement_or_labeled(
        &mut self,
        label_chain: Option<usize>,
    ) -> Result<Statement, ParseError> {
        let Some(name) = self.current_identifier_name() else {
            return self.parse_expression_statement();
        };
        if self.peek_next()?.0 != Token::Colon {
            return self.parse_expression_statement();
        }
        self.advance()?;
        self.advance()?;
        if self.labels.iter().any(|(l, _)| *l == name) {
            return Err(self.error(format!("Label '{name}' has already been declared")));
        }
        // Every label in a chain like `a: b: while (..)` names the loop.
        let chain_start = label_chain.unwrap_or(self.labels.len());
        self.labels.push((name.clone(), false));
        let labels_loop = matches!(
            self.current,
            Token::Keyword(Keyword::For | Keyword::While | Keyword::Do)
        );
        if labels_loop {
            self.labels[chain_start..].iter_mut().for_each(|l| l.1 = true);
        }
        if self.current == Token::Keyword(Keyword::Function) {
            return Err(self.error("Labeled function declarations are not allowed"));
        }
        self.label_chain_start = Some(chain_start);
        let body = self.parse_statement();
        self.label_chain_start = None;
        self.labels.pop();
        Ok(Statement::Labeled(name, Box::new(body?)))
    }

    /// `{ ... }` as a statement list. Lexical names may not repeat.
    pub(super) fn parse_block_body(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.eat(&Token::LeftBrace)?;
        let mut body = Vec::new();
        let mut declared = Vec::new();
        loop {
            match self.current {
                Token::RightBrace => break,
                Token::Eof => return Err(self.error("Unexpected end of input")),
                _ => {}
            }
            let stmt = self.parse_statement_or_declaration()?;
            self.check_lexical_redeclaration(&stmt, &mut declared)?;
            body.push(stmt);
        }
        self.advance()?;
        Ok(body)
    }

    fn check_lexical_redeclaration(
        &self,
        stmt: &Statement,
        declared: &mut Vec<String>,
    ) -> Result<(), ParseError> {
        let Statement::Decl(decl) = stmt else {
            return Ok(());
        };
        if !decl.kind.is_lexical() {
            return Ok(());
        }
        let mut names = Vec::new();
        decl.bindings.iter().for_each(|b| b.pattern.bound_names(&mut names));
        for name in names {
            if declared.contains(&name) {
                return Err(self.error(format!("Identifier '{name}' has already been declared")));
            }
            declared.push(name);
        }
        Ok(())
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        self.advance()?;
        let test = self.parse_condition()?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.eat_if(&Token::Keyword(Keyword::Else))? {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If(IfStmt {
            test,
            then_branch,
            else_branch,
        }))
    }

    fn parse_loop_body(&mut self) -> Result<Box<Statement>, ParseError> {
        self.in_iteration += 1;
        let body = self.parse_statement();
        self.in_iteration -= 1;
        body.map(Box::new)
    }

    fn parse_while(&mut self) -> Result<Statement, ParseError> {
        self.advance()?;
        let test = self.parse_condition()?;
        let body = self.parse_loop_body()?;
        Ok(Statement::While(WhileStmt { test, body }))
    }

    fn parse_do_while(&mut self) -> Result<Statement, ParseError> {
        self.advance()?;
        let body = self.parse_loop_body()?;
        self.eat(&Token::Keyword(Keyword::While))?;
        let test = self.parse_condition()?;
        // `do ; while (0) x` needs no separator before `x`.
        self.eat_if(&Token::Semicolon)?;
        Ok(Statement::DoWhile(DoWhileStmt { body, test }))
    }

    fn parse_for(&mut self) -> Result<Statement, ParseError> {
        self.advance()?;
        self.eat(&Token::LeftParen)?;

        let saved_no_in = std::mem::replace(&mut self.no_in, true);
        let head = self.parse_for_head();
        self.no_in = saved_no_in;

        let init = match head? {
            ForHead::In(target) => {
                let object = self.parse_expression()?;
                self.eat(&Token::RightParen)?;
                let body = self.parse_loop_body()?;
                return Ok(Statement::ForIn(ForInStmt { target, object, body }));
            }
            ForHead::Init(init) => init,
        };
        self.eat(&Token::Semicolon)?;
        let test = self.parse_optional_expression(&Token::Semicolon)?;
        self.eat(&Token::Semicolon)?;
        let update = self.parse_optional_expression(&Token::RightParen)?;
        self.eat(&Token::RightParen)?;
        let body = self.parse_loop_body()?;
        Ok(Statement::For(ForStmt {
            init,
            test,
            update,
            body,
        }))
    }

    /// An expression unless `end` comes first.
    fn parse_optional_expression(&mut self, end: &Token) -> Result<Option<Expression>, ParseError> {
        if &self.current == end {
            return Ok(None);
        }
        self.parse_expression().map(Some)
    }

    /// Reads up to `in` (consumed) or the first `;` (left current).
    fn parse_for_head(&mut self) -> Result<ForHead, ParseError> {
        let kind = if self.at_let_declaration()? {
            VarKind::Let
        } else {
            match self.current {
                Token::Semicolon => return Ok(ForHead::Init(None)),
                Token::Keyword(Keyword::Var) => VarKind::Var,
                Token::Keyword(Keyword::Const) => VarKind::Const,
                _ => {
                    let expr = self.parse_expression()?;
                    if !self.eat_if(&Token::Keyword(Keyword::In))? {
                        return Ok(ForHead::Init(Some(ForInit::Expression(expr))));
                    }
                    let target = expr_to_pattern(expr, self.strict)?;
                    return Ok(ForHead::In(ForInTarget::Pattern(target)));
                }
            }
        };
        self.advance()?;

        let bindings = self.parse_binding_list(kind)?;
        let decl = VarDecl { kind, bindings };
        if self.current != Token::Keyword(Keyword::In) {
            if kind == VarKind::Const && decl.bindings.iter().any(|b| b.init.is_none()) {
                return Err(self.error("Missing initializer in const declaration"));
            }
            return Ok(ForHead::Init(Some(ForInit::Decl(decl))));
        }
        let [binding] = decl.bindings.as_slice() else {
            return Err(self.error("Invalid left-hand side in for-in loop: must have a single binding"));
        };
        // Only sloppy `var name = init in o` keeps an initializer.
        let simple_var = kind == VarKind::Var && matches!(binding.pattern, Pattern::Identifier(_));
        if binding.init.is_some() && (self.strict || !simple_var) {
            return Err(self.error("for-in loop variable declaration may not have an initializer"));
        }
        self.advance()?;
        Ok(ForHead::In(ForInTarget::Decl(decl)))
    }

    fn parse_return(&mut self) -> Result<Statement, ParseError> {
        if self.in_function == 0 {
            return Err(self.error("Illegal return statement"));
        }
        self.advance()?;
        let ends_here = self.prev_line_terminator
            || matches!(self.current, Token::Semicolon | Token::RightBrace | Token::Eof);
        let value = if ends_here {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.eat_semicolon()?;
        Ok(Statement::Return(value))
    }

    /// `break` and `continue`, with an optional label on the same line.
    fn parse_jump(&mut self, is_continue: bool) -> Result<Statement, ParseError> {
        self.advance()?;
        let label = self.parse_optional_label()?;
        match &label {
            Some(l) => match self.labels.iter().find(|(name, _)| name == l) {
                None => return Err(self.error(format!("Undefined label '{l}'"))),
                Some((_, false)) if is_continue => {
                    return Err(self.error(format!("Label '{l}' is not an iteration statement")));
                }
                Some(_) => {}
            },
            None if is_continue && self.in_iteration == 0 => {
                return Err(
                    self.error("Illegal continue statement: no surrounding iteration statement")
                );
            }
            None if self.in_iteration == 0 && self.in_switch == 0 => {
                return Err(self.error("Illegal break statement"));
            }
            None => {}
        }
        self.eat_semicolon()?;
        Ok(if is_continue {
            Statement::Continue(label)
        } else {
            Statement::Break(label)
        })
    }

    fn parse_throw(&mut self) -> Result<Statement, ParseError> {
        self.advance()?;
        if self.prev_line_terminator {
            return Err(self.error("Illegal newline after throw"));
        }
        let value = self.parse_expression()?;
        self.eat_semicolon()?;
        Ok(Statement::Throw(value))
    }

    fn parse_try(&mut self) -> Result<Statement, ParseError> {
        self.advance()?;
        let block = self.parse_block_body()?;
        let catch_clause = if self.eat_if(&Token::Keyword(Keyword::Catch))? {
            Some(self.parse_catch_clause()?)
        } else {
            None
        };
        let finally_block = if self.eat_if(&Token::Keyword(Keyword::Finally))? {
            Some(self.parse_block_body()?)
        } else {
            None
        };
        if catch_clause.is_none() && finally_block.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }
        Ok(Statement::Try(TryStmt {
            block,
            catch_clause,
            finally_block,
        }))
    }

    /// After `catch`: an optional `( pattern )` and the handler block.
    fn parse_catch_clause(&mut self) -> Result<CatchClause, ParseError> {
        let param = if self.eat_if(&Token::LeftParen)? {
            let pattern = self.parse_binding_pattern()?;
            self.eat(&Token::RightParen)?;
            Some(pattern)
        } else {
            None
        };
        let body = self.parse_block_body()?;
        Ok(CatchClause { param, body })
    }

    fn parse_switch(&mut self) -> Result<Statement, ParseError> {
        self.advance()?;
        let subject = self.parse_condition()?;
        self.eat(&Token::LeftBrace)?;
        self.in_switch += 1;
        let cases = self.parse_switch_cases();
        self.in_switch -= 1;
        let cases = cases?;
        self.eat(&Token::RightBrace)?;
        Ok(Statement::Switch(SwitchStmt { subject, cases }))
    }

    /// All clauses share one lexical scope, so redeclaration is checked
    /// across the whole switch body.
    fn parse_switch_cases(&mut self) -> Result<Vec<SwitchCase>, ParseError> {
        let mut cases = Vec::new();
        let mut declared = Vec::new();
        let mut has_default = false;
        while self.current != Token::RightBrace {
            let test = if self.eat_if(&Token::Keyword(Keyword::Case))? {
                Some(self.parse_expression()?)
            } else {
                self.eat(&Token::Keyword(Keyword::Default))?;
                if std::mem::replace(&mut has_default, true) {
                    return Err(self.error("More than one default clause in switch statement"));
                }
                None
            };
            self.eat(&Token::Colon)?;
            let mut body = Vec::new();
            while !matches!(
                self.current,
                Token::RightBrace | Token::Eof | Token::Keyword(Keyword::Case | Keyword::Default)
            ) {
                let stmt = self.parse_statement_or_declaration()?;
                self.check_lexical_redeclaration(&stmt, &mut declared)?;
                body.push(stmt);
            }
            cases.push(SwitchCase { test, body });
        }
        Ok(cases)
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        let expr = self.parse_expression()?;
        self.eat_semicolon()?;
        Ok(Statement::Expression(expr))
    }
}

/// What a `for (` head turned out to be.
enum ForHead {
    In(ForInTarget),
    Init(Option<ForInit>),
}
