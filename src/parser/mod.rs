use crate::ast::*;
use crate::lexer::{Keyword, LexError, Lexer, Token};
use std::fmt;

mod declarations;
mod expressions;
mod statements;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SyntaxError: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError {
            message: e.to_string(),
        }
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    prev_line_terminator: bool,
    pushback: Option<(Token, bool)>, // (token, had_line_terminator_before)
    strict: bool,
    in_function: u32,
    in_iteration: u32,
    in_switch: u32,
    labels: Vec<(String, bool)>, // (name, is_iteration)
    /// Index into `labels` where the chain directly enclosing the next
    /// statement starts, `a: b: while (..)`.
    label_chain_start: Option<usize>,
    /// Set while parsing the head of a `for` so that `in` ends the
    /// expression instead of being read as the operator.
    no_in: bool,
    /// The next assignment expression may be an arrow parameter, so
    /// `{a = 1}` is accepted until the list is reinterpreted.
    cover_allowed: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let mut had_lt = false;
        let current = loop {
            let tok = lexer.next_token()?;
            if tok == Token::LineTerminator {
                had_lt = true;
                continue;
            }
            break tok;
        };
        Ok(Self {
            lexer,
            current,
            prev_line_terminator: had_lt,
            pushback: None,
            strict: false,
            in_function: 0,
            in_iteration: 0,
            in_switch: 0,
            labels: Vec::new(),
            label_chain_start: None,
            no_in: false,
            cover_allowed: false,
        })
    }

    /// Parser for `eval` code: strictness is inherited from the caller and
    /// `return` stays illegal.
    pub fn new_for_eval(source: &'a str, strict: bool) -> Result<Self, ParseError> {
        let mut parser = Self::new(source)?;
        parser.set_strict(strict);
        Ok(parser)
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let old = std::mem::replace(&mut self.current, Token::Eof);
        if let Some((tok, lt)) = self.pushback.take() {
            self.current = tok;
            self.prev_line_terminator = lt;
        } else {
            self.prev_line_terminator = false;
            loop {
                let tok = self.lexer.next_token()?;
                if tok == Token::LineTerminator {
                    self.prev_line_terminator = true;
                    continue;
                }
                self.current = tok;
                break;
            }
        }
        Ok(old)
    }

    /// Makes `token` current again; the token that was current becomes the
    /// next one read.
    fn push_back(&mut self, token: Token, had_lt: bool) {
        let old_current = std::mem::replace(&mut self.current, token);
        let old_lt = std::mem::replace(&mut self.prev_line_terminator, had_lt);
        self.pushback = Some((old_current, old_lt));
    }

    /// Looks one token past the current one.
    fn peek_next(&mut self) -> Result<(Token, bool), ParseError> {
        let saved_lt = self.prev_line_terminator;
        let saved = self.advance()?;
        let next = (self.current.clone(), self.prev_line_terminator);
        self.push_back(saved, saved_lt);
        Ok(next)
    }

    fn eat(&mut self, expected: &Token) -> Result<(), ParseError> {
        if &self.current == expected {
            self.advance()?;
            Ok(())
        } else {
            Err(self.error(format!("Expected {expected:?}, got {:?}", self.current)))
        }
    }

    fn eat_semicolon(&mut self) -> Result<(), ParseError> {
        if self.current == Token::Semicolon {
            self.advance()?;
            return Ok(());
        }
        // ASI
        if self.prev_line_terminator
            || self.current == Token::RightBrace
            || self.current == Token::Eof
        {
            return Ok(());
        }
        Err(self.error(format!("Unexpected token {:?}", self.current)))
    }

    fn error(&self, msg: impl Into<String>) -> ParseError {
        ParseError {
            message: msg.into(),
        }
    }

    fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
        self.lexer.strict = strict;
    }

    fn parse_optional_label(&mut self) -> Result<Option<String>, ParseError> {
        if !self.prev_line_terminator
            && let Some(name) = self.current_identifier_name()
        {
            self.advance()?;
            return Ok(Some(name));
        }
        Ok(None)
    }

    fn is_reserved_identifier(name: &str, strict: bool) -> bool {
        Keyword::from_str(name).is_some_and(|kw| kw != Keyword::Let || strict)
            || matches!(name, "true" | "false" | "null")
            || (strict && Self::is_strict_reserved_word(name))
    }

    fn is_strict_reserved_word(name: &str) -> bool {
        matches!(
            name,
            "implements"
                | "interface"
                | "package"
                | "private"
                | "protected"
                | "public"
                | "static"
                | "yield"
        )
    }

    /// The current token read as an identifier reference, if it can be one.
    fn current_identifier_name(&self) -> Option<String> {
        match &self.current {
            Token::Identifier(name) if !Self::is_reserved_identifier(name, self.strict) => {
                Some(name.clone())
            }
            Token::Keyword(Keyword::Let) if !self.strict => Some("let".to_string()),
            _ => None,
        }
    }

    fn check_strict_binding_identifier(&self, name: &str) -> Result<(), ParseError> {
        if self.strict && (name == "eval" || name == "arguments") {
            return Err(self.error(format!(
                "'{name}' can't be used as a binding identifier in strict mode"
            )));
        }
        Ok(())
    }

    fn check_duplicate_params(&self, params: &[Pattern]) -> Result<(), ParseError> {
        let mut names = Vec::new();
        for p in params {
            p.bound_names(&mut names);
        }
        let mut seen = rustc_hash::FxHashSet::default();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(self.error(format!("Duplicate parameter name '{name}'")));
            }
        }
        Ok(())
    }

    fn directive_of(stmt: &Statement) -> Option<&str> {
        match stmt {
            Statement::Expression(Expression::Literal(Literal::String(s))) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Parses statements up to `end`, switching to strict mode when the
    /// directive prologue asks for it. Returns the statements and whether
    /// the prologue contained `"use strict"`.
    fn parse_directive_body(&mut self, end: &Token) -> Result<(Vec<Statement>, bool), ParseError> {
        let mut body = Vec::new();
        let mut in_prologue = true;
        let mut has_use_strict = false;
        while &self.current != end {
            if self.current == Token::Eof {
                return Err(self.error("Unexpected end of input"));
            }
            let stmt = self.parse_statement_or_declaration()?;
            if in_prologue {
                match Self::directive_of(&stmt) {
                    Some("use strict") => {
                        has_use_strict = true;
                        self.set_strict(true);
                    }
                    Some(_) => {}
                    None => in_prologue = false,
                }
            }
            body.push(stmt);
        }
        Ok((body, has_use_strict))
    }

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let (body, _) = self.parse_directive_body(&Token::Eof)?;
        Ok(Program {
            body,
            strict: self.strict,
        })
    }
}

/// Reinterprets an expression parsed ahead of `=`, `=>` or `in` as a
/// binding or assignment target.
fn expr_to_pattern(expr: Expression, strict: bool) -> Result<Pattern, ParseError> {
    let invalid = || ParseError {
        message: "Invalid destructuring assignment target".to_string(),
    };
    match expr {
        Expression::Identifier(name) => {
            if strict && (name == "eval" || name == "arguments") {
                return Err(ParseError {
                    message: format!("Unexpected eval or arguments in strict mode: '{name}'"),
                });
            }
            Ok(Pattern::Identifier(name))
        }
        Expression::Member(..) => Ok(Pattern::Member(Box::new(expr))),
        Expression::Assign(AssignOp::Assign, left, right) => {
            let pat = expr_to_pattern(*left, strict)?;
            Ok(Pattern::Assign(Box::new(pat), right))
        }
        Expression::Array(elements) => {
            let pats = elements
                .into_iter()
                .map(|e| e.map(|e| expr_to_pattern(e, strict)).transpose())
                .collect::<Result<_, _>>()?;
            Ok(Pattern::Array(pats))
        }
        Expression::Object(props) => {
            let mut pat_props = Vec::new();
            for prop in props {
                if prop.shorthand {
                    let PropertyKey::Identifier(name) = prop.key else {
                        return Err(invalid());
                    };
                    match prop.value {
                        Expression::Assign(AssignOp::Assign, _, right) => {
                            pat_props.push(PatternProp::KeyValue(
                                PropertyKey::Identifier(name.clone()),
                                Pattern::Assign(Box::new(Pattern::Identifier(name)), right),
                            ));
                        }
                        _ => pat_props.push(PatternProp::Shorthand(name)),
                    }
                } else {
                    let val_pat = expr_to_pattern(prop.value, strict)?;
                    pat_props.push(PatternProp::KeyValue(prop.key, val_pat));
                }
            }
            Ok(Pattern::Object(pat_props))
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Program {
        Parser::new(src).unwrap().parse_program().unwrap()
    }

    fn parse_err(src: &str) -> ParseError {
        match Parser::new(src).and_then(|mut p| p.parse_program()) {
            Ok(_) => panic!("expected a syntax error for {src:?}"),
            Err(e) => e,
        }
    }

    #[test]
    fn parse_empty() {
        let prog = parse("");
        assert!(prog.body.is_empty());
        assert!(!prog.strict);
    }

    #[test]
    fn parse_var_declaration() {
        let prog = parse("var x = 42;");
        assert_eq!(prog.body.len(), 1);
        assert!(matches!(&prog.body[0], Statement::Decl(_)));
    }

    #[test]
    fn parse_if_statement() {
        let prog = parse("if (true) { x; } else { y; }");
        assert!(matches!(&prog.body[0], Statement::If(_)));
    }

    #[test]
    fn parse_function_declaration() {
        let prog = parse("function foo(a, b) { return a + b; }");
        let Statement::Function(f) = &prog.body[0] else {
            panic!("not a function declaration");
        };
        assert_eq!(f.name.as_deref(), Some("foo"));
        assert_eq!(f.params.len(), 2);
        assert!(f.has_simple_params());
    }

    #[test]
    fn parse_use_strict_prologue() {
        let prog = parse("'use strict'; var x;");
        assert!(prog.strict);
        let prog = parse("var x; 'use strict';");
        assert!(!prog.strict);
    }

    #[test]
    fn function_inherits_and_declares_strictness() {
        let prog = parse("function f() { 'use strict'; } function g() {}");
        let Statement::Function(f) = &prog.body[0] else {
            panic!()
        };
        let Statement::Function(g) = &prog.body[1] else {
            panic!()
        };
        assert!(f.is_strict);
        assert!(!g.is_strict);
    }

    #[test]
    fn parse_for_loop() {
        let prog = parse("for (var i = 0; i < 10; i++) { x; }");
        assert!(matches!(&prog.body[0], Statement::For(_)));
    }

    #[test]
    fn parse_for_in_with_initializer() {
        let prog = parse("for (var k = 2 in o) ;");
        let Statement::ForIn(f) = &prog.body[0] else {
            panic!("not a for-in")
        };
        let ForInTarget::Decl(decl) = &f.target else {
            panic!()
        };
        assert!(decl.bindings[0].init.is_some());
    }

    #[test]
    fn parse_for_in_member_target() {
        let prog = parse("for (a.x in o) ; for (a[0] in o) ;");
        for stmt in &prog.body {
            let Statement::ForIn(f) = stmt else { panic!() };
            assert!(matches!(f.target, ForInTarget::Pattern(Pattern::Member(_))));
        }
    }

    #[test]
    fn sloppy_let_is_a_declaration_only_before_a_binding() {
        let prog = parse("let x = 1; let = 2; for (let i = 0; i; ) ; for (let in o) ;");
        assert!(matches!(&prog.body[0], Statement::Decl(d) if d.kind == VarKind::Let));
        assert!(matches!(&prog.body[1], Statement::Expression(Expression::Assign(..))));
        let Statement::For(f) = &prog.body[2] else {
            panic!("not a for")
        };
        assert!(matches!(&f.init, Some(ForInit::Decl(d)) if d.kind == VarKind::Let));
        let Statement::ForIn(f) = &prog.body[3] else {
            panic!("not a for-in")
        };
        assert!(matches!(&f.target, ForInTarget::Pattern(Pattern::Identifier(n)) if n == "let"));
        parse_err("'use strict'; let = 2;");
    }

    #[test]
    fn parse_for_head_allows_in_inside_parens() {
        let prog = parse("for (var i = ('a' in o); i; ) break;");
        assert!(matches!(&prog.body[0], Statement::For(_)));
    }

    #[test]
    fn parse_arrow_function() {
        let prog = parse("var f = (a, b = 2) => a + b;");
        let Statement::Decl(decl) = &prog.body[0] else {
            panic!()
        };
        let Some(Expression::Function(f)) = &decl.bindings[0].init else {
            panic!("not a function")
        };
        assert!(f.is_arrow());
        assert!(!f.has_simple_params());
        assert!(matches!(f.body[0], Statement::Return(Some(_))));
    }

    #[test]
    fn parse_try_catch() {
        let prog = parse("try { x; } catch (e) { y; } finally { z; }");
        assert!(matches!(&prog.body[0], Statement::Try(_)));
        let prog = parse("try { x; } catch { y; }");
        let Statement::Try(t) = &prog.body[0] else {
            panic!()
        };
        assert!(t.catch_clause.as_ref().is_some_and(|h| h.param.is_none()));
    }

    #[test]
    fn parse_labels() {
        let prog = parse("L1: for (;;) { L2: while (1) { continue L1; } }");
        assert!(matches!(&prog.body[0], Statement::Labeled(name, _) if name == "L1"));
        parse("a: b: while (1) continue a;");
        parse("x: { break x; }");
    }

    #[test]
    fn rejects_misplaced_jumps() {
        assert!(parse_err("break;").message.contains("break"));
        assert!(parse_err("continue;").message.contains("continue"));
        assert!(parse_err("x: { continue x; }").message.contains("not an iteration"));
        assert!(parse_err("while (1) break nowhere;").message.contains("Undefined label"));
        assert!(parse_err("return 1;").message.contains("return"));
    }

    #[test]
    fn rejects_invalid_assignment_targets() {
        parse_err("1 = 2;");
        parse_err("a + b = c;");
        parse_err("++f();");
        parse_err("'use strict'; eval = 1;");
        parse_err("'use strict'; arguments++;");
    }

    #[test]
    fn rejects_strict_only_errors() {
        parse_err("'use strict'; with (o) {}");
        parse_err("'use strict'; function f(a, a) {}");
        parse("function f(a, a) {}");
    }

    #[test]
    fn parse_error_displays_as_syntax_error() {
        let err = parse_err("var = ;");
        assert!(err.to_string().starts_with("SyntaxError: "));
    }

    #[test]
    fn asi_on_restricted_productions() {
        let prog = parse("function f() { return\n1 }");
        let Statement::Function(f) = &prog.body[0] else {
            panic!()
        };
        assert!(matches!(f.body[0], Statement::Return(None)));
        let prog = parse("a\n++b");
        assert_eq!(prog.body.len(), 2);
    }

    #[test]
    fn parse_object_literal_keys() {
        let prog = parse("var o = { a: 1, 'b': 2, 3: 4, [k]: 5, c, };");
        let Statement::Decl(decl) = &prog.body[0] else {
            panic!()
        };
        let Some(Expression::Object(props)) = &decl.bindings[0].init else {
            panic!()
        };
        assert_eq!(props.len(), 5);
        assert!(props[4].shorthand);
    }
}
