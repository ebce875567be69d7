use std::fmt;
use std::str::Chars;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Identifier(String),
    Keyword(Keyword),

    NumericLiteral(f64),
    LegacyOctalLiteral(f64),
    StringLiteral(String),
    BooleanLiteral(bool),
    NullLiteral,

    LeftBrace,                // {
    RightBrace,               // }
    LeftParen,                // (
    RightParen,               // )
    LeftBracket,              // [
    RightBracket,             // ]
    Dot,                      // .
    Ellipsis,                 // ...
    Semicolon,                // ;
    Comma,                    // ,
    LessThan,                 // <
    GreaterThan,              // >
    LessThanEqual,            // <=
    GreaterThanEqual,         // >=
    Equal,                    // ==
    NotEqual,                 // !=
    StrictEqual,              // ===
    StrictNotEqual,           // !==
    Plus,                     // +
    Minus,                    // -
    Star,                     // *
    Slash,                    // /
    Percent,                  // %
    Exponent,                 // **
    Increment,                // ++
    Decrement,                // --
    LeftShift,                // <<
    RightShift,               // >>
    UnsignedRightShift,       // >>>
    Ampersand,                // &
    Pipe,                     // |
    Caret,                    // ^
    Bang,                     // !
    Tilde,                    // ~
    LogicalAnd,               // &&
    LogicalOr,                // ||
    NullishCoalescing,        // ??
    Question,                 // ?
    Colon,                    // :
    Assign,                   // =
    PlusAssign,               // +=
    MinusAssign,              // -=
    StarAssign,               // *=
    SlashAssign,              // /=
    PercentAssign,            // %=
    ExponentAssign,           // **=
    LeftShiftAssign,          // <<=
    RightShiftAssign,         // >>=
    UnsignedRightShiftAssign, // >>>=
    AmpersandAssign,          // &=
    PipeAssign,               // |=
    CaretAssign,              // ^=
    Arrow,                    // =>

    LineTerminator,
    Eof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    Let,
    New,
    Return,
    Super,
    Switch,
    This,
    Throw,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("break", Keyword::Break),
    ("case", Keyword::Case),
    ("catch", Keyword::Catch),
    ("class", Keyword::Class),
    ("const", Keyword::Const),
    ("continue", Keyword::Continue),
    ("debugger", Keyword::Debugger),
    ("default", Keyword::Default),
    ("delete", Keyword::Delete),
    ("do", Keyword::Do),
    ("else", Keyword::Else),
    ("enum", Keyword::Enum),
    ("export", Keyword::Export),
    ("extends", Keyword::Extends),
    ("finally", Keyword::Finally),
    ("for", Keyword::For),
    ("function", Keyword::Function),
    ("if", Keyword::If),
    ("import", Keyword::Import),
    ("in", Keyword::In),
    ("instanceof", Keyword::Instanceof),
    ("let", Keyword::Let),
    ("new", Keyword::New),
    ("return", Keyword::Return),
    ("super", Keyword::Super),
    ("switch", Keyword::Switch),
    ("this", Keyword::This),
    ("throw", Keyword::Throw),
    ("try", Keyword::Try),
    ("typeof", Keyword::Typeof),
    ("var", Keyword::Var),
    ("void", Keyword::Void),
    ("while", Keyword::While),
    ("with", Keyword::With),
];

impl Keyword {
    pub fn from_str(s: &str) -> Option<Keyword> {
        KEYWORDS.iter().find(|(text, _)| *text == s).map(|(_, kw)| *kw)
    }

    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, kw)| *kw == self)
            .map_or("", |(text, _)| text)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn punctuator(text: &str) -> Option<Token> {
    let tok = match text {
        ">>>=" => Token::UnsignedRightShiftAssign,
        "===" => Token::StrictEqual,
        "!==" => Token::StrictNotEqual,
        "**=" => Token::ExponentAssign,
        "<<=" => Token::LeftShiftAssign,
        ">>=" => Token::RightShiftAssign,
        ">>>" => Token::UnsignedRightShift,
        "..." => Token::Ellipsis,
        "=>" => Token::Arrow,
        "==" => Token::Equal,
        "!=" => Token::NotEqual,
        "<=" => Token::LessThanEqual,
        ">=" => Token::GreaterThanEqual,
        "&&" => Token::LogicalAnd,
        "||" => Token::LogicalOr,
        "??" => Token::NullishCoalescing,
        "++" => Token::Increment,
        "--" => Token::Decrement,
        "+=" => Token::PlusAssign,
        "-=" => Token::MinusAssign,
        "*=" => Token::StarAssign,
        "/=" => Token::SlashAssign,
        "%=" => Token::PercentAssign,
        "&=" => Token::AmpersandAssign,
        "|=" => Token::PipeAssign,
        "^=" => Token::CaretAssign,
        "**" => Token::Exponent,
        "<<" => Token::LeftShift,
        ">>" => Token::RightShift,
        "{" => Token::LeftBrace,
        "}" => Token::RightBrace,
        "(" => Token::LeftParen,
        ")" => Token::RightParen,
        "[" => Token::LeftBracket,
        "]" => Token::RightBracket,
        "." => Token::Dot,
        ";" => Token::Semicolon,
        "," => Token::Comma,
        "<" => Token::LessThan,
        ">" => Token::GreaterThan,
        "+" => Token::Plus,
        "-" => Token::Minus,
        "*" => Token::Star,
        "/" => Token::Slash,
        "%" => Token::Percent,
        "&" => Token::Ampersand,
        "|" => Token::Pipe,
        "^" => Token::Caret,
        "!" => Token::Bang,
        "~" => Token::Tilde,
        "?" => Token::Question,
        ":" => Token::Colon,
        "=" => Token::Assign,
        _ => return None,
    };
    Some(tok)
}

#[derive(Clone, Debug)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

#[derive(Clone, Debug)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: Chars<'a>,
    current: Option<char>,
    offset: usize,
    token_start: usize,
    line: u32,
    column: u32,
    pub strict: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let current = chars.next();
        Self {
            source,
            chars,
            current,
            offset: 0,
            token_start: 0,
            line: 1,
            column: 0,
            strict: false,
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn token_start(&self) -> usize {
        self.token_start
    }

    fn peek(&self) -> Option<char> {
        self.current
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current;
        if let Some(c) = ch {
            self.offset += c.len_utf8();
            self.column += 1;
            self.current = self.chars.next();
        }
        ch
    }

    fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            location: self.location(),
        }
    }

    fn is_line_terminator(ch: char) -> bool {
        matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
    }

    fn is_whitespace(ch: char) -> bool {
        matches!(
            ch,
            '\t' | '\u{000B}' | '\u{000C}' | ' ' | '\u{00A0}' | '\u{FEFF}'
        ) || ch.is_whitespace() && !Self::is_line_terminator(ch)
    }

    fn is_identifier_start(ch: char) -> bool {
        ch == '_'
            || ch == '$'
            || ch.is_ascii_alphabetic()
            || (!ch.is_ascii() && unicode_ident::is_xid_start(ch))
    }

    fn is_identifier_continue(ch: char) -> bool {
        ch == '_'
            || ch == '$'
            || ch.is_ascii_alphanumeric()
            || ch == '\u{200C}'
            || ch == '\u{200D}'
            || (!ch.is_ascii() && unicode_ident::is_xid_continue(ch))
    }

    fn newline(&mut self, ch: char) {
        if ch == '\r' && self.peek() == Some('\n') {
            self.advance();
        }
        self.line += 1;
        self.column = 0;
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if Self::is_line_terminator(ch) {
                break;
            }
            self.advance();
        }
    }

    /// Returns whether the comment spanned a line break.
    fn skip_block_comment(&mut self) -> Result<bool, LexError> {
        let mut crossed_line = false;
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return Ok(crossed_line);
                }
                Some(ch) if Self::is_line_terminator(ch) => {
                    crossed_line = true;
                    self.newline(ch);
                }
                Some(_) => {}
                None => return Err(self.error("Unterminated block comment")),
            }
        }
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                Some(ch) if ch == quote => return Ok(s),
                Some('\\') => self.read_escape_sequence(&mut s)?,
                Some(ch) if ch == '\n' || ch == '\r' => {
                    return Err(self.error("Unterminated string literal"));
                }
                Some(ch) => s.push(ch),
                None => return Err(self.error("Unterminated string literal")),
            }
        }
    }

    fn read_escape_sequence(&mut self, out: &mut String) -> Result<(), LexError> {
        let Some(ch) = self.advance() else {
            return Err(self.error("Unterminated escape sequence"));
        };
        match ch {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'v' => out.push('\u{000B}'),
            '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
            '0'..='7' => {
                if self.strict {
                    return Err(self.error("Octal escape sequences are not allowed in strict mode"));
                }
                let mut val = ch.to_digit(8).unwrap_or(0);
                let max_digits = if ch <= '3' { 2 } else { 1 };
                for _ in 0..max_digits {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            val = val * 8 + d;
                            self.advance();
                        }
                        None => break,
                    }
                }
                out.extend(char::from_u32(val));
            }
            'x' => {
                let val = self.read_hex_digits(2)?;
                out.extend(char::from_u32(val));
            }
            'u' => {
                let c = self.read_unicode_escape()?;
                out.push(c);
            }
            c if Self::is_line_terminator(c) => self.newline(c),
            c => out.push(c),
        }
        Ok(())
    }

    fn read_hex_digits(&mut self, count: usize) -> Result<u32, LexError> {
        let mut val = 0;
        for _ in 0..count {
            let digit = self
                .advance()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("Invalid hexadecimal escape sequence"))?;
            val = val * 16 + digit;
        }
        Ok(val)
    }

    fn read_unicode_escape(&mut self) -> Result<char, LexError> {
        let val = if self.peek() == Some('{') {
            self.advance();
            let mut val: u32 = 0;
            let mut digits = 0;
            loop {
                match self.advance() {
                    Some('}') if digits > 0 => break,
                    Some(c) if c.is_ascii_hexdigit() => {
                        val = val * 16 + c.to_digit(16).unwrap_or(0);
                        if val > 0x10FFFF {
                            return Err(self.error("Unicode code point out of range"));
                        }
                        digits += 1;
                    }
                    _ => return Err(self.error("Invalid Unicode escape sequence")),
                }
            }
            val
        } else {
            self.read_hex_digits(4)?
        };
        // Lone surrogates have no `char`; they degrade to U+FFFD.
        Ok(char::from_u32(val).unwrap_or('\u{FFFD}'))
    }

    fn take_digits(&mut self, s: &mut String, radix: u32) {
        while let Some(ch) = self.peek() {
            if ch.is_digit(radix) {
                s.push(ch);
                self.advance();
            } else if ch == '_' && self.peek_next().is_some_and(|c| c.is_digit(radix)) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_numeric_literal(&mut self, first: char) -> Result<Token, LexError> {
        if first == '0' {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                let mut digits = String::new();
                self.take_digits(&mut digits, radix);
                if digits.is_empty() {
                    return Err(self.error("Invalid numeric literal"));
                }
                let val = digits
                    .chars()
                    .filter_map(|c| c.to_digit(radix))
                    .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d));
                return self.finish_number(Token::NumericLiteral(val));
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return self.read_legacy_octal_or_decimal();
            }
        }

        let mut s = String::new();
        s.push(first);
        if first != '.' {
            self.take_digits(&mut s, 10);
            if self.peek() == Some('.') {
                s.push('.');
                self.advance();
            }
        }
        self.take_digits(&mut s, 10);
        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            s.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                s.push(sign);
                self.advance();
            }
            let before = s.len();
            self.take_digits(&mut s, 10);
            if s.len() == before {
                return Err(self.error("Invalid numeric literal"));
            }
        }
        let val: f64 = s
            .parse()
            .map_err(|_| self.error("Invalid numeric literal"))?;
        self.finish_number(Token::NumericLiteral(val))
    }

    fn read_legacy_octal_or_decimal(&mut self) -> Result<Token, LexError> {
        if self.strict {
            return Err(self.error("Octal literals are not allowed in strict mode"));
        }
        let mut s = String::from("0");
        while let Some(ch) = self.peek().filter(|c| c.is_ascii_digit()) {
            s.push(ch);
            self.advance();
        }
        if s.chars().all(|c| c < '8') {
            let val = s
                .chars()
                .filter_map(|c| c.to_digit(8))
                .fold(0.0, |acc, d| acc * 8.0 + f64::from(d));
            return self.finish_number(Token::LegacyOctalLiteral(val));
        }
        let val: f64 = s
            .parse()
            .map_err(|_| self.error("Invalid numeric literal"))?;
        self.finish_number(Token::NumericLiteral(val))
    }

    // A numeric literal may not run straight into an identifier (`3in`).
    fn finish_number(&self, tok: Token) -> Result<Token, LexError> {
        match self.peek() {
            Some(c) if Self::is_identifier_start(c) || c.is_ascii_digit() => {
                Err(self.error("Identifier starts immediately after numeric literal"))
            }
            _ => Ok(tok),
        }
    }

    fn read_identifier(&mut self, first: char) -> Result<Token, LexError> {
        let mut name = String::new();
        let mut escaped = false;
        let mut ch = Some(first);
        while let Some(c) = ch {
            if c == '\\' {
                if self.advance() != Some('u') {
                    return Err(self.error("Invalid identifier escape"));
                }
                name.push(self.read_unicode_escape()?);
                escaped = true;
            } else {
                name.push(c);
            }
            ch = match self.peek() {
                Some(c) if Self::is_identifier_continue(c) || c == '\\' => {
                    self.advance();
                    Some(c)
                }
                _ => None,
            };
        }

        if escaped {
            return Ok(Token::Identifier(name));
        }
        Ok(match name.as_str() {
            "true" => Token::BooleanLiteral(true),
            "false" => Token::BooleanLiteral(false),
            "null" => Token::NullLiteral,
            _ => match Keyword::from_str(&name) {
                Some(kw) => Token::Keyword(kw),
                None => Token::Identifier(name),
            },
        })
    }

    fn read_punctuator(&mut self) -> Result<Token, LexError> {
        let rest = &self.source[self.offset..];
        for len in (1..=4).rev() {
            if let Some(text) = rest.get(..len)
                && let Some(tok) = punctuator(text)
            {
                for _ in 0..len {
                    self.advance();
                }
                return Ok(tok);
            }
        }
        let ch = self.peek().unwrap_or('\0');
        Err(self.error(format!("Unexpected character: {ch}")))
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            while self.peek().is_some_and(Self::is_whitespace) {
                self.advance();
            }
            self.token_start = self.offset;

            let Some(ch) = self.peek() else {
                return Ok(Token::Eof);
            };

            if Self::is_line_terminator(ch) {
                self.advance();
                self.newline(ch);
                return Ok(Token::LineTerminator);
            }

            if ch == '/' {
                match self.peek_next() {
                    Some('/') => {
                        self.skip_line_comment();
                        continue;
                    }
                    Some('*') => {
                        self.advance();
                        self.advance();
                        if self.skip_block_comment()? {
                            return Ok(Token::LineTerminator);
                        }
                        continue;
                    }
                    _ => {}
                }
            }

            if ch == '#' && self.offset == 0 && self.peek_next() == Some('!') {
                self.skip_line_comment();
                continue;
            }

            if ch == '\'' || ch == '"' {
                self.advance();
                return self.read_string(ch).map(Token::StringLiteral);
            }

            if ch.is_ascii_digit()
                || (ch == '.' && self.peek_next().is_some_and(|c| c.is_ascii_digit()))
            {
                self.advance();
                return self.read_numeric_literal(ch);
            }

            if Self::is_identifier_start(ch) || ch == '\\' {
                self.advance();
                return self.read_identifier(ch);
            }

            return self.read_punctuator();
        }
    }

    pub fn tokenize_all(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        lexer.tokenize_all().unwrap()
    }

    fn lex_no_lt(src: &str) -> Vec<Token> {
        lex(src)
            .into_iter()
            .filter(|t| !matches!(t, Token::LineTerminator))
            .collect()
    }

    #[test]
    fn empty_source() {
        assert_eq!(lex(""), vec![Token::Eof]);
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(
            lex_no_lt("var x = 42;"),
            vec![
                Token::Keyword(Keyword::Var),
                Token::Identifier("x".into()),
                Token::Assign,
                Token::NumericLiteral(42.0),
                Token::Semicolon,
                Token::Eof,
            ]
        );
        assert_eq!(
            lex_no_lt("typeof unknown_var"),
            vec![
                Token::Keyword(Keyword::Typeof),
                Token::Identifier("unknown_var".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn string_literals() {
        assert_eq!(
            lex_no_lt(r#""hello""#),
            vec![Token::StringLiteral("hello".into()), Token::Eof]
        );
        assert_eq!(
            lex_no_lt(r"'he\nllo'"),
            vec![Token::StringLiteral("he\nllo".into()), Token::Eof]
        );
        assert_eq!(
            lex_no_lt(r#""\x41B\u{43}""#),
            vec![Token::StringLiteral("ABC".into()), Token::Eof]
        );
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(lex_no_lt("0x12345"), vec![Token::NumericLiteral(74565.0), Token::Eof]);
        assert_eq!(lex_no_lt("0x7ffffffe"), vec![Token::NumericLiteral(2147483646.0), Token::Eof]);
        assert_eq!(lex_no_lt("0b1010"), vec![Token::NumericLiteral(10.0), Token::Eof]);
        assert_eq!(lex_no_lt("0o77"), vec![Token::NumericLiteral(63.0), Token::Eof]);
        assert_eq!(lex_no_lt("1_000"), vec![Token::NumericLiteral(1000.0), Token::Eof]);
        assert_eq!(lex_no_lt("1.342E+3"), vec![Token::NumericLiteral(1342.0), Token::Eof]);
        assert_eq!(lex_no_lt(".5"), vec![Token::NumericLiteral(0.5), Token::Eof]);
        assert_eq!(lex_no_lt("017"), vec![Token::LegacyOctalLiteral(15.0), Token::Eof]);
        assert_eq!(lex_no_lt("4294967296"), vec![Token::NumericLiteral(4294967296.0), Token::Eof]);
    }

    #[test]
    fn number_followed_by_identifier_is_rejected() {
        assert!(Lexer::new("3in x").tokenize_all().is_err());
    }

    #[test]
    fn boolean_null() {
        assert_eq!(
            lex_no_lt("true false null"),
            vec![
                Token::BooleanLiteral(true),
                Token::BooleanLiteral(false),
                Token::NullLiteral,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn punctuators_take_longest_match() {
        assert_eq!(lex_no_lt("==="), vec![Token::StrictEqual, Token::Eof]);
        assert_eq!(lex_no_lt("!=="), vec![Token::StrictNotEqual, Token::Eof]);
        assert_eq!(lex_no_lt("=>"), vec![Token::Arrow, Token::Eof]);
        assert_eq!(lex_no_lt(">>>="), vec![Token::UnsignedRightShiftAssign, Token::Eof]);
        assert_eq!(
            lex_no_lt("a++ + ++b"),
            vec![
                Token::Identifier("a".into()),
                Token::Increment,
                Token::Plus,
                Token::Increment,
                Token::Identifier("b".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn comments_and_line_terminators() {
        assert_eq!(lex_no_lt("// comment\n42"), vec![Token::NumericLiteral(42.0), Token::Eof]);
        assert_eq!(
            lex("a /* x\n y */ b"),
            vec![
                Token::Identifier("a".into()),
                Token::LineTerminator,
                Token::Identifier("b".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn escaped_identifier_is_never_a_keyword() {
        assert_eq!(
            lex_no_lt(r"\u0076ar"),
            vec![Token::Identifier("var".into()), Token::Eof]
        );
    }
}
