//! Fixture lexer.
//!
//! Turns fixture text into a token stream. The fixture language is a JSON
//! superset: strings may be single- or double-quoted, property names may be
//! bare identifiers, and comments are tokens rather than whitespace because
//! `/* no <field> */` carries meaning. Tracks line/column for error
//! reporting.

use crate::error::OracleError;

/// Kinds of tokens in the fixture language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    /// A quoted string with escapes resolved.
    String(String),
    /// A bare identifier (allowed as a property name).
    Identifier(String),
    /// A numeric literal, kept as written.
    Number(String),
    True,
    False,
    Null,
    /// Body of a `/* */` or `//` comment, trimmed.
    Comment(String),
    Eof,
}

impl TokenKind {
    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::LeftBrace => "'{'".to_string(),
            Self::RightBrace => "'}'".to_string(),
            Self::LeftBracket => "'['".to_string(),
            Self::RightBracket => "']'".to_string(),
            Self::Colon => "':'".to_string(),
            Self::Comma => "','".to_string(),
            Self::String(value) => format!("string '{value}'"),
            Self::Identifier(value) => format!("identifier '{value}'"),
            Self::Number(value) => format!("number {value}"),
            Self::True => "'true'".to_string(),
            Self::False => "'false'".to_string(),
            Self::Null => "'null'".to_string(),
            Self::Comment(_) => "comment".to_string(),
            Self::Eof => "end of input".to_string(),
        }
    }
}

/// A token with its 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
}

/// Lexer over fixture text.
pub struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            src: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input, ending with `Eof`.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, OracleError> {
        let mut lexer = Self::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> Result<Token, OracleError> {
        self.skip_whitespace();

        let line = self.line;
        let column = self.column;
        let Some(ch) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                line,
                column,
            });
        };

        let kind = match ch {
            '{' => self.single(TokenKind::LeftBrace),
            '}' => self.single(TokenKind::RightBrace),
            '[' => self.single(TokenKind::LeftBracket),
            ']' => self.single(TokenKind::RightBracket),
            ':' => self.single(TokenKind::Colon),
            ',' => self.single(TokenKind::Comma),
            '"' | '\'' => self.lex_string(ch, line, column)?,
            '/' => self.lex_comment(line, column)?,
            '-' | '+' | '0'..='9' => self.lex_number(),
            c if c.is_alphabetic() || c == '_' || c == '$' => self.lex_identifier(),
            other => {
                return Err(malformed(
                    format!("unexpected character '{other}'"),
                    line,
                    column,
                ));
            }
        };

        Ok(Token { kind, line, column })
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.src.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '\u{feff}' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn lex_string(&mut self, quote: char, line: u32, column: u32) -> Result<TokenKind, OracleError> {
        self.advance();
        let mut value = String::new();
        loop {
            let Some(ch) = self.advance() else {
                return Err(malformed("unterminated string", line, column));
            };
            match ch {
                c if c == quote => return Ok(TokenKind::String(value)),
                '\\' => {
                    let escape_line = self.line;
                    let escape_column = self.column;
                    let Some(escaped) = self.advance() else {
                        return Err(malformed("unterminated string", line, column));
                    };
                    match escaped {
                        '"' => value.push('"'),
                        '\'' => value.push('\''),
                        '\\' => value.push('\\'),
                        '/' => value.push('/'),
                        'b' => value.push('\u{0008}'),
                        'f' => value.push('\u{000c}'),
                        'n' => value.push('\n'),
                        'r' => value.push('\r'),
                        't' => value.push('\t'),
                        'u' => value.push(self.lex_unicode_escape(escape_line, escape_column)?),
                        other => {
                            return Err(malformed(
                                format!("invalid escape sequence '\\{other}'"),
                                escape_line,
                                escape_column,
                            ));
                        }
                    }
                }
                other => value.push(other),
            }
        }
    }

    fn lex_unicode_escape(&mut self, line: u32, column: u32) -> Result<char, OracleError> {
        let high = self.read_hex4(line, column)?;
        if (0xD800..0xDC00).contains(&high) {
            if self.peek() == Some('\\') && self.peek_at(1) == Some('u') {
                self.advance();
                self.advance();
                let low = self.read_hex4(line, column)?;
                if (0xDC00..0xE000).contains(&low) {
                    let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    return char::from_u32(combined)
                        .ok_or_else(|| malformed("invalid surrogate pair", line, column));
                }
            }
            return Err(malformed("unpaired surrogate in \\u escape", line, column));
        }
        char::from_u32(high).ok_or_else(|| malformed("invalid \\u escape", line, column))
    }

    fn read_hex4(&mut self, line: u32, column: u32) -> Result<u32, OracleError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .advance()
                .and_then(|ch| ch.to_digit(16))
                .ok_or_else(|| malformed("invalid \\u escape", line, column))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn lex_comment(&mut self, line: u32, column: u32) -> Result<TokenKind, OracleError> {
        match self.peek_at(1) {
            Some('*') => {
                self.advance();
                self.advance();
                let mut body = String::new();
                loop {
                    match self.advance() {
                        Some('*') if self.peek() == Some('/') => {
                            self.advance();
                            return Ok(TokenKind::Comment(body.trim().to_string()));
                        }
                        Some(ch) => body.push(ch),
                        None => return Err(malformed("unterminated comment", line, column)),
                    }
                }
            }
            Some('/') => {
                self.advance();
                self.advance();
                let mut body = String::new();
                while let Some(ch) = self.peek() {
                    if ch == '\n' {
                        break;
                    }
                    body.push(ch);
                    self.advance();
                }
                Ok(TokenKind::Comment(body.trim().to_string()))
            }
            _ => Err(malformed("unexpected character '/'", line, column)),
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.' | 'e' | 'E') {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::Number(text)
    }

    fn lex_identifier(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        match text.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Identifier(text),
        }
    }
}

pub(crate) fn malformed(message: impl Into<String>, line: u32, column: u32) -> OracleError {
    OracleError::MalformedFixture {
        message: message.into(),
        line,
        column,
    }
}
