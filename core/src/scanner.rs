use unicode_segmentation::UnicodeSegmentation;

use std::error::Error;
use std::fmt;

use crate::diagnostics::Diagnostics;
use crate::token::{Token, TokenType};
use crate::types::Literal;

pub type ScanResult<T> = std::result::Result<T, ScanError>;

/// Splits source text into tokens.
///
/// The cursor walks extended grapheme clusters rather than bytes, so a
/// multi-byte character is always consumed as one unit.
pub struct Scanner<'a> {
    graphemes: Vec<&'a str>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: u32,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner {
            graphemes: source.graphemes(true).collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    /// Scans the whole source. Lexical errors are reported and the offending
    /// lexeme is skipped, so the result always ends with an `Eof` token.
    pub fn scan_tokens(mut self, diagnostics: &mut Diagnostics) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            if let Err(error) = self.scan_token() {
                diagnostics.report_lex(error);
            }
        }

        self.tokens.push(Token::eof(self.line));

        self.tokens
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.graphemes.len()
    }

    fn scan_token(&mut self) -> ScanResult<()> {
        match self.advance() {
            // Single character tokens
            "(" => self.add_token(TokenType::LeftParen, None),
            ")" => self.add_token(TokenType::RightParen, None),
            "{" => self.add_token(TokenType::LeftBrace, None),
            "}" => self.add_token(TokenType::RightBrace, None),
            "," => self.add_token(TokenType::Comma, None),
            "." => self.add_token(TokenType::Dot, None),
            "-" => self.add_token(TokenType::Minus, None),
            "+" => self.add_token(TokenType::Plus, None),
            ";" => self.add_token(TokenType::Semicolon, None),
            "*" => self.add_token(TokenType::Star, None),

            // One or two character tokens
            "!" => {
                if self.matches("=") {
                    self.add_token(TokenType::BangEqual, None)
                } else {
                    self.add_token(TokenType::Bang, None)
                }
            }
            "=" => {
                if self.matches("=") {
                    self.add_token(TokenType::EqualEqual, None)
                } else {
                    self.add_token(TokenType::Equal, None)
                }
            }
            ">" => {
                if self.matches("=") {
                    self.add_token(TokenType::GreaterEqual, None)
                } else {
                    self.add_token(TokenType::Greater, None)
                }
            }
            "<" => {
                if self.matches("=") {
                    self.add_token(TokenType::LessEqual, None)
                } else {
                    self.add_token(TokenType::Less, None)
                }
            }

            // Comments
            "/" => {
                if self.matches("/") {
                    // A comment goes until the end of the line
                    while let Some(str) = self.peek() {
                        if Scanner::is_newline(str) {
                            break;
                        }
                        self.advance();
                    }
                    Ok(())
                } else {
                    self.add_token(TokenType::Slash, None)
                }
            }

            // Ignore whitespace
            " " | "\r" | "\t" => Ok(()),

            // Newline
            "\n" | "\r\n" => {
                self.line += 1;
                Ok(())
            }

            r#"""# => self.string(),

            str => {
                if Scanner::is_digit(str) {
                    self.number()
                } else if Scanner::is_alpha(str) {
                    self.identifier()
                } else {
                    Err(ScanError::new(
                        self.line,
                        ScanErrorKind::UnexpectedCharacter,
                    ))
                }
            }
        }
    }

    fn number(&mut self) -> ScanResult<()> {
        self.consume_digits();

        // Look for a fractional part
        if let (Some("."), Some(next)) = (self.peek(), self.peek_next()) {
            if Scanner::is_digit(next) {
                // Consume .
                self.advance();
                self.consume_digits();
            }
        }

        // The lexeme is ASCII digits with an optional fraction, which `f64`
        // always accepts (overlong literals saturate to infinity). The error
        // only guards the conversion itself.
        let number = self
            .lexeme()
            .parse::<f64>()
            .map_err(|_| ScanError::new(self.line, ScanErrorKind::InvalidNumber))?;
        self.add_token(TokenType::Number, Some(Literal::Number(number)))
    }

    fn consume_digits(&mut self) {
        while let Some(str) = self.peek() {
            if !Scanner::is_digit(str) {
                break;
            }
            self.advance();
        }
    }

    fn identifier(&mut self) -> ScanResult<()> {
        while let Some(str) = self.peek() {
            if !Scanner::is_alphanumeric(str) {
                break;
            }
            self.advance();
        }

        let token_type = TokenType::keyword(&self.lexeme()).unwrap_or(TokenType::Identifier);

        self.add_token(token_type, None)
    }

    fn string(&mut self) -> ScanResult<()> {
        while let Some(str) = self.peek() {
            if str == r#"""# {
                break;
            }

            if Scanner::is_newline(str) {
                self.line += 1;
            }

            self.advance();
        }

        if self.is_at_end() {
            return Err(ScanError::new(self.line, ScanErrorKind::UnterminatedString));
        }

        // Consume the closing "
        self.advance();

        // Trim surrounding quotes
        let string_literal =
            Literal::String(self.graphemes[self.start + 1..self.current - 1].concat());
        self.add_token(TokenType::String, Some(string_literal))
    }

    fn is_digit(str: &str) -> bool {
        !str.is_empty() && str.bytes().all(|c| c.is_ascii_digit())
    }

    fn is_alpha(str: &str) -> bool {
        (!str.is_empty() && str.bytes().all(|c| c.is_ascii_alphabetic())) || str == "_"
    }

    fn is_alphanumeric(str: &str) -> bool {
        (!str.is_empty() && str.bytes().all(|c| c.is_ascii_alphanumeric())) || str == "_"
    }

    fn is_newline(str: &str) -> bool {
        str == "\n" || str == "\r\n"
    }

    fn peek(&self) -> Option<&'a str> {
        self.graphemes.get(self.current).copied()
    }

    fn peek_next(&self) -> Option<&'a str> {
        self.graphemes.get(self.current + 1).copied()
    }

    fn matches(&mut self, expected: &str) -> bool {
        match self.peek() {
            Some(str) if str == expected => {
                self.current += 1;
                true
            }
            _ => false,
        }
    }

    fn advance(&mut self) -> &'a str {
        let grapheme = self.peek().unwrap_or_default();
        self.current += 1;
        grapheme
    }

    fn lexeme(&self) -> String {
        self.graphemes[self.start..self.current].concat()
    }

    fn add_token(&mut self, token_type: TokenType, literal: Option<Literal>) -> ScanResult<()> {
        let lexeme = self.lexeme();
        self.tokens
            .push(Token::new(token_type, lexeme, literal, self.line));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanError {
    line: u32,
    kind: ScanErrorKind,
}

impl ScanError {
    pub fn new(line: u32, kind: ScanErrorKind) -> Self {
        ScanError { line, kind }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn kind(&self) -> &ScanErrorKind {
        &self.kind
    }
}

impl Error for ScanError {}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error: {}", self.line, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanErrorKind {
    UnexpectedCharacter,
    UnterminatedString,
    InvalidNumber,
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            Self::UnexpectedCharacter => write!(f, "Unexpected character."),
            Self::UnterminatedString => write!(f, "Unterminated string."),
            Self::InvalidNumber => write!(f, "Invalid number literal."),
        }
    }
}
