use std::{error::Error, fmt};

use crate::{
    ast::Expression,
    diagnostics::Diagnostics,
    token::{Token, TokenType},
    types::Literal,
};

pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Deepest run of groupings and unary operators a single expression may nest.
pub const MAX_NESTING: usize = 100;

/// Recursive descent parser for expressions.
///
/// Each precedence level is one method; lower levels call the next higher one
/// to parse their operands, so the call chain fixes the precedence table.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|token| token.token_type) != Some(TokenType::Eof) {
            let line = tokens.last().map_or(1, |token| token.line);
            tokens.push(Token::eof(line));
        }

        Parser {
            tokens,
            current: 0,
            depth: 0,
        }
    }

    /// Parses one expression. On a syntax error the error is reported, the
    /// parser skips ahead to the next statement boundary and `None` is returned.
    pub fn parse(&mut self, diagnostics: &mut Diagnostics) -> Option<Expression> {
        match self.expression() {
            Ok(expression) => Some(expression),
            Err(error) => {
                diagnostics.report_syntax(error);
                self.synchronize();
                None
            }
        }
    }

    fn expression(&mut self) -> ParseResult<Expression> {
        self.equality()
    }

    fn equality(&mut self) -> ParseResult<Expression> {
        let mut left = self.comparison()?;

        while self.matches(&[TokenType::BangEqual, TokenType::EqualEqual]) {
            let operator = self.previous();
            let right = self.comparison()?;
            left = Expression::binary(Box::new(left), operator, Box::new(right));
        }

        Ok(left)
    }

    fn comparison(&mut self) -> ParseResult<Expression> {
        let mut left = self.term()?;

        while self.matches(&[
            TokenType::Greater,
            TokenType::GreaterEqual,
            TokenType::Less,
            TokenType::LessEqual,
        ]) {
            let operator = self.previous();
            let right = self.term()?;
            left = Expression::binary(Box::new(left), operator, Box::new(right));
        }

        Ok(left)
    }

    fn term(&mut self) -> ParseResult<Expression> {
        let mut left = self.factor()?;

        while self.matches(&[TokenType::Minus, TokenType::Plus]) {
            let operator = self.previous();
            let right = self.factor()?;
            left = Expression::binary(Box::new(left), operator, Box::new(right));
        }

        Ok(left)
    }

    fn factor(&mut self) -> ParseResult<Expression> {
        let mut left = self.unary()?;

        while self.matches(&[TokenType::Slash, TokenType::Star]) {
            let operator = self.previous();
            let right = self.unary()?;
            left = Expression::binary(Box::new(left), operator, Box::new(right));
        }

        Ok(left)
    }

    fn unary(&mut self) -> ParseResult<Expression> {
        if self.matches(&[TokenType::Bang, TokenType::Minus]) {
            let operator = self.previous();
            self.nest(&operator)?;
            let right = self.unary();
            self.depth -= 1;
            return Ok(Expression::unary(operator, Box::new(right?)));
        }

        self.primary()
    }

    fn primary(&mut self) -> ParseResult<Expression> {
        if self.matches(&[TokenType::True]) {
            return Ok(Expression::literal(Literal::True));
        }

        if self.matches(&[TokenType::False]) {
            return Ok(Expression::literal(Literal::False));
        }

        if self.matches(&[TokenType::Nil]) {
            return Ok(Expression::literal(Literal::Nil));
        }

        if self.matches(&[TokenType::Number, TokenType::String]) {
            let token = self.previous();
            return match token.literal.clone() {
                Some(literal) => Ok(Expression::literal(literal)),
                None => Err(ParseError::new(token, ParseErrorKind::ExpectedExpression)),
            };
        }

        if self.matches(&[TokenType::LeftParen]) {
            let paren = self.previous();
            self.nest(&paren)?;
            let expression = self.expression();
            self.depth -= 1;
            let expression = expression?;
            return self
                .consume(
                    TokenType::RightParen,
                    ParseErrorKind::ExpectedRightParenthesis,
                )
                .map(|_| Expression::grouping(Box::new(expression)));
        }

        Err(ParseError::new(
            self.peek().clone(),
            ParseErrorKind::ExpectedExpression,
        ))
    }

    // The evaluator and printers recurse once per level of the tree, so the
    // parser is where its depth gets bounded.
    fn nest(&mut self, token: &Token) -> ParseResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::new(token.clone(), ParseErrorKind::TooMuchNesting));
        }

        self.depth += 1;
        Ok(())
    }

    fn matches(&mut self, token_types: &[TokenType]) -> bool {
        for &token_type in token_types.iter() {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }

        false
    }

    fn check(&self, token_type: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == token_type
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    fn previous(&self) -> Token {
        self.tokens[self.current.saturating_sub(1)].clone()
    }

    fn consume(&mut self, token_type: TokenType, error_kind: ParseErrorKind) -> ParseResult<Token> {
        if self.check(token_type) {
            return Ok(self.advance());
        }

        Err(ParseError::new(self.peek().clone(), error_kind))
    }

    // Skips to the start of the next statement. There is no statement grammar
    // yet, so this only ever positions the cursor for a future one.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::Semicolon {
                return;
            }

            if self.peek().token_type.starts_statement() {
                return;
            }

            self.advance();
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    token: Token,
    kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(token: Token, kind: ParseErrorKind) -> Self {
        ParseError { token, kind }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

impl Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.token.token_type == TokenType::Eof {
            write!(f, "[line {}] Error at end: {}", self.token.line, self.kind)
        } else {
            write!(
                f,
                "[line {}] Error at '{}': {}",
                self.token.line, self.token.lexeme, self.kind
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    ExpectedExpression,
    ExpectedRightParenthesis,
    TooMuchNesting,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            Self::ExpectedExpression => write!(f, "Expect expression."),
            Self::ExpectedRightParenthesis => write!(f, "Expect ')' after expression."),
            Self::TooMuchNesting => write!(f, "Too much nesting."),
        }
    }
}
