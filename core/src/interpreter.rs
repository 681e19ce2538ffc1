use crate::{
    ast::{Expression, ExpressionVisitor},
    diagnostics::Diagnostics,
    token::{Token, TokenType},
    types::Value,
};

use std::{error::Error, fmt};

/// Tree-walking evaluator for expressions.
#[derive(Debug, Default)]
pub struct Interpreter;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

impl Interpreter {
    /// Evaluates `expression` and renders the result for display. A runtime
    /// error is reported instead and nothing is rendered.
    pub fn interpret(
        &mut self,
        expression: &Expression,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        match self.evaluate(expression) {
            Ok(value) => Some(value.to_string()),
            Err(error) => {
                diagnostics.report_runtime(error);
                None
            }
        }
    }

    pub fn evaluate(&mut self, expression: &Expression) -> RuntimeResult<Value> {
        expression.accept(self)
    }

    fn unary(operator: &Token, right: Value) -> RuntimeResult<Value> {
        match (operator.token_type, right) {
            (TokenType::Bang, value) => Ok(Value::Boolean(!value.is_truthy())),
            (TokenType::Minus, Value::Number(n)) => Ok(Value::Number(-n)),
            (TokenType::Minus, _) => Err(RuntimeError::new(
                operator.clone(),
                RuntimeErrorKind::OperandMustBeNumber,
            )),
            _ => Err(RuntimeError::new(
                operator.clone(),
                RuntimeErrorKind::InvalidOperator,
            )),
        }
    }

    fn binary(left: Value, operator: &Token, right: Value) -> RuntimeResult<Value> {
        match operator.token_type {
            TokenType::EqualEqual => Ok(Value::Boolean(left == right)),
            TokenType::BangEqual => Ok(Value::Boolean(left != right)),
            TokenType::Plus => Interpreter::add(operator, left, right),
            TokenType::Greater
            | TokenType::GreaterEqual
            | TokenType::Less
            | TokenType::LessEqual
            | TokenType::Minus
            | TokenType::Slash
            | TokenType::Star => {
                let (ln, rn) = Interpreter::number_operands(operator, left, right)?;
                let value = match operator.token_type {
                    TokenType::Greater => Value::Boolean(ln > rn),
                    TokenType::GreaterEqual => Value::Boolean(ln >= rn),
                    TokenType::Less => Value::Boolean(ln < rn),
                    TokenType::LessEqual => Value::Boolean(ln <= rn),
                    TokenType::Minus => Value::Number(ln - rn),
                    TokenType::Slash => Value::Number(ln / rn),
                    _ => Value::Number(ln * rn),
                };
                Ok(value)
            }
            _ => Err(RuntimeError::new(
                operator.clone(),
                RuntimeErrorKind::InvalidOperator,
            )),
        }
    }

    // `+` is the only operator that accepts strings.
    fn add(operator: &Token, left: Value, right: Value) -> RuntimeResult<Value> {
        match (left, right) {
            (Value::Number(ln), Value::Number(rn)) => Ok(Value::Number(ln + rn)),
            (Value::String(mut ls), Value::String(rs)) => {
                ls.push_str(&rs);
                Ok(Value::String(ls))
            }
            _ => Err(RuntimeError::new(
                operator.clone(),
                RuntimeErrorKind::OperandsMustBeNumbersOrStrings,
            )),
        }
    }

    fn number_operands(operator: &Token, left: Value, right: Value) -> RuntimeResult<(f64, f64)> {
        match (left, right) {
            (Value::Number(ln), Value::Number(rn)) => Ok((ln, rn)),
            _ => Err(RuntimeError::new(
                operator.clone(),
                RuntimeErrorKind::OperandsMustBeNumbers,
            )),
        }
    }
}

impl ExpressionVisitor for Interpreter {
    type Result = RuntimeResult<Value>;

    fn visit_expr(&mut self, expression: &Expression) -> Self::Result {
        match expression {
            Expression::Literal { literal } => Ok(Value::from(literal)),
            Expression::Grouping { expr } => self.evaluate(expr),
            Expression::Unary { operator, expr } => {
                let right = self.evaluate(expr)?;
                Interpreter::unary(operator, right)
            }
            Expression::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Interpreter::binary(left, operator, right)
            }
            Expression::Assign { name, .. }
            | Expression::Get { name, .. }
            | Expression::Set { name, .. }
            | Expression::Variable { name } => Err(RuntimeError::new(
                name.clone(),
                RuntimeErrorKind::UnsupportedExpression,
            )),
            Expression::Call { paren, .. } => Err(RuntimeError::new(
                paren.clone(),
                RuntimeErrorKind::UnsupportedExpression,
            )),
            Expression::Logical { operator, .. } => Err(RuntimeError::new(
                operator.clone(),
                RuntimeErrorKind::UnsupportedExpression,
            )),
            Expression::Super { keyword, .. } | Expression::This { keyword } => Err(
                RuntimeError::new(keyword.clone(), RuntimeErrorKind::UnsupportedExpression),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    token: Token,
    kind: RuntimeErrorKind,
}

impl RuntimeError {
    pub fn new(token: Token, kind: RuntimeErrorKind) -> Self {
        RuntimeError { token, kind }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn kind(&self) -> &RuntimeErrorKind {
        &self.kind
    }
}

impl Error for RuntimeError {}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error: {}", self.token.line, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    OperandMustBeNumber,
    OperandsMustBeNumbers,
    OperandsMustBeNumbersOrStrings,
    InvalidOperator,
    UnsupportedExpression,
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperandMustBeNumber => write!(f, "Operand must be a number."),
            Self::OperandsMustBeNumbers => write!(f, "Operands must be numbers."),
            Self::OperandsMustBeNumbersOrStrings => {
                write!(f, "Operands must be two numbers or strings.")
            }
            Self::InvalidOperator => write!(f, "Invalid operator."),
            Self::UnsupportedExpression => write!(f, "Unsupported expression."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::Parser, scanner::Scanner, types::Literal};

    fn run(source: &str) -> RuntimeResult<Value> {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
        let expression = Parser::new(tokens)
            .parse(&mut diagnostics)
            .expect("Parse failed");
        Interpreter.evaluate(&expression)
    }

    fn error_kind(source: &str) -> RuntimeErrorKind {
        run(source).expect_err("Expected runtime error").kind
    }

    fn token(token_type: TokenType, lexeme: &str) -> Token {
        Token::new(token_type, lexeme.to_string(), None, 1)
    }

    #[test]
    fn literals() {
        assert_eq!(run("12.5"), Ok(Value::Number(12.5)));
        assert_eq!(run("\"lox\""), Ok(Value::String("lox".to_string())));
        assert_eq!(run("true"), Ok(Value::Boolean(true)));
        assert_eq!(run("nil"), Ok(Value::Nil));
    }

    #[test]
    fn arithmetic() {
        assert_eq!(run("1 + 2 * 3"), Ok(Value::Number(7.0)));
        assert_eq!(run("(1 + 2) * 3"), Ok(Value::Number(9.0)));
        assert_eq!(run("10 - 4 - 3"), Ok(Value::Number(3.0)));
        assert_eq!(run("7 / 2"), Ok(Value::Number(3.5)));
        assert_eq!(run("-(2 + 3)"), Ok(Value::Number(-5.0)));
    }

    #[test]
    fn plus_is_overloaded() {
        assert_eq!(run("2 + 2"), Ok(Value::Number(4.0)));
        assert_eq!(run("\"2\" + \"2\""), Ok(Value::String("22".to_string())));
        assert_eq!(
            error_kind("2 + \"2\""),
            RuntimeErrorKind::OperandsMustBeNumbersOrStrings
        );
        assert_eq!(
            error_kind("\"2\" + 2"),
            RuntimeErrorKind::OperandsMustBeNumbersOrStrings
        );
        assert_eq!(
            error_kind("nil + nil"),
            RuntimeErrorKind::OperandsMustBeNumbersOrStrings
        );
    }

    #[test]
    fn division_by_zero_is_not_an_error() {
        assert_eq!(run("10 / 0"), Ok(Value::Number(f64::INFINITY)));
        assert_eq!(run("-10 / 0"), Ok(Value::Number(f64::NEG_INFINITY)));
        match run("0 / 0") {
            Ok(Value::Number(n)) => assert!(n.is_nan()),
            other => panic!("Expected NaN, got {:?}", other),
        }
    }

    #[test]
    fn arithmetic_requires_numbers() {
        for source in ["1 - \"a\"", "\"a\" * 2", "true / 1", "nil - nil"] {
            assert_eq!(
                error_kind(source),
                RuntimeErrorKind::OperandsMustBeNumbers,
                "{}",
                source
            );
        }
    }

    #[test]
    fn comparison() {
        assert_eq!(run("1 < 2"), Ok(Value::Boolean(true)));
        assert_eq!(run("2 <= 2"), Ok(Value::Boolean(true)));
        assert_eq!(run("1 > 2"), Ok(Value::Boolean(false)));
        assert_eq!(run("3 >= 4"), Ok(Value::Boolean(false)));
        assert_eq!(
            error_kind("\"a\" < \"b\""),
            RuntimeErrorKind::OperandsMustBeNumbers
        );
        assert_eq!(error_kind("1 >= nil"), RuntimeErrorKind::OperandsMustBeNumbers);
    }

    #[test]
    fn equality() {
        assert_eq!(run("1 == 1"), Ok(Value::Boolean(true)));
        assert_eq!(run("2 != 3"), Ok(Value::Boolean(true)));
        assert_eq!(run("nil == nil"), Ok(Value::Boolean(true)));
        assert_eq!(run("\"a\" == \"a\""), Ok(Value::Boolean(true)));
        assert_eq!(run("true == true"), Ok(Value::Boolean(true)));
    }

    #[test]
    fn equality_across_kinds_is_false() {
        for source in [
            "nil == false",
            "0 == false",
            "\"1\" == 1",
            "\"\" == nil",
            "true == 1",
        ] {
            assert_eq!(run(source), Ok(Value::Boolean(false)), "{}", source);
        }
        assert_eq!(run("nil != 0"), Ok(Value::Boolean(true)));
    }

    #[test]
    fn negation() {
        assert_eq!(run("!true"), Ok(Value::Boolean(false)));
        assert_eq!(run("!nil"), Ok(Value::Boolean(true)));
        assert_eq!(run("!0"), Ok(Value::Boolean(false)));
        assert_eq!(run("!\"\""), Ok(Value::Boolean(false)));
        assert_eq!(run("--3"), Ok(Value::Number(3.0)));
        assert_eq!(error_kind("-\"3\""), RuntimeErrorKind::OperandMustBeNumber);
        assert_eq!(error_kind("-nil"), RuntimeErrorKind::OperandMustBeNumber);
    }

    #[test]
    fn errors_point_at_the_operator() {
        let error = run("1 +\n\n(true * 2)").expect_err("Expected runtime error");
        assert_eq!(error.token().lexeme, "*");
        assert_eq!(error.token().line, 3);
        assert_eq!(
            error.to_string(),
            "[line 3] Error: Operands must be numbers."
        );
    }

    #[test]
    fn operands_evaluate_left_first() {
        // The left operand fails before the right one is looked at.
        let error = run("(-\"a\") + (1 < nil)").expect_err("Expected runtime error");
        assert_eq!(error.kind(), &RuntimeErrorKind::OperandMustBeNumber);
    }

    #[test]
    fn interpret_renders_values() {
        let mut diagnostics = Diagnostics::new();
        let expression = Expression::binary(
            Box::new(Expression::literal(Literal::Number(6.0))),
            token(TokenType::Star, "*"),
            Box::new(Expression::literal(Literal::Number(7.0))),
        );

        assert_eq!(
            Interpreter.interpret(&expression, &mut diagnostics),
            Some("42".to_string())
        );
        assert!(diagnostics.reports().is_empty());
    }

    #[test]
    fn interpret_reports_runtime_errors() {
        let mut diagnostics = Diagnostics::new();
        let expression = Expression::unary(
            token(TokenType::Minus, "-"),
            Box::new(Expression::literal(Literal::True)),
        );

        assert_eq!(Interpreter.interpret(&expression, &mut diagnostics), None);
        assert!(diagnostics.had_runtime_error());
        assert!(!diagnostics.had_error());
        assert_eq!(
            diagnostics.reports()[0].to_string(),
            "[line 1] Error: Operand must be a number."
        );
    }

    #[test]
    fn unparsed_variants_are_unsupported() {
        let name = token(TokenType::Identifier, "x");
        let expressions = [
            Expression::variable(name.clone()),
            Expression::assign(
                name.clone(),
                Box::new(Expression::literal(Literal::Nil)),
            ),
            Expression::this(token(TokenType::This, "this")),
            Expression::superr(token(TokenType::Super, "super"), name.clone()),
            Expression::call(
                Box::new(Expression::variable(name.clone())),
                token(TokenType::RightParen, ")"),
                vec![],
            ),
            Expression::get(Box::new(Expression::variable(name.clone())), name.clone()),
            Expression::set(
                Box::new(Expression::variable(name.clone())),
                name.clone(),
                Box::new(Expression::literal(Literal::Nil)),
            ),
            Expression::logical(
                Box::new(Expression::literal(Literal::True)),
                token(TokenType::Or, "or"),
                Box::new(Expression::literal(Literal::False)),
            ),
        ];

        for expression in &expressions {
            let error = Interpreter
                .evaluate(expression)
                .expect_err("Expected runtime error");
            assert_eq!(error.kind(), &RuntimeErrorKind::UnsupportedExpression);
        }
    }

    #[test]
    fn unknown_operators_are_rejected() {
        let expression = Expression::binary(
            Box::new(Expression::literal(Literal::Number(1.0))),
            token(TokenType::Comma, ","),
            Box::new(Expression::literal(Literal::Number(2.0))),
        );
        let error = Interpreter
            .evaluate(&expression)
            .expect_err("Expected runtime error");
        assert_eq!(error.kind(), &RuntimeErrorKind::InvalidOperator);
    }
}
