use crate::token::Token;
use crate::types::Literal;

pub trait ExpressionVisitor {
    type Result;

    fn visit_expr(&mut self, expression: &Expression) -> Self::Result;
}

/// An expression tree. Every node owns its children.
///
/// The grammar currently only builds `Binary`, `Grouping`, `Literal` and
/// `Unary` nodes; the other variants can be constructed but are not parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Assign {
        name: Token,
        value: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        operator: Token,
        right: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        paren: Token,
        arguments: Vec<Expression>,
    },
    Get {
        object: Box<Expression>,
        name: Token,
    },
    Grouping {
        expr: Box<Expression>,
    },
    Literal {
        literal: Literal,
    },
    Logical {
        left: Box<Expression>,
        operator: Token,
        right: Box<Expression>,
    },
    Set {
        object: Box<Expression>,
        name: Token,
        value: Box<Expression>,
    },
    Super {
        keyword: Token,
        method: Token,
    },
    This {
        keyword: Token,
    },
    Unary {
        operator: Token,
        expr: Box<Expression>,
    },
    Variable {
        name: Token,
    },
}

impl Expression {
    pub fn assign(name: Token, value: Box<Expression>) -> Self {
        Expression::Assign { name, value }
    }

    pub fn binary(left: Box<Expression>, operator: Token, right: Box<Expression>) -> Self {
        Expression::Binary {
            left,
            operator,
            right,
        }
    }

    pub fn call(callee: Box<Expression>, paren: Token, arguments: Vec<Expression>) -> Self {
        Expression::Call {
            callee,
            paren,
            arguments,
        }
    }

    pub fn get(object: Box<Expression>, name: Token) -> Self {
        Expression::Get { object, name }
    }

    pub fn grouping(expr: Box<Expression>) -> Self {
        Expression::Grouping { expr }
    }

    pub fn literal(literal: Literal) -> Self {
        Expression::Literal { literal }
    }

    pub fn logical(left: Box<Expression>, operator: Token, right: Box<Expression>) -> Self {
        Expression::Logical {
            left,
            operator,
            right,
        }
    }

    pub fn set(object: Box<Expression>, name: Token, value: Box<Expression>) -> Self {
        Expression::Set {
            object,
            name,
            value,
        }
    }

    pub fn superr(keyword: Token, method: Token) -> Self {
        Expression::Super { keyword, method }
    }

    pub fn this(keyword: Token) -> Self {
        Expression::This { keyword }
    }

    pub fn unary(operator: Token, expr: Box<Expression>) -> Self {
        Expression::Unary { operator, expr }
    }

    pub fn variable(name: Token) -> Self {
        Expression::Variable { name }
    }

    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Result {
        visitor.visit_expr(self)
    }
}
