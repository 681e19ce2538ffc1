use crate::ast::{Expression, ExpressionVisitor};

/// Renders an expression tree in a Lisp-like prefix form, e.g.
/// `(* (- 123) (group 45.67))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(&mut self, e: &Expression) -> String {
        e.accept(self)
    }

    fn parenthesize(&mut self, name: &str, expressions: &[&Expression]) -> String {
        let mut result = format!("({}", name);
        for expression in expressions {
            result.push(' ');
            result.push_str(&expression.accept(self));
        }
        result.push(')');
        result
    }
}

impl ExpressionVisitor for AstPrinter {
    type Result = String;

    fn visit_expr(&mut self, expression: &Expression) -> Self::Result {
        match expression {
            Expression::Assign { name, value } => {
                self.parenthesize(&format!("= {}", name.lexeme), &[value.as_ref()])
            }
            Expression::Binary {
                left,
                operator,
                right,
            }
            | Expression::Logical {
                left,
                operator,
                right,
            } => self.parenthesize(&operator.lexeme, &[left.as_ref(), right.as_ref()]),
            Expression::Call {
                callee, arguments, ..
            } => {
                let mut expressions: Vec<&Expression> = vec![callee.as_ref()];
                expressions.extend(arguments.iter());
                self.parenthesize("call", &expressions)
            }
            Expression::Get { object, name } => {
                self.parenthesize(&format!(". {}", name.lexeme), &[object.as_ref()])
            }
            Expression::Grouping { expr } => self.parenthesize("group", &[expr.as_ref()]),
            Expression::Literal { literal } => literal.to_string(),
            Expression::Set {
                object,
                name,
                value,
            } => self.parenthesize(
                &format!("= {}", name.lexeme),
                &[object.as_ref(), value.as_ref()],
            ),
            Expression::Super { method, .. } => format!("(super {})", method.lexeme),
            Expression::This { .. } => "this".to_string(),
            Expression::Unary { operator, expr } => {
                self.parenthesize(&operator.lexeme, &[expr.as_ref()])
            }
            Expression::Variable { name } => name.lexeme.clone(),
        }
    }
}
