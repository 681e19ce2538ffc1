//! Scanner, parser and tree-walking evaluator for Lox expressions.

pub mod ast;
pub mod diagnostics;
pub mod interpreter;
pub mod lox;
pub mod parser;
pub mod printers;
pub mod scanner;
pub mod token;
pub mod types;

pub use crate::diagnostics::{Diagnostic, Diagnostics};
pub use crate::lox::Lox;
