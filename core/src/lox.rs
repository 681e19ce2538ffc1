use crate::{
    ast::Expression, diagnostics::Diagnostics, interpreter::Interpreter, parser::Parser,
    printers::AstPrinter, scanner::Scanner,
};

/// Drives one evaluation unit through the scanner, parser and interpreter.
///
/// The caller owns the `Diagnostics` and decides when to reset it: once per
/// line at an interactive prompt, never for a script.
#[derive(Debug, Default)]
pub struct Lox {
    interpreter: Interpreter,
}

impl Lox {
    /// Evaluates `source` and returns the rendered value, or `None` if any
    /// error was reported along the way.
    pub fn run(&mut self, source: &str, diagnostics: &mut Diagnostics) -> Option<String> {
        let expression = Lox::parse(source, diagnostics)?;

        #[cfg(feature = "dump")]
        eprintln!("== ast ==\n{}", AstPrinter.print(&expression));

        // Interpret AST
        self.interpreter.interpret(&expression, diagnostics)
    }

    /// Parses `source` and renders the tree instead of evaluating it.
    pub fn print_ast(&mut self, source: &str, diagnostics: &mut Diagnostics) -> Option<String> {
        Lox::parse(source, diagnostics).map(|expression| AstPrinter.print(&expression))
    }

    fn parse(source: &str, diagnostics: &mut Diagnostics) -> Option<Expression> {
        // Scan source into tokens
        let tokens = Scanner::new(source).scan_tokens(diagnostics);

        #[cfg(feature = "trace")]
        {
            eprintln!("== tokens ==");
            for token in &tokens {
                eprintln!("{}", token);
            }
        }

        // Parse tokens into AST
        let expression = Parser::new(tokens).parse(diagnostics);

        // A lexical error leaves holes in the token stream, so a tree parsed
        // from it is not worth evaluating.
        if diagnostics.had_error() {
            return None;
        }

        expression
    }
}
