use std::{fmt, io::Write};

use crate::{interpreter::RuntimeError, parser::ParseError, scanner::ScanError};

/// Exit code for a script with a lexical or syntax error.
pub const EXIT_DATA_ERROR: i32 = 65;
/// Exit code for a script that failed while being evaluated.
pub const EXIT_SOFTWARE_ERROR: i32 = 70;

#[derive(Debug, Clone)]
pub enum Diagnostic {
    Lexical(ScanError),
    Syntax(ParseError),
    Runtime(RuntimeError),
}

impl Diagnostic {
    pub fn line(&self) -> u32 {
        match self {
            Self::Lexical(error) => error.line(),
            Self::Syntax(error) => error.token().line,
            Self::Runtime(error) => error.token().line,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical(error) => write!(f, "{}", error),
            Self::Syntax(error) => write!(f, "{}", error),
            Self::Runtime(error) => write!(f, "{}", error),
        }
    }
}

/// Collects the errors reported while scanning, parsing and evaluating.
///
/// Every report is kept in order and, when a sink is attached, written to it as
/// one line. The two flags let a caller pick an exit code once a unit is done.
#[derive(Default)]
pub struct Diagnostics {
    sink: Option<Box<dyn Write>>,
    reports: Vec<Diagnostic>,
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn with_sink<W: Write + 'static>(sink: W) -> Self {
        Diagnostics {
            sink: Some(Box::new(sink)),
            ..Diagnostics::default()
        }
    }

    pub fn report_lex(&mut self, error: ScanError) {
        self.had_error = true;
        self.report(Diagnostic::Lexical(error));
    }

    pub fn report_syntax(&mut self, error: ParseError) {
        self.had_error = true;
        self.report(Diagnostic::Syntax(error));
    }

    pub fn report_runtime(&mut self, error: RuntimeError) {
        self.had_runtime_error = true;
        self.report(Diagnostic::Runtime(error));
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn reports(&self) -> &[Diagnostic] {
        self.reports.as_slice()
    }

    /// Forgets everything reported so far. The sink stays attached.
    pub fn reset(&mut self) {
        self.reports.clear();
        self.had_error = false;
        self.had_runtime_error = false;
    }

    pub fn exit_code(&self) -> Option<i32> {
        if self.had_error {
            Some(EXIT_DATA_ERROR)
        } else if self.had_runtime_error {
            Some(EXIT_SOFTWARE_ERROR)
        } else {
            None
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        if let Some(sink) = self.sink.as_mut() {
            // Nowhere left to report a failing error channel to.
            let _ = writeln!(sink, "{}", diagnostic);
            let _ = sink.flush();
        }
        self.reports.push(diagnostic);
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("reports", &self.reports)
            .field("had_error", &self.had_error)
            .field("had_runtime_error", &self.had_runtime_error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, io, rc::Rc};

    use super::*;
    use crate::{
        interpreter::RuntimeErrorKind,
        parser::ParseErrorKind,
        scanner::ScanErrorKind,
        token::{Token, TokenType},
    };

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn star(line: u32) -> Token {
        Token::new(TokenType::Star, "*".to_string(), None, line)
    }

    #[test]
    fn lexical_errors_have_no_context() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report_lex(ScanError::new(3, ScanErrorKind::UnexpectedCharacter));

        assert!(diagnostics.had_error());
        assert!(!diagnostics.had_runtime_error());
        assert_eq!(
            diagnostics.reports()[0].to_string(),
            "[line 3] Error: Unexpected character."
        );
    }

    #[test]
    fn syntax_errors_name_the_token() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report_syntax(ParseError::new(star(2), ParseErrorKind::ExpectedExpression));
        diagnostics.report_syntax(ParseError::new(
            Token::eof(4),
            ParseErrorKind::ExpectedRightParenthesis,
        ));

        let lines: Vec<String> = diagnostics.reports().iter().map(|d| d.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "[line 2] Error at '*': Expect expression.",
                "[line 4] Error at end: Expect ')' after expression.",
            ]
        );
        assert_eq!(diagnostics.exit_code(), Some(EXIT_DATA_ERROR));
    }

    #[test]
    fn runtime_errors_set_their_own_flag() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report_runtime(RuntimeError::new(
            star(7),
            RuntimeErrorKind::OperandsMustBeNumbers,
        ));

        assert!(!diagnostics.had_error());
        assert!(diagnostics.had_runtime_error());
        assert_eq!(diagnostics.reports()[0].line(), 7);
        assert_eq!(diagnostics.exit_code(), Some(EXIT_SOFTWARE_ERROR));
    }

    #[test]
    fn data_errors_win_the_exit_code() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report_runtime(RuntimeError::new(
            star(1),
            RuntimeErrorKind::OperandMustBeNumber,
        ));
        diagnostics.report_lex(ScanError::new(1, ScanErrorKind::UnterminatedString));

        assert_eq!(diagnostics.exit_code(), Some(EXIT_DATA_ERROR));
    }

    #[test]
    fn reset_clears_flags_and_reports() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report_lex(ScanError::new(1, ScanErrorKind::UnexpectedCharacter));
        diagnostics.reset();

        assert!(!diagnostics.had_error());
        assert!(diagnostics.reports().is_empty());
        assert_eq!(diagnostics.exit_code(), None);
    }

    #[test]
    fn reports_are_written_to_the_sink() {
        let buffer = SharedBuffer::default();
        let mut diagnostics = Diagnostics::with_sink(buffer.clone());
        diagnostics.report_lex(ScanError::new(1, ScanErrorKind::UnexpectedCharacter));
        diagnostics.report_runtime(RuntimeError::new(
            star(2),
            RuntimeErrorKind::OperandsMustBeNumbersOrStrings,
        ));

        let written = String::from_utf8(buffer.0.borrow().clone()).unwrap();
        assert_eq!(
            written,
            "[line 1] Error: Unexpected character.\n\
             [line 2] Error: Operands must be two numbers or strings.\n"
        );
    }
}
