//! Recursive-descent parser for COOL, turning a [`coolc_lexer::Lexer`] token
//! stream into a `coolc_ast::Program`.
//!
//! Out of the core scope spec.md §1 describes (the core is hierarchy
//! building, type checking and code generation) but required for the
//! workspace to compile a program end to end.

mod parser;
pub use parser::Parser;

use coolc_diagnostics::{error_codes, Diagnostic, Span};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: std::ops::Range<usize>,
    },
    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof {
        expected: String,
        span: std::ops::Range<usize>,
    },
    #[error("lexer error: {0}")]
    LexError(#[from] coolc_lexer::LexError),
}

impl ParseError {
    pub fn to_diagnostic(&self, file: &str, source: &str) -> Diagnostic {
        let (code, message, span) = match self {
            ParseError::UnexpectedToken {
                expected,
                found,
                span,
            } => (
                error_codes::UNEXPECTED_TOKEN,
                format!("expected {expected}, found {found}"),
                span.clone(),
            ),
            ParseError::UnexpectedEof { expected, span } => (
                error_codes::UNEXPECTED_EOF,
                format!("unexpected end of file, expected {expected}"),
                span.clone(),
            ),
            ParseError::LexError(e) => return e.to_diagnostic(file, source),
        };
        Diagnostic::error(code, message, Span::from_file_and_range(file, source, span))
    }
}
