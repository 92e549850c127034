// Diagnostic reporting shared by every phase of the compiler: the lexer,
// the parser, and each sub-phase of the core (hierarchy, features, typing).
// Rendering follows rustc's single-line-snippet-plus-caret convention.

use colored::Colorize;
use std::fmt;
use std::path::Path;

/// Source code location (line, column, file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub length: usize,
}

impl Span {
    pub fn new(file: String, line: usize, column: usize, length: usize) -> Self {
        Self {
            file,
            line,
            column,
            length,
        }
    }

    /// Compute line/column from a byte offset range into `source`.
    pub fn from_file_and_range(file: &str, source: &str, range: std::ops::Range<usize>) -> Self {
        let before = &source[..range.start];
        let line = before.chars().filter(|&c| c == '\n').count() + 1;
        let column = before
            .rfind('\n')
            .map_or(before.len() + 1, |pos| before.len() - pos);
        let length = range.end.saturating_sub(range.start).max(1);
        Self {
            file: file.to_string(),
            line,
            column,
            length,
        }
    }

    pub fn unknown() -> Self {
        Self {
            file: "<unknown>".to_string(),
            line: 0,
            column: 0,
            length: 0,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        Self {
            file: path.display().to_string(),
            line: 0,
            column: 0,
            length: 0,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLevel {
    Error,
    Warning,
    Note,
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorLevel::Error => write!(f, "{}", "error".red().bold()),
            ErrorLevel::Warning => write!(f, "{}", "warning".yellow().bold()),
            ErrorLevel::Note => write!(f, "{}", "note".cyan().bold()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: ErrorLevel,
    pub code: String,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(level: ErrorLevel, code: &str, message: String, span: Span) -> Self {
        Self {
            level,
            code: code.to_string(),
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn error(code: &str, message: String, span: Span) -> Self {
        Self::new(ErrorLevel::Error, code, message, span)
    }

    pub fn warning(code: &str, message: String, span: Span) -> Self {
        Self::new(ErrorLevel::Warning, code, message, span)
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Render in rustc style: header, `--> file:line:col`, source snippet
    /// with a caret underline, then notes/help.
    pub fn format(&self, source_code: &str) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "{}[{}]: {}\n",
            self.level,
            self.code,
            self.message.bold()
        ));
        out.push_str(&format!(
            " {} {}:{}:{}\n",
            "-->".cyan().bold(),
            self.span.file,
            self.span.line,
            self.span.column
        ));

        if let Some(snippet) = self.source_snippet(source_code) {
            out.push_str(&snippet);
        }

        for note in &self.notes {
            out.push_str(&format!(" {} {}\n", "=".cyan().bold(), note));
        }
        if let Some(help) = &self.help {
            out.push_str(&format!(" {} {}\n", "help:".green().bold(), help));
        }

        out
    }

    fn source_snippet(&self, source_code: &str) -> Option<String> {
        let lines: Vec<&str> = source_code.lines().collect();
        if self.span.line == 0 || self.span.line > lines.len() {
            return None;
        }
        let line = lines[self.span.line - 1];
        let width = self.span.line.to_string().len().max(2);

        let mut snippet = String::new();
        snippet.push_str(&format!(" {}\n", " ".repeat(width + 1).cyan()));
        snippet.push_str(&format!(
            " {} {}\n",
            format!("{:>width$}", self.span.line, width = width)
                .cyan()
                .bold(),
            line
        ));
        let padding = " ".repeat(width + 1 + self.span.column.saturating_sub(1));
        let underline = "^".repeat(self.span.length.max(1));
        snippet.push_str(&format!(
            " {} {}{}\n",
            " ".repeat(width + 1).cyan(),
            padding,
            underline.red().bold()
        ));
        Some(snippet)
    }
}

/// Accumulates diagnostics across a compilation phase; every sub-phase
/// (hierarchy, features, typing) reports through one of these rather than
/// failing on the first error, per spec.md's §7 error-handling policy.
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.level {
            ErrorLevel::Error => self.error_count += 1,
            ErrorLevel::Warning => self.warning_count += 1,
            ErrorLevel::Note => {}
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn emit_error(&mut self, code: &str, message: String, span: Span) {
        self.emit(Diagnostic::error(code, message, span));
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn print_all(&self, source_code: &str) {
        for diag in &self.diagnostics {
            eprintln!("{}", diag.format(source_code));
        }
    }

    pub fn print_summary(&self) {
        if self.error_count > 0 {
            eprintln!(
                "\n{}: {} error{} emitted",
                "error".red().bold(),
                self.error_count,
                if self.error_count == 1 { "" } else { "s" }
            );
        }
        if self.warning_count > 0 {
            eprintln!(
                "{}: {} warning{} emitted",
                "warning".yellow().bold(),
                self.warning_count,
                if self.warning_count == 1 { "" } else { "s" }
            );
        }
    }
}

/// Error codes grouped by compiler phase, per SPEC_FULL.md §4.6.
pub mod error_codes {
    // Lexing/parsing
    pub const SYNTAX_ERROR: &str = "E-SYN-001";
    pub const UNEXPECTED_TOKEN: &str = "E-SYN-002";
    pub const UNEXPECTED_EOF: &str = "E-SYN-003";
    pub const UNTERMINATED_STRING: &str = "E-SYN-004";
    pub const UNTERMINATED_COMMENT: &str = "E-SYN-005";
    pub const INVALID_ESCAPE: &str = "E-SYN-006";
    pub const STRING_TOO_LONG: &str = "E-SYN-007";

    // Hierarchy (spec.md §4.1)
    pub const REDEFINED_CLASS: &str = "E-HIER-001";
    pub const RESERVED_CLASS_NAME: &str = "E-HIER-002";
    pub const UNDEFINED_PARENT: &str = "E-HIER-003";
    pub const ILLEGAL_PARENT: &str = "E-HIER-004";
    pub const HIERARCHY_CYCLE: &str = "E-HIER-005";

    // Features (spec.md §4.1)
    pub const REDEFINED_METHOD: &str = "E-FEAT-001";
    pub const REDEFINED_FIELD: &str = "E-FEAT-002";
    pub const UNKNOWN_TYPE: &str = "E-FEAT-003";
    pub const INVALID_OVERRIDE: &str = "E-FEAT-004";

    // Typing (spec.md §4.2)
    pub const UNDEFINED_VARIABLE: &str = "E-TYPE-001";
    pub const TYPE_MISMATCH: &str = "E-TYPE-002";
    pub const UNDEFINED_METHOD: &str = "E-TYPE-003";
    pub const ARGUMENT_COUNT: &str = "E-TYPE-004";
    pub const WRONG_ARG_TYPE: &str = "E-TYPE-005";
    pub const NON_BOOL_PREDICATE: &str = "E-TYPE-006";
    pub const STATIC_DISPATCH_TYPE: &str = "E-TYPE-007";

    // Entry point (spec.md §7)
    pub const MISSING_MAIN_CLASS: &str = "E-ENTRY-001";
    pub const MISSING_MAIN_METHOD: &str = "E-ENTRY-002";
    pub const INVALID_MAIN_METHOD: &str = "E-ENTRY-003";
}

/// "Did you mean?" fuzzy matching for undefined variable/type/method
/// diagnostics, using Jaro-Winkler similarity.
pub mod fuzzy {
    use strsim::jaro_winkler;

    pub fn find_similar(target: &str, candidates: &[String], threshold: f64) -> Option<String> {
        candidates
            .iter()
            .map(|c| (c, jaro_winkler(target, c)))
            .filter(|(_, score)| *score > threshold)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(c, _)| c.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_header_and_location() {
        let source = "class Main {\n  x : Int <- y;\n};";
        let span = Span::new("test.cl".to_string(), 2, 8, 1);
        let diag = Diagnostic::error(
            error_codes::UNDEFINED_VARIABLE,
            "undefined variable \"y\"".to_string(),
            span,
        )
        .with_help("did you mean \"x\"?".to_string());

        let formatted = diag.format(source);
        assert!(formatted.contains("E-TYPE-001"));
        assert!(formatted.contains("test.cl:2:8"));
        assert!(formatted.contains("did you mean"));
    }

    #[test]
    fn engine_counts_by_level() {
        let mut engine = DiagnosticEngine::new();
        engine.emit_error(error_codes::REDEFINED_CLASS, "x".into(), Span::unknown());
        engine.emit(Diagnostic::warning(
            error_codes::UNKNOWN_TYPE,
            "y".into(),
            Span::unknown(),
        ));
        assert_eq!(engine.error_count(), 1);
        assert_eq!(engine.warning_count(), 1);
        assert!(engine.has_errors());
    }

    #[test]
    fn fuzzy_match_suggests_close_name() {
        let candidates = vec!["length".to_string(), "concat".to_string()];
        assert_eq!(
            fuzzy::find_similar("lenght", &candidates, 0.7),
            Some("length".to_string())
        );
    }
}
