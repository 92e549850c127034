//! Tokenizer for COOL source files.
//!
//! Most tokens are recognized by straightforward `logos` patterns, but two
//! constructs need hand-written scanning because they aren't regular in the
//! way `logos` wants: string literals (escapes, continued lines, embedded
//! NUL is an error) and block comments (`(* ... *)` nests). Both are
//! implemented as callbacks that walk `lex.remainder()` and `bump` past what
//! they consume, the standard pattern for doing manual lexing inside a
//! `logos` token.
//!
//! Keywords are matched case-insensitively via `ignore(ascii_case)` and given
//! a higher priority than the identifier regex so an exact-length tie (e.g.
//! `"class"` matching both the `Class` keyword and the identifier pattern)
//! resolves to the keyword. `true`/`false` are the one exception: COOL only
//! recognizes them as boolean literals with a lowercase first letter
//! (`True` is a type identifier), so they're resolved in [`classify_word`]
//! instead of as ordinary keyword tokens.

use logos::{Lexer as LogosLexer, Logos};
use std::ops::Range;

/// COOL string constants may be at most this many characters once escapes
/// are resolved; a longer literal is a lexical error rather than being
/// silently truncated.
const MAX_STRING_LEN: usize = 1024;

/// What an identifier-shaped word turned out to mean. Kept separate from
/// [`Token`] (rather than e.g. embedding `Token` itself) since this is the
/// payload of `Token::Ident` and a self-referential field would make the
/// enum infinite-sized.
#[derive(Debug, Clone, PartialEq)]
enum IdentKind {
    Bool(bool),
    TypeId(String),
    ObjectId(String),
}

fn classify_word(word: &str) -> IdentKind {
    let lower = word.to_ascii_lowercase();
    if lower == "true" && word.starts_with('t') {
        return IdentKind::Bool(true);
    }
    if lower == "false" && word.starts_with('f') {
        return IdentKind::Bool(false);
    }
    if word.starts_with(|c: char| c.is_ascii_uppercase()) {
        IdentKind::TypeId(word.to_string())
    } else {
        IdentKind::ObjectId(word.to_string())
    }
}

/// Scans a `(* ... *)` block comment, which may nest, starting just after
/// the opening `(*` has been consumed by the token's literal prefix.
/// Returns `Err` (unterminated) if EOF is hit before the matching close.
fn lex_block_comment(lex: &mut LogosLexer<'_, Token>) -> Result<(), LexErrorKind> {
    let rest = lex.remainder();
    let mut depth = 1usize;
    let mut chars = rest.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == '(' && chars.peek().map(|(_, n)| *n) == Some('*') {
            chars.next();
            depth += 1;
        } else if c == '*' && chars.peek().map(|(_, n)| *n) == Some(')') {
            chars.next();
            depth -= 1;
            if depth == 0 {
                lex.bump(i + 2);
                return Ok(());
            }
        }
    }
    lex.bump(rest.len());
    Err(LexErrorKind::UnterminatedComment)
}

/// Scans a `"..."` string literal, starting just after the opening quote.
/// Handles `\n \t \b \f \\ \" \<newline>` escapes, rejects embedded NUL and
/// unescaped raw newlines, and enforces [`MAX_STRING_LEN`].
fn lex_string(lex: &mut LogosLexer<'_, Token>) -> Result<String, LexErrorKind> {
    let rest = lex.remainder();
    let mut out = String::new();
    let mut iter = rest.char_indices();

    loop {
        let Some((i, c)) = iter.next() else {
            lex.bump(rest.len());
            return Err(LexErrorKind::UnterminatedString);
        };
        let consumed = i + c.len_utf8();
        match c {
            '"' => {
                lex.bump(consumed);
                if out.chars().count() > MAX_STRING_LEN {
                    return Err(LexErrorKind::StringTooLong);
                }
                return Ok(out);
            }
            '\0' => {
                lex.bump(consumed);
                return Err(LexErrorKind::NullInString);
            }
            '\n' => {
                lex.bump(consumed);
                return Err(LexErrorKind::UnterminatedString);
            }
            '\\' => match iter.next() {
                Some((j, esc)) => {
                    let consumed = j + esc.len_utf8();
                    match esc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'b' => out.push('\u{8}'),
                        'f' => out.push('\u{C}'),
                        '"' => out.push('"'),
                        '\\' => out.push('\\'),
                        '\n' => out.push('\n'),
                        '\0' => {
                            lex.bump(consumed);
                            return Err(LexErrorKind::NullInString);
                        }
                        other => out.push(other),
                    }
                }
                None => {
                    lex.bump(consumed);
                    return Err(LexErrorKind::UnterminatedString);
                }
            },
            other => out.push(other),
        }
    }
}

/// Lexical tokens of COOL.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"--[^\n]*")]
#[logos(error = LexErrorKind)]
pub enum Token {
    #[token("class", ignore(ascii_case), priority = 10)]
    Class,
    #[token("else", ignore(ascii_case), priority = 10)]
    Else,
    #[token("fi", ignore(ascii_case), priority = 10)]
    Fi,
    #[token("if", ignore(ascii_case), priority = 10)]
    If,
    #[token("in", ignore(ascii_case), priority = 10)]
    In,
    #[token("inherits", ignore(ascii_case), priority = 10)]
    Inherits,
    #[token("isvoid", ignore(ascii_case), priority = 10)]
    IsVoid,
    #[token("let", ignore(ascii_case), priority = 10)]
    Let,
    #[token("loop", ignore(ascii_case), priority = 10)]
    Loop,
    #[token("pool", ignore(ascii_case), priority = 10)]
    Pool,
    #[token("then", ignore(ascii_case), priority = 10)]
    Then,
    #[token("while", ignore(ascii_case), priority = 10)]
    While,
    #[token("case", ignore(ascii_case), priority = 10)]
    Case,
    #[token("esac", ignore(ascii_case), priority = 10)]
    Esac,
    #[token("new", ignore(ascii_case), priority = 10)]
    New,
    #[token("of", ignore(ascii_case), priority = 10)]
    Of,
    #[token("not", ignore(ascii_case), priority = 10)]
    Not,

    BoolConst(bool),
    TypeId(String),
    ObjectId(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    IntConst(i64),

    #[token("\"", lex_string)]
    StrConst(String),

    #[token("(*", lex_block_comment)]
    BlockComment,

    #[token("<-")]
    Assign,
    #[token("=>")]
    Darrow,
    #[token("<=")]
    Le,
    #[token("<")]
    Lt,
    #[token("=")]
    Eq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("~")]
    Tilde,
    #[token("@")]
    At,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    /// Every identifier-shaped word routes through [`classify_word`]; this
    /// variant never survives past [`Lexer::next`], which flattens it into
    /// `BoolConst`/`TypeId`/`ObjectId`.
    #[regex(r"[A-Za-z][A-Za-z0-9_]*", |lex| classify_word(lex.slice()), priority = 5)]
    Ident(IdentKind),
}

/// One token together with its byte-offset span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub token: Token,
    pub span: Range<usize>,
}

pub struct Lexer<'source> {
    inner: LogosLexer<'source, Token>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
        }
    }
}

fn flatten_ident(kind: IdentKind) -> Token {
    match kind {
        IdentKind::Bool(b) => Token::BoolConst(b),
        IdentKind::TypeId(s) => Token::TypeId(s),
        IdentKind::ObjectId(s) => Token::ObjectId(s),
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<TokenSpan, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let token = self.inner.next()?;
            let span = self.inner.span();
            return Some(match token {
                Ok(Token::Ident(kind)) => Ok(TokenSpan {
                    token: flatten_ident(kind),
                    span,
                }),
                Ok(Token::BlockComment) => continue,
                Ok(tok) => Ok(TokenSpan { token: tok, span }),
                Err(kind) => Err(LexError { kind, span }),
            });
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, thiserror::Error)]
pub enum LexErrorKind {
    #[default]
    #[error("invalid character")]
    InvalidCharacter,
    #[error("unterminated string constant")]
    UnterminatedString,
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("string constant too long")]
    StringTooLong,
    #[error("null character in string")]
    NullInString,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Range<usize>,
}

impl LexError {
    /// Resolve this error into a rendered [`coolc_diagnostics::Diagnostic`]
    /// given the file name and full source it was lexed from.
    pub fn to_diagnostic(&self, file: &str, source: &str) -> coolc_diagnostics::Diagnostic {
        use coolc_diagnostics::{error_codes, Diagnostic, Span};
        let code = match self.kind {
            LexErrorKind::InvalidCharacter => error_codes::SYNTAX_ERROR,
            LexErrorKind::UnterminatedString => error_codes::UNTERMINATED_STRING,
            LexErrorKind::UnterminatedComment => error_codes::UNTERMINATED_COMMENT,
            LexErrorKind::StringTooLong => error_codes::STRING_TOO_LONG,
            LexErrorKind::NullInString => error_codes::INVALID_ESCAPE,
        };
        let span = Span::from_file_and_range(file, source, self.span.clone());
        Diagnostic::error(code, self.kind.to_string(), span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        Lexer::new(src).map(|r| r.unwrap().token).collect()
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            tokens("CLASS Class class"),
            vec![Token::Class, Token::Class, Token::Class]
        );
    }

    #[test]
    fn bool_const_requires_lowercase_first_letter() {
        assert_eq!(tokens("true false")[0], Token::BoolConst(true));
        assert_eq!(tokens("true false")[1], Token::BoolConst(false));
        // Uppercase first letter makes it a type identifier, not a bool literal.
        assert_eq!(tokens("True"), vec![Token::TypeId("True".to_string())]);
    }

    #[test]
    fn type_vs_object_identifiers() {
        assert_eq!(
            tokens("Main io"),
            vec![
                Token::TypeId("Main".to_string()),
                Token::ObjectId("io".to_string())
            ]
        );
    }

    #[test]
    fn string_escapes() {
        let toks = tokens("\"a\\nb\"");
        assert_eq!(toks, vec![Token::StrConst("a\nb".to_string())]);
    }

    #[test]
    fn nested_block_comments_are_skipped() {
        assert_eq!(
            tokens("(* outer (* inner *) still *) class"),
            vec![Token::Class]
        );
    }

    #[test]
    fn line_comments_are_skipped() {
        assert_eq!(tokens("class -- trailing comment\n"), vec![Token::Class]);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut lex = Lexer::new("\"unterminated");
        assert_eq!(
            lex.next().unwrap().unwrap_err().kind,
            LexErrorKind::UnterminatedString
        );
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        let mut lex = Lexer::new("(* unterminated");
        assert_eq!(
            lex.next().unwrap().unwrap_err().kind,
            LexErrorKind::UnterminatedComment
        );
    }
}
