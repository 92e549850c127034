//! Recursive-descent parser, organized the way the teacher splits a parser:
//! one module per grammar concern, a thin `Parser` struct in `mod.rs`
//! carrying the token stream and cursor, shared helpers (`check`/`advance`/
//! `consume`) here, grammar productions in the sibling modules.

use coolc_ast::{NodeIdGen, Program};
use coolc_lexer::{Lexer, Token, TokenSpan};

use crate::ParseError;

mod classes;
mod expressions;

pub struct Parser<'a> {
    pub(crate) tokens: Vec<TokenSpan>,
    pub(crate) current: usize,
    pub(crate) file: String,
    pub(crate) source: &'a str,
    pub(crate) ids: NodeIdGen,
}

impl<'a> Parser<'a> {
    pub fn new(file: &str, source: &'a str) -> Result<Self, ParseError> {
        let tokens: Result<Vec<_>, _> = Lexer::new(source).collect();
        let tokens = tokens?;
        Ok(Self {
            tokens,
            current: 0,
            file: file.to_string(),
            source,
            ids: NodeIdGen::new(),
        })
    }

    /// Parse a whole COOL source file into a `Program` (one or more classes).
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut classes = Vec::new();
        while !self.is_at_end() {
            classes.push(self.parse_class()?);
            self.consume_semi()?;
        }
        Ok(Program { classes })
    }

    // ==================== token-stream helpers ====================

    pub(crate) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current).map(|t| &t.token)
    }

    pub(crate) fn peek_span(&self) -> std::ops::Range<usize> {
        self.tokens
            .get(self.current)
            .map(|t| t.span.clone())
            .unwrap_or_else(|| {
                let end = self.source.len();
                end..end
            })
    }

    pub(crate) fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.current).map(|t| t.token.clone());
        if tok.is_some() {
            self.current += 1;
        }
        tok
    }

    pub(crate) fn check(&self, kind: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(kind))
    }

    pub(crate) fn match_token(&mut self, kind: &Token) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn consume(&mut self, kind: &Token, expected: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance().expect("checked by `check` above"))
        } else {
            Err(self.unexpected(expected))
        }
    }

    pub(crate) fn consume_semi(&mut self) -> Result<(), ParseError> {
        self.consume(&Token::Semi, "';'").map(|_| ())
    }

    pub(crate) fn consume_type_id(&mut self, expected: &str) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::TypeId(_)) => match self.advance() {
                Some(Token::TypeId(s)) => Ok(s),
                _ => unreachable!(),
            },
            _ => Err(self.unexpected(expected)),
        }
    }

    pub(crate) fn consume_object_id(&mut self, expected: &str) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::ObjectId(_)) => match self.advance() {
                Some(Token::ObjectId(s)) => Ok(s),
                _ => unreachable!(),
            },
            _ => Err(self.unexpected(expected)),
        }
    }

    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        let span = self.peek_span();
        match self.peek() {
            Some(tok) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token_description(tok),
                span,
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
                span,
            },
        }
    }

    /// `Span` for the node currently being parsed, anchored at `start` (a
    /// byte offset captured before parsing began) through the token just
    /// consumed.
    pub(crate) fn span_from(&self, start: usize) -> coolc_diagnostics::Span {
        let end = if self.current == 0 {
            start
        } else {
            self.tokens
                .get(self.current - 1)
                .map(|t| t.span.end)
                .unwrap_or(start)
        };
        coolc_diagnostics::Span::from_file_and_range(&self.file, self.source, start..end)
    }

    pub(crate) fn current_offset(&self) -> usize {
        self.tokens
            .get(self.current)
            .map(|t| t.span.start)
            .unwrap_or(self.source.len())
    }
}

fn token_description(tok: &Token) -> String {
    match tok {
        Token::Class => "'class'".to_string(),
        Token::Else => "'else'".to_string(),
        Token::Fi => "'fi'".to_string(),
        Token::If => "'if'".to_string(),
        Token::In => "'in'".to_string(),
        Token::Inherits => "'inherits'".to_string(),
        Token::IsVoid => "'isvoid'".to_string(),
        Token::Let => "'let'".to_string(),
        Token::Loop => "'loop'".to_string(),
        Token::Pool => "'pool'".to_string(),
        Token::Then => "'then'".to_string(),
        Token::While => "'while'".to_string(),
        Token::Case => "'case'".to_string(),
        Token::Esac => "'esac'".to_string(),
        Token::New => "'new'".to_string(),
        Token::Of => "'of'".to_string(),
        Token::Not => "'not'".to_string(),
        Token::BoolConst(b) => format!("boolean literal `{b}`"),
        Token::TypeId(s) => format!("type identifier `{s}`"),
        Token::ObjectId(s) => format!("identifier `{s}`"),
        Token::IntConst(n) => format!("integer literal `{n}`"),
        Token::StrConst(_) => "string literal".to_string(),
        Token::BlockComment => "comment".to_string(),
        Token::Assign => "'<-'".to_string(),
        Token::Darrow => "'=>'".to_string(),
        Token::Le => "'<='".to_string(),
        Token::Lt => "'<'".to_string(),
        Token::Eq => "'='".to_string(),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Star => "'*'".to_string(),
        Token::Slash => "'/'".to_string(),
        Token::Tilde => "'~'".to_string(),
        Token::At => "'@'".to_string(),
        Token::Dot => "'.'".to_string(),
        Token::Colon => "':'".to_string(),
        Token::Semi => "';'".to_string(),
        Token::Comma => "','".to_string(),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::LBrace => "'{'".to_string(),
        Token::RBrace => "'}'".to_string(),
        Token::Ident(_) => "identifier".to_string(),
    }
}
