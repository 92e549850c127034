//! `class ... { feature; feature; ... };` and feature grammar (spec.md §3:
//! a feature is either a field or a method).

use coolc_ast::{Class, Feature, Field, Formal, Method};
use coolc_lexer::Token;

use super::Parser;
use crate::ParseError;

impl<'a> Parser<'a> {
    pub(crate) fn parse_class(&mut self) -> Result<Class, ParseError> {
        let start = self.current_offset();
        self.consume(&Token::Class, "'class'")?;
        let name = self.consume_type_id("a class name")?;

        let parent_name = if self.match_token(&Token::Inherits) {
            Some(self.consume_type_id("a parent class name")?)
        } else {
            None
        };

        self.consume(&Token::LBrace, "'{'")?;
        let mut features = Vec::new();
        while !self.check(&Token::RBrace) {
            features.push(self.parse_feature()?);
            self.consume_semi()?;
        }
        self.consume(&Token::RBrace, "'}'")?;

        Ok(Class {
            span: self.span_from(start),
            name,
            parent_name,
            features,
        })
    }

    fn parse_feature(&mut self) -> Result<Feature, ParseError> {
        let start = self.current_offset();
        let name = self.consume_object_id("a feature name")?;

        if self.match_token(&Token::LParen) {
            let formals = self.parse_formals()?;
            self.consume(&Token::RParen, "')'")?;
            self.consume(&Token::Colon, "':'")?;
            let return_type = self.consume_type_id("a return type")?;
            self.consume(&Token::LBrace, "'{'")?;
            let body = self.parse_expression()?;
            self.consume(&Token::RBrace, "'}'")?;
            Ok(Feature::Method(Method {
                id: self.ids.next(),
                span: self.span_from(start),
                name,
                formals,
                return_type,
                body,
            }))
        } else {
            self.consume(&Token::Colon, "':'")?;
            let type_name = self.consume_type_id("a type")?;
            let init = if self.match_token(&Token::Assign) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            Ok(Feature::Field(Field {
                id: self.ids.next(),
                span: self.span_from(start),
                name,
                type_name,
                init,
            }))
        }
    }

    fn parse_formals(&mut self) -> Result<Vec<Formal>, ParseError> {
        let mut formals = Vec::new();
        if self.check(&Token::RParen) {
            return Ok(formals);
        }
        loop {
            let start = self.current_offset();
            let name = self.consume_object_id("a formal name")?;
            self.consume(&Token::Colon, "':'")?;
            let type_name = self.consume_type_id("a formal type")?;
            formals.push(Formal {
                span: self.span_from(start),
                name,
                type_name,
            });
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        Ok(formals)
    }
}
