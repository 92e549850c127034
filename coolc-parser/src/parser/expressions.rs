//! Expression grammar, by descending precedence (lowest first) per the COOL
//! reference grammar: `<-` (right-assoc) < `not` < `<= < =` (non-assoc) <
//! `+ -` (left-assoc) < `* /` (left-assoc) < `isvoid` < `~` < `@`/`.`
//! dispatch < primaries.

use coolc_ast::{CaseBranch, Expr, ExprKind};
use coolc_lexer::Token;

use super::Parser;
use crate::ParseError;

impl<'a> Parser<'a> {
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_assign()
    }

    fn parse_assign(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_offset();
        if let Some(Token::ObjectId(name)) = self.peek().cloned() {
            if matches!(self.tokens.get(self.current + 1).map(|t| &t.token), Some(Token::Assign)) {
                self.advance();
                self.advance();
                let value = self.parse_assign()?;
                return Ok(self.mk(start, ExprKind::Assign {
                    name,
                    value: Box::new(value),
                }));
            }
        }
        self.parse_not()
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_offset();
        if self.match_token(&Token::Not) {
            let operand = self.parse_not()?;
            return Ok(self.mk(start, ExprKind::Not(Box::new(operand))));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_offset();
        let left = self.parse_additive()?;
        let kind = if self.match_token(&Token::Lt) {
            ExprKind::LessThan(Box::new(left), Box::new(self.parse_additive()?))
        } else if self.match_token(&Token::Le) {
            ExprKind::LessOrEqual(Box::new(left), Box::new(self.parse_additive()?))
        } else if self.match_token(&Token::Eq) {
            ExprKind::Equal(Box::new(left), Box::new(self.parse_additive()?))
        } else {
            return Ok(left);
        };
        Ok(self.mk(start, kind))
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_offset();
        let mut left = self.parse_multiplicative()?;
        loop {
            let kind = if self.match_token(&Token::Plus) {
                ExprKind::Add(Box::new(left), Box::new(self.parse_multiplicative()?))
            } else if self.match_token(&Token::Minus) {
                ExprKind::Sub(Box::new(left), Box::new(self.parse_multiplicative()?))
            } else {
                return Ok(left);
            };
            left = self.mk(start, kind);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_offset();
        let mut left = self.parse_isvoid()?;
        loop {
            let kind = if self.match_token(&Token::Star) {
                ExprKind::Mul(Box::new(left), Box::new(self.parse_isvoid()?))
            } else if self.match_token(&Token::Slash) {
                ExprKind::Div(Box::new(left), Box::new(self.parse_isvoid()?))
            } else {
                return Ok(left);
            };
            left = self.mk(start, kind);
        }
    }

    fn parse_isvoid(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_offset();
        if self.match_token(&Token::IsVoid) {
            let operand = self.parse_isvoid()?;
            return Ok(self.mk(start, ExprKind::IsVoid(Box::new(operand))));
        }
        self.parse_neg()
    }

    fn parse_neg(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_offset();
        if self.match_token(&Token::Tilde) {
            let operand = self.parse_neg()?;
            return Ok(self.mk(start, ExprKind::Neg(Box::new(operand))));
        }
        self.parse_dispatch()
    }

    /// Postfix `.name(args)` and `@T.name(args)` chains over a primary.
    fn parse_dispatch(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_offset();
        let mut receiver = self.parse_primary()?;
        loop {
            if self.match_token(&Token::Dot) {
                let method = self.consume_object_id("a method name")?;
                self.consume(&Token::LParen, "'('")?;
                let args = self.parse_args()?;
                self.consume(&Token::RParen, "')'")?;
                receiver = self.mk(
                    start,
                    ExprKind::Invoke {
                        receiver: Some(Box::new(receiver)),
                        static_type: None,
                        method,
                        args,
                    },
                );
            } else if self.match_token(&Token::At) {
                let static_type = self.consume_type_id("a static dispatch type")?;
                self.consume(&Token::Dot, "'.'")?;
                let method = self.consume_object_id("a method name")?;
                self.consume(&Token::LParen, "'('")?;
                let args = self.parse_args()?;
                self.consume(&Token::RParen, "')'")?;
                receiver = self.mk(
                    start,
                    ExprKind::Invoke {
                        receiver: Some(Box::new(receiver)),
                        static_type: Some(static_type),
                        method,
                        args,
                    },
                );
            } else {
                break;
            }
        }
        Ok(receiver)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.check(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_offset();
        match self.peek().cloned() {
            Some(Token::IntConst(n)) => {
                self.advance();
                Ok(self.mk(start, ExprKind::IntConst(n)))
            }
            Some(Token::StrConst(s)) => {
                self.advance();
                Ok(self.mk(start, ExprKind::StrConst(s)))
            }
            Some(Token::BoolConst(b)) => {
                self.advance();
                Ok(self.mk(start, ExprKind::BoolConst(b)))
            }
            Some(Token::New) => {
                self.advance();
                let type_name = self.consume_type_id("a type name")?;
                Ok(self.mk(start, ExprKind::New { type_name }))
            }
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_expression()?;
                self.consume(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::LBrace) => self.parse_block(start),
            Some(Token::If) => self.parse_if(start),
            Some(Token::While) => self.parse_while(start),
            Some(Token::Let) => self.parse_let(start),
            Some(Token::Case) => self.parse_case(start),
            Some(Token::ObjectId(name)) => {
                self.advance();
                if self.match_token(&Token::LParen) {
                    let args = self.parse_args()?;
                    self.consume(&Token::RParen, "')'")?;
                    Ok(self.mk(
                        start,
                        ExprKind::Invoke {
                            receiver: None,
                            static_type: None,
                            method: name,
                            args,
                        },
                    ))
                } else {
                    Ok(self.mk(start, ExprKind::Var(name)))
                }
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_block(&mut self, start: usize) -> Result<Expr, ParseError> {
        self.consume(&Token::LBrace, "'{'")?;
        let mut exprs = Vec::new();
        loop {
            exprs.push(self.parse_expression()?);
            self.consume_semi()?;
            if self.check(&Token::RBrace) {
                break;
            }
        }
        self.consume(&Token::RBrace, "'}'")?;
        Ok(self.mk(start, ExprKind::Block(exprs)))
    }

    fn parse_if(&mut self, start: usize) -> Result<Expr, ParseError> {
        self.consume(&Token::If, "'if'")?;
        let predicate = self.parse_expression()?;
        self.consume(&Token::Then, "'then'")?;
        let then_branch = self.parse_expression()?;
        self.consume(&Token::Else, "'else'")?;
        let else_branch = self.parse_expression()?;
        self.consume(&Token::Fi, "'fi'")?;
        Ok(self.mk(
            start,
            ExprKind::If {
                predicate: Box::new(predicate),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
        ))
    }

    fn parse_while(&mut self, start: usize) -> Result<Expr, ParseError> {
        self.consume(&Token::While, "'while'")?;
        let predicate = self.parse_expression()?;
        self.consume(&Token::Loop, "'loop'")?;
        let body = self.parse_expression()?;
        self.consume(&Token::Pool, "'pool'")?;
        Ok(self.mk(
            start,
            ExprKind::While {
                predicate: Box::new(predicate),
                body: Box::new(body),
            },
        ))
    }

    /// `let x:T [<- init], y:T2 [<- init2], ... in body`, desugared into
    /// right-nested `Let` nodes (one binding per node, innermost is `body`).
    fn parse_let(&mut self, start: usize) -> Result<Expr, ParseError> {
        self.consume(&Token::Let, "'let'")?;
        let mut bindings = Vec::new();
        loop {
            let name = self.consume_object_id("a binding name")?;
            self.consume(&Token::Colon, "':'")?;
            let type_name = self.consume_type_id("a binding type")?;
            let init = if self.match_token(&Token::Assign) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            bindings.push((name, type_name, init));
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.consume(&Token::In, "'in'")?;
        let body = self.parse_expression()?;

        let mut result = body;
        for (name, type_name, init) in bindings.into_iter().rev() {
            result = self.mk(
                start,
                ExprKind::Let {
                    name,
                    type_name,
                    init: init.map(Box::new),
                    body: Box::new(result),
                },
            );
        }
        Ok(result)
    }

    fn parse_case(&mut self, start: usize) -> Result<Expr, ParseError> {
        self.consume(&Token::Case, "'case'")?;
        let scrutinee = self.parse_expression()?;
        self.consume(&Token::Of, "'of'")?;
        let mut branches = Vec::new();
        loop {
            let branch_start = self.current_offset();
            let name = self.consume_object_id("a case branch name")?;
            self.consume(&Token::Colon, "':'")?;
            let type_name = self.consume_type_id("a case branch type")?;
            self.consume(&Token::Darrow, "'=>'")?;
            let body = self.parse_expression()?;
            self.consume_semi()?;
            branches.push(CaseBranch {
                span: self.span_from(branch_start),
                name,
                type_name,
                body,
            });
            if self.check(&Token::Esac) {
                break;
            }
        }
        self.consume(&Token::Esac, "'esac'")?;
        Ok(self.mk(
            start,
            ExprKind::Case {
                scrutinee: Box::new(scrutinee),
                branches,
            },
        ))
    }

    fn mk(&self, start: usize, kind: ExprKind) -> Expr {
        Expr::new(self.ids.next(), self.span_from(start), kind)
    }
}
