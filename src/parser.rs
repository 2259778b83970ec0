//! Recursive-descent parser for the test-case grammar.
//!
//! ```text
//! Spec            → Configuration Cases
//! Configuration   → Config { String }
//! Case            → TestCase CaseName { Statements }
//! Statement       → StatementBody ;
//! StatementBody   → ScopedStatement | Declaration | Assignment | Assertion
//! ScopedStatement → [Async] [Term] : (String | ResultSet ( String ))
//! Expression      → String | Number | Variable | ScopedStatement
//! Assertion       → Op ( Expression , Expression )
//! ```
//!
//! The first token that cannot continue the parse aborts it.

use crate::ast::{AssertOp, Case, Dispatch, Expression, ScopedStatement, Spec, Statement, Target};
use crate::lexer::{Token, TokenKind};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("[Parse Error][Line:{line}, Column:{column}]: Invalid Token:'{lexeme}', expected {expected}")]
    UnexpectedToken {
        found: TokenKind,
        lexeme: String,
        expected: String,
        line: usize,
        column: usize,
        offset: usize,
    },
    #[error("[Parse Error][Line:{line}, Column:{column}]: unexpected end of input, expected {expected}")]
    UnexpectedEof {
        expected: String,
        line: usize,
        column: usize,
        offset: usize,
    },
}

impl ParseError {
    fn at(token: &Token, expected: impl Into<String>) -> Self {
        let expected = expected.into();
        if token.kind == TokenKind::Eof {
            ParseError::UnexpectedEof {
                expected,
                line: token.line,
                column: token.column,
                offset: token.offset,
            }
        } else {
            ParseError::UnexpectedToken {
                found: token.kind,
                lexeme: token.lexeme.clone(),
                expected,
                line: token.line,
                column: token.column,
                offset: token.offset,
            }
        }
    }

    pub fn position(&self) -> (usize, usize, usize) {
        match *self {
            ParseError::UnexpectedToken {
                line,
                column,
                offset,
                ..
            }
            | ParseError::UnexpectedEof {
                line,
                column,
                offset,
                ..
            } => (line, column, offset),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a token stream produced by [`crate::lexer::tokenize`].
pub fn parse_program(tokens: &[Token]) -> ParseResult<Spec> {
    Parser::new(tokens).parse_spec()
}

struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    eof: Token,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        let eof = match tokens.last() {
            Some(last) if last.kind == TokenKind::Eof => last.clone(),
            Some(last) => Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                line: last.line,
                column: last.column + last.lexeme.chars().count(),
                offset: last.offset + last.lexeme.len(),
            },
            None => Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                line: 1,
                column: 1,
                offset: 0,
            },
        };
        Self {
            tokens,
            current: 0,
            eof,
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.current).unwrap_or(&self.eof)
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_second_kind(&self) -> TokenKind {
        self.tokens
            .get(self.current + 1)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn advance(&mut self) -> &Token {
        let index = self.current;
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        self.tokens.get(index).unwrap_or(&self.eof)
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<&Token> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(ParseError::at(self.peek(), kind.to_string()))
        }
    }

    fn identifier(&mut self) -> ParseResult<String> {
        Ok(self.expect(TokenKind::Id)?.lexeme.clone())
    }

    fn string(&mut self) -> ParseResult<String> {
        if self.peek_kind().is_string() {
            Ok(self.advance().string_value())
        } else {
            Err(ParseError::at(self.peek(), "string"))
        }
    }

    fn parse_spec(&mut self) -> ParseResult<Spec> {
        let config = self.parse_configuration()?;

        let mut cases = vec![self.parse_case()?];
        while self.peek_kind() != TokenKind::Eof {
            cases.push(self.parse_case()?);
        }
        Ok(Spec { config, cases })
    }

    fn parse_configuration(&mut self) -> ParseResult<String> {
        self.expect(TokenKind::Config)?;
        self.expect(TokenKind::LBrace)?;
        let config = self.string()?;
        self.expect(TokenKind::RBrace)?;
        Ok(config)
    }

    fn parse_case(&mut self) -> ParseResult<Case> {
        let line = self.expect(TokenKind::TestCase)?.line;
        let name = self.identifier()?;
        self.expect(TokenKind::LBrace)?;

        let mut statements = vec![self.parse_statement()?];
        while self.peek_kind() != TokenKind::RBrace {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace)?;

        Ok(Case {
            name,
            statements,
            line,
        })
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        let statement = match self.peek_kind() {
            TokenKind::Colon | TokenKind::Async => Statement::Scoped(self.parse_scoped()?),
            TokenKind::Terminal => {
                self.advance();
                let mut terms = vec![self.identifier()?];
                while self.peek_kind() == TokenKind::Id {
                    terms.push(self.identifier()?);
                }
                Statement::Declaration(terms)
            }
            TokenKind::Id if self.peek_second_kind() == TokenKind::EqualSign => {
                let target = self.identifier()?;
                self.advance();
                let value = self.parse_expression()?;
                Statement::Assignment { target, value }
            }
            TokenKind::Id => Statement::Scoped(self.parse_scoped()?),
            kind => match assert_op(kind) {
                Some(op) => {
                    self.advance();
                    self.expect(TokenKind::LParen)?;
                    let left = self.parse_expression()?;
                    self.expect(TokenKind::Comma)?;
                    let right = self.parse_expression()?;
                    self.expect(TokenKind::RParen)?;
                    Statement::Assertion { op, left, right }
                }
                None => return Err(ParseError::at(self.peek(), "statement")),
            },
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(statement)
    }

    fn parse_scoped(&mut self) -> ParseResult<ScopedStatement> {
        let dispatch = if self.peek_kind() == TokenKind::Async {
            self.advance();
            Dispatch::Async
        } else {
            Dispatch::Sync
        };

        let target = if self.peek_kind() == TokenKind::Id {
            Target::Named(self.identifier()?)
        } else {
            Target::Default
        };
        self.expect(TokenKind::Colon)?;

        let (query, fetch_result) = if self.peek_kind() == TokenKind::ResultSet {
            self.advance();
            self.expect(TokenKind::LParen)?;
            let query = self.string()?;
            self.expect(TokenKind::RParen)?;
            (query, true)
        } else if self.peek_kind().is_string() {
            (self.string()?, false)
        } else {
            return Err(ParseError::at(self.peek(), "query string or 'ResultSet'"));
        };

        Ok(ScopedStatement {
            target,
            dispatch,
            query,
            fetch_result,
        })
    }

    fn parse_expression(&mut self) -> ParseResult<Expression> {
        match self.peek_kind() {
            kind if kind.is_string() => Ok(Expression::String(self.string()?)),
            TokenKind::Number => Ok(Expression::Number(self.advance().lexeme.clone())),
            TokenKind::Id if self.peek_second_kind() != TokenKind::Colon => {
                Ok(Expression::Variable(self.identifier()?))
            }
            TokenKind::Id | TokenKind::Colon | TokenKind::Async => {
                Ok(Expression::Scoped(self.parse_scoped()?))
            }
            _ => Err(ParseError::at(self.peek(), "expression")),
        }
    }
}

fn assert_op(kind: TokenKind) -> Option<AssertOp> {
    let op = match kind {
        TokenKind::ExpectEqual => AssertOp::Equal,
        TokenKind::ExpectNotEqual => AssertOp::NotEqual,
        TokenKind::ExpectStrEqual => AssertOp::StrEqual,
        TokenKind::ExpectStrNotEqual => AssertOp::StrNotEqual,
        TokenKind::ExpectSubStr => AssertOp::SubStr,
        TokenKind::ExpectNoSubStr => AssertOp::NoSubStr,
        TokenKind::ExpectIn => AssertOp::In,
        TokenKind::ExpectNotIn => AssertOp::NotIn,
        _ => return None,
    };
    Some(op)
}
