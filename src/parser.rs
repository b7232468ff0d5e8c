use std::mem;

use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, Query, StageCall, Token},
    lexer::{LexError, Lexer, Position},
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Expected {expected}, got {found} at {position}")]
    Unexpected {
        expected: String,
        found: Token,
        position: Position,
    },
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    current_position: Position,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        let current_position = lexer.token_position();
        Ok(Parser {
            lexer,
            current_token,
            current_position,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        self.current_position = self.lexer.token_position();
        Ok(())
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        ParseError::Unexpected {
            expected: expected.into(),
            found: self.current_token.clone(),
            position: self.current_position,
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.unexpected(format!("'{}'", expected)));
        }
        self.advance()
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String, ParseError> {
        match &self.current_token {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Parse primary expressions (atoms): literals, '$', '@', '(' expr ')',
    /// array and object literals
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let expr = match &self.current_token {
            Token::Float(n) => Expr::Float(*n),
            Token::Integer(n) => Expr::Integer(*n),
            Token::String(s) => Expr::String(s.clone()),
            Token::Boolean(b) => Expr::Boolean(*b),
            Token::Null => Expr::Null,
            Token::Dollar => Expr::Root,
            Token::At => Expr::Current,
            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                return Ok(expr);
            }
            Token::LBracket => {
                self.advance()?;
                return self.parse_array_literal();
            }
            Token::LBrace => {
                self.advance()?;
                return self.parse_object_literal();
            }
            Token::Identifier(name) => {
                return Err(ParseError::Unexpected {
                    expected: format!("an expression ('{}' must be written as @[{}])", name, name),
                    found: self.current_token.clone(),
                    position: self.current_position,
                });
            }
            _ => return Err(self.unexpected("an expression")),
        };
        self.advance()?;
        Ok(expr)
    }

    fn parse_object_literal(&mut self) -> Result<Expr, ParseError> {
        let mut pairs = vec![];

        while !self.check(&Token::RBrace) {
            let key = match &self.current_token {
                Token::String(s) | Token::Identifier(s) => s.clone(),
                _ => return Err(self.unexpected("string or identifier as object key")),
            };
            self.advance()?;
            self.expect(Token::Colon)?;

            let value = self.parse_expression()?;
            pairs.push((key, value));

            if !self.check(&Token::RBrace) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RBrace)?;
        Ok(Expr::Object(pairs))
    }

    fn parse_array_literal(&mut self) -> Result<Expr, ParseError> {
        let mut elements = vec![];

        while !self.check(&Token::RBracket) {
            elements.push(self.parse_expression()?);

            if !self.check(&Token::RBracket) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RBracket)?;
        Ok(Expr::Array(elements))
    }

    /// Comma-separated arguments; the opening '(' is already consumed
    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = vec![];

        while !self.check(&Token::RParen) {
            args.push(self.parse_expression()?);

            if !self.check(&Token::RParen) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RParen)?;
        Ok(args)
    }

    /// Access chains: `x[key]`, `x.field`, `x.method(args)`
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&Token::LBracket) {
                self.advance()?;
                let key = self.parse_access_key()?;
                self.expect(Token::RBracket)?;

                expr = Expr::Access {
                    object: Box::new(expr),
                    key: Box::new(key),
                };
            } else if self.check(&Token::Dot) {
                self.advance()?;
                let name = self.expect_identifier("identifier after '.'")?;

                expr = if self.check(&Token::LParen) {
                    self.advance()?;
                    Expr::MethodCall {
                        object: Box::new(expr),
                        method: name,
                        args: self.parse_arguments()?,
                    }
                } else {
                    Expr::Access {
                        object: Box::new(expr),
                        key: Box::new(Expr::Key(name)),
                    }
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_access_key(&mut self) -> Result<Expr, ParseError> {
        // Identifiers and strings name fields; anything else is a computed key
        match &self.current_token {
            Token::Identifier(name) | Token::String(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(Expr::Key(name))
            }
            _ => self.parse_expression(),
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.current_token {
            Token::Not => {
                self.advance()?;
                Ok(Expr::Not(Box::new(self.parse_unary()?)))
            }
            Token::Minus => {
                self.advance()?;
                let operand = self.parse_unary()?;
                // Represent as 0 - operand
                Ok(Expr::BinaryOp {
                    op: BinOp::Subtract,
                    left: Box::new(Expr::Integer(0)),
                    right: Box::new(operand),
                })
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current_token {
                Token::Star => BinOp::Multiply,
                Token::Slash => BinOp::Divide,
                Token::Percent => BinOp::Modulo,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_additive()?;

        let op = match &self.current_token {
            Token::EqEq => BinOp::Equal,
            Token::NotEq => BinOp::NotEqual,
            Token::Lt => BinOp::LessThan,
            Token::Gt => BinOp::GreaterThan,
            Token::LtEq => BinOp::LessEqual,
            Token::GtEq => BinOp::GreaterEqual,
            _ => return Ok(left),
        };

        self.advance()?;
        let right = self.parse_additive()?;
        Ok(binary(op, left, right))
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;

        while self.check(&Token::And) {
            self.advance()?;
            let right = self.parse_comparison()?;
            left = binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;

        while self.check(&Token::Or) {
            self.advance()?;
            let right = self.parse_and()?;
            left = binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    /// Parse a standalone expression covering the whole input
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        self.expect(Token::Eof)?;
        Ok(expr)
    }

    /// Parse a complete query: `$ ( '|' stage )*`
    pub fn parse_query(&mut self) -> Result<Query, ParseError> {
        self.expect(Token::Dollar)?;

        let mut stages = vec![];
        while self.check(&Token::Pipe) {
            self.advance()?;
            stages.push(self.parse_stage()?);
        }

        self.expect(Token::Eof)?;
        Ok(Query { stages })
    }

    fn parse_stage(&mut self) -> Result<StageCall, ParseError> {
        let position = self.current_position;
        let name = self.expect_identifier("stage name")?;

        let args = if self.check(&Token::LParen) {
            self.advance()?;
            self.parse_arguments()?
        } else {
            vec![]
        };

        Ok(StageCall {
            name,
            args,
            position,
        })
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Lexes and parses a query in one step.
///
/// # Examples
///
/// ```
/// use sluice::parser::parse_query;
///
/// let query = parse_query("$ | filter(@[age] > 5) | sort(@[name])").unwrap();
/// assert_eq!(query.stages.len(), 2);
/// assert_eq!(query.stages[1].name, "sort");
/// ```
pub fn parse_query(input: &str) -> Result<Query, ParseError> {
    Parser::new(Lexer::new(input))?.parse_query()
}

/// Lexes and parses a standalone expression.
pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
    Parser::new(Lexer::new(input))?.parse()
}
