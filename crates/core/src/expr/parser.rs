//! Recursive-descent formula parser.
//!
//! Precedence, loosest first: `||` / `or`, `&&` / `and`, comparisons,
//! `+` `-`, `*` `/` `%`, unary `!`/`not`/`-`, atoms. Nesting depth is
//! bounded by [`MAX_DEPTH`](super::MAX_DEPTH).

use rust_decimal::Decimal;

use super::lexer::Token;
use super::{BinOp, Expr, ExprError, UnaryOp, MAX_DEPTH};

pub fn parse(tokens: &[Token]) -> Result<Expr, ExprError> {
    let mut p = Parser { tokens, pos: 0 };
    let expr = p.parse_or(0)?;
    if p.peek() != &Token::Eof {
        return Err(ExprError::Syntax {
            message: format!("unexpected trailing input near {:?}", p.peek()),
        });
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn is_word(&self, w: &str) -> bool {
        matches!(self.peek(), Token::Word(s) if s == w)
    }

    fn parse_or(&mut self, depth: usize) -> Result<Expr, ExprError> {
        let mut left = self.parse_and(check(depth)?)?;
        while self.peek() == &Token::OrOr || self.is_word("or") {
            self.advance();
            let right = self.parse_and(check(depth)?)?;
            left = binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self, depth: usize) -> Result<Expr, ExprError> {
        let mut left = self.parse_comparison(check(depth)?)?;
        while self.peek() == &Token::AndAnd || self.is_word("and") {
            self.advance();
            let right = self.parse_comparison(check(depth)?)?;
            left = binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self, depth: usize) -> Result<Expr, ExprError> {
        let left = self.parse_additive(check(depth)?)?;
        let op = match self.peek() {
            Token::EqEq => BinOp::Eq,
            Token::Neq => BinOp::Neq,
            Token::Lt => BinOp::Lt,
            Token::Lte => BinOp::Lte,
            Token::Gt => BinOp::Gt,
            Token::Gte => BinOp::Gte,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_additive(check(depth)?)?;
        Ok(binary(op, left, right))
    }

    fn parse_additive(&mut self, depth: usize) -> Result<Expr, ExprError> {
        let mut left = self.parse_multiplicative(check(depth)?)?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative(check(depth)?)?;
            left = binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self, depth: usize) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary(check(depth)?)?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Rem,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary(check(depth)?)?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self, depth: usize) -> Result<Expr, ExprError> {
        if self.peek() == &Token::Bang || self.is_word("not") {
            self.advance();
            let operand = self.parse_unary(check(depth)?)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        if self.peek() == &Token::Minus {
            self.advance();
            let operand = self.parse_unary(check(depth)?)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_atom(depth)
    }

    fn parse_atom(&mut self, depth: usize) -> Result<Expr, ExprError> {
        match self.peek().clone() {
            Token::Number(text) => {
                self.advance();
                let d = text.parse::<Decimal>().map_err(|_| ExprError::Syntax {
                    message: format!("invalid number literal '{}'", text),
                })?;
                Ok(Expr::Number(d))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Expr::Text(s))
            }
            Token::Word(w) if w == "true" => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            Token::Word(w) if w == "false" => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            Token::Word(w) => {
                self.advance();
                Ok(Expr::Var(w))
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_or(check(depth)?)?;
                if self.peek() != &Token::RParen {
                    return Err(ExprError::Syntax {
                        message: "expected ')'".to_string(),
                    });
                }
                self.advance();
                Ok(inner)
            }
            other => Err(ExprError::Syntax {
                message: format!("expected a value, got {:?}", other),
            }),
        }
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn check(depth: usize) -> Result<usize, ExprError> {
    if depth >= MAX_DEPTH {
        return Err(ExprError::DepthExceeded);
    }
    Ok(depth + 1)
}
