//! Recursive-descent parser for construct bodies.
//!
//! Precedence, lowest first:
//!
//! | Level | Operators |
//! |-------|-----------|
//! | ternary | `a ? b : c` (right associative) |
//! | coalesce | `??` |
//! | or | `\|\|`, `or` |
//! | and | `&&`, `and` |
//! | equality | `==`, `!=` |
//! | comparison | `<`, `<=`, `>`, `>=` |
//! | concat | `~` |
//! | additive | `+`, `-` |
//! | multiplicative | `*`, `/`, `%` |
//! | unary | `!`, `not`, `-` |
//! | postfix | `.name`, `->name`, `(args)` after a member, `[expr]` |

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::{tokenize, SyntaxError, Token};
use crate::value::Value;

/// Deepest nesting of groups, operators and member accesses accepted in one
/// expression. Parsing and evaluation recurse per level.
pub const MAX_NESTING: usize = 64;

/// Parses a complete expression.
///
/// `is_tag` decides how bare identifiers are classified: names it accepts
/// become [`Expr::Tag`], everything else becomes [`Expr::Var`].
pub fn parse_expression(source: &str, is_tag: &dyn Fn(&str) -> bool) -> Result<Expr, SyntaxError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        is_tag,
    };

    if parser.peek() == &Token::Eof {
        return Err(SyntaxError::new(0, "empty expression"));
    }
    let expr = parser.ternary()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        token => Err(SyntaxError::new(
            parser.offset(),
            format!("unexpected {}", token),
        )),
    }
}

struct Parser<'s, 't> {
    tokens: Vec<(Token<'s>, usize)>,
    pos: usize,
    depth: usize,
    is_tag: &'t dyn Fn(&str) -> bool,
}

impl<'s> Parser<'s, '_> {
    fn peek(&self) -> &Token<'s> {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].0
    }

    fn peek_next(&self) -> &Token<'s> {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].0
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].1
    }

    fn advance(&mut self) -> Token<'s> {
        let token = self.peek().clone();
        if token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token<'_>) -> bool {
        if self.peek() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Token::Ident(name) if *name == keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token<'_>) -> Result<(), SyntaxError> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(SyntaxError::new(
                self.offset(),
                format!("expected {}, found {}", token, self.peek()),
            ))
        }
    }

    /// Enters one more level of nesting, failing past [`MAX_NESTING`].
    fn nest(&mut self) -> Result<(), SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(SyntaxError::new(
                self.offset(),
                "expression nested too deeply",
            ));
        }
        Ok(())
    }

    fn ternary(&mut self) -> Result<Expr, SyntaxError> {
        let depth = self.depth;
        self.nest()?;
        let condition = self.coalesce()?;
        let expr = if self.eat(&Token::Question) {
            let then = self.ternary()?;
            self.expect(Token::Colon)?;
            let otherwise = self.ternary()?;
            Expr::Ternary {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            }
        } else {
            condition
        };
        self.depth = depth;
        Ok(expr)
    }

    /// Parses a left-associative chain of `operand`s joined by the binary
    /// operators `operator` recognises. Every link counts as one level of
    /// nesting since the tree grows one node deeper per operator.
    fn left_assoc(
        &mut self,
        operand: fn(&mut Self) -> Result<Expr, SyntaxError>,
        operator: fn(&Token<'_>) -> Option<BinaryOp>,
    ) -> Result<Expr, SyntaxError> {
        let depth = self.depth;
        let mut left = operand(self)?;
        while let Some(op) = operator(self.peek()) {
            self.advance();
            self.nest()?;
            let right = operand(self)?;
            left = binary(op, left, right);
        }
        self.depth = depth;
        Ok(left)
    }

    fn coalesce(&mut self) -> Result<Expr, SyntaxError> {
        self.left_assoc(Self::or, |token| match token {
            Token::Coalesce => Some(BinaryOp::Coalesce),
            _ => None,
        })
    }

    fn or(&mut self) -> Result<Expr, SyntaxError> {
        self.left_assoc(Self::and, |token| match token {
            Token::Or => Some(BinaryOp::Or),
            Token::Ident("or") => Some(BinaryOp::Or),
            _ => None,
        })
    }

    fn and(&mut self) -> Result<Expr, SyntaxError> {
        self.left_assoc(Self::equality, |token| match token {
            Token::And => Some(BinaryOp::And),
            Token::Ident("and") => Some(BinaryOp::And),
            _ => None,
        })
    }

    fn equality(&mut self) -> Result<Expr, SyntaxError> {
        self.left_assoc(Self::comparison, |token| match token {
            Token::Eq => Some(BinaryOp::Eq),
            Token::Ne => Some(BinaryOp::Ne),
            _ => None,
        })
    }

    fn comparison(&mut self) -> Result<Expr, SyntaxError> {
        self.left_assoc(Self::concat, |token| match token {
            Token::Lt => Some(BinaryOp::Lt),
            Token::Le => Some(BinaryOp::Le),
            Token::Gt => Some(BinaryOp::Gt),
            Token::Ge => Some(BinaryOp::Ge),
            _ => None,
        })
    }

    fn concat(&mut self) -> Result<Expr, SyntaxError> {
        self.left_assoc(Self::additive, |token| match token {
            Token::Tilde => Some(BinaryOp::Concat),
            _ => None,
        })
    }

    fn additive(&mut self) -> Result<Expr, SyntaxError> {
        self.left_assoc(Self::multiplicative, |token| match token {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        self.left_assoc(Self::unary, |token| match token {
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Percent => Some(BinaryOp::Rem),
            _ => None,
        })
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = if self.eat(&Token::Bang) || self.eat_keyword("not") {
            UnaryOp::Not
        } else if self.eat(&Token::Minus) {
            UnaryOp::Neg
        } else {
            return self.postfix();
        };
        let depth = self.depth;
        self.nest()?;
        let operand = self.unary()?;
        self.depth = depth;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr, SyntaxError> {
        let depth = self.depth;
        let mut expr = self.primary()?;
        loop {
            let is_member = self.eat(&Token::Dot) || self.eat(&Token::Arrow);
            if is_member || self.peek() == &Token::LBracket {
                self.nest()?;
            }
            if is_member {
                let name = self.member_name()?;
                if self.eat(&Token::LParen) {
                    let args = self.arguments()?;
                    expr = Expr::MethodCall {
                        receiver: Box::new(expr),
                        method: name,
                        args,
                    };
                } else {
                    expr = Expr::Member {
                        receiver: Box::new(expr),
                        name,
                    };
                }
            } else if self.eat(&Token::LBracket) {
                let index = self.ternary()?;
                self.expect(Token::RBracket)?;
                expr = Expr::Index {
                    receiver: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                self.depth = depth;
                return Ok(expr);
            }
        }
    }

    fn member_name(&mut self) -> Result<String, SyntaxError> {
        let offset = self.offset();
        match self.advance() {
            Token::Ident(name) => Ok(name.to_string()),
            Token::Int(n) if n >= 0 => Ok(n.to_string()),
            token => Err(SyntaxError::new(
                offset,
                format!("expected a member name, found {}", token),
            )),
        }
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let offset = self.offset();
        match self.advance() {
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Int(n) => Ok(Expr::Literal(Value::from(n))),
            Token::Float(n) => Ok(Expr::Literal(Value::from(n))),
            Token::Var(name) => Ok(Expr::Var(name.to_string())),
            Token::LParen => {
                let expr = self.ternary()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::LBracket => {
                let items = self.sequence(Token::RBracket)?;
                Ok(Expr::List(items))
            }
            Token::Ident(name) => self.identifier(name),
            token => Err(SyntaxError::new(offset, format!("unexpected {}", token))),
        }
    }

    fn identifier(&mut self, name: &str) -> Result<Expr, SyntaxError> {
        // A trailing argument list always makes a function call, even when a
        // variable of the same name exists.
        if self.eat(&Token::LParen) {
            let args = self.arguments()?;
            return Ok(Expr::Call {
                name: name.to_string(),
                args,
            });
        }

        if self.peek() == &Token::DoubleColon && matches!(self.peek_next(), Token::Ident(_)) {
            // `a::b::C::member`: every segment before the last names the class
            let mut class = name.to_string();
            self.advance();
            let mut member = self.member_name()?;
            while self.peek() == &Token::DoubleColon && matches!(self.peek_next(), Token::Ident(_)) {
                self.advance();
                class.push_str("::");
                class.push_str(&member);
                member = self.member_name()?;
            }
            if self.eat(&Token::LParen) {
                let args = self.arguments()?;
                return Ok(Expr::StaticCall {
                    class,
                    method: member,
                    args,
                });
            }
            return Ok(Expr::StaticMember {
                class,
                name: member,
            });
        }

        Ok(match name {
            "true" => Expr::Literal(Value::Bool(true)),
            "false" => Expr::Literal(Value::Bool(false)),
            "null" => Expr::Literal(Value::Null),
            name if (self.is_tag)(name) => Expr::Tag(name.to_string()),
            name => Expr::Var(name.to_string()),
        })
    }

    /// Arguments after an opening parenthesis, through the closing one.
    fn arguments(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        self.sequence(Token::RParen)
    }

    fn sequence(&mut self, close: Token<'static>) -> Result<Vec<Expr>, SyntaxError> {
        let mut items = Vec::new();
        if self.eat(&close) {
            return Ok(items);
        }
        loop {
            items.push(self.ternary()?);
            if self.eat(&close) {
                return Ok(items);
            }
            self.expect(Token::Comma)?;
            // Trailing comma
            if self.eat(&close) {
                return Ok(items);
            }
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
