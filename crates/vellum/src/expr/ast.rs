//! Expression tree.

use std::fmt;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Coalesce,
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Concat,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Coalesce => "??",
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Concat => "~",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        };
        f.write_str(symbol)
    }
}

/// A node of a parsed construct body.
///
/// Trees are built fresh for every construct and dropped after evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// `$name`, or a bare name that is not a tag.
    Var(String),
    /// A bare name that matches a tag on the template.
    Tag(String),
    List(Vec<Expr>),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    StaticCall {
        class: String,
        method: String,
        args: Vec<Expr>,
    },
    Member {
        receiver: Box<Expr>,
        name: String,
    },
    StaticMember {
        class: String,
        name: String,
    },
    Index {
        receiver: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

impl Expr {
    /// Calls `f` on this node and every node below it, parents first.
    pub fn walk<'e>(&'e self, f: &mut impl FnMut(&'e Expr)) {
        f(self);
        match self {
            Expr::Literal(_) | Expr::Var(_) | Expr::Tag(_) | Expr::StaticMember { .. } => {}
            Expr::List(items) => items.iter().for_each(|e| e.walk(f)),
            Expr::Call { args, .. } | Expr::StaticCall { args, .. } => {
                args.iter().for_each(|e| e.walk(f))
            }
            Expr::MethodCall { receiver, args, .. } => {
                receiver.walk(f);
                args.iter().for_each(|e| e.walk(f));
            }
            Expr::Member { receiver, .. } => receiver.walk(f),
            Expr::Index { receiver, index } => {
                receiver.walk(f);
                index.walk(f);
            }
            Expr::Unary { operand, .. } => operand.walk(f),
            Expr::Binary { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            Expr::Ternary {
                condition,
                then,
                otherwise,
            } => {
                condition.walk(f);
                then.walk(f);
                otherwise.walk(f);
            }
        }
    }

    /// The string value of a string literal node.
    pub fn as_str_literal(&self) -> Option<&str> {
        match self {
            Expr::Literal(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}
