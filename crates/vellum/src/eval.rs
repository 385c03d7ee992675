//! Expression evaluation.

use std::cmp::Ordering;

use crate::context::Context;
use crate::error::{CompileError, Result};
use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::functions::Output;
use crate::value::{Number, Value};

/// Evaluates the expression of one construct.
///
/// Text written by emitting functions is collected in an [`Output`] and
/// placed before the construct's value by the caller.
pub(crate) struct Evaluator<'c, 'a> {
    ctx: &'c Context<'a>,
    depth: usize,
    output: Output,
}

impl<'c, 'a> Evaluator<'c, 'a> {
    pub(crate) fn new(ctx: &'c Context<'a>, depth: usize) -> Self {
        Self {
            ctx,
            depth,
            output: Output::new(),
        }
    }

    pub(crate) fn into_output(self) -> Output {
        self.output
    }

    pub(crate) fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Var(name) => self.ctx.resolve_var(name),
            Expr::Tag(name) => self.ctx.resolve_tag(name, self.depth),
            Expr::List(items) => Ok(Value::List(self.eval_all(items)?)),
            Expr::Call { name, args } => {
                let args = self.eval_all(args)?;
                self.ctx.call_function(name, &args, &mut self.output)
            }
            Expr::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver = self.eval(receiver)?;
                let args = self.eval_all(args)?;
                self.ctx.call_method(&receiver, method, &args)
            }
            Expr::StaticCall {
                class,
                method,
                args,
            } => {
                let args = self.eval_all(args)?;
                self.ctx.call_static(class, method, &args)
            }
            Expr::Member { receiver, name } => {
                let receiver = self.eval(receiver)?;
                Ok(receiver.get_attr(name).unwrap_or_default())
            }
            Expr::StaticMember { class, name } => self.ctx.static_member(class, name),
            Expr::Index { receiver, index } => {
                let receiver = self.eval(receiver)?;
                let index = self.eval(index)?;
                Ok(receiver.get_item(&index).unwrap_or_default())
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                unary(*op, value)
            }
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::Ternary {
                condition,
                then,
                otherwise,
            } => {
                if self.eval(condition)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
        }
    }

    /// Evaluates arguments left to right.
    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value> {
        // Short-circuiting operators only evaluate the right side when needed.
        match op {
            BinaryOp::And => {
                let result = self.eval(left)?.is_truthy() && self.eval(right)?.is_truthy();
                return Ok(Value::Bool(result));
            }
            BinaryOp::Or => {
                let result = self.eval(left)?.is_truthy() || self.eval(right)?.is_truthy();
                return Ok(Value::Bool(result));
            }
            BinaryOp::Coalesce => {
                let left = self.eval(left)?;
                return if left.is_null() { self.eval(right) } else { Ok(left) };
            }
            _ => {}
        }

        let left = self.eval(left)?;
        let right = self.eval(right)?;
        match op {
            BinaryOp::Eq => Ok(Value::Bool(left.loose_eq(&right))),
            BinaryOp::Ne => Ok(Value::Bool(!left.loose_eq(&right))),
            BinaryOp::Lt => compare(op, &left, &right, Ordering::is_lt),
            BinaryOp::Le => compare(op, &left, &right, Ordering::is_le),
            BinaryOp::Gt => compare(op, &left, &right, Ordering::is_gt),
            BinaryOp::Ge => compare(op, &left, &right, Ordering::is_ge),
            BinaryOp::Concat => Ok(Value::String(format!("{}{}", left, right))),
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                arithmetic(op, &left, &right)
            }
            BinaryOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
            BinaryOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
            BinaryOp::Coalesce => Ok(if left.is_null() { right } else { left }),
        }
    }
}

fn unary(op: UnaryOp, value: Value) -> Result<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Neg => match value.as_number() {
            Some(Number::Int(n)) => n
                .checked_neg()
                .map(Value::from)
                .ok_or_else(|| CompileError::type_error("integer overflow in negation")),
            Some(Number::Float(n)) => Ok(Value::from(-n)),
            None => Err(CompileError::type_error(format!(
                "cannot negate {}",
                value.type_name()
            ))),
        },
    }
}

fn compare(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    test: fn(Ordering) -> bool,
) -> Result<Value> {
    left.compare(right).map(|o| Value::Bool(test(o))).ok_or_else(|| {
        CompileError::type_error(format!(
            "cannot compare {} {} {}",
            left.type_name(),
            op,
            right.type_name()
        ))
    })
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
        return Err(CompileError::type_error(format!(
            "unsupported operand types for {}: {} and {}",
            op,
            left.type_name(),
            right.type_name()
        )));
    };

    if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b.to_f64() == 0.0 {
        return Err(CompileError::type_error("division by zero"));
    }

    let overflow = || CompileError::type_error(format!("integer overflow in {}", op));
    match (a, b) {
        (Number::Int(a), Number::Int(b)) => {
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                // Integer division stays integral only when exact
                BinaryOp::Div if a.checked_rem(b) != Some(0) => {
                    return Ok(Value::from(a as f64 / b as f64))
                }
                BinaryOp::Div => a.checked_div(b),
                _ => a.checked_rem(b),
            };
            result.map(Value::from).ok_or_else(overflow)
        }
        (a, b) => {
            let (a, b) = (a.to_f64(), b.to_f64());
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            };
            Ok(Value::from(result))
        }
    }
}
