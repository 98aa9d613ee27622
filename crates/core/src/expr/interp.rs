//! Formula tree interpreter.
//!
//! Typed evaluation over the declared variables: no coercion. A text
//! operand in arithmetic or an undeclared variable fails the operation,
//! naming the operator and the operand types.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::{BinOp, Expr, ExprError, UnaryOp, MAX_DEPTH};
use crate::model::Value;

pub fn eval(
    expr: &Expr,
    variables: &BTreeMap<String, Value>,
    depth: usize,
) -> Result<Value, ExprError> {
    if depth >= MAX_DEPTH {
        return Err(ExprError::DepthExceeded);
    }

    match expr {
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(d) => Ok(Value::Number(*d)),
        Expr::Text(s) => Ok(Value::Text(s.clone())),

        Expr::Var(name) => variables
            .get(name)
            .filter(|v| !matches!(v, Value::Null))
            .cloned()
            .ok_or_else(|| ExprError::UndeclaredVariable { name: name.clone() }),

        Expr::Unary { op, operand } => {
            let val = eval(operand, variables, depth + 1)?;
            match (op, val) {
                (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                (UnaryOp::Not, other) => Err(ExprError::UnaryTypeIncompatible {
                    op: "!",
                    operand: other.type_name(),
                }),
                (UnaryOp::Neg, Value::Number(d)) => Ok(Value::Number(-d)),
                (UnaryOp::Neg, other) => Err(ExprError::UnaryTypeIncompatible {
                    op: "-",
                    operand: other.type_name(),
                }),
            }
        }

        Expr::Binary { op, left, right } => {
            let lv = eval(left, variables, depth + 1)?;
            let rv = eval(right, variables, depth + 1)?;
            eval_binary(*op, lv, rv)
        }
    }
}

fn eval_binary(op: BinOp, left: Value, right: Value) -> Result<Value, ExprError> {
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => {
            let (l, r) = numeric_operands(op, left, right)?;
            arithmetic(op, l, r).map(Value::Number)
        }

        BinOp::Lt | BinOp::Lte | BinOp::Gt | BinOp::Gte => {
            let (l, r) = numeric_operands(op, left, right)?;
            let res = match op {
                BinOp::Lt => l < r,
                BinOp::Lte => l <= r,
                BinOp::Gt => l > r,
                BinOp::Gte => l >= r,
                _ => unreachable!(),
            };
            Ok(Value::Bool(res))
        }

        BinOp::Eq | BinOp::Neq => {
            let equal = match (&left, &right) {
                (Value::Bool(a), Value::Bool(b)) => a == b,
                (Value::Number(a), Value::Number(b)) => a == b,
                (Value::Text(a), Value::Text(b)) => a == b,
                _ => {
                    return Err(ExprError::TypeIncompatible {
                        op: op.symbol(),
                        left: left.type_name(),
                        right: right.type_name(),
                    })
                }
            };
            Ok(Value::Bool(if op == BinOp::Eq { equal } else { !equal }))
        }

        BinOp::And | BinOp::Or => {
            let (l, r) = match (&left, &right) {
                (Value::Bool(a), Value::Bool(b)) => (*a, *b),
                _ => {
                    return Err(ExprError::TypeIncompatible {
                        op: op.symbol(),
                        left: left.type_name(),
                        right: right.type_name(),
                    })
                }
            };
            Ok(Value::Bool(if op == BinOp::And { l && r } else { l || r }))
        }
    }
}

fn numeric_operands(op: BinOp, left: Value, right: Value) -> Result<(Decimal, Decimal), ExprError> {
    match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(ExprError::TypeIncompatible {
            op: op.symbol(),
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}

/// Checked Decimal arithmetic: overflow and division by zero are errors,
/// never panics.
fn arithmetic(op: BinOp, l: Decimal, r: Decimal) -> Result<Decimal, ExprError> {
    let overflow = || ExprError::Overflow { op: op.symbol() };
    match op {
        BinOp::Add => l.checked_add(r).ok_or_else(overflow),
        BinOp::Sub => l.checked_sub(r).ok_or_else(overflow),
        BinOp::Mul => l.checked_mul(r).ok_or_else(overflow),
        BinOp::Div => {
            if r.is_zero() {
                return Err(ExprError::DivisionByZero);
            }
            l.checked_div(r).ok_or_else(overflow)
        }
        BinOp::Rem => {
            if r.is_zero() {
                return Err(ExprError::DivisionByZero);
            }
            l.checked_rem(r).ok_or_else(overflow)
        }
        _ => unreachable!("arithmetic called with non-arithmetic operator"),
    }
}
