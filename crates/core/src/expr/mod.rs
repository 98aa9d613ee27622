//! Restricted price-expression evaluator.
//!
//! A purpose-built AST interpreter for the arithmetic/boolean formula
//! grammar used by plan prices and feature expressions. Deliberately not
//! a general scripting language: no calls, no assignment, no I/O, no
//! external state. Evaluation is purely functional over the supplied
//! variable mapping and bounded in recursion depth, so pathological but
//! well-formed input terminates deterministically.

mod interp;
mod lexer;
mod parser;

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::model::Value;

/// Maximum nesting depth accepted by the parser and the interpreter.
pub const MAX_DEPTH: usize = 64;

/// Errors from formula parsing or evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("expression syntax error: {message}")]
    Syntax { message: String },

    #[error("expression nesting exceeds the depth limit of {MAX_DEPTH}")]
    DepthExceeded,

    #[error("undeclared variable '{name}'")]
    UndeclaredVariable { name: String },

    /// A binary operator was applied to operands it does not support.
    /// Names the operator and both operand type names.
    #[error("operator '{op}' is not supported between {left} and {right}")]
    TypeIncompatible {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("operator '{op}' is not supported on {operand}")]
    UnaryTypeIncompatible {
        op: &'static str,
        operand: &'static str,
    },

    #[error("division by zero in expression")]
    DivisionByZero,

    #[error("numeric overflow in '{op}'")]
    Overflow { op: &'static str },
}

/// Binary operators of the formula grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
}

impl BinOp {
    /// Source-level symbol, used verbatim in error messages.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::Lt => "<",
            BinOp::Lte => "<=",
            BinOp::Gt => ">",
            BinOp::Gte => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// Formula expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Bool(bool),
    Number(Decimal),
    Text(String),
    Var(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// Parse a formula into an expression tree without evaluating it.
/// Used by the config parser to syntax-check feature expressions whose
/// variables only arrive at request time.
pub fn parse(src: &str) -> Result<Expr, ExprError> {
    let tokens = lexer::lex(src)?;
    parser::parse(&tokens)
}

/// Parse and evaluate a formula against the declared variables.
pub fn evaluate(src: &str, variables: &BTreeMap<String, Value>) -> Result<Value, ExprError> {
    let expr = parse(src)?;
    interp::eval(&expr, variables, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn arithmetic_over_declared_variables() {
        let v = vars(&[("users", Value::Number(Decimal::from(5)))]);
        assert_eq!(
            evaluate("users * 2", &v).unwrap(),
            Value::Number(Decimal::from(10))
        );
        assert_eq!(
            evaluate("(users + 1) * 2 - 4 / 2", &v).unwrap(),
            Value::Number(Decimal::from(10))
        );
    }

    #[test]
    fn comparison_and_boolean_logic() {
        let v = vars(&[
            ("users", Value::Number(Decimal::from(5))),
            ("trial", Value::Bool(false)),
        ]);
        assert_eq!(evaluate("users >= 5 && !trial", &v).unwrap(), Value::Bool(true));
        assert_eq!(evaluate("users < 5 || trial", &v).unwrap(), Value::Bool(false));
        assert_eq!(evaluate("users != 4 and not trial", &v).unwrap(), Value::Bool(true));
    }

    #[test]
    fn text_operand_in_arithmetic_names_operator_and_types() {
        let v = vars(&[
            ("price", Value::Number(Decimal::from(10))),
            ("factor", Value::Text("ten".into())),
        ]);
        let err = evaluate("price * factor", &v).unwrap_err();
        assert_eq!(
            err.to_string(),
            "operator '*' is not supported between Numeric and Text"
        );
    }

    #[test]
    fn undeclared_variable_is_named() {
        let err = evaluate("basePrice * 2", &BTreeMap::new()).unwrap_err();
        assert_eq!(err, ExprError::UndeclaredVariable { name: "basePrice".into() });
    }

    #[test]
    fn division_by_zero_is_an_error_not_a_panic() {
        let err = evaluate("1 / 0", &BTreeMap::new()).unwrap_err();
        assert_eq!(err, ExprError::DivisionByZero);
    }

    #[test]
    fn pathological_nesting_terminates_with_depth_error() {
        let deep = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert_eq!(evaluate(&deep, &BTreeMap::new()).unwrap_err(), ExprError::DepthExceeded);
    }

    #[test]
    fn unterminated_input_is_a_syntax_error() {
        assert!(matches!(
            evaluate("2 +", &BTreeMap::new()),
            Err(ExprError::Syntax { .. })
        ));
        assert!(matches!(
            evaluate("(1 + 2", &BTreeMap::new()),
            Err(ExprError::Syntax { .. })
        ));
    }

    #[test]
    fn decimal_arithmetic_is_exact() {
        let v = vars(&[("base", Value::Number("15.99".parse().unwrap()))]);
        assert_eq!(
            evaluate("base * 1", &v).unwrap(),
            Value::Number("15.99".parse().unwrap())
        );
        assert_eq!(
            evaluate("0.1 + 0.2", &BTreeMap::new()).unwrap(),
            Value::Number("0.3".parse().unwrap())
        );
    }
}
