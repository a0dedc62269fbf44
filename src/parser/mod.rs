//! Arithmetic expression parser
//!
//! Turns infix text such as `-(2+2)*2` into a postfix [`Token`] sequence
//! ready for the evaluator.

pub mod shunting_yard;
pub mod tokenizer;

pub use shunting_yard::to_postfix;
pub use tokenizer::{BinaryOperator, Postfix, Token, render_postfix};

use crate::error::{CalcError, CalcResult};

/// Remove every whitespace character, including newlines
pub fn normalize(expression: &str) -> String {
    expression.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Normalize and convert an expression, rejecting empty input
pub fn parse(expression: &str) -> CalcResult<Postfix> {
    let normalized = normalize(expression);
    if normalized.is_empty() {
        return Err(CalcError::EmptyExpression);
    }
    to_postfix(&normalized)
}
