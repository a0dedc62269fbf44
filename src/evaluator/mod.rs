//! Postfix evaluation and the expression compute pipeline
//!
//! [`Evaluator`] runs a postfix sequence on an operand [`Stack`], waiting
//! for the configured [`OperatorDelays`] before every binary operation.
//! [`evaluate`] is the delay-free synchronous entry point.

pub mod delays;

pub use delays::OperatorDelays;

use crate::error::{CalcError, CalcResult};
use crate::parser::{self, BinaryOperator, Token};
use crate::stack::Stack;

/// Postfix evaluator with per-operator latency
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    delays: OperatorDelays,
}

impl Evaluator {
    /// Create an evaluator with the given delays
    pub fn new(delays: OperatorDelays) -> Self {
        Self { delays }
    }

    /// Create an evaluator that never waits
    pub fn immediate() -> Self {
        Self::default()
    }

    /// Delays applied by this evaluator
    pub fn delays(&self) -> &OperatorDelays {
        &self.delays
    }

    /// Parse and evaluate an infix expression
    ///
    /// Returns the first error met, unmodified.
    pub async fn evaluate(&self, expression: &str) -> CalcResult<f64> {
        let postfix = parser::parse(expression)?;
        self.eval_postfix(&postfix).await
    }

    /// Evaluate a postfix sequence
    ///
    /// Exactly one operand must remain at the end; leftovers such as the
    /// two values of `2(3)` are a [`CalcError::MalformedExpression`].
    pub async fn eval_postfix(&self, postfix: &[Token]) -> CalcResult<f64> {
        let mut operands: Stack<f64> = Stack::new();

        for token in postfix {
            match *token {
                Token::Number(value) => operands.push(value),
                Token::Operator(operator) => {
                    let (Some(rhs), Some(lhs)) = (operands.pop(), operands.pop()) else {
                        return Err(CalcError::malformed(format!(
                            "operator '{operator}' needs two operands"
                        )));
                    };
                    let delay = self.delays.for_operator(operator);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    operands.push(apply_operator(operator, lhs, rhs)?);
                }
                Token::UnaryMinus => {
                    let operand = operands
                        .pop()
                        .ok_or_else(|| CalcError::malformed("unary minus needs an operand"))?;
                    operands.push(-operand);
                }
                Token::LeftParen | Token::RightParen => {
                    return Err(CalcError::malformed("parenthesis in postfix sequence"));
                }
            }
        }

        match (operands.pop(), operands.len()) {
            (Some(result), 0) => Ok(result),
            (None, _) => Err(CalcError::malformed("nothing to evaluate")),
            (Some(_), extra) => Err(CalcError::malformed(format!(
                "{extra} operand(s) without an operator"
            ))),
        }
    }
}

/// Apply a binary operator to two operands
pub fn apply_operator(operator: BinaryOperator, lhs: f64, rhs: f64) -> CalcResult<f64> {
    let result = match operator {
        BinaryOperator::Add => lhs + rhs,
        BinaryOperator::Subtract => lhs - rhs,
        BinaryOperator::Multiply => lhs * rhs,
        BinaryOperator::Divide => {
            if rhs == 0.0 {
                return Err(CalcError::DivisionByZero);
            }
            lhs / rhs
        }
    };

    if result.is_finite() {
        Ok(result)
    } else {
        Err(CalcError::Overflow {
            operator: operator.symbol(),
        })
    }
}

/// Evaluate an expression without any artificial latency
///
/// Blocks the calling thread; no async runtime is required because a
/// zero-delay evaluator never reaches a timer.
pub fn evaluate(expression: &str) -> CalcResult<f64> {
    futures::executor::block_on(Evaluator::immediate().evaluate(expression))
}
