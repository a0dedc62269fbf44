//! Infix to postfix conversion
//!
//! A single left-to-right pass over the normalized expression. Digits and
//! dots accumulate into a pending literal which is flushed as soon as any
//! other character shows up. Operators wait on a [`Stack`] until an operator
//! of lower precedence, a closing parenthesis or the end of input releases
//! them. Parentheses act as barriers and are never emitted.
//!
//! A `-` is unary when it opens the expression or follows `(` or another
//! operator. Unary minus binds tighter than every binary operator and is
//! right-associative, so it is never popped by another unary minus.

use super::tokenizer::{BinaryOperator, Postfix, Token};
use crate::error::{CalcError, CalcResult};
use crate::stack::Stack;

/// Convert a whitespace-free infix expression into postfix order
///
/// The output needs no further validation before evaluation other than
/// operand counting, which the evaluator does as it goes.
pub fn to_postfix(expression: &str) -> CalcResult<Postfix> {
    let mut output = Postfix::with_capacity(expression.len());
    let mut operators: Stack<Token> = Stack::new();
    // Positions of parentheses still open; its length is the nesting depth.
    let mut open_parens: Stack<usize> = Stack::new();
    let mut literal = String::new();
    let mut previous: Option<char> = None;

    for (position, character) in expression.chars().enumerate() {
        match character {
            '0'..='9' | '.' => literal.push(character),
            '(' => {
                flush_literal(&mut literal, &mut output)?;
                open_parens.push(position);
                operators.push(Token::LeftParen);
            }
            ')' => {
                flush_literal(&mut literal, &mut output)?;
                if open_parens.pop().is_none() {
                    return Err(CalcError::UnbalancedParentheses { position });
                }
                loop {
                    match operators.pop() {
                        Some(Token::LeftParen) => break,
                        Some(token) => output.push(token),
                        None => return Err(CalcError::UnbalancedParentheses { position }),
                    }
                }
            }
            '+' | '-' | '*' | '/' => {
                flush_literal(&mut literal, &mut output)?;
                if character == '-' && is_unary_position(previous) {
                    operators.push(Token::UnaryMinus);
                } else if let Some(operator) = BinaryOperator::from_symbol(character) {
                    while let Some(top) = operators.pop_if(|top| yields_to(operator, top)) {
                        output.push(top);
                    }
                    operators.push(Token::Operator(operator));
                }
            }
            _ => {
                return Err(CalcError::InvalidCharacter {
                    character,
                    position,
                });
            }
        }
        previous = Some(character);
    }

    flush_literal(&mut literal, &mut output)?;

    while let Some(token) = operators.pop() {
        if token == Token::LeftParen {
            let position = open_parens.peek().copied().unwrap_or_default();
            return Err(CalcError::UnbalancedParentheses { position });
        }
        output.push(token);
    }

    Ok(output)
}

/// Whether a `-` following `previous` negates instead of subtracting
#[inline]
fn is_unary_position(previous: Option<char>) -> bool {
    match previous {
        None => true,
        Some(c) => !(c.is_ascii_digit() || c == ')'),
    }
}

/// Whether `top` must be emitted before `incoming` is pushed
///
/// `+`/`-` release every pending operator, `*`/`/` only `*`, `/` and
/// unary minus. Equal precedence releases, giving left associativity.
#[inline]
fn yields_to(incoming: BinaryOperator, top: &Token) -> bool {
    match top.precedence() {
        Some(precedence) => precedence >= incoming.precedence(),
        None => false,
    }
}

fn flush_literal(literal: &mut String, output: &mut Postfix) -> CalcResult<()> {
    if literal.is_empty() {
        return Ok(());
    }
    let value = literal
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CalcError::NumberParse {
            literal: literal.clone(),
        })?;
    output.push(Token::Number(value));
    literal.clear();
    Ok(())
}
