//! End-to-end tests for the expression compute pipeline

use calc_engine::parser::render_postfix;
use calc_engine::{CalcError, evaluate, to_postfix};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case("1+1", 2.0)]
#[case("(2+2)*2", 8.0)]
#[case("2+2*2", 6.0)]
#[case("1/2", 0.5)]
#[case("-(-11-(1*20/2)-11/2*3)", 37.5)]
#[case("-11-1*20/2", -21.0)]
#[case("-11-1*20/001", -31.0)]
#[case("3.5*2", 7.0)]
#[case("10/4/5", 0.5)]
#[case("((((7))))", 7.0)]
#[case("2*(3+4)*5", 70.0)]
#[case("-3*-3", 9.0)]
#[case("1-(-1)", 2.0)]
fn test_evaluates(#[case] expression: &str, #[case] expected: f64) {
    assert_eq!(evaluate(expression), Ok(expected));
}

#[rstest]
#[case(" 1 + 1 ", 2.0)]
#[case("2 *\n( 3 + 4 )\n", 14.0)]
#[case("\t8 / 2", 4.0)]
fn test_whitespace_is_ignored(#[case] expression: &str, #[case] expected: f64) {
    assert_eq!(evaluate(expression), Ok(expected));
}

#[test]
fn test_empty_expression() {
    assert_eq!(evaluate(""), Err(CalcError::EmptyExpression));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(evaluate("1/0"), Err(CalcError::DivisionByZero));
    assert_eq!(evaluate("5/(2-2)"), Err(CalcError::DivisionByZero));
}

#[rstest]
#[case("(1+2")]
#[case("1+2)")]
#[case("((1)")]
#[case(")1(")]
fn test_unbalanced_parentheses(#[case] expression: &str) {
    assert!(matches!(
        evaluate(expression),
        Err(CalcError::UnbalancedParentheses { .. })
    ));
}

#[rstest]
#[case("1&2", '&')]
#[case("x+1", 'x')]
#[case("2^2", '^')]
#[case("1,5+1", ',')]
fn test_invalid_character(#[case] expression: &str, #[case] character: char) {
    match evaluate(expression) {
        Err(CalcError::InvalidCharacter { character: found, .. }) => assert_eq!(found, character),
        other => panic!("expected invalid character, got {other:?}"),
    }
}

#[rstest]
#[case("1+")]
#[case("*1")]
#[case("()")]
#[case("2(3)")]
#[case("(1)(2)")]
fn test_malformed(#[case] expression: &str) {
    assert!(matches!(
        evaluate(expression),
        Err(CalcError::MalformedExpression { .. })
    ));
}

#[test]
fn test_bad_number_literal() {
    assert_eq!(
        evaluate("1..2+1"),
        Err(CalcError::NumberParse {
            literal: "1..2".to_string()
        })
    );
}

#[test]
fn test_first_error_wins() {
    // The parser reports the character before the evaluator could see 1/0.
    assert!(matches!(
        evaluate("1/0+a"),
        Err(CalcError::InvalidCharacter { character: 'a', .. })
    ));
}

#[test]
fn test_postfix_is_deterministic() {
    for expression in ["1+1", "-(-11-(1*20/2)-11/2*3)", "2*-3+4/2"] {
        let first = to_postfix(expression).unwrap();
        let second = to_postfix(expression).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_postfix_rendering() {
    let postfix = to_postfix("-(-11-(1*20/2)-11/2*3)").unwrap();
    assert_eq!(
        render_postfix(&postfix),
        "11 ~ 1 20 * 2 / - 11 2 / 3 * - ~"
    );
}

#[test]
fn test_results_are_finite_or_errors() {
    for expression in ["1/3", "0.1+0.2", "99999*99999", "-0/5"] {
        let value = evaluate(expression).unwrap();
        assert!(value.is_finite(), "{expression} gave {value}");
    }
}
