//! Tokens of arithmetic expressions

use std::fmt;

/// Binary arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// Addition operator (+)
    Add,
    /// Subtraction operator (-)
    Subtract,
    /// Multiplication operator (*)
    Multiply,
    /// Division operator (/)
    Divide,
}

impl BinaryOperator {
    /// Map an operator character to its operator
    #[inline]
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            '*' => Some(Self::Multiply),
            '/' => Some(Self::Divide),
            _ => None,
        }
    }

    /// Character used to write this operator
    #[inline]
    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
        }
    }

    /// Binding strength; higher binds tighter
    #[inline]
    pub fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Subtract => 1,
            Self::Multiply | Self::Divide => 2,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A single lexical unit of an arithmetic expression
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    /// Numeric literal
    Number(f64),
    /// Binary operator
    Operator(BinaryOperator),
    /// Negation applied to the following operand
    UnaryMinus,
    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
}

impl Token {
    /// Precedence of an operator token, `None` for operands and parentheses
    #[inline]
    pub fn precedence(&self) -> Option<u8> {
        match self {
            Token::Operator(op) => Some(op.precedence()),
            Token::UnaryMinus => Some(3),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(value) => write!(f, "{value}"),
            Token::Operator(op) => write!(f, "{op}"),
            Token::UnaryMinus => write!(f, "~"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
        }
    }
}

/// Tokens in Reverse Polish order
pub type Postfix = Vec<Token>;

/// Render a postfix sequence as space separated tokens
pub fn render_postfix(postfix: &[Token]) -> String {
    postfix
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
