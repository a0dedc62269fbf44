//! Per-operator artificial latency
//!
//! Each binary operation waits for its configured delay before computing,
//! modelling operations of different cost. Delays are fixed when the
//! evaluator is built and never looked up during computation.

use crate::parser::BinaryOperator;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay applied before each binary operation, per operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorDelays {
    /// Delay before `+`
    #[serde(with = "millis")]
    pub addition: Duration,
    /// Delay before `-`
    #[serde(with = "millis")]
    pub subtraction: Duration,
    /// Delay before `*`
    #[serde(with = "millis")]
    pub multiplication: Duration,
    /// Delay before `/`
    #[serde(with = "millis")]
    pub division: Duration,
}

impl OperatorDelays {
    /// No delay for any operator
    pub fn none() -> Self {
        Self::default()
    }

    /// The same delay for every operator
    pub fn uniform(delay: Duration) -> Self {
        Self {
            addition: delay,
            subtraction: delay,
            multiplication: delay,
            division: delay,
        }
    }

    /// Delay configured for `operator`
    #[inline]
    pub fn for_operator(&self, operator: BinaryOperator) -> Duration {
        match operator {
            BinaryOperator::Add => self.addition,
            BinaryOperator::Subtract => self.subtraction,
            BinaryOperator::Multiply => self.multiplication,
            BinaryOperator::Divide => self.division,
        }
    }

    /// Check if every delay is zero
    pub fn is_zero(&self) -> bool {
        [
            self.addition,
            self.subtraction,
            self.multiplication,
            self.division,
        ]
        .iter()
        .all(Duration::is_zero)
    }
}

/// Durations as whole milliseconds
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis().try_into().unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
