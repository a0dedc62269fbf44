// Copyright 2024 Calc Engine Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for expression compilation, evaluation and job processing
//!
//! Parser and evaluator failures are [`CalcError`]s. They never escape a
//! worker: the dispatcher turns them into a terminal `Failed` job status.
//! [`StorageError`] and [`ConfigError`] cover the collaborators around the
//! core, and [`EngineError`] joins all of them for callers that drive the
//! whole pipeline.

use crate::job::JobId;
use thiserror::Error;

/// Result type for parsing and evaluation
pub type CalcResult<T> = std::result::Result<T, CalcError>;

/// Result type for job storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result type for engine-level operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors produced while turning an expression into a number
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    /// Nothing to evaluate
    #[error("expression is empty")]
    EmptyExpression,

    /// A character outside of digits, `.`, `+ - * /` and parentheses
    #[error("invalid character '{character}' at position {position}")]
    InvalidCharacter {
        /// Offending character
        character: char,
        /// Character index in the normalized expression
        position: usize,
    },

    /// A closing parenthesis without an opener, or an opener never closed
    #[error("unbalanced parentheses at position {position}")]
    UnbalancedParentheses {
        /// Character index where the imbalance was detected
        position: usize,
    },

    /// Operator without enough operands, or operands left without an operator
    #[error("malformed expression: {message}")]
    MalformedExpression {
        /// What the evaluator found wrong
        message: String,
    },

    /// Right operand of a division was zero
    #[error("division by zero")]
    DivisionByZero,

    /// An operation left the range of finite doubles
    #[error("result of '{operator}' is not a finite number")]
    Overflow {
        /// Operator symbol that overflowed
        operator: char,
    },

    /// Digits and dots that do not form a number, e.g. `1.2.3`
    #[error("cannot parse number '{literal}'")]
    NumberParse {
        /// The literal as written
        literal: String,
    },
}

impl CalcError {
    /// Create a malformed expression error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedExpression {
            message: message.into(),
        }
    }
}

/// Errors reported by a [`JobStore`](crate::storage::JobStore)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    /// The store could not persist a record
    #[error("storage write failed: {message}")]
    WriteFailure {
        /// Job being written, if it already had an id
        id: Option<JobId>,
        /// Backend specific description
        message: String,
    },

    /// No job with this id
    #[error("job {0} not found")]
    NotFound(JobId),

    /// The job already reached `Completed` or `Failed`
    #[error("job {0} is already in a terminal state")]
    AlreadyTerminal(JobId),

    /// A terminal status was expected but `Pending` was written
    #[error("job {0} cannot be moved back to pending")]
    InvalidTransition(JobId),
}

/// Invalid engine configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The pool needs at least one worker
    #[error("worker count must be at least 1")]
    InvalidWorkerCount,

    /// The submission queue needs room for at least one job
    #[error("queue capacity must be at least 1")]
    ZeroQueueCapacity,

    /// A configuration value could not be parsed
    #[error("invalid value '{value}' for {key}")]
    InvalidValue {
        /// Configuration key, e.g. an environment variable name
        key: String,
        /// Raw value
        value: String,
    },
}

/// Top-level error for engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Expression error
    #[error(transparent)]
    Calc(#[from] CalcError),

    /// Storage error
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The worker pool no longer accepts jobs
    #[error("worker pool is shut down")]
    PoolClosed,
}
