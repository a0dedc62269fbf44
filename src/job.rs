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

//! Jobs and their lifecycle
//!
//! A job is created `Pending`, handed to exactly one worker and moved once
//! into `Completed` or `Failed`. Terminal states never change again.

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage-assigned job identifier, unique and increasing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identity of whoever submitted a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerKey(String);

impl OwnerKey {
    /// Create an owner key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Raw key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OwnerKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for OwnerKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a job is in its lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted and waiting for a worker
    Pending,
    /// Evaluated successfully
    Completed {
        /// Value of the expression
        result: f64,
    },
    /// Evaluation failed
    Failed {
        /// Human-readable cause
        reason: String,
    },
}

impl JobStatus {
    /// Check if no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }

    /// Result of a completed job
    pub fn result(&self) -> Option<f64> {
        match self {
            JobStatus::Completed { result } => Some(*result),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Completed { .. } => write!(f, "completed"),
            JobStatus::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// One submitted expression and its tracked state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Identifier assigned by storage
    pub id: JobId,
    /// Expression text as submitted
    pub expression: String,
    /// Lifecycle state
    pub status: JobStatus,
    /// Submitter
    pub owner: OwnerKey,
}

impl Job {
    /// Create a pending job
    pub fn new(id: JobId, expression: impl Into<String>, owner: OwnerKey) -> Self {
        Self {
            id,
            expression: expression.into(),
            status: JobStatus::Pending,
            owner,
        }
    }

    /// Move out of `Pending` into `status`
    ///
    /// Fails with [`StorageError::AlreadyTerminal`] once the job has left
    /// `Pending`, and with [`StorageError::InvalidTransition`] when `status`
    /// is `Pending` itself.
    pub fn transition(&mut self, status: JobStatus) -> StorageResult<()> {
        if self.status.is_terminal() {
            return Err(StorageError::AlreadyTerminal(self.id));
        }
        if !status.is_terminal() {
            return Err(StorageError::InvalidTransition(self.id));
        }
        self.status = status;
        Ok(())
    }
}
