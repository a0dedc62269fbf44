//! Arithmetic expression engine with asynchronous job evaluation
//!
//! Expressions go through a shunting-yard parser into postfix form, are
//! evaluated on an operand stack, and run as background jobs on a fixed
//! pool of workers that write their results back to a [`JobStore`].
//!
//! ```
//! assert_eq!(calc_engine::evaluate("(2+2)*2"), Ok(8.0));
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod evaluator;
pub mod job;
pub mod parser;
pub mod stack;
pub mod storage;

// Re-export main types
pub use config::EngineConfig;
pub use dispatcher::{JobSubmitter, PoolStats, WorkerPool};
pub use error::{CalcError, CalcResult, ConfigError, EngineError, EngineResult, StorageError};
pub use evaluator::{Evaluator, OperatorDelays, evaluate};
pub use job::{Job, JobId, JobStatus, OwnerKey};
pub use parser::{Postfix, Token, to_postfix};
pub use stack::Stack;
pub use storage::{InMemoryJobStore, JobStore};
