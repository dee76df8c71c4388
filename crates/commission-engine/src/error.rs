//! # Engine Error Types
//!
//! Error type for orchestration operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Engine Error Sources                        │
//! │                                                                  │
//! │  commission-core ──► CoreError   (domain rule violated)         │
//! │  commission-db   ──► DbError     (persistence failure)          │
//! │  MetricsProvider ──► Metrics     (upstream data unavailable)    │
//! │                                                                  │
//! │  All three fold into EngineError; DbError::StaleVersion is      │
//! │  re-mapped to CoreError::DisputeVersionConflict so callers see  │
//! │  one conflict vocabulary.                                        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use commission_core::CoreError;
use commission_db::DbError;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the calculation and dispute services.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The database layer failed.
    #[error(transparent)]
    Db(#[from] DbError),

    /// The metrics provider could not produce data for an employee.
    #[error("Metrics provider failed for employee {employee_id}: {reason}")]
    Metrics { employee_id: String, reason: String },
}

impl EngineError {
    /// Folds a stale dispute write into the domain conflict error so API
    /// callers handle one vocabulary.
    pub fn from_dispute_write(err: DbError, dispute_id: &str) -> Self {
        match err {
            DbError::StaleVersion { expected, .. } => {
                EngineError::Core(CoreError::DisputeVersionConflict {
                    dispute_id: dispute_id.to_string(),
                    expected,
                })
            }
            other => EngineError::Db(other),
        }
    }
}
