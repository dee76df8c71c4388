//! Error types for the Commission API.
//!
//! Maps domain errors onto HTTP status codes:
//!
//! | condition                                   | status |
//! |---------------------------------------------|--------|
//! | record not found                            | 404    |
//! | duplicate calculation, stale dispute version| 409    |
//! | invalid plan / transition / input           | 422    |
//! | metrics provider unavailable                | 502    |
//! | anything else                               | 500    |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use commission_core::CoreError;
use commission_db::DbError;
use commission_engine::EngineError;

/// API error carrying the status code to answer with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    Unprocessable(String),

    #[error("Upstream unavailable: {0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::DuplicateCalculation { .. } | CoreError::DisputeVersionConflict { .. } => {
                ApiError::Conflict(err.to_string())
            }
            CoreError::NoPlanConfigured { .. } => ApiError::NotFound(err.to_string()),
            CoreError::MetricsUnavailable { .. } => ApiError::BadGateway(err.to_string()),
            CoreError::InvalidPlanConfiguration(_)
            | CoreError::InvalidDisputeTransition { .. }
            | CoreError::InvalidCalculationStatus { .. }
            | CoreError::CalculationImmutable { .. }
            | CoreError::ChargebackWindowExpired { .. }
            | CoreError::ChargebackDisabled { .. }
            | CoreError::Validation(_) => ApiError::Unprocessable(err.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } | DbError::StaleVersion { .. } => {
                ApiError::Conflict(err.to_string())
            }
            DbError::ForeignKeyViolation { .. } => ApiError::Unprocessable(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Core(core) => core.into(),
            EngineError::Db(db) => db.into(),
            EngineError::Metrics { .. } => ApiError::BadGateway(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "Request failed");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
