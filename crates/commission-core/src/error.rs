//! # Error Types
//!
//! Domain-specific error types for commission-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  commission-core errors (this file)                                    │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  commission-db errors (separate crate)                                 │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  commission-engine errors                                              │
//! │  └── EngineError      - Orchestration failures (wraps the above)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → ApiError → client   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (employee id, period, ...)
//! 3. Errors are enum variants, never String
//! 4. A batch failure carries enough context to be reported per employee

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. Batch calculation
/// catches them per employee and reports them in the job summary; they are
/// never swallowed.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Plan tiers overlap, leave a gap, or a finite tier is missing a rate.
    ///
    /// ## When This Occurs
    /// - At plan SAVE time only. A stored plan is always well-formed, so
    ///   the rate resolver never has to handle a malformed tier list.
    #[error("Invalid plan configuration: {0}")]
    InvalidPlanConfiguration(String),

    /// No applicable plan exists for the employee on the given date.
    ///
    /// The calculation for that employee fails individually; the batch
    /// continues for the others.
    #[error("No commission plan configured for employee {employee_id} as of {as_of}")]
    NoPlanConfigured {
        employee_id: String,
        as_of: chrono::NaiveDate,
    },

    /// The metrics provider failed or returned no data.
    ///
    /// The calculation is recorded as `Failed` with this reason; missing
    /// metrics are never silently treated as zero sales.
    #[error("Sales metrics unavailable for employee {employee_id}: {reason}")]
    MetricsUnavailable {
        employee_id: String,
        reason: String,
    },

    /// A `Paid` calculation already exists for (employee, plan, period).
    ///
    /// ## When This Occurs
    /// - A batch re-run over a period that has already been paid out.
    ///   Corrections must go through the adjustment ledger or a dispute.
    #[error(
        "Commission for employee {employee_id}, plan {plan_id}, period {period} is already paid"
    )]
    DuplicateCalculation {
        employee_id: String,
        plan_id: String,
        period: String,
    },

    /// Chargeback attempted outside the plan's chargeback window.
    #[error("Chargeback window expired: paid {paid_at}, window {window_days} days")]
    ChargebackWindowExpired {
        paid_at: chrono::DateTime<chrono::Utc>,
        window_days: i64,
    },

    /// The plan does not allow chargebacks at all.
    #[error("Chargebacks are not enabled on plan {plan_id}")]
    ChargebackDisabled { plan_id: String },

    /// A concurrent dispute update lost the optimistic-versioning race.
    /// The caller must refetch and retry.
    #[error("Dispute {dispute_id} was modified concurrently (expected version {expected})")]
    DisputeVersionConflict { dispute_id: String, expected: i64 },

    /// The requested dispute state transition is not allowed.
    #[error("Dispute cannot transition from {from} to {to}: {reason}")]
    InvalidDisputeTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// Attempt to mutate a calculation's computed fields after payout.
    #[error("Calculation {calculation_id} is paid and immutable; append a ledger entry instead")]
    CalculationImmutable { calculation_id: String },

    /// The calculation is not in a state that allows the operation
    /// (e.g. marking a Pending record paid).
    #[error("Calculation {calculation_id} is {status}, cannot perform operation")]
    InvalidCalculationStatus {
        calculation_id: String,
        status: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements, before business
/// logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Period start must precede period end.
    #[error("period start {start} is not before end {end}")]
    InvalidPeriod {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Duplicate value (e.g. duplicate category rate).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::DuplicateCalculation {
            employee_id: "emp-7".to_string(),
            plan_id: "plan-1".to_string(),
            period: "2026-07".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Commission for employee emp-7, plan plan-1, period 2026-07 is already paid"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "employee_id".to_string(),
        };
        assert_eq!(err.to_string(), "employee_id is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
