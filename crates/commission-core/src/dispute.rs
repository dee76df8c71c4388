//! # Dispute State Machine
//!
//! Pure transition rules for contested calculations.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Open ──────────────► UnderReview ──────────────► Resolved (terminal) │
//! │    │    (requires           │        (requires                         │
//! │    │     assignee)          │         outcome)                         │
//! │    │                        │                                           │
//! │    └────────────────────────┴──► Open → Resolved directly is DISALLOWED│
//! │                                  unless auto-resolution policy is      │
//! │                                  explicitly enabled                    │
//! │                                                                         │
//! │   Outcome: Upheld   → no change to the calculation                     │
//! │            Adjusted → ledger entry referencing the dispute id          │
//! │                       (appended by the engine, never written here)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Optimistic-version bookkeeping lives in the repository (compare-and-swap
//! on the `version` column); this module only decides whether a transition
//! is legal.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{
    CalculationStatus, CommissionCalculation, Dispute, DisputeOutcome, DisputeStatus,
};

/// Files a new dispute against a calculated or paid amount.
///
/// Captures `difference = disputed - expected` at filing time.
pub fn open_dispute(
    calculation: &CommissionCalculation,
    disputed_amount_cents: i64,
    expected_amount_cents: i64,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> CoreResult<Dispute> {
    match calculation.status {
        CalculationStatus::Calculated | CalculationStatus::Paid => {}
        _ => {
            return Err(CoreError::InvalidCalculationStatus {
                calculation_id: calculation.id.clone(),
                status: format!("{:?}", calculation.status),
            })
        }
    }

    Ok(Dispute {
        id: Uuid::new_v4().to_string(),
        calculation_id: calculation.id.clone(),
        disputed_amount_cents,
        expected_amount_cents,
        difference_cents: disputed_amount_cents - expected_amount_cents,
        status: DisputeStatus::Open,
        assigned_to: None,
        notes,
        outcome: None,
        resolved_at: None,
        version: 1,
        created_at: now,
    })
}

/// `Open → UnderReview`. Requires a reviewer.
pub fn assign(dispute: &mut Dispute, assignee: &str) -> CoreResult<()> {
    if assignee.trim().is_empty() {
        return Err(CoreError::InvalidDisputeTransition {
            from: status_name(dispute.status).to_string(),
            to: "under_review".to_string(),
            reason: "an assignee is required".to_string(),
        });
    }

    match dispute.status {
        DisputeStatus::Open => {
            dispute.status = DisputeStatus::UnderReview;
            dispute.assigned_to = Some(assignee.to_string());
            Ok(())
        }
        // Reassignment during review is fine; it is not a state change.
        DisputeStatus::UnderReview => {
            dispute.assigned_to = Some(assignee.to_string());
            Ok(())
        }
        DisputeStatus::Resolved => Err(CoreError::InvalidDisputeTransition {
            from: "resolved".to_string(),
            to: "under_review".to_string(),
            reason: "resolved is terminal".to_string(),
        }),
    }
}

/// `UnderReview → Resolved` (or `Open → Resolved` when the auto-resolution
/// policy is explicitly enabled). An outcome is mandatory.
///
/// When the outcome is [`DisputeOutcome::Adjusted`], the caller appends an
/// adjustment-ledger entry referencing `dispute.id`; the calculation itself
/// is never rewritten.
pub fn resolve(
    dispute: &mut Dispute,
    outcome: DisputeOutcome,
    notes: Option<String>,
    auto_resolution_enabled: bool,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    match dispute.status {
        DisputeStatus::UnderReview => {}
        DisputeStatus::Open if auto_resolution_enabled => {}
        DisputeStatus::Open => {
            return Err(CoreError::InvalidDisputeTransition {
                from: "open".to_string(),
                to: "resolved".to_string(),
                reason: "dispute must be assigned for review first".to_string(),
            })
        }
        DisputeStatus::Resolved => {
            return Err(CoreError::InvalidDisputeTransition {
                from: "resolved".to_string(),
                to: "resolved".to_string(),
                reason: "resolved is terminal".to_string(),
            })
        }
    }

    dispute.status = DisputeStatus::Resolved;
    dispute.outcome = Some(outcome);
    dispute.resolved_at = Some(now);
    if notes.is_some() {
        dispute.notes = notes;
    }
    Ok(())
}

fn status_name(status: DisputeStatus) -> &'static str {
    match status {
        DisputeStatus::Open => "open",
        DisputeStatus::UnderReview => "under_review",
        DisputeStatus::Resolved => "resolved",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::types::{CalculationPeriod, SalesMetrics};

    fn calculation(status: CalculationStatus) -> CommissionCalculation {
        CommissionCalculation {
            id: "c1".into(),
            employee_id: "e1".into(),
            plan_id: "p1".into(),
            plan_version: 1,
            period: CalculationPeriod {
                start: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(),
                name: "2026-07".into(),
            },
            metrics: SalesMetrics {
                total_sales_cents: 0,
                quota_achievement_bps: 0,
                category_breakdown: vec![],
            },
            details: vec![],
            bonuses: vec![],
            adjustments: vec![],
            gross_commission_cents: 134_000,
            total_bonuses_cents: 0,
            status,
            failure_reason: None,
            payout_date: None,
            paid_at: None,
            calculated_at: Utc::now(),
            calculated_by: "batch".into(),
        }
    }

    #[test]
    fn test_open_captures_difference() {
        let calc = calculation(CalculationStatus::Paid);
        let dispute = open_dispute(&calc, 134_000, 150_000, None, Utc::now()).unwrap();

        assert_eq!(dispute.status, DisputeStatus::Open);
        assert_eq!(dispute.difference_cents, -16_000);
        assert_eq!(dispute.version, 1);
    }

    #[test]
    fn test_open_rejected_for_pending() {
        let calc = calculation(CalculationStatus::Pending);
        assert!(open_dispute(&calc, 0, 0, None, Utc::now()).is_err());
    }

    #[test]
    fn test_full_lifecycle() {
        let calc = calculation(CalculationStatus::Calculated);
        let mut dispute = open_dispute(&calc, 134_000, 150_000, None, Utc::now()).unwrap();

        assign(&mut dispute, "reviewer-1").unwrap();
        assert_eq!(dispute.status, DisputeStatus::UnderReview);
        assert_eq!(dispute.assigned_to.as_deref(), Some("reviewer-1"));

        resolve(
            &mut dispute,
            DisputeOutcome::Adjusted,
            Some("rate was wrong".into()),
            false,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(dispute.status, DisputeStatus::Resolved);
        assert_eq!(dispute.outcome, Some(DisputeOutcome::Adjusted));
        assert!(dispute.resolved_at.is_some());
    }

    /// Scenario D guard: open → resolved directly is disallowed unless
    /// auto-resolution is explicitly enabled.
    #[test]
    fn test_open_to_resolved_blocked_without_policy() {
        let calc = calculation(CalculationStatus::Paid);
        let mut dispute = open_dispute(&calc, 100, 200, None, Utc::now()).unwrap();

        let err =
            resolve(&mut dispute, DisputeOutcome::Upheld, None, false, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDisputeTransition { .. }));
        assert_eq!(dispute.status, DisputeStatus::Open);
    }

    #[test]
    fn test_open_to_resolved_allowed_with_policy() {
        let calc = calculation(CalculationStatus::Paid);
        let mut dispute = open_dispute(&calc, 100, 200, None, Utc::now()).unwrap();

        resolve(&mut dispute, DisputeOutcome::Upheld, None, true, Utc::now()).unwrap();
        assert_eq!(dispute.status, DisputeStatus::Resolved);
    }

    #[test]
    fn test_assign_requires_assignee() {
        let calc = calculation(CalculationStatus::Paid);
        let mut dispute = open_dispute(&calc, 100, 200, None, Utc::now()).unwrap();
        assert!(assign(&mut dispute, "  ").is_err());
    }

    #[test]
    fn test_resolved_is_terminal() {
        let calc = calculation(CalculationStatus::Paid);
        let mut dispute = open_dispute(&calc, 100, 200, None, Utc::now()).unwrap();
        assign(&mut dispute, "reviewer-1").unwrap();
        resolve(&mut dispute, DisputeOutcome::Upheld, None, false, Utc::now()).unwrap();

        assert!(assign(&mut dispute, "reviewer-2").is_err());
        assert!(
            resolve(&mut dispute, DisputeOutcome::Adjusted, None, false, Utc::now()).is_err()
        );
    }
}
