//! # Adjustment Ledger
//!
//! Pure arithmetic and policy checks for the append-only adjustment ledger.
//!
//! ## Audit Guarantee
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Calculation (Paid, immutable)                                          │
//! │  ├── gross:   $840.00   ◄── never mutated after payout                 │
//! │  ├── bonuses: $500.00   ◄── never mutated after payout                 │
//! │  │                                                                      │
//! │  │   Adjustment Ledger (append-only)                                   │
//! │  ├── #1  chargeback  -$1,000.00  "sale reversed"                       │
//! │  ├── #2  manual        +$25.00   "rate correction"                     │
//! │  │                                                                      │
//! │  └── reported net = 840 + 500 - 1000 + 25 = $365.00                    │
//! │                                                                         │
//! │  Entries are never edited or deleted. The historical record and the    │
//! │  current payable amount are both always reconstructible.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The clock is a parameter everywhere: these functions stay pure and the
//! chargeback-window rule is testable without waiting 90 days.

use chrono::{DateTime, Duration, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Adjustment, CommissionCalculation, PaymentRules};

/// Sums a ledger (signed entries) into a single total.
pub fn ledger_total(adjustments: &[Adjustment]) -> Money {
    adjustments.iter().map(Adjustment::amount).sum()
}

/// Checks whether a chargeback may be filed against a paid calculation.
///
/// ## Rules
/// - The plan must have `chargeback_enabled`
/// - `now` must be within `chargeback_period_days` of the payout
///
/// Returns `ChargebackDisabled` / `ChargebackWindowExpired` otherwise.
pub fn check_chargeback_window(
    rules: &PaymentRules,
    plan_id: &str,
    paid_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    if !rules.chargeback_enabled {
        return Err(CoreError::ChargebackDisabled {
            plan_id: plan_id.to_string(),
        });
    }

    let window_end = paid_at + Duration::days(rules.chargeback_period_days);
    if now > window_end {
        return Err(CoreError::ChargebackWindowExpired {
            paid_at,
            window_days: rules.chargeback_period_days,
        });
    }

    Ok(())
}

/// Guards ledger appends: adjustments are only valid once a calculation has
/// actually been computed.
///
/// A `Pending` or `Failed` record has no authoritative number to correct;
/// `Calculated`, `Paid` and `Disputed` records accept entries.
pub fn check_adjustable(calculation: &CommissionCalculation) -> CoreResult<()> {
    use crate::types::CalculationStatus::*;
    match calculation.status {
        Calculated | Paid | Disputed => Ok(()),
        Pending | Failed => Err(CoreError::InvalidCalculationStatus {
            calculation_id: calculation.id.clone(),
            status: format!("{:?}", calculation.status),
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    use crate::types::{
        AdjustmentKind, CalculationPeriod, CalculationStatus, SalesMetrics,
    };

    fn rules(enabled: bool, window_days: i64) -> PaymentRules {
        PaymentRules {
            chargeback_enabled: enabled,
            chargeback_period_days: window_days,
            ..PaymentRules::default()
        }
    }

    fn adjustment(cents: i64) -> Adjustment {
        Adjustment {
            id: "a1".into(),
            calculation_id: "c1".into(),
            kind: AdjustmentKind::Manual,
            amount_cents: cents,
            reason: "test".into(),
            applied_by: "admin".into(),
            applied_at: Utc::now(),
            dispute_id: None,
        }
    }

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
            gross_commission_cents: 0,
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
    fn test_ledger_total_signed() {
        let ledger = vec![adjustment(-100_000), adjustment(2_500)];
        assert_eq!(ledger_total(&ledger).cents(), -97_500);
    }

    /// Scenario C timing: chargeback 10 days after payout with a 30-day
    /// window is allowed.
    #[test]
    fn test_chargeback_inside_window() {
        let paid_at = Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap();
        let now = paid_at + Duration::days(10);
        assert!(check_chargeback_window(&rules(true, 30), "p1", paid_at, now).is_ok());
    }

    #[test]
    fn test_chargeback_outside_window() {
        let paid_at = Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap();
        let now = paid_at + Duration::days(31);
        let err = check_chargeback_window(&rules(true, 30), "p1", paid_at, now).unwrap_err();
        assert!(matches!(err, CoreError::ChargebackWindowExpired { .. }));
    }

    #[test]
    fn test_chargeback_at_window_boundary_allowed() {
        let paid_at = Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap();
        let now = paid_at + Duration::days(30);
        assert!(check_chargeback_window(&rules(true, 30), "p1", paid_at, now).is_ok());
    }

    #[test]
    fn test_chargeback_disabled() {
        let paid_at = Utc::now();
        let err = check_chargeback_window(&rules(false, 30), "p1", paid_at, paid_at).unwrap_err();
        assert!(matches!(err, CoreError::ChargebackDisabled { .. }));
    }

    #[test]
    fn test_adjustable_states() {
        assert!(check_adjustable(&calculation(CalculationStatus::Calculated)).is_ok());
        assert!(check_adjustable(&calculation(CalculationStatus::Paid)).is_ok());
        assert!(check_adjustable(&calculation(CalculationStatus::Disputed)).is_ok());
        assert!(check_adjustable(&calculation(CalculationStatus::Pending)).is_err());
        assert!(check_adjustable(&calculation(CalculationStatus::Failed)).is_err());
    }
}
