//! # Validation Module
//!
//! Plan and input validation for the commission engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: API handler (deserialization + field checks)                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │           ├── validate_plan: tier partition of [0, ∞)                  │
//! │           └── field/period validators                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (UNIQUE + foreign key constraints)                  │
//! │                                                                         │
//! │  Tiers are validated at PLAN-SAVE time, never at calculation time:     │
//! │  a stored plan is always a well-formed partition, so the rate          │
//! │  resolver can stay a total function.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::{CoreError, ValidationError};
use crate::types::{CategoryRate, CommissionPlan, Tier};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum commission rate: 100% in basis points.
pub const MAX_RATE_BPS: u32 = 10_000;

// =============================================================================
// Plan Validation
// =============================================================================

/// Validates a complete plan definition at save time.
///
/// ## Rules
/// - At least one tier
/// - Tiers sorted ascending by `minimum_sales_cents`
/// - The first tier starts at 0
/// - Each tier's maximum equals the next tier's minimum (no gap, no overlap)
/// - Exactly one open-ended tier, and it is the last one
/// - Every rate within 0..=10000 bps
/// - Bonus threshold and amount are either both present or both absent
/// - Category rate overrides are unique per category and within range
///
/// Violations surface as [`CoreError::InvalidPlanConfiguration`]. A plan
/// that passes here partitions `[0, ∞)` with no gap or overlap.
pub fn validate_plan(plan: &CommissionPlan) -> Result<(), CoreError> {
    if plan.name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        }
        .into());
    }

    validate_tiers(&plan.tiers)?;
    validate_category_rates(&plan.category_rates)?;

    if plan.payment_rules.payment_delay_days < 0 {
        return Err(CoreError::InvalidPlanConfiguration(
            "payment delay cannot be negative".to_string(),
        ));
    }
    if plan.payment_rules.chargeback_period_days < 0 {
        return Err(CoreError::InvalidPlanConfiguration(
            "chargeback period cannot be negative".to_string(),
        ));
    }

    Ok(())
}

/// Validates that a tier list forms a non-overlapping partition of `[0, ∞)`.
pub fn validate_tiers(tiers: &[Tier]) -> Result<(), CoreError> {
    if tiers.is_empty() {
        return Err(CoreError::InvalidPlanConfiguration(
            "plan must have at least one tier".to_string(),
        ));
    }

    if tiers[0].minimum_sales_cents != 0 {
        return Err(CoreError::InvalidPlanConfiguration(format!(
            "first tier must start at 0, starts at {}",
            tiers[0].minimum_sales_cents
        )));
    }

    for (i, tier) in tiers.iter().enumerate() {
        if tier.commission_rate_bps > MAX_RATE_BPS {
            return Err(CoreError::InvalidPlanConfiguration(format!(
                "tier {} rate {} bps exceeds 10000",
                tier.level, tier.commission_rate_bps
            )));
        }

        if tier.bonus_threshold_cents.is_some() != tier.bonus_amount_cents.is_some() {
            return Err(CoreError::InvalidPlanConfiguration(format!(
                "tier {} must set bonus threshold and amount together",
                tier.level
            )));
        }

        match tier.maximum_sales_cents {
            Some(max) => {
                if max <= tier.minimum_sales_cents {
                    return Err(CoreError::InvalidPlanConfiguration(format!(
                        "tier {} maximum {} is not above minimum {}",
                        tier.level, max, tier.minimum_sales_cents
                    )));
                }
                // A finite tier must be followed by the tier that picks up
                // exactly where it ends.
                match tiers.get(i + 1) {
                    Some(next) if next.minimum_sales_cents == max => {}
                    Some(next) if next.minimum_sales_cents > max => {
                        return Err(CoreError::InvalidPlanConfiguration(format!(
                            "gap between tier {} (ends {}) and tier {} (starts {})",
                            tier.level, max, next.level, next.minimum_sales_cents
                        )));
                    }
                    Some(next) => {
                        return Err(CoreError::InvalidPlanConfiguration(format!(
                            "tier {} overlaps tier {}",
                            tier.level, next.level
                        )));
                    }
                    None => {
                        return Err(CoreError::InvalidPlanConfiguration(
                            "last tier must be open-ended (no maximum)".to_string(),
                        ));
                    }
                }
            }
            None => {
                // The open-ended tier absorbs everything above the highest
                // finite boundary, so nothing may follow it.
                if i != tiers.len() - 1 {
                    return Err(CoreError::InvalidPlanConfiguration(format!(
                        "open-ended tier {} must be the last tier",
                        tier.level
                    )));
                }
            }
        }
    }

    Ok(())
}

fn validate_category_rates(rates: &[CategoryRate]) -> Result<(), CoreError> {
    for (i, rate) in rates.iter().enumerate() {
        if rate.category.trim().is_empty() {
            return Err(CoreError::InvalidPlanConfiguration(
                "category rate with empty category".to_string(),
            ));
        }
        if rate.rate_bps > MAX_RATE_BPS {
            return Err(CoreError::InvalidPlanConfiguration(format!(
                "category '{}' rate {} bps exceeds 10000",
                rate.category, rate.rate_bps
            )));
        }
        if rates[..i].iter().any(|r| r.category == rate.category) {
            return Err(CoreError::InvalidPlanConfiguration(format!(
                "duplicate category rate for '{}'",
                rate.category
            )));
        }
    }
    Ok(())
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an entity id (UUID string).
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates a calculation period: start strictly before end.
pub fn validate_period(start: NaiveDate, end: NaiveDate) -> ValidationResult<()> {
    if start >= end {
        return Err(ValidationError::InvalidPeriod { start, end });
    }
    Ok(())
}

/// Validates a manual adjustment amount.
///
/// ## Rules
/// - Must be non-zero (a zero adjustment has no meaning in the ledger)
pub fn validate_adjustment_amount(cents: i64) -> ValidationResult<()> {
    if cents == 0 {
        return Err(ValidationError::MustBePositive {
            field: "adjustment amount".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    use crate::types::{PaymentRules, PlanType};

    fn tier(level: i32, min: i64, max: Option<i64>, bps: u32) -> Tier {
        Tier {
            level,
            name: format!("Tier {level}"),
            minimum_sales_cents: min,
            maximum_sales_cents: max,
            commission_rate_bps: bps,
            bonus_threshold_cents: None,
            bonus_amount_cents: None,
        }
    }

    fn plan_with_tiers(tiers: Vec<Tier>) -> CommissionPlan {
        CommissionPlan {
            id: "v1".into(),
            plan_id: "p1".into(),
            version: 1,
            name: "Rep Plan".into(),
            plan_type: PlanType::SalesRep,
            tiers,
            payment_rules: PaymentRules::default(),
            category_rates: vec![],
            highest_bonus_only: false,
            effective_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_valid_two_tier_plan() {
        let plan = plan_with_tiers(vec![
            tier(1, 0, Some(1_000_000), 500),
            tier(2, 1_000_000, None, 700),
        ]);
        assert!(validate_plan(&plan).is_ok());
    }

    #[test]
    fn test_single_open_tier_is_valid() {
        let plan = plan_with_tiers(vec![tier(1, 0, None, 500)]);
        assert!(validate_plan(&plan).is_ok());
    }

    #[test]
    fn test_gap_rejected() {
        let plan = plan_with_tiers(vec![
            tier(1, 0, Some(1_000_000), 500),
            tier(2, 2_000_000, None, 700),
        ]);
        assert!(matches!(
            validate_plan(&plan),
            Err(CoreError::InvalidPlanConfiguration(_))
        ));
    }

    #[test]
    fn test_overlap_rejected() {
        let plan = plan_with_tiers(vec![
            tier(1, 0, Some(1_000_000), 500),
            tier(2, 500_000, None, 700),
        ]);
        assert!(matches!(
            validate_plan(&plan),
            Err(CoreError::InvalidPlanConfiguration(_))
        ));
    }

    #[test]
    fn test_missing_open_tier_rejected() {
        let plan = plan_with_tiers(vec![
            tier(1, 0, Some(1_000_000), 500),
            tier(2, 1_000_000, Some(2_000_000), 700),
        ]);
        assert!(validate_plan(&plan).is_err());
    }

    #[test]
    fn test_open_tier_not_last_rejected() {
        let plan = plan_with_tiers(vec![tier(1, 0, None, 500), tier(2, 1_000_000, None, 700)]);
        assert!(validate_plan(&plan).is_err());
    }

    #[test]
    fn test_first_tier_not_zero_rejected() {
        let plan = plan_with_tiers(vec![tier(1, 100, None, 500)]);
        assert!(validate_plan(&plan).is_err());
    }

    #[test]
    fn test_bonus_threshold_without_amount_rejected() {
        let mut t = tier(1, 0, None, 500);
        t.bonus_threshold_cents = Some(1_000_000);
        let plan = plan_with_tiers(vec![t]);
        assert!(validate_plan(&plan).is_err());
    }

    #[test]
    fn test_duplicate_category_rate_rejected() {
        let mut plan = plan_with_tiers(vec![tier(1, 0, None, 500)]);
        plan.category_rates = vec![
            CategoryRate {
                category: "parts".into(),
                rate_bps: 300,
            },
            CategoryRate {
                category: "parts".into(),
                rate_bps: 400,
            },
        ];
        assert!(validate_plan(&plan).is_err());
    }

    #[test]
    fn test_validate_period() {
        let start = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        assert!(validate_period(start, end).is_ok());
        assert!(validate_period(end, start).is_err());
        assert!(validate_period(start, start).is_err());
    }

    #[test]
    fn test_validate_adjustment_amount() {
        assert!(validate_adjustment_amount(-100_000).is_ok());
        assert!(validate_adjustment_amount(25_000).is_ok());
        assert!(validate_adjustment_amount(0).is_err());
    }

    proptest! {
        /// For any valid plan built from generated boundaries, the tiers
        /// partition [0, ∞): every sales amount lands in exactly one tier.
        #[test]
        fn prop_valid_tiers_partition_every_amount(
            boundaries in proptest::collection::btree_set(1_i64..100_000_000, 0..6),
            probe in 0_i64..200_000_000,
        ) {
            let mut edges: Vec<i64> = vec![0];
            edges.extend(boundaries.iter().copied());

            let tiers: Vec<Tier> = edges
                .iter()
                .enumerate()
                .map(|(i, &min)| tier(
                    i as i32 + 1,
                    min,
                    edges.get(i + 1).copied(),
                    (i as u32 + 1) * 100,
                ))
                .collect();

            prop_assert!(validate_tiers(&tiers).is_ok());

            let matching = tiers.iter().filter(|t| t.contains(probe)).count();
            prop_assert_eq!(matching, 1);
        }

        /// Removing an interior tier always produces a gap the validator
        /// rejects.
        #[test]
        fn prop_gapped_tiers_rejected(
            boundaries in proptest::collection::btree_set(1_i64..100_000_000, 2..6),
        ) {
            let mut edges: Vec<i64> = vec![0];
            edges.extend(boundaries.iter().copied());

            let mut tiers: Vec<Tier> = edges
                .iter()
                .enumerate()
                .map(|(i, &min)| tier(i as i32 + 1, min, edges.get(i + 1).copied(), 100))
                .collect();

            // Drop a middle tier to open a gap
            tiers.remove(1);

            prop_assert!(validate_tiers(&tiers).is_err());
        }
    }
}
