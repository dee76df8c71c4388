//! # Bonus Evaluator
//!
//! Determines which tier-linked bonuses were earned for a period.
//!
//! ## Transparency Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sales: $15,000                                                         │
//! │                                                                         │
//! │  Tier 1  threshold $10,000  bonus $500   →  met, pays $500             │
//! │  Tier 2  threshold $25,000  bonus $1,000 →  NOT met, listed at $0      │
//! │                                                                         │
//! │  Every threshold appears on the statement, earned or not, so the       │
//! │  employee can see exactly what they were measured against.             │
//! │                                                                         │
//! │  Cumulative by default; a plan with highest_bonus_only = true pays     │
//! │  only the highest threshold met (lower met tiers listed at $0).        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::money::Money;
use crate::types::{Bonus, CommissionPlan};

/// Evaluates every tier-linked bonus against the period's total sales.
///
/// Returns one [`Bonus`] row per tier carrying a threshold, in tier order.
/// `amount_cents` is the amount actually counted towards the bonus total,
/// so `sum(amount where eligibility_met)` is always the payable bonus total
/// regardless of the `highest_bonus_only` flag.
pub fn evaluate_bonuses(plan: &CommissionPlan, total_sales_cents: i64) -> Vec<Bonus> {
    let mut bonuses: Vec<Bonus> = plan
        .tiers
        .iter()
        .filter_map(|tier| {
            let threshold = tier.bonus_threshold_cents?;
            let amount = tier.bonus_amount_cents?;
            let met = total_sales_cents >= threshold;
            Some(Bonus {
                tier_level: tier.level,
                threshold_cents: threshold,
                amount_cents: if met { amount } else { 0 },
                eligibility_met: met,
            })
        })
        .collect();

    if plan.highest_bonus_only {
        // Keep the payout only on the highest threshold met; lower met
        // tiers stay listed but count nothing.
        let highest_met = bonuses
            .iter()
            .filter(|b| b.eligibility_met)
            .map(|b| b.threshold_cents)
            .max();
        if let Some(top) = highest_met {
            for bonus in &mut bonuses {
                if bonus.eligibility_met && bonus.threshold_cents != top {
                    bonus.amount_cents = 0;
                }
            }
        }
    }

    bonuses
}

/// Sums the earned bonus amounts.
pub fn total_bonuses(bonuses: &[Bonus]) -> Money {
    bonuses
        .iter()
        .filter(|b| b.eligibility_met)
        .map(|b| Money::from_cents(b.amount_cents))
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    use crate::types::{PaymentRules, PlanType, Tier};

    fn tier_with_bonus(
        level: i32,
        min: i64,
        max: Option<i64>,
        threshold: Option<i64>,
        amount: Option<i64>,
    ) -> Tier {
        Tier {
            level,
            name: format!("Tier {level}"),
            minimum_sales_cents: min,
            maximum_sales_cents: max,
            commission_rate_bps: 500,
            bonus_threshold_cents: threshold,
            bonus_amount_cents: amount,
        }
    }

    fn plan(tiers: Vec<Tier>, highest_only: bool) -> CommissionPlan {
        CommissionPlan {
            id: "v1".into(),
            plan_id: "p1".into(),
            version: 1,
            name: "Rep Plan".into(),
            plan_type: PlanType::SalesRep,
            tiers,
            payment_rules: PaymentRules::default(),
            category_rates: vec![],
            highest_bonus_only: highest_only,
            effective_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Scenario B: threshold $10,000, bonus $500; sales $15,000
    /// ⇒ eligibility met, total bonuses $500.
    #[test]
    fn test_threshold_met() {
        let p = plan(
            vec![tier_with_bonus(
                1,
                0,
                None,
                Some(1_000_000),
                Some(50_000),
            )],
            false,
        );
        let bonuses = evaluate_bonuses(&p, 1_500_000);

        assert_eq!(bonuses.len(), 1);
        assert!(bonuses[0].eligibility_met);
        assert_eq!(bonuses[0].amount_cents, 50_000);
        assert_eq!(total_bonuses(&bonuses).cents(), 50_000);
    }

    #[test]
    fn test_threshold_not_met_listed_at_zero() {
        let p = plan(
            vec![tier_with_bonus(
                1,
                0,
                None,
                Some(1_000_000),
                Some(50_000),
            )],
            false,
        );
        let bonuses = evaluate_bonuses(&p, 900_000);

        // Listed for transparency even though nothing was earned
        assert_eq!(bonuses.len(), 1);
        assert!(!bonuses[0].eligibility_met);
        assert_eq!(bonuses[0].amount_cents, 0);
        assert_eq!(total_bonuses(&bonuses).cents(), 0);
    }

    #[test]
    fn test_cumulative_bonuses() {
        let p = plan(
            vec![
                tier_with_bonus(1, 0, Some(1_000_000), Some(500_000), Some(25_000)),
                tier_with_bonus(2, 1_000_000, None, Some(1_000_000), Some(50_000)),
            ],
            false,
        );
        let bonuses = evaluate_bonuses(&p, 1_500_000);

        assert!(bonuses.iter().all(|b| b.eligibility_met));
        assert_eq!(total_bonuses(&bonuses).cents(), 75_000);
    }

    #[test]
    fn test_highest_bonus_only() {
        let p = plan(
            vec![
                tier_with_bonus(1, 0, Some(1_000_000), Some(500_000), Some(25_000)),
                tier_with_bonus(2, 1_000_000, None, Some(1_000_000), Some(50_000)),
            ],
            true,
        );
        let bonuses = evaluate_bonuses(&p, 1_500_000);

        // Both thresholds met, only the highest pays
        assert!(bonuses[0].eligibility_met);
        assert_eq!(bonuses[0].amount_cents, 0);
        assert!(bonuses[1].eligibility_met);
        assert_eq!(bonuses[1].amount_cents, 50_000);
        assert_eq!(total_bonuses(&bonuses).cents(), 50_000);
    }

    #[test]
    fn test_tiers_without_bonuses_not_listed() {
        let p = plan(vec![tier_with_bonus(1, 0, None, None, None)], false);
        assert!(evaluate_bonuses(&p, 5_000_000).is_empty());
    }
}
