//! # Tiered Rate Resolver
//!
//! Maps a period's sales metrics onto the applicable tier and produces the
//! gross-commission breakdown.
//!
//! ## Flat-Tier Method
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Tiers: [0 – $10,000) → 5%    [$10,000 – ∞) → 7%                        │
//! │                                                                         │
//! │  Sales: $12,000                                                         │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  resolve_tier → tier 2 (7%)                                            │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  FLAT method: $12,000 × 7% = $840.00                                   │
//! │  (NOT marginal: not $10,000 × 5% + $2,000 × 7%)                        │
//! │                                                                         │
//! │  The whole amount earns the matched tier's rate. Deterministic and     │
//! │  simple to audit against a statement.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Per-Category Resolution
//! The tier is resolved ONCE from the period's total sales. Each category in
//! the breakdown then earns either its explicit plan override rate or the
//! resolved tier rate, applied to that category's amount. The details sum to
//! the gross commission.

use crate::money::Money;
use crate::types::{CommissionDetail, CommissionPlan, SalesMetrics, Tier};

/// Category label used when the metrics provider reports only a total.
pub const TOTAL_CATEGORY: &str = "total";

/// Finds the single tier whose `[minimum, maximum)` bracket contains the
/// sales amount.
///
/// A stored plan's tiers partition `[0, ∞)` (validated at save time), so a
/// non-negative amount always matches exactly one tier; the unbounded top
/// tier absorbs any amount above the highest finite boundary. Negative
/// totals (a period that nets to returns) clamp to the first tier.
pub fn resolve_tier(tiers: &[Tier], sales_cents: i64) -> &Tier {
    let clamped = sales_cents.max(0);
    tiers
        .iter()
        .find(|t| t.contains(clamped))
        .unwrap_or_else(|| {
            // Unreachable for a validated plan; fall back to the top tier
            // rather than panicking inside a batch.
            tiers.last().expect("plan has at least one tier")
        })
}

/// Produces the ordered gross-commission breakdown for one calculation.
///
/// ## Determinism
/// Details preserve the breakdown's input order (total row when no
/// breakdown exists), and all arithmetic is integer math. Recomputing with
/// unchanged inputs yields byte-identical details.
pub fn resolve_details(plan: &CommissionPlan, metrics: &SalesMetrics) -> Vec<CommissionDetail> {
    let tier = resolve_tier(&plan.tiers, metrics.total_sales_cents);
    let tier_rate = tier.rate();

    if metrics.category_breakdown.is_empty() {
        let amount = metrics.total_sales().apply_rate(tier_rate);
        return vec![CommissionDetail {
            category: TOTAL_CATEGORY.to_string(),
            sales_amount_cents: metrics.total_sales_cents,
            rate_bps: tier_rate.bps(),
            amount_cents: amount.cents(),
        }];
    }

    metrics
        .category_breakdown
        .iter()
        .map(|cat| {
            // Explicit category override beats the tier rate
            let rate = plan.category_rate(&cat.category).unwrap_or(tier_rate);
            let amount = Money::from_cents(cat.sales_cents).apply_rate(rate);
            CommissionDetail {
                category: cat.category.clone(),
                sales_amount_cents: cat.sales_cents,
                rate_bps: rate.bps(),
                amount_cents: amount.cents(),
            }
        })
        .collect()
}

/// Sums a detail breakdown into the gross commission.
pub fn gross_commission(details: &[CommissionDetail]) -> Money {
    details.iter().map(CommissionDetail::amount).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    use crate::types::{CategoryRate, CategorySales, PaymentRules, PlanType};

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

    fn rep_plan() -> CommissionPlan {
        CommissionPlan {
            id: "v1".into(),
            plan_id: "p1".into(),
            version: 1,
            name: "Rep Plan".into(),
            plan_type: PlanType::SalesRep,
            tiers: vec![
                tier(1, 0, Some(1_000_000), 500),
                tier(2, 1_000_000, None, 700),
            ],
            payment_rules: PaymentRules::default(),
            category_rates: vec![],
            highest_bonus_only: false,
            effective_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn metrics(total: i64, breakdown: Vec<CategorySales>) -> SalesMetrics {
        SalesMetrics {
            total_sales_cents: total,
            quota_achievement_bps: 10_000,
            category_breakdown: breakdown,
        }
    }

    #[test]
    fn test_resolve_tier_boundaries() {
        let plan = rep_plan();
        assert_eq!(resolve_tier(&plan.tiers, 0).level, 1);
        assert_eq!(resolve_tier(&plan.tiers, 999_999).level, 1);
        // The boundary belongs to the upper tier
        assert_eq!(resolve_tier(&plan.tiers, 1_000_000).level, 2);
        assert_eq!(resolve_tier(&plan.tiers, i64::MAX).level, 2);
    }

    #[test]
    fn test_negative_total_clamps_to_first_tier() {
        let plan = rep_plan();
        assert_eq!(resolve_tier(&plan.tiers, -50_000).level, 1);
    }

    /// Scenario A: tiers [0–10,000 → 5%], [10,000–∞ → 7%]; sales $12,000
    /// ⇒ gross commission $840 (flat-tier: $12,000 × 7%).
    #[test]
    fn test_flat_tier_whole_amount() {
        let plan = rep_plan();
        let details = resolve_details(&plan, &metrics(1_200_000, vec![]));

        assert_eq!(details.len(), 1);
        assert_eq!(details[0].category, TOTAL_CATEGORY);
        assert_eq!(details[0].rate_bps, 700);
        assert_eq!(details[0].amount_cents, 84_000);
        assert_eq!(gross_commission(&details).cents(), 84_000);
    }

    #[test]
    fn test_category_override_beats_tier_rate() {
        let mut plan = rep_plan();
        plan.category_rates = vec![CategoryRate {
            category: "parts".into(),
            rate_bps: 300,
        }];

        let m = metrics(
            1_200_000,
            vec![
                CategorySales {
                    category: "equipment".into(),
                    sales_cents: 1_000_000,
                },
                CategorySales {
                    category: "parts".into(),
                    sales_cents: 200_000,
                },
            ],
        );
        let details = resolve_details(&plan, &m);

        // Tier resolved once from the total ($12,000 → 7%)
        assert_eq!(details[0].category, "equipment");
        assert_eq!(details[0].rate_bps, 700);
        assert_eq!(details[0].amount_cents, 70_000);

        // parts carries its override rate
        assert_eq!(details[1].category, "parts");
        assert_eq!(details[1].rate_bps, 300);
        assert_eq!(details[1].amount_cents, 6_000);

        assert_eq!(gross_commission(&details).cents(), 76_000);
    }

    #[test]
    fn test_deterministic_recompute() {
        let plan = rep_plan();
        let m = metrics(
            987_654,
            vec![CategorySales {
                category: "service".into(),
                sales_cents: 987_654,
            }],
        );

        let first = resolve_details(&plan, &m);
        let second = resolve_details(&plan, &m);
        assert_eq!(first, second);
    }
}
