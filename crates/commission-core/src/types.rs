//! # Domain Types
//!
//! Core domain types for the commission calculation engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────┐   ┌─────────────────┐  │
//! │  │ CommissionPlan  │   │CommissionCalculation │   │    Dispute      │  │
//! │  │  ─────────────  │   │  ──────────────────  │   │  ─────────────  │  │
//! │  │  plan_id        │   │  id (UUID)           │   │  id (UUID)      │  │
//! │  │  version        │◄──│  plan_id + version   │◄──│  calculation_id │  │
//! │  │  tiers[]        │   │  metrics snapshot    │   │  status         │  │
//! │  │  payment_rules  │   │  details / bonuses   │   │  version (OCC)  │  │
//! │  └─────────────────┘   │  adjustments[]       │   └─────────────────┘  │
//! │                        └──────────────────────┘                        │
//! │                                                                         │
//! │  CalculationStatus: Pending → Calculated → Paid (immutable)            │
//! │  DisputeStatus:     Open → UnderReview → Resolved (terminal)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A calculation embeds an immutable copy of the metrics and pins the plan
//! version it read at start. Plan edits create new versions; they never
//! change an already-started calculation's outcome.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Commission Rate
// =============================================================================

/// Commission rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 700 bps = 7.00% (a typical top-tier sales rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommissionRate(u32);

impl CommissionRate {
    /// Creates a commission rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        CommissionRate(bps)
    }

    /// Creates a commission rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        CommissionRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        CommissionRate(0)
    }
}

impl Default for CommissionRate {
    fn default() -> Self {
        CommissionRate::zero()
    }
}

// =============================================================================
// Plan Type
// =============================================================================

/// The role segment a commission plan applies to.
///
/// Represented as a tagged variant sharing a common tier/rule shape, not as
/// a loosely-typed dictionary. This keeps the rate resolver total and
/// exhaustive over plan kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// Equipment sales representative.
    SalesRep,
    /// Sales manager (team-level plans).
    SalesManager,
    /// Service technician (parts and labor commissions).
    ServiceTech,
}

// =============================================================================
// Tier
// =============================================================================

/// A sales-amount bracket within a plan.
///
/// Tiers form a non-overlapping partition of `[0, ∞)`: sorted ascending by
/// `minimum_sales_cents`, contiguous, with exactly one open-ended top tier
/// (`maximum_sales_cents = None`). That invariant is enforced at plan-save
/// time by [`crate::validation::validate_plan`], never at calculation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tier {
    /// Tier level, 1-based, ascending with the sales brackets.
    pub level: i32,

    /// Display name ("Base", "Accelerator", ...).
    pub name: String,

    /// Inclusive lower bound of the bracket.
    pub minimum_sales_cents: i64,

    /// Exclusive upper bound. `None` = unbounded top tier.
    pub maximum_sales_cents: Option<i64>,

    /// Rate applied to the ENTIRE sales amount when this tier matches
    /// (flat-tier method, not marginal brackets).
    pub commission_rate_bps: u32,

    /// Sales level that unlocks the tier bonus, if any.
    pub bonus_threshold_cents: Option<i64>,

    /// Fixed bonus paid when the threshold is met.
    pub bonus_amount_cents: Option<i64>,
}

impl Tier {
    /// Checks whether a sales amount falls inside this tier's
    /// `[minimum, maximum)` bracket.
    pub fn contains(&self, sales_cents: i64) -> bool {
        if sales_cents < self.minimum_sales_cents {
            return false;
        }
        match self.maximum_sales_cents {
            Some(max) => sales_cents < max,
            None => true,
        }
    }

    /// Returns the tier's commission rate.
    #[inline]
    pub fn rate(&self) -> CommissionRate {
        CommissionRate::from_bps(self.commission_rate_bps)
    }

    /// True for the unbounded top tier.
    #[inline]
    pub fn is_open_ended(&self) -> bool {
        self.maximum_sales_cents.is_none()
    }
}

// =============================================================================
// Payment Rules
// =============================================================================

/// How often commissions are paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    Monthly,
    Quarterly,
}

impl Default for PaymentFrequency {
    fn default() -> Self {
        PaymentFrequency::Monthly
    }
}

/// Payout rules attached to a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRules {
    pub payment_frequency: PaymentFrequency,

    /// Days from period end to payout date.
    pub payment_delay_days: i64,

    /// Whether a sale's commission may be split between employees.
    pub split_commission_allowed: bool,

    /// Whether reversed sales may claw back paid commission.
    pub chargeback_enabled: bool,

    /// Days after payout during which a chargeback may be filed.
    pub chargeback_period_days: i64,

    /// Net amounts below this are held until the next period.
    pub minimum_commission_payment_cents: i64,
}

impl Default for PaymentRules {
    fn default() -> Self {
        PaymentRules {
            payment_frequency: PaymentFrequency::Monthly,
            payment_delay_days: 15,
            split_commission_allowed: false,
            chargeback_enabled: true,
            chargeback_period_days: 90,
            minimum_commission_payment_cents: 0,
        }
    }
}

// =============================================================================
// Category Rate
// =============================================================================

/// Per-product-category rate override ("parts" vs "service" vs "equipment").
///
/// Categories without an override fall back to the resolved tier rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryRate {
    pub category: String,
    pub rate_bps: u32,
}

// =============================================================================
// Commission Plan
// =============================================================================

/// A versioned commission plan definition.
///
/// ## Versioning
/// `plan_id` is the stable business identifier; every edit inserts a new
/// row with an incremented `version` and its own `effective_date`. In-flight
/// calculations pin `(plan_id, version)` at snapshot time, so a mid-batch
/// plan edit never changes a running calculation's outcome.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommissionPlan {
    /// Unique identifier of this plan VERSION (UUID v4).
    pub id: String,

    /// Stable business identifier shared by all versions of the plan.
    pub plan_id: String,

    /// Monotonically increasing version number, starting at 1.
    pub version: i64,

    /// Display name shown on statements and dashboards.
    pub name: String,

    /// Role segment this plan applies to.
    pub plan_type: PlanType,

    /// Ordered tier list (ascending, validated partition of [0, ∞)).
    pub tiers: Vec<Tier>,

    /// Payout rules.
    pub payment_rules: PaymentRules,

    /// Per-category rate overrides.
    pub category_rates: Vec<CategoryRate>,

    /// When true only the highest bonus threshold met pays out;
    /// otherwise tier bonuses are cumulative.
    pub highest_bonus_only: bool,

    /// First date this version applies.
    #[ts(as = "String")]
    pub effective_date: NaiveDate,

    /// Whether the plan is active (soft delete).
    pub is_active: bool,

    /// When this version was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CommissionPlan {
    /// Looks up a category rate override.
    pub fn category_rate(&self, category: &str) -> Option<CommissionRate> {
        self.category_rates
            .iter()
            .find(|r| r.category == category)
            .map(|r| CommissionRate::from_bps(r.rate_bps))
    }
}

// =============================================================================
// Sales Metrics
// =============================================================================

/// Per-category sales totals within a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategorySales {
    pub category: String,
    pub sales_cents: i64,
}

/// Per-employee, per-period sales totals supplied by the metrics provider.
///
/// ## Snapshot Pattern
/// An immutable copy is embedded in the calculation at snapshot time. The
/// stored calculation remains auditable even if the upstream metrics
/// pipeline restates history later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesMetrics {
    pub total_sales_cents: i64,

    /// Quota achievement in basis points (10000 = 100% of quota).
    pub quota_achievement_bps: u32,

    /// Breakdown by product category. May be empty when the provider only
    /// reports a total.
    pub category_breakdown: Vec<CategorySales>,
}

impl SalesMetrics {
    /// Returns the total sales as Money.
    #[inline]
    pub fn total_sales(&self) -> Money {
        Money::from_cents(self.total_sales_cents)
    }
}

// =============================================================================
// Calculation Period
// =============================================================================

/// The bounded date range over which sales metrics are aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CalculationPeriod {
    #[ts(as = "String")]
    pub start: NaiveDate,

    #[ts(as = "String")]
    pub end: NaiveDate,

    /// Display name ("2026-07", "Q2 2026", ...).
    pub name: String,
}

impl CalculationPeriod {
    /// Computes the payout date: period end plus the plan's payment delay.
    pub fn payout_date(&self, payment_delay_days: i64) -> NaiveDate {
        self.end + Duration::days(payment_delay_days)
    }
}

// =============================================================================
// Commission Detail
// =============================================================================

/// One line of the gross-commission breakdown: a category, the sales amount
/// attributed to it, and the rate that was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommissionDetail {
    pub category: String,
    pub sales_amount_cents: i64,
    pub rate_bps: u32,
    pub amount_cents: i64,
}

impl CommissionDetail {
    /// Returns the commission amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Bonus
// =============================================================================

/// A tier-linked bonus, listed whether or not it was earned.
///
/// Unearned bonuses appear with `eligibility_met = false` and amount 0 so
/// the statement shows the employee what they were measured against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Bonus {
    /// Level of the tier carrying the threshold.
    pub tier_level: i32,

    pub threshold_cents: i64,

    /// Amount actually paid: the tier's bonus amount when counted, 0 when
    /// not earned or suppressed by `highest_bonus_only`.
    pub amount_cents: i64,

    pub eligibility_met: bool,
}

// =============================================================================
// Adjustment
// =============================================================================

/// What kind of ledger entry this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// Manual correction entered by an administrator.
    Manual,
    /// System-generated reversal of paid commission.
    Chargeback,
    /// Correction created by resolving a dispute as `Adjusted`.
    DisputeResolution,
}

/// An append-only ledger entry against a calculation.
///
/// Ledger entries are never edited or deleted, only appended. They are the
/// ONLY permitted way to alter a calculation's net result after it reaches
/// `Calculated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Adjustment {
    pub id: String,
    pub calculation_id: String,
    pub kind: AdjustmentKind,

    /// Signed amount in cents; chargebacks are negative.
    pub amount_cents: i64,

    pub reason: String,
    pub applied_by: String,

    #[ts(as = "String")]
    pub applied_at: DateTime<Utc>,

    /// Set when the entry was created by a dispute resolution.
    pub dispute_id: Option<String>,
}

impl Adjustment {
    /// Returns the signed adjustment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Calculation Status
// =============================================================================

/// Lifecycle of a commission calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStatus {
    /// Created but not yet computed.
    Pending,
    /// Computed and awaiting payout.
    Calculated,
    /// Funds disbursed. The record is immutable from here on; corrections
    /// go through the adjustment ledger or a dispute.
    Paid,
    /// Computation failed (metrics unavailable, no plan, ...). The reason
    /// is recorded, never silently treated as zero sales.
    Failed,
    /// Forked into a dispute from Calculated/Paid.
    Disputed,
}

impl Default for CalculationStatus {
    fn default() -> Self {
        CalculationStatus::Pending
    }
}

// =============================================================================
// Commission Calculation
// =============================================================================

/// The authoritative, auditable record of one employee's commission for one
/// period under one pinned plan version.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommissionCalculation {
    pub id: String,
    pub employee_id: String,

    /// Pinned plan identity (snapshot isolation, see [`CommissionPlan`]).
    pub plan_id: String,
    pub plan_version: i64,

    pub period: CalculationPeriod,

    /// Immutable metrics snapshot taken at calculation time.
    pub metrics: SalesMetrics,

    /// Ordered gross-commission breakdown, one row per category.
    pub details: Vec<CommissionDetail>,

    /// All tier-linked bonuses, earned or not.
    pub bonuses: Vec<Bonus>,

    /// Append-only ledger entries, oldest first.
    pub adjustments: Vec<Adjustment>,

    /// Sum of detail amounts.
    pub gross_commission_cents: i64,

    /// Sum of earned bonus amounts.
    pub total_bonuses_cents: i64,

    pub status: CalculationStatus,

    /// Populated when status is Failed.
    pub failure_reason: Option<String>,

    /// Period end + payment delay. None until computed.
    #[ts(as = "Option<String>")]
    pub payout_date: Option<NaiveDate>,

    /// When the payout executor marked the record paid.
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub calculated_at: DateTime<Utc>,

    /// Who (or what batch job) produced this record.
    pub calculated_by: String,
}

impl CommissionCalculation {
    /// Gross tiered commission.
    #[inline]
    pub fn gross_commission(&self) -> Money {
        Money::from_cents(self.gross_commission_cents)
    }

    /// Total earned bonuses.
    #[inline]
    pub fn total_bonuses(&self) -> Money {
        Money::from_cents(self.total_bonuses_cents)
    }

    /// Sum of all ledger adjustments (signed).
    pub fn total_adjustments(&self) -> Money {
        self.adjustments.iter().map(Adjustment::amount).sum()
    }

    /// The authoritative payable amount.
    ///
    /// ## Invariant
    /// `net = gross + bonuses + adjustments`, ALWAYS recomputed from its
    /// components. It is never stored independently, so the reported net for
    /// a paid record reflects later ledger entries while the historical
    /// fields stay untouched.
    pub fn net_commission(&self) -> Money {
        self.gross_commission() + self.total_bonuses() + self.total_adjustments()
    }

    /// Whether the computed fields are frozen.
    ///
    /// A paid record's historical fields are never mutated; corrections are
    /// expressed only as new ledger entries.
    #[inline]
    pub fn is_immutable(&self) -> bool {
        self.status == CalculationStatus::Paid
    }
}

// =============================================================================
// Dispute
// =============================================================================

/// Dispute lifecycle: `Open → UnderReview → Resolved` (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Open,
    UnderReview,
    Resolved,
}

/// How a dispute was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DisputeOutcome {
    /// Original calculation stands; no change.
    Upheld,
    /// A ledger entry referencing the dispute corrects the net amount.
    Adjusted,
}

/// A formal contest of a calculated or paid amount.
///
/// ## Optimistic Versioning
/// Disputes are the one component requiring single-writer discipline. Every
/// update carries the `version` the caller read; a stale write fails with
/// `DisputeVersionConflict` instead of silently overwriting.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Dispute {
    pub id: String,
    pub calculation_id: String,

    /// The amount the statement showed.
    pub disputed_amount_cents: i64,

    /// The amount the employee believes is correct.
    pub expected_amount_cents: i64,

    /// `disputed - expected`, captured at filing time.
    pub difference_cents: i64,

    pub status: DisputeStatus,

    /// Reviewer; required before the dispute can enter UnderReview.
    pub assigned_to: Option<String>,

    pub notes: Option<String>,

    pub outcome: Option<DisputeOutcome>,

    #[ts(as = "Option<String>")]
    pub resolved_at: Option<DateTime<Utc>>,

    /// Optimistic concurrency version, incremented on every write.
    pub version: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_rate_from_bps() {
        let rate = CommissionRate::from_bps(700);
        assert_eq!(rate.bps(), 700);
        assert!((rate.percentage() - 7.0).abs() < 0.001);
    }

    #[test]
    fn test_rate_from_percentage() {
        let rate = CommissionRate::from_percentage(8.25);
        assert_eq!(rate.bps(), 825);
    }

    #[test]
    fn test_tier_contains_half_open() {
        let t = tier(1, 0, Some(1_000_000), 500);
        assert!(t.contains(0));
        assert!(t.contains(999_999));
        // Upper bound is exclusive: the boundary belongs to the next tier
        assert!(!t.contains(1_000_000));
    }

    #[test]
    fn test_open_ended_tier_absorbs_everything_above() {
        let t = tier(2, 1_000_000, None, 700);
        assert!(t.is_open_ended());
        assert!(t.contains(1_000_000));
        assert!(t.contains(i64::MAX));
        assert!(!t.contains(999_999));
    }

    #[test]
    fn test_payout_date() {
        let period = CalculationPeriod {
            start: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(),
            name: "2026-07".to_string(),
        };
        assert_eq!(
            period.payout_date(15),
            NaiveDate::from_ymd_opt(2026, 8, 15).unwrap()
        );
    }

    #[test]
    fn test_net_commission_is_derived() {
        let calc = CommissionCalculation {
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
                total_sales_cents: 1_200_000,
                quota_achievement_bps: 10_000,
                category_breakdown: vec![],
            },
            details: vec![],
            bonuses: vec![],
            adjustments: vec![Adjustment {
                id: "a1".into(),
                calculation_id: "c1".into(),
                kind: AdjustmentKind::Chargeback,
                amount_cents: -100_000,
                reason: "sale reversed".into(),
                applied_by: "system".into(),
                applied_at: Utc::now(),
                dispute_id: None,
            }],
            gross_commission_cents: 84_000,
            total_bonuses_cents: 50_000,
            status: CalculationStatus::Paid,
            failure_reason: None,
            payout_date: None,
            paid_at: Some(Utc::now()),
            calculated_at: Utc::now(),
            calculated_by: "batch".into(),
        };

        // net = gross + bonuses + adjustments, recomputed on every read
        assert_eq!(calc.net_commission().cents(), 84_000 + 50_000 - 100_000);
        assert!(calc.is_immutable());
    }

    #[test]
    fn test_category_rate_lookup() {
        let plan = CommissionPlan {
            id: "v1".into(),
            plan_id: "p1".into(),
            version: 1,
            name: "Rep Plan".into(),
            plan_type: PlanType::SalesRep,
            tiers: vec![tier(1, 0, None, 500)],
            payment_rules: PaymentRules::default(),
            category_rates: vec![CategoryRate {
                category: "parts".into(),
                rate_bps: 300,
            }],
            highest_bonus_only: false,
            effective_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            is_active: true,
            created_at: Utc::now(),
        };

        assert_eq!(plan.category_rate("parts").unwrap().bps(), 300);
        assert!(plan.category_rate("service").is_none());
    }
}
