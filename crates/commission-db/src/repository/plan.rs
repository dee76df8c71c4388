//! # Plan Repository
//!
//! Persistence for versioned commission plans and employee assignments.
//!
//! ## Versioning Model
//! ```text
//! commission_plans: one row per plan VERSION
//!
//!   plan_id = "plan-a"                         plan_assignments
//!   ┌──────────────────────────────┐           ┌──────────────────────┐
//!   │ v1  effective 2026-01-01     │           │ emp-1 ──► "plan-a"   │
//!   │ v2  effective 2026-04-01     │  ◄────────│ emp-2 ──► "plan-a"   │
//!   │ v3  effective 2026-07-01     │           └──────────────────────┘
//!   └──────────────────────────────┘
//!
//!   applicable(plan_id, as_of = 2026-05-15) ──► v2
//!   (latest version with effective_date <= as_of)
//! ```
//!
//! Editing a plan never mutates a row: a new row with version + 1 is
//! inserted, so calculations that pinned an older version stay reproducible.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use commission_core::{
    CategoryRate, CommissionPlan, PaymentRules, PlanType, Tier, DEFAULT_TENANT_ID,
};

use crate::error::{DbError, DbResult};

// =============================================================================
// Row Types
// =============================================================================

/// Raw database row; JSON document columns are decoded in `into_plan`.
#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: String,
    plan_id: String,
    version: i64,
    name: String,
    plan_type: PlanType,
    tiers: String,
    payment_rules: String,
    category_rates: String,
    highest_bonus_only: bool,
    effective_date: NaiveDate,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl PlanRow {
    fn into_plan(self) -> DbResult<CommissionPlan> {
        let tiers: Vec<Tier> = serde_json::from_str(&self.tiers)?;
        let payment_rules: PaymentRules = serde_json::from_str(&self.payment_rules)?;
        let category_rates: Vec<CategoryRate> = serde_json::from_str(&self.category_rates)?;

        Ok(CommissionPlan {
            id: self.id,
            plan_id: self.plan_id,
            version: self.version,
            name: self.name,
            plan_type: self.plan_type,
            tiers,
            payment_rules,
            category_rates,
            highest_bonus_only: self.highest_bonus_only,
            effective_date: self.effective_date,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

/// An employee-to-plan assignment row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlanAssignment {
    pub employee_id: String,
    pub plan_id: String,
    pub assigned_at: DateTime<Utc>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for commission plan operations.
#[derive(Debug, Clone)]
pub struct PlanRepository {
    pool: SqlitePool,
}

impl PlanRepository {
    /// Creates a new plan repository.
    pub fn new(pool: SqlitePool) -> Self {
        PlanRepository { pool }
    }

    /// Inserts a plan version.
    ///
    /// The caller assigns `version`; (plan_id, version) is unique, so a
    /// concurrent insert of the same version surfaces as
    /// [`DbError::UniqueViolation`].
    pub async fn insert_version(&self, plan: &CommissionPlan) -> DbResult<()> {
        let tiers = serde_json::to_string(&plan.tiers)?;
        let payment_rules = serde_json::to_string(&plan.payment_rules)?;
        let category_rates = serde_json::to_string(&plan.category_rates)?;

        sqlx::query(
            r#"
            INSERT INTO commission_plans
                (id, tenant_id, plan_id, version, name, plan_type,
                 tiers, payment_rules, category_rates, highest_bonus_only,
                 effective_date, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&plan.id)
        .bind(DEFAULT_TENANT_ID)
        .bind(&plan.plan_id)
        .bind(plan.version)
        .bind(&plan.name)
        .bind(plan.plan_type)
        .bind(&tiers)
        .bind(&payment_rules)
        .bind(&category_rates)
        .bind(plan.highest_bonus_only)
        .bind(plan.effective_date)
        .bind(plan.is_active)
        .bind(plan.created_at)
        .execute(&self.pool)
        .await?;

        debug!(plan_id = %plan.plan_id, version = plan.version, "Inserted plan version");
        Ok(())
    }

    /// Returns the next version number for a plan (1 for a new plan).
    pub async fn next_version(&self, plan_id: &str) -> DbResult<i64> {
        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(version) FROM commission_plans WHERE plan_id = ?",
        )
        .bind(plan_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(max.unwrap_or(0) + 1)
    }

    /// Fetches a specific plan version. Used when recomputing a pinned
    /// calculation.
    pub async fn get_version(&self, plan_id: &str, version: i64) -> DbResult<CommissionPlan> {
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, plan_id, version, name, plan_type,
                   tiers, payment_rules, category_rates, highest_bonus_only,
                   effective_date, is_active, created_at
            FROM commission_plans
            WHERE plan_id = ? AND version = ?
            "#,
        )
        .bind(plan_id)
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| DbError::not_found("CommissionPlan", plan_id))?
            .into_plan()
    }

    /// Fetches the applicable version of a plan: the latest active version
    /// whose effective_date is on or before `as_of`.
    pub async fn applicable_version(
        &self,
        plan_id: &str,
        as_of: NaiveDate,
    ) -> DbResult<Option<CommissionPlan>> {
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, plan_id, version, name, plan_type,
                   tiers, payment_rules, category_rates, highest_bonus_only,
                   effective_date, is_active, created_at
            FROM commission_plans
            WHERE plan_id = ? AND is_active = 1 AND effective_date <= ?
            ORDER BY effective_date DESC, version DESC
            LIMIT 1
            "#,
        )
        .bind(plan_id)
        .bind(as_of)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PlanRow::into_plan).transpose()
    }

    /// Fetches the applicable plan for an employee via their assignment.
    ///
    /// Returns `None` when the employee has no assignment, or when the
    /// assigned plan has no version effective by `as_of`.
    pub async fn applicable_for_employee(
        &self,
        employee_id: &str,
        as_of: NaiveDate,
    ) -> DbResult<Option<CommissionPlan>> {
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.plan_id, p.version, p.name, p.plan_type,
                   p.tiers, p.payment_rules, p.category_rates, p.highest_bonus_only,
                   p.effective_date, p.is_active, p.created_at
            FROM plan_assignments a
            JOIN commission_plans p ON p.plan_id = a.plan_id
            WHERE a.employee_id = ? AND p.is_active = 1 AND p.effective_date <= ?
            ORDER BY p.effective_date DESC, p.version DESC
            LIMIT 1
            "#,
        )
        .bind(employee_id)
        .bind(as_of)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PlanRow::into_plan).transpose()
    }

    /// Lists the latest version of every plan, newest plans first.
    pub async fn list_latest(&self) -> DbResult<Vec<CommissionPlan>> {
        let rows: Vec<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, plan_id, version, name, plan_type,
                   tiers, payment_rules, category_rates, highest_bonus_only,
                   effective_date, is_active, created_at
            FROM commission_plans
            WHERE version = (
                SELECT MAX(version) FROM commission_plans inner_p
                WHERE inner_p.plan_id = commission_plans.plan_id
            )
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PlanRow::into_plan).collect()
    }

    /// Lists every version of a plan, oldest first.
    pub async fn list_versions(&self, plan_id: &str) -> DbResult<Vec<CommissionPlan>> {
        let rows: Vec<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, plan_id, version, name, plan_type,
                   tiers, payment_rules, category_rates, highest_bonus_only,
                   effective_date, is_active, created_at
            FROM commission_plans
            WHERE plan_id = ?
            ORDER BY version ASC
            "#,
        )
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PlanRow::into_plan).collect()
    }

    /// Assigns an employee to a plan (upsert on re-assignment).
    pub async fn assign_employee(&self, employee_id: &str, plan_id: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO plan_assignments (employee_id, plan_id, assigned_at)
            VALUES (?, ?, ?)
            ON CONFLICT (employee_id, plan_id) DO UPDATE SET assigned_at = excluded.assigned_at
            "#,
        )
        .bind(employee_id)
        .bind(plan_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(%employee_id, %plan_id, "Assigned employee to plan");
        Ok(())
    }

    /// Lists the employees assigned to a plan.
    pub async fn assignments_for_plan(&self, plan_id: &str) -> DbResult<Vec<PlanAssignment>> {
        let rows: Vec<PlanAssignment> = sqlx::query_as(
            r#"
            SELECT employee_id, plan_id, assigned_at
            FROM plan_assignments
            WHERE plan_id = ?
            ORDER BY employee_id ASC
            "#,
        )
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
