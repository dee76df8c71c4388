//! # Calculation Repository
//!
//! Persistence for commission calculations and their adjustment ledger.
//!
//! ## Storage Model
//! ```text
//! commission_calculations          commission_adjustments (APPEND-ONLY)
//! ┌──────────────────────┐         ┌────────────────────────────┐
//! │ id (snapshot)        │◄────────│ calculation_id             │
//! │ metrics (JSON)       │         │ kind   manual | chargeback │
//! │ details (JSON)       │         │        | dispute_resolution│
//! │ bonuses (JSON)       │         │ amount_cents (signed)      │
//! │ gross, bonuses totals│         │ applied_at, applied_by     │
//! │ status, payout dates │         └────────────────────────────┘
//! └──────────────────────┘
//! ```
//!
//! Two invariants this module upholds:
//! - `save` never replaces the row (which would cascade the ledger away);
//!   a recompute is an UPDATE in place that preserves id and adjustments.
//! - Ledger rows are never updated or deleted here; database triggers
//!   reject any such statement as a backstop.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use commission_core::{
    Adjustment, AdjustmentKind, Bonus, CalculationPeriod, CalculationStatus,
    CommissionCalculation, CommissionDetail, SalesMetrics, DEFAULT_TENANT_ID,
};

use crate::error::{DbError, DbResult};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CalculationRow {
    id: String,
    employee_id: String,
    plan_id: String,
    plan_version: i64,
    period_start: NaiveDate,
    period_end: NaiveDate,
    period_name: String,
    metrics: String,
    details: String,
    bonuses: String,
    gross_commission_cents: i64,
    total_bonuses_cents: i64,
    status: CalculationStatus,
    failure_reason: Option<String>,
    payout_date: Option<NaiveDate>,
    paid_at: Option<DateTime<Utc>>,
    calculated_at: DateTime<Utc>,
    calculated_by: String,
}

impl CalculationRow {
    fn into_calculation(self, adjustments: Vec<Adjustment>) -> DbResult<CommissionCalculation> {
        let metrics: SalesMetrics = serde_json::from_str(&self.metrics)?;
        let details: Vec<CommissionDetail> = serde_json::from_str(&self.details)?;
        let bonuses: Vec<Bonus> = serde_json::from_str(&self.bonuses)?;

        Ok(CommissionCalculation {
            id: self.id,
            employee_id: self.employee_id,
            plan_id: self.plan_id,
            plan_version: self.plan_version,
            period: CalculationPeriod {
                start: self.period_start,
                end: self.period_end,
                name: self.period_name,
            },
            metrics,
            details,
            bonuses,
            adjustments,
            gross_commission_cents: self.gross_commission_cents,
            total_bonuses_cents: self.total_bonuses_cents,
            status: self.status,
            failure_reason: self.failure_reason,
            payout_date: self.payout_date,
            paid_at: self.paid_at,
            calculated_at: self.calculated_at,
            calculated_by: self.calculated_by,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AdjustmentRow {
    id: String,
    calculation_id: String,
    kind: AdjustmentKind,
    amount_cents: i64,
    reason: String,
    applied_by: String,
    applied_at: DateTime<Utc>,
    dispute_id: Option<String>,
}

impl From<AdjustmentRow> for Adjustment {
    fn from(row: AdjustmentRow) -> Self {
        Adjustment {
            id: row.id,
            calculation_id: row.calculation_id,
            kind: row.kind,
            amount_cents: row.amount_cents,
            reason: row.reason,
            applied_by: row.applied_by,
            applied_at: row.applied_at,
            dispute_id: row.dispute_id,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for commission calculation operations.
#[derive(Debug, Clone)]
pub struct CalculationRepository {
    pool: SqlitePool,
}

impl CalculationRepository {
    /// Creates a new calculation repository.
    pub fn new(pool: SqlitePool) -> Self {
        CalculationRepository { pool }
    }

    /// Saves a calculation snapshot.
    ///
    /// Tries an UPDATE by id first so a recompute replaces the snapshot IN
    /// PLACE, keeping the id stable and the ledger attached; falls back to
    /// INSERT for a new record. Never writes the ledger.
    pub async fn save(&self, calc: &CommissionCalculation) -> DbResult<()> {
        let metrics = serde_json::to_string(&calc.metrics)?;
        let details = serde_json::to_string(&calc.details)?;
        let bonuses = serde_json::to_string(&calc.bonuses)?;

        let updated = sqlx::query(
            r#"
            UPDATE commission_calculations SET
                plan_version = ?, metrics = ?, details = ?, bonuses = ?,
                gross_commission_cents = ?, total_bonuses_cents = ?,
                status = ?, failure_reason = ?, payout_date = ?, paid_at = ?,
                calculated_at = ?, calculated_by = ?
            WHERE id = ?
            "#,
        )
        .bind(calc.plan_version)
        .bind(&metrics)
        .bind(&details)
        .bind(&bonuses)
        .bind(calc.gross_commission_cents)
        .bind(calc.total_bonuses_cents)
        .bind(calc.status)
        .bind(&calc.failure_reason)
        .bind(calc.payout_date)
        .bind(calc.paid_at)
        .bind(calc.calculated_at)
        .bind(&calc.calculated_by)
        .bind(&calc.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated > 0 {
            debug!(id = %calc.id, "Updated calculation snapshot");
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO commission_calculations
                (id, tenant_id, employee_id, plan_id, plan_version,
                 period_start, period_end, period_name,
                 metrics, details, bonuses,
                 gross_commission_cents, total_bonuses_cents,
                 status, failure_reason, payout_date, paid_at,
                 calculated_at, calculated_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&calc.id)
        .bind(DEFAULT_TENANT_ID)
        .bind(&calc.employee_id)
        .bind(&calc.plan_id)
        .bind(calc.plan_version)
        .bind(calc.period.start)
        .bind(calc.period.end)
        .bind(&calc.period.name)
        .bind(&metrics)
        .bind(&details)
        .bind(&bonuses)
        .bind(calc.gross_commission_cents)
        .bind(calc.total_bonuses_cents)
        .bind(calc.status)
        .bind(&calc.failure_reason)
        .bind(calc.payout_date)
        .bind(calc.paid_at)
        .bind(calc.calculated_at)
        .bind(&calc.calculated_by)
        .execute(&self.pool)
        .await?;

        debug!(id = %calc.id, employee = %calc.employee_id, "Inserted calculation snapshot");
        Ok(())
    }

    /// Fetches a calculation with its full ledger.
    pub async fn get(&self, id: &str) -> DbResult<CommissionCalculation> {
        let row: Option<CalculationRow> = sqlx::query_as(
            r#"
            SELECT id, employee_id, plan_id, plan_version,
                   period_start, period_end, period_name,
                   metrics, details, bonuses,
                   gross_commission_cents, total_bonuses_cents,
                   status, failure_reason, payout_date, paid_at,
                   calculated_at, calculated_by
            FROM commission_calculations
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| DbError::not_found("CommissionCalculation", id))?;
        let adjustments = self.ledger(id).await?;
        row.into_calculation(adjustments)
    }

    /// Finds the live (non-disputed) calculation for an employee/plan/period,
    /// if one exists. Backed by a partial unique index, so at most one row
    /// can match.
    pub async fn find_live(
        &self,
        employee_id: &str,
        plan_id: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> DbResult<Option<CommissionCalculation>> {
        let row: Option<CalculationRow> = sqlx::query_as(
            r#"
            SELECT id, employee_id, plan_id, plan_version,
                   period_start, period_end, period_name,
                   metrics, details, bonuses,
                   gross_commission_cents, total_bonuses_cents,
                   status, failure_reason, payout_date, paid_at,
                   calculated_at, calculated_by
            FROM commission_calculations
            WHERE employee_id = ? AND plan_id = ?
              AND period_start = ? AND period_end = ?
              AND status != 'disputed'
            "#,
        )
        .bind(employee_id)
        .bind(plan_id)
        .bind(period_start)
        .bind(period_end)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let adjustments = self.ledger(&row.id).await?;
                Ok(Some(row.into_calculation(adjustments)?))
            }
            None => Ok(None),
        }
    }

    /// Lists calculations for an employee, most recent period first.
    pub async fn list_for_employee(
        &self,
        employee_id: &str,
        limit: i64,
    ) -> DbResult<Vec<CommissionCalculation>> {
        let rows: Vec<CalculationRow> = sqlx::query_as(
            r#"
            SELECT id, employee_id, plan_id, plan_version,
                   period_start, period_end, period_name,
                   metrics, details, bonuses,
                   gross_commission_cents, total_bonuses_cents,
                   status, failure_reason, payout_date, paid_at,
                   calculated_at, calculated_by
            FROM commission_calculations
            WHERE employee_id = ?
            ORDER BY period_start DESC, calculated_at DESC
            LIMIT ?
            "#,
        )
        .bind(employee_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut calcs = Vec::with_capacity(rows.len());
        for row in rows {
            let adjustments = self.ledger(&row.id).await?;
            calcs.push(row.into_calculation(adjustments)?);
        }
        Ok(calcs)
    }

    /// Lists calculations whose period falls entirely within the given
    /// date range, optionally filtered by status.
    pub async fn list_for_period(
        &self,
        period_start: NaiveDate,
        period_end: NaiveDate,
        status: Option<CalculationStatus>,
    ) -> DbResult<Vec<CommissionCalculation>> {
        let rows: Vec<CalculationRow> = match status {
            Some(status) => {
                sqlx::query_as(
                    r#"
                    SELECT id, employee_id, plan_id, plan_version,
                           period_start, period_end, period_name,
                           metrics, details, bonuses,
                           gross_commission_cents, total_bonuses_cents,
                           status, failure_reason, payout_date, paid_at,
                           calculated_at, calculated_by
                    FROM commission_calculations
                    WHERE period_start >= ? AND period_end <= ? AND status = ?
                    ORDER BY employee_id ASC, period_start ASC
                    "#,
                )
                .bind(period_start)
                .bind(period_end)
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT id, employee_id, plan_id, plan_version,
                           period_start, period_end, period_name,
                           metrics, details, bonuses,
                           gross_commission_cents, total_bonuses_cents,
                           status, failure_reason, payout_date, paid_at,
                           calculated_at, calculated_by
                    FROM commission_calculations
                    WHERE period_start >= ? AND period_end <= ?
                    ORDER BY employee_id ASC, period_start ASC
                    "#,
                )
                .bind(period_start)
                .bind(period_end)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut calcs = Vec::with_capacity(rows.len());
        for row in rows {
            let adjustments = self.ledger(&row.id).await?;
            calcs.push(row.into_calculation(adjustments)?);
        }
        Ok(calcs)
    }

    /// Appends an entry to the adjustment ledger.
    pub async fn append_adjustment(&self, adjustment: &Adjustment) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO commission_adjustments
                (id, calculation_id, kind, amount_cents, reason,
                 applied_by, applied_at, dispute_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&adjustment.id)
        .bind(&adjustment.calculation_id)
        .bind(adjustment.kind)
        .bind(adjustment.amount_cents)
        .bind(&adjustment.reason)
        .bind(&adjustment.applied_by)
        .bind(adjustment.applied_at)
        .bind(&adjustment.dispute_id)
        .execute(&self.pool)
        .await?;

        debug!(
            calculation = %adjustment.calculation_id,
            cents = adjustment.amount_cents,
            kind = ?adjustment.kind,
            "Appended ledger entry"
        );
        Ok(())
    }

    /// Loads the ledger for a calculation, oldest entry first.
    pub async fn ledger(&self, calculation_id: &str) -> DbResult<Vec<Adjustment>> {
        let rows: Vec<AdjustmentRow> = sqlx::query_as(
            r#"
            SELECT id, calculation_id, kind, amount_cents, reason,
                   applied_by, applied_at, dispute_id
            FROM commission_adjustments
            WHERE calculation_id = ?
            ORDER BY applied_at ASC, id ASC
            "#,
        )
        .bind(calculation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Adjustment::from).collect())
    }

    /// Transitions a calculation to Paid, recording the payment time.
    ///
    /// Guarded in SQL: only a Calculated record can become Paid, so a
    /// double-fire from the payout executor is a no-op error rather than
    /// a silent overwrite of `paid_at`.
    pub async fn mark_paid(&self, id: &str, paid_at: DateTime<Utc>) -> DbResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE commission_calculations
            SET status = 'paid', paid_at = ?
            WHERE id = ? AND status = 'calculated'
            "#,
        )
        .bind(paid_at)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            warn!(%id, "mark_paid matched no calculated record");
            return Err(DbError::not_found("CommissionCalculation (calculated)", id));
        }
        Ok(())
    }

    /// Sets the status column without touching the snapshot.
    pub async fn set_status(&self, id: &str, status: CalculationStatus) -> DbResult<()> {
        let updated = sqlx::query("UPDATE commission_calculations SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(DbError::not_found("CommissionCalculation", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use commission_core::CategorySales;

    fn sample_calculation(employee_id: &str) -> CommissionCalculation {
        CommissionCalculation {
            id: uuid::Uuid::new_v4().to_string(),
            employee_id: employee_id.to_string(),
            plan_id: "plan-a".to_string(),
            plan_version: 1,
            period: CalculationPeriod {
                start: "2026-07-01".parse().unwrap(),
                end: "2026-07-31".parse().unwrap(),
                name: "2026-07".to_string(),
            },
            metrics: SalesMetrics {
                total_sales_cents: 1_200_000,
                quota_achievement_bps: 10_000,
                category_breakdown: vec![CategorySales {
                    category: "equipment".to_string(),
                    sales_cents: 1_200_000,
                }],
            },
            details: vec![CommissionDetail {
                category: "equipment".to_string(),
                sales_amount_cents: 1_200_000,
                rate_bps: 700,
                amount_cents: 84_000,
            }],
            bonuses: vec![],
            adjustments: vec![],
            gross_commission_cents: 84_000,
            total_bonuses_cents: 0,
            status: CalculationStatus::Calculated,
            failure_reason: None,
            payout_date: Some("2026-08-15".parse().unwrap()),
            paid_at: None,
            calculated_at: Utc::now(),
            calculated_by: "batch".to_string(),
        }
    }

    fn sample_adjustment(calculation_id: &str, cents: i64) -> Adjustment {
        Adjustment {
            id: uuid::Uuid::new_v4().to_string(),
            calculation_id: calculation_id.to_string(),
            kind: AdjustmentKind::Manual,
            amount_cents: cents,
            reason: "goodwill".to_string(),
            applied_by: "mgr-1".to_string(),
            applied_at: Utc::now(),
            dispute_id: None,
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_save_and_get_roundtrip() {
        let db = test_db().await;
        let repo = db.calculations();

        let calc = sample_calculation("emp-1");
        repo.save(&calc).await.unwrap();

        let loaded = repo.get(&calc.id).await.unwrap();
        assert_eq!(loaded.gross_commission_cents, 84_000);
        assert_eq!(loaded.details.len(), 1);
        assert_eq!(loaded.metrics.total_sales_cents, 1_200_000);
        assert_eq!(loaded.net_commission().cents(), 84_000);
    }

    #[tokio::test]
    async fn test_recompute_preserves_id_and_ledger() {
        let db = test_db().await;
        let repo = db.calculations();

        let mut calc = sample_calculation("emp-1");
        repo.save(&calc).await.unwrap();
        repo.append_adjustment(&sample_adjustment(&calc.id, -10_000))
            .await
            .unwrap();

        // Recompute with different numbers, same id
        calc.gross_commission_cents = 90_000;
        repo.save(&calc).await.unwrap();

        let loaded = repo.get(&calc.id).await.unwrap();
        assert_eq!(loaded.gross_commission_cents, 90_000);
        assert_eq!(loaded.adjustments.len(), 1);
        assert_eq!(loaded.net_commission().cents(), 80_000);
    }

    #[tokio::test]
    async fn test_live_uniqueness_enforced() {
        let db = test_db().await;
        let repo = db.calculations();

        repo.save(&sample_calculation("emp-1")).await.unwrap();

        // Second live record for the same employee/plan/period is rejected
        let err = repo.save(&sample_calculation("emp-1")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // But a disputed record does not block a replacement
        let found = repo
            .find_live(
                "emp-1",
                "plan-a",
                "2026-07-01".parse().unwrap(),
                "2026-07-31".parse().unwrap(),
            )
            .await
            .unwrap()
            .unwrap();
        repo.set_status(&found.id, CalculationStatus::Disputed)
            .await
            .unwrap();
        repo.save(&sample_calculation("emp-1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_ledger_is_append_only_in_database() {
        let db = test_db().await;
        let repo = db.calculations();

        let calc = sample_calculation("emp-1");
        repo.save(&calc).await.unwrap();
        let adj = sample_adjustment(&calc.id, 5_000);
        repo.append_adjustment(&adj).await.unwrap();

        // The trigger rejects raw UPDATE/DELETE against the ledger
        let upd = sqlx::query("UPDATE commission_adjustments SET amount_cents = 0 WHERE id = ?")
            .bind(&adj.id)
            .execute(db.pool())
            .await;
        assert!(upd.is_err());

        let del = sqlx::query("DELETE FROM commission_adjustments WHERE id = ?")
            .bind(&adj.id)
            .execute(db.pool())
            .await;
        assert!(del.is_err());
    }

    #[tokio::test]
    async fn test_mark_paid_requires_calculated() {
        let db = test_db().await;
        let repo = db.calculations();

        let calc = sample_calculation("emp-1");
        repo.save(&calc).await.unwrap();

        repo.mark_paid(&calc.id, Utc::now()).await.unwrap();
        let loaded = repo.get(&calc.id).await.unwrap();
        assert_eq!(loaded.status, CalculationStatus::Paid);
        assert!(loaded.paid_at.is_some());

        // Second mark_paid fails: record is no longer Calculated
        assert!(repo.mark_paid(&calc.id, Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn test_adjustment_requires_existing_calculation() {
        let db = test_db().await;
        let repo = db.calculations();

        let err = repo
            .append_adjustment(&sample_adjustment("no-such-calc", 5_000))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
