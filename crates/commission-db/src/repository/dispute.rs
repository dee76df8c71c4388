//! # Dispute Repository
//!
//! Persistence for commission disputes with optimistic concurrency.
//!
//! ## Compare-and-Swap Writes
//! ```text
//!   Reviewer A                         Reviewer B
//!   ──────────                         ──────────
//!   read dispute (version 2)           read dispute (version 2)
//!   UPDATE ... WHERE version = 2  ✓    │
//!   (row now at version 3)             ▼
//!                                      UPDATE ... WHERE version = 2  ✗
//!                                      0 rows ──► StaleVersion error
//! ```
//!
//! Every write matches on (id, version) and bumps version by one; a write
//! that matches zero rows lost the race and surfaces as
//! [`DbError::StaleVersion`] so the caller can re-read and retry.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use commission_core::{Adjustment, Dispute, DisputeOutcome, DisputeStatus, DEFAULT_TENANT_ID};

use crate::error::{DbError, DbResult};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct DisputeRow {
    id: String,
    calculation_id: String,
    disputed_amount_cents: i64,
    expected_amount_cents: i64,
    difference_cents: i64,
    status: DisputeStatus,
    assigned_to: Option<String>,
    notes: Option<String>,
    outcome: Option<DisputeOutcome>,
    resolved_at: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
}

impl From<DisputeRow> for Dispute {
    fn from(row: DisputeRow) -> Self {
        Dispute {
            id: row.id,
            calculation_id: row.calculation_id,
            disputed_amount_cents: row.disputed_amount_cents,
            expected_amount_cents: row.expected_amount_cents,
            difference_cents: row.difference_cents,
            status: row.status,
            assigned_to: row.assigned_to,
            notes: row.notes,
            outcome: row.outcome,
            resolved_at: row.resolved_at,
            version: row.version,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for dispute operations.
#[derive(Debug, Clone)]
pub struct DisputeRepository {
    pool: SqlitePool,
}

impl DisputeRepository {
    /// Creates a new dispute repository.
    pub fn new(pool: SqlitePool) -> Self {
        DisputeRepository { pool }
    }

    /// Inserts a freshly opened dispute (version 1).
    pub async fn insert(&self, dispute: &Dispute) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO disputes
                (id, tenant_id, calculation_id,
                 disputed_amount_cents, expected_amount_cents, difference_cents,
                 status, assigned_to, notes, outcome, resolved_at,
                 version, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&dispute.id)
        .bind(DEFAULT_TENANT_ID)
        .bind(&dispute.calculation_id)
        .bind(dispute.disputed_amount_cents)
        .bind(dispute.expected_amount_cents)
        .bind(dispute.difference_cents)
        .bind(dispute.status)
        .bind(&dispute.assigned_to)
        .bind(&dispute.notes)
        .bind(dispute.outcome)
        .bind(dispute.resolved_at)
        .bind(dispute.version)
        .bind(dispute.created_at)
        .execute(&self.pool)
        .await?;

        debug!(id = %dispute.id, calculation = %dispute.calculation_id, "Inserted dispute");
        Ok(())
    }

    /// Fetches a dispute by id.
    pub async fn get(&self, id: &str) -> DbResult<Dispute> {
        let row: Option<DisputeRow> = sqlx::query_as(
            r#"
            SELECT id, calculation_id,
                   disputed_amount_cents, expected_amount_cents, difference_cents,
                   status, assigned_to, notes, outcome, resolved_at,
                   version, created_at
            FROM disputes
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Dispute::from)
            .ok_or_else(|| DbError::not_found("Dispute", id))
    }

    /// Writes a dispute state transition, compare-and-swapping on
    /// `expected_version`.
    ///
    /// `dispute.version` must already hold `expected_version + 1` (the
    /// state-machine functions bump it); the WHERE clause matches the OLD
    /// version so a concurrent writer makes this a zero-row update.
    pub async fn update_cas(&self, dispute: &Dispute, expected_version: i64) -> DbResult<()> {
        self.transition(dispute, expected_version, None).await
    }

    /// Resolves a dispute and appends its correction to the adjustment
    /// ledger in the same transaction.
    ///
    /// The CAS runs first and the correction is written only once the CAS
    /// matches a row, so a writer that lost the version race leaves no
    /// ledger entry behind.
    pub async fn resolve_with_correction(
        &self,
        dispute: &Dispute,
        expected_version: i64,
        correction: &Adjustment,
    ) -> DbResult<()> {
        self.transition(dispute, expected_version, Some(correction))
            .await
    }

    async fn transition(
        &self,
        dispute: &Dispute,
        expected_version: i64,
        correction: Option<&Adjustment>,
    ) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE disputes SET
                status = ?, assigned_to = ?, notes = ?, outcome = ?,
                resolved_at = ?, version = ?
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(dispute.status)
        .bind(&dispute.assigned_to)
        .bind(&dispute.notes)
        .bind(dispute.outcome)
        .bind(dispute.resolved_at)
        .bind(dispute.version)
        .bind(&dispute.id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            // Distinguish "gone" from "stale" for the caller; the dropped
            // transaction rolls back with no side effects.
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM disputes WHERE id = ?")
                .bind(&dispute.id)
                .fetch_optional(&mut *tx)
                .await?;
            return match exists {
                Some(_) => Err(DbError::stale_version(
                    "Dispute",
                    &dispute.id,
                    expected_version,
                )),
                None => Err(DbError::not_found("Dispute", &dispute.id)),
            };
        }

        if let Some(entry) = correction {
            sqlx::query(
                r#"
                INSERT INTO commission_adjustments
                    (id, calculation_id, kind, amount_cents, reason,
                     applied_by, applied_at, dispute_id)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&entry.id)
            .bind(&entry.calculation_id)
            .bind(entry.kind)
            .bind(entry.amount_cents)
            .bind(&entry.reason)
            .bind(&entry.applied_by)
            .bind(entry.applied_at)
            .bind(&entry.dispute_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(id = %dispute.id, version = dispute.version, "Advanced dispute");
        Ok(())
    }

    /// Lists disputes attached to a calculation, newest first.
    pub async fn list_for_calculation(&self, calculation_id: &str) -> DbResult<Vec<Dispute>> {
        let rows: Vec<DisputeRow> = sqlx::query_as(
            r#"
            SELECT id, calculation_id,
                   disputed_amount_cents, expected_amount_cents, difference_cents,
                   status, assigned_to, notes, outcome, resolved_at,
                   version, created_at
            FROM disputes
            WHERE calculation_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(calculation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Dispute::from).collect())
    }

    /// Lists disputes in a given status, oldest first (review queue order).
    pub async fn list_by_status(&self, status: DisputeStatus) -> DbResult<Vec<Dispute>> {
        let rows: Vec<DisputeRow> = sqlx::query_as(
            r#"
            SELECT id, calculation_id,
                   disputed_amount_cents, expected_amount_cents, difference_cents,
                   status, assigned_to, notes, outcome, resolved_at,
                   version, created_at
            FROM disputes
            WHERE status = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Dispute::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use commission_core::{
        CalculationPeriod, CalculationStatus, CommissionCalculation, SalesMetrics,
    };

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_calculation(db: &Database) -> String {
        let calc = CommissionCalculation {
            id: uuid::Uuid::new_v4().to_string(),
            employee_id: "emp-1".to_string(),
            plan_id: "plan-a".to_string(),
            plan_version: 1,
            period: CalculationPeriod {
                start: "2026-07-01".parse().unwrap(),
                end: "2026-07-31".parse().unwrap(),
                name: "2026-07".to_string(),
            },
            metrics: SalesMetrics {
                total_sales_cents: 500_000,
                quota_achievement_bps: 8_000,
                category_breakdown: vec![],
            },
            details: vec![],
            bonuses: vec![],
            adjustments: vec![],
            gross_commission_cents: 25_000,
            total_bonuses_cents: 0,
            status: CalculationStatus::Calculated,
            failure_reason: None,
            payout_date: None,
            paid_at: None,
            calculated_at: Utc::now(),
            calculated_by: "batch".to_string(),
        };
        db.calculations().save(&calc).await.unwrap();
        calc.id
    }

    fn sample_dispute(calculation_id: &str) -> Dispute {
        Dispute {
            id: uuid::Uuid::new_v4().to_string(),
            calculation_id: calculation_id.to_string(),
            disputed_amount_cents: 25_000,
            expected_amount_cents: 30_000,
            difference_cents: -5_000,
            status: DisputeStatus::Open,
            assigned_to: None,
            notes: Some("statement looks short".to_string()),
            outcome: None,
            resolved_at: None,
            version: 1,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let calc_id = seed_calculation(&db).await;
        let repo = db.disputes();

        let dispute = sample_dispute(&calc_id);
        repo.insert(&dispute).await.unwrap();

        let loaded = repo.get(&dispute.id).await.unwrap();
        assert_eq!(loaded.status, DisputeStatus::Open);
        assert_eq!(loaded.difference_cents, -5_000);
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn test_cas_update_bumps_version() {
        let db = test_db().await;
        let calc_id = seed_calculation(&db).await;
        let repo = db.disputes();

        let mut dispute = sample_dispute(&calc_id);
        repo.insert(&dispute).await.unwrap();

        dispute.status = DisputeStatus::UnderReview;
        dispute.assigned_to = Some("reviewer-1".to_string());
        dispute.version = 2;
        repo.update_cas(&dispute, 1).await.unwrap();

        let loaded = repo.get(&dispute.id).await.unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.status, DisputeStatus::UnderReview);
    }

    #[tokio::test]
    async fn test_stale_write_rejected() {
        let db = test_db().await;
        let calc_id = seed_calculation(&db).await;
        let repo = db.disputes();

        let mut dispute = sample_dispute(&calc_id);
        repo.insert(&dispute).await.unwrap();

        dispute.status = DisputeStatus::UnderReview;
        dispute.assigned_to = Some("reviewer-1".to_string());
        dispute.version = 2;
        repo.update_cas(&dispute, 1).await.unwrap();

        // A second writer still holding version 1 loses the race
        let mut stale = sample_dispute(&calc_id);
        stale.id = dispute.id.clone();
        stale.version = 2;
        let err = repo.update_cas(&stale, 1).await.unwrap_err();
        assert!(matches!(err, DbError::StaleVersion { expected: 1, .. }));
    }

    #[tokio::test]
    async fn test_losing_resolve_leaves_no_ledger_entry() {
        let db = test_db().await;
        let calc_id = seed_calculation(&db).await;
        let repo = db.disputes();

        let mut dispute = sample_dispute(&calc_id);
        repo.insert(&dispute).await.unwrap();

        // Another writer already advanced the dispute
        dispute.status = DisputeStatus::UnderReview;
        dispute.assigned_to = Some("reviewer-1".to_string());
        dispute.version = 2;
        repo.update_cas(&dispute, 1).await.unwrap();

        let correction = Adjustment {
            id: uuid::Uuid::new_v4().to_string(),
            calculation_id: calc_id.clone(),
            kind: commission_core::AdjustmentKind::DisputeResolution,
            amount_cents: 5_000,
            reason: "dispute resolution".to_string(),
            applied_by: "reviewer-2".to_string(),
            applied_at: Utc::now(),
            dispute_id: Some(dispute.id.clone()),
        };
        let mut stale = dispute.clone();
        stale.status = DisputeStatus::Resolved;
        stale.version = 2;
        let err = repo
            .resolve_with_correction(&stale, 1, &correction)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::StaleVersion { .. }));

        // The rolled-back transaction must not have landed the correction
        let ledger = db.calculations().ledger(&calc_id).await.unwrap();
        assert!(ledger.is_empty());

        // A current-version resolve commits both the CAS and the entry
        let mut resolved = dispute.clone();
        resolved.status = DisputeStatus::Resolved;
        resolved.outcome = Some(DisputeOutcome::Adjusted);
        resolved.resolved_at = Some(Utc::now());
        resolved.version = 3;
        repo.resolve_with_correction(&resolved, 2, &correction)
            .await
            .unwrap();

        let ledger = db.calculations().ledger(&calc_id).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].amount_cents, 5_000);
        assert_eq!(repo.get(&dispute.id).await.unwrap().version, 3);
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let db = test_db().await;
        let calc_id = seed_calculation(&db).await;
        let repo = db.disputes();

        repo.insert(&sample_dispute(&calc_id)).await.unwrap();
        repo.insert(&sample_dispute(&calc_id)).await.unwrap();

        let open = repo.list_by_status(DisputeStatus::Open).await.unwrap();
        assert_eq!(open.len(), 2);
        let reviewing = repo
            .list_by_status(DisputeStatus::UnderReview)
            .await
            .unwrap();
        assert!(reviewing.is_empty());
    }
}
