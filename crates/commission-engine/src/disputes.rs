//! # Dispute Service
//!
//! Drives the dispute state machine over the database, with optimistic
//! concurrency on every write.
//!
//! ## Lifecycle
//! ```text
//!        open()              assign()            resolve()
//!   ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!   │     Open     │───►│ UnderReview  │───►│   Resolved   │ (terminal)
//!   └──────────────┘    └──────────────┘    └──────────────┘
//!          │                                       ▲
//!          └───────── auto-resolution flag ────────┘
//!
//!   open() also flips the calculation to Disputed, which frees its
//!   uniqueness slot so a corrected recompute can land next to it.
//! ```
//!
//! Resolution outcomes:
//! - `Upheld`: the original amount stands; no ledger entry.
//! - `Adjusted`: a correction is appended to the adjustment ledger,
//!   tagged with the dispute id. The calculation snapshot is never edited.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use commission_core::{
    dispute, validation, Adjustment, AdjustmentKind, CalculationStatus, Dispute, DisputeOutcome,
};
use commission_db::Database;

use crate::error::{EngineError, EngineResult};

/// Dispute workflow service.
#[derive(Clone)]
pub struct DisputeService {
    db: Database,

    /// When true, `Open → Resolved` is allowed without review.
    auto_resolution_enabled: bool,
}

impl DisputeService {
    pub fn new(db: Database) -> Self {
        DisputeService {
            db,
            auto_resolution_enabled: false,
        }
    }

    /// Enables direct `Open → Resolved` transitions.
    pub fn with_auto_resolution(mut self, enabled: bool) -> Self {
        self.auto_resolution_enabled = enabled;
        self
    }

    /// Files a dispute against a calculated or paid commission and marks
    /// the calculation `Disputed`.
    pub async fn open(
        &self,
        calculation_id: &str,
        disputed_amount_cents: i64,
        expected_amount_cents: i64,
        notes: Option<String>,
    ) -> EngineResult<Dispute> {
        let calcs = self.db.calculations();
        let calc = calcs.get(calculation_id).await?;

        let new_dispute = dispute::open_dispute(
            &calc,
            disputed_amount_cents,
            expected_amount_cents,
            notes,
            Utc::now(),
        )?;

        self.db.disputes().insert(&new_dispute).await?;
        calcs
            .set_status(calculation_id, CalculationStatus::Disputed)
            .await?;

        info!(
            dispute = %new_dispute.id,
            calculation = %calculation_id,
            difference_cents = new_dispute.difference_cents,
            "Dispute opened"
        );
        Ok(new_dispute)
    }

    /// Assigns a reviewer: `Open → UnderReview` (or reassignment during
    /// review). CAS on `expected_version`.
    pub async fn assign(
        &self,
        dispute_id: &str,
        assignee: &str,
        expected_version: i64,
    ) -> EngineResult<Dispute> {
        let mut record = self.fetch_at(dispute_id, expected_version).await?;

        dispute::assign(&mut record, assignee)?;
        record.version = expected_version + 1;
        self.db
            .disputes()
            .update_cas(&record, expected_version)
            .await
            .map_err(|e| EngineError::from_dispute_write(e, dispute_id))?;

        info!(dispute = %dispute_id, %assignee, "Dispute assigned");
        Ok(record)
    }

    /// Resolves a dispute. `Adjusted` appends a ledger entry for the
    /// correction; `Upheld` leaves the ledger alone.
    pub async fn resolve(
        &self,
        dispute_id: &str,
        outcome: DisputeOutcome,
        correction_cents: Option<i64>,
        notes: Option<String>,
        actor: &str,
        expected_version: i64,
    ) -> EngineResult<Dispute> {
        let mut record = self.fetch_at(dispute_id, expected_version).await?;

        dispute::resolve(
            &mut record,
            outcome,
            notes,
            self.auto_resolution_enabled,
            Utc::now(),
        )?;

        let correction = if outcome == DisputeOutcome::Adjusted {
            // Default correction: pay out the difference the employee claimed
            let cents = correction_cents.unwrap_or(-record.difference_cents);
            validation::validate_adjustment_amount(cents)
                .map_err(commission_core::CoreError::from)?;

            Some(Adjustment {
                id: Uuid::new_v4().to_string(),
                calculation_id: record.calculation_id.clone(),
                kind: AdjustmentKind::DisputeResolution,
                amount_cents: cents,
                reason: record
                    .notes
                    .clone()
                    .unwrap_or_else(|| "dispute resolution".to_string()),
                applied_by: actor.to_string(),
                applied_at: Utc::now(),
                dispute_id: Some(record.id.clone()),
            })
        } else {
            None
        };

        record.version = expected_version + 1;
        // The CAS and the ledger append commit together, so a writer that
        // lost the version race leaves no correction behind.
        let write = match &correction {
            Some(entry) => {
                self.db
                    .disputes()
                    .resolve_with_correction(&record, expected_version, entry)
                    .await
            }
            None => self.db.disputes().update_cas(&record, expected_version).await,
        };
        write.map_err(|e| EngineError::from_dispute_write(e, dispute_id))?;

        info!(
            dispute = %dispute_id,
            outcome = ?outcome,
            "Dispute resolved"
        );
        Ok(record)
    }

    /// Fetches a dispute by id.
    pub async fn get(&self, dispute_id: &str) -> EngineResult<Dispute> {
        Ok(self.db.disputes().get(dispute_id).await?)
    }

    /// Loads the dispute and pre-checks the caller's version so an already
    /// stale request fails before any side effect.
    async fn fetch_at(&self, dispute_id: &str, expected_version: i64) -> EngineResult<Dispute> {
        let record = self.db.disputes().get(dispute_id).await?;
        if record.version != expected_version {
            return Err(EngineError::Core(
                commission_core::CoreError::DisputeVersionConflict {
                    dispute_id: dispute_id.to_string(),
                    expected: expected_version,
                },
            ));
        }
        Ok(record)
    }
}
