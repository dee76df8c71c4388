//! # Calculation Engine
//!
//! Batch orchestration of the per-employee calculation pipeline.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  CalculationEngine::calculate(request)                  │
//! │                                                                         │
//! │  resolve employee set (explicit ids, or everyone assigned to a plan)   │
//! │       │                                                                 │
//! │       ▼  bounded fan-out (JoinSet + Semaphore)                         │
//! │  ┌── per employee ────────────────────────────────────────────────┐    │
//! │  │ 1. applicable plan version (pinned onto the snapshot)          │    │
//! │  │ 2. duplicate guard: Paid record for the period ──► fail        │    │
//! │  │    non-paid record            ──► recompute in place (same id) │    │
//! │  │ 3. fetch metrics (failure ──► record persisted as Failed)      │    │
//! │  │ 4. resolve tier + category rates ──► detail rows               │    │
//! │  │ 5. evaluate tier bonuses                                       │    │
//! │  │ 6. payout_date = period end + payment delay                    │    │
//! │  │ 7. persist snapshot (ledger untouched)                         │    │
//! │  └────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CalculationJobResult { requested, succeeded, failed[reason] }         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Per-employee failures never abort the batch; each is reported with its
//! reason in the job result.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use commission_core::{
    bonus, ledger, resolver, validation, CalculationPeriod, CalculationStatus,
    CommissionCalculation, CoreError, SalesMetrics,
};
use commission_db::Database;

use crate::error::{EngineError, EngineResult};
use crate::metrics::MetricsProvider;
use crate::plan_store::PlanStore;

// =============================================================================
// Request / Result Types
// =============================================================================

/// One batch calculation job.
#[derive(Debug, Clone)]
pub struct CalculationRequest {
    pub period: CalculationPeriod,

    /// Explicit employee set. Empty means "everyone assigned to `plan_id`".
    pub employee_ids: Vec<String>,

    /// Plan to fan out over when `employee_ids` is empty.
    pub plan_id: Option<String>,

    /// Who (or what job) requested the batch; recorded on every snapshot.
    pub actor: String,
}

/// A per-employee failure inside a batch.
#[derive(Debug, Clone)]
pub struct CalculationFailure {
    pub employee_id: String,
    pub reason: String,
}

/// Outcome of a batch job. The batch as a whole succeeds even when
/// individual employees fail.
#[derive(Debug)]
pub struct CalculationJobResult {
    pub requested: usize,
    pub succeeded: Vec<CommissionCalculation>,
    pub failed: Vec<CalculationFailure>,
}

// =============================================================================
// Engine
// =============================================================================

/// Default bound on concurrent per-employee calculations.
const DEFAULT_CONCURRENCY: usize = 4;

/// Batch commission calculation service.
#[derive(Clone)]
pub struct CalculationEngine {
    db: Database,
    plans: Arc<dyn PlanStore>,
    metrics: Arc<dyn MetricsProvider>,
    concurrency: usize,
}

impl CalculationEngine {
    /// Creates an engine over a database, plan store and metrics provider.
    pub fn new(db: Database, plans: Arc<dyn PlanStore>, metrics: Arc<dyn MetricsProvider>) -> Self {
        CalculationEngine {
            db,
            plans,
            metrics,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Overrides the worker-pool bound.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Runs a batch calculation job.
    pub async fn calculate(&self, request: CalculationRequest) -> EngineResult<CalculationJobResult> {
        validation::validate_period(request.period.start, request.period.end)
            .map_err(CoreError::from)?;

        let employee_ids = self.resolve_employees(&request).await?;
        let requested = employee_ids.len();
        info!(
            period = %request.period.name,
            employees = requested,
            "Starting batch calculation"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set: JoinSet<(String, EngineResult<CommissionCalculation>)> = JoinSet::new();

        for employee_id in employee_ids {
            let engine = self.clone();
            let period = request.period.clone();
            let actor = request.actor.clone();
            let semaphore = Arc::clone(&semaphore);

            join_set.spawn(async move {
                // Closed only when the JoinSet is dropped mid-flight
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            employee_id.clone(),
                            Err(EngineError::Metrics {
                                employee_id,
                                reason: "batch cancelled".to_string(),
                            }),
                        )
                    }
                };
                let outcome = engine.calculate_employee(&employee_id, &period, &actor).await;
                (employee_id, outcome)
            });
        }

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((_, Ok(calc))) => succeeded.push(calc),
                Ok((employee_id, Err(err))) => {
                    warn!(%employee_id, error = %err, "Employee calculation failed");
                    failed.push(CalculationFailure {
                        employee_id,
                        reason: err.to_string(),
                    });
                }
                Err(join_err) => {
                    warn!(error = %join_err, "Calculation task panicked");
                    failed.push(CalculationFailure {
                        employee_id: "<unknown>".to_string(),
                        reason: join_err.to_string(),
                    });
                }
            }
        }

        // Deterministic report order regardless of completion order
        succeeded.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));
        failed.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));

        info!(
            period = %request.period.name,
            succeeded = succeeded.len(),
            failed = failed.len(),
            "Batch calculation complete"
        );

        Ok(CalculationJobResult {
            requested,
            succeeded,
            failed,
        })
    }

    /// Runs the full pipeline for one employee.
    pub async fn calculate_employee(
        &self,
        employee_id: &str,
        period: &CalculationPeriod,
        actor: &str,
    ) -> EngineResult<CommissionCalculation> {
        let plan = self
            .plans
            .applicable_plan(employee_id, period.end)
            .await?
            .ok_or_else(|| CoreError::NoPlanConfigured {
                employee_id: employee_id.to_string(),
                as_of: period.end,
            })?;

        let calcs = self.db.calculations();

        // Duplicate guard + idempotent recompute: a Paid record is final;
        // any other live record is replaced in place, keeping its id and
        // ledger.
        let existing = calcs
            .find_live(employee_id, &plan.plan_id, period.start, period.end)
            .await?;
        let id = match &existing {
            Some(prior) if prior.status == CalculationStatus::Paid => {
                return Err(CoreError::DuplicateCalculation {
                    employee_id: employee_id.to_string(),
                    plan_id: plan.plan_id.clone(),
                    period: period.name.clone(),
                }
                .into());
            }
            Some(prior) => prior.id.clone(),
            None => Uuid::new_v4().to_string(),
        };

        let metrics = match self
            .metrics
            .fetch_metrics(employee_id, period.start, period.end)
            .await
        {
            Ok(metrics) => metrics,
            Err(err) => {
                // Record the failure; never treat missing data as zero sales
                let failed = failed_snapshot(&id, employee_id, &plan, period, actor, &err);
                calcs.save(&failed).await?;
                return Err(CoreError::MetricsUnavailable {
                    employee_id: employee_id.to_string(),
                    reason: err.to_string(),
                }
                .into());
            }
        };

        let details = resolver::resolve_details(&plan, &metrics);
        let bonuses = bonus::evaluate_bonuses(&plan, metrics.total_sales_cents);
        let gross = resolver::gross_commission(&details);
        let earned_bonuses = bonus::total_bonuses(&bonuses);
        let payout_date = period.payout_date(plan.payment_rules.payment_delay_days);

        let mut calc = CommissionCalculation {
            id,
            employee_id: employee_id.to_string(),
            plan_id: plan.plan_id.clone(),
            plan_version: plan.version,
            period: period.clone(),
            metrics,
            details,
            bonuses,
            adjustments: existing.map(|e| e.adjustments).unwrap_or_default(),
            gross_commission_cents: gross.cents(),
            total_bonuses_cents: earned_bonuses.cents(),
            status: CalculationStatus::Calculated,
            failure_reason: None,
            payout_date: Some(payout_date),
            paid_at: None,
            calculated_at: Utc::now(),
            calculated_by: actor.to_string(),
        };

        calcs.save(&calc).await?;
        // Re-read the ledger so the returned record reflects entries that
        // landed between the find and the save
        calc.adjustments = calcs.ledger(&calc.id).await?;

        info!(
            %employee_id,
            plan = %calc.plan_id,
            version = calc.plan_version,
            gross_cents = calc.gross_commission_cents,
            bonus_cents = calc.total_bonuses_cents,
            "Calculated commission"
        );
        Ok(calc)
    }

    /// Payout-executor hook: `Calculated → Paid`, recording the time.
    pub async fn mark_paid(&self, calculation_id: &str) -> EngineResult<CommissionCalculation> {
        self.db
            .calculations()
            .mark_paid(calculation_id, Utc::now())
            .await?;
        Ok(self.db.calculations().get(calculation_id).await?)
    }

    /// Files a chargeback against a paid calculation.
    ///
    /// `amount_cents` is the positive clawback amount; the ledger entry is
    /// appended negative. Historical fields on the record stay untouched.
    pub async fn file_chargeback(
        &self,
        calculation_id: &str,
        amount_cents: i64,
        reason: &str,
        actor: &str,
    ) -> EngineResult<CommissionCalculation> {
        validation::validate_adjustment_amount(amount_cents).map_err(CoreError::from)?;

        let calcs = self.db.calculations();
        let calc = calcs.get(calculation_id).await?;

        let paid_at = match (calc.status, calc.paid_at) {
            (CalculationStatus::Paid, Some(paid_at)) => paid_at,
            _ => {
                return Err(CoreError::InvalidCalculationStatus {
                    calculation_id: calculation_id.to_string(),
                    status: format!("{:?}", calc.status),
                }
                .into());
            }
        };

        let plan = self
            .db
            .plans()
            .get_version(&calc.plan_id, calc.plan_version)
            .await?;
        ledger::check_chargeback_window(&plan.payment_rules, &plan.plan_id, paid_at, Utc::now())?;

        let entry = commission_core::Adjustment {
            id: Uuid::new_v4().to_string(),
            calculation_id: calculation_id.to_string(),
            kind: commission_core::AdjustmentKind::Chargeback,
            amount_cents: -amount_cents.abs(),
            reason: reason.to_string(),
            applied_by: actor.to_string(),
            applied_at: Utc::now(),
            dispute_id: None,
        };
        calcs.append_adjustment(&entry).await?;

        info!(%calculation_id, cents = entry.amount_cents, "Chargeback filed");
        Ok(calcs.get(calculation_id).await?)
    }

    /// Appends a manual adjustment (positive or negative, never zero).
    pub async fn apply_adjustment(
        &self,
        calculation_id: &str,
        amount_cents: i64,
        reason: &str,
        actor: &str,
    ) -> EngineResult<CommissionCalculation> {
        validation::validate_adjustment_amount(amount_cents).map_err(CoreError::from)?;

        let calcs = self.db.calculations();
        let calc = calcs.get(calculation_id).await?;
        ledger::check_adjustable(&calc)?;

        let entry = commission_core::Adjustment {
            id: Uuid::new_v4().to_string(),
            calculation_id: calculation_id.to_string(),
            kind: commission_core::AdjustmentKind::Manual,
            amount_cents,
            reason: reason.to_string(),
            applied_by: actor.to_string(),
            applied_at: Utc::now(),
            dispute_id: None,
        };
        calcs.append_adjustment(&entry).await?;

        info!(%calculation_id, cents = amount_cents, "Manual adjustment applied");
        Ok(calcs.get(calculation_id).await?)
    }

    async fn resolve_employees(&self, request: &CalculationRequest) -> EngineResult<Vec<String>> {
        if !request.employee_ids.is_empty() {
            let mut ids = request.employee_ids.clone();
            ids.sort();
            ids.dedup();
            return Ok(ids);
        }

        match &request.plan_id {
            Some(plan_id) => self.plans.assigned_employees(plan_id).await,
            None => Err(CoreError::Validation(
                commission_core::ValidationError::Required {
                    field: "employee_ids or plan_id".to_string(),
                },
            )
            .into()),
        }
    }
}

/// Builds the persisted record for a metrics failure.
fn failed_snapshot(
    id: &str,
    employee_id: &str,
    plan: &commission_core::CommissionPlan,
    period: &CalculationPeriod,
    actor: &str,
    err: &crate::metrics::MetricsError,
) -> CommissionCalculation {
    CommissionCalculation {
        id: id.to_string(),
        employee_id: employee_id.to_string(),
        plan_id: plan.plan_id.clone(),
        plan_version: plan.version,
        period: period.clone(),
        metrics: SalesMetrics {
            total_sales_cents: 0,
            quota_achievement_bps: 0,
            category_breakdown: Vec::new(),
        },
        details: Vec::new(),
        bonuses: Vec::new(),
        adjustments: Vec::new(),
        gross_commission_cents: 0,
        total_bonuses_cents: 0,
        status: CalculationStatus::Failed,
        failure_reason: Some(err.to_string()),
        payout_date: None,
        paid_at: None,
        calculated_at: Utc::now(),
        calculated_by: actor.to_string(),
    }
}
