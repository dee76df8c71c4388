//! HTTP route handlers.
//!
//! ## Surface
//! ```text
//! POST   /commission/calculate                    run a batch job
//! GET    /commission/calculations                 read model (employee or period filter)
//! GET    /commission/plans                        latest version of every plan
//! POST   /commission/plans                        create a plan version (+ assignments)
//! POST   /commission/calculations/{id}/adjustments  manual ledger entry
//! POST   /commission/calculations/{id}/chargeback   clawback entry
//! POST   /commission/calculations/{id}/paid         payout-executor hook
//! POST   /commission/disputes                     open a dispute
//! PATCH  /commission/disputes/{id}                assign / resolve (CAS version)
//! GET    /health
//! ```
//!
//! Request envelopes are camelCase; embedded records serialize the way the
//! exported TypeScript bindings expect them.

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use commission_core::{
    validation, CalculationPeriod, CategoryRate, CommissionCalculation, CommissionPlan, Dispute,
    DisputeOutcome, PaymentRules, PlanType, Tier, SYSTEM_ACTOR,
};
use commission_engine::CalculationRequest;

use crate::error::ApiError;
use crate::state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/commission/calculate", post(calculate))
        .route("/commission/calculations", get(list_calculations))
        .route("/commission/plans", get(list_plans).post(create_plan))
        .route(
            "/commission/calculations/{id}/adjustments",
            post(apply_adjustment),
        )
        .route(
            "/commission/calculations/{id}/chargeback",
            post(file_chargeback),
        )
        .route("/commission/calculations/{id}/paid", post(mark_paid))
        .route("/commission/disputes", post(open_dispute))
        .route("/commission/disputes/{id}", patch(update_dispute))
        .route("/health", get(health))
        .with_state(state)
}

// =============================================================================
// Batch Calculation
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalculateBody {
    start_date: NaiveDate,
    end_date: NaiveDate,
    #[serde(default)]
    employee_ids: Vec<String>,
    plan_id: Option<String>,
    actor: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureSummary {
    employee_id: String,
    reason: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JobSummary {
    requested: usize,
    succeeded: usize,
    failed: usize,
    failures: Vec<FailureSummary>,
    calculations: Vec<CommissionCalculation>,
}

async fn calculate(
    State(state): State<AppState>,
    Json(body): Json<CalculateBody>,
) -> Result<Json<JobSummary>, ApiError> {
    let request = CalculationRequest {
        period: CalculationPeriod {
            start: body.start_date,
            end: body.end_date,
            name: period_name(body.start_date, body.end_date),
        },
        employee_ids: body.employee_ids,
        plan_id: body.plan_id,
        actor: body.actor.unwrap_or_else(|| SYSTEM_ACTOR.to_string()),
    };

    let result = state.engine.calculate(request).await?;
    Ok(Json(JobSummary {
        requested: result.requested,
        succeeded: result.succeeded.len(),
        failed: result.failed.len(),
        failures: result
            .failed
            .into_iter()
            .map(|f| FailureSummary {
                employee_id: f.employee_id,
                reason: f.reason,
            })
            .collect(),
        calculations: result.succeeded,
    }))
}

/// Statement display name: "2026-07" for a calendar month, otherwise the
/// raw date range.
fn period_name(start: NaiveDate, end: NaiveDate) -> String {
    let spans_one_month = start.day() == 1
        && start.year() == end.year()
        && start.month() == end.month()
        && end.succ_opt().map(|d| d.month() != end.month()).unwrap_or(false);
    if spans_one_month {
        start.format("%Y-%m").to_string()
    } else {
        format!("{start}..{end}")
    }
}

// =============================================================================
// Read Models
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalculationFilter {
    employee_id: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    limit: Option<i64>,
}

async fn list_calculations(
    State(state): State<AppState>,
    Query(filter): Query<CalculationFilter>,
) -> Result<Json<Vec<CommissionCalculation>>, ApiError> {
    let repo = state.db.calculations();

    let records = match (&filter.employee_id, filter.start_date, filter.end_date) {
        (Some(employee_id), _, _) => {
            repo.list_for_employee(employee_id, filter.limit.unwrap_or(50))
                .await?
        }
        (None, Some(start), Some(end)) => repo.list_for_period(start, end, None).await?,
        _ => {
            return Err(ApiError::Unprocessable(
                "employeeId or startDate/endDate filter is required".to_string(),
            ))
        }
    };
    Ok(Json(records))
}

async fn list_plans(
    State(state): State<AppState>,
) -> Result<Json<Vec<CommissionPlan>>, ApiError> {
    Ok(Json(state.db.plans().list_latest().await?))
}

// =============================================================================
// Plan Creation
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePlanBody {
    plan_id: String,
    name: String,
    plan_type: PlanType,
    tiers: Vec<Tier>,
    #[serde(default)]
    payment_rules: Option<PaymentRules>,
    #[serde(default)]
    category_rates: Vec<CategoryRate>,
    #[serde(default)]
    highest_bonus_only: bool,
    effective_date: NaiveDate,
    /// Employees to (re)assign to this plan alongside the new version.
    #[serde(default)]
    employee_ids: Vec<String>,
}

async fn create_plan(
    State(state): State<AppState>,
    Json(body): Json<CreatePlanBody>,
) -> Result<Json<CommissionPlan>, ApiError> {
    let plans = state.db.plans();
    let version = plans.next_version(&body.plan_id).await?;

    let plan = CommissionPlan {
        id: Uuid::new_v4().to_string(),
        plan_id: body.plan_id,
        version,
        name: body.name,
        plan_type: body.plan_type,
        tiers: body.tiers,
        payment_rules: body.payment_rules.unwrap_or_default(),
        category_rates: body.category_rates,
        highest_bonus_only: body.highest_bonus_only,
        effective_date: body.effective_date,
        is_active: true,
        created_at: Utc::now(),
    };
    validation::validate_plan(&plan)?;

    plans.insert_version(&plan).await?;
    for employee_id in &body.employee_ids {
        plans.assign_employee(employee_id, &plan.plan_id).await?;
    }

    Ok(Json(plan))
}

// =============================================================================
// Ledger Operations
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerEntryBody {
    amount_cents: i64,
    reason: String,
    applied_by: Option<String>,
}

async fn apply_adjustment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<LedgerEntryBody>,
) -> Result<Json<CommissionCalculation>, ApiError> {
    let actor = body.applied_by.as_deref().unwrap_or(SYSTEM_ACTOR);
    let calc = state
        .engine
        .apply_adjustment(&id, body.amount_cents, &body.reason, actor)
        .await?;
    Ok(Json(calc))
}

async fn file_chargeback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<LedgerEntryBody>,
) -> Result<Json<CommissionCalculation>, ApiError> {
    let actor = body.applied_by.as_deref().unwrap_or(SYSTEM_ACTOR);
    let calc = state
        .engine
        .file_chargeback(&id, body.amount_cents, &body.reason, actor)
        .await?;
    Ok(Json(calc))
}

async fn mark_paid(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CommissionCalculation>, ApiError> {
    Ok(Json(state.engine.mark_paid(&id).await?))
}

// =============================================================================
// Disputes
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenDisputeBody {
    calculation_id: String,
    disputed_amount_cents: i64,
    expected_amount_cents: i64,
    notes: Option<String>,
}

async fn open_dispute(
    State(state): State<AppState>,
    Json(body): Json<OpenDisputeBody>,
) -> Result<Json<Dispute>, ApiError> {
    let dispute = state
        .disputes
        .open(
            &body.calculation_id,
            body.disputed_amount_cents,
            body.expected_amount_cents,
            body.notes,
        )
        .await?;
    Ok(Json(dispute))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DisputeAction {
    Assign,
    Resolve,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DisputeUpdateBody {
    action: DisputeAction,
    /// The version the caller read; a stale value answers 409.
    version: i64,
    assignee: Option<String>,
    outcome: Option<DisputeOutcome>,
    correction_cents: Option<i64>,
    notes: Option<String>,
    actor: Option<String>,
}

async fn update_dispute(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<DisputeUpdateBody>,
) -> Result<Json<Dispute>, ApiError> {
    let dispute = match body.action {
        DisputeAction::Assign => {
            let assignee = body.assignee.ok_or_else(|| {
                ApiError::Unprocessable("assignee is required for assign".to_string())
            })?;
            state.disputes.assign(&id, &assignee, body.version).await?
        }
        DisputeAction::Resolve => {
            let outcome = body.outcome.ok_or_else(|| {
                ApiError::Unprocessable("outcome is required for resolve".to_string())
            })?;
            let actor = body.actor.as_deref().unwrap_or(SYSTEM_ACTOR);
            state
                .disputes
                .resolve(
                    &id,
                    outcome,
                    body.correction_cents,
                    body.notes,
                    actor,
                    body.version,
                )
                .await?
        }
    };
    Ok(Json(dispute))
}

// =============================================================================
// Health
// =============================================================================

async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    if state.db.health_check().await {
        Ok(Json(json!({ "status": "ok" })))
    } else {
        Err(ApiError::Internal("database unreachable".to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_name_for_calendar_month() {
        let start: NaiveDate = "2026-07-01".parse().unwrap();
        let end: NaiveDate = "2026-07-31".parse().unwrap();
        assert_eq!(period_name(start, end), "2026-07");
    }

    #[test]
    fn test_period_name_for_arbitrary_range() {
        let start: NaiveDate = "2026-07-01".parse().unwrap();
        let end: NaiveDate = "2026-09-30".parse().unwrap();
        assert_eq!(period_name(start, end), "2026-07-01..2026-09-30");
    }
}
