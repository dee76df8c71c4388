//! # Plan Store
//!
//! Plan resolution seam for the engine. Production uses [`DbPlanStore`]
//! over the plan repository; tests can substitute a scripted store.
//!
//! Version pinning: the store resolves the plan ONCE per employee at
//! calculation time and the engine snapshots (plan_id, version) onto the
//! record, so a plan edit mid-batch never changes an in-flight calculation.

use async_trait::async_trait;
use chrono::NaiveDate;

use commission_core::CommissionPlan;
use commission_db::PlanRepository;

use crate::error::EngineResult;

/// Resolves which plan version governs an employee on a date.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Returns the latest active plan version assigned to the employee with
    /// `effective_date <= as_of`, or `None` when no plan applies.
    async fn applicable_plan(
        &self,
        employee_id: &str,
        as_of: NaiveDate,
    ) -> EngineResult<Option<CommissionPlan>>;

    /// Returns the employees assigned to a plan (batch fan-out by plan).
    async fn assigned_employees(&self, plan_id: &str) -> EngineResult<Vec<String>>;
}

/// Database-backed plan store.
#[derive(Debug, Clone)]
pub struct DbPlanStore {
    repo: PlanRepository,
}

impl DbPlanStore {
    pub fn new(repo: PlanRepository) -> Self {
        DbPlanStore { repo }
    }
}

#[async_trait]
impl PlanStore for DbPlanStore {
    async fn applicable_plan(
        &self,
        employee_id: &str,
        as_of: NaiveDate,
    ) -> EngineResult<Option<CommissionPlan>> {
        Ok(self.repo.applicable_for_employee(employee_id, as_of).await?)
    }

    async fn assigned_employees(&self, plan_id: &str) -> EngineResult<Vec<String>> {
        let assignments = self.repo.assignments_for_plan(plan_id).await?;
        Ok(assignments.into_iter().map(|a| a.employee_id).collect())
    }
}
