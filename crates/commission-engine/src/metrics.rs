//! # Metrics Provider
//!
//! The seam between the engine and whatever system owns sales data.
//!
//! ```text
//! ┌──────────────────┐     fetch_metrics(employee, start, end)
//! │ CalculationEngine│ ───────────────────────────────────►  dealer DMS,
//! └──────────────────┘ ◄───────────────────────────────────  warehouse,
//!                        SalesMetrics | MetricsError          test script
//! ```
//!
//! The engine treats a provider failure as a FAILED calculation for that
//! employee (recorded with the reason), never as zero sales.

use async_trait::async_trait;
use chrono::NaiveDate;
use commission_core::SalesMetrics;

/// Why a provider could not produce metrics.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MetricsError {
    /// The employee is unknown to the sales system.
    #[error("employee {0} not found in sales data")]
    UnknownEmployee(String),

    /// The upstream system was unreachable or errored.
    #[error("sales data source unavailable: {0}")]
    Unavailable(String),
}

/// Source of sales metrics for commission calculation.
///
/// Implementations must be cheap to call concurrently; the batch
/// orchestrator fans out over employees.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Fetches the sales metrics for one employee over a date range
    /// (inclusive).
    async fn fetch_metrics(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SalesMetrics, MetricsError>;
}
