//! File-feed metrics provider.
//!
//! The dealer-management export job drops a JSON snapshot of per-employee
//! sales metrics; this provider reads it on every fetch so a fresh export
//! is picked up without a restart.
//!
//! ```json
//! {
//!   "emp-7f2…": {
//!     "total_sales_cents": 1200000,
//!     "quota_achievement_bps": 10000,
//!     "category_breakdown": [
//!       { "category": "equipment", "sales_cents": 1000000 },
//!       { "category": "parts", "sales_cents": 200000 }
//!     ]
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;

use commission_core::SalesMetrics;
use commission_engine::{MetricsError, MetricsProvider};

/// Metrics provider backed by an exported JSON feed file.
#[derive(Debug, Clone)]
pub struct FeedFileMetrics {
    path: PathBuf,
}

impl FeedFileMetrics {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FeedFileMetrics { path: path.into() }
    }
}

#[async_trait]
impl MetricsProvider for FeedFileMetrics {
    async fn fetch_metrics(
        &self,
        employee_id: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<SalesMetrics, MetricsError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| MetricsError::Unavailable(format!("{}: {e}", self.path.display())))?;

        let feed: HashMap<String, SalesMetrics> = serde_json::from_slice(&bytes)
            .map_err(|e| MetricsError::Unavailable(format!("malformed metrics feed: {e}")))?;

        feed.get(employee_id)
            .cloned()
            .ok_or_else(|| MetricsError::UnknownEmployee(employee_id.to_string()))
    }
}
