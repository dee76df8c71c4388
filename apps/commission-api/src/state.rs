//! Shared application state handed to every handler.

use commission_db::Database;
use commission_engine::{CalculationEngine, DisputeService};

/// Handler state. Cloning is cheap; everything inside is pool- or
/// Arc-backed.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub engine: CalculationEngine,
    pub disputes: DisputeService,
}
