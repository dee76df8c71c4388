//! # commission-engine: Batch Orchestration for the Commission Engine
//!
//! Runs the calculation pipeline (pure logic from `commission-core`,
//! persistence from `commission-db`) over batches of employees, and drives
//! the dispute workflow.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  commission-engine (THIS CRATE)                         │
//! │                                                                         │
//! │  ┌──────────────────────┐        ┌──────────────────────┐              │
//! │  │  CalculationEngine   │        │   DisputeService     │              │
//! │  │                      │        │                      │              │
//! │  │  batch fan-out       │        │  open / assign /     │              │
//! │  │  duplicate guard     │        │  resolve with CAS    │              │
//! │  │  chargebacks         │        │  ledger corrections  │              │
//! │  │  manual adjustments  │        │                      │              │
//! │  └──────────┬───────────┘        └──────────┬───────────┘              │
//! │             │                               │                           │
//! │     ┌───────┴──────┐                        │                           │
//! │     ▼              ▼                        ▼                           │
//! │  PlanStore   MetricsProvider          commission-db                    │
//! │  (trait)     (trait, external)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The two traits are the only seams to the outside world: `PlanStore` is
//! database-backed in production, `MetricsProvider` belongs to whatever
//! system owns sales data.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod disputes;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod plan_store;

// =============================================================================
// Re-exports
// =============================================================================

pub use disputes::DisputeService;
pub use engine::{
    CalculationEngine, CalculationFailure, CalculationJobResult, CalculationRequest,
};
pub use error::{EngineError, EngineResult};
pub use metrics::{MetricsError, MetricsProvider};
pub use plan_store::{DbPlanStore, PlanStore};
