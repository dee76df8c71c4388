//! # Repository Layer
//!
//! Data access objects for each aggregate. Each repository owns a clone of
//! the connection pool and exposes typed async methods; no SQL leaks above
//! this layer.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Repositories                          │
//! │                                                           │
//! │  PlanRepository        ─► commission_plans               │
//! │                           plan_assignments               │
//! │  CalculationRepository ─► commission_calculations        │
//! │                           commission_adjustments (ledger)│
//! │  DisputeRepository     ─► disputes                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Nested collections (tiers, metrics, details, bonuses) are persisted as
//! JSON documents: written whole at snapshot time, read back whole.

pub mod calculation;
pub mod dispute;
pub mod plan;

pub use calculation::CalculationRepository;
pub use dispute::DisputeRepository;
pub use plan::PlanRepository;
