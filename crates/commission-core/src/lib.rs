//! # commission-core: Pure Business Logic for the Commission Engine
//!
//! This crate is the **heart** of the commission calculation engine. It
//! contains all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Commission Engine Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Presentation Layer (dashboards)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/commission-api                          │   │
//! │  │    calculate, list calculations/plans, dispute lifecycle        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    commission-engine                            │   │
//! │  │    plan/metrics snapshots, batch jobs, disputes, ledger         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ commission-core (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐ ┌────────┐ │   │
//! │  │   │  types   │ │ resolver │ │  bonus  │ │ ledger │ │dispute │ │   │
//! │  │   │  money   │ │  tiers   │ │thresholds│ │ append │ │  FSM   │ │   │
//! │  │   └──────────┘ └──────────┘ └─────────┘ └────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CommissionPlan, CommissionCalculation, Dispute, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`resolver`] - Tiered rate resolution (flat-tier method)
//! - [`bonus`] - Threshold bonus evaluation
//! - [`ledger`] - Append-only adjustment arithmetic and chargeback windows
//! - [`dispute`] - Dispute state machine
//! - [`validation`] - Plan and input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every calculation is a deterministic function of
//!    (plan snapshot, metrics snapshot) - same input, byte-identical output
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here;
//!    even the clock is always passed in as a parameter
//! 3. **Integer Money**: all monetary values are in cents (i64), rates in
//!    basis points (u32)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use commission_core::money::Money;
//! use commission_core::types::CommissionRate;
//!
//! // Create money from cents (never from floats!)
//! let sales = Money::from_cents(1_200_000); // $12,000.00
//!
//! // Flat-tier method: the matched tier's rate applies to the whole amount
//! let rate = CommissionRate::from_bps(700); // 7%
//! assert_eq!(sales.apply_rate(rate).cents(), 84_000); // $840.00
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bonus;
pub mod dispute;
pub mod error;
pub mod ledger;
pub mod money;
pub mod resolver;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use commission_core::Money` instead of
// `use commission_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tenant ID (single-tenant runtime with multi-tenant schema)
///
/// The dealer-management suite is single-tenant per deployment today, but
/// the schema keys every record by tenant for hosted multi-tenancy later.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Identity recorded as `calculated_by` for batch runs not attributable to
/// a specific administrator.
pub const SYSTEM_ACTOR: &str = "system";
