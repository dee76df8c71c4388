//! # commission-db: Database Layer for the Commission Engine
//!
//! This crate provides database access for the commission calculation
//! engine. It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Commission Engine Data Flow                         │
//! │                                                                         │
//! │  API Handler / Batch Orchestrator                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   commission-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌──────────────────┐   ┌─────────────┐  │   │
//! │  │   │   Database    │    │   Repositories   │   │ Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                  │   │ (embedded)  │  │   │
//! │  │   │               │    │ PlanRepo         │   │             │  │   │
//! │  │   │ SqlitePool    │◄───│ CalculationRepo  │   │ 001_initial │  │   │
//! │  │   │ WAL, FKs      │    │ DisputeRepo      │   │ _schema.sql │  │   │
//! │  │   └───────────────┘    └──────────────────┘   └─────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (commission.db)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (plan, calculation, dispute)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use commission_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/commission.db")).await?;
//!
//! let plan = db.plans().applicable_for_employee("emp-1", today).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::calculation::CalculationRepository;
pub use repository::dispute::DisputeRepository;
pub use repository::plan::{PlanAssignment, PlanRepository};
