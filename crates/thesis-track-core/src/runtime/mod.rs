// crates/thesis-track-core/src/runtime/mod.rs
// ============================================================================
// Module: Thesis Track Runtime
// Description: Ledger, capacity pool, staging, controller, and backends.
// Purpose: Execute workflow commands atomically over pluggable storage.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The runtime turns the pure core model into an executable workflow. The
//! [`ledger::RequestLedger`] applies record transitions, the
//! [`capacity::CapacityPool`] moves reservable units, the
//! [`staging::Transaction`] keeps both staged until one batch commit, and
//! the [`controller::LifecycleController`] ties them together under a
//! per-command lock. Reference in-memory backends live in [`store`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod capacity;
pub mod controller;
pub mod ledger;
pub mod staging;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use capacity::CapacityError;
pub use capacity::CapacityPool;
pub use capacity::ResourceKey;
pub use controller::CommandError;
pub use controller::DefenseDecision;
pub use controller::DefenseSubmission;
pub use controller::EnrollmentDecision;
pub use controller::GradeRecorded;
pub use controller::GraderRef;
pub use controller::LifecycleController;
pub use controller::RequestStatus;
pub use ledger::EligibilityError;
pub use ledger::GradeOutcome;
pub use ledger::JudgePanel;
pub use ledger::LedgerError;
pub use ledger::RequestLedger;
pub use staging::Transaction;
pub use store::InMemoryArtifactRepository;
pub use store::InMemoryStorage;
pub use store::MapAuthProvider;
