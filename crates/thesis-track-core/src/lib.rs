// crates/thesis-track-core/src/lib.rs
// ============================================================================
// Module: Thesis Track Core Library
// Description: Public API surface for the Thesis Track core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Thesis Track core coordinates the supervised thesis workflow: enrollment
//! into a course slot, defense request and approval, dual-judge grading, and
//! the archived final result, with every finite resource tracked by a
//! capacity ledger. It is backend-agnostic and integrates through explicit
//! interfaces rather than embedding a storage engine or user frontend.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ArtifactError;
pub use interfaces::ArtifactRepository;
pub use interfaces::AuthError;
pub use interfaces::AuthProvider;
pub use interfaces::Collection;
pub use interfaces::PersistenceError;
pub use interfaces::Role;
pub use interfaces::Storage;
pub use runtime::CapacityError;
pub use runtime::CapacityPool;
pub use runtime::CommandError;
pub use runtime::DefenseDecision;
pub use runtime::DefenseSubmission;
pub use runtime::EligibilityError;
pub use runtime::EnrollmentDecision;
pub use runtime::GradeOutcome;
pub use runtime::GradeRecorded;
pub use runtime::GraderRef;
pub use runtime::InMemoryArtifactRepository;
pub use runtime::InMemoryStorage;
pub use runtime::JudgePanel;
pub use runtime::LedgerError;
pub use runtime::LifecycleController;
pub use runtime::MapAuthProvider;
pub use runtime::RequestLedger;
pub use runtime::RequestStatus;
pub use runtime::ResourceKey;
pub use runtime::Transaction;
