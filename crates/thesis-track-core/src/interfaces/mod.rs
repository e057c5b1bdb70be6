// crates/thesis-track-core/src/interfaces/mod.rs
// ============================================================================
// Module: Thesis Track Interfaces
// Description: Backend-agnostic interfaces for storage, auth, and artifacts.
// Purpose: Define the contract surfaces consumed by the lifecycle controller.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the core integrates with its collaborators without
//! embedding backend details. The controller treats each entity family as one
//! named collection of ordered records; backends may persist them however
//! they like, but the batch [`Storage::commit`] must be all-or-nothing so a
//! failed write never leaves collections mutually inconsistent.
//!
//! Authentication and file handling stay outside the core: the
//! [`AuthProvider`] only reports a caller's role, and the
//! [`ArtifactRepository`] turns a source file reference into a stored
//! relative path. The core never hashes credentials or reads file contents.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Collections
// ============================================================================

/// Named record collections the core persists.
///
/// # Invariants
/// - Variants are stable; collection names are part of the storage contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Enrollment requests.
    EnrollmentRequests,
    /// Defense requests.
    DefenseRequests,
    /// Thesis course slots.
    CourseSlots,
    /// Internal-judge (professor) grading capacities.
    InternalJudgeCapacities,
    /// External-judge grading capacities.
    ExternalJudgeCapacities,
    /// Archived (closed) theses.
    ArchivedTheses,
}

impl Collection {
    /// All collections, in commit order.
    pub const ALL: [Self; 6] = [
        Self::EnrollmentRequests,
        Self::DefenseRequests,
        Self::CourseSlots,
        Self::InternalJudgeCapacities,
        Self::ExternalJudgeCapacities,
        Self::ArchivedTheses,
    ];

    /// Returns the stable collection name used by storage backends.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::EnrollmentRequests => "enrollment_requests",
            Self::DefenseRequests => "defense_requests",
            Self::CourseSlots => "course_slots",
            Self::InternalJudgeCapacities => "internal_judge_capacities",
            Self::ExternalJudgeCapacities => "external_judge_capacities",
            Self::ArchivedTheses => "archived_theses",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// SECTION: Storage
// ============================================================================

/// Storage errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// Backend I/O failed.
    #[error("storage io error: {0}")]
    Io(String),
    /// Stored data could not be decoded into the expected record shape.
    #[error("storage corruption in {collection}: {detail}")]
    Corrupt {
        /// Collection containing the offending record.
        collection: &'static str,
        /// Decoding failure detail.
        detail: String,
    },
    /// A record could not be encoded for storage.
    #[error("storage encoding error: {0}")]
    Encode(String),
    /// Backend reported an error.
    #[error("storage error: {0}")]
    Backend(String),
}

/// Ordered-collection storage backend.
///
/// Implementations must preserve record order within a collection and return
/// an empty sequence for collections that have never been saved.
pub trait Storage {
    /// Loads all records of a collection, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when loading fails.
    fn load(&self, collection: Collection) -> Result<Vec<Value>, PersistenceError>;

    /// Replaces the records of a collection.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when saving fails.
    fn save(&self, collection: Collection, records: &[Value]) -> Result<(), PersistenceError>;

    /// Replaces several collections as one all-or-nothing commit.
    ///
    /// The default implementation saves sequentially and is *not* atomic;
    /// durable backends must override it so that a failure leaves every
    /// collection at its pre-commit contents.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when any save fails.
    fn commit(&self, batch: &[(Collection, Vec<Value>)]) -> Result<(), PersistenceError> {
        for (collection, records) in batch {
            self.save(*collection, records)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Auth Provider
// ============================================================================

/// Closed set of user roles known to the workflow.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A student who enrolls and defends.
    Student,
    /// A professor: course owner, advisor, or internal judge.
    Professor,
    /// An external judge drawn from the external capacity pool.
    ExternalJudge,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Student => "student",
            Self::Professor => "professor",
            Self::ExternalJudge => "external_judge",
        };
        f.write_str(label)
    }
}

/// Auth provider errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The auth backend reported an error.
    #[error("auth provider error: {0}")]
    Provider(String),
}

/// Supplies the role registered for a user identifier.
///
/// The core performs authorization checks (advisor-only decisions,
/// assigned-judge-only grading) against the roles this trait reports; it
/// never verifies credentials itself.
pub trait AuthProvider {
    /// Returns the role of the given user, or `None` when unknown.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the lookup fails.
    fn role_of(&self, user_id: &str) -> Result<Option<Role>, AuthError>;
}

// ============================================================================
// SECTION: Artifact Repository
// ============================================================================

/// Artifact repository errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    /// The source reference was rejected (missing, wrong type, unreadable).
    #[error("artifact rejected: {0}")]
    Rejected(String),
    /// The repository failed to store the artifact.
    #[error("artifact store error: {0}")]
    Store(String),
}

/// Stores defense artifacts (thesis PDF, page images) outside the core.
///
/// The core records only the returned relative path string on the defense
/// request, never file contents.
pub trait ArtifactRepository {
    /// Stores the artifact named by `source_ref` and returns its stored
    /// relative path.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] when the source is rejected or storing fails.
    fn store(&self, source_ref: &str) -> Result<String, ArtifactError>;
}
