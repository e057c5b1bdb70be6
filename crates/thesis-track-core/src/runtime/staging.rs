// crates/thesis-track-core/src/runtime/staging.rs
// ============================================================================
// Module: Thesis Track Staging
// Description: Typed load-mutate-commit transaction over a storage backend.
// Purpose: Keep multi-collection mutations all-or-nothing at the core level.
// Dependencies: crate::core, crate::interfaces, crate::runtime, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Transaction`] loads every collection into typed staged state (the
//! request ledger and the capacity pool), lets the controller mutate that
//! state in memory, and writes everything back through one batch
//! [`Storage::commit`]. Nothing reaches the backend until commit, so a
//! command that fails mid-validation leaves storage untouched, and a backend
//! with an atomic commit makes the whole command all-or-nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::interfaces::Collection;
use crate::interfaces::PersistenceError;
use crate::interfaces::Storage;
use crate::runtime::capacity::CapacityPool;
use crate::runtime::ledger::RequestLedger;

// ============================================================================
// SECTION: Transaction
// ============================================================================

/// In-memory staged state for one workflow command.
///
/// # Invariants
/// - Staged state is a faithful decode of storage at [`Transaction::begin`].
/// - Storage is only written by [`Transaction::commit`], and in one batch.
#[derive(Debug)]
pub struct Transaction<'a, S: Storage + ?Sized> {
    /// Backend the staged state was loaded from and will be committed to.
    storage: &'a S,
    /// Staged workflow records.
    ledger: RequestLedger,
    /// Staged capacity counters.
    pool: CapacityPool,
}

impl<'a, S: Storage + ?Sized> Transaction<'a, S> {
    /// Loads all collections from the backend into staged state.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when loading fails or a stored record
    /// does not decode into its expected shape.
    pub fn begin(storage: &'a S) -> Result<Self, PersistenceError> {
        let enrollments = load_typed(storage, Collection::EnrollmentRequests)?;
        let defenses = load_typed(storage, Collection::DefenseRequests)?;
        let archive = load_typed(storage, Collection::ArchivedTheses)?;
        let course_slots = load_typed(storage, Collection::CourseSlots)?;
        let internal = load_typed(storage, Collection::InternalJudgeCapacities)?;
        let external = load_typed(storage, Collection::ExternalJudgeCapacities)?;
        Ok(Self {
            storage,
            ledger: RequestLedger::new(enrollments, defenses, archive),
            pool: CapacityPool::new(course_slots, internal, external),
        })
    }

    /// Returns the staged request ledger.
    #[must_use]
    pub const fn ledger(&self) -> &RequestLedger {
        &self.ledger
    }

    /// Returns the staged request ledger mutably.
    pub const fn ledger_mut(&mut self) -> &mut RequestLedger {
        &mut self.ledger
    }

    /// Returns the staged capacity pool.
    #[must_use]
    pub const fn pool(&self) -> &CapacityPool {
        &self.pool
    }

    /// Returns the staged capacity pool mutably.
    pub const fn pool_mut(&mut self) -> &mut CapacityPool {
        &mut self.pool
    }

    /// Writes the staged state back as one batch commit.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when encoding or the backend commit
    /// fails. On failure an atomic backend retains its pre-commit contents.
    pub fn commit(self) -> Result<(), PersistenceError> {
        let batch = vec![
            (Collection::EnrollmentRequests, encode_all(self.ledger.enrollments())?),
            (Collection::DefenseRequests, encode_all(self.ledger.defenses())?),
            (Collection::CourseSlots, encode_all(self.pool.course_slots())?),
            (Collection::InternalJudgeCapacities, encode_all(self.pool.internal_capacities())?),
            (Collection::ExternalJudgeCapacities, encode_all(self.pool.external_capacities())?),
            (Collection::ArchivedTheses, encode_all(self.ledger.archive())?),
        ];
        self.storage.commit(&batch)
    }
}

// ============================================================================
// SECTION: Codec Helpers
// ============================================================================

/// Loads and decodes all records of a collection.
fn load_typed<S, T>(storage: &S, collection: Collection) -> Result<Vec<T>, PersistenceError>
where
    S: Storage + ?Sized,
    T: DeserializeOwned,
{
    storage
        .load(collection)?
        .into_iter()
        .map(|value| {
            serde_json::from_value(value).map_err(|err| PersistenceError::Corrupt {
                collection: collection.name(),
                detail: err.to_string(),
            })
        })
        .collect()
}

/// Encodes records into storage values, preserving order.
fn encode_all<T: Serialize>(records: &[T]) -> Result<Vec<Value>, PersistenceError> {
    records
        .iter()
        .map(|record| {
            serde_json::to_value(record).map_err(|err| PersistenceError::Encode(err.to_string()))
        })
        .collect()
}
