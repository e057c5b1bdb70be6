// crates/thesis-track-core/src/runtime/store.rs
// ============================================================================
// Module: Thesis Track In-Memory Backends
// Description: Reference implementations of the collaborator interfaces.
// Purpose: Deterministic storage, auth, and artifact backends for tests.
// Dependencies: crate::interfaces, serde_json, std::sync
// ============================================================================

//! ## Overview
//! In-memory reference backends. The storage keeps every collection in one
//! map guarded by a single mutex, so the batch commit is naturally
//! all-or-nothing. The auth provider is a static user-to-role map, and the
//! artifact repository records artifacts by file name under a fixed relative
//! prefix without touching the filesystem.
//!
//! Production deployments substitute durable implementations (see the JSON
//! file store crate) behind the same interfaces.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use serde_json::Value;

use crate::interfaces::ArtifactError;
use crate::interfaces::ArtifactRepository;
use crate::interfaces::AuthError;
use crate::interfaces::AuthProvider;
use crate::interfaces::Collection;
use crate::interfaces::PersistenceError;
use crate::interfaces::Role;
use crate::interfaces::Storage;

// ============================================================================
// SECTION: In-Memory Storage
// ============================================================================

/// In-memory storage backend.
///
/// # Invariants
/// - All collections live behind one mutex, so [`Storage::commit`] replaces
///   them under a single critical section and is all-or-nothing.
/// - Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    /// Collections keyed by name, each an ordered record list.
    collections: Arc<Mutex<BTreeMap<Collection, Vec<Value>>>>,
}

impl InMemoryStorage {
    /// Creates an empty storage backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStorage {
    fn load(&self, collection: Collection) -> Result<Vec<Value>, PersistenceError> {
        let guard = self
            .collections
            .lock()
            .map_err(|_| PersistenceError::Backend("storage lock poisoned".to_owned()))?;
        Ok(guard.get(&collection).cloned().unwrap_or_default())
    }

    fn save(&self, collection: Collection, records: &[Value]) -> Result<(), PersistenceError> {
        let mut guard = self
            .collections
            .lock()
            .map_err(|_| PersistenceError::Backend("storage lock poisoned".to_owned()))?;
        guard.insert(collection, records.to_vec());
        Ok(())
    }

    fn commit(&self, batch: &[(Collection, Vec<Value>)]) -> Result<(), PersistenceError> {
        let mut guard = self
            .collections
            .lock()
            .map_err(|_| PersistenceError::Backend("storage lock poisoned".to_owned()))?;
        for (collection, records) in batch {
            guard.insert(*collection, records.clone());
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Map Auth Provider
// ============================================================================

/// Auth provider backed by a static user-to-role map.
#[derive(Debug, Clone, Default)]
pub struct MapAuthProvider {
    /// Registered users and their roles.
    roles: BTreeMap<String, Role>,
}

impl MapAuthProvider {
    /// Creates an empty provider.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            roles: BTreeMap::new(),
        }
    }

    /// Registers a user with a role, replacing any prior registration.
    pub fn register(&mut self, user_id: impl Into<String>, role: Role) {
        self.roles.insert(user_id.into(), role);
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with(mut self, user_id: impl Into<String>, role: Role) -> Self {
        self.register(user_id, role);
        self
    }
}

impl AuthProvider for MapAuthProvider {
    fn role_of(&self, user_id: &str) -> Result<Option<Role>, AuthError> {
        Ok(self.roles.get(user_id).copied())
    }
}

// ============================================================================
// SECTION: In-Memory Artifact Repository
// ============================================================================

/// Relative prefix under which stored artifacts are addressed.
const ARTIFACT_PREFIX: &str = "documents";

/// Artifact repository that stores by file name without filesystem access.
///
/// The stored path is `documents/<file_name>`, where the file name is the
/// final component of the source reference. Blank references are rejected.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArtifactRepository {
    /// Stored paths, in store order.
    stored: Arc<Mutex<Vec<String>>>,
}

impl InMemoryArtifactRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the paths stored so far, in store order.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Store`] when the internal lock is poisoned.
    pub fn stored_paths(&self) -> Result<Vec<String>, ArtifactError> {
        let guard = self
            .stored
            .lock()
            .map_err(|_| ArtifactError::Store("artifact lock poisoned".to_owned()))?;
        Ok(guard.clone())
    }
}

impl ArtifactRepository for InMemoryArtifactRepository {
    fn store(&self, source_ref: &str) -> Result<String, ArtifactError> {
        let file_name = source_ref
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(source_ref)
            .trim();
        if file_name.is_empty() {
            return Err(ArtifactError::Rejected(format!(
                "source reference has no file name: {source_ref:?}"
            )));
        }
        let path = format!("{ARTIFACT_PREFIX}/{file_name}");
        let mut guard = self
            .stored
            .lock()
            .map_err(|_| ArtifactError::Store("artifact lock poisoned".to_owned()))?;
        guard.push(path.clone());
        Ok(path)
    }
}
