// crates/thesis-track-store-json/src/store.rs
// ============================================================================
// Module: JSON File Store
// Description: Durable Storage backed by one JSON document on disk.
// Purpose: Persist all collections with atomic replace-on-commit semantics.
// Dependencies: thesis-track-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The store keeps the six workflow collections inside a single JSON object
//! keyed by collection name. Every write serializes the whole document to a
//! sibling temp file, syncs it, and renames it over the data file, so readers
//! never observe a torn document and a batch commit either lands completely
//! or not at all. File contents are untrusted; loads fail closed when the
//! document does not parse or a collection is not an array.
//!
//! Access is serialized through one internal lock shared by clones, matching
//! the single-writer discipline the lifecycle controller already imposes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use serde_json::Map;
use serde_json::Value;
use thesis_track_core::Collection;
use thesis_track_core::PersistenceError;
use thesis_track_core::Storage;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Suffix of the temp file a write stages before the atomic rename.
const TEMP_SUFFIX: &str = ".tmp";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// JSON store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum JsonStoreError {
    /// Reading or writing the data file failed.
    #[error("json store io error at {path}: {source}")]
    Io {
        /// File the operation touched.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The data file does not contain a JSON object.
    #[error("json store document at {path} is not a JSON object")]
    NotAnObject {
        /// Offending data file.
        path: PathBuf,
    },
    /// A collection entry is not a JSON array.
    #[error("collection {collection} in {path} is not a JSON array")]
    NotAnArray {
        /// Offending collection name.
        collection: &'static str,
        /// Offending data file.
        path: PathBuf,
    },
    /// The data file does not parse as JSON.
    #[error("json store document at {path} failed to parse: {detail}")]
    Parse {
        /// Offending data file.
        path: PathBuf,
        /// Parse failure detail.
        detail: String,
    },
    /// Document serialization failed.
    #[error("json store encoding failed: {0}")]
    Encode(String),
    /// The internal file lock was poisoned by a panicking thread.
    #[error("json store lock poisoned")]
    LockPoisoned,
}

impl From<JsonStoreError> for PersistenceError {
    fn from(err: JsonStoreError) -> Self {
        match err {
            JsonStoreError::Io {
                ..
            } => Self::Io(err.to_string()),
            JsonStoreError::NotAnObject {
                ..
            }
            | JsonStoreError::Parse {
                ..
            } => Self::Corrupt {
                collection: "document",
                detail: err.to_string(),
            },
            JsonStoreError::NotAnArray {
                collection, ..
            } => Self::Corrupt {
                collection,
                detail: err.to_string(),
            },
            JsonStoreError::Encode(detail) => Self::Encode(detail),
            JsonStoreError::LockPoisoned => Self::Backend(err.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// JSON store configuration.
///
/// # Invariants
/// - `data_path` names the single document file; its parent directory must
///   exist before the first write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonStoreConfig {
    /// Path of the JSON document file.
    pub data_path: PathBuf,
    /// Whether to write the document pretty-printed.
    pub pretty: bool,
}

impl JsonStoreConfig {
    /// Creates a configuration with pretty-printed output.
    #[must_use]
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            pretty: true,
        }
    }
}

// ============================================================================
// SECTION: JSON Store
// ============================================================================

/// Durable storage backend over one JSON document.
///
/// # Invariants
/// - All writes replace the document via temp-file-plus-rename, so the file
///   on disk is always a complete document.
/// - Clones share the same lock and data file.
#[derive(Debug, Clone)]
pub struct JsonStore {
    /// Store configuration.
    config: JsonStoreConfig,
    /// Serializes file access across clones.
    file_lock: Arc<Mutex<()>>,
}

impl JsonStore {
    /// Opens a store over the configured data file.
    ///
    /// The file is created on the first write; a missing file reads as a
    /// document with every collection empty.
    #[must_use]
    pub fn open(config: JsonStoreConfig) -> Self {
        Self {
            config,
            file_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the path of the data file.
    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.config.data_path
    }

    /// Reads and parses the document, treating a missing file as empty.
    fn read_document(&self) -> Result<Map<String, Value>, JsonStoreError> {
        let path = &self.config.data_path;
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Map::new());
            }
            Err(err) => {
                return Err(JsonStoreError::Io {
                    path: path.clone(),
                    source: err,
                });
            }
        };
        let value: Value =
            serde_json::from_slice(&raw).map_err(|err| JsonStoreError::Parse {
                path: path.clone(),
                detail: err.to_string(),
            })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(JsonStoreError::NotAnObject {
                path: path.clone(),
            }),
        }
    }

    /// Serializes the document and replaces the data file atomically.
    fn write_document(&self, document: &Map<String, Value>) -> Result<(), JsonStoreError> {
        let path = &self.config.data_path;
        let value = Value::Object(document.clone());
        let encoded = if self.config.pretty {
            serde_json::to_vec_pretty(&value)
        } else {
            serde_json::to_vec(&value)
        }
        .map_err(|err| JsonStoreError::Encode(err.to_string()))?;

        let mut temp_path = path.as_os_str().to_owned();
        temp_path.push(TEMP_SUFFIX);
        let temp_path = PathBuf::from(temp_path);

        let io_err = |source: std::io::Error, at: &Path| JsonStoreError::Io {
            path: at.to_path_buf(),
            source,
        };
        let mut file = fs::File::create(&temp_path).map_err(|e| io_err(e, &temp_path))?;
        file.write_all(&encoded).map_err(|e| io_err(e, &temp_path))?;
        file.sync_all().map_err(|e| io_err(e, &temp_path))?;
        drop(file);
        fs::rename(&temp_path, path).map_err(|e| io_err(e, path))?;
        Ok(())
    }

    /// Extracts one collection's records from a parsed document.
    fn records_of(
        &self,
        document: &Map<String, Value>,
        collection: Collection,
    ) -> Result<Vec<Value>, JsonStoreError> {
        match document.get(collection.name()) {
            None => Ok(Vec::new()),
            Some(Value::Array(records)) => Ok(records.clone()),
            Some(_) => Err(JsonStoreError::NotAnArray {
                collection: collection.name(),
                path: self.config.data_path.clone(),
            }),
        }
    }

    /// Acquires the file lock.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, JsonStoreError> {
        self.file_lock.lock().map_err(|_| JsonStoreError::LockPoisoned)
    }
}

impl Storage for JsonStore {
    fn load(&self, collection: Collection) -> Result<Vec<Value>, PersistenceError> {
        let _guard = self.lock()?;
        let document = self.read_document()?;
        Ok(self.records_of(&document, collection)?)
    }

    fn save(&self, collection: Collection, records: &[Value]) -> Result<(), PersistenceError> {
        let _guard = self.lock()?;
        let mut document = self.read_document()?;
        document.insert(collection.name().to_owned(), Value::Array(records.to_vec()));
        Ok(self.write_document(&document)?)
    }

    fn commit(&self, batch: &[(Collection, Vec<Value>)]) -> Result<(), PersistenceError> {
        let _guard = self.lock()?;
        let mut document = self.read_document()?;
        for (collection, records) in batch {
            document.insert(collection.name().to_owned(), Value::Array(records.clone()));
        }
        // One rename lands every collection or none of them.
        Ok(self.write_document(&document)?)
    }
}
