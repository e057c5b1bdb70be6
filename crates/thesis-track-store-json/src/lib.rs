// crates/thesis-track-store-json/src/lib.rs
// ============================================================================
// Module: Thesis Track JSON Store Library
// Description: Durable Storage backend backed by a single JSON document.
// Purpose: Expose the JSON file store and its configuration.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! Durable [`thesis_track_core::Storage`] implementation that keeps every
//! collection in one JSON document on disk and replaces it atomically on
//! commit. Because all collections share a single file, a batch commit is
//! inherently all-or-nothing: a failed write leaves the previous document
//! intact and the collections mutually consistent.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::JsonStore;
pub use store::JsonStoreConfig;
pub use store::JsonStoreError;
