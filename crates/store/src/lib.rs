//! Recipient store backends and delivery tracking.
//!
//! The store is a collection of JSON-like documents keyed by recipient id:
//!
//! - [`FirestoreStore`] - Firestore REST API (list + masked PATCH).
//! - [`LocalFileStore`] - a `{id: document}` JSON file, used when no remote
//!   project is configured.
//!
//! [`load_snapshot`] turns the raw documents into typed recipients and
//! [`DeliveryTracker`] writes the next eligible update back after a
//! dispatch pass.

pub mod error;
pub mod firestore;
pub mod local;
pub mod models;
pub mod snapshot;
pub mod tracker;

use std::collections::BTreeMap;

use async_trait::async_trait;

pub use error::StoreError;
pub use firestore::{FirestoreConfig, FirestoreStore};
pub use local::LocalFileStore;
pub use models::{DocumentPatch, PatchValue};
pub use snapshot::{load_snapshot, Snapshot};
pub use tracker::{CommitFailure, CommitOutcome, DeliveryTracker};

/// Raw documents keyed by document id, with backend encoding removed.
pub type Documents = BTreeMap<String, serde_json::Value>;

/// A key-value document collection holding recipient records.
#[async_trait]
pub trait RecipientStore: Send + Sync {
    /// Read every document in the collection.
    async fn load_documents(&self) -> Result<Documents, StoreError>;

    /// Apply a partial field update to one document.
    ///
    /// Returns [`StoreError::NotFound`] when the document does not exist and
    /// the patch requires it to.
    async fn update_document(&self, document_id: &str, patch: &DocumentPatch)
        -> Result<(), StoreError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}
