//! Local JSON snapshot backend.
//!
//! The file holds the whole collection as `{"<id>": {document}}`. Updates
//! rewrite the file; there is no locking since only one run executes at a time.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::models::DocumentPatch;
use crate::{Documents, RecipientStore};

/// Recipient store backed by a JSON file on disk.
pub struct LocalFileStore {
    path: PathBuf,
}

impl LocalFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read(&self) -> Result<Documents, StoreError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[async_trait]
impl RecipientStore for LocalFileStore {
    async fn load_documents(&self) -> Result<Documents, StoreError> {
        self.read().await
    }

    async fn update_document(
        &self,
        document_id: &str,
        patch: &DocumentPatch,
    ) -> Result<(), StoreError> {
        let mut documents = self.read().await?;

        if !documents.contains_key(document_id) {
            if patch.must_exist {
                return Err(StoreError::NotFound(document_id.to_string()));
            }
            documents.insert(document_id.to_string(), Value::Object(Map::new()));
        }
        let Some(document) = documents.get_mut(document_id) else {
            return Err(StoreError::NotFound(document_id.to_string()));
        };

        for (path, value) in &patch.fields {
            set_path(document, path, value.to_json())?;
        }

        let serialized = serde_json::to_string_pretty(&documents)?;
        tokio::fs::write(&self.path, serialized).await?;

        tracing::debug!(document_id, path = %self.path.display(), "Local document updated");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Set a dotted field path inside a JSON object, creating intermediate maps.
fn set_path(document: &mut Value, path: &str, value: Value) -> Result<(), StoreError> {
    let mut segments = path.split('.').peekable();
    let mut current = document;

    while let Some(segment) = segments.next() {
        let Value::Object(map) = current else {
            return Err(StoreError::Malformed(format!(
                "cannot set '{path}': '{segment}' is not inside an object"
            )));
        };

        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return Ok(());
        }

        let next = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if next.is_null() {
            *next = Value::Object(Map::new());
        }
        current = next;
    }

    Ok(())
}
