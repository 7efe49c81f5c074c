//! Typed view over the raw recipient collection.

use freebie_core::{apply_shared_tracking, RecipientRecord, TrackingRecord, TrackingScope};

use crate::error::StoreError;
use crate::models::{RecipientDocument, TrackingDocument};
use crate::{Documents, RecipientStore};

/// Recipients and shared tracking state read at the start of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub recipients: Vec<RecipientRecord>,
    pub tracking: Option<TrackingRecord>,
}

impl Snapshot {
    /// Split raw documents into recipients and the tracking record.
    ///
    /// Documents that are not recipients (no webhook URL) or that fail to
    /// decode are skipped with a warning.
    pub fn from_documents(documents: Documents, scope: &TrackingScope) -> Self {
        let tracking_id = scope.document_id();
        let mut snapshot = Self::default();

        for (id, raw) in documents {
            if Some(id.as_str()) == tracking_id {
                match serde_json::from_value::<TrackingDocument>(raw) {
                    Ok(doc) => snapshot.tracking = Some(doc.into()),
                    Err(e) => {
                        tracing::warn!(id, error = %e, "Ignoring malformed tracking document")
                    }
                }
                continue;
            }

            match serde_json::from_value::<RecipientDocument>(raw) {
                Ok(doc) => match doc.into_record(&id) {
                    Some(record) => snapshot.recipients.push(record),
                    None => tracing::debug!(id, "Document has no webhook URL, skipping"),
                },
                Err(e) => tracing::warn!(id, error = %e, "Skipping malformed recipient document"),
            }
        }

        snapshot
    }

    /// Recipients with the tracking scope applied, ready for evaluation.
    pub fn effective_recipients(&self, scope: &TrackingScope) -> Vec<RecipientRecord> {
        match scope {
            TrackingScope::Shared { .. } => {
                apply_shared_tracking(self.recipients.clone(), self.tracking.as_ref())
            }
            TrackingScope::PerRecipient => self.recipients.clone(),
        }
    }
}

/// Read the whole collection and decode it.
pub async fn load_snapshot(
    store: &dyn RecipientStore,
    scope: &TrackingScope,
) -> Result<Snapshot, StoreError> {
    let documents = store.load_documents().await?;
    let total = documents.len();
    let snapshot = Snapshot::from_documents(documents, scope);

    tracing::info!(
        store = %store.describe(),
        documents = total,
        recipients = snapshot.recipients.len(),
        has_tracking = snapshot.tracking.is_some(),
        "Recipient snapshot loaded"
    );
    Ok(snapshot)
}
