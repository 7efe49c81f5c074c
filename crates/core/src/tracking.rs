//! Delivery tracking scope and the shared tracking record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::eligibility::RecipientRecord;
use crate::error::CoreError;
use crate::types::Timestamp;

/// Default document id of the shared tracking record.
pub const DEFAULT_TRACKING_DOCUMENT: &str = "timestamp";

/// Where the next eligible update is recorded after a dispatch pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingScope {
    /// One shared document tracks the next storefront promotion window.
    Shared { document_id: String },
    /// Each dispatched recipient document carries its own timestamp.
    PerRecipient,
}

impl TrackingScope {
    /// Parse `shared` / `per-recipient`.
    pub fn parse(raw: &str, document_id: impl Into<String>) -> Result<Self, CoreError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "shared" | "global" => Ok(Self::Shared {
                document_id: document_id.into(),
            }),
            "per-recipient" | "per_recipient" | "recipient" => Ok(Self::PerRecipient),
            other => Err(CoreError::Validation(format!(
                "unknown tracking scope '{other}' (expected 'shared' or 'per-recipient')"
            ))),
        }
    }

    /// The shared tracking document id, if any.
    pub fn document_id(&self) -> Option<&str> {
        match self {
            Self::Shared { document_id } => Some(document_id),
            Self::PerRecipient => None,
        }
    }
}

impl Default for TrackingScope {
    fn default() -> Self {
        Self::Shared {
            document_id: DEFAULT_TRACKING_DOCUMENT.to_string(),
        }
    }
}

impl fmt::Display for TrackingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared { document_id } => write!(f, "shared ({document_id})"),
            Self::PerRecipient => f.write_str("per-recipient"),
        }
    }
}

/// The shared tracking document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub next_eligible_update: Option<Timestamp>,
    pub last_updated: Option<Timestamp>,
}

/// Overlay the shared tracking timestamp onto every recipient.
///
/// When the tracking record holds a timestamp it replaces each recipient's
/// own value, so a recipient added after the last dispatch is also held back
/// until the current promotion window ends. Without one, recipients keep
/// their own values.
pub fn apply_shared_tracking(
    recipients: Vec<RecipientRecord>,
    tracking: Option<&TrackingRecord>,
) -> Vec<RecipientRecord> {
    let Some(next) = tracking.and_then(|t| t.next_eligible_update) else {
        return recipients;
    };

    recipients
        .into_iter()
        .map(|recipient| RecipientRecord {
            next_eligible_update: Some(next),
            ..recipient
        })
        .collect()
}
