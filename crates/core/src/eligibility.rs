//! Recipient records and the update-eligibility check.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Which feeds a recipient opted into. Missing flags mean "subscribed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriptions {
    pub epic: bool,
    pub steam: bool,
}

impl Default for Subscriptions {
    fn default() -> Self {
        Self {
            epic: true,
            steam: true,
        }
    }
}

impl Subscriptions {
    pub fn any(&self) -> bool {
        self.epic || self.steam
    }
}

/// A registered webhook recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientRecord {
    pub id: String,
    pub url: String,
    /// `None` means the recipient is always eligible.
    pub next_eligible_update: Option<Timestamp>,
    pub subscriptions: Subscriptions,
}

impl RecipientRecord {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        next_eligible_update: Option<Timestamp>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            next_eligible_update,
            subscriptions: Subscriptions::default(),
        }
    }

    /// Due when subscribed and the next eligible update is absent or reached.
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.subscriptions.any() && self.next_eligible_update.is_none_or(|next| next <= now)
    }
}

/// Return the recipients due for an update at `now`, in snapshot order.
///
/// An empty snapshot is reported as [`CoreError::DataUnavailable`] so callers
/// cannot mistake a missing store for "nobody is due".
pub fn evaluate(
    recipients: &[RecipientRecord],
    now: Timestamp,
) -> Result<Vec<RecipientRecord>, CoreError> {
    if recipients.is_empty() {
        return Err(CoreError::DataUnavailable(
            "recipient snapshot is empty".to_string(),
        ));
    }

    Ok(recipients
        .iter()
        .filter(|recipient| recipient.is_due(now))
        .cloned()
        .collect())
}
