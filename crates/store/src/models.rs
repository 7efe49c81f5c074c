//! Document shapes stored in the recipient collection.
//!
//! Recipient documents look like
//! `{"subscription": {"epic": true, "steam": false}, "webhook": {"url": "...", "updateAt": "..."}}`
//! and the shared tracking document like
//! `{"nextEligibleUpdate": "...", "lastUpdated": "..."}`.

use chrono::SecondsFormat;
use freebie_core::types::{parse_timestamp, Timestamp};
use freebie_core::{RecipientRecord, Subscriptions, TrackingRecord};
use serde::{Deserialize, Deserializer};

/// Field path of a recipient's next eligible update.
pub const FIELD_WEBHOOK_UPDATE_AT: &str = "webhook.updateAt";

/// Field paths of the shared tracking document.
pub const FIELD_NEXT_ELIGIBLE_UPDATE: &str = "nextEligibleUpdate";
pub const FIELD_LAST_UPDATED: &str = "lastUpdated";

/// Accept RFC 3339 strings, treating `null`, `""` and unparsable values as absent.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn subscribed() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Recipient document
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RecipientDocument {
    #[serde(default)]
    pub subscription: Option<SubscriptionDocument>,
    #[serde(default)]
    pub webhook: Option<WebhookDocument>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionDocument {
    #[serde(default = "subscribed")]
    pub epic: bool,
    #[serde(default = "subscribed")]
    pub steam: bool,
}

#[derive(Debug, Deserialize)]
pub struct WebhookDocument {
    #[serde(default)]
    pub url: String,
    #[serde(rename = "updateAt", default, deserialize_with = "lenient_timestamp")]
    pub update_at: Option<Timestamp>,
}

impl RecipientDocument {
    /// Convert into a recipient, or `None` when the document has no webhook URL.
    pub fn into_record(self, id: &str) -> Option<RecipientRecord> {
        let webhook = self.webhook.filter(|w| !w.url.trim().is_empty())?;
        let subscriptions = self
            .subscription
            .map(|s| Subscriptions {
                epic: s.epic,
                steam: s.steam,
            })
            .unwrap_or_default();

        Some(RecipientRecord {
            id: id.to_string(),
            url: webhook.url,
            next_eligible_update: webhook.update_at,
            subscriptions,
        })
    }
}

// ---------------------------------------------------------------------------
// Tracking document
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingDocument {
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub next_eligible_update: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_updated: Option<Timestamp>,
}

impl From<TrackingDocument> for TrackingRecord {
    fn from(doc: TrackingDocument) -> Self {
        Self {
            next_eligible_update: doc.next_eligible_update,
            last_updated: doc.last_updated,
        }
    }
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// A value written by a partial update.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    Timestamp(Timestamp),
    String(String),
    Bool(bool),
}

impl PatchValue {
    /// Plain JSON form, as stored in the local snapshot file.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Timestamp(ts) => {
                serde_json::Value::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Bool(b) => serde_json::Value::Bool(*b),
        }
    }
}

/// Partial update of one document: dotted field paths and their new values.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPatch {
    pub fields: Vec<(String, PatchValue)>,
    /// When set, updating a missing document is [`StoreError::NotFound`]
    /// instead of creating it.
    ///
    /// [`StoreError::NotFound`]: crate::StoreError::NotFound
    pub must_exist: bool,
}

impl DocumentPatch {
    /// A patch against an existing document.
    pub fn existing() -> Self {
        Self {
            fields: Vec::new(),
            must_exist: true,
        }
    }

    /// A patch that creates the document when it is missing.
    pub fn upsert() -> Self {
        Self {
            fields: Vec::new(),
            must_exist: false,
        }
    }

    pub fn set(mut self, path: impl Into<String>, value: PatchValue) -> Self {
        self.fields.push((path.into(), value));
        self
    }

    pub fn field_paths(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(path, _)| path.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn recipient_document_into_record() {
        let doc: RecipientDocument = serde_json::from_value(json!({
            "id": "guild-1",
            "subscription": {"epic": true, "steam": false},
            "webhook": {"url": "https://hooks/1", "updateAt": "2024-06-01T00:00:00Z"}
        }))
        .unwrap();
        let record = doc.into_record("guild-1").unwrap();
        assert_eq!(record.url, "https://hooks/1");
        assert_eq!(
            record.next_eligible_update,
            Some(chrono::Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
        );
        assert!(record.subscriptions.epic);
        assert!(!record.subscriptions.steam);
    }

    #[test]
    fn blank_update_at_is_absent() {
        for raw in [json!(""), json!(null), json!("not a date")] {
            let doc: RecipientDocument = serde_json::from_value(json!({
                "webhook": {"url": "https://hooks/1", "updateAt": raw}
            }))
            .unwrap();
            assert_eq!(doc.into_record("x").unwrap().next_eligible_update, None);
        }
    }

    #[test]
    fn missing_subscription_defaults_to_subscribed() {
        let doc: RecipientDocument =
            serde_json::from_value(json!({"webhook": {"url": "https://hooks/1"}})).unwrap();
        assert!(doc.into_record("x").unwrap().subscriptions.any());
    }

    #[test]
    fn document_without_url_is_not_a_recipient() {
        let doc: RecipientDocument =
            serde_json::from_value(json!({"webhook": {"url": "  "}})).unwrap();
        assert!(doc.into_record("x").is_none());

        let doc: RecipientDocument = serde_json::from_value(json!({"note": "hi"})).unwrap();
        assert!(doc.into_record("x").is_none());
    }

    #[test]
    fn patch_builder_collects_paths() {
        let ts = chrono::Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let patch = DocumentPatch::upsert()
            .set(FIELD_NEXT_ELIGIBLE_UPDATE, PatchValue::Timestamp(ts))
            .set(FIELD_LAST_UPDATED, PatchValue::Timestamp(ts));
        assert!(!patch.must_exist);
        let paths: Vec<&str> = patch.field_paths().collect();
        assert_eq!(paths, [FIELD_NEXT_ELIGIBLE_UPDATE, FIELD_LAST_UPDATED]);
        assert_eq!(
            PatchValue::Timestamp(ts).to_json(),
            json!("2024-06-01T00:00:00Z")
        );
    }
}
