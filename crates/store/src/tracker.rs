//! Persists the next eligible update after a dispatch pass.
//!
//! The commit is best effort: a failed write is reported in the returned
//! [`CommitOutcome`] and never undoes deliveries that already happened.

use std::fmt;

use freebie_core::{RecipientRecord, Timestamp, TrackingScope};

use crate::error::StoreError;
use crate::models::{
    DocumentPatch, PatchValue, FIELD_LAST_UPDATED, FIELD_NEXT_ELIGIBLE_UPDATE,
    FIELD_WEBHOOK_UPDATE_AT,
};
use crate::RecipientStore;

/// A single document write that failed.
#[derive(Debug)]
pub struct CommitFailure {
    pub document_id: String,
    pub error: StoreError,
}

/// Result of a tracking commit.
#[derive(Debug)]
pub enum CommitOutcome {
    /// No qualifying end date; nothing was written.
    Skipped,
    /// No recipient received the payload; nothing was written.
    NothingDelivered,
    /// Every tracking write succeeded.
    Committed {
        end_date: Timestamp,
        documents: Vec<String>,
    },
    /// At least one tracking write failed.
    PersistenceFailure {
        end_date: Timestamp,
        committed: Vec<String>,
        failures: Vec<CommitFailure>,
    },
}

impl CommitOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::PersistenceFailure { .. })
    }
}

impl fmt::Display for CommitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => f.write_str("skipped (no promotion end date)"),
            Self::NothingDelivered => f.write_str("skipped (no successful deliveries)"),
            Self::Committed {
                end_date,
                documents,
            } => write!(
                f,
                "next update at {} written to {} document(s)",
                end_date.to_rfc3339(),
                documents.len()
            ),
            Self::PersistenceFailure {
                end_date,
                committed,
                failures,
            } => {
                write!(
                    f,
                    "FAILED for {} document(s), {} written (next update {})",
                    failures.len(),
                    committed.len(),
                    end_date.to_rfc3339()
                )?;
                for failure in failures {
                    write!(f, "; {}: {}", failure.document_id, failure.error)?;
                }
                Ok(())
            }
        }
    }
}

/// Writes tracking timestamps according to the configured [`TrackingScope`].
pub struct DeliveryTracker {
    scope: TrackingScope,
}

impl DeliveryTracker {
    pub fn new(scope: TrackingScope) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> &TrackingScope {
        &self.scope
    }

    /// Record `end_date` as the next eligible update.
    ///
    /// * Shared scope writes `nextEligibleUpdate` and `lastUpdated` to the
    ///   tracking document, creating it if needed.
    /// * Per-recipient scope writes `webhook.updateAt` on each `delivered`
    ///   recipient; undelivered recipients stay due for the next run.
    ///
    /// Nothing is written when `delivered` is empty.
    pub async fn commit(
        &self,
        store: &dyn RecipientStore,
        end_date: Option<Timestamp>,
        delivered: &[RecipientRecord],
        now: Timestamp,
    ) -> CommitOutcome {
        let Some(end_date) = end_date else {
            tracing::info!("No promotion end date, tracking left untouched");
            return CommitOutcome::Skipped;
        };
        if delivered.is_empty() {
            tracing::warn!("No successful deliveries, tracking left untouched");
            return CommitOutcome::NothingDelivered;
        }

        let writes: Vec<(String, DocumentPatch)> = match &self.scope {
            TrackingScope::Shared { document_id } => vec![(
                document_id.clone(),
                DocumentPatch::upsert()
                    .set(FIELD_NEXT_ELIGIBLE_UPDATE, PatchValue::Timestamp(end_date))
                    .set(FIELD_LAST_UPDATED, PatchValue::Timestamp(now)),
            )],
            TrackingScope::PerRecipient => delivered
                .iter()
                .map(|recipient| {
                    (
                        recipient.id.clone(),
                        DocumentPatch::existing()
                            .set(FIELD_WEBHOOK_UPDATE_AT, PatchValue::Timestamp(end_date)),
                    )
                })
                .collect(),
        };

        let mut committed = Vec::new();
        let mut failures = Vec::new();

        for (document_id, patch) in writes {
            match store.update_document(&document_id, &patch).await {
                Ok(()) => committed.push(document_id),
                Err(error) => {
                    tracing::error!(
                        document_id,
                        error = %error,
                        "Failed to persist tracking timestamp"
                    );
                    failures.push(CommitFailure { document_id, error });
                }
            }
        }

        if failures.is_empty() {
            tracing::info!(
                scope = %self.scope,
                end_date = %end_date.to_rfc3339(),
                documents = committed.len(),
                "Tracking committed"
            );
            CommitOutcome::Committed {
                end_date,
                documents: committed,
            }
        } else {
            CommitOutcome::PersistenceFailure {
                end_date,
                committed,
                failures,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn outcome_display() {
        let end = chrono::Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(
            CommitOutcome::Skipped.to_string(),
            "skipped (no promotion end date)"
        );

        let committed = CommitOutcome::Committed {
            end_date: end,
            documents: vec!["timestamp".into()],
        };
        assert_eq!(
            committed.to_string(),
            "next update at 2024-06-01T00:00:00+00:00 written to 1 document(s)"
        );
        assert!(!committed.is_failure());
        assert!(!CommitOutcome::NothingDelivered.is_failure());

        let failed = CommitOutcome::PersistenceFailure {
            end_date: end,
            committed: vec![],
            failures: vec![CommitFailure {
                document_id: "guild-9".into(),
                error: StoreError::NotFound("guild-9".into()),
            }],
        };
        assert!(failed.is_failure());
        assert!(failed
            .to_string()
            .contains("guild-9: Document not found: guild-9"));
    }
}
