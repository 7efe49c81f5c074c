//! One relay run: fetch, filter, evaluate, dispatch, commit.
//!
//! Each stage completes before the next begins. Fatal conditions surface as
//! [`RunError`]; everything else is collected into a [`RunReport`].

use std::fmt;

use freebie_catalog::StorefrontApi;
use freebie_core::{evaluate, filter_free_offers, latest_end_date, Timestamp};
use freebie_events::{DispatchReport, Dispatcher, WebhookDelivery};
use freebie_store::{
    load_snapshot, CommitOutcome, DeliveryTracker, FirestoreStore, LocalFileStore, RecipientStore,
};

use crate::config::{StoreConfig, WorkerConfig};
use crate::error::RunError;

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// Summary of a run that did not abort.
#[derive(Debug)]
pub enum RunReport {
    /// The feed held no active free promotion; the store was not read.
    NoFreeOffers { fetched: usize },
    /// Recipients exist but none is due yet.
    NothingToUpdate { recipients: usize },
    /// Evaluated without delivering or committing.
    DryRun { titles: Vec<String>, due: usize },
    /// The payload was dispatched and tracking committed (best effort).
    Dispatched {
        titles: Vec<String>,
        due: usize,
        dispatch: DispatchReport,
        commit: CommitOutcome,
    },
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFreeOffers { fetched } => {
                write!(f, "No free games right now ({fetched} catalog record(s) checked)")
            }
            Self::NothingToUpdate { recipients } => {
                write!(f, "Nothing to update ({recipients} recipient(s), none due)")
            }
            Self::DryRun { titles, due } => write!(
                f,
                "Dry run: would send [{}] to {due} recipient(s)",
                titles.join(", ")
            ),
            Self::Dispatched {
                titles,
                due,
                dispatch,
                commit,
            } => {
                write!(
                    f,
                    "Sent [{}] to {due} due recipient(s): {} delivered, {} failed; tracking {commit}",
                    titles.join(", "),
                    dispatch.delivered_count(),
                    dispatch.failed_count(),
                )?;
                for (url, result) in dispatch.failures() {
                    write!(
                        f,
                        "\n  failed {url}: {}",
                        result.error.as_deref().unwrap_or("unknown error")
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// Process exit status for a finished run.
///
/// Delivery and tracking failures still exit with 0; only a fatal
/// [`RunError`] does not.
pub fn exit_code(outcome: &Result<RunReport, RunError>) -> u8 {
    match outcome {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct Pipeline {
    catalog: StorefrontApi,
    store: Box<dyn RecipientStore>,
    dispatcher: Dispatcher,
    tracker: DeliveryTracker,
    dry_run: bool,
}

impl Pipeline {
    pub fn new(
        catalog: StorefrontApi,
        store: Box<dyn RecipientStore>,
        dispatcher: Dispatcher,
        tracker: DeliveryTracker,
    ) -> Self {
        Self {
            catalog,
            store,
            dispatcher,
            tracker,
            dry_run: false,
        }
    }

    /// Wire every component from a loaded configuration.
    ///
    /// One HTTP client, carrying the request timeout, is shared by the
    /// storefront, the store and the webhook delivery.
    pub fn from_config(config: &WorkerConfig) -> Result<Self, RunError> {
        let client = config.http_client()?;

        let store: Box<dyn RecipientStore> = match &config.store {
            StoreConfig::Firestore(fs) => Box::new(FirestoreStore::new(client.clone(), fs.clone())),
            StoreConfig::LocalFile(path) => {
                tracing::warn!(
                    path = %path.display(),
                    "No GCP project configured, using local snapshot"
                );
                Box::new(LocalFileStore::new(path.clone()))
            }
        };

        Ok(Self::new(
            StorefrontApi::new(
                client.clone(),
                config.promotions_url.clone(),
                config.content_url.clone(),
            ),
            store,
            Dispatcher::new(
                WebhookDelivery::new(client),
                config.webhook_username.clone(),
                config.embed_style.clone(),
            ),
            DeliveryTracker::new(config.tracking.clone()),
        ))
    }

    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Execute one run against the wall-clock instant `now`.
    pub async fn run(&self, now: Timestamp) -> Result<RunReport, RunError> {
        let records = self.catalog.fetch_promotions().await?;
        let fetched = records.len();
        let mut offers = filter_free_offers(records);
        if offers.is_empty() {
            tracing::info!(fetched, "No active free promotions");
            return Ok(RunReport::NoFreeOffers { fetched });
        }
        tracing::info!(count = offers.len(), "Free promotions found");

        let scope = self.tracker.scope();
        let snapshot = load_snapshot(self.store.as_ref(), scope)
            .await
            .map_err(|e| RunError::DataUnavailable(format!("{}: {e}", self.store.describe())))?;
        let recipients = snapshot.effective_recipients(scope);
        let due = evaluate(&recipients, now)?;
        if due.is_empty() {
            tracing::info!(recipients = recipients.len(), "Nothing to update");
            return Ok(RunReport::NothingToUpdate {
                recipients: recipients.len(),
            });
        }

        self.catalog.resolve_descriptions(&mut offers).await;
        let titles: Vec<String> = offers.iter().map(|r| r.title.clone()).collect();

        if self.dry_run {
            let payload = self.dispatcher.payload(&offers);
            match serde_json::to_string_pretty(&payload) {
                Ok(body) => tracing::info!(due = due.len(), "Dry run payload:\n{body}"),
                Err(e) => tracing::warn!(error = %e, "Failed to render dry run payload"),
            }
            return Ok(RunReport::DryRun {
                titles,
                due: due.len(),
            });
        }

        let targets: Vec<String> = due.iter().map(|r| r.url.clone()).collect();
        let dispatch = self.dispatcher.dispatch(&offers, &targets).await;

        let delivered: Vec<_> = due
            .iter()
            .filter(|r| dispatch.is_delivered(&r.url))
            .cloned()
            .collect();
        let commit = self
            .tracker
            .commit(self.store.as_ref(), latest_end_date(&offers), &delivered, now)
            .await;

        Ok(RunReport::Dispatched {
            titles,
            due: due.len(),
            dispatch,
            commit,
        })
    }
}
