//! Sends one shared notification payload to every due recipient.
//!
//! Each target is attempted independently; a failure is recorded in the
//! [`DispatchReport`] and never stops delivery to the remaining targets.

use std::collections::BTreeMap;

use freebie_core::CatalogRecord;

use crate::delivery::webhook::WebhookDelivery;
use crate::embed::{EmbedStyle, WebhookPayload};

/// Outcome of delivering to one target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub delivered: bool,
    /// HTTP status, when the endpoint answered.
    pub status: Option<u16>,
    /// Failure reason for undelivered targets.
    pub error: Option<String>,
}

/// Per-URL results of one dispatch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub results: BTreeMap<String, DispatchResult>,
}

impl DispatchReport {
    pub fn delivered_count(&self) -> usize {
        self.results.values().filter(|r| r.delivered).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.delivered_count()
    }

    pub fn is_delivered(&self, url: &str) -> bool {
        self.results.get(url).is_some_and(|r| r.delivered)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &DispatchResult)> {
        self.results
            .iter()
            .filter(|(_, r)| !r.delivered)
            .map(|(url, r)| (url.as_str(), r))
    }
}

/// Builds the shared payload and fans it out to webhook targets.
pub struct Dispatcher {
    delivery: WebhookDelivery,
    username: String,
    style: EmbedStyle,
}

impl Dispatcher {
    pub fn new(delivery: WebhookDelivery, username: impl Into<String>, style: EmbedStyle) -> Self {
        Self {
            delivery,
            username: username.into(),
            style,
        }
    }

    /// The payload [`dispatch`](Self::dispatch) would send for `records`.
    pub fn payload(&self, records: &[CatalogRecord]) -> WebhookPayload {
        WebhookPayload::build(&self.username, records, &self.style)
    }

    /// Deliver one payload built from `records` to each target URL.
    ///
    /// Empty `records` still sends a payload with no embeds; deciding whether
    /// to dispatch at all is the caller's job. Duplicate URLs are attempted once.
    pub async fn dispatch(&self, records: &[CatalogRecord], targets: &[String]) -> DispatchReport {
        let payload = self.payload(records);
        let mut report = DispatchReport::default();

        for url in targets {
            if report.results.contains_key(url) {
                tracing::debug!(url, "Duplicate webhook target skipped");
                continue;
            }

            let result = match self.delivery.deliver(url, &payload).await {
                Ok(status) => {
                    tracing::info!(url, status, embeds = payload.embeds.len(), "Payload delivered");
                    DispatchResult {
                        delivered: true,
                        status: Some(status),
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(url, error = %e, "Webhook delivery failed");
                    DispatchResult {
                        delivered: false,
                        status: e.status(),
                        error: Some(e.to_string()),
                    }
                }
            };
            report.results.insert(url.clone(), result);
        }

        report
    }
}
