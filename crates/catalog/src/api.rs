//! HTTP client for the storefront promotions and product content endpoints.

use freebie_core::CatalogRecord;

use crate::response::{decode_elements, ProductContentResponse, PromotionsResponse};

/// Errors from the storefront API layer.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The storefront returned a non-2xx status code.
    #[error("Storefront API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body was not the expected JSON document.
    #[error("Failed to decode storefront payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }
}

/// Client for the storefront's public promotion endpoints.
pub struct StorefrontApi {
    client: reqwest::Client,
    promotions_url: String,
    content_url: String,
}

impl StorefrontApi {
    /// Create a client reusing an existing [`reqwest::Client`], which carries
    /// the request timeout.
    ///
    /// * `promotions_url` - Full URL of the free-games promotions feed.
    /// * `content_url` - Product content prefix; the product slug is appended.
    pub fn new(client: reqwest::Client, promotions_url: String, content_url: String) -> Self {
        Self {
            client,
            promotions_url,
            content_url,
        }
    }

    /// Fetch and decode the promotions feed.
    ///
    /// Elements that do not fit the schema are skipped; a payload whose
    /// envelope does not decode fails with [`CatalogError::Decode`].
    pub async fn fetch_promotions(&self) -> Result<Vec<CatalogRecord>, CatalogError> {
        let response = self.client.get(&self.promotions_url).send().await?;
        let body = Self::ensure_success(response).await?.text().await?;
        let payload: PromotionsResponse = serde_json::from_str(&body)?;

        let records = decode_elements(payload);
        tracing::debug!(count = records.len(), "Decoded storefront catalog");
        Ok(records)
    }

    /// Look up the short description on a product's content page.
    pub async fn fetch_short_description(
        &self,
        slug: &str,
    ) -> Result<Option<String>, CatalogError> {
        let response = self
            .client
            .get(format!("{}{}", self.content_url, slug))
            .send()
            .await?;
        let content: ProductContentResponse = Self::ensure_success(response).await?.json().await?;
        Ok(content.short_description())
    }

    /// Replace title-only descriptions with the product's short description.
    ///
    /// Lookup failures are logged and leave the description unchanged.
    pub async fn resolve_descriptions(&self, records: &mut [CatalogRecord]) {
        for record in records.iter_mut() {
            if !record.needs_description_lookup() {
                continue;
            }
            let Some(slug) = record.slug().map(str::to_owned) else {
                continue;
            };

            match self.fetch_short_description(&slug).await {
                Ok(Some(description)) => record.description = description,
                Ok(None) => {
                    tracing::debug!(slug, "Product content has no short description");
                }
                Err(e) => {
                    tracing::warn!(slug, error = %e, "Product content lookup failed");
                }
            }
        }
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, CatalogError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}
