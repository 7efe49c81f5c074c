use std::path::PathBuf;
use std::time::Duration;

use freebie_core::tracking::DEFAULT_TRACKING_DOCUMENT;
use freebie_core::TrackingScope;
use freebie_events::embed::{DEFAULT_STORE_PAGE_URL, EmbedStyle};
use freebie_store::FirestoreConfig;

pub const DEFAULT_PROMOTIONS_URL: &str =
    "https://store-site-backend-static-ipv4.ak.epicgames.com/freeGamesPromotions?locale=en-US&country=ID";
pub const DEFAULT_CONTENT_URL: &str =
    "https://store-content-ipv4.ak.epicgames.com/api/en-US/content/products/";
pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_FIRESTORE_DATABASE: &str = "(default)";
pub const DEFAULT_WEBHOOK_USERNAME: &str = "Epic Free Games";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Errors raised while assembling the worker configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("Env file not found: {0}")]
    EnvFileNotFound(PathBuf),

    #[error("Failed to load env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Which recipient store backend to use.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Firestore(FirestoreConfig),
    /// Degraded mode: a local `{id: document}` JSON snapshot.
    LocalFile(PathBuf),
}

/// Worker configuration loaded once at startup and passed to each component.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub promotions_url: String,
    pub content_url: String,
    /// Timeout applied to every outbound request.
    pub request_timeout: Duration,
    pub webhook_username: String,
    pub embed_style: EmbedStyle,
    pub store: StoreConfig,
    pub tracking: TrackingScope,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                       |
    /// |---------------------------|-------------------------------|
    /// | `PROMOTIONS_URL`          | storefront promotions feed    |
    /// | `CONTENT_URL`             | storefront product content    |
    /// | `STORE_PAGE_URL`          | `https://store.epicgames.com/en-US/p/` |
    /// | `REQUEST_TIMEOUT_SECS`    | `10`                          |
    /// | `WEBHOOK_USERNAME`        | `Epic Free Games`             |
    /// | `GCP_PROJECT_ID`          | -- (enables Firestore)        |
    /// | `GCP_DATABASE_NAME`       | `(default)`                   |
    /// | `GCP_DATABASE_COLLECTION` | -- (required with Firestore)  |
    /// | `GCP_ACCESS_TOKEN`        | -- (required with Firestore)  |
    /// | `FIRESTORE_BASE_URL`      | `https://firestore.googleapis.com/v1` |
    /// | `DATABASE_FILENAME`       | -- (local snapshot fallback)  |
    /// | `TRACKING_SCOPE`          | `shared`                      |
    /// | `TRACKING_DOCUMENT_ID`    | `timestamp`                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let request_timeout_secs: u64 = match var("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "REQUEST_TIMEOUT_SECS",
                reason: format!("'{raw}' is not a whole number of seconds"),
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        if request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "REQUEST_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let tracking_document =
            var("TRACKING_DOCUMENT_ID").unwrap_or_else(|| DEFAULT_TRACKING_DOCUMENT.into());
        let tracking = match var("TRACKING_SCOPE") {
            Some(raw) => TrackingScope::parse(&raw, tracking_document).map_err(|e| {
                ConfigError::Invalid {
                    var: "TRACKING_SCOPE",
                    reason: e.to_string(),
                }
            })?,
            None => TrackingScope::Shared {
                document_id: tracking_document,
            },
        };

        let embed_style = EmbedStyle {
            store_page_url: var("STORE_PAGE_URL").unwrap_or_else(|| DEFAULT_STORE_PAGE_URL.into()),
            ..EmbedStyle::default()
        };

        Ok(Self {
            promotions_url: var("PROMOTIONS_URL").unwrap_or_else(|| DEFAULT_PROMOTIONS_URL.into()),
            content_url: var("CONTENT_URL").unwrap_or_else(|| DEFAULT_CONTENT_URL.into()),
            request_timeout: Duration::from_secs(request_timeout_secs),
            webhook_username: var("WEBHOOK_USERNAME")
                .unwrap_or_else(|| DEFAULT_WEBHOOK_USERNAME.into()),
            embed_style,
            store: store_config(&var)?,
            tracking,
        })
    }

    /// Shared HTTP client for every outbound call.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        Ok(reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()?)
    }
}

/// Firestore when a project is configured, otherwise the local snapshot.
fn store_config(var: &impl Fn(&str) -> Option<String>) -> Result<StoreConfig, ConfigError> {
    if let Some(project_id) = var("GCP_PROJECT_ID") {
        let collection =
            var("GCP_DATABASE_COLLECTION").ok_or(ConfigError::Missing("GCP_DATABASE_COLLECTION"))?;
        let access_token = var("GCP_ACCESS_TOKEN").ok_or(ConfigError::Missing("GCP_ACCESS_TOKEN"))?;

        return Ok(StoreConfig::Firestore(FirestoreConfig {
            base_url: var("FIRESTORE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_FIRESTORE_BASE_URL.into()),
            project_id,
            database: var("GCP_DATABASE_NAME").unwrap_or_else(|| DEFAULT_FIRESTORE_DATABASE.into()),
            collection,
            access_token,
        }));
    }

    let path = var("DATABASE_FILENAME")
        .map(PathBuf::from)
        .ok_or(ConfigError::Missing("GCP_PROJECT_ID or DATABASE_FILENAME"))?;
    if !path.exists() {
        return Err(ConfigError::Invalid {
            var: "DATABASE_FILENAME",
            reason: format!("cannot find database ({})", path.display()),
        });
    }
    Ok(StoreConfig::LocalFile(path))
}
