//! Rich-notification payload sent to webhook endpoints.

use freebie_core::catalog::IMAGE_OFFER_TALL;
use freebie_core::CatalogRecord;
use serde::Serialize;

/// Teal, matching the storefront's notification accent.
pub const DEFAULT_COLOR: u32 = 1_752_220;

pub const DEFAULT_AUTHOR_NAME: &str = "Epic Games";
pub const DEFAULT_AUTHOR_URL: &str = "https://store.epicgames.com";
pub const DEFAULT_STORE_PAGE_URL: &str = "https://store.epicgames.com/en-US/p/";

/// Presentation settings shared by every embed in a run.
#[derive(Debug, Clone)]
pub struct EmbedStyle {
    /// Store page prefix; the product slug is appended.
    pub store_page_url: String,
    pub author_name: String,
    pub author_url: String,
    pub color: u32,
}

impl Default for EmbedStyle {
    fn default() -> Self {
        Self {
            store_page_url: DEFAULT_STORE_PAGE_URL.to_string(),
            author_name: DEFAULT_AUTHOR_NAME.to_string(),
            author_url: DEFAULT_AUTHOR_URL.to_string(),
            color: DEFAULT_COLOR,
        }
    }
}

/// Top-level webhook body: `{"username": ..., "embeds": [...]}`.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    pub embeds: Vec<Embed>,
}

impl WebhookPayload {
    /// One payload carrying an embed per record. Zero records yields an
    /// empty `embeds` list.
    pub fn build(username: &str, records: &[CatalogRecord], style: &EmbedStyle) -> Self {
        Self {
            username: username.to_string(),
            embeds: records
                .iter()
                .map(|record| Embed::from_record(record, style))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    pub fields: Vec<EmbedField>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Embed {
    pub fn from_record(record: &CatalogRecord, style: &EmbedStyle) -> Self {
        Self {
            title: record.title.clone(),
            description: Some(format!(
                "*Original Price : {}*",
                record.price.display_original()
            )),
            url: record
                .slug()
                .map(|slug| format!("{}{}", style.store_page_url, slug)),
            timestamp: record.end_date().map(|end| end.to_rfc3339()),
            color: style.color,
            author: Some(EmbedAuthor {
                name: style.author_name.clone(),
                url: style.author_url.clone(),
            }),
            image: record.image_url(IMAGE_OFFER_TALL).map(|url| EmbedImage {
                url: url.to_string(),
            }),
            fields: vec![EmbedField {
                name: "Description".to_string(),
                value: format!("```{}```", record.description),
                inline: true,
            }],
            kind: "rich",
        }
    }
}
