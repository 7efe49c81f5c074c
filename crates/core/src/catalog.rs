//! Typed storefront catalog records and the free-offer filter.
//!
//! Records are produced once per fetch cycle by the catalog client and never
//! mutated afterwards, except for the short-description lookup that runs
//! before any notification is built.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Key image type used for the notification artwork.
pub const IMAGE_OFFER_TALL: &str = "OfferImageTall";

/// Largest `decimals` value honoured when rendering minor units.
const MAX_DECIMALS: u32 = 18;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Publication status of a catalog offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferStatus {
    Active,
    Inactive,
    Other,
}

impl OfferStatus {
    /// Map the storefront's upper-case status string.
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "ACTIVE" => Self::Active,
            "INACTIVE" => Self::Inactive,
            _ => Self::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A single promotional window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionWindow {
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
}

/// One group of promotional offers, as nested by the storefront.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferGroup {
    pub offers: Vec<PromotionWindow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyImage {
    pub kind: String,
    pub url: String,
}

/// Price information in minor units of `currency_code`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub original_price: i64,
    pub discount_price: i64,
    /// Storefront-formatted discount price, e.g. `"0"`.
    pub fmt_discount_price: String,
    pub currency_code: String,
    pub decimals: u32,
}

impl Price {
    /// Render the original price as `"{currency} {amount}"`, e.g. `IDR 279,999.00`.
    pub fn display_original(&self) -> String {
        format!(
            "{} {}",
            self.currency_code,
            format_minor_units(self.original_price, self.decimals)
        )
    }
}

/// A storefront catalog entry, decoded from the promotions payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: OfferStatus,
    /// `None` when the payload carried no promotions object at all.
    pub promotions: Option<Vec<OfferGroup>>,
    pub product_slug: Option<String>,
    /// Page slugs from the catalog namespace mappings, in payload order.
    pub page_slugs: Vec<String>,
    pub key_images: Vec<KeyImage>,
    pub price: Price,
}

impl CatalogRecord {
    /// Whether the formatted discount price is exactly zero.
    ///
    /// A discount alone is not enough; `"0"` or a numeric zero such as
    /// `"0.00"` is required.
    pub fn is_free(&self) -> bool {
        let fmt = self.price.fmt_discount_price.trim();
        fmt == "0" || fmt.parse::<f64>().is_ok_and(|value| value == 0.0)
    }

    /// First window of the first non-empty offer group.
    pub fn current_window(&self) -> Option<&PromotionWindow> {
        self.promotions
            .as_deref()?
            .iter()
            .find_map(|group| group.offers.first())
    }

    /// Whether at least one offer group carries a window.
    pub fn has_promotion_window(&self) -> bool {
        self.current_window().is_some()
    }

    pub fn end_date(&self) -> Option<Timestamp> {
        self.current_window().and_then(|window| window.end_date)
    }

    /// Store page slug: the product slug, falling back to the first
    /// catalog namespace mapping.
    pub fn slug(&self) -> Option<&str> {
        self.product_slug
            .as_deref()
            .filter(|slug| !slug.is_empty())
            .or_else(|| {
                self.page_slugs
                    .iter()
                    .map(String::as_str)
                    .find(|slug| !slug.is_empty())
            })
    }

    /// URL of the last key image of the given type.
    pub fn image_url(&self, kind: &str) -> Option<&str> {
        self.key_images
            .iter()
            .rev()
            .find(|image| image.kind == kind)
            .map(|image| image.url.as_str())
    }

    /// The storefront sometimes repeats the title as the description; those
    /// records need the product content lookup.
    pub fn needs_description_lookup(&self) -> bool {
        self.description.trim().is_empty() || self.description == self.title
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Keep records that are active, carry a promotion window and cost nothing.
///
/// Order is preserved. Malformed promotion data (an empty group list, or only
/// empty groups) excludes the record rather than failing.
pub fn filter_free_offers(records: Vec<CatalogRecord>) -> Vec<CatalogRecord> {
    records
        .into_iter()
        .filter(|record| {
            record.status == OfferStatus::Active
                && record.has_promotion_window()
                && record.is_free()
        })
        .collect()
}

/// End date of the last record, in feed order, that has one.
pub fn latest_end_date(records: &[CatalogRecord]) -> Option<Timestamp> {
    records.iter().rev().find_map(CatalogRecord::end_date)
}

/// Format an amount in minor units with thousands separators.
pub fn format_minor_units(amount: i64, decimals: u32) -> String {
    let decimals = decimals.min(MAX_DECIMALS);
    let divisor = 10_u64.pow(decimals);
    let abs = amount.unsigned_abs();
    let whole = (abs / divisor).to_string();
    let frac = abs % divisor;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 1);
    if amount < 0 {
        grouped.push('-');
    }
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if decimals == 0 {
        grouped
    } else {
        format!("{grouped}.{frac:0width$}", width = decimals as usize)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
