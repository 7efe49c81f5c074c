//! Wire schema for the storefront promotions and product content payloads.
//!
//! Only the consumed subset is typed; unknown fields are ignored. Fields the
//! storefront sometimes sends as `null` decode to their default.

use freebie_core::catalog::{KeyImage, OfferGroup, Price, PromotionWindow};
use freebie_core::types::parse_timestamp;
use freebie_core::{CatalogRecord, OfferStatus};
use serde::{Deserialize, Deserializer};

/// Decimal places assumed when the payload omits `currencyInfo`.
const DEFAULT_DECIMALS: u32 = 2;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Promotions envelope
// ---------------------------------------------------------------------------

/// `{"data": {"Catalog": {"searchStore": {"elements": [...]}}}}`
#[derive(Debug, Deserialize)]
pub struct PromotionsResponse {
    pub data: ResponseData,
}

#[derive(Debug, Deserialize)]
pub struct ResponseData {
    #[serde(rename = "Catalog")]
    pub catalog: CatalogDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDto {
    pub search_store: SearchStoreDto,
}

/// Elements stay untyped here so one malformed element cannot fail the
/// whole payload; each is decoded into [`ElementDto`] separately.
#[derive(Debug, Deserialize)]
pub struct SearchStoreDto {
    #[serde(default, deserialize_with = "null_as_default")]
    pub elements: Vec<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDto {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_images: Vec<KeyImageDto>,
    #[serde(default)]
    pub product_slug: Option<String>,
    #[serde(default)]
    pub catalog_ns: Option<CatalogNsDto>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub offer_mappings: Vec<MappingDto>,
    #[serde(default)]
    pub price: Option<PriceDto>,
    #[serde(default)]
    pub promotions: Option<PromotionsDto>,
}

#[derive(Debug, Deserialize)]
pub struct KeyImageDto {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CatalogNsDto {
    #[serde(default, deserialize_with = "null_as_default")]
    pub mappings: Vec<MappingDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDto {
    #[serde(default, deserialize_with = "null_as_default")]
    pub page_slug: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDto {
    pub total_price: TotalPriceDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalPriceDto {
    #[serde(default)]
    pub discount_price: i64,
    #[serde(default)]
    pub original_price: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub currency_code: String,
    #[serde(default)]
    pub currency_info: Option<CurrencyInfoDto>,
    #[serde(default)]
    pub fmt_price: Option<FmtPriceDto>,
}

#[derive(Debug, Deserialize)]
pub struct CurrencyInfoDto {
    pub decimals: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FmtPriceDto {
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount_price: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionsDto {
    #[serde(default, deserialize_with = "null_as_default")]
    pub promotional_offers: Vec<OfferGroupDto>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub upcoming_promotional_offers: Vec<OfferGroupDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferGroupDto {
    #[serde(default, deserialize_with = "null_as_default")]
    pub promotional_offers: Vec<OfferDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDto {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl From<ElementDto> for CatalogRecord {
    fn from(element: ElementDto) -> Self {
        let page_slugs = element
            .catalog_ns
            .map(|ns| ns.mappings)
            .unwrap_or_default()
            .into_iter()
            .chain(element.offer_mappings)
            .map(|mapping| mapping.page_slug)
            .collect();

        let promotions = element.promotions.map(|promotions| {
            promotions
                .promotional_offers
                .into_iter()
                .map(|group| OfferGroup {
                    offers: group
                        .promotional_offers
                        .into_iter()
                        .map(|offer| PromotionWindow {
                            start_date: offer.start_date.as_deref().and_then(parse_timestamp),
                            end_date: offer.end_date.as_deref().and_then(parse_timestamp),
                        })
                        .collect(),
                })
                .collect()
        });

        let price = element
            .price
            .map(|price| {
                let total = price.total_price;
                Price {
                    original_price: total.original_price,
                    discount_price: total.discount_price,
                    fmt_discount_price: total
                        .fmt_price
                        .map(|fmt| fmt.discount_price)
                        .unwrap_or_default(),
                    currency_code: total.currency_code,
                    decimals: total
                        .currency_info
                        .map_or(DEFAULT_DECIMALS, |info| info.decimals),
                }
            })
            .unwrap_or_default();

        Self {
            id: element.id,
            title: element.title,
            description: element.description,
            status: OfferStatus::from_wire(&element.status),
            promotions,
            product_slug: element.product_slug,
            page_slugs,
            key_images: element
                .key_images
                .into_iter()
                .map(|image| KeyImage {
                    kind: image.kind,
                    url: image.url,
                })
                .collect(),
            price,
        }
    }
}

/// Decode every element that fits the schema, skipping the rest.
pub fn decode_elements(response: PromotionsResponse) -> Vec<CatalogRecord> {
    response
        .data
        .catalog
        .search_store
        .elements
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| match serde_json::from_value::<ElementDto>(raw) {
            Ok(element) => Some(CatalogRecord::from(element)),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed catalog element");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Product content
// ---------------------------------------------------------------------------

/// Product content page: `pages[0].data.about.shortDescription`.
#[derive(Debug, Deserialize)]
pub struct ProductContentResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub pages: Vec<ContentPageDto>,
}

#[derive(Debug, Deserialize)]
pub struct ContentPageDto {
    #[serde(default)]
    pub data: Option<ContentDataDto>,
}

#[derive(Debug, Deserialize)]
pub struct ContentDataDto {
    #[serde(default)]
    pub about: Option<AboutDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutDto {
    #[serde(default)]
    pub short_description: Option<String>,
}

impl ProductContentResponse {
    pub fn short_description(self) -> Option<String> {
        self.pages
            .into_iter()
            .next()?
            .data?
            .about?
            .short_description
            .filter(|text| !text.trim().is_empty())
    }
}
