//! Storefront promotions client.
//!
//! [`StorefrontApi`] fetches the free-games promotions payload and decodes it
//! into [`freebie_core::CatalogRecord`]s. The wire schema lives in
//! [`response`] and is only used at this boundary.

pub mod api;
pub mod response;

pub use api::{CatalogError, StorefrontApi};
