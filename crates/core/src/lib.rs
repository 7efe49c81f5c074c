//! Domain types and pure decision logic for the free-game relay.
//!
//! Nothing in this crate performs I/O; the catalog client, recipient store
//! and webhook delivery crates all build on these types.

pub mod catalog;
pub mod eligibility;
pub mod error;
pub mod tracking;
pub mod types;

pub use catalog::{filter_free_offers, latest_end_date, CatalogRecord, OfferStatus};
pub use eligibility::{evaluate, RecipientRecord, Subscriptions};
pub use error::CoreError;
pub use tracking::{apply_shared_tracking, TrackingRecord, TrackingScope};
pub use types::Timestamp;
