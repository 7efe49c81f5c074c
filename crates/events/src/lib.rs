//! Notification payloads and webhook delivery.
//!
//! - [`embed`] - rich-notification payload built from catalog records.
//! - [`delivery`] - single-attempt HTTP delivery to one webhook URL.
//! - [`Dispatcher`] - sends one shared payload to every due recipient,
//!   isolating per-target failures into a [`DispatchReport`].

pub mod delivery;
pub mod dispatcher;
pub mod embed;

pub use delivery::webhook::{WebhookDelivery, WebhookError};
pub use dispatcher::{DispatchReport, DispatchResult, Dispatcher};
pub use embed::{Embed, EmbedStyle, WebhookPayload};
