//! Integration tests for [`Dispatcher`] against local webhook endpoints.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::TimeZone;
use freebie_core::catalog::{OfferGroup, Price, PromotionWindow};
use freebie_core::{CatalogRecord, OfferStatus};
use freebie_events::{Dispatcher, EmbedStyle, WebhookDelivery};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Received = Arc<Mutex<Vec<(String, Value)>>>;

async fn hook(
    State(received): State<Received>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    received.lock().unwrap().push((name.clone(), body));
    if name.starts_with("fail") {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn serve(received: Received) -> String {
    let app = Router::new()
        .route("/hooks/{name}", post(hook))
        .with_state(received);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/hooks")
}

/// An address with nothing listening on it.
fn closed_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/hooks/gone")
}

fn dispatcher() -> Dispatcher {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    Dispatcher::new(
        WebhookDelivery::new(client),
        "Epic Free Games",
        EmbedStyle::default(),
    )
}

fn free_record(id: &str) -> CatalogRecord {
    CatalogRecord {
        id: id.into(),
        title: format!("Game {id}"),
        description: "Free for a week.".into(),
        status: OfferStatus::Active,
        promotions: Some(vec![OfferGroup {
            offers: vec![PromotionWindow {
                start_date: None,
                end_date: Some(chrono::Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
            }],
        }]),
        product_slug: Some(format!("{id}-slug")),
        page_slugs: vec![],
        key_images: vec![],
        price: Price {
            original_price: 1999,
            discount_price: 0,
            fmt_discount_price: "0".into(),
            currency_code: "USD".into(),
            decimals: 2,
        },
    }
}

// ---------------------------------------------------------------------------
// Test: failure isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_failing_target_does_not_block_others() {
    let received = Received::default();
    let base = serve(received.clone()).await;
    let gone = closed_url();

    let targets = vec![
        format!("{base}/a"),
        format!("{base}/fail-b"),
        gone.clone(),
        format!("{base}/c"),
    ];
    let report = dispatcher()
        .dispatch(&[free_record("x")], &targets)
        .await;

    assert_eq!(report.results.len(), 4);
    assert!(report.is_delivered(&format!("{base}/a")));
    assert!(report.is_delivered(&format!("{base}/c")));

    let failed_b = &report.results[&format!("{base}/fail-b")];
    assert!(!failed_b.delivered);
    assert_eq!(failed_b.status, Some(500));
    assert_eq!(failed_b.error.as_deref(), Some("Webhook returned HTTP 500"));

    let unreachable = &report.results[&gone];
    assert!(!unreachable.delivered);
    assert_eq!(unreachable.status, None);
    assert!(unreachable.error.is_some());

    // Every reachable endpoint was attempted, including the one after the failures.
    let names: Vec<String> = received.lock().unwrap().iter().map(|(n, _)| n.clone()).collect();
    assert_eq!(names, ["a", "fail-b", "c"]);
    assert_eq!(report.delivered_count(), 2);
    assert_eq!(report.failed_count(), 2);
}

// ---------------------------------------------------------------------------
// Test: payload shape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_shared_payload_with_an_embed_per_record() {
    let received = Received::default();
    let base = serve(received.clone()).await;

    let targets = vec![format!("{base}/a"), format!("{base}/b"), format!("{base}/a")];
    let report = dispatcher()
        .dispatch(&[free_record("x"), free_record("y")], &targets)
        .await;

    assert_eq!(report.results.len(), 2, "duplicate URL is attempted once");

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 2);
    for (_, body) in received.iter() {
        assert_eq!(body["username"], "Epic Free Games");
        assert_eq!(body["embeds"].as_array().unwrap().len(), 2);
    }
    assert_eq!(received[0].1, received[1].1);
}

#[tokio::test]
async fn empty_records_still_deliver_empty_embed_list() {
    let received = Received::default();
    let base = serve(received.clone()).await;

    let report = dispatcher().dispatch(&[], &[format!("{base}/a")]).await;

    assert_eq!(report.delivered_count(), 1);
    let received = received.lock().unwrap();
    assert_eq!(received[0].1["embeds"], serde_json::json!([]));
}
