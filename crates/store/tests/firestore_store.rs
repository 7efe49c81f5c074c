//! Integration tests for [`FirestoreStore`] against a local fake of the
//! Firestore REST endpoints.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::{Path, Query, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use chrono::TimeZone;
use freebie_core::TrackingScope;
use freebie_store::{
    load_snapshot, DocumentPatch, FirestoreConfig, FirestoreStore, PatchValue, RecipientStore,
    StoreError,
};
use serde_json::{json, Value};

const TOKEN: &str = "token-123";

// ---------------------------------------------------------------------------
// Fake Firestore
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct Fake {
    patches: Arc<Mutex<Vec<(String, String, Value)>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn list(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthenticated"})));
    }

    let page = match query.get("pageToken").map(String::as_str) {
        None => json!({
            "documents": [{
                "name": "projects/proj/databases/test-db/documents/webhooks/guild-1",
                "fields": {
                    "subscription": {"mapValue": {"fields": {"epic": {"booleanValue": true}}}},
                    "webhook": {"mapValue": {"fields": {
                        "url": {"stringValue": "https://hooks/1"},
                        "updateAt": {"nullValue": null}
                    }}}
                }
            }],
            "nextPageToken": "page-2"
        }),
        Some("page-2") => json!({
            "documents": [{
                "name": "projects/proj/databases/test-db/documents/webhooks/timestamp",
                "fields": {
                    "nextEligibleUpdate": {"timestampValue": "2024-06-01T00:00:00Z"}
                }
            }]
        }),
        Some(_) => json!({}),
    };
    (StatusCode::OK, Json(page))
}

async fn patch(
    State(fake): State<Fake>,
    headers: HeaderMap,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    let query = query.unwrap_or_default();
    if id == "missing" && query.contains("currentDocument.exists=true") {
        return (StatusCode::NOT_FOUND, Json(json!({"error": {"status": "NOT_FOUND"}})));
    }
    fake.patches.lock().unwrap().push((id, query, body.clone()));
    (StatusCode::OK, Json(body))
}

async fn serve(fake: Fake) -> String {
    let app = Router::new()
        .route(
            "/v1/projects/proj/databases/test-db/documents/webhooks",
            get(list),
        )
        .route(
            "/v1/projects/proj/databases/test-db/documents/webhooks/{id}",
            axum::routing::patch(patch),
        )
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/v1")
}

fn store(base_url: String, token: &str) -> FirestoreStore {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    FirestoreStore::new(
        client,
        FirestoreConfig {
            base_url,
            project_id: "proj".into(),
            database: "test-db".into(),
            collection: "webhooks".into(),
            access_token: token.into(),
        },
    )
}

// ---------------------------------------------------------------------------
// Test: listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lists_all_pages_and_decodes_typed_values() {
    let base = serve(Fake::default()).await;
    let store = store(base, TOKEN);

    let documents = store.load_documents().await.unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents["guild-1"]["webhook"]["url"], "https://hooks/1");
    assert!(documents["guild-1"]["webhook"]["updateAt"].is_null());

    let snapshot = load_snapshot(&store, &TrackingScope::default()).await.unwrap();
    assert_eq!(snapshot.recipients.len(), 1);
    assert_eq!(
        snapshot.tracking.and_then(|t| t.next_eligible_update),
        Some(chrono::Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn rejected_credentials_surface_http_status() {
    let base = serve(Fake::default()).await;
    let err = store(base, "wrong").load_documents().await.unwrap_err();
    assert_matches!(err, StoreError::HttpStatus { status: 401, .. });
    assert!(err.is_transport());
}

// ---------------------------------------------------------------------------
// Test: partial updates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn patch_sends_update_mask_and_nested_fields() {
    let fake = Fake::default();
    let base = serve(fake.clone()).await;
    let ts = chrono::Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

    store(base, TOKEN)
        .update_document(
            "guild-1",
            &DocumentPatch::existing().set("webhook.updateAt", PatchValue::Timestamp(ts)),
        )
        .await
        .unwrap();

    let patches = fake.patches.lock().unwrap();
    assert_eq!(patches.len(), 1);
    let (id, query, body) = &patches[0];
    assert_eq!(id, "guild-1");
    assert!(query.contains("updateMask.fieldPaths=webhook.updateAt"));
    assert!(query.contains("currentDocument.exists=true"));
    assert_eq!(
        body["fields"]["webhook"]["mapValue"]["fields"]["updateAt"]["timestampValue"],
        "2024-06-01T00:00:00Z"
    );
}

#[tokio::test]
async fn patch_on_missing_document_is_not_found() {
    let base = serve(Fake::default()).await;
    let ts = chrono::Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

    let err = store(base, TOKEN)
        .update_document(
            "missing",
            &DocumentPatch::existing().set("webhook.updateAt", PatchValue::Timestamp(ts)),
        )
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::NotFound(id) if id == "missing");
}

#[tokio::test]
async fn upsert_patch_omits_existence_precondition() {
    let fake = Fake::default();
    let base = serve(fake.clone()).await;
    let ts = chrono::Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

    store(base, TOKEN)
        .update_document(
            "missing",
            &DocumentPatch::upsert().set("nextEligibleUpdate", PatchValue::Timestamp(ts)),
        )
        .await
        .unwrap();

    let patches = fake.patches.lock().unwrap();
    assert!(!patches[0].1.contains("currentDocument.exists"));
}
