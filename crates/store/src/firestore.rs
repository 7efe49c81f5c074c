//! Firestore REST backend.
//!
//! Lists the collection page by page and applies partial updates with an
//! update mask. Firestore's typed value encoding (`{"stringValue": ...}`) is
//! removed on read and produced on write, so the rest of the crate only sees
//! plain JSON documents.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::models::{DocumentPatch, PatchValue};
use crate::{Documents, RecipientStore};

/// Documents requested per list page.
const PAGE_SIZE: u32 = 300;

/// Connection settings for one Firestore collection.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// REST root, e.g. `https://firestore.googleapis.com/v1`.
    pub base_url: String,
    pub project_id: String,
    /// Database id; `(default)` for the default database.
    pub database: String,
    pub collection: String,
    /// OAuth2 bearer token with Datastore access.
    pub access_token: String,
}

/// Recipient store backed by a Firestore collection.
pub struct FirestoreStore {
    client: reqwest::Client,
    config: FirestoreConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirestoreStore {
    /// Create a store reusing an existing [`reqwest::Client`], which carries
    /// the request timeout.
    pub fn new(client: reqwest::Client, config: FirestoreConfig) -> Self {
        Self { client, config }
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.project_id,
            self.config.database,
            self.config.collection
        )
    }

    async fn ensure_success(
        response: reqwest::Response,
        document: &str,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(document.to_string()));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StoreError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RecipientStore for FirestoreStore {
    async fn load_documents(&self) -> Result<Documents, StoreError> {
        let url = self.collection_url();
        let mut documents = Documents::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .bearer_auth(&self.config.access_token)
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response =
                Self::ensure_success(request.send().await?, &self.config.collection).await?;
            let page: ListDocumentsResponse = response.json().await?;

            for doc in page.documents {
                let id = document_id(&doc.name).to_string();
                documents.insert(id, decode_fields(doc.fields));
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    async fn update_document(
        &self,
        document_id: &str,
        patch: &DocumentPatch,
    ) -> Result<(), StoreError> {
        let url = format!("{}/{}", self.collection_url(), document_id);

        let mut query: Vec<(&str, String)> = patch
            .field_paths()
            .map(|path| ("updateMask.fieldPaths", path.to_string()))
            .collect();
        if patch.must_exist {
            query.push(("currentDocument.exists", "true".to_string()));
        }

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.config.access_token)
            .query(&query)
            .json(&encode_patch(patch))
            .send()
            .await?;
        Self::ensure_success(response, document_id).await?;

        tracing::debug!(document_id, "Firestore document updated");
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "firestore:{}/{}/{}",
            self.config.project_id, self.config.database, self.config.collection
        )
    }
}

// ---------------------------------------------------------------------------
// Value codec
// ---------------------------------------------------------------------------

/// Last path segment of a full document resource name.
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Strip Firestore typing from a document's `fields` map.
pub fn decode_fields(fields: Map<String, Value>) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key, decode_value(value)))
            .collect(),
    )
}

/// Convert one typed Firestore value into plain JSON.
pub fn decode_value(value: Value) -> Value {
    let Value::Object(mut typed) = value else {
        return value;
    };

    if let Some(inner) = typed.remove("mapValue") {
        let fields = match inner {
            Value::Object(mut map) => match map.remove("fields") {
                Some(Value::Object(fields)) => fields,
                _ => Map::new(),
            },
            _ => Map::new(),
        };
        return decode_fields(fields);
    }

    if let Some(inner) = typed.remove("arrayValue") {
        let values = match inner {
            Value::Object(mut map) => match map.remove("values") {
                Some(Value::Array(values)) => values,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        return Value::Array(values.into_iter().map(decode_value).collect());
    }

    if let Some(Value::String(raw)) = typed.remove("integerValue") {
        return raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or(Value::String(raw));
    }

    if typed.contains_key("nullValue") {
        return Value::Null;
    }

    // stringValue, booleanValue, doubleValue, timestampValue, referenceValue...
    typed.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null)
}

/// Encode a patch as a Firestore document body, nesting dotted paths.
pub fn encode_patch(patch: &DocumentPatch) -> Value {
    let mut fields = Map::new();
    for (path, value) in &patch.fields {
        let segments: Vec<&str> = path.split('.').collect();
        insert_encoded(&mut fields, &segments, encode_value(value));
    }
    serde_json::json!({ "fields": fields })
}

fn encode_value(value: &PatchValue) -> Value {
    match value {
        PatchValue::Timestamp(_) => serde_json::json!({ "timestampValue": value.to_json() }),
        PatchValue::String(s) => serde_json::json!({ "stringValue": s }),
        PatchValue::Bool(b) => serde_json::json!({ "booleanValue": b }),
    }
}

fn insert_encoded(fields: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        fields.insert((*head).to_string(), value);
        return;
    }

    let entry = fields
        .entry((*head).to_string())
        .or_insert_with(|| serde_json::json!({ "mapValue": { "fields": {} } }));
    if let Some(Value::Object(nested)) = entry
        .get_mut("mapValue")
        .and_then(|map| map.get_mut("fields"))
    {
        insert_encoded(nested, rest, value);
    }
}
