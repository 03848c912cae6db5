//! Firestore profile store over the REST API.
//!
//! Each save is a `PATCH` on the document without an update mask, which
//! replaces the whole document, matching a client-side `setDoc`.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::traits::ProfileStore;
use crate::config::FirestoreConfig;
use crate::error::StoreError;
use crate::onboarding::model::UserProfileDocument;

/// Profile store backed by a Firestore database.
pub struct FirestoreProfileStore {
    base_url: String,
    project_id: String,
    token: Option<SecretString>,
    client: reqwest::Client,
}

impl FirestoreProfileStore {
    pub fn new(config: &FirestoreConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            token: config.token.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}/{}",
            self.base_url,
            urlencoding::encode(&self.project_id),
            collection,
            urlencoding::encode(id)
        )
    }
}

/// Render a profile as a Firestore document body with string-typed fields.
pub fn document_body(profile: &UserProfileDocument) -> Value {
    let fields: Map<String, Value> = profile
        .fields()
        .into_iter()
        .map(|(name, value)| (name.to_string(), json!({ "stringValue": value })))
        .collect();
    json!({ "fields": fields })
}

/// Map a failed write response to a [`StoreError`].
fn classify_failure(status: StatusCode, body: &str, id: &str) -> StoreError {
    let rpc_status = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["status"].as_str().map(String::from));

    let denied = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || matches!(
            rpc_status.as_deref(),
            Some("PERMISSION_DENIED") | Some("UNAUTHENTICATED")
        );

    if denied {
        StoreError::PermissionDenied {
            collection: UserProfileDocument::COLLECTION.to_string(),
            id: id.to_string(),
        }
    } else {
        StoreError::Backend(format!(
            "Firestore write failed with {status}: {}",
            rpc_status.unwrap_or_else(|| body.chars().take(200).collect())
        ))
    }
}

#[async_trait]
impl ProfileStore for FirestoreProfileStore {
    async fn save_profile(
        &self,
        uid: &str,
        profile: &UserProfileDocument,
    ) -> Result<(), StoreError> {
        let url = self.document_url(UserProfileDocument::COLLECTION, uid);
        debug!(uid = %uid, "Writing profile to Firestore");

        let mut request = self.client.patch(&url).json(&document_body(profile));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let resp = request
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        let err = classify_failure(status, &body, uid);
        warn!(uid = %uid, status = %status, error = %err, "Firestore write rejected");
        Err(err)
    }
}
