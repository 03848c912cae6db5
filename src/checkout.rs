//! Checkout sessions from the subscription service.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::CheckoutError;

/// Billing backend that issues checkout redirect URLs.
#[async_trait]
pub trait CheckoutClient: Send + Sync {
    /// Create a checkout session for `uid` on `plan` and return its URL.
    async fn create_checkout_session(&self, uid: &str, plan: &str) -> Result<String, CheckoutError>;
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    #[serde(default)]
    url: Option<String>,
}

/// [`CheckoutClient`] talking HTTP to the subscription service.
pub struct HttpCheckoutClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCheckoutClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/create-checkout-session", self.base_url)
    }
}

#[async_trait]
impl CheckoutClient for HttpCheckoutClient {
    async fn create_checkout_session(&self, uid: &str, plan: &str) -> Result<String, CheckoutError> {
        debug!(uid = %uid, plan = %plan, "Requesting checkout session");

        let resp = self
            .client
            .get(self.endpoint())
            .query(&[("user_id", uid), ("plan_type", plan)])
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| CheckoutError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = %status, "Checkout session request failed");
            return Err(CheckoutError::Status {
                status: status.as_u16(),
            });
        }

        let body: CheckoutSessionResponse = resp
            .json()
            .await
            .map_err(|e| CheckoutError::InvalidResponse(e.to_string()))?;

        body.url
            .filter(|url| !url.is_empty())
            .ok_or(CheckoutError::MissingUrl)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use super::*;

    type Seen = Arc<Mutex<Vec<(HashMap<String, String>, Option<String>)>>>;

    /// Start a fake subscription service answering with `status` and `reply`.
    async fn start_billing(status: StatusCode, reply: Value) -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/create-checkout-session",
                get(
                    |State((seen, status, reply)): State<(Seen, StatusCode, Value)>,
                     Query(query): Query<HashMap<String, String>>,
                     headers: HeaderMap| async move {
                        let content_type = headers
                            .get("content-type")
                            .and_then(|v| v.to_str().ok())
                            .map(String::from);
                        seen.lock().unwrap().push((query, content_type));
                        (status, Json(reply))
                    },
                ),
            )
            .with_state((Arc::clone(&seen), status, reply));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        (format!("http://127.0.0.1:{port}/"), seen)
    }

    #[tokio::test]
    async fn returns_url_and_sends_expected_query() {
        let (base, seen) = start_billing(StatusCode::OK, json!({"url": "https://pay/x"})).await;
        let client = HttpCheckoutClient::new(base);

        let url = client.create_checkout_session("u1", "pro").await.unwrap();
        assert_eq!(url, "https://pay/x");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0["user_id"], "u1");
        assert_eq!(seen[0].0["plan_type"], "pro");
        assert_eq!(seen[0].1.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn missing_url_is_checkout_error() {
        let (base, _) = start_billing(StatusCode::OK, json!({"session": "abc"})).await;
        let err = HttpCheckoutClient::new(base)
            .create_checkout_session("u1", "pro")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::MissingUrl));
    }

    #[tokio::test]
    async fn empty_url_is_checkout_error() {
        let (base, _) = start_billing(StatusCode::OK, json!({"url": ""})).await;
        let err = HttpCheckoutClient::new(base)
            .create_checkout_session("u1", "pro")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::MissingUrl));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let (base, _) = start_billing(StatusCode::INTERNAL_SERVER_ERROR, json!({})).await;
        let err = HttpCheckoutClient::new(base)
            .create_checkout_session("u1", "pro")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Status { status: 500 }));
    }

    #[tokio::test]
    async fn unreachable_service_is_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = HttpCheckoutClient::new(format!("http://127.0.0.1:{port}"))
            .create_checkout_session("u1", "pro")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Request(_)));
    }
}
