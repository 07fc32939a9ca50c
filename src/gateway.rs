//! Authenticated request pipeline for the care API.
//!
//! Every resource wrapper sends through one `Gateway`. Outbound, the gateway snapshots the
//! credential from the session store and attaches it as a bearer header. Inbound, a 401
//! invalidates the session the request was sent under (the store then emits
//! `SessionEvent::Invalidated`, which navigation subscribes to) and is still returned to the
//! caller as `ClientError::Unauthorized`. Other statuses pass through untouched. There are
//! no retries and no body rewriting.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::identity::SessionStore;

pub type Query<'a> = &'a [(&'a str, String)];

pub struct Gateway {
    config: ClientConfig,
    client: reqwest::Client,
    store: Arc<SessionStore>,
}

impl Gateway {
    pub fn new(config: ClientConfig, store: Arc<SessionStore>) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self { config, client, store })
    }

    pub fn config(&self) -> &ClientConfig { &self.config }

    pub fn store(&self) -> &Arc<SessionStore> { &self.store }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: Query<'_>) -> ClientResult<T> {
        let body = self.execute(Method::GET, path, query, None).await?;
        decode(&body)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, payload: &B) -> ClientResult<T> {
        let body = self.execute(Method::POST, path, &[], Some(serde_json::to_value(payload)?)).await?;
        decode(&body)
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, payload: &B) -> ClientResult<T> {
        let body = self.execute(Method::PUT, path, &[], Some(serde_json::to_value(payload)?)).await?;
        decode(&body)
    }

    pub async fn patch<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let body = self.execute(Method::PATCH, path, &[], None).await?;
        decode(&body)
    }

    /// PATCH where the response body, if any, is ignored.
    pub async fn patch_empty(&self, path: &str) -> ClientResult<()> {
        self.execute(Method::PATCH, path, &[], None).await.map(|_| ())
    }

    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.execute(Method::DELETE, path, &[], None).await.map(|_| ())
    }

    /// Send one request and return the raw success body.
    pub async fn execute(&self, method: Method, path: &str, query: Query<'_>, payload: Option<Value>) -> ClientResult<String> {
        let url = self.config.endpoint(path)?;
        // Snapshot now: a logout while this request is in flight must not change what it carries
        // nor let its response act on a later session.
        let credential = self.store.snapshot();

        let mut req = self.client.request(method.clone(), url);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(token) = credential.token.as_deref() {
            req = req.bearer_auth(token);
        }
        if let Some(p) = payload {
            req = req.json(&p);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            // The rejection alone decides the logout; the body only feeds the message.
            warn!(target: "ghcs::gateway", method = %method, path, "credential rejected; forcing logout");
            self.store.invalidate(credential.epoch);
            let text = resp.text().await.unwrap_or_default();
            let (_, message) = error_fields(status, &text);
            return Err(ClientError::Unauthorized { message });
        }
        let text = resp.text().await?;
        debug!(target: "ghcs::gateway", method = %method, path, status = status.as_u16(), authenticated = credential.token.is_some(), "response");

        if status.is_success() {
            return Ok(text);
        }
        let (code, message) = error_fields(status, &text);
        Err(ClientError::Status { status: status.as_u16(), code, message })
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> ClientResult<T> {
    // Some endpoints answer 200/204 with no body; let `()`/Option targets decode from null.
    let body = if body.trim().is_empty() { "null" } else { body };
    Ok(serde_json::from_str(body)?)
}

/// Pull `code`/`message` out of an error body, falling back to the status line.
fn error_fields(status: StatusCode, text: &str) -> (String, String) {
    let reason = status.canonical_reason().unwrap_or("error").to_string();
    let parsed: Option<Value> = serde_json::from_str(text).ok();
    let field = |names: &[&str]| -> Option<String> {
        let v = parsed.as_ref()?;
        names.iter().find_map(|n| v.get(*n).and_then(|x| x.as_str()).map(|s| s.to_string()))
    };
    let code = field(&["code", "error"])
        .unwrap_or_else(|| reason.to_ascii_lowercase().replace(' ', "_"));
    let message = field(&["message", "detail"]).unwrap_or_else(|| {
        if text.trim().is_empty() || parsed.is_some() { reason.clone() } else { text.trim().to_string() }
    });
    (code, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_fields_prefers_body_fields() {
        let (code, msg) = error_fields(StatusCode::BAD_REQUEST, r#"{"code":"validation_error","message":"title is required"}"#);
        assert_eq!(code, "validation_error");
        assert_eq!(msg, "title is required");

        let (code, msg) = error_fields(StatusCode::NOT_FOUND, "");
        assert_eq!(code, "not_found");
        assert_eq!(msg, "Not Found");

        let (code, msg) = error_fields(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(code, "internal_server_error");
        assert_eq!(msg, "boom");
    }

    #[test]
    fn decode_empty_body_as_null() {
        let unit: () = decode("").unwrap();
        assert_eq!(unit, ());
        let none: Option<u32> = decode("  ").unwrap();
        assert_eq!(none, None);
    }
}
