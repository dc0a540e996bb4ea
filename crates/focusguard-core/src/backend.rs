//! Session backend: creates and finalizes session records.
//!
//! [`HttpBackend`] talks to the sessions REST API:
//!
//! ```text
//! POST {base}/sessions/start          {userId, type} -> {id, ...}
//! POST {base}/sessions/{id}/complete  {}             -> {id, ...}
//! ```
//!
//! [`OfflineBackend`] assigns ids locally when no API is configured.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::json;
use url::Url;

use crate::error::BackendError;
use crate::timer::SessionType;

/// Session record as returned by the backend. Only `id` is required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSession {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub completed: bool,
}

/// Ids are opaque: accept JSON strings and numbers alike.
fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

pub trait SessionBackend: Send {
    fn start_session(
        &self,
        user_id: &str,
        session_type: SessionType,
    ) -> Result<RemoteSession, BackendError>;

    fn complete_session(&self, session_id: &str) -> Result<RemoteSession, BackendError>;
}

/// Blocking client for the sessions REST API.
///
/// Owns a single-threaded tokio runtime; must not be called from inside
/// another runtime.
pub struct HttpBackend {
    base_url: Url,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let mut base_url = Url::parse(base_url)?;
        // Normalized so that `base_url` always names a directory.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| BackendError::Request {
                endpoint: base_url.to_string(),
                source,
            })?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(BackendError::Runtime)?;

        Ok(Self {
            base_url,
            client,
            runtime,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn post(&self, url: Url, body: serde_json::Value) -> Result<RemoteSession, BackendError> {
        let endpoint = url.path().to_string();
        tracing::debug!(%url, "POST");

        self.runtime.block_on(async {
            let response = self
                .client
                .post(url)
                .json(&body)
                .send()
                .await
                .map_err(|source| BackendError::Request {
                    endpoint: endpoint.clone(),
                    source,
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(BackendError::Status {
                    endpoint,
                    status: status.as_u16(),
                });
            }

            response
                .json::<RemoteSession>()
                .await
                .map_err(|e| BackendError::InvalidResponse {
                    endpoint,
                    message: e.to_string(),
                })
        })
    }
}

impl SessionBackend for HttpBackend {
    fn start_session(
        &self,
        user_id: &str,
        session_type: SessionType,
    ) -> Result<RemoteSession, BackendError> {
        self.post(
            self.endpoint(&["sessions", "start"])?,
            json!({ "userId": user_id, "type": session_type }),
        )
    }

    fn complete_session(&self, session_id: &str) -> Result<RemoteSession, BackendError> {
        self.post(
            self.endpoint(&["sessions", session_id, "complete"])?,
            json!({}),
        )
    }
}

/// Backend used when no API is configured. Ids are random UUIDs.
#[derive(Debug, Default)]
pub struct OfflineBackend;

impl SessionBackend for OfflineBackend {
    fn start_session(
        &self,
        _user_id: &str,
        _session_type: SessionType,
    ) -> Result<RemoteSession, BackendError> {
        Ok(RemoteSession {
            id: uuid::Uuid::new_v4().to_string(),
            completed: false,
        })
    }

    fn complete_session(&self, session_id: &str) -> Result<RemoteSession, BackendError> {
        Ok(RemoteSession {
            id: session_id.to_string(),
            completed: true,
        })
    }
}
