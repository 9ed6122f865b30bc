//! HTTP access to the ActionKit REST API.
//!
//! `RestClient` is the seam the rest of the adaptor talks through, so the
//! orchestrator can run against any transport. `ActionKitClient` is the
//! reqwest-backed implementation used in production.

use async_trait::async_trait;
use osdi_core::{OsdiError, OsdiResult};
use reqwest::header::LOCATION;
use serde_json::Value;
use url::Url;

use crate::config::ActionKitConfig;

const API_ROOT: &str = "rest/v1/";

/// What the adaptor needs from a response: the decoded body and, on
/// creation, the address of the new resource.
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: u16,
    /// `Value::Null` when the response had no body
    pub body: Value,
    /// `Location` header, present on create responses
    pub location: Option<String>,
}

impl RestResponse {
    /// Id of the resource named by the `Location` header.
    pub fn created_id(&self) -> OsdiResult<String> {
        let location = self.location.as_deref().ok_or_else(|| {
            OsdiError::MalformedResponse("create response has no Location header".into())
        })?;

        id_from_location(location).ok_or_else(|| {
            OsdiError::MalformedResponse(format!("cannot read resource id from '{location}'"))
        })
    }
}

/// Extract the numeric id from a resource address like `/rest/v1/event/42/`:
/// the second-to-last `/`-delimited segment.
pub fn id_from_location(location: &str) -> Option<String> {
    let segments: Vec<&str> = location.split('/').collect();
    if segments.len() < 2 {
        return None;
    }

    let id = segments[segments.len() - 2];
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Minimal REST verbs used against ActionKit.
///
/// `path` is either relative to the API root (`event/12/`) or an absolute
/// resource URI as returned by ActionKit (`/rest/v1/eventfield/9/`).
/// Non-2xx responses resolve to `OsdiError::Upstream`.
#[async_trait]
pub trait RestClient: Send + Sync {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> OsdiResult<RestResponse>;

    async fn post(&self, path: &str, body: &Value) -> OsdiResult<RestResponse>;

    async fn put(&self, path: &str, body: Option<&Value>) -> OsdiResult<RestResponse>;
}

/// reqwest-backed client for an ActionKit instance, authenticated with
/// HTTP basic auth.
#[derive(Debug, Clone)]
pub struct ActionKitClient {
    http: reqwest::Client,
    api_root: Url,
    username: String,
    password: String,
}

impl ActionKitClient {
    pub fn new(config: &ActionKitConfig) -> OsdiResult<Self> {
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');

        let api_root = Url::parse(&base)
            .and_then(|url| url.join(API_ROOT))
            .map_err(|e| OsdiError::Config(format!("Invalid AK_BASE_URL '{}': {e}", config.base_url)))?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_root,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> OsdiResult<Url> {
        self.api_root
            .join(path)
            .map_err(|e| OsdiError::Transport(format!("Invalid request path '{path}': {e}")))
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> OsdiResult<RestResponse> {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| OsdiError::Transport(e.to_string()))?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let text = response
            .text()
            .await
            .map_err(|e| OsdiError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(OsdiError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        Ok(RestResponse {
            status: status.as_u16(),
            body,
            location,
        })
    }
}

#[async_trait]
impl RestClient for ActionKitClient {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> OsdiResult<RestResponse> {
        let url = self.url(path)?;
        self.execute(self.http.get(url).query(query)).await
    }

    async fn post(&self, path: &str, body: &Value) -> OsdiResult<RestResponse> {
        let url = self.url(path)?;
        self.execute(self.http.post(url).json(body)).await
    }

    async fn put(&self, path: &str, body: Option<&Value>) -> OsdiResult<RestResponse> {
        let url = self.url(path)?;
        let request = match body {
            Some(body) => self.http.put(url).json(body),
            None => self.http.put(url),
        };
        self.execute(request).await
    }
}
