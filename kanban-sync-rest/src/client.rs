//! HTTP client for the projects API.

use crate::error::RestError;
use crate::wire;
use async_trait::async_trait;
use kanban_sync::{
    BoardScope, FailureKind, ItemRecord, MoveRequest, RemoteFailure, RemoteGateway, SyncConfig,
};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

/// Extract a human-readable message from an error body.
///
/// Tries `detail`, then `error`, then `message`, then falls back to the raw body.
fn extract_error_message(body: &str) -> Option<String> {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "error", "message"] {
            if let Some(msg) = json.get(key).and_then(Value::as_str) {
                return Some(msg.to_string());
            }
        }
    }
    let body = body.trim();
    (!body.is_empty()).then(|| body.to_string())
}

/// Classify a non-success HTTP status
fn failure_kind(status: u16) -> FailureKind {
    match status {
        400 | 422 => FailureKind::Validation,
        401 | 403 => FailureKind::Permission,
        404 => FailureKind::NotFound,
        409 => FailureKind::Conflict,
        _ => FailureKind::Unavailable,
    }
}

fn transport_failure(error: reqwest::Error) -> RemoteFailure {
    RemoteFailure::unavailable(error.to_string())
}

/// Gateway talking to the projects REST API
#[derive(Debug, Clone)]
pub struct RestGateway {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl RestGateway {
    /// Unauthenticated gateway rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self, RestError> {
        Self::with_client(Client::new(), base_url)
    }

    /// Gateway configured from `config`. The client timeout matches the
    /// session deadline.
    pub fn from_config(config: &SyncConfig) -> Result<Self, RestError> {
        let client = Client::builder().timeout(config.remote_timeout()).build()?;
        let gateway = Self::with_client(client, &config.api_base_url)?;
        Ok(match &config.api_token {
            Some(token) => gateway.with_token(token.clone()),
            None => gateway,
        })
    }

    fn with_client(client: Client, base_url: &str) -> Result<Self, RestError> {
        // Relative joins keep the last path segment only with a trailing slash
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|source| RestError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Send `Authorization: Token <token>` with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, RemoteFailure> {
        self.base_url
            .join(path)
            .map_err(|e| RemoteFailure::validation(format!("invalid path '{}': {}", path, e)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Token {}", token)),
            None => request,
        }
    }

    /// Map a non-success response to a `RemoteFailure` based on status code.
    async fn check_response(&self, response: Response) -> Result<Response, RemoteFailure> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let failure = RemoteFailure::new(failure_kind(status.as_u16()));
        Err(match extract_error_message(&body) {
            Some(message) => failure.with_message(message),
            None => failure.with_message(status.to_string()),
        })
    }
}

#[async_trait]
impl RemoteGateway for RestGateway {
    async fn list_items(&self, scope: &BoardScope) -> Result<Vec<ItemRecord>, RemoteFailure> {
        let (path, query) = wire::list_path(scope);
        let mut url = self.url(path)?;
        if let Some((key, value)) = query {
            url.query_pairs_mut().append_pair(key, &value);
        }

        debug!(%scope, %url, "fetching listing");
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport_failure)?;
        let response = self.check_response(response).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| RemoteFailure::validation(format!("listing is not JSON: {}", e)))?;

        let records = wire::decode_listing(scope, body)?;
        trace!(%scope, items = records.len(), "listing decoded");
        Ok(records)
    }

    async fn move_item(
        &self,
        scope: &BoardScope,
        request: &MoveRequest,
    ) -> Result<(), RemoteFailure> {
        let url = self.url(&wire::move_path(scope, &request.item))?;
        let body = wire::move_body(scope, request);

        debug!(ticket = %request.ticket, %url, "sending move");
        let response = self
            .authorize(self.client.patch(url))
            .json(&body)
            .send()
            .await
            .map_err(transport_failure)?;
        self.check_response(response).await?;
        Ok(())
    }
}
