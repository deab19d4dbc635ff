//! JSON REST document store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::wire::Document;
use super::DocumentStore;
use crate::auth::IdentityProvider;
use crate::error::{Error, Result};
use crate::util::{compact_text, is_http_url, normalize_text_option};

/// Document store reached over HTTP at `{base}/v1/collections/{collection}/documents`.
#[derive(Clone)]
pub struct HttpDocumentStore {
    base_url: String,
    client: Client,
    identity: Arc<dyn IdentityProvider>,
}

impl HttpDocumentStore {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url.into())?,
            client: Client::builder().timeout(timeout).build()?,
            identity,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/v1/collections/{}/documents",
            self.base_url,
            urlencoding::encode(collection)
        )
    }

    /// The id is encoded as a single path segment.
    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.documents_url(collection), urlencoding::encode(id))
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let request = request.header("Accept", "application/json");
        Ok(match self.identity.access_token().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorized(request).await?.send().await.map_err(|error| {
            if error.is_timeout() || error.is_connect() {
                Error::Network(error.to_string())
            } else {
                Error::Http(error)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("Document API response status: {}", status);
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!("Document API error ({}): {}", status, compact_text(&body));
        Err(status_error(status, &body))
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn list_documents(&self, collection: &str) -> Result<Vec<Value>> {
        let response = self
            .send(self.client.get(self.documents_url(collection)))
            .await?;
        let payload = response.json::<DocumentList>().await?;
        Ok(payload.into_documents())
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        match self
            .send(self.client.get(self.document_url(collection, id)))
            .await
        {
            Ok(response) => Ok(Some(response.json::<Document>().await?)),
            Err(Error::Remote { status: 404, .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn create_document(&self, collection: &str, document: &Document) -> Result<String> {
        let response = self
            .send(self.client.post(self.documents_url(collection)).json(document))
            .await?;
        let created = response.json::<CreatedDocument>().await?;
        normalize_text_option(created.id)
            .or_else(|| normalize_text_option(Some(document.id.clone())))
            .ok_or_else(|| Error::Validation("create response did not include an id".to_string()))
    }

    async fn update_document(&self, collection: &str, document: &Document) -> Result<()> {
        self.send(
            self.client
                .put(self.document_url(collection, &document.id))
                .json(document),
        )
        .await?;
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        self.send(self.client.delete(self.document_url(collection, id)))
            .await?;
        Ok(())
    }
}

/// List responses are either a bare array or `{ "documents": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DocumentList {
    Bare(Vec<Value>),
    Wrapped { documents: Vec<Value> },
}

impl DocumentList {
    fn into_documents(self) -> Vec<Value> {
        match self {
            Self::Bare(documents) | Self::Wrapped { documents } => documents,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedDocument {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn status_error(status: StatusCode, body: &str) -> Error {
    let message = parse_api_error(status, body);
    match status.as_u16() {
        401 | 403 => Error::Unauthorized(message),
        408 | 429 | 500..=599 => Error::Network(message),
        code => Error::Remote {
            status: code,
            message,
        },
    }
}

fn normalize_base_url(raw: String) -> Result<String> {
    let base_url = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::Config("API base URL must not be empty".to_string()))?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(Error::Config(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}
