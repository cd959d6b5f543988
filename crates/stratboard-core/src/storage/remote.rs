//! HTTP client for the per-user document store (authenticated mode).

use super::{BoxFuture, Storage, StorageError, StorageResult};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

/// A stored document as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub key: String,
    pub data: String,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
struct PutDocument<'a> {
    data: &'a str,
}

/// Stores documents under `/v1/users/{user}/documents/{key}` on a remote
/// server.
pub struct RemoteStorage {
    client: Client,
    endpoint: Url,
    user_id: String,
    api_key: Option<String>,
}

impl RemoteStorage {
    /// Fails when `endpoint` is not an absolute http(s) URL.
    pub fn new(endpoint: &str, user_id: impl Into<String>) -> StorageResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| StorageError::Other(format!("Invalid endpoint {}: {}", endpoint, e)))?;
        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(StorageError::Other(format!(
                "Invalid endpoint scheme: {}",
                endpoint.scheme()
            )));
        }
        Ok(Self {
            client: Client::new(),
            endpoint,
            user_id: user_id.into(),
            api_key: None,
        })
    }

    /// Send `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// `{endpoint}/v1/users/{user}/documents[/{key}]`, each segment
    /// percent-encoded.
    fn url(&self, key: Option<&str>) -> StorageResult<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StorageError::Other(format!("Endpoint {} cannot be a base", self.endpoint)))?;
            segments
                .pop_if_empty()
                .extend(["v1", "users", self.user_id.as_str(), "documents"]);
            if let Some(key) = key {
                segments.push(key);
            }
        }
        Ok(url)
    }

    fn collection_url(&self) -> StorageResult<Url> {
        self.url(None)
    }

    fn document_url(&self, key: &str) -> StorageResult<Url> {
        self.url(Some(key))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Fetch the full record for a key, including its timestamp.
    pub async fn record(&self, key: &str) -> StorageResult<DocumentRecord> {
        let response = self
            .authorize(self.client.get(self.document_url(key)?))
            .send()
            .await
            .map_err(remote_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(key.to_string()));
        }
        check_status(response)
            .await?
            .json::<DocumentRecord>()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

fn remote_error(e: reqwest::Error) -> StorageError {
    StorageError::Remote(e.to_string())
}

async fn check_status(response: Response) -> StorageResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    log::warn!("Document store replied {}: {}", status, body);
    Err(StorageError::Remote(match status {
        StatusCode::UNAUTHORIZED => "unauthorized".to_string(),
        _ if body.is_empty() => status.to_string(),
        _ => format!("{}: {}", status, body),
    }))
}

impl Storage for RemoteStorage {
    fn save(&self, key: &str, data: &str) -> BoxFuture<'_, StorageResult<()>> {
        let url = self.document_url(key);
        let data = data.to_string();
        Box::pin(async move {
            let url = url?;
            let response = self
                .authorize(self.client.put(url))
                .json(&PutDocument { data: &data })
                .send()
                .await
                .map_err(remote_error)?;
            check_status(response).await?;
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<String>> {
        let key = key.to_string();
        Box::pin(async move { self.record(&key).await.map(|record| record.data) })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let url = self.document_url(key);
        Box::pin(async move {
            let url = url?;
            let response = self
                .authorize(self.client.delete(url))
                .send()
                .await
                .map_err(remote_error)?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(());
            }
            check_status(response).await?;
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let url = self.collection_url();
        Box::pin(async move {
            let url = url?;
            let response = self
                .authorize(self.client.get(url))
                .send()
                .await
                .map_err(remote_error)?;
            check_status(response)
                .await?
                .json::<Vec<String>>()
                .await
                .map_err(|e| StorageError::Serialization(e.to_string()))
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let key = key.to_string();
        Box::pin(async move {
            match self.record(&key).await {
                Ok(_) => Ok(true),
                Err(StorageError::NotFound(_)) => Ok(false),
                Err(e) => Err(e),
            }
        })
    }
}
