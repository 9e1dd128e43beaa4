//! Document backend client
//!
//! `DocumentBackend` is the seam between the engine and the service that
//! stores, summarizes and tags documents. `HttpBackend` talks to it over HTTP.

use crate::models::{Document, DocumentId, FileBlob, ProcessedDocument, TagGroup};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tagdesk_common::config::ClientConfig;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("tagdesk/", env!("CARGO_PKG_VERSION"));

/// Operations the engine needs from the document service
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// `GET /documents` (summary may be absent)
    async fn list_documents(&self) -> Result<Vec<Document>>;

    /// `GET /documents/{id}` with full detail
    async fn get_document(&self, id: &DocumentId) -> Result<Document>;

    /// `GET /tags`
    async fn list_taxonomy(&self) -> Result<Vec<TagGroup>>;

    /// `POST /process-document` with a single file
    async fn upload_document(&self, file: &FileBlob) -> Result<ProcessedDocument>;

    /// `POST /reset-documents`
    async fn reset_documents(&self) -> Result<()>;
}

/// FastAPI-style error body
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// HTTP implementation of `DocumentBackend`
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self.http_client.get(&url).send().await?;
        let response = check_status(response, what).await?;
        response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("{}: {}", what, e)))
    }
}

/// Map a non-success response to an error, extracting `detail` when present
async fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound(what.to_string()));
    }

    Err(Error::Status {
        status: status.as_u16(),
        message: error_detail(&body),
    })
}

/// Pull a message out of an error body: `{"detail": "..."}` or the raw text
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl DocumentBackend for HttpBackend {
    async fn list_documents(&self) -> Result<Vec<Document>> {
        let documents: Vec<Document> = self.get_json("/documents", "Document list").await?;
        info!(count = documents.len(), "Fetched document list");
        Ok(documents)
    }

    async fn get_document(&self, id: &DocumentId) -> Result<Document> {
        let document: Document = self
            .get_json(&format!("/documents/{}", id), &format!("Document {}", id))
            .await?;
        debug!(id = %document.id, filename = %document.filename, "Fetched document detail");
        Ok(document)
    }

    async fn list_taxonomy(&self) -> Result<Vec<TagGroup>> {
        let groups: Vec<TagGroup> = self.get_json("/tags", "Tag taxonomy").await?;
        info!(groups = groups.len(), "Fetched tag taxonomy");
        Ok(groups)
    }

    async fn upload_document(&self, file: &FileBlob) -> Result<ProcessedDocument> {
        let url = self.url("/process-document");
        debug!(url = %url, filename = %file.name, bytes = file.content.len(), "POST");

        let part = Part::bytes(file.content.clone())
            .file_name(file.name.clone())
            .mime_str(file.content_type())
            .map_err(|e| Error::Network(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self.http_client.post(&url).multipart(form).send().await?;
        let response = check_status(response, &format!("Upload endpoint for {}", file.name)).await?;
        let processed: ProcessedDocument = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Upload response for {}: {}", file.name, e)))?;

        info!(
            filename = %processed.filename,
            tags = ?processed.tags,
            "Backend processed document"
        );
        Ok(processed)
    }

    async fn reset_documents(&self) -> Result<()> {
        let url = self.url("/reset-documents");
        debug!(url = %url, "POST");

        let response = self.http_client.post(&url).send().await?;
        check_status(response, "Reset endpoint").await?;
        info!("Backend documents reset");
        Ok(())
    }
}
