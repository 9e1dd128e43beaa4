//! Shared test helpers: an in-memory scripted backend and controller setup

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tagdesk_client::{
    AppController, Document, DocumentBackend, DocumentId, Error, FileBlob, ProcessedDocument,
    Result, TagGroup,
};
use tagdesk_common::config::{BusyDisplay, ClientConfig};

#[derive(Default)]
struct Inner {
    taxonomy: Vec<TagGroup>,
    documents: Vec<Document>,
    next_id: i64,
    /// Tags the "analysis" assigns per uploaded filename
    tagging: HashMap<String, Vec<String>>,
    failing_uploads: HashSet<String>,
    upload_attempts: Vec<String>,
    detail_delays: HashMap<String, Duration>,
    failing_details: HashSet<String>,
    upload_delay: Duration,
    reset_delay: Duration,
    fail_list: bool,
    fail_taxonomy: bool,
    fail_reset: bool,
    list_calls: usize,
}

/// Backend double that behaves like the real service: uploads persist a new
/// document with a numeric id, reset drops all documents.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedBackend {
    pub fn new(taxonomy: Vec<TagGroup>) -> Self {
        let backend = Self::default();
        {
            let mut inner = backend.inner.lock().unwrap();
            inner.taxonomy = taxonomy;
            inner.next_id = 1;
        }
        backend
    }

    /// Pre-existing document as if uploaded earlier
    pub fn seed(&self, filename: &str, tags: &[&str]) -> DocumentId {
        let mut inner = self.inner.lock().unwrap();
        let id = DocumentId::from(inner.next_id);
        inner.next_id += 1;
        inner.documents.push(Document {
            id: id.clone(),
            filename: filename.to_string(),
            summary: Some(format!("Summary of {}", filename)),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        });
        id
    }

    pub fn tag_upload(&self, filename: &str, tags: &[&str]) {
        self.inner
            .lock()
            .unwrap()
            .tagging
            .insert(filename.to_string(), tags.iter().map(|t| t.to_string()).collect());
    }

    pub fn fail_upload(&self, filename: &str) {
        self.inner
            .lock()
            .unwrap()
            .failing_uploads
            .insert(filename.to_string());
    }

    pub fn delay_uploads(&self, delay: Duration) {
        self.inner.lock().unwrap().upload_delay = delay;
    }

    pub fn delay_reset(&self, delay: Duration) {
        self.inner.lock().unwrap().reset_delay = delay;
    }

    pub fn delay_detail(&self, id: &DocumentId, delay: Duration) {
        self.inner
            .lock()
            .unwrap()
            .detail_delays
            .insert(id.to_string(), delay);
    }

    pub fn fail_detail(&self, id: &DocumentId) {
        self.inner
            .lock()
            .unwrap()
            .failing_details
            .insert(id.to_string());
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.inner.lock().unwrap().fail_list = fail;
    }

    pub fn set_fail_taxonomy(&self, fail: bool) {
        self.inner.lock().unwrap().fail_taxonomy = fail;
    }

    pub fn set_fail_reset(&self, fail: bool) {
        self.inner.lock().unwrap().fail_reset = fail;
    }

    pub fn upload_attempts(&self) -> Vec<String> {
        self.inner.lock().unwrap().upload_attempts.clone()
    }

    pub fn persisted_filenames(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .documents
            .iter()
            .map(|d| d.filename.clone())
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.inner.lock().unwrap().list_calls
    }
}

fn backend_down() -> Error {
    Error::Status {
        status: 500,
        message: "backend unavailable".to_string(),
    }
}

#[async_trait]
impl DocumentBackend for ScriptedBackend {
    async fn list_documents(&self) -> Result<Vec<Document>> {
        let mut inner = self.inner.lock().unwrap();
        inner.list_calls += 1;
        if inner.fail_list {
            return Err(backend_down());
        }
        // List entries carry no summary
        Ok(inner
            .documents
            .iter()
            .map(|d| Document {
                summary: None,
                ..d.clone()
            })
            .collect())
    }

    async fn get_document(&self, id: &DocumentId) -> Result<Document> {
        let delay = {
            let inner = self.inner.lock().unwrap();
            inner.detail_delays.get(id.as_str()).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let inner = self.inner.lock().unwrap();
        if inner.failing_details.contains(id.as_str()) {
            return Err(backend_down());
        }
        inner
            .documents
            .iter()
            .find(|d| &d.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Document {}", id)))
    }

    async fn list_taxonomy(&self) -> Result<Vec<TagGroup>> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_taxonomy {
            return Err(backend_down());
        }
        Ok(inner.taxonomy.clone())
    }

    async fn upload_document(&self, file: &FileBlob) -> Result<ProcessedDocument> {
        let delay = {
            let mut inner = self.inner.lock().unwrap();
            inner.upload_attempts.push(file.name.clone());
            inner.upload_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock().unwrap();
        if inner.failing_uploads.contains(&file.name) {
            return Err(Error::Status {
                status: 500,
                message: format!("Could not process {}", file.name),
            });
        }

        let tags = inner.tagging.get(&file.name).cloned().unwrap_or_default();
        let summary = format!("Summary of {}", file.name);
        let id = DocumentId::from(inner.next_id);
        inner.next_id += 1;
        inner.documents.push(Document {
            id,
            filename: file.name.clone(),
            summary: Some(summary.clone()),
            tags: tags.clone(),
        });

        Ok(ProcessedDocument {
            filename: file.name.clone(),
            summary: Some(summary),
            tags,
        })
    }

    async fn reset_documents(&self) -> Result<()> {
        let delay = self.inner.lock().unwrap().reset_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock().unwrap();
        if inner.fail_reset {
            return Err(backend_down());
        }
        inner.documents.clear();
        Ok(())
    }
}

/// The two-group taxonomy used across scenarios
pub fn sample_taxonomy() -> Vec<TagGroup> {
    vec![
        TagGroup::new("Governance", ["Governance", "Meetings"]),
        TagGroup::new("Finance", ["Finance", "Budgets"]),
    ]
}

/// Config with no minimum busy time so tests run instantly
pub fn fast_config() -> ClientConfig {
    ClientConfig {
        min_busy: Duration::ZERO,
        ..Default::default()
    }
}

pub fn config_with(display: BusyDisplay, min_busy: Duration) -> ClientConfig {
    ClientConfig {
        busy_display: display,
        min_busy,
        ..Default::default()
    }
}

pub fn controller(backend: &ScriptedBackend, config: &ClientConfig) -> AppController {
    AppController::new(Arc::new(backend.clone()), config)
}

pub fn pdf(name: &str) -> FileBlob {
    FileBlob::new(name, b"%PDF-1.4 test".to_vec())
}
