//! Application controller
//!
//! Owns the single `EngineState` and is the only place that mutates it. Every
//! mutation happens under one write lock that is never held across a backend
//! call, so operations interleave only at network suspension points.

use crate::backend::DocumentBackend;
use crate::colors::{self, ColorToken, TagColorMap};
use crate::filter::FilterSet;
use crate::models::{Document, DocumentId, FileBlob, ProcessedDocument, TagGroup};
use crate::store::DocumentStore;
use crate::taxonomy::TaxonomyIndex;
use crate::upload::{StateTransition, UploadState, UploadWorkflow};
use crate::{Error, Result};
use chrono::Utc;
use std::sync::Arc;
use tagdesk_common::config::ClientConfig;
use tagdesk_common::events::{EngineEvent, EventBus};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// All client-side state
#[derive(Debug)]
pub struct EngineState {
    taxonomy: TaxonomyIndex,
    store: DocumentStore,
    filter: FilterSet,
    upload: UploadWorkflow,
    colors: TagColorMap,
    last_error: Option<String>,
    /// Set while a reset is between its backend call and the reload
    resetting: bool,
}

impl EngineState {
    fn new(config: &ClientConfig) -> Self {
        Self {
            taxonomy: TaxonomyIndex::default(),
            store: DocumentStore::new(),
            filter: FilterSet::new(),
            upload: UploadWorkflow::new(config.busy_display, config.min_busy),
            colors: TagColorMap::default(),
            last_error: None,
            resetting: false,
        }
    }

    pub fn taxonomy(&self) -> &TaxonomyIndex {
        &self.taxonomy
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn filter(&self) -> &FilterSet {
        &self.filter
    }

    pub fn upload(&self) -> &UploadWorkflow {
        &self.upload
    }

    /// Colors derived from the current taxonomy and documents
    pub fn colors(&self) -> &TagColorMap {
        &self.colors
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn visible_documents(&self) -> Vec<&Document> {
        self.filter.visible_documents(self.store.documents())
    }

    pub fn custom_tags(&self) -> Vec<String> {
        self.taxonomy.custom_tags(self.store.documents())
    }

    /// Recompute derived colors from scratch; called after every change to
    /// the taxonomy or the document set
    fn recompute_colors(&mut self) {
        self.colors = colors::assign_for(&self.taxonomy, self.store.documents());
    }

    /// Stage `files` when given, then enter the busy upload state. Both
    /// happen under the caller's single write guard.
    fn begin_upload(
        &mut self,
        files: Option<Vec<FileBlob>>,
    ) -> Result<(Vec<FileBlob>, StateTransition)> {
        if self.resetting {
            return Err(Error::ResetInProgress);
        }
        if let Some(files) = files {
            self.upload.stage(files)?;
        }
        self.upload.begin()
    }

    fn replace_documents(&mut self, documents: Vec<Document>) {
        self.store.replace_all(documents);
        self.recompute_colors();
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            documents: self.store.documents().to_vec(),
            visible: self.visible_documents().into_iter().cloned().collect(),
            taxonomy: self.taxonomy.groups().to_vec(),
            custom_tags: self.custom_tags(),
            colors: self.colors.clone(),
            filter: self.filter.to_vec(),
            selected_id: self.store.selected_id().cloned(),
            selected_detail: self.store.selected_detail().cloned(),
            upload_state: self.upload.state().clone(),
            staged: self.upload.staged().iter().map(|f| f.name.clone()).collect(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Owned copy of the state and everything derived from it
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub documents: Vec<Document>,
    pub visible: Vec<Document>,
    pub taxonomy: Vec<TagGroup>,
    pub custom_tags: Vec<String>,
    pub colors: TagColorMap,
    pub filter: Vec<String>,
    pub selected_id: Option<DocumentId>,
    pub selected_detail: Option<Document>,
    pub upload_state: UploadState,
    /// Names of the files staged for upload
    pub staged: Vec<String>,
    pub last_error: Option<String>,
}

impl Snapshot {
    pub fn color_of(&self, tag: &str) -> ColorToken {
        self.colors.get(tag)
    }
}

/// Outcome of a successful upload batch
#[derive(Debug, Clone)]
pub struct UploadReport {
    /// Backend acknowledgements in upload order
    pub processed: Vec<ProcessedDocument>,
    /// Document auto-selected after the refresh, if it was found
    pub selected: Option<DocumentId>,
}

#[derive(Clone)]
pub struct AppController {
    backend: Arc<dyn DocumentBackend>,
    state: Arc<RwLock<EngineState>>,
    events: EventBus,
}

impl AppController {
    pub fn new(backend: Arc<dyn DocumentBackend>, config: &ClientConfig) -> Self {
        Self::with_event_bus(backend, config, EventBus::new(config.event_capacity))
    }

    pub fn with_event_bus(
        backend: Arc<dyn DocumentBackend>,
        config: &ClientConfig,
        events: EventBus,
    ) -> Self {
        Self {
            backend,
            state: Arc::new(RwLock::new(EngineState::new(config))),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Run `f` against the current state under the read lock
    pub async fn read<R>(&self, f: impl FnOnce(&EngineState) -> R) -> R {
        let state = self.state.read().await;
        f(&state)
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.snapshot()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    /// Clear the error slot
    pub async fn dismiss_error(&self) {
        self.state.write().await.last_error = None;
        self.emit(EngineEvent::ErrorDismissed {
            timestamp: Utc::now(),
        });
    }

    /// Startup load of taxonomy and documents
    pub async fn load(&self) -> Result<()> {
        info!("Loading taxonomy and documents");
        self.refresh().await
    }

    /// Re-fetch taxonomy and documents. Both fetches must succeed before
    /// either is applied.
    pub async fn refresh(&self) -> Result<()> {
        let fetched = tokio::try_join!(self.backend.list_taxonomy(), self.backend.list_documents());

        let mut state = self.state.write().await;
        let (groups, documents) = match fetched {
            Ok(pair) => pair,
            Err(e) => return Err(self.surface(&mut state, e)),
        };

        let group_count = groups.len();
        let document_count = documents.len();
        state.taxonomy = TaxonomyIndex::new(groups);
        state.replace_documents(documents);
        drop(state);

        self.emit(EngineEvent::TaxonomyRefreshed {
            groups: group_count,
            timestamp: Utc::now(),
        });
        self.emit(EngineEvent::DocumentsRefreshed {
            count: document_count,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Re-fetch only the document list
    pub async fn refresh_documents(&self) -> Result<()> {
        let fetched = self.backend.list_documents().await;

        let mut state = self.state.write().await;
        let documents = match fetched {
            Ok(documents) => documents,
            Err(e) => return Err(self.surface(&mut state, e)),
        };
        let count = documents.len();
        state.replace_documents(documents);
        drop(state);

        self.emit(EngineEvent::DocumentsRefreshed {
            count,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Toggle a tag in the filter set; returns its membership afterwards
    pub async fn toggle_tag(&self, tag: &str) -> bool {
        let mut state = self.state.write().await;
        let member = state.filter.toggle(tag);
        let tags = state.filter.to_vec();
        drop(state);

        debug!(tag, member, "Filter toggled");
        self.emit(EngineEvent::FilterChanged {
            tags,
            timestamp: Utc::now(),
        });
        member
    }

    pub async fn clear_filter(&self) {
        self.state.write().await.filter.clear();
        self.emit(EngineEvent::FilterChanged {
            tags: Vec::new(),
            timestamp: Utc::now(),
        });
    }

    pub async fn visible_documents(&self) -> Vec<Document> {
        self.read(|s| s.visible_documents().into_iter().cloned().collect())
            .await
    }

    /// Select a document and fetch its detail.
    ///
    /// Returns `Ok(true)` when the detail was applied and `Ok(false)` when a
    /// newer selection superseded this one before the response arrived; late
    /// responses (success or failure) for superseded selections are dropped.
    pub async fn select(&self, id: impl Into<DocumentId>) -> Result<bool> {
        let id = id.into();
        let ticket = self.state.write().await.store.select(id.clone());
        self.emit(EngineEvent::SelectionChanged {
            id: Some(id.to_string()),
            timestamp: Utc::now(),
        });

        let fetched = self.backend.get_document(&id).await;

        let mut state = self.state.write().await;
        match fetched {
            Ok(detail) => {
                if state.store.apply_detail(&ticket, detail) {
                    drop(state);
                    self.emit(EngineEvent::DetailLoaded {
                        id: id.to_string(),
                        timestamp: Utc::now(),
                    });
                    Ok(true)
                } else {
                    warn!(id = %id, "Ignoring detail for superseded selection");
                    Ok(false)
                }
            }
            Err(e) if state.store.is_current(&ticket) => Err(self.surface(&mut state, e)),
            Err(e) => {
                warn!(id = %id, error = %e, "Ignoring failed detail fetch for superseded selection");
                Ok(false)
            }
        }
    }

    pub async fn deselect(&self) {
        self.state.write().await.store.deselect();
        self.emit(EngineEvent::SelectionChanged {
            id: None,
            timestamp: Utc::now(),
        });
    }

    /// Stage files for the next upload. Rejected while an upload runs.
    pub async fn stage(&self, files: Vec<FileBlob>) -> Result<()> {
        let mut state = self.state.write().await;
        match state.upload.stage(files) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.surface(&mut state, e)),
        }
    }

    /// Stage `files` and start the upload in one call
    pub async fn upload(&self, files: Vec<FileBlob>) -> Result<UploadReport> {
        self.run_upload(Some(files)).await
    }

    /// Upload the staged batch.
    ///
    /// Files are sent one at a time in order. The first failure aborts the
    /// batch. On success the document list is re-fetched, the filter is
    /// cleared and the document matching the last file's name is selected.
    /// Either way the workflow stays busy for at least the configured
    /// minimum, then returns to Idle with the batch cleared.
    pub async fn start_upload(&self) -> Result<UploadReport> {
        self.run_upload(None).await
    }

    async fn run_upload(&self, files: Option<Vec<FileBlob>>) -> Result<UploadReport> {
        let begun = {
            let mut state = self.state.write().await;
            match state.begin_upload(files) {
                Ok(begun) => begun,
                Err(e) => return Err(self.surface(&mut state, e)),
            }
        };
        let (batch, transition) = begun;
        self.emit_transition(transition);

        let total = batch.len();
        info!(total, "Starting upload batch");

        let mut processed = Vec::with_capacity(total);
        for (index, file) in batch.iter().enumerate() {
            self.state.write().await.upload.file_started(index);

            match self.backend.upload_document(file).await {
                Ok(doc) => {
                    info!(filename = %file.name, index = index + 1, total, "File uploaded");
                    processed.push(doc);
                    self.emit(EngineEvent::UploadFileCompleted {
                        filename: file.name.clone(),
                        index: index + 1,
                        total,
                        timestamp: Utc::now(),
                    });
                }
                Err(e) => {
                    let err = Error::UploadFailed {
                        filename: file.name.clone(),
                        index: index + 1,
                        total,
                        source: Box::new(e),
                    };
                    return Err(self.abort_upload(err).await);
                }
            }
        }

        let analyzing = self.state.write().await.upload.begin_analyzing();
        if let Some(transition) = analyzing {
            self.emit_transition(transition);
        }

        let documents = match self.backend.list_documents().await {
            Ok(documents) => documents,
            Err(e) => return Err(self.abort_upload(e).await),
        };

        let last_filename = batch.last().map(|f| f.name.as_str()).unwrap_or_default();
        let (target, count) = {
            let mut state = self.state.write().await;
            state.replace_documents(documents);
            state.filter.clear();
            let target = state.store.find_by_filename(last_filename).map(|d| d.id.clone());
            (target, state.store.len())
        };
        self.emit(EngineEvent::DocumentsRefreshed {
            count,
            timestamp: Utc::now(),
        });
        self.emit(EngineEvent::FilterChanged {
            tags: Vec::new(),
            timestamp: Utc::now(),
        });

        match &target {
            Some(id) => {
                if let Err(e) = self.select(id.clone()).await {
                    warn!(id = %id, error = %e, "Uploaded document selected but detail fetch failed");
                }
            }
            None => warn!(filename = last_filename, "Uploaded document not found after refresh"),
        }

        self.settle_upload().await;
        info!(uploaded = processed.len(), "Upload batch complete");

        Ok(UploadReport {
            processed,
            selected: target,
        })
    }

    /// Reset the backend, then reload documents and taxonomy and clear the
    /// selection and filter. Nothing changes locally unless every step succeeds.
    ///
    /// Rejected while an upload is busy. Until it finishes, uploads and other
    /// resets are rejected with `ResetInProgress`.
    pub async fn reset(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if state.upload.state().is_busy() {
                return Err(self.surface(&mut state, Error::UploadInProgress));
            }
            if state.resetting {
                return Err(self.surface(&mut state, Error::ResetInProgress));
            }
            state.resetting = true;
        }

        let fetched = match self.backend.reset_documents().await {
            Ok(()) => tokio::try_join!(self.backend.list_taxonomy(), self.backend.list_documents()),
            Err(e) => Err(e),
        };

        let mut state = self.state.write().await;
        state.resetting = false;
        let (groups, documents) = match fetched {
            Ok(pair) => pair,
            Err(e) => return Err(self.surface(&mut state, e)),
        };
        state.taxonomy = TaxonomyIndex::new(groups);
        state.replace_documents(documents);
        state.store.deselect();
        state.filter.clear();
        let document_count = state.store.len();
        drop(state);

        info!(documents = document_count, "Reset complete");
        self.emit(EngineEvent::SelectionChanged {
            id: None,
            timestamp: Utc::now(),
        });
        self.emit(EngineEvent::FilterChanged {
            tags: Vec::new(),
            timestamp: Utc::now(),
        });
        self.emit(EngineEvent::ResetCompleted {
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Surface `err`, wait out the minimum busy time and settle to Idle
    async fn abort_upload(&self, err: Error) -> Error {
        let err = {
            let mut state = self.state.write().await;
            self.surface(&mut state, err)
        };
        self.settle_upload().await;
        err
    }

    async fn settle_upload(&self) {
        let remaining = self.read(|s| s.upload.remaining_busy()).await;
        if !remaining.is_zero() {
            debug!(?remaining, "Holding busy state for minimum duration");
            tokio::time::sleep(remaining).await;
        }

        let transition = self.state.write().await.upload.settle();
        self.emit_transition(transition);
    }

    /// Store the error in the slot and announce it
    fn surface(&self, state: &mut EngineState, err: Error) -> Error {
        let message = err.user_message();
        warn!(error = %err, "Operation failed");
        state.last_error = Some(message.clone());
        self.emit(EngineEvent::ErrorRaised {
            message,
            timestamp: Utc::now(),
        });
        err
    }

    fn emit_transition(&self, transition: StateTransition) {
        self.emit(EngineEvent::UploadStateChanged {
            old_state: transition.old_state,
            new_state: transition.new_state,
            timestamp: transition.transitioned_at,
        });
    }

    fn emit(&self, event: EngineEvent) {
        self.events.emit_lossy(event);
    }
}
