//! Upload workflow state machine
//!
//! Split display:   Idle → Busy(Uploading) → Busy(Analyzing) → Idle
//! Unified display: Idle → Busy(Processing) → Idle
//!
//! This type only tracks state. The controller performs the backend calls and
//! drives the transitions; it never reports Idle before the backend has
//! answered for the whole batch.

use crate::models::FileBlob;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tagdesk_common::config::BusyDisplay;
use tagdesk_common::events::UploadStatus;
use tokio::time::Instant;
use tracing::{debug, info};

/// What the workflow is busy with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusyPhase {
    /// Sending file `current` (1-based) of `total`
    Uploading {
        current: usize,
        total: usize,
        filename: String,
    },
    /// Files acknowledged, refreshing documents and selection
    Analyzing,
    /// Unified display: the whole batch
    Processing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Busy(BusyPhase),
}

impl UploadState {
    pub fn is_busy(&self) -> bool {
        matches!(self, UploadState::Busy(_))
    }

    pub fn status(&self) -> UploadStatus {
        match self {
            UploadState::Idle => UploadStatus::Idle,
            UploadState::Busy(BusyPhase::Uploading { .. }) => UploadStatus::Uploading,
            UploadState::Busy(BusyPhase::Analyzing) => UploadStatus::Analyzing,
            UploadState::Busy(BusyPhase::Processing) => UploadStatus::Processing,
        }
    }
}

/// Record of one status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub old_state: UploadStatus,
    pub new_state: UploadStatus,
    pub transitioned_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct UploadWorkflow {
    state: UploadState,
    staged: Vec<FileBlob>,
    display: BusyDisplay,
    min_busy: Duration,
    busy_since: Option<Instant>,
}

impl UploadWorkflow {
    pub fn new(display: BusyDisplay, min_busy: Duration) -> Self {
        Self {
            state: UploadState::Idle,
            staged: Vec::new(),
            display,
            min_busy,
            busy_since: None,
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn staged(&self) -> &[FileBlob] {
        &self.staged
    }

    /// Store a batch for the next `begin`. Replaces any earlier batch.
    pub fn stage(&mut self, files: Vec<FileBlob>) -> Result<()> {
        if self.state.is_busy() {
            return Err(Error::UploadInProgress);
        }
        debug!(count = files.len(), "Staged files for upload");
        self.staged = files;
        Ok(())
    }

    /// Enter the busy state and hand out the batch to upload.
    ///
    /// The staged batch stays owned by the workflow until `settle`.
    pub fn begin(&mut self) -> Result<(Vec<FileBlob>, StateTransition)> {
        if self.state.is_busy() {
            return Err(Error::UploadInProgress);
        }
        if self.staged.is_empty() {
            return Err(Error::NothingStaged);
        }

        let first = match self.display {
            BusyDisplay::Split => BusyPhase::Uploading {
                current: 1,
                total: self.staged.len(),
                filename: self.staged[0].name.clone(),
            },
            BusyDisplay::Unified => BusyPhase::Processing,
        };
        self.busy_since = Some(Instant::now());
        let transition = self.transition_to(UploadState::Busy(first));
        Ok((self.staged.clone(), transition))
    }

    /// Note that file `index` (0-based) is being sent. Only the split
    /// display tracks per-file progress; the status itself does not change.
    pub fn file_started(&mut self, index: usize) {
        if let UploadState::Busy(BusyPhase::Uploading { .. }) = self.state {
            if let Some(file) = self.staged.get(index) {
                self.state = UploadState::Busy(BusyPhase::Uploading {
                    current: index + 1,
                    total: self.staged.len(),
                    filename: file.name.clone(),
                });
            }
        }
    }

    /// All files acknowledged. Split display moves to Analyzing.
    pub fn begin_analyzing(&mut self) -> Option<StateTransition> {
        match self.state {
            UploadState::Busy(BusyPhase::Uploading { .. }) => {
                Some(self.transition_to(UploadState::Busy(BusyPhase::Analyzing)))
            }
            _ => None,
        }
    }

    /// Time left before the minimum busy duration is reached
    pub fn remaining_busy(&self) -> Duration {
        match self.busy_since {
            Some(since) => self.min_busy.saturating_sub(since.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Return to Idle and drop the staged batch, on success and failure alike
    pub fn settle(&mut self) -> StateTransition {
        self.staged.clear();
        self.busy_since = None;
        self.transition_to(UploadState::Idle)
    }

    fn transition_to(&mut self, new_state: UploadState) -> StateTransition {
        let transition = StateTransition {
            old_state: self.state.status(),
            new_state: new_state.status(),
            transitioned_at: Utc::now(),
        };
        info!(
            old_state = ?transition.old_state,
            new_state = ?transition.new_state,
            "Upload workflow transition"
        );
        self.state = new_state;
        transition
    }
}
