//! Event types for the TagDesk event system
//!
//! Provides the engine event definitions and the EventBus UI layers subscribe to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Coarse upload workflow status carried on events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Idle,
    Uploading,
    Analyzing,
    Processing,
}

impl UploadStatus {
    /// True for every non-idle status
    pub fn is_busy(self) -> bool {
        !matches!(self, UploadStatus::Idle)
    }
}

/// Engine event types
///
/// Emitted by the controller after each state mutation so a front end can
/// re-derive what it displays. Serializable for forwarding over SSE or logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    /// Document list replaced by a fresh fetch
    DocumentsRefreshed {
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Taxonomy replaced by a fresh fetch
    TaxonomyRefreshed {
        groups: usize,
        timestamp: DateTime<Utc>,
    },

    /// Selected document changed (None when cleared)
    SelectionChanged {
        id: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Detail for the current selection arrived and was applied
    DetailLoaded {
        id: String,
        timestamp: DateTime<Utc>,
    },

    /// Active filter set changed
    FilterChanged {
        /// Filter tags in display order
        tags: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// Upload workflow moved between states
    UploadStateChanged {
        old_state: UploadStatus,
        new_state: UploadStatus,
        timestamp: DateTime<Utc>,
    },

    /// One file of the batch was acknowledged by the backend
    UploadFileCompleted {
        filename: String,
        /// 1-based position within the batch
        index: usize,
        total: usize,
        timestamp: DateTime<Utc>,
    },

    /// A failure was stored in the error slot
    ErrorRaised {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Error slot cleared by the user
    ErrorDismissed { timestamp: DateTime<Utc> },

    /// Backend reset finished and state was reloaded
    ResetCompleted { timestamp: DateTime<Utc> },
}

impl EngineEvent {
    /// Event name as used in the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            EngineEvent::DocumentsRefreshed { .. } => "DocumentsRefreshed",
            EngineEvent::TaxonomyRefreshed { .. } => "TaxonomyRefreshed",
            EngineEvent::SelectionChanged { .. } => "SelectionChanged",
            EngineEvent::DetailLoaded { .. } => "DetailLoaded",
            EngineEvent::FilterChanged { .. } => "FilterChanged",
            EngineEvent::UploadStateChanged { .. } => "UploadStateChanged",
            EngineEvent::UploadFileCompleted { .. } => "UploadFileCompleted",
            EngineEvent::ErrorRaised { .. } => "ErrorRaised",
            EngineEvent::ErrorDismissed { .. } => "ErrorDismissed",
            EngineEvent::ResetCompleted { .. } => "ResetCompleted",
        }
    }
}

/// Broadcast channel for engine events
///
/// Uses tokio::broadcast internally: publishing never blocks, slow
/// subscribers observe `Lagged` instead of stalling the controller.
///
/// # Examples
///
/// ```
/// use tagdesk_common::events::{EngineEvent, EventBus};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(EngineEvent::ResetCompleted {
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(EngineEvent::ResetCompleted { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    /// (at least one)
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: EngineEvent,
    ) -> Result<usize, broadcast::error::SendError<EngineEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
