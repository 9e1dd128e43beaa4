//! tagdesk-client library - document tagging client engine
//!
//! Owns document and tag state, derives tag colors and filtered views, and
//! drives the upload workflow against the document backend.

pub mod backend;
pub mod colors;
pub mod controller;
pub mod error;
pub mod filter;
pub mod models;
pub mod store;
pub mod taxonomy;
pub mod upload;

pub use crate::backend::{DocumentBackend, HttpBackend};
pub use crate::controller::{AppController, EngineState, Snapshot, UploadReport};
pub use crate::error::{Error, Result};
pub use crate::models::{Document, DocumentId, FileBlob, ProcessedDocument, TagGroup};
