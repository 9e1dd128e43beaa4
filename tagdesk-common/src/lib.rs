//! # TagDesk Common Library
//!
//! Shared code for the TagDesk client crates:
//! - Error type
//! - Configuration loading and base URL resolution
//! - Tracing subscriber setup
//! - Engine event types (EngineEvent enum) and EventBus

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{EngineEvent, EventBus};
