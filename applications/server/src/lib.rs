//! Timeuh Machine Server Library
//!
//! Web server and commands of Timeuh Machine: feed ingestion, link repair,
//! archive highlights and playlist export.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod config;
pub mod error;
pub mod jobs;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use api::create_router;
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use services::{ArchiveService, ExportService, IngestService, RepairService};
pub use state::AppState;
