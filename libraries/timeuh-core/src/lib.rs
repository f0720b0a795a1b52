//! Timeuh Machine Core
//!
//! Domain types, traits, and error handling shared by the Timeuh Machine
//! crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `CreateTrack`, `Provider`, archive highlights
//! - **Pipeline rules**: the validity classifier, start-time resolution and
//!   provider link normalisation used while ingesting the now-playing feed
//! - **Collaborator traits**: `TrackStore`, `NowPlayingSource`, `LinkResolver`,
//!   `PlaylistService`
//! - **Error Handling**: Unified `TimeuhError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use timeuh_core::classify::{Classifier, ExcludeRules};
//! use timeuh_core::types::CreateTrack;
//!
//! let started_at = NaiveDate::from_ymd_opt(2024, 5, 17)
//!     .unwrap()
//!     .and_hms_opt(14, 3, 0)
//!     .unwrap();
//! let track = CreateTrack::new(" Teardrop ", "Mezzanine", "Massive Attack", "", started_at);
//!
//! let classifier = Classifier::new("radiomeuh", ExcludeRules::default());
//! assert!(classifier.classify(&track).is_valid());
//! ```

#![forbid(unsafe_code)]

pub mod calendar;
pub mod classify;
pub mod error;
pub mod links;
pub mod schedule;
pub mod storage;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{Result, TimeuhError};
pub use storage::TrackStore;
pub use traits::{LinkResolver, NowPlayingSource, PlaylistService};

pub use types::{
    AccessToken, ArchiveGroup, ArchiveView, CreateTrack, ExportPeriod, FeedEntry, Highlight,
    HighlightRefresh, MissingLinks, PlaylistSummary, Provider, ProviderLinks, ResolvedLinks,
    Track, TrackId, UpdateTrackLinks,
};
