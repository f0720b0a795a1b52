//! HTTP clients for the services Timeuh Machine talks to.
//!
//! - [`NowPlayingClient`]: the station's now-playing feed
//! - [`TuneefyClient`]: music-link resolution (share links, provider ids, covers)
//! - [`SpotifyClient`] and [`DeezerClient`]: OAuth and playlist APIs
//!
//! Each client implements the matching `timeuh_core` trait. Every base URL is
//! configurable so tests can point the clients at a mock server.

mod deezer;
mod error;
mod feed;
mod http;
mod spotify;
mod tuneefy;

pub use deezer::{DeezerClient, DeezerConfig};
pub use error::{ProviderError, Result};
pub use feed::NowPlayingClient;
pub use spotify::{SpotifyClient, SpotifyConfig};
pub use tuneefy::{TuneefyClient, TuneefyConfig};
