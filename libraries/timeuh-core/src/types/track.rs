/// Track domain type
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::types::{Provider, TrackId};

/// A broadcast track, as stored in the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Album name
    pub album: Option<String>,

    /// Artist name
    pub artist: Option<String>,

    /// Cover image URL
    pub image: Option<String>,

    /// Broadcast start, in the station's local time
    pub started_at: NaiveDateTime,

    /// Public share link from the link resolver
    pub tuneefy_link: Option<String>,

    /// Spotify track URI (`spotify:track:<id>`)
    pub spotify_link: Option<String>,

    /// Deezer track id
    pub deezer_link: Option<String>,

    /// Whether this is a real song (not a jingle, podcast, ...)
    pub valid: bool,

    /// When the row was recorded
    pub created_at: DateTime<Utc>,
}

impl Track {
    /// Identifier of this track on the given provider, if known
    pub fn link_for(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Spotify => self.spotify_link.as_deref(),
            Provider::Deezer => self.deezer_link.as_deref(),
        }
    }
}

/// A track about to be recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTrack {
    pub title: String,
    pub album: String,
    pub artist: String,
    pub image: String,
    pub started_at: NaiveDateTime,
    pub tuneefy_link: Option<String>,
    pub spotify_link: Option<String>,
    pub deezer_link: Option<String>,
    pub valid: bool,
}

impl CreateTrack {
    /// Build a track from raw feed values; every field is trimmed.
    ///
    /// The track starts out invalid until classified.
    pub fn new(
        title: impl AsRef<str>,
        album: impl AsRef<str>,
        artist: impl AsRef<str>,
        image: impl AsRef<str>,
        started_at: NaiveDateTime,
    ) -> Self {
        Self {
            title: title.as_ref().trim().to_string(),
            album: album.as_ref().trim().to_string(),
            artist: artist.as_ref().trim().to_string(),
            image: image.as_ref().trim().to_string(),
            started_at,
            tuneefy_link: None,
            spotify_link: None,
            deezer_link: None,
            valid: false,
        }
    }

    /// Recover `Artist - Title` values broadcast entirely in the artist field.
    pub fn clean(&mut self) {
        if !self.title.is_empty() {
            return;
        }

        static SPLIT: OnceLock<Regex> = OnceLock::new();
        let split = SPLIT.get_or_init(|| {
            Regex::new(r"^(?P<artist>[^-–—]+?)\s+[-–—]\s+(?P<title>[^-–—]+?)$")
                .expect("artist/title split pattern is valid")
        });

        let parts = split.captures(&self.artist).map(|caps| {
            (
                caps["artist"].trim().to_string(),
                caps["title"].trim().to_string(),
            )
        });

        if let Some((artist, title)) = parts {
            self.artist = artist;
            self.title = title;
        }
    }

    /// Apply the links found by the link resolver.
    ///
    /// The resolver's cover replaces the broadcast one when it has one.
    pub fn apply_links(&mut self, links: ResolvedLinks) {
        self.tuneefy_link = Some(links.share_link);
        self.spotify_link = links.providers.spotify;
        self.deezer_link = links.providers.deezer;
        if let Some(image) = links.image.filter(|i| !i.trim().is_empty()) {
            self.image = image;
        }
    }
}

/// Provider identifiers for a track
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderLinks {
    /// Spotify track URI
    pub spotify: Option<String>,
    /// Deezer track id
    pub deezer: Option<String>,
}

impl ProviderLinks {
    /// Identifier on the given provider
    pub fn get(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Spotify => self.spotify.as_deref(),
            Provider::Deezer => self.deezer.as_deref(),
        }
    }
}

/// Result of a successful link resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLinks {
    /// Public share link
    pub share_link: String,
    /// Provider identifiers
    pub providers: ProviderLinks,
    /// Album cover
    pub image: Option<String>,
}

/// Partial update of a stored track's links; `None` leaves a column untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTrackLinks {
    pub tuneefy_link: Option<String>,
    pub spotify_link: Option<String>,
    pub deezer_link: Option<String>,
    pub image: Option<String>,
}

impl From<ResolvedLinks> for UpdateTrackLinks {
    fn from(links: ResolvedLinks) -> Self {
        Self {
            tuneefy_link: Some(links.share_link),
            spotify_link: links.providers.spotify,
            deezer_link: links.providers.deezer,
            image: links.image.filter(|i| !i.trim().is_empty()),
        }
    }
}

/// Which enrichment is missing on a stored valid track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingLinks {
    /// Never resolved
    Tuneefy,
    /// Resolved, but no Spotify URI
    Spotify,
    /// Resolved, but no Deezer id
    Deezer,
}
