/// Streaming providers a playlist can be exported to
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TimeuhError;

/// Streaming service hosting exported playlists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Spotify,
    Deezer,
}

impl Provider {
    /// All supported providers
    pub const ALL: [Provider; 2] = [Provider::Spotify, Provider::Deezer];

    /// Lowercase identifier used in routes and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Spotify => "spotify",
            Provider::Deezer => "deezer",
        }
    }

    /// Column holding this provider's track identifier
    pub fn link_column(&self) -> &'static str {
        match self {
            Provider::Spotify => "spotify_link",
            Provider::Deezer => "deezer_link",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = TimeuhError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spotify" => Ok(Provider::Spotify),
            "deezer" => Ok(Provider::Deezer),
            other => Err(TimeuhError::invalid_input(format!(
                "Unknown provider '{}'",
                other
            ))),
        }
    }
}
