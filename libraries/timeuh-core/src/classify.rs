//! Song vs. everything-else classification.
//!
//! The station broadcasts jingles, podcasts and show episodes through the same
//! now-playing feed as songs. Only songs are shown and exported, so every
//! incoming track is run through a [`Classifier`] before it is stored.

use regex::{Regex, RegexBuilder};
use std::fmt;

use crate::error::{Result, TimeuhError};
use crate::types::CreateTrack;

/// Track field an exclude pattern applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Album,
    Artist,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Title => "title",
            Field::Album => "album",
            Field::Artist => "artist",
        })
    }
}

/// Why a track is not a song
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Station jingle or station self-promotion
    Jingle,
    /// Fewer than two of title, album and artist are filled
    Incomplete,
    /// Title mentions a podcast
    Podcast,
    /// The album field carries a URL
    UrlAlbum,
    /// A configured exclude pattern matched
    Excluded { field: Field, pattern: String },
    /// Looks like a numbered episode
    Episode,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Jingle => f.write_str("jingle"),
            Rejection::Incomplete => f.write_str("incomplete metadata"),
            Rejection::Podcast => f.write_str("podcast"),
            Rejection::UrlAlbum => f.write_str("url in album"),
            Rejection::Excluded { field, pattern } => {
                write!(f, "{} matches exclude pattern '{}'", field, pattern)
            }
            Rejection::Episode => f.write_str("episode"),
        }
    }
}

/// Classification outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid(Rejection),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }
}

/// Configured exclude patterns, per field.
///
/// Patterns are matched against the lower-cased field value.
#[derive(Debug, Clone, Default)]
pub struct ExcludeRules {
    title: Vec<Regex>,
    album: Vec<Regex>,
    artist: Vec<Regex>,
}

impl ExcludeRules {
    /// Compile exclude patterns; any invalid pattern is a configuration error.
    pub fn compile<S: AsRef<str>>(title: &[S], album: &[S], artist: &[S]) -> Result<Self> {
        Ok(Self {
            title: compile_all(Field::Title, title)?,
            album: compile_all(Field::Album, album)?,
            artist: compile_all(Field::Artist, artist)?,
        })
    }

    fn for_field(&self, field: Field) -> &[Regex] {
        match field {
            Field::Title => &self.title,
            Field::Album => &self.album,
            Field::Artist => &self.artist,
        }
    }

    /// Total number of patterns
    pub fn len(&self) -> usize {
        self.title.len() + self.album.len() + self.artist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn compile_all<S: AsRef<str>>(field: Field, patterns: &[S]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p.as_ref()).map_err(|e| {
                TimeuhError::config(format!(
                    "Invalid {} exclude pattern '{}': {}",
                    field,
                    p.as_ref(),
                    e
                ))
            })
        })
        .collect()
}

/// Decides whether a broadcast track is a song
#[derive(Debug, Clone)]
pub struct Classifier {
    station_name: String,
    excludes: ExcludeRules,
    episodes: Vec<Regex>,
}

impl Classifier {
    /// `station_name` is matched case-insensitively in titles and artists.
    pub fn new(station_name: impl AsRef<str>, excludes: ExcludeRules) -> Self {
        let episodes = [r"S[0-9]+\s?[-—]\s?Ep[0-9]+", r"Episode\s[0-9]+"]
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .expect("episode patterns are valid")
            })
            .collect();

        Self {
            station_name: station_name.as_ref().trim().to_lowercase(),
            excludes,
            episodes,
        }
    }

    /// Classify a track; checks run from cheapest to most specific and the
    /// first failing one wins.
    pub fn classify(&self, track: &CreateTrack) -> Validity {
        match self.rejection(track) {
            Some(rejection) => Validity::Invalid(rejection),
            None => Validity::Valid,
        }
    }

    fn rejection(&self, track: &CreateTrack) -> Option<Rejection> {
        let title = track.title.to_lowercase();
        let album = track.album.to_lowercase();
        let artist = track.artist.to_lowercase();

        let mentions_station = !self.station_name.is_empty()
            && (title.contains(&self.station_name) || artist.contains(&self.station_name));
        if title.contains("jingle") || artist.contains("jingle") || mentions_station {
            return Some(Rejection::Jingle);
        }

        let filled = [&title, &album, &artist]
            .iter()
            .filter(|v| !v.is_empty())
            .count();
        if filled < 2 {
            return Some(Rejection::Incomplete);
        }

        if title.contains("podcast") {
            return Some(Rejection::Podcast);
        }

        if album.contains(".com/") {
            return Some(Rejection::UrlAlbum);
        }

        for (field, value) in [
            (Field::Title, &title),
            (Field::Album, &album),
            (Field::Artist, &artist),
        ] {
            if let Some(regex) = self
                .excludes
                .for_field(field)
                .iter()
                .find(|r| r.is_match(value))
            {
                return Some(Rejection::Excluded {
                    field,
                    pattern: regex.as_str().to_string(),
                });
            }
        }

        if self.episodes.iter().any(|r| r.is_match(&title)) {
            return Some(Rejection::Episode);
        }

        None
    }
}
