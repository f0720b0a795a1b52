//! Provider link normalisation.
//!
//! The link resolver hands out public web URLs; playlists need the provider's
//! own identifiers (a Spotify URI, a bare Deezer track id).

const SPOTIFY_TRACK_URL: &str = "https://open.spotify.com/track/";
const SPOTIFY_TRACK_URI: &str = "spotify:track:";
const DEEZER_HOST: &str = "deezer.com/";

/// `https://open.spotify.com/track/<id>` into `spotify:track:<id>`
pub fn spotify_uri(link: &str) -> Option<String> {
    let link = link.trim();
    if link.starts_with(SPOTIFY_TRACK_URI) {
        return Some(link.to_string());
    }

    let id = link.strip_prefix(SPOTIFY_TRACK_URL)?;
    let id = id.split(['?', '#', '/']).next().unwrap_or_default();
    if id.is_empty() {
        return None;
    }
    Some(format!("{}{}", SPOTIFY_TRACK_URI, id))
}

/// `https://www.deezer.com/[<locale>/]track/<id>` into `<id>`
pub fn deezer_track_id(link: &str) -> Option<String> {
    let link = link.trim();
    if !link.is_empty() && link.chars().all(|c| c.is_ascii_digit()) {
        return Some(link.to_string());
    }

    let (_, path) = link.split_once(DEEZER_HOST)?;
    let mut segments = path.split(['/', '?', '#']);
    while let Some(segment) = segments.next() {
        if segment == "track" {
            return segments
                .next()
                .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
                .map(str::to_string);
        }
    }
    None
}
