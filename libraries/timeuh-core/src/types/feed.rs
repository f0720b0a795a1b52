/// Now-playing feed entry
use serde::{Deserialize, Serialize};

/// One entry of the station's now-playing feed, as broadcast.
///
/// `time` is the wall-clock start time (`HH:MM:SS`) in the station timezone,
/// without any date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub time: String,
    pub title: String,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub image: Option<String>,
}
