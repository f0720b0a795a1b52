mod archive;
mod feed;
mod ids;
mod playlist;
mod provider;
mod track;

pub use archive::{ArchiveGroup, ArchiveView, Highlight, HighlightRefresh};
pub use feed::FeedEntry;
pub use ids::TrackId;
pub use playlist::{AccessToken, ExportPeriod, PlaylistSummary};
pub use provider::Provider;
pub use track::{
    CreateTrack, MissingLinks, ProviderLinks, ResolvedLinks, Track, UpdateTrackLinks,
};
