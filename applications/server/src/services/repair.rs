//! Re-enrichment of stored tracks whose links are missing
use chrono::NaiveDateTime;
use std::sync::Arc;
use timeuh_core::{
    LinkResolver, MissingLinks, Provider, Result, Track, TrackStore, UpdateTrackLinks,
};

/// Counts of a repair run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub updated: usize,
    pub remaining: usize,
}

pub struct RepairService {
    resolver: Arc<dyn LinkResolver>,
    store: Arc<dyn TrackStore>,
}

impl RepairService {
    pub fn new(resolver: Arc<dyn LinkResolver>, store: Arc<dyn TrackStore>) -> Self {
        Self { resolver, store }
    }

    /// Fill in one kind of missing link on the valid tracks lacking it,
    /// optionally only those started after `from`.
    pub async fn repair(
        &self,
        kind: MissingLinks,
        from: Option<NaiveDateTime>,
    ) -> Result<RepairReport> {
        let tracks = self.store.find_missing(kind, from).await?;
        tracing::info!(?kind, count = tracks.len(), "Repairing tracks");

        let mut report = RepairReport::default();

        for track in tracks {
            let update = match kind {
                MissingLinks::Tuneefy => self.resolve_again(&track).await,
                MissingLinks::Spotify => self.from_share_page(&track, Provider::Spotify).await,
                MissingLinks::Deezer => self.from_share_page(&track, Provider::Deezer).await,
            };

            match update {
                Some(update) => {
                    self.store.update_track_links(track.id, update).await?;
                    tracing::info!(id = %track.id, title = %track.title, "Track repaired");
                    report.updated += 1;
                }
                None => {
                    tracing::info!(id = %track.id, title = %track.title, "Nothing found");
                    report.remaining += 1;
                }
            }
        }

        Ok(report)
    }

    async fn resolve_again(&self, track: &Track) -> Option<UpdateTrackLinks> {
        let artist = track.artist.as_deref().unwrap_or_default();
        match self.resolver.resolve(&track.title, artist).await {
            Ok(links) => links.map(UpdateTrackLinks::from),
            Err(e) => {
                tracing::warn!(id = %track.id, error = %e, "Link resolution failed");
                None
            }
        }
    }

    async fn from_share_page(&self, track: &Track, provider: Provider) -> Option<UpdateTrackLinks> {
        let share_link = track.tuneefy_link.as_deref()?;
        let links = match self.resolver.links_for_share_page(share_link).await {
            Ok(links) => links,
            Err(e) => {
                tracing::warn!(id = %track.id, error = %e, "Share page unreadable");
                return None;
            }
        };

        let id = links.get(provider)?.to_string();
        let mut update = UpdateTrackLinks::default();
        match provider {
            Provider::Spotify => update.spotify_link = Some(id),
            Provider::Deezer => update.deezer_link = Some(id),
        }
        Some(update)
    }
}
