use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures::future::join;
use tracing::{debug, info, warn};

use resona_core::discography::album::{AlbumId, AlbumUpdate};
use resona_core::discography::rating::{CommunityRating, Rating};

use crate::cache::{CacheTier, EnrichmentCache, cached};
use crate::clients::musicbrainz::{MusicBrainzApi, ReleaseGroup};
use crate::clients::spotify::{SpotifyAlbum, SpotifyApi, SpotifyImage};
use crate::store::AlbumStore;

/// Tag lists are capped to the most-voted entries.
const MAX_TAGS: usize = 20;

/// Tags, community rating and vote count from a MusicBrainz release-group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MusicBrainzEnrichment {
    pub tags: Vec<String>,
    pub rating: Option<f32>,
    pub rating_votes: u32,
}

/// Popularity, canonical link and best cover image from a Spotify album.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpotifyEnrichment {
    pub popularity: Option<u32>,
    pub url: Option<String>,
    pub cover_url: Option<String>,
}

/// Per-catalog outcome of one enrichment call. An absent side means that
/// catalog contributed nothing this time, whatever the reason.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnrichmentResult {
    pub musicbrainz: Option<MusicBrainzEnrichment>,
    pub spotify: Option<SpotifyEnrichment>,
}

/// Fetches supplementary metadata for already-resolved foreign ids and
/// merges it into the canonical record. Fetches go through the read-through
/// cache; the merge writes at most once, after both branches settle, and
/// only fields that actually carry a value.
pub struct AlbumEnricher {
    musicbrainz: Arc<dyn MusicBrainzApi>,
    spotify: Arc<dyn SpotifyApi>,
    cache: Arc<dyn EnrichmentCache>,
    store: Arc<dyn AlbumStore>,
}

impl AlbumEnricher {
    pub fn new(
        musicbrainz: Arc<dyn MusicBrainzApi>,
        spotify: Arc<dyn SpotifyApi>,
        cache: Arc<dyn EnrichmentCache>,
        store: Arc<dyn AlbumStore>,
    ) -> Self {
        AlbumEnricher {
            musicbrainz,
            spotify,
            cache,
            store,
        }
    }

    pub async fn enrich_album(
        &self,
        album_id: AlbumId,
        release_group_id: Option<&str>,
        spotify_album_id: Option<&str>,
    ) -> EnrichmentResult {
        let (musicbrainz, spotify) = join(
            self.fetch_musicbrainz(release_group_id),
            self.fetch_spotify(spotify_album_id),
        )
        .await;

        let result = EnrichmentResult {
            musicbrainz,
            spotify,
        };
        self.write_update(album_id, release_group_id, spotify_album_id, &result)
            .await;
        result
    }

    /// An absent id short-circuits to "no data" with zero network calls.
    async fn fetch_musicbrainz(
        &self,
        release_group_id: Option<&str>,
    ) -> Option<MusicBrainzEnrichment> {
        let id = release_group_id?;
        let key = format!("musicbrainz:{id}");
        let client = Arc::clone(&self.musicbrainz);

        let payload: ReleaseGroup = match cached(self.cache.as_ref(), &key, CacheTier::Long, || {
            async move { client.get_release_group(id).await }
        })
        .await
        {
            Ok(payload) => payload,
            Err(error) => {
                warn!(error = %error, release_group_id = id, "release-group fetch failed");
                return None;
            }
        };

        Some(extract_musicbrainz(payload))
    }

    async fn fetch_spotify(&self, spotify_album_id: Option<&str>) -> Option<SpotifyEnrichment> {
        let id = spotify_album_id?;
        let key = format!("spotify:{id}");
        let client = Arc::clone(&self.spotify);

        let payload: SpotifyAlbum = match cached(self.cache.as_ref(), &key, CacheTier::Medium, || {
            async move { client.get_album(id).await }
        })
        .await
        {
            Ok(payload) => payload,
            Err(error) => {
                warn!(error = %error, spotify_album_id = id, "album fetch failed");
                return None;
            }
        };

        Some(extract_spotify(&payload))
    }

    async fn write_update(
        &self,
        album_id: AlbumId,
        release_group_id: Option<&str>,
        spotify_album_id: Option<&str>,
        result: &EnrichmentResult,
    ) {
        let mut update = AlbumUpdate {
            musicbrainz_release_group_id: release_group_id.map(str::to_string),
            spotify_album_id: spotify_album_id.map(str::to_string),
            ..Default::default()
        };

        if let Some(musicbrainz) = &result.musicbrainz {
            if !musicbrainz.tags.is_empty() {
                update.tags = Some(musicbrainz.tags.clone());
            }
            if let Some(value) = musicbrainz.rating.and_then(Rating::new) {
                update.community_rating = Some(CommunityRating {
                    value,
                    votes: musicbrainz.rating_votes,
                });
            }
        }

        // External catalogs are authoritative for imagery, so a fetched
        // cover always replaces whatever the primary source provided.
        if let Some(spotify) = &result.spotify {
            if let Some(cover) = &spotify.cover_url {
                update.cover_url = Some(cover.clone());
            }
        }

        if update.is_noop() {
            debug!(album_id, "enrichment produced nothing to write");
            return;
        }

        update.updated_at_ms = Some(now_unix_ms());
        match self.store.update(album_id, update).await {
            Ok(()) => info!(album_id, "canonical album enriched"),
            Err(error) => warn!(error = %error, album_id, "canonical album update failed"),
        }
    }
}

fn extract_musicbrainz(payload: ReleaseGroup) -> MusicBrainzEnrichment {
    let mut tags: Vec<_> = payload
        .tags
        .into_iter()
        .filter(|tag| tag.count >= 1)
        .collect();
    // Stable sort: equally-voted tags keep their payload order.
    tags.sort_by(|a, b| b.count.cmp(&a.count));
    tags.truncate(MAX_TAGS);
    let tags = tags.into_iter().map(|tag| tag.name).collect();

    let (rating, rating_votes) = match payload.rating {
        Some(rating) => (rating.value, rating.votes_count),
        None => (None, 0),
    };

    MusicBrainzEnrichment {
        tags,
        rating,
        rating_votes,
    }
}

fn extract_spotify(payload: &SpotifyAlbum) -> SpotifyEnrichment {
    SpotifyEnrichment {
        popularity: payload.popularity,
        url: payload.spotify_url().map(str::to_string),
        cover_url: best_image(&payload.images).map(|image| image.url.clone()),
    }
}

/// Image with the greatest pixel area; the first maximal one wins ties.
fn best_image(images: &[SpotifyImage]) -> Option<&SpotifyImage> {
    let mut best: Option<(u64, &SpotifyImage)> = None;
    for image in images {
        let area = u64::from(image.width.unwrap_or(0)) * u64::from(image.height.unwrap_or(0));
        if best.is_none_or(|(top, _)| area > top) {
            best = Some((area, image));
        }
    }
    best.map(|(_, image)| image)
}

fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}
