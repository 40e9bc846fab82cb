use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use resona_core::discography::unresolved_album::UnresolvedAlbum;

use crate::clients::musicbrainz::MusicBrainzApi;
use crate::clients::spotify::SpotifyApi;
use crate::similarity::similarity;

const SEARCH_LIMIT: u8 = 5;
/// Minimum combined score a fuzzy release-group candidate must exceed.
const MUSICBRAINZ_ACCEPT_THRESHOLD: f64 = 0.7;
/// Minimum combined score a Spotify album candidate must exceed.
const SPOTIFY_ACCEPT_THRESHOLD: f64 = 0.6;

/// Descriptor of the release whose identity should be resolved, built from
/// whatever the primary source knows. Owned by the caller, never persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    pub title: String,
    /// Ordered credits; the first entry is the primary artist.
    pub artists: Vec<String>,
    pub year: Option<i32>,
    pub barcode: Option<String>,
    pub catalog_number: Option<String>,
    pub label: Option<String>,
}

impl ReleaseDescriptor {
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }

    /// The first barcode wins when the primary source carries several.
    pub fn from_unresolved(album: &UnresolvedAlbum) -> Self {
        ReleaseDescriptor {
            title: album.title.clone(),
            artists: album.artists.clone(),
            year: album.year,
            barcode: album.barcodes.first().cloned(),
            catalog_number: album.catalog_number.clone(),
            label: album.label.clone(),
        }
    }
}

/// Best-effort foreign identifiers. An absent field means "no confident
/// match in that catalog", never an error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolvedAlbumIds {
    pub release_group_id: Option<String>,
    pub release_id: Option<String>,
    pub spotify_album_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct MusicBrainzMatch {
    release_group_id: Option<String>,
    release_id: Option<String>,
}

/// One rung of the MusicBrainz lookup ladder. Strategies run in order and
/// the first one that produces a match wins; a strategy that fails or does
/// not apply yields `None` and the ladder moves on.
#[async_trait]
trait ReleaseLookupStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    async fn attempt(&self, descriptor: &ReleaseDescriptor) -> Option<MusicBrainzMatch>;
}

/// Barcodes identify one physical edition, so the first hit is taken
/// without any scoring.
struct BarcodeLookup {
    client: Arc<dyn MusicBrainzApi>,
}

#[async_trait]
impl ReleaseLookupStrategy for BarcodeLookup {
    fn name(&self) -> &'static str {
        "barcode"
    }

    async fn attempt(&self, descriptor: &ReleaseDescriptor) -> Option<MusicBrainzMatch> {
        let barcode = descriptor.barcode.as_deref().filter(|code| !code.is_empty())?;

        let releases = match self.client.search_by_barcode(barcode).await {
            Ok(releases) => releases,
            Err(error) => {
                warn!(error = %error, barcode, "barcode lookup failed, falling through");
                return None;
            }
        };

        let hit = releases.into_iter().next()?;
        Some(MusicBrainzMatch {
            release_group_id: hit.release_group.map(|group| group.id),
            release_id: Some(hit.id),
        })
    }
}

/// Catalog numbers are label-scoped edition identifiers; like barcodes the
/// first hit is authoritative.
struct CatalogNumberLookup {
    client: Arc<dyn MusicBrainzApi>,
}

#[async_trait]
impl ReleaseLookupStrategy for CatalogNumberLookup {
    fn name(&self) -> &'static str {
        "catalog-number"
    }

    async fn attempt(&self, descriptor: &ReleaseDescriptor) -> Option<MusicBrainzMatch> {
        let catno = descriptor.catalog_number.as_deref().filter(|c| !c.is_empty())?;

        let releases = match self.client.search_by_catno(catno, descriptor.label.as_deref()).await {
            Ok(releases) => releases,
            Err(error) => {
                warn!(error = %error, catno, "catalog-number lookup failed, falling through");
                return None;
            }
        };

        let hit = releases.into_iter().next()?;
        Some(MusicBrainzMatch {
            release_group_id: hit.release_group.map(|group| group.id),
            release_id: Some(hit.id),
        })
    }
}

/// Free-text release-group search, scored against the descriptor. Only a
/// candidate whose score exceeds the confidence threshold is accepted, and
/// it contributes a release-group id only.
struct FuzzySearch {
    client: Arc<dyn MusicBrainzApi>,
}

impl FuzzySearch {
    fn build_query(descriptor: &ReleaseDescriptor) -> String {
        let mut query = format!("releasegroup:\"{}\"", descriptor.title);
        if let Some(artist) = descriptor.primary_artist() {
            query.push_str(&format!(" AND artist:\"{artist}\""));
        }
        if let Some(year) = descriptor.year {
            query.push_str(&format!(" AND firstreleasedate:{year}"));
        }
        query
    }
}

#[async_trait]
impl ReleaseLookupStrategy for FuzzySearch {
    fn name(&self) -> &'static str {
        "fuzzy-search"
    }

    async fn attempt(&self, descriptor: &ReleaseDescriptor) -> Option<MusicBrainzMatch> {
        let query = Self::build_query(descriptor);
        let candidates = match self.client.search_release_groups(&query, SEARCH_LIMIT).await {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!(error = %error, "release-group search failed, falling through");
                return None;
            }
        };

        let artist = descriptor.primary_artist().unwrap_or_default();
        let mut best: Option<(f64, String)> = None;
        for candidate in candidates {
            let title_score = similarity(&descriptor.title, &candidate.title);
            let artist_score = similarity(artist, candidate.primary_artist().unwrap_or_default());
            let score = 0.6 * title_score + 0.4 * artist_score;
            debug!(candidate = %candidate.title, score, "scored release-group candidate");

            // Strict comparison keeps the first maximal candidate on ties.
            if best.as_ref().is_none_or(|(top, _)| score > *top) {
                best = Some((score, candidate.id));
            }
        }

        let (score, release_group_id) = best?;
        if score <= MUSICBRAINZ_ACCEPT_THRESHOLD {
            debug!(score, "best release-group candidate below confidence threshold");
            return None;
        }

        Some(MusicBrainzMatch {
            release_group_id: Some(release_group_id),
            release_id: None,
        })
    }
}

/// Resolves the identity of one release across MusicBrainz and Spotify.
/// Both catalogs are queried concurrently and each branch converts its own
/// failures into absent ids, so resolution itself never fails.
pub struct AlbumResolver {
    spotify: Arc<dyn SpotifyApi>,
    strategies: Vec<Box<dyn ReleaseLookupStrategy>>,
}

impl AlbumResolver {
    pub fn new(musicbrainz: Arc<dyn MusicBrainzApi>, spotify: Arc<dyn SpotifyApi>) -> Self {
        let strategies: Vec<Box<dyn ReleaseLookupStrategy>> = vec![
            Box::new(BarcodeLookup {
                client: Arc::clone(&musicbrainz),
            }),
            Box::new(CatalogNumberLookup {
                client: Arc::clone(&musicbrainz),
            }),
            Box::new(FuzzySearch {
                client: musicbrainz,
            }),
        ];

        AlbumResolver {
            spotify,
            strategies,
        }
    }

    pub async fn resolve_album_ids(&self, descriptor: &ReleaseDescriptor) -> ResolvedAlbumIds {
        let (musicbrainz, spotify_album_id) = join(
            self.resolve_musicbrainz(descriptor),
            self.resolve_spotify(descriptor),
        )
        .await;

        let musicbrainz = musicbrainz.unwrap_or_default();
        ResolvedAlbumIds {
            release_group_id: musicbrainz.release_group_id,
            release_id: musicbrainz.release_id,
            spotify_album_id,
        }
    }

    async fn resolve_musicbrainz(&self, descriptor: &ReleaseDescriptor) -> Option<MusicBrainzMatch> {
        for strategy in &self.strategies {
            if let Some(found) = strategy.attempt(descriptor).await {
                info!(strategy = strategy.name(), "MusicBrainz match accepted");
                return Some(found);
            }
            debug!(strategy = strategy.name(), "strategy produced no match");
        }
        None
    }

    async fn resolve_spotify(&self, descriptor: &ReleaseDescriptor) -> Option<String> {
        let mut query = format!("album:\"{}\"", descriptor.title);
        if let Some(artist) = descriptor.primary_artist() {
            query.push_str(&format!(" artist:\"{artist}\""));
        }
        if let Some(year) = descriptor.year {
            query.push_str(&format!(" year:{year}"));
        }

        let candidates = match self.spotify.search_albums(&query, SEARCH_LIMIT).await {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!(error = %error, "Spotify album search failed");
                return None;
            }
        };

        let artist = descriptor.primary_artist().unwrap_or_default();
        let mut best: Option<(f64, String)> = None;
        for candidate in candidates {
            let title_score = similarity(&descriptor.title, &candidate.name);
            let artist_score = similarity(artist, candidate.primary_artist().unwrap_or_default());
            let year_score = year_proximity(descriptor.year, candidate.release_year());
            let score = 0.45 * title_score + 0.4 * artist_score + 0.15 * year_score;
            debug!(candidate = %candidate.name, score, "scored Spotify candidate");

            if best.as_ref().is_none_or(|(top, _)| score > *top) {
                best = Some((score, candidate.id));
            }
        }

        let (score, album_id) = best?;
        if score <= SPOTIFY_ACCEPT_THRESHOLD {
            debug!(score, "best Spotify candidate below confidence threshold");
            return None;
        }

        Some(album_id)
    }
}

/// 1.0 when either side has no year or they match exactly; otherwise decays
/// with the distance, floored at 0.5.
fn year_proximity(left: Option<i32>, right: Option<i32>) -> f64 {
    match (left, right) {
        (Some(left), Some(right)) if left != right => {
            let diff = f64::from((left - right).abs());
            (1.0 - 0.15 * diff).max(0.5)
        }
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::clients::musicbrainz::{
        ArtistCredit, ReleaseGroup, ReleaseGroupHit, ReleaseGroupRef, ReleaseHit,
    };
    use crate::clients::spotify::{SpotifyAlbum, SpotifyArtist};
    use crate::error::ClientError;

    #[derive(Default)]
    struct FakeMusicBrainz {
        barcode_hits: Vec<ReleaseHit>,
        catno_hits: Vec<ReleaseHit>,
        search_hits: Vec<ReleaseGroupHit>,
        fail: bool,
        search_calls: AtomicU32,
    }

    #[async_trait]
    impl MusicBrainzApi for FakeMusicBrainz {
        async fn get_release_group(&self, _id: &str) -> Result<ReleaseGroup, ClientError> {
            Err(ClientError::Status(503))
        }

        async fn search_release_groups(
            &self,
            _query: &str,
            _limit: u8,
        ) -> Result<Vec<ReleaseGroupHit>, ClientError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ClientError::Status(503));
            }
            Ok(self.search_hits.clone())
        }

        async fn search_by_barcode(&self, _barcode: &str) -> Result<Vec<ReleaseHit>, ClientError> {
            if self.fail {
                return Err(ClientError::Status(503));
            }
            Ok(self.barcode_hits.clone())
        }

        async fn search_by_catno(
            &self,
            _catno: &str,
            _label: Option<&str>,
        ) -> Result<Vec<ReleaseHit>, ClientError> {
            if self.fail {
                return Err(ClientError::Status(503));
            }
            Ok(self.catno_hits.clone())
        }
    }

    #[derive(Default)]
    struct FakeSpotify {
        search_hits: Vec<SpotifyAlbum>,
        fail: bool,
    }

    #[async_trait]
    impl SpotifyApi for FakeSpotify {
        async fn get_album(&self, _id: &str) -> Result<SpotifyAlbum, ClientError> {
            Err(ClientError::Status(503))
        }

        async fn search_albums(
            &self,
            _query: &str,
            _limit: u8,
        ) -> Result<Vec<SpotifyAlbum>, ClientError> {
            if self.fail {
                return Err(ClientError::Unconfigured);
            }
            Ok(self.search_hits.clone())
        }
    }

    fn release_hit(release_id: &str, release_group_id: &str) -> ReleaseHit {
        ReleaseHit {
            id: release_id.to_string(),
            title: "whatever".to_string(),
            release_group: Some(ReleaseGroupRef {
                id: release_group_id.to_string(),
            }),
        }
    }

    fn group_hit(id: &str, title: &str, artist: &str) -> ReleaseGroupHit {
        ReleaseGroupHit {
            id: id.to_string(),
            title: title.to_string(),
            artist_credit: vec![ArtistCredit {
                name: artist.to_string(),
            }],
        }
    }

    fn spotify_album(id: &str, name: &str, artist: &str, year: Option<&str>) -> SpotifyAlbum {
        SpotifyAlbum {
            id: id.to_string(),
            name: name.to_string(),
            artists: vec![SpotifyArtist {
                name: artist.to_string(),
            }],
            release_date: year.map(str::to_string),
            popularity: None,
            external_urls: Default::default(),
            images: vec![],
        }
    }

    fn resolver(musicbrainz: FakeMusicBrainz, spotify: FakeSpotify) -> AlbumResolver {
        AlbumResolver::new(Arc::new(musicbrainz), Arc::new(spotify))
    }

    #[tokio::test]
    async fn barcode_match_bypasses_scoring_and_later_strategies() {
        let musicbrainz = FakeMusicBrainz {
            barcode_hits: vec![release_hit("rel-1", "rg-1")],
            // Garbage fuzzy hits that would never pass the threshold.
            search_hits: vec![group_hit("rg-wrong", "Completely Different", "Nobody")],
            ..Default::default()
        };
        let musicbrainz = Arc::new(musicbrainz);
        let resolver = AlbumResolver::new(
            Arc::clone(&musicbrainz) as Arc<dyn MusicBrainzApi>,
            Arc::new(FakeSpotify::default()),
        );

        let descriptor = ReleaseDescriptor {
            title: "Abbey Roda [misspelled rip]".to_string(),
            artists: vec!["The Baetles".to_string()],
            barcode: Some("5099969944123".to_string()),
            ..Default::default()
        };
        let ids = resolver.resolve_album_ids(&descriptor).await;

        assert_eq!(ids.release_group_id.as_deref(), Some("rg-1"));
        assert_eq!(ids.release_id.as_deref(), Some("rel-1"));
        assert_eq!(musicbrainz.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn catalog_number_is_tried_when_barcode_is_absent() {
        let musicbrainz = FakeMusicBrainz {
            catno_hits: vec![release_hit("rel-9", "rg-9")],
            ..Default::default()
        };
        let resolver = resolver(musicbrainz, FakeSpotify::default());

        let descriptor = ReleaseDescriptor {
            title: "Unknown Pleasures".to_string(),
            artists: vec!["Joy Division".to_string()],
            catalog_number: Some("FACT 10".to_string()),
            label: Some("Factory".to_string()),
            ..Default::default()
        };
        let ids = resolver.resolve_album_ids(&descriptor).await;

        assert_eq!(ids.release_group_id.as_deref(), Some("rg-9"));
        assert_eq!(ids.release_id.as_deref(), Some("rel-9"));
    }

    #[tokio::test]
    async fn all_failing_clients_resolve_to_all_absent() {
        let musicbrainz = FakeMusicBrainz {
            fail: true,
            ..Default::default()
        };
        let spotify = FakeSpotify {
            fail: true,
            ..Default::default()
        };
        let resolver = resolver(musicbrainz, spotify);

        let descriptor = ReleaseDescriptor {
            title: "In Rainbows".to_string(),
            artists: vec!["Radiohead".to_string()],
            barcode: Some("634904032425".to_string()),
            catalog_number: Some("TBD1".to_string()),
            ..Default::default()
        };
        let ids = resolver.resolve_album_ids(&descriptor).await;

        assert_eq!(ids, ResolvedAlbumIds::default());
    }

    #[tokio::test]
    async fn fuzzy_candidate_at_exactly_the_threshold_is_rejected() {
        // Title matches exactly (1.0); artist overlap is one of four tokens
        // (0.25). Combined: 0.6 * 1.0 + 0.4 * 0.25 = 0.70, not above 0.7.
        let musicbrainz = FakeMusicBrainz {
            search_hits: vec![group_hit("rg-2", "Meddle", "The Division Bell")],
            ..Default::default()
        };
        let resolver = resolver(musicbrainz, FakeSpotify::default());

        let descriptor = ReleaseDescriptor {
            title: "Meddle".to_string(),
            artists: vec!["The Wall".to_string()],
            ..Default::default()
        };
        let ids = resolver.resolve_album_ids(&descriptor).await;

        assert_eq!(ids.release_group_id, None);
    }

    #[tokio::test]
    async fn fuzzy_candidate_above_the_threshold_contributes_group_id_only() {
        // Title matches exactly (1.0); artist overlap is one of three tokens
        // (1/3). Combined: 0.6 + 0.4 / 3 ≈ 0.733 > 0.7.
        let musicbrainz = FakeMusicBrainz {
            search_hits: vec![group_hit("rg-3", "Meddle", "alpha gamma")],
            ..Default::default()
        };
        let resolver = resolver(musicbrainz, FakeSpotify::default());

        let descriptor = ReleaseDescriptor {
            title: "Meddle".to_string(),
            artists: vec!["alpha beta".to_string()],
            ..Default::default()
        };
        let ids = resolver.resolve_album_ids(&descriptor).await;

        assert_eq!(ids.release_group_id.as_deref(), Some("rg-3"));
        assert_eq!(ids.release_id, None);
    }

    #[tokio::test]
    async fn fuzzy_keeps_the_first_of_equally_scored_candidates() {
        let musicbrainz = FakeMusicBrainz {
            search_hits: vec![
                group_hit("rg-first", "Meddle", "Pink Floyd"),
                group_hit("rg-second", "Meddle", "Pink Floyd"),
            ],
            ..Default::default()
        };
        let resolver = resolver(musicbrainz, FakeSpotify::default());

        let descriptor = ReleaseDescriptor {
            title: "Meddle".to_string(),
            artists: vec!["Pink Floyd".to_string()],
            ..Default::default()
        };
        let ids = resolver.resolve_album_ids(&descriptor).await;

        assert_eq!(ids.release_group_id.as_deref(), Some("rg-first"));
    }

    #[tokio::test]
    async fn spotify_candidate_at_exactly_the_threshold_is_rejected() {
        // Title exact (1.0), artist disjoint (0.0), years equal (1.0):
        // 0.45 + 0.0 + 0.15 = 0.60, not above 0.6.
        let spotify = FakeSpotify {
            search_hits: vec![spotify_album("sp-1", "Meddle", "Zebra Quartet", Some("1971"))],
            ..Default::default()
        };
        let resolver = resolver(FakeMusicBrainz::default(), spotify);

        let descriptor = ReleaseDescriptor {
            title: "Meddle".to_string(),
            artists: vec!["Pink Floyd".to_string()],
            year: Some(1971),
            ..Default::default()
        };
        let ids = resolver.resolve_album_ids(&descriptor).await;

        assert_eq!(ids.spotify_album_id, None);
    }

    #[tokio::test]
    async fn spotify_candidate_above_the_threshold_is_accepted() {
        // Title exact, artist one-of-three-token overlap, years equal:
        // 0.45 + 0.4 / 3 + 0.15 ≈ 0.733 > 0.6.
        let spotify = FakeSpotify {
            search_hits: vec![spotify_album("sp-2", "Meddle", "alpha gamma", Some("1971"))],
            ..Default::default()
        };
        let resolver = resolver(FakeMusicBrainz::default(), spotify);

        let descriptor = ReleaseDescriptor {
            title: "Meddle".to_string(),
            artists: vec!["alpha beta".to_string()],
            year: Some(1971),
            ..Default::default()
        };
        let ids = resolver.resolve_album_ids(&descriptor).await;

        assert_eq!(ids.spotify_album_id.as_deref(), Some("sp-2"));
    }

    #[tokio::test]
    async fn spotify_failure_does_not_affect_the_musicbrainz_branch() {
        let musicbrainz = FakeMusicBrainz {
            barcode_hits: vec![release_hit("rel-5", "rg-5")],
            ..Default::default()
        };
        let spotify = FakeSpotify {
            fail: true,
            ..Default::default()
        };
        let resolver = resolver(musicbrainz, spotify);

        let descriptor = ReleaseDescriptor {
            title: "Blue Train".to_string(),
            artists: vec!["John Coltrane".to_string()],
            barcode: Some("724349532724".to_string()),
            ..Default::default()
        };
        let ids = resolver.resolve_album_ids(&descriptor).await;

        assert_eq!(ids.release_group_id.as_deref(), Some("rg-5"));
        assert_eq!(ids.spotify_album_id, None);
    }

    #[test]
    fn year_proximity_decays_and_floors() {
        assert_eq!(year_proximity(None, Some(1999)), 1.0);
        assert_eq!(year_proximity(Some(1999), None), 1.0);
        assert_eq!(year_proximity(Some(1999), Some(1999)), 1.0);
        assert!((year_proximity(Some(1999), Some(2001)) - 0.7).abs() < 1e-9);
        assert_eq!(year_proximity(Some(1990), Some(2001)), 0.5);
    }
}
