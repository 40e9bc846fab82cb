use std::sync::Arc;

use tracing::info;

use resona_core::discography::album::AlbumId;
use resona_core::discography::unresolved_album::UnresolvedAlbum;

use crate::cache::{EnrichmentCache, MemoryCache};
use crate::clients::musicbrainz::{MusicBrainzApi, MusicBrainzClient};
use crate::clients::spotify::{SpotifyApi, SpotifyClient};
use crate::config::EnrichmentConfig;
use crate::enricher::{AlbumEnricher, EnrichmentResult};
use crate::pacer::GovernorPacer;
use crate::resolver::{AlbumResolver, ReleaseDescriptor};
use crate::store::AlbumStore;

/// Entry point for callers that only hold primary-source metadata: chains
/// the resolver and the enricher behind one call.
pub struct EnrichmentManager {
    resolver: AlbumResolver,
    enricher: AlbumEnricher,
}

impl EnrichmentManager {
    /// Wires the production collaborators from configuration.
    pub fn new(config: EnrichmentConfig, store: Arc<dyn AlbumStore>) -> Self {
        let pacer = Arc::new(GovernorPacer::per_second(
            config.musicbrainz.requests_per_second,
        ));
        let musicbrainz: Arc<dyn MusicBrainzApi> =
            Arc::new(MusicBrainzClient::new(&config.musicbrainz, pacer));
        let spotify: Arc<dyn SpotifyApi> = Arc::new(SpotifyClient::new(&config.spotify));
        let cache: Arc<dyn EnrichmentCache> = Arc::new(MemoryCache::new(&config.cache));

        Self::with_collaborators(musicbrainz, spotify, cache, store)
    }

    pub fn with_collaborators(
        musicbrainz: Arc<dyn MusicBrainzApi>,
        spotify: Arc<dyn SpotifyApi>,
        cache: Arc<dyn EnrichmentCache>,
        store: Arc<dyn AlbumStore>,
    ) -> Self {
        let resolver = AlbumResolver::new(Arc::clone(&musicbrainz), Arc::clone(&spotify));
        let enricher = AlbumEnricher::new(musicbrainz, spotify, cache, store);

        EnrichmentManager { resolver, enricher }
    }

    pub fn resolver(&self) -> &AlbumResolver {
        &self.resolver
    }

    pub fn enricher(&self) -> &AlbumEnricher {
        &self.enricher
    }

    /// Resolves foreign identifiers for the album, then enriches with them.
    /// A fully-empty resolution is not an error: enrichment simply no-ops
    /// on the catalogs that stayed unresolved.
    pub async fn resolve_and_enrich(
        &self,
        album_id: AlbumId,
        album: &UnresolvedAlbum,
    ) -> EnrichmentResult {
        let descriptor = ReleaseDescriptor::from_unresolved(album);
        let ids = self.resolver.resolve_album_ids(&descriptor).await;
        info!(
            album_id,
            release_group_id = ids.release_group_id.as_deref(),
            spotify_album_id = ids.spotify_album_id.as_deref(),
            "album identifiers resolved"
        );

        self.enricher
            .enrich_album(
                album_id,
                ids.release_group_id.as_deref(),
                ids.spotify_album_id.as_deref(),
            )
            .await
    }
}
