//! Crate `resona_enrichment`: cross-catalog identity resolution and
//! metadata enrichment for canonical albums.

pub mod cache;
pub mod clients;
pub mod config;
pub mod enricher;
pub mod error;
pub mod manager;
pub mod pacer;
pub mod resolver;
pub mod similarity;
pub mod store;

pub use cache::{CacheTier, EnrichmentCache, MemoryCache};
pub use clients::musicbrainz::{MusicBrainzApi, MusicBrainzClient};
pub use clients::spotify::{SpotifyApi, SpotifyClient};
pub use config::EnrichmentConfig;
pub use enricher::{AlbumEnricher, EnrichmentResult};
pub use error::ClientError;
pub use manager::EnrichmentManager;
pub use resolver::{AlbumResolver, ReleaseDescriptor, ResolvedAlbumIds};
pub use similarity::similarity;
pub use store::AlbumStore;
