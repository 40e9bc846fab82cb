use anyhow::Result;
use async_trait::async_trait;

use resona_core::discography::album::{AlbumId, AlbumUpdate};

/// Canonical record store. The enricher writes partial updates through this
/// seam, at most once per enrichment call, and never reads the result back.
#[async_trait]
pub trait AlbumStore: Send + Sync {
    async fn update(&self, album_id: AlbumId, update: AlbumUpdate) -> Result<()>;
}
