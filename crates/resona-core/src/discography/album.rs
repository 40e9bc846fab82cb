use serde::{Deserialize, Serialize};

use super::rating::CommunityRating;

pub type AlbumId = u64;

/// The canonical album record owned by the primary library.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanonicalAlbum {
    pub id: AlbumId,
    pub title: String,
    pub artists: Vec<String>,
    pub year: Option<i32>,

    pub musicbrainz_release_group_id: Option<String>,
    pub spotify_album_id: Option<String>,

    pub tags: Vec<String>,
    pub community_rating: Option<CommunityRating>,
    pub cover_url: Option<String>,
    pub updated_at_ms: Option<u64>,
}

/// Partial update for a canonical album. Only present fields are written;
/// an absent field never clears what the record already holds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlbumUpdate {
    pub musicbrainz_release_group_id: Option<String>,
    pub spotify_album_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub community_rating: Option<CommunityRating>,
    pub cover_url: Option<String>,
    pub updated_at_ms: Option<u64>,
}

impl AlbumUpdate {
    /// True when nothing besides the timestamp would be written.
    pub fn is_noop(&self) -> bool {
        self.musicbrainz_release_group_id.is_none()
            && self.spotify_album_id.is_none()
            && self.tags.is_none()
            && self.community_rating.is_none()
            && self.cover_url.is_none()
    }

    pub fn apply_to(&self, album: &mut CanonicalAlbum) {
        if let Some(id) = &self.musicbrainz_release_group_id {
            album.musicbrainz_release_group_id = Some(id.clone());
        }
        if let Some(id) = &self.spotify_album_id {
            album.spotify_album_id = Some(id.clone());
        }
        if let Some(tags) = &self.tags {
            album.tags = tags.clone();
        }
        if let Some(rating) = &self.community_rating {
            album.community_rating = Some(rating.clone());
        }
        if let Some(url) = &self.cover_url {
            album.cover_url = Some(url.clone());
        }
        if let Some(ts) = self.updated_at_ms {
            album.updated_at_ms = Some(ts);
        }
    }
}
