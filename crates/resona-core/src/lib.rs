//! Crate `resona_core`: canonical domain types shared across the system.

pub mod discography;

pub use discography::album::{AlbumId, AlbumUpdate, CanonicalAlbum};
pub use discography::rating::{CommunityRating, Rating};
pub use discography::unresolved_album::UnresolvedAlbum;
