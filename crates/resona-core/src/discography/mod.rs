pub mod album;
pub mod rating;
pub mod unresolved_album;

pub use album::{AlbumId, AlbumUpdate, CanonicalAlbum};
pub use unresolved_album::UnresolvedAlbum;
