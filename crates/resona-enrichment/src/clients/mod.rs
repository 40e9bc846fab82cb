pub mod musicbrainz;
pub mod spotify;

pub use musicbrainz::{MusicBrainzApi, MusicBrainzClient};
pub use spotify::{SpotifyApi, SpotifyClient};
