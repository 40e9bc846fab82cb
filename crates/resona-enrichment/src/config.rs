use std::time::Duration;

use config::{Config, File, FileFormat};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzConfig {
    pub base_url: String,
    pub user_agent: String,
    /// MusicBrainz etiquette caps anonymous clients at one request per second.
    pub requests_per_second: u32,
}

impl Default for MusicBrainzConfig {
    fn default() -> Self {
        MusicBrainzConfig {
            base_url: "https://musicbrainz.org/ws/2".to_string(),
            user_agent: "resona/0.1.0 (https://github.com/resona/resona)".to_string(),
            requests_per_second: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    pub base_url: String,
    pub token_url: String,
    /// Absent credentials are a valid steady state: every Spotify call then
    /// reports `Unconfigured` and the catalog contributes nothing.
    pub credentials: Option<SpotifyCredentials>,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        SpotifyConfig {
            base_url: "https://api.spotify.com/v1".to_string(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            credentials: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Tag/rating payloads move slowly.
    #[serde(with = "humantime_serde")]
    pub long_ttl: Duration,
    /// Popularity moves fast.
    #[serde(with = "humantime_serde")]
    pub medium_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            long_ttl: Duration::from_secs(24 * 60 * 60),
            medium_ttl: Duration::from_secs(60 * 60),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Builder)]
#[builder(setter(into, strip_option), default)]
pub struct EnrichmentConfig {
    pub musicbrainz: MusicBrainzConfig,
    pub spotify: SpotifyConfig,
    pub cache: CacheConfig,
}

impl EnrichmentConfig {
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_string_lossy().into_owned();
        let cfg = Config::builder()
            .add_source(File::new(&path, FileFormat::Toml))
            .build()
            .map_err(ConfigError::Parse)?;
        let ec = cfg
            .try_deserialize::<EnrichmentConfig>()
            .map_err(ConfigError::Parse)?;
        Ok(ec)
    }
}
