use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{SpotifyConfig, SpotifyCredentials};
use crate::error::ClientError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Album payload. Search results return a trimmed-down variant of the same
/// object (no popularity), so every supplementary field defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyAlbum {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

impl SpotifyAlbum {
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(|artist| artist.name.as_str())
    }

    /// Release year parsed from the `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    /// precision Spotify reports.
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .and_then(|year| year.parse().ok())
    }

    pub fn spotify_url(&self) -> Option<&str> {
        self.external_urls.get("spotify").map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct AlbumSearchResponse {
    albums: AlbumPage,
}

#[derive(Debug, Deserialize)]
struct AlbumPage {
    #[serde(default)]
    items: Vec<SpotifyAlbum>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[async_trait]
pub trait SpotifyApi: Send + Sync {
    async fn get_album(&self, id: &str) -> Result<SpotifyAlbum, ClientError>;
    async fn search_albums(&self, query: &str, limit: u8)
    -> Result<Vec<SpotifyAlbum>, ClientError>;
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

pub struct SpotifyClient {
    base_url: String,
    token_url: String,
    credentials: Option<SpotifyCredentials>,
    client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    pub fn new(config: &SpotifyConfig) -> Self {
        SpotifyClient {
            base_url: config.base_url.clone(),
            token_url: config.token_url.clone(),
            credentials: config.credentials.clone(),
            client: reqwest::Client::new(),
            token: Mutex::new(None),
        }
    }

    /// Client-credentials token, fetched lazily and reused until shortly
    /// before it expires.
    async fn bearer_token(&self) -> Result<String, ClientError> {
        let credentials = self.credentials.as_ref().ok_or(ClientError::Unconfigured)?;

        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.access_token.clone());
            }
        }

        debug!("requesting new Spotify access token");
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }

        let token: TokenResponse = response.json().await?;
        let expires_at = Instant::now() + Duration::from_secs(token.expires_in.saturating_sub(30));
        let access_token = token.access_token.clone();
        *guard = Some(CachedToken {
            access_token: token.access_token,
            expires_at,
        });

        Ok(access_token)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let token = self.bearer_token().await?;

        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "Spotify request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    async fn get_album(&self, id: &str) -> Result<SpotifyAlbum, ClientError> {
        self.get_json(&format!("albums/{id}"), &[]).await
    }

    async fn search_albums(
        &self,
        query: &str,
        limit: u8,
    ) -> Result<Vec<SpotifyAlbum>, ClientError> {
        let limit = limit.to_string();
        let response: AlbumSearchResponse = self
            .get_json(
                "search",
                &[("type", "album"), ("q", query), ("limit", &limit)],
            )
            .await?;
        Ok(response.albums.items)
    }
}
