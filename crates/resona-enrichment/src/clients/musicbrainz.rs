use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::config::MusicBrainzConfig;
use crate::error::ClientError;
use crate::pacer::RequestPacer;

// Structs for the JSON web service (v2) payloads.

/// Search hit for a release: one concrete edition, the entity that carries
/// barcodes and catalog numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseHit {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "release-group", default)]
    pub release_group: Option<ReleaseGroupRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseGroupRef {
    pub id: String,
}

/// Search hit for a release-group: the abstract work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseGroupHit {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<ArtistCredit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistCredit {
    pub name: String,
}

impl ReleaseGroupHit {
    /// First credited artist, the one scoring compares against.
    pub fn primary_artist(&self) -> Option<&str> {
        self.artist_credit.first().map(|credit| credit.name.as_str())
    }
}

/// Full release-group lookup payload, with tags and community rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseGroup {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<MusicBrainzTag>,
    #[serde(default)]
    pub rating: Option<MusicBrainzRating>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzTag {
    pub name: String,
    #[serde(default)]
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzRating {
    #[serde(default)]
    pub value: Option<f32>,
    #[serde(rename = "votes-count", default)]
    pub votes_count: u32,
}

#[derive(Debug, Deserialize)]
struct ReleaseSearchResponse {
    #[serde(default)]
    releases: Vec<ReleaseHit>,
}

#[derive(Debug, Deserialize)]
struct ReleaseGroupSearchResponse {
    #[serde(rename = "release-groups", default)]
    release_groups: Vec<ReleaseGroupHit>,
}

#[async_trait]
pub trait MusicBrainzApi: Send + Sync {
    async fn get_release_group(&self, id: &str) -> Result<ReleaseGroup, ClientError>;
    async fn search_release_groups(
        &self,
        query: &str,
        limit: u8,
    ) -> Result<Vec<ReleaseGroupHit>, ClientError>;
    async fn search_by_barcode(&self, barcode: &str) -> Result<Vec<ReleaseHit>, ClientError>;
    async fn search_by_catno(
        &self,
        catno: &str,
        label: Option<&str>,
    ) -> Result<Vec<ReleaseHit>, ClientError>;
}

#[derive(Clone)]
pub struct MusicBrainzClient {
    base_url: String,
    user_agent: String,
    client: reqwest::Client,
    pacer: Arc<dyn RequestPacer>,
}

impl MusicBrainzClient {
    pub fn new(config: &MusicBrainzConfig, pacer: Arc<dyn RequestPacer>) -> Self {
        MusicBrainzClient {
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
            client: reqwest::Client::new(),
            pacer,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        self.pacer.acquire().await;

        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "MusicBrainz request");

        let response = self
            .client
            .get(&url)
            .query(&[("fmt", "json")])
            .query(query)
            .header(reqwest::header::USER_AGENT, self.user_agent.as_str())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MusicBrainzApi for MusicBrainzClient {
    async fn get_release_group(&self, id: &str) -> Result<ReleaseGroup, ClientError> {
        self.get_json(&format!("release-group/{id}"), &[("inc", "tags ratings")])
            .await
    }

    async fn search_release_groups(
        &self,
        query: &str,
        limit: u8,
    ) -> Result<Vec<ReleaseGroupHit>, ClientError> {
        let limit = limit.to_string();
        let response: ReleaseGroupSearchResponse = self
            .get_json("release-group", &[("query", query), ("limit", &limit)])
            .await?;
        Ok(response.release_groups)
    }

    async fn search_by_barcode(&self, barcode: &str) -> Result<Vec<ReleaseHit>, ClientError> {
        let query = format!("barcode:{barcode}");
        let response: ReleaseSearchResponse = self
            .get_json("release", &[("query", &query), ("limit", "5")])
            .await?;
        Ok(response.releases)
    }

    async fn search_by_catno(
        &self,
        catno: &str,
        label: Option<&str>,
    ) -> Result<Vec<ReleaseHit>, ClientError> {
        let mut query = format!("catno:\"{catno}\"");
        if let Some(label) = label {
            query.push_str(&format!(" AND label:\"{label}\""));
        }
        let response: ReleaseSearchResponse = self
            .get_json("release", &[("query", &query), ("limit", "5")])
            .await?;
        Ok(response.releases)
    }
}
