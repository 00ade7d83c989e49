// Spotify Web API playlist search
//
// One search request per call, one page only. Transport, auth, status and
// decoding failures are logged and turned into an empty result.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CatalogAuth, CatalogError, PlaylistCatalog, PlaylistSummary};

pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
pub const SPOTIFY_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

const UNKNOWN_PLAYLIST: &str = "Unknown Playlist";
const NO_DESCRIPTION: &str = "No description available";
const UNKNOWN_OWNER: &str = "Unknown";

/// Base URLs of the Web API and the accounts (token) service.
#[derive(Debug, Clone)]
pub struct CatalogEndpoints {
    pub api_base: String,
    pub accounts_base: String,
}

impl Default for CatalogEndpoints {
    fn default() -> Self {
        Self {
            api_base: SPOTIFY_API_BASE.to_string(),
            accounts_base: SPOTIFY_ACCOUNTS_BASE.to_string(),
        }
    }
}

// ---- Wire types (every field optional) ----

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    playlists: Option<PlaylistPage>,
}

#[derive(Debug, Deserialize)]
struct PlaylistPage {
    #[serde(default)]
    items: Option<Vec<Option<PlaylistItem>>>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    external_urls: Option<ExternalUrls>,
    #[serde(default)]
    owner: Option<Owner>,
    #[serde(default)]
    tracks: Option<TracksRef>,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    #[serde(default)]
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TracksRef {
    #[serde(default)]
    total: Option<u32>,
}

impl From<PlaylistItem> for PlaylistSummary {
    fn from(item: PlaylistItem) -> Self {
        PlaylistSummary {
            name: item.name.unwrap_or_else(|| UNKNOWN_PLAYLIST.to_string()),
            description: item.description.unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            uri: item.uri.unwrap_or_default(),
            external_url: item.external_urls.and_then(|u| u.spotify).unwrap_or_default(),
            owner: item
                .owner
                .and_then(|o| o.display_name)
                .unwrap_or_else(|| UNKNOWN_OWNER.to_string()),
            total_tracks: item.tracks.and_then(|t| t.total).unwrap_or(0),
        }
    }
}

impl SearchResponse {
    fn into_summaries(self) -> Vec<PlaylistSummary> {
        self.playlists
            .and_then(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(PlaylistSummary::from)
            .collect()
    }
}

/// Spotify catalog client.
///
/// Built without credentials it stays usable but every search comes back
/// empty.
#[derive(Clone)]
pub struct SpotifyCatalogClient {
    client: Client,
    endpoints: CatalogEndpoints,
    auth: Option<CatalogAuth>,
}

impl SpotifyCatalogClient {
    pub fn new(
        auth: Option<CatalogAuth>,
        endpoints: CatalogEndpoints,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoints,
            auth,
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.auth.is_some()
    }

    async fn access_token(&self) -> Result<String, CatalogError> {
        match self.auth.as_ref().ok_or(CatalogError::NotInitialized)? {
            CatalogAuth::Token(token) => Ok(token.clone()),
            CatalogAuth::ClientCredentials {
                client_id,
                client_secret,
            } => {
                let url = format!("{}/api/token", self.endpoints.accounts_base);
                let response = self
                    .client
                    .post(&url)
                    .basic_auth(client_id, Some(client_secret))
                    .form(&[("grant_type", "client_credentials")])
                    .send()
                    .await?;

                if !response.status().is_success() {
                    let status = response.status();
                    let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(CatalogError::Auth(format!("token request returned {}: {}", status, error_text)));
                }

                let token: TokenResponse = response.json().await?;
                Ok(token.access_token)
            }
        }
    }

    /// Search public playlists, surfacing failures.
    pub async fn search_playlists(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<PlaylistSummary>, CatalogError> {
        let token = self.access_token().await?;

        let url = format!("{}/search", self.endpoints.api_base);
        let limit = limit.to_string();
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[("q", query), ("type", "playlist"), ("limit", limit.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.into_summaries())
    }
}

#[async_trait]
impl PlaylistCatalog for SpotifyCatalogClient {
    async fn search(&self, query: &str, limit: u32) -> Vec<PlaylistSummary> {
        match self.search_playlists(query, limit).await {
            Ok(playlists) => {
                debug!("Spotify search {:?} returned {} playlists", query, playlists.len());
                playlists
            }
            Err(CatalogError::NotInitialized) => {
                warn!("Spotify client not initialized");
                Vec::new()
            }
            Err(e) => {
                warn!("Error searching Spotify playlists: {}", e);
                Vec::new()
            }
        }
    }
}
