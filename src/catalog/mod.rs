// External playlist catalog
//
// This module provides:
// - The `PlaylistCatalog` search capability consumed by the engine
// - A Spotify Web API client that never surfaces failures to its caller
// - Catalog credential resolution and OS keychain storage

pub mod credentials;
pub mod spotify;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use credentials::{CatalogAuth, CredentialManager};
pub use spotify::{CatalogEndpoints, SpotifyCatalogClient};

/// Number of playlists requested per search unless configured otherwise.
pub const DEFAULT_SEARCH_LIMIT: u32 = 5;

/// A public playlist returned by the catalog search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub name: String,
    pub description: String,
    pub uri: String,
    pub external_url: String,
    pub owner: String,
    pub total_tracks: u32,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog client not initialized (no credentials configured)")]
    NotInitialized,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Playlist search against an external catalog.
///
/// Implementations absorb every failure: an unreachable or misbehaving
/// catalog yields an empty list, never an error.
#[async_trait]
pub trait PlaylistCatalog: Send + Sync {
    async fn search(&self, query: &str, limit: u32) -> Vec<PlaylistSummary>;
}
