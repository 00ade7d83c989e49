// Recommendation pipeline
//
// text -> emotion label -> playlist profile + search phrase -> catalog search
// The classifier and catalog are injected so the pipeline can run against
// stubs.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{PlaylistCatalog, PlaylistSummary, DEFAULT_SEARCH_LIMIT};
use crate::classifier::{ClassifierError, EmotionClassifier};
use crate::emotion::{EmotionLabel, EmotionProfileTable, PlaylistProfile};

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("input text is empty")]
    EmptyInput,

    #[error("no emotion classifier loaded")]
    ClassifierUnavailable,

    #[error(transparent)]
    Classification(#[from] ClassifierError),
}

/// Everything shown to the user for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub emotion: EmotionLabel,
    #[serde(flatten)]
    pub profile: PlaylistProfile,
    pub spotify_playlists: Vec<PlaylistSummary>,
}

pub struct RecommendationEngine {
    classifier: Option<Arc<dyn EmotionClassifier>>,
    catalog: Arc<dyn PlaylistCatalog>,
    table: EmotionProfileTable,
    search_limit: u32,
}

impl RecommendationEngine {
    pub fn new(classifier: Arc<dyn EmotionClassifier>, catalog: Arc<dyn PlaylistCatalog>) -> Self {
        Self {
            classifier: Some(classifier),
            catalog,
            table: EmotionProfileTable::new(),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Engine for manually supplied labels only; `recommend` is unavailable.
    pub fn without_classifier(catalog: Arc<dyn PlaylistCatalog>) -> Self {
        Self {
            classifier: None,
            catalog,
            table: EmotionProfileTable::new(),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_search_limit(mut self, limit: u32) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn table(&self) -> &EmotionProfileTable {
        &self.table
    }

    /// Classify `text` and recommend playlists for the detected emotion.
    ///
    /// Blank input is rejected before the classifier runs. Catalog failures
    /// never fail the request; they only leave `spotify_playlists` empty.
    pub async fn recommend(&self, text: &str) -> Result<RecommendationResult, RecommendError> {
        if text.trim().is_empty() {
            return Err(RecommendError::EmptyInput);
        }

        let classifier = self
            .classifier
            .as_ref()
            .map(Arc::clone)
            .ok_or(RecommendError::ClassifierUnavailable)?;

        // Model inference is CPU bound
        let owned = text.to_owned();
        let label = tokio::task::spawn_blocking(move || classifier.classify(&owned))
            .await
            .map_err(|e| ClassifierError::Inference(format!("classifier task failed: {}", e)))??;

        info!("Detected emotion: {}", label);
        Ok(self.recommend_for(label).await)
    }

    /// Recommendation for a label given by name. Unknown names map to neutral.
    pub async fn recommend_for_label(&self, label: &str) -> RecommendationResult {
        let label = self.table.resolve(label);
        self.recommend_for(label).await
    }

    async fn recommend_for(&self, label: EmotionLabel) -> RecommendationResult {
        let profile = *self.table.profile(label);
        let phrase = self.table.search_phrase(label);
        debug!("Searching catalog for {:?} ({})", phrase, label);

        let spotify_playlists = self.catalog.search(phrase, self.search_limit).await;

        RecommendationResult {
            emotion: label,
            profile,
            spotify_playlists,
        }
    }
}
