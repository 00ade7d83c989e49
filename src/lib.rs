// Modules
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod emotion;
pub mod engine;
pub mod presenter;
pub mod server;

pub use catalog::{PlaylistCatalog, PlaylistSummary, SpotifyCatalogClient};
pub use classifier::{EmotionClassifier, OnnxEmotionClassifier};
pub use emotion::{EmotionLabel, EmotionProfileTable, PlaylistProfile};
pub use engine::{RecommendError, RecommendationEngine, RecommendationResult};
pub use presenter::ConsolePresenter;
