// REST API routes for the companion server

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use super::CompanionServerState;
use crate::emotion::{EmotionLabel, PlaylistProfile};
use crate::engine::{RecommendError, RecommendationResult};

// ---- Request/Response types ----

#[derive(Deserialize)]
pub struct RecommendRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub name: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct EmotionProfileDTO {
    pub emotion: EmotionLabel,
    #[serde(flatten)]
    pub profile: PlaylistProfile,
    pub search_phrase: String,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    pub error: &'static str,
    pub message: String,
}

pub enum ApiError {
    BadRequest(String),
    Recommend(RecommendError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<RecommendError> for ApiError {
    fn from(e: RecommendError) -> Self {
        ApiError::Recommend(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let e = match self {
            ApiError::BadRequest(message) => {
                let body = ApiErrorBody {
                    error: "bad_request",
                    message,
                };
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            ApiError::Recommend(e) => e,
        };

        let (status, code, message) = match &e {
            RecommendError::EmptyInput => (
                StatusCode::BAD_REQUEST,
                "empty_input",
                "Please type how you are feeling.".to_string(),
            ),
            RecommendError::ClassifierUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "classifier_unavailable",
                e.to_string(),
            ),
            RecommendError::Classification(inner) => {
                error!("Classification failed: {}", inner);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "classification_failed",
                    inner.to_string(),
                )
            }
        };
        (status, Json(ApiErrorBody { error: code, message })).into_response()
    }
}

// ---- Route registration ----

pub fn api_routes() -> Router<Arc<CompanionServerState>> {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/emotions", get(get_emotions))
        .route("/api/recommend", post(recommend))
        .route("/api/recommend/{label}", get(recommend_for_label))
}

// ---- Handlers ----

async fn get_status() -> Json<StatusResponse> {
    Json(StatusResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_emotions(State(state): State<Arc<CompanionServerState>>) -> Json<Vec<EmotionProfileDTO>> {
    let profiles = state
        .engine
        .table()
        .entries()
        .map(|(emotion, profile, phrase)| EmotionProfileDTO {
            emotion,
            profile: *profile,
            search_phrase: phrase.to_string(),
        })
        .collect();
    Json(profiles)
}

async fn recommend(
    State(state): State<Arc<CompanionServerState>>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendationResult>, ApiError> {
    let Json(body) = payload?;
    let result = state.engine.recommend(&body.text).await?;
    Ok(Json(result))
}

async fn recommend_for_label(
    State(state): State<Arc<CompanionServerState>>,
    Path(label): Path<String>,
) -> Json<RecommendationResult> {
    Json(state.engine.recommend_for_label(&label).await)
}
