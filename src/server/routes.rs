//! HTTP route handlers.
//!
//! All endpoints return JSON except the chat UI page. Shared state is
//! an `Arc<ServiceState>`. Upstream failures never surface here: by
//! the time a request reaches a handler boundary everything below it
//! degrades to placeholder text, so the 500 branches only catch truly
//! unexpected faults.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::context::ContextBuilder;
use crate::llm::ChatModel;
use crate::weather::{RegionTables, WeatherClient};

pub const EMPTY_QUESTION_MESSAGE: &str = "질문을 입력해주세요.";
pub const INTERNAL_ERROR_MESSAGE: &str =
    "죄송합니다. 오류가 발생했습니다. 다시 시도해주세요.";

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct ServiceState {
    pub context: ContextBuilder,
    pub llm: Arc<dyn ChatModel>,
    pub weather: Arc<WeatherClient>,
    pub tables: Arc<RegionTables>,
    pub default_region: String,
}

pub type AppState = Arc<ServiceState>;

impl ServiceState {
    /// Context assembly + one LLM call. Infallible today (both layers
    /// degrade internally); the Result keeps the route-boundary catch
    /// for anything unexpected.
    async fn answer_question(&self, question: &str, region: &str) -> anyhow::Result<String> {
        let context = self.context.build(question, region).await;
        Ok(self.llm.answer(question, &context).await)
    }

    async fn region_weather(&self, region: &str) -> anyhow::Result<String> {
        Ok(self.weather.context_summary(region).await)
    }
}

// ---------------------------------------------------------------------------
// Request/response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionsResponse {
    pub regions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeatherResponse {
    pub weather: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// POST /ask
pub async fn ask(State(state): State<AppState>, Json(body): Json<AskRequest>) -> Response {
    let question = body.question.as_deref().unwrap_or("").trim().to_string();
    if question.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(AnswerResponse {
                answer: EMPTY_QUESTION_MESSAGE.to_string(),
            }),
        )
            .into_response();
    }

    let region = body
        .region
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .unwrap_or(&state.default_region)
        .to_string();

    info!(region = %region, "Answering question");

    match state.answer_question(&question, &region).await {
        Ok(answer) => (StatusCode::OK, Json(AnswerResponse { answer })).into_response(),
        Err(e) => {
            error!(error = %e, "Unhandled failure in /ask");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AnswerResponse {
                    answer: INTERNAL_ERROR_MESSAGE.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /api/regions
pub async fn get_regions(State(state): State<AppState>) -> Json<RegionsResponse> {
    Json(RegionsResponse {
        regions: state
            .tables
            .region_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

/// GET /api/weather/:region
pub async fn get_region_weather(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> Response {
    match state.region_weather(&region).await {
        Ok(weather) => (StatusCode::OK, Json(WeatherResponse { weather })).into_response(),
        Err(e) => {
            error!(region = %region, error = %e, "Unhandled failure in /api/weather");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
