//! OpenRouter chat-completion gateway.
//!
//! One outbound POST per question, OpenAI-compatible chat format,
//! 30-second timeout, fixed sampling parameters. No retries: each of
//! the three failure modes (timeout, other transport/HTTP failure,
//! missing completion text) maps to its own fixed Korean fallback
//! sentence so the farmer always gets an answer body.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ChatModel, LlmError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub const DEFAULT_MODEL: &str = "google/gemma-3-27b-it:free";

const LLM_TIMEOUT_SECS: u64 = 30;

/// Fallback when the request times out.
pub const TIMEOUT_FALLBACK: &str = "응답 시간이 초과되었습니다. 다시 시도해주세요.";

/// Fallback for any other transport or HTTP failure.
pub const TRANSPORT_FALLBACK: &str =
    "AI 서비스에 연결할 수 없습니다. 잠시 후 다시 시도해주세요.";

/// Fallback when the response carries no completion text.
pub const PARSE_FALLBACK: &str = "응답을 처리하는 중 오류가 발생했습니다.";

// ---------------------------------------------------------------------------
// API types (OpenAI-compatible)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChatMessage>,
}

/// First completion's text, if the response carries one.
fn extract_completion(response: &ChatResponse) -> Option<String> {
    response
        .choices
        .first()
        .and_then(|c| c.message.as_ref())
        .map(|m| m.content.clone())
}

// ---------------------------------------------------------------------------
// Transport seam
// ---------------------------------------------------------------------------

/// Seam in front of the chat-completion HTTP call. The production impl
/// is [`HttpChatTransport`]; tests substitute deterministic mocks.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError>;
}

pub struct HttpChatTransport {
    http: Client,
    api_key: String,
}

impl HttpChatTransport {
    pub fn new(api_key: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(LLM_TIMEOUT_SECS))
            .build()
            .context("Failed to build OpenRouter HTTP client")?;
        Ok(Self { http, api_key })
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let response = self
            .http
            .post(OPENROUTER_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", "http://localhost:5000")
            .header("X-Title", "Jeju Farmer AI")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Transport(format!("HTTP {status}: {body}")));
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|_| LlmError::MalformedResponse)
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

pub struct OpenRouterGateway {
    transport: std::sync::Arc<dyn ChatTransport>,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl OpenRouterGateway {
    pub fn new(
        transport: std::sync::Arc<dyn ChatTransport>,
        model: Option<String>,
        max_tokens: u32,
        temperature: f64,
    ) -> Self {
        Self {
            transport,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
            temperature,
        }
    }

    /// The fixed persona prompt with the live context block substituted
    /// in: identity and disclosure rules for Gyuldam AI, tone
    /// constraints, and the instruction to weave the context in
    /// naturally without volunteering it.
    pub fn system_prompt(context: &str) -> String {
        format!(
            "너는 제주도의 농민들을 돕는 친절한 AI 농업 전문가다. \n\
             제주도의 기후와 토양 특성을 고려하여 조언해라.\n\
             귤 농사, 밭농사, 토양 관리, 병해충 방제, 비료 사용 등에 대해 \
             실용적이고 구체적인 답변을 제공해라.\n\
             항상 자연스러운 한국어로 대답하고, 농민들이 쉽게 이해할 수 있도록 \
             어려운 전문 용어는 피하거나 쉽게 풀어서 설명해라.\n\
             답변은 친근하고 따뜻한 어조로, 존댓말을 사용해라.\n\
             \n\
             [CHATTEEN_AI_IDENTITY]\n\
             너의 이름은 귤담 AI(Gyuldam AI) 이다.\n\
             귤담 AI(Gyuldam AI)는 학생 주도의 농업 지원 프로젝트인 틴저린 프로젝트 \
             (Teengerine Project)가 개발한 AI 도우미이다.\n\
             정보 제공과 설명을 돕는 역할에 집중한다.\n\
             \n\
             [TEENGERINE_PROJECT_CONTEXT]\n\
             틴저린 프로젝트 (Teengerine Project)는 학생들이 제주 지역 농가를 직접 \
             방문해 현장 농작업을 돕고 SNS 운영을 통해 F2T 판매를 지원하는 프로젝트이다.\n\
             현재 약 10개 농가와 함께 운영되고 있습니다.\n\
             \n\
             중요한 원칙:\n\
             - 사용자가 묻지 않으면 프로젝트를 먼저 언급하지 마세요.\n\
             - 자신을 운영 주체처럼 표현하지 마세요.\n\
             - 농가 입장에서 도움이 되는 정보를 중심으로 설명하세요.\n\
             \n\
             아래는 실시간 기상 정보와 농사 정보입니다. 답변할 때 이 정보를 \
             자연스럽게 활용하세요:\n\
             {context}\n\
             \n\
             위 정보를 자연스럽게 답변에 녹여서 활용하되, 사용자가 물어보지 않은 \
             정보는 강제로 언급하지 마세요."
        )
    }

    fn build_request(&self, question: &str, context: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Self::system_prompt(context),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: question.to_string(),
                },
            ],
        }
    }
}

#[async_trait]
impl ChatModel for OpenRouterGateway {
    async fn answer(&self, question: &str, context: &str) -> String {
        let request = self.build_request(question, context);
        debug!(model = %self.model, "Requesting chat completion");

        match self.transport.send(&request).await {
            Ok(response) => match extract_completion(&response) {
                Some(text) => text,
                None => {
                    warn!(model = %self.model, "Completion missing from response");
                    PARSE_FALLBACK.to_string()
                }
            },
            Err(LlmError::Timeout) => {
                warn!(model = %self.model, "Chat completion timed out");
                TIMEOUT_FALLBACK.to_string()
            }
            Err(LlmError::Transport(e)) => {
                warn!(model = %self.model, error = %e, "Chat completion request failed");
                TRANSPORT_FALLBACK.to_string()
            }
            Err(LlmError::MalformedResponse) => {
                warn!(model = %self.model, "Chat completion response unparseable");
                PARSE_FALLBACK.to_string()
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
