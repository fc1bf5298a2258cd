//! Deterministic transports for integration testing.
//!
//! In-memory stand-ins for the two upstream HTTP boundaries: canned
//! KMA envelopes per endpoint with a call counter, and a chat
//! transport with scriptable replies plus request capture. No test in
//! this suite touches the network.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use gyuldam::context::ContextBuilder;
use gyuldam::knowledge::KnowledgeBase;
use gyuldam::llm::openrouter::{ChatMessage, ChatRequest, ChatResponse, Choice, OpenRouterGateway};
use gyuldam::llm::{ChatModel, LlmError};
use gyuldam::server::routes::{AppState, ServiceState};
use gyuldam::weather::{
    Endpoint, FetchError, ForecastRequest, ForecastTransport, KmaEnvelope, RegionTables,
    WeatherClient,
};

// ---------------------------------------------------------------------------
// Forecast transport
// ---------------------------------------------------------------------------

pub struct MockForecastTransport {
    calls: AtomicUsize,
    responses: HashMap<Endpoint, Value>,
    fail_all: bool,
}

impl MockForecastTransport {
    pub fn with_samples() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            responses: sample_responses(),
            fail_all: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            responses: HashMap::new(),
            fail_all: true,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForecastTransport for MockForecastTransport {
    async fn fetch(&self, request: ForecastRequest) -> Result<KmaEnvelope, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all {
            return Err(FetchError::Timeout);
        }
        let raw = self
            .responses
            .get(&request.endpoint)
            .cloned()
            .ok_or_else(|| FetchError::Transport("no canned response".to_string()))?;
        serde_json::from_value(raw).map_err(|e| FetchError::Schema(e.to_string()))
    }
}

fn envelope(items: Vec<Value>) -> Value {
    json!({
        "response": {
            "header": {"resultCode": "00", "resultMsg": "NORMAL_SERVICE"},
            "body": {"items": {"item": items}}
        }
    })
}

pub fn sample_responses() -> HashMap<Endpoint, Value> {
    let nowcast = envelope(vec![
        json!({"category": "T1H", "obsrValue": "24.3"}),
        json!({"category": "RN1", "obsrValue": "0"}),
        json!({"category": "REH", "obsrValue": "65"}),
        json!({"category": "WSD", "obsrValue": "3.2"}),
        json!({"category": "PTY", "obsrValue": "0"}),
    ]);

    let village = envelope(vec![
        json!({"fcstDate": "20260825", "fcstTime": "0600", "category": "TMN", "fcstValue": "22"}),
        json!({"fcstDate": "20260825", "fcstTime": "0600", "category": "POP", "fcstValue": "30"}),
        json!({"fcstDate": "20260825", "fcstTime": "0600", "category": "SKY", "fcstValue": "1"}),
        json!({"fcstDate": "20260825", "fcstTime": "1500", "category": "TMX", "fcstValue": "29"}),
        json!({"fcstDate": "20260826", "fcstTime": "0600", "category": "TMN", "fcstValue": "21"}),
        json!({"fcstDate": "20260826", "fcstTime": "0600", "category": "POP", "fcstValue": "60"}),
    ]);

    let mut mid_temp = serde_json::Map::new();
    for day in 4..=10 {
        mid_temp.insert(format!("taMin{day}"), json!(20));
        mid_temp.insert(format!("taMax{day}"), json!(28));
    }

    let mut mid_land = serde_json::Map::new();
    for day in 4..=7 {
        mid_land.insert(format!("wf{day}Am"), json!("맑음"));
        mid_land.insert(format!("wf{day}Pm"), json!("구름많음"));
        mid_land.insert(format!("rnSt{day}Am"), json!(20));
        mid_land.insert(format!("rnSt{day}Pm"), json!(40));
    }
    for day in 8..=10 {
        mid_land.insert(format!("wf{day}"), json!("흐림"));
        mid_land.insert(format!("rnSt{day}"), json!(50));
    }

    HashMap::from([
        (Endpoint::Nowcast, nowcast),
        (Endpoint::VillageForecast, village),
        (Endpoint::MidTemperature, envelope(vec![Value::Object(mid_temp)])),
        (Endpoint::MidLand, envelope(vec![Value::Object(mid_land)])),
    ])
}

// ---------------------------------------------------------------------------
// Chat transport
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
pub enum ChatScript {
    Answer(&'static str),
    Timeout,
    TransportFailure,
    EmptyChoices,
}

pub struct MockChatTransport {
    script: ChatScript,
    last_request: Mutex<Option<ChatRequest>>,
}

impl MockChatTransport {
    pub fn new(script: ChatScript) -> Self {
        Self {
            script,
            last_request: Mutex::new(None),
        }
    }

    /// The system prompt of the most recent request, if any.
    pub fn last_system_prompt(&self) -> Option<String> {
        self.last_request
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|r| r.messages.first().map(|m| m.content.clone()))
    }
}

#[async_trait]
impl gyuldam::llm::openrouter::ChatTransport for MockChatTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        *self.last_request.lock().unwrap() = Some(request.clone());
        match self.script {
            ChatScript::Answer(text) => Ok(ChatResponse {
                choices: vec![Choice {
                    message: Some(ChatMessage {
                        role: "assistant".to_string(),
                        content: text.to_string(),
                    }),
                }],
            }),
            ChatScript::Timeout => Err(LlmError::Timeout),
            ChatScript::TransportFailure => {
                Err(LlmError::Transport("connection refused".to_string()))
            }
            ChatScript::EmptyChoices => Ok(ChatResponse { choices: vec![] }),
        }
    }
}

// ---------------------------------------------------------------------------
// State assembly
// ---------------------------------------------------------------------------

/// Full service state over the given mock transports.
pub fn test_state(
    forecast: Arc<MockForecastTransport>,
    chat: Arc<MockChatTransport>,
) -> AppState {
    let tables = Arc::new(RegionTables::new());
    let weather = Arc::new(WeatherClient::new(forecast, tables.clone()));
    let knowledge = Arc::new(KnowledgeBase::new());
    let llm: Arc<dyn ChatModel> =
        Arc::new(OpenRouterGateway::new(chat, None, 2000, 0.7));

    Arc::new(ServiceState {
        context: ContextBuilder::new(weather.clone(), knowledge),
        llm,
        weather,
        tables,
        default_region: "제주".to_string(),
    })
}
