//! End-to-end route flow over mocked upstreams.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use gyuldam::llm::openrouter::{PARSE_FALLBACK, TIMEOUT_FALLBACK, TRANSPORT_FALLBACK};
use gyuldam::server::build_router;
use gyuldam::server::routes::EMPTY_QUESTION_MESSAGE;
use gyuldam::weather::RegionTables;

use crate::mock_transport::{
    test_state, ChatScript, MockChatTransport, MockForecastTransport,
};

/// "제주", percent-encoded for a URI path segment.
const JEJU_ENCODED: &str = "%EC%A0%9C%EC%A3%BC";

fn ask_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/ask")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_ask_empty_question_is_rejected() {
    let state = test_state(
        Arc::new(MockForecastTransport::with_samples()),
        Arc::new(MockChatTransport::new(ChatScript::Answer("ok"))),
    );
    let app = build_router(state);

    let resp = app
        .oneshot(ask_request(json!({"question": "   "})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["answer"], EMPTY_QUESTION_MESSAGE);
}

#[tokio::test]
async fn test_ask_missing_question_field_is_rejected() {
    let state = test_state(
        Arc::new(MockForecastTransport::with_samples()),
        Arc::new(MockChatTransport::new(ChatScript::Answer("ok"))),
    );
    let app = build_router(state);

    let resp = app
        .oneshot(ask_request(json!({"region": "제주"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ask_weather_question_builds_context() {
    let chat = Arc::new(MockChatTransport::new(ChatScript::Answer(
        "오늘은 맑으니 방제 작업하기 좋은 날입니다.",
    )));
    let state = test_state(Arc::new(MockForecastTransport::with_samples()), chat.clone());
    let app = build_router(state);

    let resp = app
        .oneshot(ask_request(json!({"question": "제주 날씨 어때?"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["answer"], "오늘은 맑으니 방제 작업하기 좋은 날입니다.");

    // The assembled context reached the model: current-temperature line,
    // mid-range block, and the unconditional farming-calendar section.
    let prompt = chat.last_system_prompt().unwrap();
    assert!(prompt.contains("기온: 24.3°C"));
    assert!(prompt.contains("중기예보 (4-10일 후)"));
    assert!(prompt.contains("이달의 농사 정보"));
}

#[tokio::test]
async fn test_ask_degrades_when_llm_transport_fails() {
    let chat = Arc::new(MockChatTransport::new(ChatScript::TransportFailure));
    let state = test_state(Arc::new(MockForecastTransport::with_samples()), chat.clone());
    let app = build_router(state);

    let resp = app
        .oneshot(ask_request(json!({"question": "제주 날씨 어때?"})))
        .await
        .unwrap();
    // Context assembly succeeded and the LLM failure degraded to text.
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["answer"], TRANSPORT_FALLBACK);
    assert!(chat.last_system_prompt().unwrap().contains("기온: 24.3°C"));
}

#[tokio::test]
async fn test_ask_llm_timeout_fallback() {
    let state = test_state(
        Arc::new(MockForecastTransport::with_samples()),
        Arc::new(MockChatTransport::new(ChatScript::Timeout)),
    );
    let app = build_router(state);

    let resp = app
        .oneshot(ask_request(json!({"question": "귤나무 비료는 언제 주나요?"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["answer"], TIMEOUT_FALLBACK);
}

#[tokio::test]
async fn test_ask_malformed_llm_response_fallback() {
    let state = test_state(
        Arc::new(MockForecastTransport::with_samples()),
        Arc::new(MockChatTransport::new(ChatScript::EmptyChoices)),
    );
    let app = build_router(state);

    let resp = app
        .oneshot(ask_request(json!({"question": "귤나무 가지치기 방법?"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["answer"], PARSE_FALLBACK);
}

#[tokio::test]
async fn test_regions_route_matches_coordinate_table() {
    let state = test_state(
        Arc::new(MockForecastTransport::with_samples()),
        Arc::new(MockChatTransport::new(ChatScript::Answer("ok"))),
    );
    let app = build_router(state);

    let resp = app
        .oneshot(Request::builder().uri("/api/regions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    let regions = body["regions"].as_array().unwrap();
    let expected = RegionTables::new().region_names();
    assert!(!regions.is_empty());
    assert_eq!(regions.len(), expected.len());
    for (got, want) in regions.iter().zip(expected) {
        assert_eq!(got.as_str().unwrap(), want);
    }
}

#[tokio::test]
async fn test_weather_route_returns_summary() {
    let state = test_state(
        Arc::new(MockForecastTransport::with_samples()),
        Arc::new(MockChatTransport::new(ChatScript::Answer("ok"))),
    );
    let app = build_router(state);

    let resp = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/weather/{JEJU_ENCODED}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    let weather = body["weather"].as_str().unwrap();
    assert!(weather.contains("현재 제주 날씨"));
    assert!(weather.contains("기온: 24.3°C"));
}

#[tokio::test]
async fn test_weather_route_hits_cache_on_repeat() {
    let forecast = Arc::new(MockForecastTransport::with_samples());
    let state = test_state(
        forecast.clone(),
        Arc::new(MockChatTransport::new(ChatScript::Answer("ok"))),
    );
    let app = build_router(state);

    for _ in 0..2 {
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/weather/{JEJU_ENCODED}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
    // One nowcast + one 3-day forecast fetch; the second request is
    // served from the hour-bucketed cache.
    assert_eq!(forecast.call_count(), 2);
}

#[tokio::test]
async fn test_weather_route_degrades_on_upstream_failure() {
    let state = test_state(
        Arc::new(MockForecastTransport::failing()),
        Arc::new(MockChatTransport::new(ChatScript::Answer("ok"))),
    );
    let app = build_router(state);

    let resp = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/weather/{JEJU_ENCODED}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    // Upstream failure degrades inside the client, not to a 500.
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        json_body(resp).await["weather"],
        "제주 날씨 정보를 가져올 수 없습니다."
    );
}

#[tokio::test]
async fn test_chat_ui_served_at_root() {
    let state = test_state(
        Arc::new(MockForecastTransport::with_samples()),
        Arc::new(MockChatTransport::new(ChatScript::Answer("ok"))),
    );
    let app = build_router(state);

    let resp = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("귤담 AI"));
}
