//! Tests for the Gemini REST client against a mock server

use crate::config::Config;
use crate::gemini::{GeminiClient, GenerationError, GenerationRequest, Generator};
use gemi_types::Turn;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/models/gemini-test:generateContent";

fn config_for(server: &MockServer) -> Config {
    Config {
        api_key: "test-key".to_string(),
        model: "gemini-test".to_string(),
        max_tokens: 256,
        temperature: 0.5,
        api_base_url: server.uri(),
        timeout_secs: 10,
        ..Config::default()
    }
}

fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    }))
}

fn api_error(code: u16, status: &str, message: &str, reason: Option<&str>) -> ResponseTemplate {
    let details: Vec<Value> = reason
        .map(|reason| {
            vec![json!({
                "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                "reason": reason
            })]
        })
        .unwrap_or_default();
    ResponseTemplate::new(code).set_body_json(json!({
        "error": {"code": code, "message": message, "status": status, "details": details}
    }))
}

async fn generate(
    server: &MockServer,
    request: GenerationRequest<'_>,
) -> Result<String, GenerationError> {
    let client = GeminiClient::new(&config_for(server)).unwrap();
    client.generate(&request).await
}

#[test]
fn test_endpoint_and_generation_config() {
    let config = Config {
        api_base_url: "https://example.test/v1beta/".to_string(),
        model: "gemini-pro".to_string(),
        max_tokens: 64,
        ..Config::default()
    };
    let client = GeminiClient::new(&config).unwrap();

    assert_eq!(
        client.endpoint(),
        "https://example.test/v1beta/models/gemini-pro:generateContent"
    );
    assert_eq!(client.model(), "gemini-pro");
    assert_eq!(client.generation_config().max_output_tokens, 64);
}

#[test]
fn test_invalid_proxy_url_fails_construction() {
    let config = Config {
        use_proxy: true,
        proxy_url: "not a url".to_string(),
        ..Config::default()
    };
    assert!(GeminiClient::new(&config).is_err());
}

#[tokio::test]
async fn test_generate_returns_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "what is AI?"}]}],
            "generationConfig": {"temperature": 0.5, "maxOutputTokens": 256}
        })))
        .respond_with(text_response("Artificial intelligence."))
        .expect(1)
        .mount(&server)
        .await;

    let text = generate(&server, GenerationRequest::new("what is AI?"))
        .await
        .unwrap();
    assert_eq!(text, "Artificial intelligence.");
}

#[tokio::test]
async fn test_system_prompt_is_prepended() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "Be brief.\n\nUser: hello"}]}]
        })))
        .respond_with(text_response("Hi."))
        .expect(1)
        .mount(&server)
        .await;

    let request = GenerationRequest::new("hello").with_system_prompt(Some("Be brief."));
    assert_eq!(generate(&server, request).await.unwrap(), "Hi.");
}

#[tokio::test]
async fn test_history_is_sent_before_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({
            "contents": [
                {"role": "user", "parts": [{"text": "my name is Sam"}]},
                {"role": "model", "parts": [{"text": "Hello Sam"}]},
                {"role": "user", "parts": [{"text": "what is my name?"}]}
            ]
        })))
        .respond_with(text_response("Sam"))
        .expect(1)
        .mount(&server)
        .await;

    let history = vec![Turn::user("my name is Sam"), Turn::model("Hello Sam")];
    let request = GenerationRequest::new("what is my name?").with_history(Some(&history));
    assert_eq!(generate(&server, request).await.unwrap(), "Sam");
}

#[tokio::test]
async fn test_invalid_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(api_error(
            400,
            "INVALID_ARGUMENT",
            "API key not valid. Please pass a valid API key.",
            Some("API_KEY_INVALID"),
        ))
        .mount(&server)
        .await;

    let err = generate(&server, GenerationRequest::new("hi"))
        .await
        .unwrap_err();
    assert_eq!(err, GenerationError::InvalidApiKey);
}

#[tokio::test]
async fn test_quota_exceeded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(api_error(
            429,
            "RESOURCE_EXHAUSTED",
            "You exceeded your current quota, please check your plan and billing details.",
            None,
        ))
        .mount(&server)
        .await;

    let err = generate(&server, GenerationRequest::new("hi"))
        .await
        .unwrap_err();
    assert_eq!(err, GenerationError::QuotaExceeded);
}

#[tokio::test]
async fn test_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(api_error(
            429,
            "RESOURCE_EXHAUSTED",
            "Too many requests",
            Some("RATE_LIMIT_EXCEEDED"),
        ))
        .mount(&server)
        .await;

    let err = generate(&server, GenerationRequest::new("hi"))
        .await
        .unwrap_err();
    assert_eq!(err, GenerationError::RateLimited);
}

#[tokio::test]
async fn test_other_error_keeps_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&server)
        .await;

    let err = generate(&server, GenerationRequest::new("hi"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GenerationError::Other("500 Internal Server Error: backend exploded".to_string())
    );
    assert_eq!(
        err.user_message(),
        "Error: 500 Internal Server Error: backend exploded"
    );
}

#[tokio::test]
async fn test_blocked_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let err = generate(&server, GenerationRequest::new("hi"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GenerationError::Other("Prompt was blocked: SAFETY".to_string())
    );
}

#[tokio::test]
async fn test_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = generate(&server, GenerationRequest::new("hi"))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Invalid response from Gemini"));
}

#[tokio::test]
async fn test_respond_degrades_errors_to_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(api_error(429, "RESOURCE_EXHAUSTED", "quota exceeded", None))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config_for(&server)).unwrap();
    let text = client.respond(&GenerationRequest::new("hi")).await;
    assert_eq!(text, "Error: API quota exceeded. Please try again later.");
}

#[tokio::test]
async fn test_unreachable_server() {
    let server = MockServer::start().await;
    let config = config_for(&server);
    drop(server);

    let client = GeminiClient::new(&config).unwrap();
    let err = client
        .generate(&GenerationRequest::new("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Other(_)));
}
