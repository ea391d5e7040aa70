//! Integration tests for the OpenAI-compatible clients using WireMock
//!
//! These tests mock the provider HTTP APIs to verify client behavior without
//! network access.

use ai_core::{
    AudioClip, ChatCompletionsClient, InferenceEngine, InferenceError, InferenceRequest, Provider,
    ProviderConfig, TranscriptionConfig, TranscriptionEngine, WhisperClient,
};
use secrecy::SecretString;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

// =============================================================================
// Test Helpers
// =============================================================================

fn provider_config(base_url: &str) -> ProviderConfig {
    ProviderConfig::new(Provider::Groq, SecretString::from("test-key"), "test-model")
        .with_base_url(base_url)
        .with_timeout_ms(2_000)
}

fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
    })
}

// =============================================================================
// Chat completions
// =============================================================================

#[tokio::test]
async fn generate_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({"model": "test-model", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Ciao!")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatCompletionsClient::new(provider_config(&server.uri())).unwrap();
    let response = client
        .generate(InferenceRequest::with_system("Sei utile", "Ciao"))
        .await
        .unwrap();

    assert_eq!(response.content, "Ciao!");
    assert_eq!(response.model, "test-model");
    assert_eq!(response.usage.unwrap().total_tokens, 20);
    assert_eq!(response.finish_reason.as_deref(), Some("stop"));
}

#[tokio::test]
async fn request_overrides_are_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({"max_tokens": 64})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatCompletionsClient::new(provider_config(&server.uri())).unwrap();
    let request = InferenceRequest::with_system("s", "u").with_max_tokens(64);
    assert!(client.generate(request).await.is_ok());
}

#[tokio::test]
async fn attribution_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("HTTP-Referer", "https://canvas.example"))
        .and(header("X-Title", "AI Collaboration Canvas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig::new(Provider::OpenRouter, SecretString::from("k"), "m")
        .with_base_url(server.uri())
        .with_attribution(
            Some("https://canvas.example".to_string()),
            Some("AI Collaboration Canvas".to_string()),
        );
    let client = ChatCompletionsClient::new(config).unwrap();
    assert!(client.generate(InferenceRequest::with_system("s", "u")).await.is_ok());
}

#[tokio::test]
async fn rate_limit_maps_to_saturation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"message": "Rate limit reached", "type": "tokens"}
        })))
        .mount(&server)
        .await;

    let client = ChatCompletionsClient::new(provider_config(&server.uri())).unwrap();
    let err = client
        .generate(InferenceRequest::with_system("s", "u"))
        .await
        .unwrap_err();

    assert!(matches!(err, InferenceError::RateLimited));
    assert!(err.is_saturation());
}

#[tokio::test]
async fn server_error_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": {"message": "internal failure"}
        })))
        .mount(&server)
        .await;

    let client = ChatCompletionsClient::new(provider_config(&server.uri())).unwrap();
    let err = client
        .generate(InferenceRequest::with_system("s", "u"))
        .await
        .unwrap_err();

    match err {
        InferenceError::ServerError { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "internal failure");
        },
        other => unreachable!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn empty_content_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("   ")))
        .mount(&server)
        .await;

    let client = ChatCompletionsClient::new(provider_config(&server.uri())).unwrap();
    let err = client
        .generate(InferenceRequest::with_system("s", "u"))
        .await
        .unwrap_err();
    assert!(matches!(err, InferenceError::EmptyCompletion(_)));
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("late"))
                .set_delay(std::time::Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = provider_config(&server.uri()).with_timeout_ms(100);
    let client = ChatCompletionsClient::new(config).unwrap();
    let err = client
        .generate(InferenceRequest::with_system("s", "u"))
        .await
        .unwrap_err();
    assert!(matches!(err, InferenceError::Timeout(100)));
}

// =============================================================================
// Transcription
// =============================================================================

fn transcription_config(base_url: &str) -> TranscriptionConfig {
    TranscriptionConfig {
        base_url: base_url.to_string(),
        ..TranscriptionConfig::groq(SecretString::from("test-key"))
    }
}

#[tokio::test]
async fn transcribe_returns_trimmed_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": "  Ogni lunedì preparo il report vendite.  ",
            "language": "italian",
            "duration": 4.2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = WhisperClient::new(transcription_config(&server.uri())).unwrap();
    let transcription = client
        .transcribe(AudioClip::new(vec![0_u8; 32], "nota.webm"))
        .await
        .unwrap();

    assert_eq!(transcription.text, "Ogni lunedì preparo il report vendite.");
    assert_eq!(transcription.duration_secs, Some(4.2));
}

#[tokio::test]
async fn transcribe_rejects_empty_audio_without_calling_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = WhisperClient::new(transcription_config(&server.uri())).unwrap();
    let err = client
        .transcribe(AudioClip::new(Vec::new(), "vuoto.webm"))
        .await
        .unwrap_err();
    assert!(matches!(err, InferenceError::RequestFailed(_)));
}

#[tokio::test]
async fn transcribe_maps_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = WhisperClient::new(transcription_config(&server.uri())).unwrap();
    let err = client
        .transcribe(AudioClip::new(vec![1, 2, 3], "a.mp3"))
        .await
        .unwrap_err();
    assert!(matches!(err, InferenceError::Unauthorized));
}
