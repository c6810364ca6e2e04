use super::*;
use crate::core::capability::Capability;
use crate::core::config::Config;
use crate::core::poller::PollPolicy;
use crate::core::request::{ErrorKind, Payload};
use crate::utils::test_utils::{
    http_descriptor, silent_server, test_client, MockResponse, MockServer,
};
use serde_json::json;
use std::collections::HashMap;

fn http(descriptor: ProviderDescriptor, credential: Option<&str>) -> HttpProvider {
    HttpProvider::new(descriptor, credential.map(str::to_string), test_client())
}

fn failure_kind(result: GenerationResult) -> ErrorKind {
    match result {
        GenerationResult::Failure(failure) => failure.kind,
        GenerationResult::Success(payload) => panic!("expected failure, got {payload:?}"),
    }
}

#[tokio::test]
async fn openai_chat_sends_completion_request() {
    let server = MockServer::start(vec![MockResponse::json(
        200,
        json!({"choices": [{"message": {"role": "assistant", "content": "Hi there"}}]}),
    )])
    .await;
    let descriptor = http_descriptor(
        "openai",
        Capability::TextGeneration,
        ProviderKind::OpenaiChat,
        &format!("{}/v1/", server.base_url),
    );
    let client = OpenAiChatClient::new(http(descriptor, Some("sk-test")), "javascript");

    let result = client
        .invoke(
            &GenerationRequest::new(Capability::TextGeneration, "Hello"),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(
        result,
        GenerationResult::Success(Payload::Text("Hi there".into()))
    );
    let captured = server.finish().await;
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].method(), "POST");
    assert_eq!(captured[0].target(), "/v1/chat/completions");
    assert_eq!(captured[0].header("authorization"), Some("Bearer sk-test"));
    let body = captured[0].json();
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["max_tokens"], 500);
    assert_eq!(body["messages"][0]["content"], "Hello");
}

#[tokio::test]
async fn openai_code_request_is_rephrased() {
    let server = MockServer::start(vec![MockResponse::json(
        200,
        json!({"choices": [{"message": {"content": "fn main() {}"}}]}),
    )])
    .await;
    let descriptor = http_descriptor(
        "openai-code",
        Capability::CodeGeneration,
        ProviderKind::OpenaiChat,
        &server.base_url,
    );
    let client = OpenAiChatClient::new(http(descriptor, Some("sk-test")), "javascript");
    let request = GenerationRequest::new(Capability::CodeGeneration, "a hello world")
        .with_parameter(params::LANGUAGE, "rust");

    let result = client.invoke(&request, &CancellationToken::new()).await;

    assert!(result.is_success());
    let captured = server.finish().await;
    assert_eq!(
        captured[0].json()["messages"][0]["content"],
        "Generate rust code for: a hello world"
    );
}

#[tokio::test]
async fn missing_credential_makes_no_call() {
    let mut descriptor = http_descriptor(
        "openai",
        Capability::TextGeneration,
        ProviderKind::OpenaiChat,
        "http://127.0.0.1:9",
    );
    descriptor.requires_credential = true;
    descriptor.credential_env = Some("OPENAI_API_KEY".into());
    let client = OpenAiChatClient::new(http(descriptor, None), "javascript");

    let result = client
        .invoke(
            &GenerationRequest::new(Capability::TextGeneration, "Hello"),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(failure_kind(result), ErrorKind::MissingCredential);
}

#[tokio::test]
async fn wrong_capability_is_rejected_before_calling() {
    let descriptor = http_descriptor(
        "openai",
        Capability::TextGeneration,
        ProviderKind::OpenaiChat,
        "http://127.0.0.1:9",
    );
    let client = OpenAiChatClient::new(http(descriptor, Some("sk")), "javascript");

    let result = client
        .invoke(
            &GenerationRequest::new(Capability::Translation, "Hello"),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(failure_kind(result), ErrorKind::ProviderError);
}

#[tokio::test]
async fn error_status_becomes_provider_error_with_summary() {
    let server = MockServer::start(vec![MockResponse::json(
        429,
        json!({"error": {"message": "Rate limit   reached", "type": "requests"}}),
    )])
    .await;
    let descriptor = http_descriptor(
        "openai",
        Capability::TextGeneration,
        ProviderKind::OpenaiChat,
        &server.base_url,
    );
    let client = OpenAiChatClient::new(http(descriptor, Some("sk")), "javascript");

    let result = client
        .invoke(
            &GenerationRequest::new(Capability::TextGeneration, "Hello"),
            &CancellationToken::new(),
        )
        .await;

    match result {
        GenerationResult::Failure(failure) => {
            assert_eq!(failure.kind, ErrorKind::ProviderError);
            let message = &failure.message;
            assert!(message.contains("429"), "{message}");
            assert!(message.contains("Rate limit reached"), "{message}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    server.finish().await;
}

#[tokio::test]
async fn unexpected_body_is_malformed() {
    let server = MockServer::start(vec![
        MockResponse::json(200, json!({"unexpected": true})),
        MockResponse::json(200, json!({"choices": []})),
    ])
    .await;
    let descriptor = http_descriptor(
        "openai",
        Capability::TextGeneration,
        ProviderKind::OpenaiChat,
        &server.base_url,
    );
    let client = OpenAiChatClient::new(http(descriptor, Some("sk")), "javascript");
    let request = GenerationRequest::new(Capability::TextGeneration, "Hello");

    let first = client.invoke(&request, &CancellationToken::new()).await;
    let second = client.invoke(&request, &CancellationToken::new()).await;

    assert_eq!(failure_kind(first), ErrorKind::MalformedResponse);
    assert_eq!(failure_kind(second), ErrorKind::MalformedResponse);
    server.finish().await;
}

#[tokio::test]
async fn slow_provider_times_out() {
    let (base_url, _server) = silent_server().await;
    let mut descriptor = http_descriptor(
        "openai",
        Capability::TextGeneration,
        ProviderKind::OpenaiChat,
        &base_url,
    );
    descriptor.timeout_ms = 100;
    let client = OpenAiChatClient::new(http(descriptor, Some("sk")), "javascript");

    let result = client
        .invoke(
            &GenerationRequest::new(Capability::TextGeneration, "Hello"),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(failure_kind(result), ErrorKind::Timeout);
}

#[tokio::test]
async fn openai_images_returns_url() {
    let server = MockServer::start(vec![MockResponse::json(
        200,
        json!({"created": 1, "data": [{"url": "https://images.example/cat.png"}]}),
    )])
    .await;
    let descriptor = http_descriptor(
        "openai-images",
        Capability::ImageGeneration,
        ProviderKind::OpenaiImages,
        &server.base_url,
    );
    let client = OpenAiImagesClient::new(http(descriptor, Some("sk")));

    let result = client
        .invoke(
            &GenerationRequest::new(Capability::ImageGeneration, "a cat"),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(
        result,
        GenerationResult::Success(Payload::Url("https://images.example/cat.png".into()))
    );
    let captured = server.finish().await;
    assert_eq!(captured[0].target(), "/images/generations");
    assert_eq!(captured[0].json()["size"], "512x512");
}

#[tokio::test]
async fn huggingface_posts_to_model_path() {
    let server = MockServer::start(vec![MockResponse::json(
        200,
        json!([{"generated_text": "  console.log('hi');  "}]),
    )])
    .await;
    let mut descriptor = http_descriptor(
        "huggingface-code",
        Capability::CodeGeneration,
        ProviderKind::Huggingface,
        &format!("{}/models", server.base_url),
    );
    descriptor.model = Some("Salesforce/codet5-large".into());
    let client = HuggingFaceClient::new(http(descriptor, Some("hf_test")), "javascript");

    let result = client
        .invoke(
            &GenerationRequest::new(Capability::CodeGeneration, "print hi"),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(
        result,
        GenerationResult::Success(Payload::Text("console.log('hi');".into()))
    );
    let captured = server.finish().await;
    assert_eq!(captured[0].target(), "/models/Salesforce/codet5-large");
    assert_eq!(captured[0].header("authorization"), Some("Bearer hf_test"));
    let body = captured[0].json();
    assert_eq!(body["inputs"], "Generate javascript code for: print hi");
    assert_eq!(body["parameters"]["return_full_text"], false);
}

#[tokio::test]
async fn huggingface_loading_model_is_provider_error() {
    let server = MockServer::start(vec![MockResponse::json(
        503,
        json!({"error": "Model microsoft/DialoGPT-medium is currently loading"}),
    )])
    .await;
    let descriptor = http_descriptor(
        "huggingface",
        Capability::TextGeneration,
        ProviderKind::Huggingface,
        &server.base_url,
    );
    let client = HuggingFaceClient::new(http(descriptor, Some("hf")), "javascript");

    let result = client
        .invoke(
            &GenerationRequest::new(Capability::TextGeneration, "Hello"),
            &CancellationToken::new(),
        )
        .await;

    match result {
        GenerationResult::Failure(failure) => {
            assert_eq!(failure.kind, ErrorKind::ProviderError);
            assert!(failure.message.contains("currently loading"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    server.finish().await;
}

#[tokio::test]
async fn replicate_job_is_submitted_then_polled() {
    let server = MockServer::start(vec![
        MockResponse::json(201, json!({"id": "p1", "status": "starting"})),
        MockResponse::json(200, json!({"id": "p1", "status": "processing"})),
        MockResponse::json(
            200,
            json!({
                "id": "p1",
                "status": "succeeded",
                "output": ["https://replicate.delivery/p1.png"]
            }),
        ),
    ])
    .await;
    let descriptor = http_descriptor(
        "replicate",
        Capability::ImageGeneration,
        ProviderKind::Replicate,
        &server.base_url,
    );
    let poller = AsyncJobPoller::new(
        ReplicateJobs::new(http(descriptor, Some("r8_test"))),
        PollPolicy {
            max_attempts: 5,
            interval: Duration::ZERO,
        },
    );

    let result = poller
        .invoke(
            &GenerationRequest::new(Capability::ImageGeneration, "a red fox"),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(
        result,
        GenerationResult::Success(Payload::Url("https://replicate.delivery/p1.png".into()))
    );
    let captured = server.finish().await;
    let lines: Vec<(&str, &str)> = captured.iter().map(|r| (r.method(), r.target())).collect();
    assert_eq!(
        lines,
        vec![
            ("POST", "/predictions"),
            ("GET", "/predictions/p1"),
            ("GET", "/predictions/p1"),
        ]
    );
    assert_eq!(captured[0].header("authorization"), Some("Token r8_test"));
    let body = captured[0].json();
    assert_eq!(body["input"]["prompt"], "a red fox");
    assert_eq!(body["input"]["scheduler"], "K_EULER");
}

#[tokio::test]
async fn replicate_failed_prediction_reports_reason() {
    let server = MockServer::start(vec![
        MockResponse::json(201, json!({"id": "p2", "status": "starting"})),
        MockResponse::json(
            200,
            json!({"id": "p2", "status": "failed", "error": "NSFW content detected"}),
        ),
    ])
    .await;
    let descriptor = http_descriptor(
        "replicate",
        Capability::ImageGeneration,
        ProviderKind::Replicate,
        &server.base_url,
    );
    let poller = AsyncJobPoller::new(
        ReplicateJobs::new(http(descriptor, Some("r8"))),
        PollPolicy {
            max_attempts: 5,
            interval: Duration::ZERO,
        },
    );

    let result = poller
        .invoke(
            &GenerationRequest::new(Capability::ImageGeneration, "x"),
            &CancellationToken::new(),
        )
        .await;

    match result {
        GenerationResult::Failure(failure) => {
            assert_eq!(failure.kind, ErrorKind::ProviderError);
            assert!(failure.message.contains("NSFW content detected"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(server.finish().await.len(), 2);
}

#[tokio::test]
async fn elevenlabs_returns_audio_bytes() {
    let server = MockServer::start(vec![MockResponse::bytes(200, "audio/mpeg", b"ID3fake")])
        .await;
    let descriptor = http_descriptor(
        "elevenlabs",
        Capability::SpeechSynthesis,
        ProviderKind::Elevenlabs,
        &server.base_url,
    );
    let client = ElevenLabsClient::new(http(descriptor, Some("xi-test")), "voice-1");

    let result = client
        .invoke(
            &GenerationRequest::new(Capability::SpeechSynthesis, "Good morning"),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(
        result,
        GenerationResult::Success(Payload::Audio {
            mime: "audio/mpeg".into(),
            bytes: b"ID3fake".to_vec(),
        })
    );
    let captured = server.finish().await;
    assert_eq!(captured[0].target(), "/text-to-speech/voice-1");
    assert_eq!(captured[0].header("xi-api-key"), Some("xi-test"));
    assert_eq!(captured[0].header("accept"), Some("audio/mpeg"));
    assert_eq!(captured[0].json()["model_id"], "eleven_monolingual_v1");
}

#[tokio::test]
async fn elevenlabs_json_reply_is_malformed() {
    let server = MockServer::start(vec![MockResponse::json(200, json!({"detail": "ok?"}))])
        .await;
    let descriptor = http_descriptor(
        "elevenlabs",
        Capability::SpeechSynthesis,
        ProviderKind::Elevenlabs,
        &server.base_url,
    );
    let client = ElevenLabsClient::new(http(descriptor, Some("xi")), "voice-1");
    let request = GenerationRequest::new(Capability::SpeechSynthesis, "Hi")
        .with_parameter(params::VOICE_ID, "custom");

    let result = client.invoke(&request, &CancellationToken::new()).await;

    assert_eq!(failure_kind(result), ErrorKind::MalformedResponse);
    let captured = server.finish().await;
    assert_eq!(captured[0].target(), "/text-to-speech/custom");
}

#[tokio::test]
async fn cloud_translation_passes_key_as_query() {
    let server = MockServer::start(vec![MockResponse::json(
        200,
        json!({"data": {"translations": [{"translatedText": "Bonjour"}]}}),
    )])
    .await;
    let descriptor = http_descriptor(
        "google-translate",
        Capability::Translation,
        ProviderKind::GoogleTranslate,
        &format!("{}/language/translate/v2", server.base_url),
    );
    let client = GoogleTranslateClient::new(http(descriptor, Some("g-key")));
    let request = GenerationRequest::new(Capability::Translation, "Hello")
        .with_parameter(params::TARGET_LANGUAGE, "fr");

    let result = client.invoke(&request, &CancellationToken::new()).await;

    assert_eq!(
        result,
        GenerationResult::Success(Payload::Text("Bonjour".into()))
    );
    let captured = server.finish().await;
    assert_eq!(captured[0].target(), "/language/translate/v2?key=g-key");
    let body = captured[0].json();
    assert_eq!(body["q"], "Hello");
    assert_eq!(body["target"], "fr");
}

#[tokio::test]
async fn free_translation_unwraps_segments() {
    let server = MockServer::start(vec![MockResponse::json(
        200,
        json!([[["Hallo ", "Hello ", null], ["Welt", "world", null]], null, "en"]),
    )])
    .await;
    let descriptor = http_descriptor(
        "google-translate-free",
        Capability::Translation,
        ProviderKind::GoogleTranslateFree,
        &format!("{}/translate_a/single", server.base_url),
    );
    let client = FreeTranslateClient::new(http(descriptor, None));
    let request = GenerationRequest::new(Capability::Translation, "Hello world")
        .with_parameter(params::TARGET_LANGUAGE, "de");

    let result = client.invoke(&request, &CancellationToken::new()).await;

    assert_eq!(
        result,
        GenerationResult::Success(Payload::Text("Hallo Welt".into()))
    );
    let captured = server.finish().await;
    let target = captured[0].target();
    assert!(target.starts_with("/translate_a/single?"), "{target}");
    assert!(target.contains("client=gtx"), "{target}");
    assert!(target.contains("tl=de"), "{target}");
    assert!(target.contains("q=Hello+world"), "{target}");
    assert!(captured[0].header("authorization").is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn local_speech_runs_configured_command() {
    let descriptor = http_descriptor(
        "local-speech",
        Capability::SpeechSynthesis,
        ProviderKind::LocalSpeech,
        "",
    );
    let ok = LocalSpeechClient::new(descriptor.clone(), vec!["true".into()]);
    let broken = LocalSpeechClient::new(descriptor.clone(), vec!["false".into()]);
    let missing = LocalSpeechClient::new(descriptor, vec!["nexora-no-such-engine".into()]);
    let request = GenerationRequest::new(Capability::SpeechSynthesis, "Hello");

    let result = ok.invoke(&request, &CancellationToken::new()).await;
    assert_eq!(
        result,
        GenerationResult::Success(Payload::Text("Spoken on-device with true".into()))
    );
    assert_eq!(
        failure_kind(broken.invoke(&request, &CancellationToken::new()).await),
        ErrorKind::ProviderError
    );
    assert_eq!(
        failure_kind(missing.invoke(&request, &CancellationToken::new()).await),
        ErrorKind::ProviderError
    );
}

#[cfg(unix)]
#[tokio::test]
async fn local_speech_sends_prompt_on_stdin_not_as_an_argument() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let heard = temp_dir.path().join("heard.txt");
    let injected = temp_dir.path().join("injected.txt");
    let descriptor = http_descriptor(
        "local-speech",
        Capability::SpeechSynthesis,
        ProviderKind::LocalSpeech,
        "",
    );
    let prompt = format!("-o{}", injected.display());
    let request = GenerationRequest::new(Capability::SpeechSynthesis, prompt.as_str());

    let sort = LocalSpeechClient::new(descriptor.clone(), vec!["sort".into()]);
    let result = sort.invoke(&request, &CancellationToken::new()).await;
    assert!(result.is_success(), "{result:?}");
    assert!(!injected.exists(), "prompt was read as a command-line flag");

    let recorder = LocalSpeechClient::new(
        descriptor,
        vec![
            "sh".into(),
            "-c".into(),
            "cat > \"$0\"".into(),
            heard.display().to_string(),
        ],
    );
    let result = recorder.invoke(&request, &CancellationToken::new()).await;
    assert!(result.is_success(), "{result:?}");
    assert_eq!(std::fs::read_to_string(&heard).unwrap(), prompt);
    assert!(!injected.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn local_speech_noisy_failure_is_not_a_timeout() {
    let descriptor = ProviderDescriptor {
        timeout_ms: 10_000,
        ..http_descriptor(
            "local-speech",
            Capability::SpeechSynthesis,
            ProviderKind::LocalSpeech,
            "",
        )
    };
    let noisy = LocalSpeechClient::new(
        descriptor,
        vec![
            "sh".into(),
            "-c".into(),
            "yes engine-error | head -n 20000 >&2; exit 3".into(),
        ],
    );

    let result = noisy
        .invoke(
            &GenerationRequest::new(Capability::SpeechSynthesis, "Hello"),
            &CancellationToken::new(),
        )
        .await;

    match result {
        GenerationResult::Failure(failure) => {
            let message = &failure.message;
            assert_eq!(failure.kind, ErrorKind::ProviderError, "{message}");
            assert!(message.contains("engine-error"), "{message}");
            assert!(message.chars().count() < 400, "{message}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn elevenlabs_voice_id_stays_inside_the_voice_path() {
    let server = MockServer::start(vec![MockResponse::bytes(200, "audio/mpeg", b"ID3fake")])
        .await;
    let descriptor = http_descriptor(
        "elevenlabs",
        Capability::SpeechSynthesis,
        ProviderKind::Elevenlabs,
        &server.base_url,
    );
    let client = ElevenLabsClient::new(http(descriptor.clone(), Some("xi")), "voice-1");
    let request = GenerationRequest::new(Capability::SpeechSynthesis, "Hi")
        .with_parameter(params::VOICE_ID, "../../admin/keys");

    let result = client.invoke(&request, &CancellationToken::new()).await;

    assert!(result.is_success(), "{result:?}");
    let captured = server.finish().await;
    assert_eq!(
        captured[0].target(),
        "/text-to-speech/..%2F..%2Fadmin%2Fkeys"
    );

    let client = ElevenLabsClient::new(http(descriptor, Some("xi")), "voice-1");
    let request = GenerationRequest::new(Capability::SpeechSynthesis, "Hi")
        .with_parameter(params::VOICE_ID, "..");
    let result = client.invoke(&request, &CancellationToken::new()).await;
    assert_eq!(failure_kind(result), ErrorKind::ProviderError);
}

#[test]
fn summarize_error_body_prefers_structured_messages() {
    assert_eq!(
        summarize_error_body(r#"{"error":{"message":"Invalid API key","code":401}}"#),
        "Invalid API key"
    );
    assert_eq!(
        summarize_error_body(r#"{"error":"Model is loading"}"#),
        "Model is loading"
    );
    assert_eq!(
        summarize_error_body(r#"{"detail":"Invalid token."}"#),
        "Invalid token."
    );
    assert_eq!(summarize_error_body("  \n "), "<empty body>");
    assert_eq!(
        summarize_error_body("<html>\n  Bad   Gateway\n</html>"),
        "<html> Bad Gateway </html>"
    );

    let long = "x".repeat(300);
    let summary = summarize_error_body(&long);
    assert_eq!(summary.chars().count(), 201);
    assert!(summary.ends_with('…'));
}

#[test]
fn temperature_parameter_is_bounded() {
    let request = GenerationRequest::new(Capability::TextGeneration, "x");
    assert_eq!(temperature(&request), 0.7);
    assert_eq!(
        temperature(&request.clone().with_parameter(params::TEMPERATURE, "0.2")),
        0.2
    );
    assert_eq!(
        temperature(&request.clone().with_parameter(params::TEMPERATURE, "9")),
        0.7
    );
    assert_eq!(
        temperature(&request.with_parameter(params::TEMPERATURE, "warm")),
        0.7
    );
}

#[test]
fn build_client_skips_unconfigured_local_speech() {
    let credentials: HashMap<String, String> = HashMap::new();
    let gateway = GatewayConfig::from_config(&Config::default(), &credentials).unwrap();
    let http = test_client();

    let built: Vec<String> = gateway
        .providers()
        .iter()
        .filter_map(|descriptor| build_client(descriptor, &gateway, &http))
        .map(|client| client.descriptor().id.clone())
        .collect();

    assert!(built.contains(&"openai".to_string()));
    assert!(built.contains(&"replicate".to_string()));
    assert!(!built.contains(&"local-speech".to_string()));

    let config = Config {
        local_speech_command: Some("espeak --stdin -s 140".into()),
        ..Config::default()
    };
    let gateway = GatewayConfig::from_config(&config, &credentials).unwrap();
    let local = gateway
        .providers()
        .iter()
        .find(|descriptor| descriptor.kind == ProviderKind::LocalSpeech)
        .unwrap();
    assert!(build_client(local, &gateway, &http).is_some());
}
