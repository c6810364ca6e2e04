//! JSON HTTP boundary over the feature router.
//!
//! Every route answers 200 as long as the caller sent usable input:
//! provider outages are absorbed by the fallback chains, so the worst a
//! caller sees is a locally synthesized answer.

use std::io;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::capability::{Capability, FeatureId};
use crate::core::errors::{GatewayError, ValidationError};
use crate::core::request::{params, GenerationRequest, Payload};
use crate::core::router::FeatureRouter;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_TARGET_LANGUAGE: &str = "es";

#[derive(Deserialize)]
struct ChatBody {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    feature: Option<String>,
}

#[derive(Serialize)]
struct ChatReply {
    success: bool,
    response: String,
    feature: String,
    timestamp: String,
}

#[derive(Deserialize)]
struct ImageBody {
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageReply {
    success: bool,
    image_url: String,
    prompt: String,
    timestamp: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpeechBody {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    voice_id: Option<String>,
}

#[derive(Serialize)]
struct SpeechReply {
    success: bool,
    audio: String,
    text: String,
    timestamp: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateBody {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    target_lang: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslateReply {
    success: bool,
    original_text: String,
    translated_text: String,
    target_language: String,
    timestamp: String,
}

pub fn router(state: Arc<FeatureRouter>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/generate-image", post(generate_image))
        .route("/api/generate-speech", post(generate_speech))
        .route("/api/translate", post(translate))
        .with_state(state)
}

/// Serve until `shutdown` fires, then drain in-flight requests.
pub async fn serve(
    listener: TcpListener,
    state: Arc<FeatureRouter>,
    shutdown: CancellationToken,
) -> io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "gateway listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn chat(State(router): State<Arc<FeatureRouter>>, Json(body): Json<ChatBody>) -> Response {
    let prompt = body.prompt.unwrap_or_default();
    let feature = FeatureId::parse_lenient(body.feature.as_deref().unwrap_or("chat"));
    // Fires when the handler future is dropped, e.g. the client hung up.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    match router.handle(&prompt, feature, &cancel).await {
        Ok(response) => Json(ChatReply {
            success: true,
            response: response.text,
            feature: feature.to_string(),
            timestamp: timestamp(),
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

async fn generate_image(
    State(router): State<Arc<FeatureRouter>>,
    Json(body): Json<ImageBody>,
) -> Response {
    let prompt = body.prompt.unwrap_or_default();
    let request = GenerationRequest::new(Capability::ImageGeneration, prompt.as_str());

    match resolve(&router, &request).await {
        Ok(payload) => Json(ImageReply {
            success: true,
            image_url: payload.text().unwrap_or_default().to_string(),
            prompt,
            timestamp: timestamp(),
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

async fn generate_speech(
    State(router): State<Arc<FeatureRouter>>,
    Json(body): Json<SpeechBody>,
) -> Response {
    let text = body.text.unwrap_or_default();
    if text.trim().is_empty() {
        return error_response(ValidationError::empty("text").into());
    }
    let voice = body
        .voice_id
        .filter(|voice| !voice.trim().is_empty())
        .unwrap_or_else(|| router.config().default_voice_id.clone());
    let request = GenerationRequest::new(Capability::SpeechSynthesis, text.as_str())
        .with_parameter(params::VOICE_ID, voice);

    match resolve(&router, &request).await {
        Ok(payload) => Json(SpeechReply {
            success: true,
            audio: audio_field(&payload),
            text,
            timestamp: timestamp(),
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

async fn translate(
    State(router): State<Arc<FeatureRouter>>,
    Json(body): Json<TranslateBody>,
) -> Response {
    let text = body.text.unwrap_or_default();
    if text.trim().is_empty() {
        return error_response(ValidationError::empty("text").into());
    }
    let target = body
        .target_lang
        .map(|lang| lang.trim().to_ascii_lowercase())
        .filter(|lang| !lang.is_empty())
        .unwrap_or_else(|| DEFAULT_TARGET_LANGUAGE.to_string());
    let request = GenerationRequest::new(Capability::Translation, text.as_str())
        .with_parameter(params::TARGET_LANGUAGE, target.as_str());

    match resolve(&router, &request).await {
        Ok(payload) => Json(TranslateReply {
            success: true,
            original_text: text,
            translated_text: payload.text().unwrap_or_default().to_string(),
            target_language: target,
            timestamp: timestamp(),
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

async fn resolve(
    router: &FeatureRouter,
    request: &GenerationRequest,
) -> Result<Payload, GatewayError> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let resolution = router.resolve(request, &cancel).await?;
    Ok(resolution.payload)
}

/// Audio as a data URL, or the marker text when no engine produced bytes.
fn audio_field(payload: &Payload) -> String {
    match payload {
        Payload::Audio { mime, bytes } => format!(
            "data:{mime};base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        ),
        Payload::Text(text) | Payload::Url(text) => text.clone(),
    }
}

fn error_response(err: GatewayError) -> Response {
    let (status, message) = match &err {
        GatewayError::Validation(inner) => {
            (StatusCode::BAD_REQUEST, capitalize(&inner.to_string()))
        }
        GatewayError::DeadlineExceeded(_) => (StatusCode::GATEWAY_TIMEOUT, err.to_string()),
        GatewayError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
    };
    if status != StatusCode::BAD_REQUEST {
        warn!(status = status.as_u16(), error = %err, "request not completed");
    }
    (status, Json(json!({ "error": message }))).into_response()
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
