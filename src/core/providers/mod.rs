//! Provider clients: one network round trip per invocation, normalized into
//! a [`GenerationResult`].
//!
//! Clients never retry. Retrying, fallback and local synthesis belong to
//! [`crate::core::chain::FallbackChain`].

pub mod elevenlabs;
pub mod huggingface;
pub mod local_speech;
pub mod openai;
pub mod replicate;
pub mod translate;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::capability::Capability;
use crate::core::config::{GatewayConfig, ProviderDescriptor, ProviderKind};
use crate::core::poller::AsyncJobPoller;
use crate::core::request::{params, GenerationRequest, GenerationResult, ProviderFailure};
use crate::utils::auth::add_auth_headers;
use crate::utils::url::UnsafePathSegment;

pub use elevenlabs::ElevenLabsClient;
pub use huggingface::HuggingFaceClient;
pub use local_speech::LocalSpeechClient;
pub use openai::{OpenAiChatClient, OpenAiImagesClient};
pub use replicate::ReplicateJobs;
pub use translate::{FreeTranslateClient, GoogleTranslateClient};

/// A single external provider for one capability.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Perform one call. Implementations must not retry and must not panic
    /// on provider misbehaviour; every outcome is a [`GenerationResult`].
    async fn invoke(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> GenerationResult;
}

/// Shared plumbing for clients that talk HTTP.
#[derive(Clone)]
pub struct HttpProvider {
    descriptor: ProviderDescriptor,
    credential: Option<String>,
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new(
        descriptor: ProviderDescriptor,
        credential: Option<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            descriptor,
            credential,
            client,
        }
    }

    pub fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.descriptor
            .model
            .as_deref()
            .filter(|model| !model.trim().is_empty())
            .unwrap_or(default)
    }

    /// Checks that must pass before any network traffic happens.
    pub fn preflight(&self, request: &GenerationRequest) -> Result<(), ProviderFailure> {
        check_request(&self.descriptor, request)?;
        if self.descriptor.requires_credential && self.credential.is_none() {
            return Err(ProviderFailure::missing_credential(&self.descriptor.id));
        }
        Ok(())
    }

    /// Start a request with the descriptor's timeout and credential applied.
    pub fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .timeout(Duration::from_millis(self.descriptor.timeout_ms));
        match self.credential.as_deref() {
            Some(credential) => add_auth_headers(builder, self.descriptor.kind, credential),
            None => builder,
        }
    }

    /// Send the request and insist on a 2xx status.
    pub async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ProviderFailure> {
        let response = builder
            .send()
            .await
            .map_err(|err| self.transport_failure(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderFailure::provider(format!(
                "{} returned {}: {}",
                self.descriptor.display_name,
                status,
                summarize_error_body(&body)
            )));
        }
        Ok(response)
    }

    /// Send the request and decode a JSON body of the expected shape.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ProviderFailure> {
        let response = self.send(builder).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| self.transport_failure(err))?;
        serde_json::from_slice(&bytes).map_err(|err| {
            ProviderFailure::malformed(format!(
                "{} sent an unexpected payload: {err}",
                self.descriptor.display_name
            ))
        })
    }

    pub fn transport_failure(&self, err: reqwest::Error) -> ProviderFailure {
        if err.is_timeout() {
            ProviderFailure::timeout(format!(
                "{} did not answer within {}ms",
                self.descriptor.display_name, self.descriptor.timeout_ms
            ))
        } else {
            ProviderFailure::provider(format!(
                "{} request failed: {err}",
                self.descriptor.display_name
            ))
        }
    }
}

impl From<UnsafePathSegment> for ProviderFailure {
    fn from(err: UnsafePathSegment) -> Self {
        ProviderFailure::provider(err.to_string())
    }
}

/// Input constraints every client enforces before doing any work.
pub fn check_request(
    descriptor: &ProviderDescriptor,
    request: &GenerationRequest,
) -> Result<(), ProviderFailure> {
    if request.capability() != descriptor.capability {
        return Err(ProviderFailure::provider(format!(
            "provider '{}' serves {}, not {}",
            descriptor.id,
            descriptor.capability,
            request.capability()
        )));
    }
    if request.prompt().trim().is_empty() {
        return Err(ProviderFailure::provider("prompt is empty"));
    }
    Ok(())
}

/// Prompt sent to text models. Code requests are rephrased as a code
/// instruction in the requested language.
pub fn effective_prompt(request: &GenerationRequest, default_language: &str) -> String {
    match request.capability() {
        Capability::CodeGeneration => {
            let language = request
                .parameter(params::LANGUAGE)
                .unwrap_or(default_language);
            format!("Generate {language} code for: {}", request.prompt())
        }
        _ => request.prompt().to_string(),
    }
}

pub fn temperature(request: &GenerationRequest) -> f32 {
    request
        .parameter(params::TEMPERATURE)
        .and_then(|value| value.parse::<f32>().ok())
        .filter(|value| (0.0..=2.0).contains(value))
        .unwrap_or(0.7)
}

/// Reduce a provider error body to a one-line summary for logs.
pub fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let summary = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .or_else(|| {
                value.get("error").and_then(|v| match v {
                    serde_json::Value::String(s) => Some(s.to_string()),
                    _ => None,
                })
            })
            .or_else(|| {
                value
                    .get("detail")
                    .or_else(|| value.get("message"))
                    .and_then(|v| v.as_str().map(str::to_owned))
            });
        if let Some(text) = summary {
            let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !collapsed.is_empty() {
                return collapsed;
            }
        }
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, 200)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max).collect();
    truncated.push('…');
    truncated
}

/// Build the client for one descriptor.
///
/// Returns `None` for providers that cannot run in this process at all
/// (an on-device speech engine with no command configured).
pub fn build_client(
    descriptor: &ProviderDescriptor,
    gateway: &GatewayConfig,
    http: &reqwest::Client,
) -> Option<Arc<dyn ProviderClient>> {
    let credential = gateway.credential(&descriptor.id).map(str::to_string);
    let base = HttpProvider::new(descriptor.clone(), credential, http.clone());

    let client: Arc<dyn ProviderClient> = match descriptor.kind {
        ProviderKind::OpenaiChat => Arc::new(OpenAiChatClient::new(base, &gateway.code_language)),
        ProviderKind::OpenaiImages => Arc::new(OpenAiImagesClient::new(base)),
        ProviderKind::Huggingface => Arc::new(HuggingFaceClient::new(base, &gateway.code_language)),
        ProviderKind::Replicate => {
            Arc::new(AsyncJobPoller::new(ReplicateJobs::new(base), gateway.poll))
        }
        ProviderKind::Elevenlabs => {
            Arc::new(ElevenLabsClient::new(base, &gateway.default_voice_id))
        }
        ProviderKind::GoogleTranslate => Arc::new(GoogleTranslateClient::new(base)),
        ProviderKind::GoogleTranslateFree => Arc::new(FreeTranslateClient::new(base)),
        ProviderKind::LocalSpeech => match &gateway.local_speech_command {
            Some(command) => Arc::new(LocalSpeechClient::new(descriptor.clone(), command.clone())),
            None => {
                debug!(
                    provider = %descriptor.id,
                    "no local speech command configured, skipping provider"
                );
                return None;
            }
        },
    };
    Some(client)
}

#[cfg(test)]
mod tests;
