//! Google translation, through the authenticated Cloud API and through the
//! public endpoint that needs no key.
//!
//! The two endpoints answer in different shapes. The Cloud API nests the
//! text under `data.translations[0].translatedText`; the public endpoint
//! returns an array of sentence segments, each `[translated, source, ...]`.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{TranslateRequest, TranslateResponse};
use crate::core::config::data::ProviderDescriptor;
use crate::core::providers::{HttpProvider, ProviderClient};
use crate::core::request::{params, GenerationRequest, GenerationResult, Payload, ProviderFailure};

const DEFAULT_TARGET: &str = "es";

fn target_language(request: &GenerationRequest) -> &str {
    request
        .parameter(params::TARGET_LANGUAGE)
        .unwrap_or(DEFAULT_TARGET)
}

/// An unchanged translation is still a success; the source may already be
/// in the target language.
fn finish(
    request: &GenerationRequest,
    target: &str,
    translated: Option<String>,
) -> Result<Payload, ProviderFailure> {
    let translated = translated
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ProviderFailure::malformed("translation response had no text"))?;
    if translated == request.prompt().trim() {
        debug!(target_language = target, "translation returned the source text unchanged");
    }
    Ok(Payload::Text(translated))
}

pub struct GoogleTranslateClient {
    http: HttpProvider,
}

impl GoogleTranslateClient {
    pub fn new(http: HttpProvider) -> Self {
        Self { http }
    }

    async fn translate(&self, request: &GenerationRequest) -> Result<Payload, ProviderFailure> {
        self.http.preflight(request)?;

        let target = target_language(request);
        let body = TranslateRequest {
            q: request.prompt().to_string(),
            target: target.to_string(),
            format: "text".to_string(),
        };
        let response: TranslateResponse = self
            .http
            .send_json(
                self.http
                    .request(Method::POST, &self.http.descriptor().endpoint)
                    .json(&body),
            )
            .await?;

        let translated = response
            .data
            .translations
            .into_iter()
            .next()
            .and_then(|translation| translation.translated_text);
        finish(request, target, translated)
    }
}

#[async_trait]
impl ProviderClient for GoogleTranslateClient {
    fn descriptor(&self) -> &ProviderDescriptor {
        self.http.descriptor()
    }

    async fn invoke(
        &self,
        request: &GenerationRequest,
        _cancel: &CancellationToken,
    ) -> GenerationResult {
        self.translate(request).await.into()
    }
}

pub struct FreeTranslateClient {
    http: HttpProvider,
}

impl FreeTranslateClient {
    pub fn new(http: HttpProvider) -> Self {
        Self { http }
    }

    async fn translate(&self, request: &GenerationRequest) -> Result<Payload, ProviderFailure> {
        self.http.preflight(request)?;

        let target = target_language(request);
        let query = [
            ("client", "gtx"),
            ("sl", "auto"),
            ("tl", target),
            ("dt", "t"),
            ("q", request.prompt()),
        ];
        let value: Value = self
            .http
            .send_json(
                self.http
                    .request(Method::GET, &self.http.descriptor().endpoint)
                    .query(&query),
            )
            .await?;

        finish(request, target, join_segments(&value))
    }
}

#[async_trait]
impl ProviderClient for FreeTranslateClient {
    fn descriptor(&self) -> &ProviderDescriptor {
        self.http.descriptor()
    }

    async fn invoke(
        &self,
        request: &GenerationRequest,
        _cancel: &CancellationToken,
    ) -> GenerationResult {
        self.translate(request).await.into()
    }
}

/// Concatenate the translated half of every sentence segment.
fn join_segments(value: &Value) -> Option<String> {
    let segments = value.get(0)?.as_array()?;
    let joined: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();
    (!joined.is_empty()).then_some(joined)
}
