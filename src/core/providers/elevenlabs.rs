use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use tokio_util::sync::CancellationToken;

use crate::api::{SpeechRequest, VoiceSettings};
use crate::core::config::data::ProviderDescriptor;
use crate::core::providers::{HttpProvider, ProviderClient};
use crate::core::request::{params, GenerationRequest, GenerationResult, Payload, ProviderFailure};
use crate::utils::url::construct_api_url_with_segments;

const DEFAULT_MODEL: &str = "eleven_monolingual_v1";
const AUDIO_MPEG: &str = "audio/mpeg";

/// Text to speech returning encoded audio bytes.
pub struct ElevenLabsClient {
    http: HttpProvider,
    default_voice_id: String,
}

impl ElevenLabsClient {
    pub fn new(http: HttpProvider, default_voice_id: &str) -> Self {
        Self {
            http,
            default_voice_id: default_voice_id.to_string(),
        }
    }

    async fn synthesize(&self, request: &GenerationRequest) -> Result<Payload, ProviderFailure> {
        self.http.preflight(request)?;

        let voice = request
            .parameter(params::VOICE_ID)
            .unwrap_or(&self.default_voice_id);
        let body = SpeechRequest {
            text: request.prompt().to_string(),
            model_id: self.http.model_or(DEFAULT_MODEL).to_string(),
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.5,
            },
        };
        let url = construct_api_url_with_segments(
            &self.http.descriptor().endpoint,
            &["text-to-speech", voice],
        )?;
        let response = self
            .http
            .send(
                self.http
                    .request(Method::POST, &url)
                    .header(ACCEPT, AUDIO_MPEG)
                    .json(&body),
            )
            .await?;

        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| AUDIO_MPEG.to_string());
        if !mime.starts_with("audio/") {
            return Err(ProviderFailure::malformed(format!(
                "expected audio, got '{mime}'"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| self.http.transport_failure(err))?;
        if bytes.is_empty() {
            return Err(ProviderFailure::malformed("speech response was empty"));
        }

        Ok(Payload::Audio {
            mime,
            bytes: bytes.to_vec(),
        })
    }
}

#[async_trait]
impl ProviderClient for ElevenLabsClient {
    fn descriptor(&self) -> &ProviderDescriptor {
        self.http.descriptor()
    }

    async fn invoke(
        &self,
        request: &GenerationRequest,
        _cancel: &CancellationToken,
    ) -> GenerationResult {
        self.synthesize(request).await.into()
    }
}
