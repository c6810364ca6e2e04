use async_trait::async_trait;
use reqwest::Method;
use tokio_util::sync::CancellationToken;

use crate::api::{InferenceOutput, InferenceParameters, InferenceRequest};
use crate::core::config::data::ProviderDescriptor;
use crate::core::providers::{effective_prompt, temperature, HttpProvider, ProviderClient};
use crate::core::request::{GenerationRequest, GenerationResult, Payload, ProviderFailure};
use crate::utils::url::construct_model_url;

const DEFAULT_MODEL: &str = "microsoft/DialoGPT-medium";
const MAX_NEW_TOKENS: u32 = 500;

/// Hosted inference for text and code models. The model name is part of
/// the request path.
pub struct HuggingFaceClient {
    http: HttpProvider,
    code_language: String,
}

impl HuggingFaceClient {
    pub fn new(http: HttpProvider, code_language: &str) -> Self {
        Self {
            http,
            code_language: code_language.to_string(),
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Payload, ProviderFailure> {
        self.http.preflight(request)?;

        let body = InferenceRequest {
            inputs: effective_prompt(request, &self.code_language),
            parameters: InferenceParameters {
                max_new_tokens: MAX_NEW_TOKENS,
                temperature: temperature(request),
                return_full_text: false,
                do_sample: true,
            },
        };
        let url = construct_model_url(
            &self.http.descriptor().endpoint,
            self.http.model_or(DEFAULT_MODEL),
        )?;
        let outputs: Vec<InferenceOutput> = self
            .http
            .send_json(self.http.request(Method::POST, &url).json(&body))
            .await?;

        outputs
            .into_iter()
            .next()
            .and_then(|output| output.generated_text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .map(Payload::Text)
            .ok_or_else(|| ProviderFailure::malformed("inference output had no generated_text"))
    }
}

#[async_trait]
impl ProviderClient for HuggingFaceClient {
    fn descriptor(&self) -> &ProviderDescriptor {
        self.http.descriptor()
    }

    async fn invoke(
        &self,
        request: &GenerationRequest,
        _cancel: &CancellationToken,
    ) -> GenerationResult {
        self.generate(request).await.into()
    }
}
