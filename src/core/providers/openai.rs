use async_trait::async_trait;
use reqwest::Method;
use tokio_util::sync::CancellationToken;

use crate::api::{
    ChatCompletionResponse, ChatMessage, ChatRequest, ImageGenerationRequest,
    ImageGenerationResponse,
};
use crate::core::config::data::ProviderDescriptor;
use crate::core::providers::{effective_prompt, temperature, HttpProvider, ProviderClient};
use crate::core::request::{GenerationRequest, GenerationResult, Payload, ProviderFailure};
use crate::utils::url::construct_api_url;

const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_IMAGE_MODEL: &str = "dall-e-2";
const MAX_TOKENS: u32 = 500;
const IMAGE_SIZE: &str = "512x512";

/// Chat completions, used for both text and code generation.
pub struct OpenAiChatClient {
    http: HttpProvider,
    code_language: String,
}

impl OpenAiChatClient {
    pub fn new(http: HttpProvider, code_language: &str) -> Self {
        Self {
            http,
            code_language: code_language.to_string(),
        }
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<Payload, ProviderFailure> {
        self.http.preflight(request)?;

        let body = ChatRequest {
            model: self.http.model_or(DEFAULT_CHAT_MODEL).to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: effective_prompt(request, &self.code_language),
            }],
            max_tokens: MAX_TOKENS,
            temperature: temperature(request),
        };
        let url = construct_api_url(&self.http.descriptor().endpoint, "chat/completions");
        let response: ChatCompletionResponse = self
            .http
            .send_json(self.http.request(Method::POST, &url).json(&body))
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .map(Payload::Text)
            .ok_or_else(|| ProviderFailure::malformed("completion contained no message content"))
    }
}

#[async_trait]
impl ProviderClient for OpenAiChatClient {
    fn descriptor(&self) -> &ProviderDescriptor {
        self.http.descriptor()
    }

    async fn invoke(
        &self,
        request: &GenerationRequest,
        _cancel: &CancellationToken,
    ) -> GenerationResult {
        self.complete(request).await.into()
    }
}

/// Synchronous image generation returning a hosted URL.
pub struct OpenAiImagesClient {
    http: HttpProvider,
}

impl OpenAiImagesClient {
    pub fn new(http: HttpProvider) -> Self {
        Self { http }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Payload, ProviderFailure> {
        self.http.preflight(request)?;

        let body = ImageGenerationRequest {
            model: self.http.model_or(DEFAULT_IMAGE_MODEL).to_string(),
            prompt: request.prompt().to_string(),
            n: 1,
            size: IMAGE_SIZE.to_string(),
        };
        let url = construct_api_url(&self.http.descriptor().endpoint, "images/generations");
        let response: ImageGenerationResponse = self
            .http
            .send_json(self.http.request(Method::POST, &url).json(&body))
            .await?;

        response
            .data
            .into_iter()
            .find_map(|image| image.url)
            .filter(|url| !url.trim().is_empty())
            .map(Payload::Url)
            .ok_or_else(|| ProviderFailure::malformed("image response contained no url"))
    }
}

#[async_trait]
impl ProviderClient for OpenAiImagesClient {
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
