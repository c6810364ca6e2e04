//! Authentication utilities for provider requests
//!
//! This module adds provider-specific credentials to outgoing HTTP requests.

use crate::core::config::data::ProviderKind;

/// Add provider-specific authentication to an HTTP request
///
/// Each provider family expects its credential in a different place:
/// - Replicate: `Authorization: Token <key>`
/// - ElevenLabs: `xi-api-key` header
/// - Google Cloud Translation: `key` query parameter
/// - OpenAI and Hugging Face: `Authorization: Bearer <key>`
///
/// Providers that take no credential get the request back untouched.
pub fn add_auth_headers(
    request: reqwest::RequestBuilder,
    kind: ProviderKind,
    credential: &str,
) -> reqwest::RequestBuilder {
    match kind {
        ProviderKind::Replicate => request.header("Authorization", format!("Token {credential}")),
        ProviderKind::Elevenlabs => request.header("xi-api-key", credential),
        ProviderKind::GoogleTranslate => request.query(&[("key", credential)]),
        ProviderKind::GoogleTranslateFree | ProviderKind::LocalSpeech => request,
        ProviderKind::OpenaiChat | ProviderKind::OpenaiImages | ProviderKind::Huggingface => {
            request.header("Authorization", format!("Bearer {credential}"))
        }
    }
}
