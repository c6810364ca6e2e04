use std::collections::BTreeMap;
use std::fmt;

use crate::core::capability::Capability;

/// Request parameter keys understood by the built-in providers.
pub mod params {
    pub const TARGET_LANGUAGE: &str = "targetLanguage";
    pub const VOICE_ID: &str = "voiceId";
    pub const LANGUAGE: &str = "language";
    pub const TEMPERATURE: &str = "temperature";
}

/// A single unit of work for one capability.
///
/// Built once per call and never mutated afterwards; providers only ever
/// see it by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    capability: Capability,
    parameters: BTreeMap<String, String>,
}

impl GenerationRequest {
    pub fn new(capability: Capability, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            capability,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: &str, value: impl Into<String>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }
}

/// What a successful provider call produced.
#[derive(Clone, PartialEq)]
pub enum Payload {
    Text(String),
    /// A reference to remotely hosted media (e.g. a generated image).
    Url(String),
    /// Raw bytes returned by the provider, such as synthesized speech.
    Audio {
        mime: String,
        bytes: Vec<u8>,
    },
}

impl Payload {
    /// Textual view of the payload, used when it is embedded in a reply.
    pub fn text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) | Payload::Url(text) => Some(text),
            Payload::Audio { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Text(text) | Payload::Url(text) => text.trim().is_empty(),
            Payload::Audio { bytes, .. } => bytes.is_empty(),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Payload::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Payload::Audio { mime, bytes } => f
                .debug_struct("Audio")
                .field("mime", mime)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

/// Why a single provider attempt did not produce a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The provider needs a credential and none is configured.
    MissingCredential,
    /// Transport failure or non-2xx status.
    ProviderError,
    /// 2xx response whose body did not have the expected shape.
    MalformedResponse,
    /// Request timeout or exhausted poll budget.
    Timeout,
    /// The caller abandoned the request.
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingCredential => "missing-credential",
            ErrorKind::ProviderError => "provider-error",
            ErrorKind::MalformedResponse => "malformed-response",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_credential(provider_id: &str) -> Self {
        Self::new(
            ErrorKind::MissingCredential,
            format!("no credential configured for provider '{provider_id}'"),
        )
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProviderError, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "request cancelled by caller")
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ProviderFailure {}

/// Outcome of exactly one provider attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Success(Payload),
    Failure(ProviderFailure),
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success(_))
    }
}

impl From<Result<Payload, ProviderFailure>> for GenerationResult {
    fn from(result: Result<Payload, ProviderFailure>) -> Self {
        match result {
            Ok(payload) => GenerationResult::Success(payload),
            Err(failure) => GenerationResult::Failure(failure),
        }
    }
}
