use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::capability::Capability;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Which client implementation talks to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    OpenaiChat,
    OpenaiImages,
    Huggingface,
    Replicate,
    Elevenlabs,
    GoogleTranslate,
    GoogleTranslateFree,
    LocalSpeech,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenaiChat => "openai-chat",
            ProviderKind::OpenaiImages => "openai-images",
            ProviderKind::Huggingface => "huggingface",
            ProviderKind::Replicate => "replicate",
            ProviderKind::Elevenlabs => "elevenlabs",
            ProviderKind::GoogleTranslate => "google-translate",
            ProviderKind::GoogleTranslateFree => "google-translate-free",
            ProviderKind::LocalSpeech => "local-speech",
        }
    }
}

/// Static description of one external provider.
///
/// Descriptors are read at startup (built-ins plus user overrides) and are
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub display_name: String,
    pub capability: Capability,
    pub kind: ProviderKind,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub requires_credential: bool,
    /// Environment variable holding the credential.
    pub credential_env: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    pub model: Option<String>,
    pub enabled: Option<bool>,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl ProviderDescriptor {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Include the providers shipped with the binary
    pub builtin_providers: Option<bool>,
    /// Additional providers, or replacements for built-ins with the same id
    #[serde(default)]
    pub providers: Vec<ProviderDescriptor>,
    /// Provider ids that are skipped when chains are built
    #[serde(default)]
    pub disabled_providers: Vec<String>,
    /// Status queries per asynchronous job before giving up
    pub poll_max_attempts: Option<u32>,
    /// Delay between status queries, in milliseconds
    pub poll_interval_ms: Option<u64>,
    /// Overall budget for one feature request, in milliseconds
    pub request_deadline_ms: Option<u64>,
    /// Languages produced by the translate feature, in display order
    pub translation_targets: Option<Vec<String>>,
    /// On-device speech command that reads its text from stdin (e.g. "espeak --stdin -s 140")
    pub local_speech_command: Option<String>,
    pub default_voice_id: Option<String>,
    pub code_language: Option<String>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn get_custom_provider(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.providers
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(id))
    }

    pub fn is_disabled(&self, id: &str) -> bool {
        self.disabled_providers
            .iter()
            .any(|disabled| disabled.eq_ignore_ascii_case(id))
    }

    pub fn disable_provider(&mut self, id: &str) -> bool {
        if self.is_disabled(id) {
            return false;
        }
        self.disabled_providers.push(id.to_lowercase());
        true
    }

    pub fn enable_provider(&mut self, id: &str) -> bool {
        let before = self.disabled_providers.len();
        self.disabled_providers
            .retain(|disabled| !disabled.eq_ignore_ascii_case(id));
        before != self.disabled_providers.len()
    }
}
