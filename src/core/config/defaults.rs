use std::time::Duration;

use crate::core::builtin_providers::load_builtin_providers;
use crate::core::config::data::{Config, ProviderDescriptor};
use crate::core::poller::PollPolicy;

pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 30;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_TRANSLATION_TARGETS: [&str; 4] = ["es", "fr", "de", "it"];
pub const DEFAULT_VOICE_ID: &str = "pNInz6obpgDQGcFmaJgB";
pub const DEFAULT_CODE_LANGUAGE: &str = "javascript";

impl Config {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            max_attempts: self
                .poll_max_attempts
                .filter(|attempts| *attempts > 0)
                .unwrap_or(DEFAULT_POLL_MAX_ATTEMPTS),
            interval: Duration::from_millis(
                self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
        }
    }

    pub fn request_deadline(&self) -> Option<Duration> {
        self.request_deadline_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn translation_targets(&self) -> Vec<String> {
        let configured: Vec<String> = self
            .translation_targets
            .iter()
            .flatten()
            .map(|lang| lang.trim().to_lowercase())
            .filter(|lang| !lang.is_empty())
            .collect();

        if configured.is_empty() {
            DEFAULT_TRANSLATION_TARGETS
                .iter()
                .map(|lang| lang.to_string())
                .collect()
        } else {
            configured
        }
    }

    pub fn default_voice_id(&self) -> &str {
        self.default_voice_id
            .as_deref()
            .filter(|voice| !voice.trim().is_empty())
            .unwrap_or(DEFAULT_VOICE_ID)
    }

    pub fn code_language(&self) -> &str {
        self.code_language
            .as_deref()
            .filter(|lang| !lang.trim().is_empty())
            .unwrap_or(DEFAULT_CODE_LANGUAGE)
    }

    /// Split the configured on-device speech command into program and args.
    pub fn local_speech_command(&self) -> Option<Vec<String>> {
        let parts: Vec<String> = self
            .local_speech_command
            .as_deref()?
            .split_whitespace()
            .map(str::to_string)
            .collect();
        (!parts.is_empty()).then_some(parts)
    }

    /// Built-in descriptors merged with user-defined ones, in priority order.
    ///
    /// A user entry whose id matches a built-in replaces it in place; other
    /// user entries are appended after the built-ins.
    pub fn effective_providers(&self) -> Vec<ProviderDescriptor> {
        let mut providers = if self.builtin_providers.unwrap_or(true) {
            load_builtin_providers()
        } else {
            Vec::new()
        };

        for custom in &self.providers {
            match providers
                .iter_mut()
                .find(|existing| existing.id.eq_ignore_ascii_case(&custom.id))
            {
                Some(existing) => *existing = custom.clone(),
                None => providers.push(custom.clone()),
            }
        }

        providers
    }
}
