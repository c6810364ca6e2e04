//! Process-wide provider configuration resolved once at startup.
//!
//! [`GatewayConfig`] is built from the on-disk [`Config`] plus a
//! [`CredentialSource`] and is read-only afterwards, so it can be shared
//! between concurrent requests behind an `Arc` without locking.

use std::collections::HashMap;
use std::time::Duration;

use crate::core::capability::Capability;
use crate::core::config::data::{Config, ProviderDescriptor, ProviderKind};
use crate::core::config::io::ConfigError;
use crate::core::poller::PollPolicy;

/// Looks up credentials by the name a descriptor declares.
pub trait CredentialSource {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads credentials from the process environment.
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name)
            .ok()
            .filter(|value| !value.trim().is_empty())
    }
}

impl CredentialSource for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned().filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    providers: Vec<ProviderDescriptor>,
    credentials: HashMap<String, String>,
    pub poll: PollPolicy,
    pub request_deadline: Option<Duration>,
    pub translation_targets: Vec<String>,
    pub default_voice_id: String,
    pub code_language: String,
    pub local_speech_command: Option<Vec<String>>,
}

impl GatewayConfig {
    pub fn from_config<S: CredentialSource>(
        config: &Config,
        source: &S,
    ) -> Result<Self, ConfigError> {
        let mut providers = Vec::new();
        let mut credentials = HashMap::new();

        for descriptor in config.effective_providers() {
            validate_descriptor(&descriptor)?;
            if !descriptor.is_enabled() || config.is_disabled(&descriptor.id) {
                continue;
            }
            if let Some(secret) = descriptor
                .credential_env
                .as_deref()
                .and_then(|name| source.lookup(name))
            {
                credentials.insert(descriptor.id.clone(), secret);
            }
            providers.push(descriptor);
        }

        Ok(Self {
            providers,
            credentials,
            poll: config.poll_policy(),
            request_deadline: config.request_deadline(),
            translation_targets: config.translation_targets(),
            default_voice_id: config.default_voice_id().to_string(),
            code_language: config.code_language().to_string(),
            local_speech_command: config.local_speech_command(),
        })
    }

    /// A configuration with no providers at all; every request is answered
    /// by local synthesis.
    pub fn offline() -> Self {
        let config = Config {
            builtin_providers: Some(false),
            ..Config::default()
        };
        Self {
            providers: Vec::new(),
            credentials: HashMap::new(),
            poll: config.poll_policy(),
            request_deadline: None,
            translation_targets: config.translation_targets(),
            default_voice_id: config.default_voice_id().to_string(),
            code_language: config.code_language().to_string(),
            local_speech_command: None,
        }
    }

    pub fn providers(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    /// Enabled providers for one capability, in priority order.
    pub fn providers_for(
        &self,
        capability: Capability,
    ) -> impl Iterator<Item = &ProviderDescriptor> + '_ {
        self.providers
            .iter()
            .filter(move |descriptor| descriptor.capability == capability)
    }

    pub fn credential(&self, provider_id: &str) -> Option<&str> {
        self.credentials.get(provider_id).map(String::as_str)
    }

    pub fn has_credential(&self, provider_id: &str) -> bool {
        self.credentials.contains_key(provider_id)
    }
}

fn validate_descriptor(descriptor: &ProviderDescriptor) -> Result<(), ConfigError> {
    if descriptor.id.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "provider entries need a non-empty id".to_string(),
        ));
    }
    if descriptor.kind != ProviderKind::LocalSpeech && descriptor.endpoint.trim().is_empty() {
        return Err(ConfigError::Invalid(format!(
            "provider '{}' has no endpoint",
            descriptor.id
        )));
    }
    if descriptor.requires_credential && descriptor.credential_env.is_none() {
        return Err(ConfigError::Invalid(format!(
            "provider '{}' requires a credential but names no credential_env",
            descriptor.id
        )));
    }
    if descriptor.timeout_ms == 0 {
        return Err(ConfigError::Invalid(format!(
            "provider '{}' has a zero timeout",
            descriptor.id
        )));
    }
    Ok(())
}
