//! Built-in provider configuration
//!
//! This module loads the provider descriptors shipped with the binary from
//! the builtin_providers.toml file embedded at build time.

use serde::Deserialize;

use crate::core::config::data::ProviderDescriptor;

#[derive(Debug, Deserialize)]
struct BuiltinProvidersConfig {
    providers: Vec<ProviderDescriptor>,
}

/// Load built-in providers from the embedded configuration
pub fn load_builtin_providers() -> Vec<ProviderDescriptor> {
    const CONFIG_CONTENT: &str = include_str!("../builtin_providers.toml");

    let config: BuiltinProvidersConfig =
        toml::from_str(CONFIG_CONTENT).expect("Failed to parse builtin_providers.toml");

    config.providers
}
