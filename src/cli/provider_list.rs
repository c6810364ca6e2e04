use std::error::Error;

use crate::core::capability::Capability;
use crate::core::config::{
    Config, EnvCredentials, GatewayConfig, ProviderDescriptor, ProviderKind,
};

/// Markdown table of every known provider, grouped by capability in
/// fallback order.
pub fn provider_table(config: &Config, gateway: &GatewayConfig) -> String {
    let providers = config.effective_providers();
    let mut table = String::new();
    table.push_str("| # | Provider | Display Name | Capability | Endpoint | Status |\n");
    table.push_str("|---:|---|---|---|---|:---:|\n");

    for capability in Capability::ALL {
        for (position, descriptor) in providers
            .iter()
            .filter(|descriptor| descriptor.capability == capability)
            .enumerate()
        {
            let provider_id = if config.get_custom_provider(&descriptor.id).is_some() {
                format!("{}*", descriptor.id)
            } else {
                descriptor.id.clone()
            };
            table.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                position + 1,
                provider_id,
                descriptor.display_name,
                capability,
                descriptor.endpoint,
                status(config, gateway, descriptor)
            ));
        }
    }
    table
}

fn status(
    config: &Config,
    gateway: &GatewayConfig,
    descriptor: &ProviderDescriptor,
) -> &'static str {
    if !descriptor.is_enabled() || config.is_disabled(&descriptor.id) {
        "disabled"
    } else if descriptor.kind == ProviderKind::LocalSpeech
        && gateway.local_speech_command.is_none()
    {
        "no command"
    } else if !descriptor.requires_credential {
        "✅ (no key)"
    } else if gateway.has_credential(&descriptor.id) {
        "✅"
    } else {
        "❌ missing key"
    }
}

pub fn list_providers() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let gateway = GatewayConfig::from_config(&config, &EnvCredentials)?;

    if config.effective_providers().is_empty() {
        println!("No providers configured. Every request will be answered locally.");
        return Ok(());
    }

    println!("Configured Providers:\n");
    print!("{}", provider_table(&config, &gateway));
    if !config.providers.is_empty() {
        println!("\n* = defined or overridden in the config file");
    }
    println!("\nProviders are tried top to bottom within each capability.");
    Ok(())
}
