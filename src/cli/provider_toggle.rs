use std::error::Error;

use crate::core::config::Config;

/// Flip a provider's disabled flag in `config`. Returns whether anything
/// changed; unknown ids are rejected.
pub fn toggle_provider(config: &mut Config, id: &str, enabled: bool) -> Result<bool, String> {
    let id = id.trim();
    let known = config
        .effective_providers()
        .iter()
        .any(|descriptor| descriptor.id.eq_ignore_ascii_case(id));
    if !known {
        return Err(format!("Unknown provider: {id}"));
    }
    Ok(if enabled {
        config.enable_provider(id)
    } else {
        config.disable_provider(id)
    })
}

pub fn set_provider_enabled(id: &str, enabled: bool) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    let state = if enabled { "enabled" } else { "disabled" };

    if toggle_provider(&mut config, id, enabled)? {
        config.save()?;
        println!("✅ Provider '{id}' {state}");
    } else {
        println!("Provider '{id}' is already {state}");
    }
    Ok(())
}
