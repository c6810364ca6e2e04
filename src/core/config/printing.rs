use crate::core::config::data::Config;

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        match self.builtin_providers.unwrap_or(true) {
            true => println!("  builtin-providers: on"),
            false => println!("  builtin-providers: off"),
        }
        let policy = self.poll_policy();
        println!(
            "  poll: {} attempts every {}ms",
            policy.max_attempts,
            policy.interval.as_millis()
        );
        match self.request_deadline() {
            Some(deadline) => println!("  request-deadline: {}ms", deadline.as_millis()),
            None => println!("  request-deadline: (unset)"),
        }
        println!(
            "  translation-targets: {}",
            self.translation_targets().join(", ")
        );
        println!("  default-voice-id: {}", self.default_voice_id());
        println!("  code-language: {}", self.code_language());
        match &self.local_speech_command {
            Some(command) => println!("  local-speech-command: {command}"),
            None => println!("  local-speech-command: (unset)"),
        }
        if self.disabled_providers.is_empty() {
            println!("  disabled-providers: (none)");
        } else {
            println!(
                "  disabled-providers: {}",
                self.disabled_providers.join(", ")
            );
        }
        if !self.providers.is_empty() {
            println!("  custom-providers:");
            for provider in &self.providers {
                println!(
                    "    {} ({}, {})",
                    provider.id,
                    provider.capability,
                    provider.kind.as_str()
                );
            }
        }
    }
}
