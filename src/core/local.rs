//! Deterministic offline answers used when every provider in a chain has
//! failed. Nothing here touches the network or can fail.

use crate::core::capability::Capability;
use crate::core::config::defaults::DEFAULT_CODE_LANGUAGE;
use crate::core::request::{params, GenerationRequest, Payload};

pub const PLACEHOLDER_IMAGE_BASE: &str = "https://picsum.photos/512/512";

/// Marker returned for speech when neither a remote nor an on-device
/// engine produced audio.
pub const SPEECH_UNAVAILABLE: &str = "Speech synthesis unavailable; showing text only";

pub fn synthesize(request: &GenerationRequest) -> Payload {
    let prompt = request.prompt().trim();
    match request.capability() {
        Capability::TextGeneration => Payload::Text(format!(
            "I understand you're asking about: \"{prompt}\". While I'm currently using \
             fallback responses, I can still provide helpful information and guidance. \
             To get enhanced AI responses, please configure provider credentials."
        )),
        Capability::CodeGeneration => Payload::Text(code_template(
            prompt,
            request
                .parameter(params::LANGUAGE)
                .unwrap_or(DEFAULT_CODE_LANGUAGE),
        )),
        Capability::ImageGeneration => Payload::Url(placeholder_image_url(prompt)),
        Capability::Translation => Payload::Text(format!(
            "[Translation to {}]: {prompt}",
            request.parameter(params::TARGET_LANGUAGE).unwrap_or("es")
        )),
        Capability::SpeechSynthesis => Payload::Text(SPEECH_UNAVAILABLE.to_string()),
    }
}

/// Placeholder image whose seed is stable for a given prompt.
pub fn placeholder_image_url(prompt: &str) -> String {
    let seed = crc32fast::hash(prompt.as_bytes()) % 1000;
    format!("{PLACEHOLDER_IMAGE_BASE}?random={seed}")
}

fn code_template(prompt: &str, language: &str) -> String {
    let name = identifier(prompt);
    format!(
        "// Generated code for: {prompt}\n\
         // This is a template ({language}); configure a code provider for real generation\n\
         \n\
         function {name}Solution() {{\n\
         \x20 console.log(\"Implementing solution for: {escaped}\");\n\
         \n\
         \x20 // Add your implementation here\n\
         \x20 return {{\n\
         \x20   success: true,\n\
         \x20   message: \"Solution template ready\",\n\
         \x20   data: null\n\
         \x20 }};\n\
         }}\n\
         \n\
         // Usage\n\
         const result = {name}Solution();\n\
         console.log(result);",
        escaped = prompt.replace('\\', "\\\\").replace('"', "\\\""),
    )
}

/// camelCase identifier built from the prompt's alphanumeric words.
fn identifier(prompt: &str) -> String {
    let mut name = String::new();
    for (index, word) in prompt
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .take(6)
        .enumerate()
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if index == 0 {
                name.push(first.to_ascii_lowercase());
            } else {
                name.push(first.to_ascii_uppercase());
            }
            name.extend(chars.map(|c| c.to_ascii_lowercase()));
        }
    }
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "generated");
    }
    name
}
