//! Capabilities offered by external providers and the user-facing features
//! that are built on top of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A kind of work an external provider can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    TextGeneration,
    ImageGeneration,
    SpeechSynthesis,
    Translation,
    CodeGeneration,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::TextGeneration,
        Capability::ImageGeneration,
        Capability::SpeechSynthesis,
        Capability::Translation,
        Capability::CodeGeneration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::TextGeneration => "text-generation",
            Capability::ImageGeneration => "image-generation",
            Capability::SpeechSynthesis => "speech-synthesis",
            Capability::Translation => "translation",
            Capability::CodeGeneration => "code-generation",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName {
    kind: &'static str,
    name: String,
}

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: '{}'", self.kind, self.name)
    }
}

impl std::error::Error for UnknownName {}

impl FromStr for Capability {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Capability::ALL
            .into_iter()
            .find(|capability| capability.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownName {
                kind: "capability",
                name: s.to_string(),
            })
    }
}

/// User-facing feature identifiers accepted at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureId {
    Chat,
    Reasoning,
    Code,
    Image,
    Translate,
    Voice,
    Analysis,
    Web,
    Video,
    Music,
}

impl FeatureId {
    pub const ALL: [FeatureId; 10] = [
        FeatureId::Chat,
        FeatureId::Reasoning,
        FeatureId::Code,
        FeatureId::Image,
        FeatureId::Translate,
        FeatureId::Voice,
        FeatureId::Analysis,
        FeatureId::Web,
        FeatureId::Video,
        FeatureId::Music,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureId::Chat => "chat",
            FeatureId::Reasoning => "reasoning",
            FeatureId::Code => "code",
            FeatureId::Image => "image",
            FeatureId::Translate => "translate",
            FeatureId::Voice => "voice",
            FeatureId::Analysis => "analysis",
            FeatureId::Web => "web",
            FeatureId::Video => "video",
            FeatureId::Music => "music",
        }
    }

    /// Parse a feature name coming from an untyped caller.
    ///
    /// Unknown names are routed to [`FeatureId::Chat`] rather than rejected.
    pub fn parse_lenient(name: &str) -> FeatureId {
        match name.parse() {
            Ok(feature) => feature,
            Err(_) => {
                debug!(feature = name, "unknown feature, routing to chat");
                FeatureId::Chat
            }
        }
    }

    /// Capability chains consulted when handling this feature.
    ///
    /// Video and music have no provider chain; they are answered from
    /// templates only.
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            FeatureId::Chat | FeatureId::Reasoning | FeatureId::Analysis | FeatureId::Web => {
                &[Capability::TextGeneration]
            }
            FeatureId::Code => &[Capability::CodeGeneration],
            FeatureId::Image => &[Capability::ImageGeneration],
            FeatureId::Translate => &[Capability::Translation],
            FeatureId::Voice => &[Capability::SpeechSynthesis],
            FeatureId::Video | FeatureId::Music => &[],
        }
    }

    /// Instruction prepended to the user's prompt before it reaches a text
    /// provider.
    pub fn prompt_prefix(&self) -> Option<&'static str> {
        match self {
            FeatureId::Reasoning => Some("Provide step-by-step reasoning for: "),
            FeatureId::Analysis => Some("Provide detailed data analysis and insights for: "),
            FeatureId::Web => Some("Create a complete website plan and code structure for: "),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FeatureId::Chat => "General conversation",
            FeatureId::Reasoning => "Step-by-step reasoning",
            FeatureId::Code => "Code generation in a fenced block",
            FeatureId::Image => "Image generation (asynchronous job polling)",
            FeatureId::Translate => "Translation into several languages at once",
            FeatureId::Voice => "Text-to-speech synthesis",
            FeatureId::Analysis => "Data analysis and insights",
            FeatureId::Web => "Website plan and code structure",
            FeatureId::Video => "Video production plan (template only)",
            FeatureId::Music => "Music composition plan (template only)",
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureId {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        FeatureId::ALL
            .into_iter()
            .find(|feature| feature.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownName {
                kind: "feature",
                name: s.to_string(),
            })
    }
}
