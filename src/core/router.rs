//! Maps user-facing features onto capability chains and formats the
//! result.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::capability::{Capability, FeatureId};
use crate::core::chain::{FallbackChain, Resolution};
use crate::core::config::GatewayConfig;
use crate::core::errors::{Cancelled, GatewayError, ValidationError};
use crate::core::formatter::{self, SlotResult};
use crate::core::providers::build_client;
use crate::core::request::{params, GenerationRequest, Payload};

/// Progress of one call through the router. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Received,
    Dispatching,
    Formatting,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureResponse {
    pub feature: FeatureId,
    /// Formatted markdown reply.
    pub text: String,
    /// One entry per chain resolution, in slot order.
    pub results: Vec<SlotResult>,
}

impl FeatureResponse {
    pub fn result_for(&self, capability: Capability) -> Option<&SlotResult> {
        self.results
            .iter()
            .find(|slot| slot.capability == capability)
    }

    /// Synthesized audio, if any slot produced some.
    pub fn audio(&self) -> Option<(&str, &[u8])> {
        self.results
            .iter()
            .find_map(|slot| match &slot.resolution.payload {
                Payload::Audio { mime, bytes } => Some((mime.as_str(), bytes.as_slice())),
                _ => None,
            })
    }
}

pub struct FeatureRouter {
    config: Arc<GatewayConfig>,
    chains: BTreeMap<Capability, FallbackChain>,
}

impl FeatureRouter {
    /// Build one chain per capability from the enabled providers, in
    /// configured priority order.
    pub fn from_config(config: Arc<GatewayConfig>, http: reqwest::Client) -> Self {
        let chains = Capability::ALL
            .into_iter()
            .map(|capability| {
                let providers = config
                    .providers_for(capability)
                    .filter_map(|descriptor| build_client(descriptor, &config, &http))
                    .collect();
                (capability, FallbackChain::new(capability, providers))
            })
            .collect();
        Self { config, chains }
    }

    /// Router over explicit chains. Capabilities without a chain are
    /// answered locally.
    pub fn with_chains(config: Arc<GatewayConfig>, chains: Vec<FallbackChain>) -> Self {
        let chains = chains
            .into_iter()
            .map(|chain| (chain.capability(), chain))
            .collect();
        Self { config, chains }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn chain(&self, capability: Capability) -> Option<&FallbackChain> {
        self.chains.get(&capability)
    }

    /// Untyped entry point: unknown feature names are treated as chat.
    pub async fn generate_response(
        &self,
        prompt: &str,
        feature: &str,
    ) -> Result<String, GatewayError> {
        let feature = FeatureId::parse_lenient(feature);
        let response = self
            .handle(prompt, feature, &CancellationToken::new())
            .await?;
        Ok(response.text)
    }

    pub async fn handle(
        &self,
        prompt: &str,
        feature: FeatureId,
        cancel: &CancellationToken,
    ) -> Result<FeatureResponse, GatewayError> {
        let prompt = validate_prompt(prompt)?;
        debug!(feature = %feature, stage = ?Stage::Received, "feature request");

        self.within_deadline(cancel, |token| async move {
            self.dispatch(prompt, feature, &token).await
        })
        .await
    }

    /// Resolve a single capability request without feature formatting.
    pub async fn resolve(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Resolution, GatewayError> {
        validate_prompt(request.prompt())?;
        self.within_deadline(cancel, |token| async move {
            self.resolve_capability(request, &token)
                .await
                .map_err(GatewayError::from)
        })
        .await
    }

    async fn dispatch(
        &self,
        prompt: &str,
        feature: FeatureId,
        cancel: &CancellationToken,
    ) -> Result<FeatureResponse, GatewayError> {
        let plan = self.plan(prompt, feature);
        debug!(
            feature = %feature,
            stage = ?Stage::Dispatching,
            slots = plan.len(),
            "dispatching to capability chains"
        );

        // Slots share no state, so they resolve concurrently; each chain
        // still tries its own providers one at a time.
        let resolved = join_all(
            plan.iter()
                .map(|(_, request)| self.resolve_capability(request, cancel)),
        )
        .await;

        let results = plan
            .into_iter()
            .zip(resolved)
            .map(|((label, request), resolution)| {
                let capability = request.capability();
                resolution.map(|resolution| SlotResult::new(capability, label, resolution))
            })
            .collect::<Result<Vec<_>, Cancelled>>()?;

        debug!(feature = %feature, stage = ?Stage::Formatting, "formatting response");
        let text = formatter::format(feature, prompt, &results);
        debug!(
            feature = %feature,
            stage = ?Stage::Done,
            chars = text.len(),
            "feature request done"
        );

        Ok(FeatureResponse {
            feature,
            text,
            results,
        })
    }

    /// Slot labels and requests for one feature, in output order.
    fn plan(&self, prompt: &str, feature: FeatureId) -> Vec<(String, GenerationRequest)> {
        if feature == FeatureId::Translate {
            return self
                .config
                .translation_targets
                .iter()
                .map(|lang| {
                    (
                        format!("translation:{lang}"),
                        GenerationRequest::new(Capability::Translation, prompt)
                            .with_parameter(params::TARGET_LANGUAGE, lang.as_str()),
                    )
                })
                .collect();
        }

        feature
            .capabilities()
            .iter()
            .map(|&capability| match capability {
                Capability::TextGeneration => {
                    let text = match feature.prompt_prefix() {
                        Some(prefix) => format!("{prefix}{prompt}"),
                        None => prompt.to_string(),
                    };
                    let request = GenerationRequest::new(capability, text);
                    ("text".to_string(), request)
                }
                Capability::CodeGeneration => {
                    let language = self.config.code_language.as_str();
                    (
                        format!("code:{language}"),
                        GenerationRequest::new(capability, prompt)
                            .with_parameter(params::LANGUAGE, language),
                    )
                }
                Capability::SpeechSynthesis => (
                    "speech".to_string(),
                    GenerationRequest::new(capability, prompt)
                        .with_parameter(params::VOICE_ID, self.config.default_voice_id.as_str()),
                ),
                Capability::ImageGeneration => (
                    "image".to_string(),
                    GenerationRequest::new(capability, prompt),
                ),
                Capability::Translation => (
                    "translation".to_string(),
                    GenerationRequest::new(capability, prompt),
                ),
            })
            .collect()
    }

    async fn resolve_capability(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Resolution, Cancelled> {
        match self.chains.get(&request.capability()) {
            Some(chain) => chain.resolve(request, cancel).await,
            None => {
                FallbackChain::new(request.capability(), Vec::new())
                    .resolve(request, cancel)
                    .await
            }
        }
    }

    /// Run `work` under the configured request deadline, if any. When the
    /// deadline passes, the child token handed to `work` is cancelled.
    async fn within_deadline<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        work: F,
    ) -> Result<T, GatewayError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let Some(deadline) = self.config.request_deadline else {
            return work(cancel.clone()).await;
        };

        let child = cancel.child_token();
        tokio::select! {
            outcome = work(child.clone()) => outcome,
            _ = tokio::time::sleep(deadline) => {
                child.cancel();
                warn!(deadline_ms = deadline.as_millis() as u64, "request deadline exceeded");
                Err(GatewayError::DeadlineExceeded(deadline))
            }
        }
    }
}

fn validate_prompt(prompt: &str) -> Result<&str, ValidationError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty("prompt"));
    }
    Ok(trimmed)
}
