//! Ordered fallback over the providers for one capability.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::capability::Capability;
use crate::core::config::data::ProviderDescriptor;
use crate::core::errors::Cancelled;
use crate::core::local;
use crate::core::providers::ProviderClient;
use crate::core::request::{ErrorKind, GenerationRequest, GenerationResult, Payload};

/// Where a resolved payload came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Provider(String),
    Local,
}

impl Origin {
    pub fn is_local(&self) -> bool {
        matches!(self, Origin::Local)
    }
}

/// The single terminal outcome of a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub payload: Payload,
    pub origin: Origin,
}

pub struct FallbackChain {
    capability: Capability,
    providers: Vec<Arc<dyn ProviderClient>>,
}

impl FallbackChain {
    /// Providers are tried in the given order. Entries that serve another
    /// capability are dropped.
    pub fn new(capability: Capability, providers: Vec<Arc<dyn ProviderClient>>) -> Self {
        let providers = providers
            .into_iter()
            .filter(|provider| {
                let descriptor = provider.descriptor();
                let matches = descriptor.capability == capability;
                if !matches {
                    warn!(
                        provider = %descriptor.id,
                        capability = %capability,
                        serves = %descriptor.capability,
                        "provider does not serve this chain, ignoring"
                    );
                }
                matches
            })
            .collect();
        Self {
            capability,
            providers,
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ProviderDescriptor> + '_ {
        self.providers.iter().map(|provider| provider.descriptor())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Try each provider once, in order, and return the first success.
    ///
    /// Provider failures are logged and absorbed; when all of them fail
    /// (or there are none) the answer is synthesized locally. The only
    /// error is cancellation by the caller.
    pub async fn resolve(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Resolution, Cancelled> {
        for provider in &self.providers {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }
            let descriptor = provider.descriptor();
            debug!(provider = %descriptor.id, capability = %self.capability, "attempting provider");

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Cancelled),
                result = provider.invoke(request, cancel) => result,
            };

            match result {
                GenerationResult::Success(payload) if !payload.is_empty() => {
                    debug!(
                        provider = %descriptor.id,
                        capability = %self.capability,
                        "provider succeeded"
                    );
                    return Ok(Resolution {
                        payload,
                        origin: Origin::Provider(descriptor.id.clone()),
                    });
                }
                GenerationResult::Success(_) => {
                    warn!(
                        provider = %descriptor.id,
                        capability = %self.capability,
                        kind = %ErrorKind::MalformedResponse,
                        error = "empty payload",
                        "provider attempt failed"
                    );
                }
                GenerationResult::Failure(failure) if failure.kind == ErrorKind::Cancelled => {
                    return Err(Cancelled);
                }
                GenerationResult::Failure(failure) => {
                    warn!(
                        provider = %descriptor.id,
                        capability = %self.capability,
                        kind = %failure.kind,
                        error = %failure.message,
                        "provider attempt failed"
                    );
                }
            }
        }

        info!(
            capability = %self.capability,
            attempted = self.providers.len(),
            "no provider succeeded, answering from local synthesis"
        );
        Ok(Resolution {
            payload: local::synthesize(request),
            origin: Origin::Local,
        })
    }
}
