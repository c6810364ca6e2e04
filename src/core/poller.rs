//! Submit-then-poll driver for providers that answer with a job id.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::config::data::ProviderDescriptor;
use crate::core::config::defaults::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_MAX_ATTEMPTS};
use crate::core::providers::ProviderClient;
use crate::core::request::{GenerationRequest, GenerationResult, Payload, ProviderFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded(Payload),
    Failed(String),
}

/// A remote job accepted by a provider. Owned by the poller for the
/// duration of one request.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub provider: ProviderDescriptor,
    pub submitted_at: DateTime<Utc>,
    pub attempts: u32,
}

/// A provider whose work is split into a submission and status queries.
#[async_trait]
pub trait JobProvider: Send + Sync {
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Start a job and return its provider-side id.
    async fn submit(&self, request: &GenerationRequest) -> Result<String, ProviderFailure>;

    /// Query the current status of a job. Never retried on error.
    async fn status(&self, job: &Job) -> Result<JobStatus, ProviderFailure>;
}

pub struct AsyncJobPoller<P> {
    provider: P,
    policy: PollPolicy,
}

impl<P: JobProvider> AsyncJobPoller<P> {
    pub fn new(provider: P, policy: PollPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Submit the job and query it sequentially until it settles or the
    /// attempt budget runs out. At most `max_attempts` status queries are
    /// made and no query starts before the previous one has returned.
    pub async fn run_to_completion(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> GenerationResult {
        let submitted = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return GenerationResult::Failure(ProviderFailure::cancelled());
            }
            submitted = self.provider.submit(request) => submitted,
        };
        let id = match submitted {
            Ok(id) => id,
            Err(failure) => return GenerationResult::Failure(failure),
        };

        let mut job = Job {
            id,
            provider: self.provider.descriptor().clone(),
            submitted_at: Utc::now(),
            attempts: 0,
        };
        debug!(provider = %job.provider.id, job = %job.id, "job submitted");

        while job.attempts < self.policy.max_attempts {
            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return GenerationResult::Failure(ProviderFailure::cancelled());
                }
                status = self.provider.status(&job) => status,
            };
            job.attempts += 1;

            match status {
                Err(failure) => return GenerationResult::Failure(failure),
                Ok(JobStatus::Succeeded(payload)) => {
                    debug!(
                        provider = %job.provider.id,
                        job = %job.id,
                        attempts = job.attempts,
                        elapsed_ms = (Utc::now() - job.submitted_at).num_milliseconds(),
                        "job succeeded"
                    );
                    return GenerationResult::Success(payload);
                }
                Ok(JobStatus::Failed(reason)) => {
                    return GenerationResult::Failure(ProviderFailure::provider(format!(
                        "job {} failed: {reason}",
                        job.id
                    )));
                }
                Ok(JobStatus::Pending | JobStatus::Running) => {
                    if job.attempts >= self.policy.max_attempts {
                        break;
                    }
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return GenerationResult::Failure(ProviderFailure::cancelled());
                        }
                        _ = tokio::time::sleep(self.policy.interval) => {}
                    }
                }
            }
        }

        GenerationResult::Failure(ProviderFailure::timeout(format!(
            "job {} still pending after {} status checks",
            job.id, job.attempts
        )))
    }
}

#[async_trait]
impl<P: JobProvider> ProviderClient for AsyncJobPoller<P> {
    fn descriptor(&self) -> &ProviderDescriptor {
        self.provider.descriptor()
    }

    async fn invoke(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> GenerationResult {
        self.run_to_completion(request, cancel).await
    }
}
