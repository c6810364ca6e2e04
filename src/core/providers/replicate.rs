//! Stable Diffusion on Replicate: a prediction is created, then polled by
//! id until it settles. Driven by [`crate::core::poller::AsyncJobPoller`].

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::api::{Prediction, PredictionInput, PredictionRequest};
use crate::core::config::data::ProviderDescriptor;
use crate::core::poller::{Job, JobProvider, JobStatus};
use crate::core::providers::HttpProvider;
use crate::core::request::{GenerationRequest, Payload, ProviderFailure};
use crate::utils::url::{construct_api_url, construct_api_url_with_segments};

const DEFAULT_VERSION: &str = "ac732df83cea7fff18b8472768c88ad041fa750ff7682a21affe81863cbe77e4";

pub struct ReplicateJobs {
    http: HttpProvider,
}

impl ReplicateJobs {
    pub fn new(http: HttpProvider) -> Self {
        Self { http }
    }
}

#[async_trait]
impl JobProvider for ReplicateJobs {
    fn descriptor(&self) -> &ProviderDescriptor {
        self.http.descriptor()
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<String, ProviderFailure> {
        self.http.preflight(request)?;

        let body = PredictionRequest {
            version: self.http.model_or(DEFAULT_VERSION).to_string(),
            input: PredictionInput {
                prompt: request.prompt().to_string(),
                width: 512,
                height: 512,
                num_outputs: 1,
                scheduler: "K_EULER".to_string(),
                num_inference_steps: 20,
                guidance_scale: 7.5,
            },
        };
        let url = construct_api_url(&self.http.descriptor().endpoint, "predictions");
        let prediction: Prediction = self
            .http
            .send_json(self.http.request(Method::POST, &url).json(&body))
            .await?;

        prediction
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ProviderFailure::malformed("prediction response had no id"))
    }

    async fn status(&self, job: &Job) -> Result<JobStatus, ProviderFailure> {
        let url = construct_api_url_with_segments(
            &self.http.descriptor().endpoint,
            &["predictions", &job.id],
        )?;
        let prediction: Prediction = self
            .http
            .send_json(self.http.request(Method::GET, &url))
            .await?;

        match prediction.status.as_deref() {
            Some("starting") => Ok(JobStatus::Pending),
            Some("processing") => Ok(JobStatus::Running),
            Some("succeeded") => first_output_url(prediction.output.as_ref())
                .map(|url| JobStatus::Succeeded(Payload::Url(url)))
                .ok_or_else(|| ProviderFailure::malformed("succeeded prediction had no output")),
            Some("failed") | Some("canceled") => Ok(JobStatus::Failed(
                prediction
                    .error
                    .as_ref()
                    .map(error_text)
                    .unwrap_or_else(|| "prediction did not complete".to_string()),
            )),
            Some(other) => {
                let message = format!("unknown prediction status '{other}'");
                Err(ProviderFailure::malformed(message))
            }
            None => Err(ProviderFailure::malformed("prediction has no status")),
        }
    }
}

/// Outputs are either a list of URLs or a single URL string.
fn first_output_url(output: Option<&Value>) -> Option<String> {
    let url = match output? {
        Value::Array(items) => items.iter().find_map(Value::as_str),
        Value::String(url) => Some(url.as_str()),
        _ => None,
    }?;
    let url = url.trim();
    (!url.is_empty()).then(|| url.to_string())
}

fn error_text(error: &Value) -> String {
    match error {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
