//! On-device speech through an external command such as `espeak --stdin`.
//!
//! The prompt is written to the engine's stdin and never appears on its
//! command line, so the configured command must read its text from stdin.
//! The engine plays the audio itself, so the payload only records that
//! speech happened.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::config::data::ProviderDescriptor;
use crate::core::providers::{check_request, summarize_error_body, ProviderClient};
use crate::core::request::{GenerationRequest, GenerationResult, Payload, ProviderFailure};

pub struct LocalSpeechClient {
    descriptor: ProviderDescriptor,
    command: Vec<String>,
}

impl LocalSpeechClient {
    pub fn new(descriptor: ProviderDescriptor, command: Vec<String>) -> Self {
        Self {
            descriptor,
            command,
        }
    }

    async fn speak(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Payload, ProviderFailure> {
        check_request(&self.descriptor, request)?;
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| ProviderFailure::provider("local speech command is empty"))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ProviderFailure::provider(format!("cannot start {program}: {err}")))?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProviderFailure::provider(format!("{program} has no stdin")))?;
        let prompt = request.prompt().as_bytes().to_vec();

        // Feed stdin while collecting stderr so neither pipe can fill up
        // and stall the engine. Dropping the writer closes stdin.
        let feed = async move {
            let written = stdin.write_all(&prompt).await;
            drop(stdin);
            match written {
                Err(err) if err.kind() != io::ErrorKind::BrokenPipe => Err(err),
                _ => Ok(()),
            }
        };
        let run = async move { tokio::join!(feed, child.wait_with_output()) };

        let timeout = Duration::from_millis(self.descriptor.timeout_ms);
        let (fed, output) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ProviderFailure::cancelled()),
            finished = tokio::time::timeout(timeout, run) => match finished {
                Ok(finished) => finished,
                Err(_) => {
                    return Err(ProviderFailure::timeout(format!(
                        "{program} did not finish within {}ms",
                        self.descriptor.timeout_ms
                    )))
                }
            },
        };
        let output = output
            .map_err(|err| ProviderFailure::provider(format!("{program} did not run: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                String::new()
            } else {
                format!(": {}", summarize_error_body(&stderr))
            };
            return Err(ProviderFailure::provider(format!(
                "{program} exited with {}{detail}",
                output.status
            )));
        }
        fed.map_err(|err| {
            ProviderFailure::provider(format!("could not send text to {program}: {err}"))
        })?;

        debug!(provider = %self.descriptor.id, program = %program, "spoke prompt on device");
        Ok(Payload::Text(format!("Spoken on-device with {program}")))
    }
}

#[async_trait]
impl ProviderClient for LocalSpeechClient {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> GenerationResult {
        self.speak(request, cancel).await.into()
    }
}
