//! One-shot "ask" command

use std::error::Error;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::cli::{http_client, load_gateway};
use crate::core::capability::FeatureId;
use crate::core::errors::GatewayError;
use crate::core::router::{FeatureResponse, FeatureRouter};

pub async fn run_ask(
    prompt: Vec<String>,
    feature: &str,
    out: Option<PathBuf>,
    cancel: CancellationToken,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: nexora ask [-f FEATURE] <prompt>");
        std::process::exit(1);
    }

    let router = FeatureRouter::from_config(load_gateway()?, http_client()?);
    let feature = FeatureId::parse_lenient(feature);

    let response = match router.handle(&prompt, feature, &cancel).await {
        Ok(response) => response,
        Err(GatewayError::Cancelled) => {
            eprintln!("⚠️  Cancelled");
            std::process::exit(130);
        }
        Err(err) => return Err(err.into()),
    };

    println!("{}", response.text);

    if let Some(path) = out {
        match write_audio(&response, &path)? {
            Some(len) => eprintln!("🔊 Wrote {len} bytes of audio to {}", path.display()),
            None => eprintln!(
                "⚠️  No audio was produced; {} was not written",
                path.display()
            ),
        }
    }

    Ok(())
}

/// Write the response's audio to `path`, returning the byte count, or
/// `None` when no slot produced audio.
pub fn write_audio(response: &FeatureResponse, path: &Path) -> std::io::Result<Option<usize>> {
    let Some((_, bytes)) = response.audio() else {
        return Ok(None);
    };
    std::fs::write(path, bytes)?;
    Ok(Some(bytes.len()))
}
