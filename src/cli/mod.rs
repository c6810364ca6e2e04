//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod ask;
pub mod feature_list;
pub mod provider_list;
pub mod provider_toggle;
pub mod serve;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::ask::run_ask;
use crate::cli::feature_list::list_features;
use crate::cli::provider_list::list_providers;
use crate::cli::provider_toggle::set_provider_enabled;
use crate::cli::serve::run_serve;
use crate::core::config::data::path_display;
use crate::core::config::{Config, EnvCredentials, GatewayConfig};
use crate::server::DEFAULT_BIND;
use crate::utils::logging;

#[derive(Parser)]
#[command(name = "nexora")]
#[command(version)]
#[command(about = "Route AI requests through provider fallback chains")]
#[command(
    long_about = "Nexora sends chat, code, image, speech and translation requests to a list of \
providers in priority order. When a provider is missing a key, errors out or times out, the \
next one is tried; when all of them fail a local answer is produced instead.\n\n\
Credentials are read from the environment:\n\
  OPENAI_API_KEY        OpenAI chat, code and images\n\
  HUGGING_FACE_API_KEY  Hugging Face inference\n\
  REPLICATE_API_TOKEN   Replicate image jobs\n\
  ELEVENLABS_API_KEY    ElevenLabs speech\n\
  GOOGLE_API_KEY        Google Cloud Translation\n\n\
Logging:\n\
  NEXORA_LOG            tracing filter, e.g. nexora=debug (overrides -v)\n\
  NEXORA_CONFIG         path to an alternative config.toml"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one prompt through a feature and print the reply
    Ask {
        /// Feature to use (chat, reasoning, code, image, translate, voice, ...)
        #[arg(short = 'f', long, default_value = "chat")]
        feature: String,
        /// Write synthesized audio to this file
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Prompt text
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// List providers in priority order with their credential status
    Providers,
    /// List features and the capabilities they use
    Features,
    /// Print the effective configuration
    Config,
    /// Re-enable a provider that was disabled
    Enable {
        /// Provider id, e.g. openai
        provider: String,
    },
    /// Skip a provider without removing its settings
    Disable {
        /// Provider id, e.g. openai
        provider: String,
    },
    /// Run the JSON HTTP gateway
    Serve {
        /// Address to listen on
        #[arg(long, default_value = DEFAULT_BIND)]
        bind: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    logging::init(args.verbose);
    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command {
        Commands::Ask {
            feature,
            out,
            prompt,
        } => run_ask(prompt, &feature, out, ctrl_c_token()).await,
        Commands::Providers => list_providers(),
        Commands::Features => {
            list_features();
            Ok(())
        }
        Commands::Config => {
            let config = Config::load()?;
            if let Ok(path) = Config::get_config_path() {
                println!("Config file: {}", path_display(&path));
            }
            config.print_all();
            Ok(())
        }
        Commands::Enable { provider } => set_provider_enabled(&provider, true),
        Commands::Disable { provider } => set_provider_enabled(&provider, false),
        Commands::Serve { bind } => run_serve(&bind, ctrl_c_token()).await,
    }
}

/// Token that is cancelled on the first Ctrl+C.
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, cancelling");
            trigger.cancel();
        }
    });
    token
}

/// Gateway settings from the config file and the process environment.
pub(crate) fn load_gateway() -> Result<Arc<GatewayConfig>, Box<dyn Error>> {
    let config = Config::load()?;
    let gateway = GatewayConfig::from_config(&config, &EnvCredentials)?;
    Ok(Arc::new(gateway))
}

pub(crate) fn http_client() -> Result<reqwest::Client, Box<dyn Error>> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("nexora/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
