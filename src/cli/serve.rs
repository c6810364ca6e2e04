use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::cli::{http_client, load_gateway};
use crate::core::router::FeatureRouter;
use crate::server;

pub async fn run_serve(bind: &str, shutdown: CancellationToken) -> Result<(), Box<dyn Error>> {
    let router = Arc::new(FeatureRouter::from_config(load_gateway()?, http_client()?));
    let listener = TcpListener::bind(bind).await?;
    eprintln!(
        "🚀 Nexora gateway listening on http://{} (Ctrl+C to stop)",
        listener.local_addr()?
    );
    server::serve(listener, router, shutdown).await?;
    eprintln!("👋 Gateway stopped");
    Ok(())
}
