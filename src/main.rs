mod badge;
mod config;
mod metrics;
mod pilot;
mod score;
mod verifier;
mod web;

use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::verifier::TrustVerifier;
use crate::web::server::WebServer;

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "trust_verifier=info".into());

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "trust-verifier.toml".to_string());

    let config = Config::load(&config_path)?;
    init_tracing(config.log.json);

    info!("trust-verifier v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Config loaded from {}", config_path);

    let config = Arc::new(config);
    let verifier = Arc::new(TrustVerifier::new(config.clone()).await?);

    let web = WebServer::new(verifier, config);
    web.run().await
}
