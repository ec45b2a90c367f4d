//! Serve the admission plugins as a validating webhook
use anyhow::Result;
use clap::Parser;
use origin_admission::{
    default_plugins,
    webhook::{serve, ServeConfig, Webhook},
};
use origin_cli::{logging, serviceability};
use std::{net::SocketAddr, path::PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "origin-admission-webhook")]
struct App {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8443")]
    bind_address: SocketAddr,
    /// Serving certificate; plain http is served when neither this nor the key is set
    #[arg(long, requires = "tls_key")]
    tls_cert: Option<PathBuf>,
    /// Serving key
    #[arg(long, requires = "tls_cert")]
    tls_key: Option<PathBuf>,
    /// Plugins to enable; every registered plugin when empty
    #[arg(long, value_delimiter = ',')]
    plugins: Vec<String>,
}

async fn run(app: App) -> Result<()> {
    let registry = default_plugins();
    let names = if app.plugins.is_empty() {
        registry.registered_names()
    } else {
        app.plugins
    };
    info!(plugins = ?names, "enabling admission plugins");
    let webhook = Webhook::new(registry.new_chain(&names)?);
    let config = ServeConfig {
        addr: app.bind_address,
        tls: app.tls_cert.zip(app.tls_key),
    };
    serve(webhook, config, async {
        // a failed signal listener shuts the server down
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;
    Ok(())
}

fn main() -> Result<()> {
    logging::init();
    let app = App::parse();
    serviceability::runtime_from_env()?.block_on(run(app))
}
