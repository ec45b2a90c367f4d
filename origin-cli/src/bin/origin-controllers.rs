//! Run the dockercfg controllers until interrupted
use anyhow::Result;
use clap::Parser;
use kube::Client;
use origin_cli::{logging, serviceability};
use origin_controllers::{
    DockerRegistryServiceController, DockerUrl, DockercfgController, DockercfgTokenDeletedController,
    Options,
};
use std::{path::PathBuf, time::Duration};
use tracing::info;

#[derive(Parser)]
#[command(name = "origin-controllers")]
struct App {
    /// Path to the kubeconfig file; the default client config is used when unset
    #[arg(long)]
    kubeconfig: Option<PathBuf>,
    /// Namespace of the integrated registry service
    #[arg(long, default_value = "default")]
    registry_namespace: String,
    /// Name of the integrated registry service
    #[arg(long, default_value = "docker-registry")]
    registry_service: String,
    /// Re-examine every service account this often, in seconds; 0 disables
    #[arg(long, default_value_t = 0)]
    resync_seconds: u64,
}

async fn run(app: App) -> Result<()> {
    let client = match &app.kubeconfig {
        Some(path) => origin_config::helpers::kube_client(path).await?,
        None => Client::try_default().await?,
    };
    let options = Options {
        resync: (app.resync_seconds > 0).then(|| Duration::from_secs(app.resync_seconds)),
    };
    let docker_url = DockerUrl::default();

    let dockercfg = DockercfgController::new(client.clone(), docker_url.clone(), options.clone());
    let token_deleted = DockercfgTokenDeletedController::new(client.clone(), options.clone());
    let registry = DockerRegistryServiceController::new(
        client,
        docker_url,
        &app.registry_namespace,
        &app.registry_service,
        options,
    );
    dockercfg.run();
    token_deleted.run();
    registry.run();
    info!("controllers started");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    registry.stop();
    token_deleted.stop();
    dockercfg.stop();
    Ok(())
}

fn main() -> Result<()> {
    logging::init();
    let app = App::parse();
    serviceability::runtime_from_env()?.block_on(run(app))
}
