//! A small `oc`: administrative commands for an OpenShift cluster
use anyhow::Result;
use clap::{Parser, Subcommand};
use kube::{Api, Client};
use origin_cli::{
    logging, serviceability,
    sync_groups::{SyncGroupsArgs, SyncGroupsOptions},
    Error,
};
use origin_core::Group;
use origin_groupsync::LdapSearch;
use std::{path::PathBuf, process::ExitCode, sync::Arc};
use tracing::debug;

#[derive(Parser)]
#[command(name = "oc")]
struct App {
    /// Path to the kubeconfig file; the default client config is used when unset
    #[arg(long, global = true)]
    kubeconfig: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tools for managing a cluster
    Adm {
        #[command(subcommand)]
        command: AdmCommand,
    },
}

#[derive(Subcommand)]
enum AdmCommand {
    /// Sync OpenShift groups with records from an LDAP server
    SyncGroups(SyncGroupsArgs),
}

async fn client(kubeconfig: Option<&PathBuf>) -> Result<Client, Error> {
    Ok(match kubeconfig {
        Some(path) => origin_config::helpers::kube_client(path).await?,
        None => Client::try_default().await.map_err(Error::Client)?,
    })
}

async fn sync_groups(app: &App, args: &SyncGroupsArgs) -> Result<(), Error> {
    let options = SyncGroupsOptions::complete(args)?;
    options.validate()?;
    let searcher = Arc::new(LdapSearch::new(options.client_config()?));
    let groups: Api<Group> = Api::all(client(app.kubeconfig.as_ref()).await?);
    debug!(config = %options.config_source.display(), "loaded sync config");
    options
        .run(searcher, Arc::new(groups), &mut std::io::stdout().lock())
        .await
}

fn main() -> Result<ExitCode> {
    logging::init();
    let app = App::parse();
    let runtime = serviceability::runtime_from_env()?;
    let res = runtime.block_on(async {
        match &app.command {
            Command::Adm {
                command: AdmCommand::SyncGroups(args),
            } => sync_groups(&app, args).await,
        }
    });
    match res {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(Error::Aggregate(errors)) => {
            for err in errors.errors() {
                eprintln!("{err}");
            }
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}
