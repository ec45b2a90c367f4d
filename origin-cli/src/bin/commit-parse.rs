//! Sum last year's commits per contributor across the repositories in a statistics file
use anyhow::Result;
use clap::Parser;
use origin_cli::{commit_parse, logging, serviceability};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "commit-parse")]
struct App {
    /// JSON file with per-repository commit statistics
    #[arg(short, long)]
    filename: PathBuf,
}

fn main() -> Result<()> {
    logging::init();
    let var = |name: &str| std::env::var(name).unwrap_or_default();
    serviceability::behavior_on_panic(&var("OPENSHIFT_ON_PANIC"));
    serviceability::profile(&var("OPENSHIFT_PROFILE"));

    let app = App::parse();
    print!("{}", commit_parse::run(&app.filename)?);
    Ok(())
}
