mod config;
mod deployment;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use comfy_table::Table;
use opv_fs::FsError;
use opv_release::{ReleaseError, ReleaseResolver};
use thiserror::Error;
use tracing::info;

pub use crate::config::*;
pub use crate::deployment::*;

#[derive(Parser, Debug)]
#[command(name = "opv", version, about = "oVirt patch verifier")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long = "config", global = true)]
    pub config_path: Option<PathBuf>,

    #[arg(long = "log", global = true, env = "OPV_LOG", default_value = "info")]
    pub log: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve machine specifications and print the deployment as JSON
    Machine {
        /// Specifications such as `engine,name=engine,iscsi`
        #[arg(required = true)]
        specs: Vec<String>,

        /// Script that installs the release repository file on each machine
        #[arg(long = "release-script")]
        release_script: Option<PathBuf>,
    },
    /// Build the merged repository file for a release
    Repofile {
        #[arg(long = "release", default_value = "master")]
        release: String,

        #[arg(long = "dist", default_value = "el7")]
        dist: String,
    },
    /// List releases published in the release index
    Releases,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Deployment(#[from] DeploymentError),

    #[error(transparent)]
    Release(#[from] ReleaseError),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("failed to serialize deployment: {0}")]
    Json(#[from] serde_json::Error),
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::load(cli.config_path.as_deref()).await?;
    match cli.command {
        Command::Machine {
            specs,
            release_script,
        } => cmd_machine(&config, &specs, release_script),
        Command::Repofile { release, dist } => cmd_repofile(&config, &release, &dist).await,
        Command::Releases => cmd_releases(&config).await,
    }
}

fn cmd_machine(
    config: &Config,
    specs: &[String],
    release_script: Option<PathBuf>,
) -> Result<(), AppError> {
    println!("{}", render_deployment(config, specs, release_script)?);
    Ok(())
}

fn render_deployment(
    config: &Config,
    specs: &[String],
    release_script: Option<PathBuf>,
) -> Result<String, AppError> {
    let mut resolver = config.machine_resolver();
    if let Some(script) = release_script {
        resolver = resolver.release_script(script);
    }
    let deployment = Deployment::resolve(&resolver, specs)?;
    Ok(serde_json::to_string_pretty(&deployment)?)
}

async fn cmd_repofile(config: &Config, release: &str, dist: &str) -> Result<(), AppError> {
    let resolver = ReleaseResolver::new(config.release_options()?)?;
    let file = resolver.resolve(release, dist).await?;
    let sections = file.sections().await?;

    info!(
        mirror = %config.reposync_path(dist, release).display(),
        "local mirror"
    );
    println!("{}", file.path().display());
    for section in sections {
        println!("  [{section}]");
    }
    Ok(())
}

async fn cmd_releases(config: &Config) -> Result<(), AppError> {
    let resolver = ReleaseResolver::new(config.release_options()?)?;
    let releases = resolver.available_releases().await?;

    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .set_header(vec!["version", "package"]);
    for entry in releases {
        table.add_row(vec![entry.version, entry.package]);
    }
    println!("{table}");
    Ok(())
}
