//! `os-controller` command line.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::ApiRest;
use crate::check::OpenStackControllerCheck;
use crate::component::ComponentType;
use crate::config::CheckConfig;
use crate::error::ApiError;

/// Command-line arguments of `os-controller`.
#[derive(Parser)]
#[command(name = "os-controller")]
#[command(about = "OpenStack controller check", long_about = None)]
pub struct Cli {
    /// Path to the TOML or JSON check configuration
    #[arg(short, long, env = "OS_CONTROLLER_CONFIG", default_value = "/etc/os-controller/conf.toml")]
    pub config: PathBuf,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Run one check and print the report as JSON
    Run {
        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },
    /// Authorize and print the resolved endpoint of every component
    Catalog,
}

impl Cli {
    /// Loads the configuration and runs the selected subcommand.
    pub async fn run(self) -> Result<()> {
        let config = CheckConfig::from_file(&self.config)?;
        match self.command {
            Command::Run { pretty } => run_check(config, pretty).await,
            Command::Catalog => catalog(config).await,
        }
    }
}

async fn run_check(config: CheckConfig, pretty: bool) -> Result<()> {
    let report = OpenStackControllerCheck::new(config).run().await?;
    tracing::info!(
        metrics = report.metrics.len(),
        service_checks = report.service_checks.len(),
        "check run finished"
    );
    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);
    Ok(())
}

async fn catalog(config: CheckConfig) -> Result<()> {
    let mut api = ApiRest::new(config)?;
    api.authorize().await?;
    println!("{:<16} ENDPOINT", "COMPONENT");
    for component in ComponentType::ALL {
        match api.endpoint(component) {
            Ok(url) => println!("{:<16} {}", component, url),
            Err(ApiError::ComponentNotFound { .. }) => println!("{:<16} -", component),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
