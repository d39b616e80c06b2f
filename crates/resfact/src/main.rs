//! resfact
//!
//! Collects a point-in-time inventory of system resources and prints it
//! as an external fact for the configuration-management agent.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use resfact_exec::LocalRunner;
use resfact_inventory::{
    AllowList, CollectionReport, ResourceCollector, SerializationAnomaly, TypeCatalog, normalize,
    system_catalog,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod publish;

use config::{Config, LogFormat, LoggingConfig};
use publish::FactPublisher;

/// Resource inventory fact collector
#[derive(Parser, Debug)]
#[command(name = "resfact", version, about)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Read system files under this root instead of `/`
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Collect the inventory and print it as a fact
    Collect {
        /// Allow-list file (YAML sequence of type names)
        #[arg(long, env = "RESFACT_ALLOW_LIST")]
        allow_list: Option<PathBuf>,

        /// Only collect these types, ignoring the allow-list file
        #[arg(long = "only", value_name = "TYPE")]
        only: Vec<String>,

        /// Write the fact to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,

        /// Print a per-type report to stderr
        #[arg(long)]
        report: bool,
    },
    /// List the resource types the catalog knows about
    Types,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(Config::locate);
    let mut config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(root) = cli.root {
        config.providers.root = root;
    }

    init_tracing(&config.logging)?;

    log_config_source(config_path.as_deref());

    let runner = Arc::new(LocalRunner::new());
    let catalog = Arc::new(system_catalog(&config.providers.settings(), runner));

    match cli.command {
        Commands::Collect {
            allow_list,
            only,
            output,
            pretty,
            report,
        } => {
            let allow_list = if only.is_empty() {
                let path = allow_list.unwrap_or_else(|| config.collector.allow_list.clone());
                let (list, source) = AllowList::load(&path);
                debug!(path = %path.display(), ?source, "resolved allow-list");
                list
            } else {
                AllowList::only(only)
            };

            let collection = ResourceCollector::new(catalog).collect(&allow_list).await;
            let normalized = normalize(&collection.inventory);

            if report {
                print_report(&collection.report, &normalized.anomalies);
            }

            let publisher = FactPublisher::new(config.collector.fact_name.as_str(), pretty);
            match output {
                Some(path) => publisher.write_file(&path, normalized.value)?,
                None => publisher.write_to(std::io::stdout().lock(), normalized.value)?,
            }

            info!("fact published");
        }
        Commands::Types => {
            for name in catalog.list_types() {
                println!("{name}");
            }
        }
    }

    Ok(())
}

fn log_config_source(path: Option<&Path>) {
    match path {
        Some(path) => debug!(path = %path.display(), "loaded configuration"),
        None => warn!("no config file found, using defaults"),
    }
}

/// Install the stderr subscriber; stdout carries the fact document
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}

fn print_report(report: &CollectionReport, anomalies: &[SerializationAnomaly]) {
    for outcome in &report.outcomes {
        eprintln!("{:<16} {}", outcome.type_name, outcome.status);
    }
    for anomaly in anomalies {
        eprintln!(
            "{:<16} dropped while encoding: {}",
            anomaly.type_name, anomaly.message
        );
    }

    let summary = report.summary();
    eprintln!(
        "{} collected ({} instances), {} empty, {} filtered, {} failed",
        summary.collected,
        summary.instances,
        summary.empty,
        summary.filtered,
        summary.faulted + anomalies.len()
    );
}
