//! Site-Harvester main entry point
//!
//! This is the command-line interface for the Site-Harvester crawl engine.

use clap::{Parser, Subcommand};
use site_harvester::config::{load_optional_config, Config};
use site_harvester::{api, CrawlService};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Site-Harvester: a concurrent crawl-and-extract engine
///
/// Site-Harvester crawls a single site breadth-first, saves the readable text
/// of every page it reaches, and downloads linked documents together with
/// their extracted text.
#[derive(Parser, Debug)]
#[command(name = "site-harvester")]
#[command(version)]
#[command(about = "Crawl a site and extract its pages and documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Address to listen on, overriding the configuration
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Crawl one site in-process and print the resulting files
    Crawl {
        /// Seed URL
        #[arg(value_name = "URL")]
        url: String,

        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Document extensions to collect (comma-separated)
        #[arg(long, value_delimiter = ',', value_name = "EXTS")]
        doc_types: Option<Vec<String>>,

        /// Fetch pages through a JavaScript renderer (needs a renderer
        /// backend injected through the library; falls back to plain HTTP)
        #[arg(long)]
        render: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Serve { config, bind } => {
            let config = load(config.as_deref())?;
            handle_serve(config, bind).await
        }
        Command::Crawl {
            url,
            config,
            doc_types,
            render,
        } => {
            let config = load(config.as_deref())?;
            handle_crawl(config, &url, doc_types, render).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvester=info,warn"),
            1 => EnvFilter::new("site_harvester=debug,tower_http=debug,info"),
            2 => EnvFilter::new("site_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or the defaults when none is given
fn load(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    match load_optional_config(path) {
        Ok((config, Some(hash))) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        Ok((config, None)) => {
            tracing::info!("No configuration file given, using defaults");
            Ok(config)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the serve command
async fn handle_serve(config: Config, bind: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    tracing::info!(
        "Writing results under {}",
        config.output.root_dir.display()
    );

    let service = CrawlService::new(config)?;
    api::serve(service, &bind).await?;
    Ok(())
}

/// Handles the crawl command
async fn handle_crawl(
    config: Config,
    url: &str,
    doc_types: Option<Vec<String>>,
    render: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = CrawlService::new(config)?;
    if render && !service.has_renderer() {
        tracing::warn!("No renderer backend is configured; pages will be fetched over plain HTTP");
    }
    let kinds = doc_types.unwrap_or_else(|| service.default_document_kinds().to_vec());
    tracing::info!("Document types: {}", kinds.join(", "));

    let job_id = service.submit_crawl(url, render, &kinds).await?;

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut last_progress = None;
    let snapshot = loop {
        ticker.tick().await;
        let snapshot = service.poll_status(job_id);
        if last_progress != Some(snapshot.progress) {
            tracing::info!("Job {}: {}%", job_id, snapshot.progress);
            last_progress = Some(snapshot.progress);
        }
        if snapshot.status.is_done() {
            break snapshot;
        }
    };

    if let Some(error) = &snapshot.error {
        tracing::error!("Crawl ended abnormally: {}", error);
    }

    let domain = snapshot.domain.unwrap_or_default();
    let files = service.list_results(&domain).await;
    println!(
        "{} files in {}",
        files.len(),
        service.config().output.root_dir.join(format!("output_{}", domain)).display()
    );
    for file in files {
        println!("  {}", file);
    }

    Ok(())
}
