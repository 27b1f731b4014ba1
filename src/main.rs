mod error;
mod http;
mod model;
mod parser;
mod scrape;
mod settings;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use model::ResultSet;
use scrape::Scraper;
use settings::{FailurePolicy, Settings};

#[derive(Parser)]
#[command(
    name = "agc_law",
    about = "Scrape the Laws of Malaysia index from agc.gov.my into JSON"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print "Requesting page" lines and a progress bar
    #[arg(long, global = true)]
    progress: bool,

    /// Indent the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Skip failed pages instead of aborting the whole run
    #[arg(long, global = true)]
    isolate_failures: bool,

    /// Per-request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover every volume page, scrape them all, print {"lom": [...]} (default)
    Run,
    /// List the volume pages found on the landing page
    Pages,
    /// Extract laws from a saved volume page
    Extract {
        /// HTML file of a volume page
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is reserved for the JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = apply_flags(Settings::load().context("Invalid AGC_* configuration")?, &cli);
    debug!(?settings, "settings loaded");

    let json = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let scraper = Scraper::new(settings, !cli.progress)?;
            scraper.run(cli.pretty).await?
        }
        Commands::Pages => {
            let scraper = Scraper::new(settings, true)?;
            let pages = scraper.discover().await?;
            if cli.pretty {
                model::to_json_indented(&pages)?
            } else {
                serde_json::to_string(&pages)?
            }
        }
        Commands::Extract { file } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let lom = parser::laws::extract_records(&html, &settings.domain)
                .with_context(|| format!("Unexpected layout in {}", file.display()))?;
            info!("Extracted {} records from {}", lom.len(), file.display());
            ResultSet::new(lom).to_json(cli.pretty)?
        }
    };

    println!("{}", json);
    Ok(())
}

/// Command-line flags win over environment and defaults.
fn apply_flags(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(secs) = cli.timeout {
        settings.timeout_secs = secs;
    }
    if cli.isolate_failures {
        settings.failure_policy = FailurePolicy::Isolate;
    }
    settings
}
