//! reader-extract CLI
//!
//! Extracts images and pagination from paginated reader pages with headless Chrome.

use anyhow::Result;
use clap::{Parser, Subcommand};
use reader_extract::command::{run_extract, ExtractArgs};
use reader_extract::Workflow;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reader-extract")]
#[command(version)]
#[command(about = "Extract images and pagination from paginated reader pages")]
#[command(long_about = "Drives headless Chrome to a reader page and prints its images, chapter pager and page pager as JSON.\n\nCommands:\n  initial   First page of a chapter (detects long pages)\n  scrape    Single-image page")]
struct Cli {
    /// Log every DOM step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the first page of a chapter, detecting long (stacked) pages
    Initial(ExtractArgs),
    /// Extract a single-image page with its chapter and page pagers
    Scrape(ExtractArgs),
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "reader_extract=debug"
    } else {
        "reader_extract=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Initial(args) => run_extract(Workflow::Initial, args).await?,
        Commands::Scrape(args) => run_extract(Workflow::Scrape, args).await?,
    };

    std::process::exit(outcome.exit_code());
}
