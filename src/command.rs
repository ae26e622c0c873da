//! `initial` and `scrape` commands
//!
//! Output goes to stdout as JSON (or YAML); progress goes to the log on stderr.

use crate::browser::SessionLauncher;
use crate::config::{
    ExtractConfig, DEFAULT_DEADLINE_MS, DEFAULT_PROBE_TIMEOUT_MS, DEFAULT_WAIT_TIMEOUT_MS,
};
use crate::error::ExtractError;
use crate::extractor::{extract, run_workflow, Workflow};
use crate::model::{ContentDescriptor, ContentRequest};
use crate::pager::DedupStrategy;
use crate::snapshot::SnapshotSession;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use futures::future::join_all;
use serde::Serialize;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Args)]
pub struct ExtractArgs {
    /// Reader page URL
    #[arg(long)]
    pub url: Option<String>,

    /// Read URLs from stdin (one per line; blank and `#` lines are skipped)
    #[arg(long, conflicts_with_all = ["url", "snapshot"])]
    pub stdin: bool,

    /// Number of concurrent browser sessions with --stdin (1-8)
    #[arg(short, long, default_value = "2", value_parser = clap::value_parser!(u8).range(1..=8))]
    pub concurrency: u8,

    /// Deadline per extraction in milliseconds
    #[arg(long, default_value_t = DEFAULT_DEADLINE_MS)]
    pub timeout: u64,

    /// Visibility wait for the page image in milliseconds
    #[arg(long, default_value_t = DEFAULT_WAIT_TIMEOUT_MS)]
    pub wait_timeout: u64,

    /// Long-page probe window in milliseconds
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT_MS)]
    pub probe_timeout: u64,

    /// How duplicated pager controls are collapsed
    #[arg(long, value_enum, default_value_t = DedupStrategy::Positional)]
    pub dedup: DedupStrategy,

    /// Extract from a saved HTML snapshot instead of a live browser
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl ExtractArgs {
    fn config(&self) -> ExtractConfig {
        ExtractConfig {
            probe_timeout: Duration::from_millis(self.probe_timeout),
            wait_timeout: Duration::from_millis(self.wait_timeout),
            deadline: Duration::from_millis(self.timeout),
            dedup: self.dedup,
        }
    }
}

/// Failure output (compact)
#[derive(Debug, Serialize)]
pub struct Failure {
    pub error: String,
    pub kind: &'static str,
}

impl From<&ExtractError> for Failure {
    fn from(e: &ExtractError) -> Self {
        Self {
            error: e.to_string(),
            kind: e.kind(),
        }
    }
}

/// One entry of a batch report
#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Failure>,
}

/// Batch report
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub ok: usize,
    pub failed: usize,
    pub results: Vec<BatchResult>,
}

impl BatchReport {
    /// Invalid input only counts as a client error when nothing else failed
    pub fn outcome(&self) -> Outcome {
        let client_errors = self
            .results
            .iter()
            .filter(|r| r.error.as_ref().is_some_and(|f| f.kind == "invalid_request"))
            .count();

        if self.failed == 0 {
            Outcome::Success
        } else if client_errors == self.failed {
            Outcome::InvalidRequest
        } else {
            Outcome::ExtractionFailed
        }
    }
}

/// How the process should exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    ExtractionFailed,
    InvalidRequest,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::ExtractionFailed => 1,
            Outcome::InvalidRequest => 2,
        }
    }
}

/// Run an extraction command
pub async fn run_extract(workflow: Workflow, args: ExtractArgs) -> Result<Outcome> {
    let config = args.config();

    if args.stdin {
        let urls = batch_lines(io::stdin().lock().lines().map_while(|line| line.ok()));

        if urls.is_empty() {
            return emit_failure(
                &ExtractError::InvalidRequest("no URLs on stdin".to_string()),
                args.format,
            );
        }

        let launcher = SessionLauncher::new(args.concurrency as usize);
        let report = extract_batch(&launcher, workflow, &urls, &config).await;
        info!("Done: {}/{} OK", report.ok, report.ok + report.failed);
        emit(&report, args.format)?;
        return Ok(report.outcome());
    }

    let Some(raw) = args.url.as_deref() else {
        eprintln!("Usage:");
        eprintln!("  reader-extract {} --url <URL>                   Extract one page", workflow);
        eprintln!("  reader-extract {} --url <URL> --snapshot <FILE> Extract from saved HTML", workflow);
        eprintln!("  reader-extract {} --stdin                       Read URLs from stdin", workflow);
        return Ok(Outcome::InvalidRequest);
    };

    let request = match ContentRequest::parse(raw) {
        Ok(r) => r,
        Err(e) => return emit_failure(&e, args.format),
    };

    let result = match &args.snapshot {
        Some(path) => {
            let html = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
            let session = SnapshotSession::new(html);
            run_workflow(&session, workflow, &request, &config).await
        }
        None => {
            let launcher = SessionLauncher::new(1);
            extract(&launcher, workflow, &request, &config).await
        }
    };

    match result {
        Ok(content) => {
            emit(&content, args.format)?;
            Ok(Outcome::Success)
        }
        Err(e) => emit_failure(&e, args.format),
    }
}

/// Batch input lines: everything except blanks and `#` comments
///
/// Malformed lines are kept so the batch reports them as invalid requests.
pub fn batch_lines(lines: impl IntoIterator<Item = String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

/// Extract every URL in its own session; results keep input order
pub async fn extract_batch(
    launcher: &SessionLauncher,
    workflow: Workflow,
    urls: &[String],
    config: &ExtractConfig,
) -> BatchReport {
    let tasks = urls.iter().map(|url| async move {
        let outcome = match ContentRequest::parse(url) {
            Ok(request) => extract(launcher, workflow, &request, config).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(content) => BatchResult {
                url: url.clone(),
                content: Some(content),
                error: None,
            },
            Err(e) => {
                warn!("{}: {}", url, e);
                BatchResult {
                    url: url.clone(),
                    content: None,
                    error: Some(Failure::from(&e)),
                }
            }
        }
    });

    let results = join_all(tasks).await;
    let ok = results.iter().filter(|r| r.content.is_some()).count();

    BatchReport {
        ok,
        failed: results.len() - ok,
        results,
    }
}

fn emit_failure(e: &ExtractError, format: OutputFormat) -> Result<Outcome> {
    warn!("{}", e);
    emit(&Failure::from(e), format)?;
    Ok(if e.is_client_error() {
        Outcome::InvalidRequest
    } else {
        Outcome::ExtractionFailed
    })
}

fn emit<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let output = render(value, format)?;
    println!("{}", output.trim_end());
    Ok(())
}

fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PagerEntry;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        args: ExtractArgs,
    }

    fn failed(url: &str, e: &ExtractError) -> BatchResult {
        BatchResult {
            url: url.to_string(),
            content: None,
            error: Some(Failure::from(e)),
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Success.exit_code(), 0);
        assert_eq!(Outcome::ExtractionFailed.exit_code(), 1);
        assert_eq!(Outcome::InvalidRequest.exit_code(), 2);
    }

    #[test]
    fn test_render_yaml() {
        let content = ContentDescriptor {
            chapter_pager: vec![PagerEntry::chapter("/next")],
            ..Default::default()
        };
        let yaml = render(&content, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("chapterPager:"));
        assert!(yaml.contains("Url: /next"));
        assert!(yaml.contains("longPage: false"));
    }

    #[test]
    fn test_failure_from_error() {
        let failure = Failure::from(&ExtractError::InvalidRequest("url is empty".to_string()));
        assert_eq!(failure.kind, "invalid_request");
        assert_eq!(failure.error, "invalid request: url is empty");
    }

    #[tokio::test]
    async fn test_batch_reports_invalid_urls_without_launching() {
        let launcher = SessionLauncher::new(1);
        let urls = vec!["http://".to_string(), "https:// bad host".to_string()];
        let report = extract_batch(&launcher, Workflow::Scrape, &urls, &ExtractConfig::default()).await;
        assert_eq!(report.ok, 0);
        assert_eq!(report.failed, 2);
        assert_eq!(report.results[0].url, "http://");
        assert_eq!(
            report.results[1].error.as_ref().map(|f| f.kind),
            Some("invalid_request")
        );
    }

    #[test]
    fn test_cli_defaults_match_config_default() {
        let cli = Cli::parse_from(["reader-extract"]);
        assert_eq!(cli.args.config(), ExtractConfig::default());
    }

    #[test]
    fn test_batch_lines_keeps_malformed_input() {
        let lines = [
            "  https://reader.example.com/c/1  ",
            "",
            "# skipped",
            "ftp://reader.example.com/c/2",
            "reader.example.com/c/3",
        ]
        .map(String::from);
        assert_eq!(
            batch_lines(lines),
            vec![
                "https://reader.example.com/c/1",
                "ftp://reader.example.com/c/2",
                "reader.example.com/c/3"
            ]
        );
    }

    #[test]
    fn test_batch_outcome() {
        let invalid = ExtractError::InvalidRequest("unsupported scheme".to_string());
        let launch = ExtractError::Launch("no chrome".to_string());

        let report = BatchReport {
            ok: 0,
            failed: 2,
            results: vec![failed("ftp://a", &invalid), failed("b", &invalid)],
        };
        assert_eq!(report.outcome(), Outcome::InvalidRequest);

        let report = BatchReport {
            ok: 0,
            failed: 2,
            results: vec![failed("ftp://a", &invalid), failed("https://c", &launch)],
        };
        assert_eq!(report.outcome(), Outcome::ExtractionFailed);

        let report = BatchReport {
            ok: 0,
            failed: 0,
            results: Vec::new(),
        };
        assert_eq!(report.outcome(), Outcome::Success);
    }
}
