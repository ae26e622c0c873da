//! Extraction workflows
//!
//! - `initial`: first page of a chapter, layout unknown. Probes for a long
//!   page first and falls back to the single-image path.
//! - `scrape`: a page already known to be single-image.

use crate::browser::{BrowserSession, SessionLauncher};
use crate::config::ExtractConfig;
use crate::error::ExtractError;
use crate::layout::{detect_long_page, detect_single_page};
use crate::model::{ContentDescriptor, ContentRequest};
use crate::pager::{resolve_chapter_pager, resolve_page_pager};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    Initial,
    Scrape,
}

impl std::fmt::Display for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Workflow::Initial => write!(f, "initial"),
            Workflow::Scrape => write!(f, "scrape"),
        }
    }
}

/// Run `workflow` against an open session under the configured deadline
pub async fn run_workflow(
    session: &dyn BrowserSession,
    workflow: Workflow,
    request: &ContentRequest,
    config: &ExtractConfig,
) -> Result<ContentDescriptor, ExtractError> {
    info!("{} {}", workflow, request.url());

    let work = async {
        match workflow {
            Workflow::Initial => initial(session, request, config).await,
            Workflow::Scrape => scrape(session, request, config).await,
        }
    };

    tokio::time::timeout(config.deadline, work)
        .await
        .map_err(|_| ExtractError::DeadlineExceeded(config.deadline))?
}

/// Launch a dedicated browser, run `workflow`, and close the browser on every path
pub async fn extract(
    launcher: &SessionLauncher,
    workflow: Workflow,
    request: &ContentRequest,
    config: &ExtractConfig,
) -> Result<ContentDescriptor, ExtractError> {
    let session = launcher.launch().await?;
    let result = run_workflow(&session, workflow, request, config).await;
    session.close().await;
    result
}

async fn initial(
    session: &dyn BrowserSession,
    request: &ContentRequest,
    config: &ExtractConfig,
) -> Result<ContentDescriptor, ExtractError> {
    let long = detect_long_page(session, request.url(), config.probe_timeout).await?;

    if !long.images.is_empty() {
        return Ok(ContentDescriptor {
            images: long.images,
            chapter_pager: resolve_chapter_pager(session, config.dedup).await?,
            is_long_page: true,
            ..Default::default()
        });
    }

    scrape(session, request, config).await
}

async fn scrape(
    session: &dyn BrowserSession,
    request: &ContentRequest,
    config: &ExtractConfig,
) -> Result<ContentDescriptor, ExtractError> {
    let image = detect_single_page(session, request.url(), config.wait_timeout).await?;
    let chapter_pager = resolve_chapter_pager(session, config.dedup).await?;
    let page = resolve_page_pager(session, config.dedup).await?;

    Ok(ContentDescriptor {
        images: image.into_iter().collect(),
        chapter_pager,
        page_pager: page.entries,
        is_long_page: false,
        current_page: page.current_page,
    })
}
