//! Chapter and page pager resolution
//!
//! Reader pages render every pager twice (one copy per layout variant), so
//! the matched nodes contain each control two times. `DedupStrategy` picks
//! how the duplicate copy is discarded.

use crate::browser::BrowserSession;
use crate::error::ExtractError;
use crate::model::PagerEntry;
use clap::ValueEnum;
use std::collections::HashSet;
use tracing::debug;

/// Previous/next chapter links
pub const CHAPTER_PAGER_SELECTOR: &str = ".view-paging>div>a";
/// Numbered in-chapter page links
pub const PAGE_PAGER_SELECTOR: &str = "#chapterpager>a";
/// Marker on the active page link
pub const CURRENT_PAGE_SELECTOR: &str = ".current";

const HREF: &str = "href";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DedupStrategy {
    /// Keep the first half of the matches by position
    #[default]
    Positional,
    /// Keep the first occurrence of each distinct control
    Identity,
}

/// Page pager entries plus the active page label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagePager {
    pub entries: Vec<PagerEntry>,
    pub current_page: String,
}

/// First `len / 2` items; a lone match yields nothing
pub fn canonical_half<T>(mut items: Vec<T>) -> Vec<T> {
    let half = items.len() / 2;
    items.truncate(half);
    items
}

/// Keep the first occurrence of each key, preserving order
fn first_occurrences<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + std::hash::Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}

/// In-site chapter links from raw `href` values
pub fn chapter_entries(hrefs: Vec<Option<String>>, strategy: DedupStrategy) -> Vec<PagerEntry> {
    let candidates = match strategy {
        DedupStrategy::Positional => canonical_half(hrefs),
        DedupStrategy::Identity => first_occurrences(hrefs, Clone::clone),
    };

    candidates
        .into_iter()
        .flatten()
        .filter(|href| href.starts_with('/'))
        .map(PagerEntry::chapter)
        .collect()
}

/// Pair anchors with labels by index
///
/// Lengths must agree after dedup; entries without a target are dropped
/// only after pairing so indices never shift.
pub fn page_entries(
    hrefs: Vec<Option<String>>,
    labels: Vec<String>,
    strategy: DedupStrategy,
) -> Result<Vec<PagerEntry>, ExtractError> {
    let (hrefs, labels) = match strategy {
        DedupStrategy::Positional => (canonical_half(hrefs), canonical_half(labels)),
        DedupStrategy::Identity => (hrefs, labels),
    };

    if hrefs.len() != labels.len() {
        return Err(ExtractError::PagerMismatch {
            anchors: hrefs.len(),
            labels: labels.len(),
        });
    }

    let paired: Vec<(String, Option<String>)> = labels.into_iter().zip(hrefs).collect();
    let paired = match strategy {
        DedupStrategy::Positional => paired,
        DedupStrategy::Identity => first_occurrences(paired, Clone::clone),
    };

    Ok(paired
        .into_iter()
        .filter_map(|(label, href)| {
            href.filter(|h| !h.is_empty())
                .map(|target| PagerEntry::new(label, target))
        })
        .collect())
}

/// Resolve the chapter pager of the current page
pub async fn resolve_chapter_pager(
    session: &dyn BrowserSession,
    strategy: DedupStrategy,
) -> Result<Vec<PagerEntry>, ExtractError> {
    let hrefs = session.query_attributes(CHAPTER_PAGER_SELECTOR, HREF).await?;
    debug!("chapter pager: {} anchors", hrefs.len());
    Ok(chapter_entries(hrefs, strategy))
}

/// Resolve the page pager and the active page of the current page
///
/// The anchor query and both text reads are independent reads of the same
/// DOM and run concurrently.
pub async fn resolve_page_pager(
    session: &dyn BrowserSession,
    strategy: DedupStrategy,
) -> Result<PagePager, ExtractError> {
    let (hrefs, labels, current) = tokio::try_join!(
        session.query_attributes(PAGE_PAGER_SELECTOR, HREF),
        session.inner_texts(PAGE_PAGER_SELECTOR),
        session.inner_text(CURRENT_PAGE_SELECTOR),
    )?;
    debug!(
        "page pager: {} anchors, {} labels, current {:?}",
        hrefs.len(),
        labels.len(),
        current
    );

    Ok(PagePager {
        entries: page_entries(hrefs, labels, strategy)?,
        current_page: current.unwrap_or_default(),
    })
}
