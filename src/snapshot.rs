//! Offline session over a saved HTML document
//!
//! Navigation is a no-op and an element counts as visible when it matches
//! and is not hidden by a `hidden` attribute or an inline `display:none`.
//! Stylesheets are not evaluated. Text is trimmed, as in `ChromeSession`.

use crate::browser::BrowserSession;
use crate::error::ExtractError;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// A `BrowserSession` answering from a fixed HTML snapshot
pub struct SnapshotSession {
    html: String,
    navigations: AtomicUsize,
}

impl SnapshotSession {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            navigations: AtomicUsize::new(0),
        }
    }

    /// Number of `navigate` calls made so far
    pub fn navigations(&self) -> usize {
        self.navigations.load(Ordering::SeqCst)
    }

    /// Parse the snapshot and map every match of `selector`
    ///
    /// The parsed document is not `Send`, so it never outlives this call.
    fn select_map<T>(
        &self,
        selector: &str,
        f: impl Fn(ElementRef<'_>) -> T,
    ) -> Result<Vec<T>, ExtractError> {
        let parsed = Selector::parse(selector).map_err(|e| ExtractError::Query {
            selector: selector.to_string(),
            message: e.to_string(),
        })?;
        let doc = Html::parse_document(&self.html);
        let values = doc.select(&parsed).map(f).collect();
        Ok(values)
    }
}

fn is_visible(el: ElementRef<'_>) -> bool {
    let value = el.value();
    if value.attr("hidden").is_some() {
        return false;
    }
    let style: String = value
        .attr("style")
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    !style.to_ascii_lowercase().contains("display:none")
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[async_trait]
impl BrowserSession for SnapshotSession {
    async fn navigate(&self, url: &str) -> Result<(), ExtractError> {
        debug!("snapshot stands in for {}", url);
        self.navigations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn wait_visible(&self, selector: &str, _timeout: Duration) -> Result<bool, ExtractError> {
        let visible = self.select_map(selector, is_visible)?;
        Ok(visible.into_iter().any(|v| v))
    }

    async fn query_attributes(
        &self,
        selector: &str,
        attribute: &str,
    ) -> Result<Vec<Option<String>>, ExtractError> {
        self.select_map(selector, |el| el.value().attr(attribute).map(String::from))
    }

    async fn inner_texts(&self, selector: &str) -> Result<Vec<String>, ExtractError> {
        self.select_map(selector, text_of)
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>, ExtractError> {
        Ok(self.select_map(selector, text_of)?.into_iter().next())
    }
}
