//! Layout classification: long (stacked) page vs single-image page

use crate::browser::BrowserSession;
use crate::error::ExtractError;
use std::time::Duration;
use tracing::{debug, warn};

/// Images stacked under one scrollable view
pub const LONG_PAGE_SELECTOR: &str = ".load-src";
/// The one primary image of a standard page
pub const SINGLE_IMAGE_SELECTOR: &str = "#cp_image";

const SRC: &str = "src";

/// Images found by the long-page probe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LongPage {
    /// One entry per matched node; a node without `src` becomes ""
    pub images: Vec<String>,
    pub found: bool,
}

/// Navigate to `url` and probe for a long page within `probe_timeout`.
///
/// Timing out is the normal "not a long page" answer, not an error.
pub async fn detect_long_page(
    session: &dyn BrowserSession,
    url: &str,
    probe_timeout: Duration,
) -> Result<LongPage, ExtractError> {
    session.navigate(url).await?;

    if !session.wait_visible(LONG_PAGE_SELECTOR, probe_timeout).await? {
        warn!("no long-page images within {}ms", probe_timeout.as_millis());
        return Ok(LongPage::default());
    }

    let images: Vec<String> = session
        .query_attributes(LONG_PAGE_SELECTOR, SRC)
        .await?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();

    debug!("long page with {} images", images.len());
    Ok(LongPage {
        images,
        found: true,
    })
}

/// Navigate to `url` and read the single image's `src`.
///
/// `None` when the image never becomes visible or has no usable `src`.
pub async fn detect_single_page(
    session: &dyn BrowserSession,
    url: &str,
    wait_timeout: Duration,
) -> Result<Option<String>, ExtractError> {
    session.navigate(url).await?;

    if !session.wait_visible(SINGLE_IMAGE_SELECTOR, wait_timeout).await? {
        warn!("image not found on {}", url);
        return Ok(None);
    }

    let image = session
        .query_attributes(SINGLE_IMAGE_SELECTOR, SRC)
        .await?
        .into_iter()
        .next()
        .flatten()
        .filter(|src| !src.is_empty());

    debug!("single image: {:?}", image);
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotSession;

    const URL: &str = "https://reader.example.com/c/7";
    const T: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_long_page_collects_in_order() {
        let session = SnapshotSession::new(
            r#"<img class="load-src" src="/1.jpg"><img class="load-src"><img class="load-src" src="/3.jpg">"#,
        );
        let long = detect_long_page(&session, URL, T).await.unwrap();
        assert!(long.found);
        assert_eq!(long.images, vec!["/1.jpg", "", "/3.jpg"]);
        assert_eq!(session.navigations(), 1);
    }

    #[tokio::test]
    async fn test_long_page_absent() {
        let session = SnapshotSession::new(r#"<img id="cp_image" src="/a.jpg">"#);
        let long = detect_long_page(&session, URL, T).await.unwrap();
        assert_eq!(long, LongPage::default());
    }

    #[tokio::test]
    async fn test_single_page_image() {
        let session = SnapshotSession::new(r#"<img id="cp_image" src="http://x/img.png">"#);
        let image = detect_single_page(&session, URL, T).await.unwrap();
        assert_eq!(image.as_deref(), Some("http://x/img.png"));
    }

    #[tokio::test]
    async fn test_single_page_missing_or_empty_src() {
        for html in [r#"<img id="cp_image">"#, r#"<img id="cp_image" src="">"#, "<p>none</p>"] {
            let session = SnapshotSession::new(html);
            assert_eq!(detect_single_page(&session, URL, T).await.unwrap(), None);
        }
    }
}
