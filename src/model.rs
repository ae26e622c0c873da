//! Request and result types
//!
//! Wire names follow the reader frontend's JSON contract.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use url::Url;

/// A validated extraction request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    url: Url,
}

impl ContentRequest {
    /// Validate a raw URL: must be absolute http(s) with a host
    pub fn parse(raw: &str) -> Result<Self, ExtractError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ExtractError::InvalidRequest("url is empty".to_string()));
        }

        let url = Url::parse(raw)
            .map_err(|e| ExtractError::InvalidRequest(format!("unparseable url `{}`: {}", raw, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ExtractError::InvalidRequest(format!(
                "unsupported scheme `{}`",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(ExtractError::InvalidRequest(format!("url `{}` has no host", raw)));
        }

        Ok(Self { url })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

/// One navigable pagination control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerEntry {
    /// Visible page number; empty for chapter controls
    #[serde(rename = "Number")]
    pub label: String,
    #[serde(rename = "Url")]
    pub target: String,
}

impl PagerEntry {
    pub fn new(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
        }
    }

    /// Chapter controls carry no number
    pub fn chapter(target: impl Into<String>) -> Self {
        Self::new(String::new(), target)
    }
}

/// Result of one extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDescriptor {
    #[serde(rename = "image_url")]
    pub images: Vec<String>,
    #[serde(rename = "chapterPager")]
    pub chapter_pager: Vec<PagerEntry>,
    #[serde(rename = "pagePager")]
    pub page_pager: Vec<PagerEntry>,
    #[serde(rename = "longPage")]
    pub is_long_page: bool,
    #[serde(rename = "currentPage")]
    pub current_page: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_url() {
        let req = ContentRequest::parse("  https://reader.example.com/c/12/p/3 ").unwrap();
        assert_eq!(req.url(), "https://reader.example.com/c/12/p/3");
    }

    #[test]
    fn test_parse_rejects_bad_urls() {
        for raw in ["", "   ", "/relative/path", "ftp://example.com/x", "not a url"] {
            let err = ContentRequest::parse(raw).unwrap_err();
            assert!(err.is_client_error(), "{} should be rejected", raw);
        }
    }

    #[test]
    fn test_descriptor_wire_names() {
        let descriptor = ContentDescriptor {
            images: vec!["http://x/img.png".to_string()],
            chapter_pager: vec![PagerEntry::chapter("/next")],
            page_pager: vec![PagerEntry::new("3", "/c/1/p/3")],
            is_long_page: false,
            current_page: "3".to_string(),
        };
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["image_url"][0], "http://x/img.png");
        assert_eq!(json["chapterPager"][0]["Number"], "");
        assert_eq!(json["chapterPager"][0]["Url"], "/next");
        assert_eq!(json["pagePager"][0]["Number"], "3");
        assert_eq!(json["longPage"], false);
        assert_eq!(json["currentPage"], "3");
    }

    #[test]
    fn test_empty_descriptor_serializes_empty_sequences() {
        let json = serde_json::to_value(ContentDescriptor::default()).unwrap();
        assert_eq!(json["image_url"], serde_json::json!([]));
        assert_eq!(json["pagePager"], serde_json::json!([]));
        assert_eq!(json["currentPage"], "");
    }
}
