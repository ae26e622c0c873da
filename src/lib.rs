//! reader-extract: images and pagination from paginated reader pages
//!
//! Workflows:
//! - initial: first page of a chapter, long-page or single-image layout
//! - scrape: single-image page with chapter and page pagers

pub mod browser;
pub mod command;
pub mod config;
pub mod error;
pub mod extractor;
pub mod layout;
pub mod model;
pub mod pager;
pub mod snapshot;

pub use browser::{BrowserSession, ChromeSession, SessionLauncher};
pub use config::ExtractConfig;
pub use error::ExtractError;
pub use extractor::{extract, run_workflow, Workflow};
pub use model::{ContentDescriptor, ContentRequest, PagerEntry};
pub use pager::DedupStrategy;
pub use snapshot::SnapshotSession;
