//! Browser sessions: the DOM capabilities the extractor needs
//!
//! `ChromeSession` drives headless Chrome via chromiumoxide. One session is
//! launched per extraction and closed when it ends.

use crate::error::{navigation_reason, ExtractError};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Live DOM access for one extraction
///
/// Absence is never an error: no match yields an empty sequence or `None`,
/// and a visibility wait that runs out of time yields `false`.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate the tab to `url` and wait for the load to finish
    async fn navigate(&self, url: &str) -> Result<(), ExtractError>;

    /// Wait until `selector` matches a visible element, up to `timeout`
    async fn wait_visible(&self, selector: &str, timeout: Duration) -> Result<bool, ExtractError>;

    /// Read `attribute` from every element matching `selector`, in document order
    async fn query_attributes(
        &self,
        selector: &str,
        attribute: &str,
    ) -> Result<Vec<Option<String>>, ExtractError>;

    /// Inner text of every element matching `selector`, in document order
    async fn inner_texts(&self, selector: &str) -> Result<Vec<String>, ExtractError>;

    /// Inner text of the first element matching `selector`
    async fn inner_text(&self, selector: &str) -> Result<Option<String>, ExtractError>;
}

/// Launches isolated Chrome sessions, bounded by a semaphore
pub struct SessionLauncher {
    semaphore: Arc<Semaphore>,
    user_agent: String,
}

impl SessionLauncher {
    /// Create a launcher allowing `concurrency` live sessions at once
    pub fn new(concurrency: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Launch a fresh browser with a single blank tab
    pub async fn launch(&self) -> Result<ChromeSession, ExtractError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ExtractError::Launch(e.to_string()))?;

        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-setuid-sandbox")
            .arg("--no-first-run")
            .arg("--headless=new")
            .build()
            .map_err(|e| ExtractError::Launch(format!("browser config error: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            ExtractError::Launch(format!("{} (is Chrome/Chromium installed?)", e))
        })?;

        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let mut session = ChromeSession {
            browser,
            page: None,
            handler,
            _permit: permit,
        };

        match session.open_tab(&self.user_agent).await {
            Ok(page) => {
                session.page = Some(page);
                debug!("browser session ready");
                Ok(session)
            }
            Err(e) => {
                session.close().await;
                Err(e)
            }
        }
    }
}

/// One headless Chrome process with one tab
pub struct ChromeSession {
    browser: Browser,
    page: Option<Page>,
    handler: JoinHandle<()>,
    _permit: OwnedSemaphorePermit,
}

impl ChromeSession {
    async fn open_tab(&self, user_agent: &str) -> Result<Page, ExtractError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ExtractError::Launch(format!("failed to open tab: {}", e)))?;

        page.execute(
            chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams::new(
                user_agent,
            ),
        )
        .await
        .map_err(|e| ExtractError::Launch(format!("failed to set user agent: {}", e)))?;

        Ok(page)
    }

    fn page(&self) -> Result<&Page, ExtractError> {
        self.page
            .as_ref()
            .ok_or_else(|| ExtractError::Launch("session has no open tab".to_string()))
    }

    /// Shut the browser down and release the session slot
    pub async fn close(mut self) {
        shut_down(&mut self.browser).await;
        self.handler.abort();
    }

    async fn eval<T: DeserializeOwned>(&self, selector: &str, script: String) -> Result<T, ExtractError> {
        let evaluation_error = |message: String| ExtractError::Evaluation {
            selector: selector.to_string(),
            message,
        };

        self.page()?
            .evaluate(script)
            .await
            .map_err(|e| evaluation_error(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| evaluation_error(e.to_string()))
    }
}

/// Process control needed to shut a browser down
#[async_trait]
trait BrowserProcess: Send {
    async fn close(&mut self) -> Result<(), String>;
    async fn kill(&mut self) -> Option<io::Result<()>>;
    async fn wait(&mut self) -> io::Result<()>;
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn close(&mut self) -> Result<(), String> {
        Browser::close(self).await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn kill(&mut self) -> Option<io::Result<()>> {
        Browser::kill(self).await
    }

    async fn wait(&mut self) -> io::Result<()> {
        Browser::wait(self).await.map(|_| ())
    }
}

/// Ask the browser to close; kill it if it refuses, then reap the process
async fn shut_down(process: &mut dyn BrowserProcess) {
    if let Err(e) = process.close().await {
        warn!("failed to close browser cleanly, killing it: {}", e);
        if let Some(Err(e)) = process.kill().await {
            warn!("failed to kill browser: {}", e);
        }
    }
    if let Err(e) = process.wait().await {
        warn!("failed to reap browser process: {}", e);
    }
}

/// Run `check` every `interval` until it returns true or `timeout` elapses
///
/// Running out of time yields `Ok(false)`; an error from `check` ends the wait.
pub(crate) async fn poll_until<F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<bool, ExtractError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, ExtractError>>,
{
    let poll = async {
        loop {
            if check().await? {
                return Ok::<_, ExtractError>(());
            }
            tokio::time::sleep(interval).await;
        }
    };

    match tokio::time::timeout(timeout, poll).await {
        Ok(Ok(())) => Ok(true),
        Ok(Err(e)) => Err(e),
        Err(_) => Ok(false),
    }
}

/// Quote a selector as a JS string literal
fn js_string(selector: &str) -> Result<String, ExtractError> {
    serde_json::to_string(selector).map_err(|e| ExtractError::Evaluation {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Trimmed `innerText` of every match
fn inner_texts_script(selector: &str) -> Result<String, ExtractError> {
    Ok(format!(
        "Array.from(document.querySelectorAll({}), el => el.innerText.trim())",
        js_string(selector)?
    ))
}

/// Trimmed `innerText` of the first match, wrapped in an array since a bare
/// null does not survive the CDP round trip
fn inner_text_script(selector: &str) -> Result<String, ExtractError> {
    Ok(format!(
        "(() => {{ const el = document.querySelector({}); return el ? [el.innerText.trim()] : []; }})()",
        js_string(selector)?
    ))
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<(), ExtractError> {
        debug!("navigating to {}", url);
        self.page()?.goto(url).await.map_err(|e| {
            let message = e.to_string();
            ExtractError::Navigation {
                url: url.to_string(),
                reason: navigation_reason(&message),
                message,
            }
        })?;
        Ok(())
    }

    async fn wait_visible(&self, selector: &str, timeout: Duration) -> Result<bool, ExtractError> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({});
                if (!el) return false;
                const style = window.getComputedStyle(el);
                return style.display !== 'none'
                    && style.visibility !== 'hidden'
                    && el.getClientRects().length > 0;
            }})()"#,
            js_string(selector)?
        );

        poll_until(timeout, POLL_INTERVAL, || self.eval::<bool>(selector, script.clone())).await
    }

    async fn query_attributes(
        &self,
        selector: &str,
        attribute: &str,
    ) -> Result<Vec<Option<String>>, ExtractError> {
        let query_error = |message: String| ExtractError::Query {
            selector: selector.to_string(),
            message,
        };

        let elements = self
            .page()?
            .find_elements(selector)
            .await
            .map_err(|e| query_error(e.to_string()))?;

        let mut values = Vec::with_capacity(elements.len());
        for element in &elements {
            let value = element
                .attribute(attribute)
                .await
                .map_err(|e| query_error(e.to_string()))?;
            values.push(value);
        }
        Ok(values)
    }

    async fn inner_texts(&self, selector: &str) -> Result<Vec<String>, ExtractError> {
        self.eval(selector, inner_texts_script(selector)?).await
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>, ExtractError> {
        let texts: Vec<String> = self.eval(selector, inner_text_script(selector)?).await?;
        Ok(texts.into_iter().next())
    }
}
