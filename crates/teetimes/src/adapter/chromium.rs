//! Headless Chromium sessions over the DevTools protocol.

use super::driver::PageDriver;
use super::error::AdapterError;
use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

impl From<CdpError> for AdapterError {
    fn from(e: CdpError) -> Self {
        AdapterError::driver(e.to_string())
    }
}

/// A running browser process. Each course gets its own tab from
/// [`ChromiumSession::new_driver`].
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    pub async fn launch(headful: bool) -> Result<Self, AdapterError> {
        let mut builder = BrowserConfig::builder();
        if headful {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(AdapterError::driver)?;

        let (browser, mut events) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser event error");
                }
            }
        });

        Ok(Self { browser, handler })
    }

    pub async fn new_driver(&self) -> Result<ChromiumDriver, AdapterError> {
        let page = self.browser.new_page("about:blank").await?;
        Ok(ChromiumDriver { page })
    }

    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Browser did not close cleanly");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
    }
}

/// One browser tab.
pub struct ChromiumDriver {
    page: Page,
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn goto(&mut self, url: &str) -> Result<(), AdapterError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| AdapterError::Navigation { message: e.to_string() })?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| AdapterError::Navigation { message: e.to_string() })?;
        Ok(())
    }

    async fn content(&mut self) -> Result<String, AdapterError> {
        Ok(self.page.content().await?)
    }

    async fn click(&mut self, selector: &str) -> Result<bool, AdapterError> {
        let Ok(element) = self.page.find_element(selector).await else {
            return Ok(false);
        };
        element.click().await?;
        Ok(true)
    }

    async fn click_by_text(&mut self, selector: &str, text: &str) -> Result<bool, AdapterError> {
        let selector = serde_json::to_string(selector).map_err(|e| AdapterError::driver(e.to_string()))?;
        let text = serde_json::to_string(text).map_err(|e| AdapterError::driver(e.to_string()))?;
        let script = format!(
            r#"(() => {{
  const wanted = {text}.toLowerCase();
  const el = [...document.querySelectorAll({selector})]
    .find((node) => (node.innerText || node.textContent || '').toLowerCase().includes(wanted));
  if (!el) return false;
  el.click();
  return true;
}})()"#
        );
        Ok(self.evaluate(&script).await?.as_bool().unwrap_or(false))
    }

    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, AdapterError> {
        let result = self.page.evaluate(script).await?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }
}
