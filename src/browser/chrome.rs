use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;

use crate::app::{Result, SignpostError};
use crate::browser::PageSession;
use crate::config::ScrapeConfig;

/// Chrome-based page session using chromiumoxide.
///
/// Owns one browser and one page; the page is reused across navigations so
/// the whole run shares a single tab.
pub struct ChromeSession {
    _browser: Arc<Browser>,
    page: Page,
    settle: Duration,
}

impl ChromeSession {
    /// Launch a browser and open a blank page. Failures here are fatal to
    /// the run.
    pub async fn launch(config: &ScrapeConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer");

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| SignpostError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            SignpostError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        // Spawn the browser handler
        tokio::spawn(async move {
            while let Some(_event) = handler.next().await {
                // Handle browser events
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SignpostError::Browser(format!("Failed to create page: {}", e)))?;

        if let Some(ref ua) = config.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| SignpostError::Browser(format!("Failed to set user agent: {}", e)))?;
        }

        Ok(Self {
            _browser: Arc::new(browser),
            page,
            settle: config.wait_after_load(),
        })
    }
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| SignpostError::Browser(format!("Navigation to {} failed: {}", url, e)))?;

        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| SignpostError::Browser(format!("Navigation to {} failed: {}", url, e)))?;

        // Additional wait for dynamic content
        tokio::time::sleep(self.settle).await;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        let poll = async {
            loop {
                if self.page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        };

        tokio::time::timeout(timeout, poll).await.map_err(|_| {
            SignpostError::Browser(format!(
                "Timed out after {:?} waiting for selector '{}'",
                timeout, selector
            ))
        })
    }

    async fn read_text(&self, selector: &str) -> Result<Option<String>> {
        let element = match self.page.find_element(selector).await {
            Ok(el) => el,
            Err(_) => return Ok(None),
        };

        let text = element
            .inner_text()
            .await
            .map_err(|e| SignpostError::Browser(format!("Failed to read '{}': {}", selector, e)))?;

        Ok(text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self.page.find_element(selector).await.map_err(|e| {
            SignpostError::Browser(format!("Element '{}' not found: {}", selector, e))
        })?;

        element
            .click()
            .await
            .map_err(|e| SignpostError::Browser(format!("Failed to click '{}': {}", selector, e)))?;

        Ok(())
    }

    async fn click_by_text(&self, text: &str) -> Result<()> {
        // Text-targeted clicks go through the page itself: the quiz's
        // buttons and answers carry no stable ids or classes.
        let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
        let script = format!(
            r#"
            (() => {{
                const wanted = "{escaped}";
                const nodes = document.querySelectorAll('a, button, span, div, label');
                for (const node of nodes) {{
                    if (node.innerText && node.innerText.trim() === wanted) {{
                        node.click();
                        return true;
                    }}
                }}
                return false;
            }})()
            "#
        );

        let clicked: bool = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| SignpostError::Browser(format!("Click script failed: {}", e)))?
            .into_value()
            .map_err(|e| SignpostError::Browser(format!("Failed to parse click result: {:?}", e)))?;

        if !clicked {
            return Err(SignpostError::Browser(format!(
                "No element with text '{}' found to click",
                text
            )));
        }

        tokio::time::sleep(self.settle).await;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| SignpostError::Browser(format!("Script execution failed: {}", e)))?
            .into_value()
            .map_err(|e| SignpostError::Browser(format!("Failed to parse result: {:?}", e)))
    }
}
