//! Browser session abstraction.
//!
//! The scraper never talks to the browser library directly: everything goes
//! through the [`PageSession`] trait so the extraction pipeline can be
//! exercised against a scripted fake in tests. [`ChromeSession`] is the real
//! implementation backed by headless Chrome via chromiumoxide.

mod chrome;
#[cfg(test)]
pub mod fake;

pub use chrome::ChromeSession;

use std::time::Duration;

use async_trait::async_trait;

use crate::app::Result;

/// One browser tab with mutable navigation state.
///
/// Navigation and DOM reads for different chapters must not be interleaved
/// on the same session; the orchestrator drives chapters sequentially.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate the tab to `url` and wait for the load to settle.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait until `selector` matches an element, up to `timeout`.
    ///
    /// A selector still absent at the deadline is an error; callers convert
    /// it to a chapter-scoped extraction failure rather than hanging the run.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Read the inner text of the first element matching `selector`.
    /// Returns None when no element matches.
    async fn read_text(&self, selector: &str) -> Result<Option<String>>;

    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Click the element whose trimmed text equals `text` exactly.
    async fn click_by_text(&self, text: &str) -> Result<()>;

    /// Evaluate a script in the page and return its JSON result.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;
}
