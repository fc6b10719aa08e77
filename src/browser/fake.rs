//! Scripted in-memory [`PageSession`] used by extractor and orchestrator
//! tests. Pages are keyed by URL; script evaluation is dispatched on the
//! selector text embedded in the generated snippets.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::app::{Result, SignpostError};
use crate::browser::PageSession;

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    /// Value of `window._rrltModuleContent`, when the page embeds one.
    pub script_state: Option<Value>,
    /// Result of the DOM snapshot script.
    pub dom: Value,
    /// Result of the explanations script, revealed only after the quiz is
    /// finished and the results accordion opened.
    pub explanations: Value,
    /// Hrefs returned by the chapter links script (index page only).
    pub links: Vec<String>,
    /// Selectors that never appear on this page; waits on them time out.
    pub missing_selectors: HashSet<String>,
    /// Texts that cannot be clicked on this page.
    pub unclickable_texts: HashSet<String>,
    pub fail_navigation: bool,
}

impl FakePage {
    pub fn quiz(script_state: Value) -> Self {
        let dom = json!({
            "title": script_state.get("Title").and_then(Value::as_str),
            "questionCount": script_state
                .get("Questions")
                .and_then(Value::as_array)
                .map(|q| q.len().to_string()),
        });
        Self {
            script_state: Some(script_state),
            dom,
            explanations: json!([]),
            ..Default::default()
        }
    }

    pub fn index(links: Vec<&str>) -> Self {
        Self {
            links: links.into_iter().map(String::from).collect(),
            dom: json!({}),
            explanations: json!([]),
            ..Default::default()
        }
    }

    pub fn with_explanations(mut self, explanations: Value) -> Self {
        self.explanations = explanations;
        self
    }

    pub fn with_missing_selector(mut self, selector: &str) -> Self {
        self.missing_selectors.insert(selector.to_string());
        self
    }
}

#[derive(Debug, Default)]
struct FakeState {
    current: Option<String>,
    navigations: Vec<String>,
    clicks: Vec<String>,
    finished: bool,
    accordion_opened: bool,
}

#[derive(Default)]
pub struct FakeSession {
    pages: HashMap<String, FakePage>,
    state: Mutex<FakeState>,
}

impl FakeSession {
    pub fn new(pages: Vec<(&str, FakePage)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(url, page)| (url.to_string(), page))
                .collect(),
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    fn current_page(&self) -> Result<&FakePage> {
        let state = self.state.lock().unwrap();
        let url = state
            .current
            .as_ref()
            .ok_or_else(|| SignpostError::Browser("No page loaded".into()))?;
        self.pages
            .get(url)
            .ok_or_else(|| SignpostError::Browser(format!("Unknown page: {}", url)))
    }
}

#[async_trait]
impl PageSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());

        let page = self
            .pages
            .get(url)
            .ok_or_else(|| SignpostError::Browser(format!("Navigation to {} failed", url)))?;
        if page.fail_navigation {
            return Err(SignpostError::Browser(format!(
                "Navigation to {} failed",
                url
            )));
        }

        state.current = Some(url.to_string());
        state.finished = false;
        state.accordion_opened = false;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        let page = self.current_page()?;
        if page.missing_selectors.contains(selector) {
            return Err(SignpostError::Browser(format!(
                "Timed out after {:?} waiting for selector '{}'",
                timeout, selector
            )));
        }
        // Carousel cards only exist once the simulated quiz is finished.
        if selector.contains("carousel") && !self.state.lock().unwrap().finished {
            return Err(SignpostError::Browser(format!(
                "Timed out after {:?} waiting for selector '{}'",
                timeout, selector
            )));
        }
        Ok(())
    }

    async fn read_text(&self, selector: &str) -> Result<Option<String>> {
        let page = self.current_page()?;
        if page.missing_selectors.contains(selector) {
            return Ok(None);
        }
        Ok(page
            .dom
            .get(selector)
            .and_then(Value::as_str)
            .map(String::from))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let page = self.current_page()?;
        if page.missing_selectors.contains(selector) {
            return Err(SignpostError::Browser(format!(
                "Element '{}' not found",
                selector
            )));
        }
        let mut state = self.state.lock().unwrap();
        state.clicks.push(selector.to_string());
        if selector.contains("accordion__toggle") {
            state.accordion_opened = true;
        }
        Ok(())
    }

    async fn click_by_text(&self, text: &str) -> Result<()> {
        let page = self.current_page()?;
        if page.unclickable_texts.contains(text) {
            return Err(SignpostError::Browser(format!(
                "No element with text '{}' found to click",
                text
            )));
        }
        let mut state = self.state.lock().unwrap();
        state.clicks.push(text.to_string());
        if text == "Finish" {
            state.finished = true;
        }
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let page = self.current_page()?;

        if script.contains("_rrltModuleContent") {
            return Ok(page.script_state.clone().unwrap_or(Value::Null));
        }
        if script.contains("accordion--inactive") {
            return Ok(json!(1));
        }
        if script.contains("card__list") {
            return Ok(json!(page.links));
        }
        if script.contains("carousel__card") {
            let state = self.state.lock().unwrap();
            if state.finished && state.accordion_opened {
                return Ok(page.explanations.clone());
            }
            return Ok(json!([]));
        }
        if script.contains("progress__question") {
            return Ok(page.dom.clone());
        }

        Ok(Value::Null)
    }
}
