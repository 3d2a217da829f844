//! Scripted page driver used by adapter tests.

use super::driver::PageDriver;
use super::error::AdapterError;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

const BLANK_PAGE: &str = "<html><head></head><body></body></html>";
const DATE_GRID: &str = r#"<div role="grid"><button role="gridcell" aria-selected="true">4</button><button role="gridcell">5</button></div>"#;

/// One day's worth of markup served by the scripted driver.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedPage {
    html: String,
}

impl ScriptedPage {
    pub(crate) fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

/// Observable state of a [`ScriptedDriver`], shared with the test body.
#[derive(Debug, Default)]
pub(crate) struct ScriptState {
    pages: Vec<ScriptedPage>,
    current: usize,
    loaded: bool,
    host: Option<(String, String)>,
    showing_host: bool,
    next_selector: Option<String>,
    clickable: Vec<String>,
    gate: Option<String>,
    unreachable: bool,
    delayed_advances: usize,
    held: usize,
    date_popover: Option<String>,
    grid_open: Option<bool>,
    pub(crate) visited: Vec<String>,
    pub(crate) clicks: Vec<String>,
    pub(crate) next_requests: usize,
}

impl ScriptState {
    /// Applies advances that were accepted but held back.
    pub(crate) fn release_delayed(&mut self) {
        self.current += self.held;
        self.held = 0;
    }

    fn request_next(&mut self) -> bool {
        if self.current + self.held + 1 >= self.pages.len() {
            return false;
        }
        self.next_requests += 1;
        if self.delayed_advances > 0 {
            self.delayed_advances -= 1;
            self.held += 1;
        } else {
            self.current += 1;
        }
        true
    }
}

/// A [`PageDriver`] that serves canned HTML, one page per calendar day.
pub(crate) struct ScriptedDriver {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedDriver {
    pub(crate) fn new(pages: Vec<ScriptedPage>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                pages,
                ..Default::default()
            })),
        }
    }

    pub(crate) fn state(&self) -> Arc<Mutex<ScriptState>> {
        Arc::clone(&self.state)
    }

    fn configure(self, f: impl FnOnce(&mut ScriptState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    /// Clicking this selector (or stepping the date grid) requests the next day.
    pub(crate) fn with_next_selector(self, selector: &str) -> Self {
        let selector = selector.to_string();
        self.configure(|s| s.next_selector = Some(selector))
    }

    pub(crate) fn with_clickable(self, selector: &str) -> Self {
        let selector = selector.to_string();
        self.configure(|s| s.clickable.push(selector))
    }

    pub(crate) fn with_gate(self, text: &str) -> Self {
        let text = text.to_string();
        self.configure(|s| s.gate = Some(text))
    }

    /// Serves `html` when `url` is visited instead of the day pages.
    pub(crate) fn with_host(self, url: &str, html: &str) -> Self {
        let host = (url.to_string(), html.to_string());
        self.configure(|s| s.host = Some(host))
    }

    /// The next `count` advances are accepted but only applied on release.
    pub(crate) fn with_delayed_advances(self, count: usize) -> Self {
        self.configure(|s| s.delayed_advances = count)
    }

    /// Day cells only render after `toggle` is clicked, and close again
    /// once a cell has been used to advance.
    pub(crate) fn with_date_popover(self, toggle: &str) -> Self {
        let toggle = toggle.to_string();
        self.configure(|s| {
            s.date_popover = Some(toggle);
            s.grid_open = Some(false);
        })
    }

    pub(crate) fn unreachable(self) -> Self {
        self.configure(|s| s.unreachable = true)
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn goto(&mut self, url: &str) -> Result<(), AdapterError> {
        let mut state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(AdapterError::Navigation {
                message: format!("net::ERR_NAME_NOT_RESOLVED at {url}"),
            });
        }
        state.visited.push(url.to_string());
        state.showing_host = state.host.as_ref().is_some_and(|(host, _)| host == url);
        state.loaded = true;
        Ok(())
    }

    async fn content(&mut self) -> Result<String, AdapterError> {
        let state = self.state.lock().unwrap();
        if state.showing_host {
            if let Some((_, html)) = &state.host {
                return Ok(html.clone());
            }
        }
        if !state.loaded {
            return Ok(BLANK_PAGE.to_string());
        }
        let Some(page) = state.pages.get(state.current) else {
            return Ok(BLANK_PAGE.to_string());
        };
        if state.grid_open == Some(true) {
            return Ok(page.html.replace("</body>", &format!("{DATE_GRID}</body>")));
        }
        Ok(page.html.clone())
    }

    async fn click(&mut self, selector: &str) -> Result<bool, AdapterError> {
        let mut state = self.state.lock().unwrap();
        state.clicks.push(selector.to_string());
        if state.next_selector.as_deref() == Some(selector) {
            return Ok(state.request_next());
        }
        if state.date_popover.as_deref() == Some(selector) {
            state.grid_open = Some(true);
            return Ok(true);
        }
        Ok(state.clickable.iter().any(|s| s == selector))
    }

    async fn click_by_text(&mut self, selector: &str, text: &str) -> Result<bool, AdapterError> {
        let mut state = self.state.lock().unwrap();
        state.clicks.push(format!("{selector} :: {text}"));
        Ok(state.gate.as_deref().is_some_and(|gate| gate.contains(text)))
    }

    async fn evaluate(&mut self, _script: &str) -> Result<serde_json::Value, AdapterError> {
        let mut state = self.state.lock().unwrap();
        if state.grid_open == Some(false) {
            return Ok(serde_json::Value::from("no-grid"));
        }
        if !state.request_next() {
            return Ok(serde_json::Value::from("last"));
        }
        if state.grid_open.is_some() {
            state.grid_open = Some(false);
        }
        Ok(serde_json::Value::from("advanced"))
    }
}
