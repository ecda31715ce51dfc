//! Page navigation as an explicit, injectable effect.

use std::sync::Mutex;

use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    /// Login entry point.
    Login,
    /// Main menu / dashboard.
    Menu,
    Videos,
    AdaptiveTest,
    Rewards,
}

impl Page {
    pub fn path(&self) -> &'static str {
        match self {
            Page::Login => "index.html",
            Page::Menu => "menu.html",
            Page::Videos => "videos.html",
            Page::AdaptiveTest => "test.html",
            Page::Rewards => "recompensas.html",
        }
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, page: Page);
}

/// Logs navigations and does nothing else. For headless use.
#[derive(Debug, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, page: Page) {
        info!(target: "edusmart", page = page.path(), "navigate");
    }
}

/// Keeps every navigation in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<Page>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Page> {
        self.history.lock().ok().and_then(|h| h.last().copied())
    }

    pub fn history(&self) -> Vec<Page> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, page: Page) {
        info!(target: "edusmart", page = page.path(), "navigate");
        if let Ok(mut h) = self.history.lock() {
            h.push(page);
        }
    }
}
