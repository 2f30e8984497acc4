//! Renderer abstraction for browser-based page automation.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide). The capture
//! engine only ever talks to `RenderContext`, which is what makes the
//! navigation and capture logic testable with scripted fakes.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context (tab).
///
/// The browser's current page is global mutable state, so one context is
/// owned exclusively by whoever is processing the current case. All
/// capture work is strictly sequential over a single context.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Get the current URL.
    async fn get_url(&self) -> Result<String>;
    /// Print the currently loaded page to a PDF document.
    async fn print_pdf(&self) -> Result<Vec<u8>>;
    /// Invoke the browser's native history-back action.
    async fn history_back(&self) -> Result<()>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Poll interval for [`wait_for_ready`].
const READY_POLL_MS: u64 = 250;

/// Wait until `document.readyState` is `complete`, up to `budget_ms`.
///
/// The target sites expose no reliable "page ready" observable, so every
/// destructive click is followed by this bounded readiness poll instead
/// of a fixed sleep. Returns `false` if the budget elapsed first; callers
/// proceed anyway since a stale-but-parseable page is better than none.
pub async fn wait_for_ready(ctx: &dyn RenderContext, budget_ms: u64) -> bool {
    let deadline = Instant::now() + Duration::from_millis(budget_ms);
    loop {
        if let Ok(value) = ctx.execute_js("document.readyState === 'complete'").await {
            if value.as_bool().unwrap_or(false) {
                return true;
            }
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(READY_POLL_MS)).await;
    }
}
