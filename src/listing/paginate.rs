//! Pagination driver for the cause-list.
//!
//! Repeatedly extracts the current page, then clicks the "next page"
//! control and waits for the page to settle. The listing site's pagination
//! state is not independently verifiable, so a hard page ceiling bounds
//! worst-case scrape time. Failures end pagination early and return
//! whatever was accumulated.

use super::extract::extract_records;
use super::Record;
use crate::renderer::{wait_for_ready, RenderContext};
use tracing::{debug, warn};

/// Hard ceiling on pages visited in one scrape.
pub const PAGE_CEILING: usize = 10;

/// Readiness budget after clicking the next-page control.
const SETTLE_BUDGET_MS: u64 = 1500;

/// Script that clicks the next-page control, by visible label first, then
/// by a class/aria-label heuristic.
const NEXT_PAGE_SCRIPT: &str = r#"(() => {
    const byText = [...document.querySelectorAll('a')]
        .find(a => a.textContent.trim() === 'Next');
    if (byText) { byText.click(); return { success: true }; }
    const heuristic = document.querySelector("a[class*='next' i], [aria-label*='Next' i]");
    if (heuristic) { heuristic.click(); return { success: true }; }
    return { success: false };
})()"#;

/// Drives the listing across pages, aggregating extracted records.
pub struct Paginator {
    page_ceiling: usize,
    settle_budget_ms: u64,
}

impl Paginator {
    pub fn new() -> Self {
        Self {
            page_ceiling: PAGE_CEILING,
            settle_budget_ms: SETTLE_BUDGET_MS,
        }
    }

    /// Override the page ceiling (still capped by [`PAGE_CEILING`]).
    pub fn with_page_ceiling(mut self, ceiling: usize) -> Self {
        self.page_ceiling = ceiling.clamp(1, PAGE_CEILING);
        self
    }

    /// Collect records from every page, in page-then-row order.
    pub async fn collect(&self, ctx: &dyn RenderContext) -> Vec<Record> {
        let mut all = Vec::new();

        for page in 1..=self.page_ceiling {
            let html = match ctx.get_html().await {
                Ok(html) => html,
                Err(e) => {
                    warn!(page, "failed to read listing page, stopping pagination: {e:#}");
                    break;
                }
            };

            let records = extract_records(&html);
            debug!(page, count = records.len(), "extracted listing page");
            all.extend(records);

            if page == self.page_ceiling {
                break;
            }

            match self.advance(ctx).await {
                Some(true) => {
                    wait_for_ready(ctx, self.settle_budget_ms).await;
                }
                Some(false) => break,
                None => break,
            }
        }

        all
    }

    /// Click the next-page control. `Some(false)` means no control exists;
    /// `None` means the click attempt itself failed.
    async fn advance(&self, ctx: &dyn RenderContext) -> Option<bool> {
        match ctx.execute_js(NEXT_PAGE_SCRIPT).await {
            Ok(value) => Some(
                value
                    .get("success")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
            ),
            Err(e) => {
                warn!("pagination advance failed: {e:#}");
                None
            }
        }
    }
}
