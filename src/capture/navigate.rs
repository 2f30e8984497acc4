//! Per-case navigation: activate the "view" control, later restore the
//! listing.
//!
//! The court sites' markup is uncontrolled and its control labelling is
//! inconsistent, so both directions run an ordered list of strategies,
//! most specific first, short-circuiting on the first that clicks
//! something. Every click is followed by a bounded readiness poll, since
//! these pages expose no "done" signal.

use crate::renderer::{wait_for_ready, RenderContext};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Readiness budget after activating a view control.
const ACTIVATE_SETTLE_MS: u64 = 3000;

/// Readiness budget after a back action.
const RESTORE_SETTLE_MS: u64 = 2000;

/// Navigation state for one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavState {
    Idle,
    Activated,
    Captured,
    Restored,
    Failed,
}

/// One activation strategy: a name for logging and a script builder that
/// embeds the (sanitized) serial.
struct ActivationStrategy {
    name: &'static str,
    script: fn(&str) -> String,
}

/// Ordered from most to least specific, to minimize the chance of clicking
/// a control in the wrong row.
const ACTIVATION_STRATEGIES: &[ActivationStrategy] = &[
    ActivationStrategy {
        name: "exact-cell-view",
        script: exact_cell_view_script,
    },
    ActivationStrategy {
        name: "row-contains-view",
        script: row_contains_view_script,
    },
    ActivationStrategy {
        name: "cell-contains-any-link",
        script: cell_contains_any_link_script,
    },
];

/// Strategy 1: a cell whose normalized text equals the serial exactly,
/// then a View/VIEW control within its row.
fn exact_cell_view_script(serial: &str) -> String {
    format!(
        r#"(() => {{
            const serial = '{}';
            const cell = [...document.querySelectorAll('td, th')]
                .find(c => c.textContent.replace(/\s+/g, ' ').trim() === serial);
            if (!cell) return {{ success: false }};
            const row = cell.closest('tr');
            if (!row) return {{ success: false }};
            const link = [...row.querySelectorAll('a, button')]
                .find(el => el.textContent.includes('View') || el.textContent.includes('VIEW'));
            if (!link) return {{ success: false }};
            link.click();
            return {{ success: true }};
        }})()"#,
        sanitize_js_string(serial)
    )
}

/// Strategy 2: any row whose text contains the serial, then a View/VIEW
/// control within it.
fn row_contains_view_script(serial: &str) -> String {
    format!(
        r#"(() => {{
            const serial = '{}';
            for (const row of document.querySelectorAll('tr')) {{
                if (!row.textContent.includes(serial)) continue;
                const link = [...row.querySelectorAll('a, button')]
                    .find(el => el.textContent.includes('View') || el.textContent.includes('VIEW'));
                if (link) {{ link.click(); return {{ success: true }}; }}
            }}
            return {{ success: false }};
        }})()"#,
        sanitize_js_string(serial)
    )
}

/// Strategy 3: a cell containing the serial, then the first control in its
/// row labelled view / click here / details (any case).
fn cell_contains_any_link_script(serial: &str) -> String {
    format!(
        r#"(() => {{
            const serial = '{}';
            const labels = ['view', 'click here', 'details'];
            const cell = [...document.querySelectorAll('td, th')]
                .find(c => c.textContent.includes(serial));
            if (!cell) return {{ success: false }};
            const row = cell.closest('tr');
            if (!row) return {{ success: false }};
            const link = [...row.querySelectorAll('a')]
                .find(el => labels.includes(el.textContent.trim().toLowerCase()));
            if (!link) return {{ success: false }};
            link.click();
            return {{ success: true }};
        }})()"#,
        sanitize_js_string(serial)
    )
}

/// Back-control selector shapes, tried in order before the native
/// history-back fallback.
const BACK_STRATEGIES: &[(&str, &str)] = &[
    (
        "link-text",
        r#"(() => {
            const el = [...document.querySelectorAll('a')].find(a => a.textContent.includes('Back'));
            if (el) { el.click(); return { success: true }; }
            return { success: false };
        })()"#,
    ),
    (
        "button-text",
        r#"(() => {
            const el = [...document.querySelectorAll('button')].find(b => b.textContent.includes('Back'));
            if (el) { el.click(); return { success: true }; }
            return { success: false };
        })()"#,
    ),
    (
        "input-value",
        r#"(() => {
            const el = document.querySelector("input[value='Back']");
            if (el) { el.click(); return { success: true }; }
            return { success: false };
        })()"#,
    ),
    (
        "href-history",
        r#"(() => {
            const el = document.querySelector("a[href*='history.back']");
            if (el) { el.click(); return { success: true }; }
            return { success: false };
        })()"#,
    ),
    (
        "onclick-back",
        r#"(() => {
            const el = document.querySelector("a[onclick*='back']");
            if (el) { el.click(); return { success: true }; }
            return { success: false };
        })()"#,
    ),
    (
        "class-back",
        r#"(() => {
            const el = document.querySelector("a[class*='back'], button[class*='back']");
            if (el) { el.click(); return { success: true }; }
            return { success: false };
        })()"#,
    ),
];

/// Script that checks whether a listing-shaped page is showing again.
const LISTING_VISIBLE_SCRIPT: &str = "document.querySelector('table') !== null";

/// How the listing was (or was not) restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreMethod {
    /// A back control matched one of the selector shapes.
    BackControl(&'static str),
    /// Native browser history-back.
    HistoryBack,
}

/// Outcome of a restoration attempt.
#[derive(Debug, Clone, Copy)]
pub struct RestoreReport {
    /// Which strategy worked, if any.
    pub method: Option<RestoreMethod>,
    /// Whether a listing table is visible after restoring. When false the
    /// next case's activation may be operating on the wrong page.
    pub listing_visible: bool,
}

/// State machine driving one case's view/back navigation cycle.
pub struct NavigationController {
    state: NavState,
}

impl NavigationController {
    pub fn new() -> Self {
        Self {
            state: NavState::Idle,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    /// Locate and click the view control for `serial`.
    ///
    /// Tries each activation strategy in order; the first click wins and
    /// transitions Idle→Activated. Exhausting all strategies transitions
    /// to Failed, which is terminal for the case and never retried.
    pub async fn activate(&mut self, ctx: &dyn RenderContext, serial: &str) -> bool {
        for strategy in ACTIVATION_STRATEGIES {
            let script = (strategy.script)(serial);
            match ctx.execute_js(&script).await {
                Ok(value) if clicked(&value) => {
                    wait_for_ready(ctx, ACTIVATE_SETTLE_MS).await;
                    self.state = NavState::Activated;
                    debug!(strategy = strategy.name, serial, "view control activated");
                    return true;
                }
                Ok(_) => continue,
                Err(e) => {
                    warn!(
                        strategy = strategy.name,
                        serial, "activation strategy errored: {e:#}"
                    );
                    continue;
                }
            }
        }

        self.state = NavState::Failed;
        warn!(serial, "no view control located");
        false
    }

    /// Record that the detail page was captured.
    pub fn mark_captured(&mut self) {
        if self.state == NavState::Activated {
            self.state = NavState::Captured;
        }
    }

    /// Return from the detail page to the listing.
    ///
    /// Tries the back-control shapes in order, then the native
    /// history-back. Afterwards the listing's presence is verified and
    /// reported. A failed restore is never fatal because there is no
    /// independent way to force the listing back.
    pub async fn restore(&mut self, ctx: &dyn RenderContext) -> RestoreReport {
        let mut method = None;

        for (name, script) in BACK_STRATEGIES {
            match ctx.execute_js(script).await {
                Ok(value) if clicked(&value) => {
                    method = Some(RestoreMethod::BackControl(name));
                    debug!(strategy = name, "back control clicked");
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    warn!(strategy = name, "back strategy errored: {e:#}");
                    continue;
                }
            }
        }

        if method.is_none() {
            match ctx.history_back().await {
                Ok(()) => method = Some(RestoreMethod::HistoryBack),
                Err(e) => warn!("native history-back failed: {e:#}"),
            }
        }

        wait_for_ready(ctx, RESTORE_SETTLE_MS).await;

        let listing_visible = ctx
            .execute_js(LISTING_VISIBLE_SCRIPT)
            .await
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if method.is_some() {
            self.state = NavState::Restored;
        } else {
            warn!("restoration failed, browser state unknown");
        }
        if !listing_visible {
            warn!("listing table not visible after restore");
        }

        RestoreReport {
            method,
            listing_visible,
        }
    }
}

fn clicked(value: &serde_json::Value) -> bool {
    value
        .get("success")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Sanitize a string for safe injection into a JavaScript string literal.
///
/// Escapes all characters that could break out of a JS string context.
pub fn sanitize_js_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '`' => result.push_str("\\`"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => {}                       // Strip null bytes
            '<' => result.push_str("\\x3c"), // Prevent </script> injection
            '>' => result.push_str("\\x3e"),
            _ => result.push(ch),
        }
    }
    result
}
