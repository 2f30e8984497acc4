//! Case-by-case capture driver.
//!
//! Holds the record list and a cursor; each `step` processes exactly one
//! record end to end (activate, capture, consolidate, restore, persist)
//! and advances the cursor. The caller owns pacing, which keeps the loop
//! interruptible and lets a UI report progress between cases.

use super::details::extract_case_details;
use super::navigate::NavigationController;
use super::snapshot::{discover_document_links, fetch_linked_documents, snapshot_page};
use super::{consolidate::consolidate, CaptureOutcome, CaptureResult};
use crate::fetch::HttpClient;
use crate::listing::Record;
use crate::renderer::RenderContext;
use crate::store::CaseStore;
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

/// What one step produced, for progress reporting.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub serial_id: String,
    pub outcome: CaptureOutcome,
    /// Row id of the persisted case.
    pub case_id: i64,
    pub has_primary: bool,
    pub secondary_count: usize,
    pub has_consolidated: bool,
    /// Whether the listing was visible again after this case.
    pub listing_visible: bool,
}

/// Steps through the records of one scrape, persisting as it goes.
pub struct CaptureOrchestrator {
    records: Vec<Record>,
    cursor: usize,
    last: Option<StepReport>,
}

impl CaptureOrchestrator {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            cursor: 0,
            last: None,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn current_index(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.records.len().saturating_sub(self.cursor)
    }

    pub fn is_in_progress(&self) -> bool {
        self.cursor < self.records.len()
    }

    pub fn last_report(&self) -> Option<&StepReport> {
        self.last.as_ref()
    }

    /// Process the record under the cursor. Returns `None` once every
    /// record has been processed.
    ///
    /// A record whose capture degrades still advances the cursor with a
    /// partial outcome; only persistence failures abort the run.
    pub async fn step(
        &mut self,
        ctx: &dyn RenderContext,
        http: &HttpClient,
        store: &CaseStore,
        scrape_date: NaiveDate,
    ) -> Result<Option<StepReport>> {
        let Some(record) = self.records.get(self.cursor).cloned() else {
            return Ok(None);
        };

        let mut nav = NavigationController::new();
        let result = if nav.activate(ctx, &record.serial_id).await {
            self.capture_activated(ctx, http, &mut nav, record).await
        } else {
            CaptureResult {
                record,
                details: Default::default(),
                primary: None,
                secondaries: Vec::new(),
                consolidated: None,
                outcome: CaptureOutcome::PartialNoView,
            }
        };

        // Without an activation there was no page change to undo.
        let listing_visible = if result.outcome == CaptureOutcome::PartialNoView {
            true
        } else {
            nav.restore(ctx).await.listing_visible
        };

        let case_id = store.save_capture_result(&result, scrape_date)?;
        info!(
            serial = %result.record.serial_id,
            outcome = %result.outcome,
            case_id,
            "case processed"
        );

        let report = StepReport {
            serial_id: result.record.serial_id.clone(),
            outcome: result.outcome,
            case_id,
            has_primary: result.primary.is_some(),
            secondary_count: result.secondaries.len(),
            has_consolidated: result.consolidated.is_some(),
            listing_visible,
        };
        self.cursor += 1;
        self.last = Some(report.clone());
        Ok(Some(report))
    }

    /// Capture everything reachable from an activated detail page.
    async fn capture_activated(
        &self,
        ctx: &dyn RenderContext,
        http: &HttpClient,
        nav: &mut NavigationController,
        record: Record,
    ) -> CaptureResult {
        let primary = match snapshot_page(ctx).await {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(serial = %record.serial_id, "page snapshot failed: {e:#}");
                None
            }
        };

        let (details, secondaries) = match ctx.get_html().await {
            Ok(html) => {
                let details = extract_case_details(&html);
                let base_url = ctx.get_url().await.unwrap_or_default();
                let links = discover_document_links(&html, &base_url);
                let secondaries = fetch_linked_documents(http, &links).await;
                (details, secondaries)
            }
            Err(e) => {
                warn!(serial = %record.serial_id, "detail page unreadable: {e:#}");
                (Default::default(), Vec::new())
            }
        };

        nav.mark_captured();

        let mut ordered: Vec<&[u8]> = Vec::new();
        if let Some(doc) = &primary {
            ordered.push(&doc.bytes);
        }
        for doc in &secondaries {
            ordered.push(&doc.bytes);
        }
        let consolidated = consolidate(&ordered);

        let outcome = if primary.is_some() || !secondaries.is_empty() {
            CaptureOutcome::Completed
        } else {
            CaptureOutcome::PartialCaptureFailed
        };

        CaptureResult {
            record,
            details,
            primary,
            secondaries,
            consolidated,
            outcome,
        }
    }
}
