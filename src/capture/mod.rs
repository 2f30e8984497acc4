//! Per-case capture: navigation, snapshotting, consolidation, orchestration.

pub mod consolidate;
pub mod details;
pub mod navigate;
pub mod orchestrator;
pub mod snapshot;

use crate::capture::details::CaseDetails;
use crate::listing::Record;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a captured document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// Full-page print of the case detail page.
    PrimarySnapshot,
    /// A document fetched from a hyperlink on the detail page.
    SecondaryLink,
}

/// One captured PDF document.
#[derive(Debug, Clone)]
pub struct CaseDocument {
    pub bytes: Vec<u8>,
    pub kind: SourceKind,
}

/// Terminal outcome of capturing one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureOutcome {
    /// Activation succeeded and at least one document was captured.
    Completed,
    /// No view control could be located for the case's serial.
    PartialNoView,
    /// The detail page was reached but no document could be captured.
    PartialCaptureFailed,
}

impl CaptureOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureOutcome::Completed => "completed",
            CaptureOutcome::PartialNoView => "partial_no_view",
            CaptureOutcome::PartialCaptureFailed => "partial_capture_failed",
        }
    }
}

impl fmt::Display for CaptureOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything produced for one case, handed by value to the store.
///
/// Created once per record and never mutated. `outcome` is `Completed`
/// only when activation succeeded and `primary` or at least one secondary
/// is present; a failed activation always means `PartialNoView` with
/// empty document sets.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub record: Record,
    pub details: CaseDetails,
    pub primary: Option<CaseDocument>,
    pub secondaries: Vec<CaseDocument>,
    pub consolidated: Option<Vec<u8>>,
    pub outcome: CaptureOutcome,
}
