//! Cause-list scraping: row extraction and pagination.

pub mod dates;
pub mod extract;
pub mod paginate;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row extracted from the cause-list, representing a case.
///
/// Identity is the serial within one scrape session; uniqueness is not
/// enforced; duplicate serials across pages are kept as separate records.
/// Immutable after extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Serial identifier from the row's first cell.
    pub serial_id: String,
    /// Heading of the court section this row appeared under.
    pub court_label: String,
    /// Whitespace-normalized text of every cell, in column order.
    pub raw_cells: Vec<String>,
    /// Next hearing date inferred from the row text, if any.
    pub next_hearing_date: Option<NaiveDate>,
}
