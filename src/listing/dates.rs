//! Day-first date recognition for cause-list rows.
//!
//! Court listings write dates as `05/01/2030`, `05-01-2030`, `05.01.2030`
//! or `5 January 2030`, usually after a "Next Hearing Date" style label.
//! Parse failures are never errors; a row without a recognizable date
//! simply has no hearing date.

use chrono::NaiveDate;
use regex::Regex;

/// Parse a single date token with day-first convention.
pub fn parse_day_first(token: &str) -> Option<NaiveDate> {
    let t = token.trim();

    // %y before %Y: chrono's %Y accepts a two-digit year as-is, so
    // "17-03-26" would otherwise become year 0026. %y never matches a
    // four-digit year (trailing digits fail the parse), so the order is
    // safe for both.
    const NUMERIC: &[&str] = &[
        "%d/%m/%y", "%d/%m/%Y", "%d-%m-%y", "%d-%m-%Y", "%d.%m.%y", "%d.%m.%Y",
    ];
    for fmt in NUMERIC {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Some(d);
        }
    }

    const WORDY: &[&str] = &["%d %B %Y", "%d %b %Y"];
    for fmt in WORDY {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Some(d);
        }
    }

    None
}

/// Find the next-hearing date in a row's flattened text.
///
/// Prefers a date token following a hearing-date label. Falls back to any
/// bare numeric date token, but only when the word "Next" appears somewhere
/// in the row, since a bare date with no such hint is more likely a filing or
/// registration date.
pub fn find_next_hearing_date(row_text: &str) -> Option<NaiveDate> {
    let label_re = Regex::new(
        r"(?i)(Next\s+Hearing\s+Date|Next\s+Date|Next\s+Hearing|NextDate)[:\-\s]*",
    )
    .expect("date label regex is valid");
    let token_re =
        Regex::new(r"\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|\d{1,2}\s+[A-Za-z]+\s+\d{4}")
            .expect("date token regex is valid");
    let bare_re = Regex::new(r"\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}")
        .expect("bare date token regex is valid");

    if let Some(m) = label_re.find(row_text) {
        let after = &row_text[m.end()..];
        if let Some(tok) = token_re.find(after) {
            if let Some(date) = parse_day_first(tok.as_str()) {
                return Some(date);
            }
        }
    }

    if row_text.contains("Next") {
        if let Some(tok) = bare_re.find(row_text) {
            return parse_day_first(tok.as_str());
        }
    }

    None
}
