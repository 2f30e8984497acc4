//! Row-to-record extraction from one listing page's HTML.
//!
//! The listing markup is uncontrolled third-party HTML, so extraction is
//! deliberately forgiving: no table means no records (not an error), and
//! anything header-shaped is dropped rather than captured.

use super::dates;
use super::Record;
use scraper::{ElementRef, Html, Selector};

/// First-cell values that mark a row as a header rather than a case.
const HEADER_TOKENS: &[&str] = &["serial", "sr.no", "sr no", "s.no"];

/// Extract all case records from a listing page.
///
/// Uses the first `<table>` in the document; its first row is treated as a
/// header and skipped. The court label comes from the nearest heading
/// preceding the table, defaulting to "Unknown Court". Returns records in
/// row order; an empty vec when no table is found.
pub fn extract_records(html: &str) -> Vec<Record> {
    let doc = Html::parse_document(html);

    // Walk the document once: remember the last heading seen before the
    // first table, then stop at that table.
    let mut court_label = String::from("Unknown Court");
    let mut table: Option<ElementRef> = None;
    for node in doc.root_element().descendants() {
        if let Some(el) = ElementRef::wrap(node) {
            match el.value().name() {
                "h1" | "h2" | "h3" => {
                    let text = normalized_text(&el);
                    if !text.is_empty() {
                        court_label = text;
                    }
                }
                "table" => {
                    table = Some(el);
                    break;
                }
                _ => {}
            }
        }
    }

    let Some(table) = table else {
        return Vec::new();
    };

    let row_sel = Selector::parse("tr").expect("row selector is valid");
    let cell_sel = Selector::parse("td, th").expect("cell selector is valid");

    let mut records = Vec::new();
    for row in table.select(&row_sel).skip(1) {
        let raw_cells: Vec<String> = row
            .select(&cell_sel)
            .map(|cell| normalized_text(&cell))
            .collect();
        if raw_cells.is_empty() {
            continue;
        }

        let serial_id = raw_cells[0].trim().to_string();
        if serial_id.is_empty() {
            continue;
        }
        let lowered = serial_id.to_lowercase();
        if HEADER_TOKENS.contains(&lowered.as_str()) {
            continue;
        }

        let row_text = normalized_text(&row);
        let next_hearing_date = dates::find_next_hearing_date(&row_text);

        records.push(Record {
            serial_id,
            court_label: court_label.clone(),
            raw_cells,
            next_hearing_date,
        });
    }

    records
}

/// Whitespace-normalized text content of an element.
fn normalized_text(el: &ElementRef) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_no_table_yields_empty() {
        let records = extract_records("<html><body><p>maintenance page</p></body></html>");
        assert!(records.is_empty());
    }

    #[test]
    fn test_header_row_and_tokens_skipped() {
        let html = r#"
            <table>
                <tr><th>Sr.No</th><th>Case</th></tr>
                <tr><td>Serial</td><td>stray repeated header</td></tr>
                <tr><td>1</td><td>State vs Doe</td></tr>
                <tr><td></td><td>row without serial</td></tr>
            </table>"#;
        let records = extract_records(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].serial_id, "1");
        assert_eq!(records[0].raw_cells, vec!["1", "State vs Doe"]);
    }

    #[test]
    fn test_header_tokens_rejected_case_insensitively() {
        let html = r#"
            <table>
                <tr><th>h</th></tr>
                <tr><td>SR.NO</td></tr>
                <tr><td>Sr No</td></tr>
                <tr><td>S.No</td></tr>
                <tr><td>7</td></tr>
            </table>"#;
        let records = extract_records(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].serial_id, "7");
    }

    #[test]
    fn test_court_label_from_nearest_preceding_heading() {
        let html = r#"
            <h1>District Court Complex</h1>
            <h2>Court No. 3 — Sh. A. Kumar</h2>
            <table>
                <tr><th>Sr.No</th></tr>
                <tr><td>1</td></tr>
            </table>"#;
        let records = extract_records(html);
        assert_eq!(records[0].court_label, "Court No. 3 — Sh. A. Kumar");
    }

    #[test]
    fn test_court_label_defaults_when_no_heading() {
        let html = "<table><tr><th>h</th></tr><tr><td>1</td></tr></table>";
        let records = extract_records(html);
        assert_eq!(records[0].court_label, "Unknown Court");
    }

    #[test]
    fn test_hearing_date_scenarios() {
        // Row 1 carries a labelled date, row 2 has no date info.
        let html = r#"
            <table>
                <tr><th>Sr.No</th><th>Details</th></tr>
                <tr><td>1</td><td>CourtA, Next Hearing Date: 05/01/2030</td></tr>
                <tr><td>2</td><td>CourtA, no date info</td></tr>
            </table>"#;
        let records = extract_records(html);
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].next_hearing_date,
            NaiveDate::from_ymd_opt(2030, 1, 5)
        );
        assert_eq!(records[1].next_hearing_date, None);
    }

    #[test]
    fn test_whitespace_normalized_cells() {
        let html = "<table><tr><th>h</th></tr><tr><td>  12\n  </td><td>State  vs\t Doe</td></tr></table>";
        let records = extract_records(html);
        assert_eq!(records[0].serial_id, "12");
        assert_eq!(records[0].raw_cells[1], "State vs Doe");
    }

    #[test]
    fn test_duplicate_serials_are_kept() {
        let html = r#"
            <table>
                <tr><th>h</th></tr>
                <tr><td>5</td><td>first</td></tr>
                <tr><td>5</td><td>second</td></tr>
            </table>"#;
        let records = extract_records(html);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].raw_cells[1], "first");
        assert_eq!(records[1].raw_cells[1], "second");
    }
}
