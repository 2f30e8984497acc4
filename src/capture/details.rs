//! Structured field extraction from a case detail page.
//!
//! The detail pages are label/value soup rather than structured markup, so
//! extraction works on the flattened page text with per-field patterns.
//! Every field is optional; a page yielding nothing is still a valid
//! (empty) result.

use regex::Regex;
use scraper::Html;
use serde::{Deserialize, Serialize};

/// Fields recognized on a case detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDetails {
    /// 16-character alphanumeric CNR identifier.
    pub cnr_number: Option<String>,
    pub case_type: Option<String>,
    pub court_and_judge: Option<String>,
    pub filing_number: Option<String>,
    pub registration_number: Option<String>,
}

impl CaseDetails {
    pub fn is_empty(&self) -> bool {
        self.cnr_number.is_none()
            && self.case_type.is_none()
            && self.court_and_judge.is_none()
            && self.filing_number.is_none()
            && self.registration_number.is_none()
    }
}

/// CNR in its canonical context: the sites annotate it with a parenthetical
/// note, which disambiguates it from other 16-character tokens.
const CNR_CONTEXT_PATTERN: &str = r"(?i)\b([A-Z0-9]{16})\s*\(Note the CNR number";

/// Bare CNR fallback when the annotation is absent.
const CNR_BARE_PATTERN: &str = r"\b[A-Z]{4}[A-Z0-9]{12}\b";

/// Extract structured fields from detail-page HTML.
pub fn extract_case_details(html: &str) -> CaseDetails {
    let text = flatten_text(html);

    CaseDetails {
        cnr_number: find_cnr(&text),
        case_type: find_labelled(&text, "Case Type"),
        court_and_judge: find_labelled(&text, "Court Number and Judge"),
        filing_number: find_labelled(&text, "Filing Number"),
        registration_number: find_labelled(&text, "Registration Number"),
    }
}

fn find_cnr(text: &str) -> Option<String> {
    let context_re = Regex::new(CNR_CONTEXT_PATTERN).expect("CNR context regex is valid");
    if let Some(caps) = context_re.captures(text) {
        return Some(caps[1].to_uppercase());
    }
    let bare_re = Regex::new(CNR_BARE_PATTERN).expect("bare CNR regex is valid");
    bare_re.find(text).map(|m| m.as_str().to_string())
}

/// All labels recognized on a detail page. Used to delimit where one
/// field's value ends in the flattened text.
const FIELD_LABELS: &[&str] = &[
    "Case Type",
    "Court Number and Judge",
    "Filing Number",
    "Registration Number",
    "CNR Number",
];

/// Value following `label`, cut at the next recognized label.
fn find_labelled(text: &str, label: &str) -> Option<String> {
    let label_re = Regex::new(&format!(r"(?i){}\s*[:\-]?\s*", regex::escape(label)))
        .expect("label regex is valid");
    let start = label_re.find(text)?.end();
    let rest = &text[start..];

    let boundary_pattern = FIELD_LABELS
        .iter()
        .map(|l| regex::escape(l))
        .collect::<Vec<_>>()
        .join("|");
    let boundary_re =
        Regex::new(&format!(r"(?i){boundary_pattern}")).expect("boundary regex is valid");
    let end = boundary_re.find(rest).map(|m| m.start()).unwrap_or(rest.len());

    let value = rest[..end].trim().trim_matches(':').trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Flatten HTML to whitespace-normalized text.
fn flatten_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    doc.root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cnr_from_annotated_context() {
        let html = r#"
            <p>DLCT010012342026 (Note the CNR number for future reference)</p>
        "#;
        let details = extract_case_details(html);
        assert_eq!(details.cnr_number.as_deref(), Some("DLCT010012342026"));
    }

    #[test]
    fn test_cnr_annotation_case_insensitive_and_uppercased() {
        let html = "dlct010012342026 (note the cnr number)";
        let details = extract_case_details(html);
        assert_eq!(details.cnr_number.as_deref(), Some("DLCT010012342026"));
    }

    #[test]
    fn test_cnr_bare_fallback() {
        // No annotation anywhere, just a labelled cell in a real table.
        let html = r#"
            <table>
                <tr><td>CNR</td><td>MHAU019999992025</td></tr>
            </table>"#;
        let details = extract_case_details(html);
        assert_eq!(details.cnr_number.as_deref(), Some("MHAU019999992025"));
    }

    #[test]
    fn test_labelled_fields() {
        let html = r#"
            <table>
                <tr><td>Case Type</td><td>CRL.A</td></tr>
                <tr><td>Court Number and Judge</td><td>3 Sh. A. Kumar</td></tr>
                <tr><td>Filing Number</td><td>1234/2025</td></tr>
                <tr><td>Registration Number</td><td>567/2025</td></tr>
            </table>
        "#;
        let details = extract_case_details(html);
        assert_eq!(details.case_type.as_deref(), Some("CRL.A"));
        assert_eq!(details.court_and_judge.as_deref(), Some("3 Sh. A. Kumar"));
        assert_eq!(details.filing_number.as_deref(), Some("1234/2025"));
        assert_eq!(details.registration_number.as_deref(), Some("567/2025"));
    }

    #[test]
    fn test_colon_separated_labels() {
        let html = "<p>Case Type: CS COMM</p>";
        let details = extract_case_details(html);
        assert_eq!(details.case_type.as_deref(), Some("CS COMM"));
    }

    #[test]
    fn test_unrecognizable_page_is_empty() {
        let details = extract_case_details("<html><body><p>session expired</p></body></html>");
        assert!(details.is_empty());
    }
}
