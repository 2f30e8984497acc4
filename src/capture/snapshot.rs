//! Document capture from a case detail page.
//!
//! Two sources: a full-page PDF print of the detail page itself, and any
//! `.pdf` documents it links to. Linked documents are fetched over plain
//! HTTP, individually and sequentially, so one unreachable order does not
//! cost the rest.

use super::{CaseDocument, SourceKind};
use crate::fetch::HttpClient;
use crate::renderer::RenderContext;
use anyhow::{Context, Result};
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

/// Per-document fetch timeout for linked PDFs.
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Print the current page to a PDF document.
pub async fn snapshot_page(ctx: &dyn RenderContext) -> Result<CaseDocument> {
    let bytes = ctx
        .print_pdf()
        .await
        .context("failed to print detail page to PDF")?;
    debug!(size = bytes.len(), "captured page snapshot");
    Ok(CaseDocument {
        bytes,
        kind: SourceKind::PrimarySnapshot,
    })
}

/// Collect absolute URLs of PDF documents linked from the page.
///
/// Only hrefs ending in `.pdf` (case-insensitive) count. Relative hrefs
/// are resolved against `base_url`; unresolvable ones are dropped.
/// Document order of the page is preserved.
pub fn discover_document_links(html: &str, base_url: &str) -> Vec<String> {
    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(e) => {
            warn!(base_url, "unparseable page URL, skipping link discovery: {e}");
            return Vec::new();
        }
    };

    let doc = Html::parse_document(html);
    let link_sel = Selector::parse("a[href]").expect("anchor selector is valid");

    let mut urls = Vec::new();
    for anchor in doc.select(&link_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if !href.to_lowercase().ends_with(".pdf") {
            continue;
        }
        match base.join(href) {
            Ok(resolved) => urls.push(resolved.to_string()),
            Err(e) => warn!(href, "unresolvable document link skipped: {e}"),
        }
    }
    urls
}

/// Fetch each linked document, skipping failures.
pub async fn fetch_linked_documents(http: &HttpClient, urls: &[String]) -> Vec<CaseDocument> {
    let mut documents = Vec::new();
    for url in urls {
        match http.get_bytes(url, FETCH_TIMEOUT_MS).await {
            Ok(bytes) => {
                debug!(%url, size = bytes.len(), "fetched linked document");
                documents.push(CaseDocument {
                    bytes,
                    kind: SourceKind::SecondaryLink,
                });
            }
            Err(e) => warn!(%url, "linked document fetch failed, skipping: {e:#}"),
        }
    }
    documents
}
