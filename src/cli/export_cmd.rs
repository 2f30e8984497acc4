//! `docket export` — write a stored document out to a file.

use crate::store::DocumentKind;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

pub fn run(case_id: i64, kind: &str, out: Option<PathBuf>, db: Option<PathBuf>) -> Result<()> {
    let kind: DocumentKind = kind.parse()?;
    let store = super::capture_cmd::open_store(db)?;

    let Some((filename, bytes)) = store.fetch_document(case_id, kind)? else {
        bail!("case {case_id} has no {} document", kind.as_str());
    };

    let dest = out.unwrap_or_else(|| PathBuf::from(&filename));
    std::fs::write(&dest, &bytes)
        .with_context(|| format!("failed to write {}", dest.display()))?;
    println!("Wrote {} ({} bytes).", dest.display(), bytes.len());
    Ok(())
}
