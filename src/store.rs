//! SQLite persistence for captured cases and their documents.
//!
//! One database holds every scrape; a row in `cases` per processed record,
//! with its PDFs in `documents`. Schema changes are applied as idempotent
//! add-column migrations so older databases keep working.

use crate::capture::{CaptureResult, SourceKind};
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Storage classification of one persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Full-page snapshot of the detail page.
    Primary,
    /// A document fetched from a link on the detail page.
    Secondary,
    /// Merged case file.
    Consolidated,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Primary => "primary",
            DocumentKind::Secondary => "secondary",
            DocumentKind::Consolidated => "consolidated",
        }
    }
}

impl FromStr for DocumentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "primary" => Ok(DocumentKind::Primary),
            "secondary" => Ok(DocumentKind::Secondary),
            "consolidated" => Ok(DocumentKind::Consolidated),
            other => Err(anyhow!(
                "unknown document kind '{other}' (expected primary, secondary or consolidated)"
            )),
        }
    }
}

/// One persisted case, as listed back out of the database.
#[derive(Debug, Clone, Serialize)]
pub struct CaseRow {
    pub id: i64,
    pub serial_number: String,
    pub court_name: String,
    pub cnr_number: Option<String>,
    pub case_type: Option<String>,
    pub next_hearing_date: Option<NaiveDate>,
    pub outcome: Option<String>,
    pub scrape_date: Option<NaiveDate>,
    pub captured_at: String,
}

/// Store for captured cases, backed by a single SQLite file.
pub struct CaseStore {
    db: Connection,
}

impl CaseStore {
    /// Open (or create) the store at `path` and bring its schema current.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let db = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;

        let store = Self { db };
        store.init_schema()?;
        store.migrate()?;
        Ok(store)
    }

    /// Open the store at its default location, `~/.docket/docket.db`.
    pub fn open_default() -> Result<Self> {
        Self::open(&default_db_path()?)
    }

    fn init_schema(&self) -> Result<()> {
        self.db.execute_batch(
            "CREATE TABLE IF NOT EXISTS cases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                serial_number TEXT NOT NULL,
                court_name TEXT NOT NULL,
                cnr_number TEXT,
                case_type TEXT,
                court_info TEXT,
                filing_number TEXT,
                registration_number TEXT,
                next_hearing_date TEXT,
                captured_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                case_id INTEGER NOT NULL REFERENCES cases(id),
                filename TEXT NOT NULL,
                kind TEXT NOT NULL,
                data BLOB NOT NULL,
                stored_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_documents_case
                ON documents(case_id, kind);",
        )?;
        Ok(())
    }

    /// Columns added after the initial schema shipped.
    fn migrate(&self) -> Result<()> {
        self.add_column_if_absent("cases", "outcome", "TEXT")?;
        self.add_column_if_absent("cases", "scrape_date", "TEXT")?;
        Ok(())
    }

    fn add_column_if_absent(&self, table: &str, column: &str, decl: &str) -> Result<()> {
        let mut stmt = self.db.prepare(&format!("PRAGMA table_info({table})"))?;
        let existing: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<_>>()?;
        if existing.iter().any(|c| c == column) {
            return Ok(());
        }
        self.db
            .execute(&format!("ALTER TABLE {table} ADD COLUMN {column} {decl}"), [])?;
        debug!(table, column, "added column");
        Ok(())
    }

    /// Persist one case and all of its documents; returns the case row id.
    pub fn save_capture_result(&self, result: &CaptureResult, scrape_date: NaiveDate) -> Result<i64> {
        let record = &result.record;
        self.db.execute(
            "INSERT INTO cases (serial_number, court_name, cnr_number, case_type,
                court_info, filing_number, registration_number, next_hearing_date,
                outcome, scrape_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.serial_id,
                record.court_label,
                result.details.cnr_number,
                result.details.case_type,
                result.details.court_and_judge,
                result.details.filing_number,
                result.details.registration_number,
                record.next_hearing_date.map(|d| d.format("%Y-%m-%d").to_string()),
                result.outcome.as_str(),
                scrape_date.format("%Y-%m-%d").to_string(),
            ],
        )?;
        let case_id = self.db.last_insert_rowid();

        if let Some(doc) = &result.primary {
            debug_assert_eq!(doc.kind, SourceKind::PrimarySnapshot);
            self.insert_document(
                case_id,
                &format!("case_{}_snapshot.pdf", record.serial_id),
                DocumentKind::Primary,
                &doc.bytes,
            )?;
        }
        for (i, doc) in result.secondaries.iter().enumerate() {
            self.insert_document(
                case_id,
                &format!("case_{}_doc_{}.pdf", record.serial_id, i + 1),
                DocumentKind::Secondary,
                &doc.bytes,
            )?;
        }
        if let Some(bytes) = &result.consolidated {
            self.insert_document(
                case_id,
                &format!("case_{}_consolidated.pdf", record.serial_id),
                DocumentKind::Consolidated,
                bytes,
            )?;
        }

        Ok(case_id)
    }

    fn insert_document(
        &self,
        case_id: i64,
        filename: &str,
        kind: DocumentKind,
        data: &[u8],
    ) -> Result<()> {
        self.db.execute(
            "INSERT INTO documents (case_id, filename, kind, data) VALUES (?1, ?2, ?3, ?4)",
            params![case_id, filename, kind.as_str(), data],
        )?;
        Ok(())
    }

    /// Every stored case, newest first.
    pub fn list_all(&self) -> Result<Vec<CaseRow>> {
        let mut stmt = self.db.prepare(
            "SELECT id, serial_number, court_name, cnr_number, case_type,
                    next_hearing_date, outcome, scrape_date, captured_at
             FROM cases ORDER BY captured_at DESC, id DESC",
        )?;
        let rows = stmt
            .query_map([], row_to_case)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Cases whose next hearing falls on either of two dates.
    pub fn list_for_hearing_dates(&self, first: NaiveDate, second: NaiveDate) -> Result<Vec<CaseRow>> {
        let mut stmt = self.db.prepare(
            "SELECT id, serial_number, court_name, cnr_number, case_type,
                    next_hearing_date, outcome, scrape_date, captured_at
             FROM cases
             WHERE next_hearing_date = ?1 OR next_hearing_date = ?2
             ORDER BY next_hearing_date, id",
        )?;
        let rows = stmt
            .query_map(
                params![
                    first.format("%Y-%m-%d").to_string(),
                    second.format("%Y-%m-%d").to_string()
                ],
                row_to_case,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Latest stored document of `kind` for a case, as (filename, bytes).
    pub fn fetch_document(
        &self,
        case_id: i64,
        kind: DocumentKind,
    ) -> Result<Option<(String, Vec<u8>)>> {
        let result = self
            .db
            .query_row(
                "SELECT filename, data FROM documents
                 WHERE case_id = ?1 AND kind = ?2
                 ORDER BY id DESC LIMIT 1",
                params![case_id, kind.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)),
            )
            .optional()?;
        Ok(result)
    }
}

fn row_to_case(row: &rusqlite::Row<'_>) -> rusqlite::Result<CaseRow> {
    let parse_date = |v: Option<String>| {
        v.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
    };
    Ok(CaseRow {
        id: row.get(0)?,
        serial_number: row.get(1)?,
        court_name: row.get(2)?,
        cnr_number: row.get(3)?,
        case_type: row.get(4)?,
        next_hearing_date: parse_date(row.get(5)?),
        outcome: row.get(6)?,
        scrape_date: parse_date(row.get(7)?),
        captured_at: row.get(8)?,
    })
}

/// `~/.docket/docket.db`.
pub fn default_db_path() -> Result<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        bail!("could not determine home directory");
    };
    Ok(home.join(".docket").join("docket.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::details::CaseDetails;
    use crate::capture::{CaptureOutcome, CaseDocument};
    use crate::listing::Record;

    fn open_temp() -> (tempfile::TempDir, CaseStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CaseStore::open(&dir.path().join("docket.db")).unwrap();
        (dir, store)
    }

    fn sample_result(serial: &str, hearing: Option<NaiveDate>) -> CaptureResult {
        CaptureResult {
            record: Record {
                serial_id: serial.into(),
                court_label: "Court No. 3".into(),
                raw_cells: vec![serial.into(), "State vs Doe".into()],
                next_hearing_date: hearing,
            },
            details: CaseDetails {
                cnr_number: Some("DLCT010012342026".into()),
                case_type: Some("CRL.A".into()),
                ..Default::default()
            },
            primary: Some(CaseDocument {
                bytes: b"%PDF primary".to_vec(),
                kind: crate::capture::SourceKind::PrimarySnapshot,
            }),
            secondaries: vec![CaseDocument {
                bytes: b"%PDF secondary".to_vec(),
                kind: crate::capture::SourceKind::SecondaryLink,
            }],
            consolidated: Some(b"%PDF merged".to_vec()),
            outcome: CaptureOutcome::Completed,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_save_and_list_roundtrip() {
        let (_dir, store) = open_temp();
        let id = store
            .save_capture_result(&sample_result("12", Some(date(2026, 9, 1))), date(2026, 8, 27))
            .unwrap();
        assert!(id > 0);

        let rows = store.list_all().unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.serial_number, "12");
        assert_eq!(row.court_name, "Court No. 3");
        assert_eq!(row.cnr_number.as_deref(), Some("DLCT010012342026"));
        assert_eq!(row.next_hearing_date, Some(date(2026, 9, 1)));
        assert_eq!(row.outcome.as_deref(), Some("completed"));
        assert_eq!(row.scrape_date, Some(date(2026, 8, 27)));
    }

    #[test]
    fn test_documents_stored_per_kind() {
        let (_dir, store) = open_temp();
        let id = store
            .save_capture_result(&sample_result("5", None), date(2026, 8, 27))
            .unwrap();

        let (name, bytes) = store.fetch_document(id, DocumentKind::Primary).unwrap().unwrap();
        assert_eq!(name, "case_5_snapshot.pdf");
        assert_eq!(bytes, b"%PDF primary");

        let (name, _) = store.fetch_document(id, DocumentKind::Secondary).unwrap().unwrap();
        assert_eq!(name, "case_5_doc_1.pdf");

        let (name, bytes) = store
            .fetch_document(id, DocumentKind::Consolidated)
            .unwrap()
            .unwrap();
        assert_eq!(name, "case_5_consolidated.pdf");
        assert_eq!(bytes, b"%PDF merged");

        assert!(store.fetch_document(999, DocumentKind::Primary).unwrap().is_none());
    }

    #[test]
    fn test_hearing_date_filter() {
        let (_dir, store) = open_temp();
        store
            .save_capture_result(&sample_result("1", Some(date(2026, 8, 27))), date(2026, 8, 27))
            .unwrap();
        store
            .save_capture_result(&sample_result("2", Some(date(2026, 8, 28))), date(2026, 8, 27))
            .unwrap();
        store
            .save_capture_result(&sample_result("3", Some(date(2026, 12, 1))), date(2026, 8, 27))
            .unwrap();
        store
            .save_capture_result(&sample_result("4", None), date(2026, 8, 27))
            .unwrap();

        let rows = store
            .list_for_hearing_dates(date(2026, 8, 27), date(2026, 8, 28))
            .unwrap();
        let serials: Vec<&str> = rows.iter().map(|r| r.serial_number.as_str()).collect();
        assert_eq!(serials, vec!["1", "2"]);
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docket.db");
        {
            let store = CaseStore::open(&path).unwrap();
            store
                .save_capture_result(&sample_result("9", None), date(2026, 8, 27))
                .unwrap();
        }
        let store = CaseStore::open(&path).unwrap();
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_migrates_legacy_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docket.db");
        {
            // Database created before outcome/scrape_date existed.
            let db = Connection::open(&path).unwrap();
            db.execute_batch(
                "CREATE TABLE cases (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    serial_number TEXT NOT NULL,
                    court_name TEXT NOT NULL,
                    cnr_number TEXT,
                    case_type TEXT,
                    court_info TEXT,
                    filing_number TEXT,
                    registration_number TEXT,
                    next_hearing_date TEXT,
                    captured_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                );
                INSERT INTO cases (serial_number, court_name) VALUES ('1', 'Old Court');",
            )
            .unwrap();
        }

        let store = CaseStore::open(&path).unwrap();
        let rows = store.list_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].outcome, None);

        // New writes populate the migrated columns.
        store
            .save_capture_result(&sample_result("2", None), date(2026, 8, 27))
            .unwrap();
        let rows = store.list_all().unwrap();
        assert!(rows.iter().any(|r| r.outcome.as_deref() == Some("completed")));
    }
}
