//! `docket list` — show captured cases from the database.

use crate::store::CaseRow;
use anyhow::Result;
use chrono::{Duration, Local};
use std::path::PathBuf;

pub fn run(today_tomorrow: bool, json: bool, db: Option<PathBuf>) -> Result<()> {
    let store = super::capture_cmd::open_store(db)?;

    let rows = if today_tomorrow {
        let today = Local::now().date_naive();
        let tomorrow = today + Duration::days(1);
        store.list_for_hearing_dates(today, tomorrow)?
    } else {
        store.list_all()?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No cases stored.");
        return Ok(());
    }
    for row in &rows {
        println!("{}", format_row(row));
    }
    println!("{} case(s).", rows.len());
    Ok(())
}

fn format_row(row: &CaseRow) -> String {
    let hearing = row
        .next_hearing_date
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".into());
    format!(
        "#{:<5} serial {:<6} {:<30} CNR {:<18} hearing {:<10} [{}]",
        row.id,
        row.serial_number,
        truncate(&row.court_name, 30),
        row.cnr_number.as_deref().unwrap_or("-"),
        hearing,
        row.outcome.as_deref().unwrap_or("unknown"),
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
