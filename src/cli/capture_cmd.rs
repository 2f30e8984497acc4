//! `docket capture` — run a full scrape of a cause-list URL.

use crate::capture::orchestrator::CaptureOrchestrator;
use crate::capture::CaptureOutcome;
use crate::captcha;
use crate::fetch::HttpClient;
use crate::listing::paginate::Paginator;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::{wait_for_ready, Renderer};
use crate::store::CaseStore;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::info;

const NAVIGATE_TIMEOUT_MS: u64 = 30_000;
const INITIAL_SETTLE_MS: u64 = 5000;
const HTTP_TIMEOUT_MS: u64 = 30_000;

pub async fn run(url: &str, max_pages: usize, headed: bool, db: Option<PathBuf>) -> Result<()> {
    let store = open_store(db)?;
    let http = HttpClient::new(HTTP_TIMEOUT_MS);

    let renderer = ChromiumRenderer::new(!headed)
        .await
        .context("failed to launch browser")?;
    let mut ctx = renderer.new_context().await?;

    let result = async {
        ctx.navigate(url, NAVIGATE_TIMEOUT_MS)
            .await
            .with_context(|| format!("failed to open {url}"))?;
        wait_for_ready(&*ctx, INITIAL_SETTLE_MS).await;

        if headed {
            println!("Browser is open. Fill in the search form (court, dates) as needed.");
            super::prompt("Press Enter once the form is ready to submit... ")?;
        }

        solve_captcha_interactively(&*ctx, &http).await?;

        let records = Paginator::new()
            .with_page_ceiling(max_pages)
            .collect(&*ctx)
            .await;
        if records.is_empty() {
            println!("No cases found on the listing.");
            return Ok(());
        }
        println!("Found {} case(s) across the listing.", records.len());

        let scrape_date = chrono::Local::now().date_naive();
        let mut orchestrator = CaptureOrchestrator::new(records);

        let bar = ProgressBar::new(orchestrator.records().len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut completed = 0usize;
        let mut partial = 0usize;
        while let Some(report) = orchestrator.step(&*ctx, &http, &store, scrape_date).await? {
            match report.outcome {
                CaptureOutcome::Completed => completed += 1,
                _ => partial += 1,
            }
            bar.set_message(format!("case {} {}", report.serial_id, report.outcome));
            bar.inc(1);
        }
        bar.finish_and_clear();

        println!("Capture finished: {completed} completed, {partial} partial.");
        Ok(())
    }
    .await;

    ctx.close().await.ok();
    renderer.shutdown().await.ok();
    result
}

/// Detect a captcha on the current page and hand it to the operator.
///
/// Sites without a captcha gate pass straight through.
async fn solve_captcha_interactively(
    ctx: &dyn crate::renderer::RenderContext,
    http: &HttpClient,
) -> Result<()> {
    let image_path = std::env::temp_dir().join("docket_captcha.png");
    match captcha::save_captcha_image(ctx, http, &image_path).await {
        Ok(path) => {
            println!("Captcha image saved to {}", path.display());
            let answer = super::prompt("Enter the captcha text: ")?;
            if captcha::submit_captcha(ctx, &answer).await? {
                info!("captcha submitted");
            } else {
                println!("Could not find the captcha form; continuing anyway.");
            }
        }
        Err(e) => {
            info!("no captcha handled: {e:#}");
        }
    }
    Ok(())
}

pub(super) fn open_store(db: Option<PathBuf>) -> Result<CaseStore> {
    match db {
        Some(path) => CaseStore::open(&path),
        None => CaseStore::open_default(),
    }
}
