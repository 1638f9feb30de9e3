//! `scrape`: extract every currency and write one file each.

use super::{output, CliContext};
use crate::config::Settings;
use crate::renderer::{BrowserOptions, ChromiumDriver};
use anyhow::Result;
use boc_fx::{progress, FailurePolicy, Orchestrator, RunSummary, TextFileSink};
use chrono::NaiveDate;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, clap::Args)]
pub struct ScrapeArgs {
    /// First day of the range (YYYY-MM-DD). Defaults to two days ago.
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Directory the rate files are written to.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Run Chromium without a window.
    #[arg(long, overrides_with = "headed")]
    pub headless: bool,

    /// Show the Chromium window.
    #[arg(long, overrides_with = "headless")]
    pub headed: bool,

    /// Walk every result page.
    #[arg(long, overrides_with = "first_page_only")]
    pub all_pages: bool,

    /// Only read the first result page of each currency.
    #[arg(long, overrides_with = "all_pages")]
    pub first_page_only: bool,

    /// Keep going when one currency fails.
    #[arg(long)]
    pub continue_on_error: bool,

    /// Retries allowed per search or page recovery.
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

impl ScrapeArgs {
    /// Settings with this command's flags applied on top.
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if self.headless {
            settings.headless = true;
        }
        if self.headed {
            settings.headless = false;
        }
        if self.all_pages {
            settings.search_all_pages = true;
        }
        if self.first_page_only {
            settings.search_all_pages = false;
        }
        if self.continue_on_error {
            settings.failure_policy = FailurePolicy::Continue;
        }
        if let Some(max) = self.max_attempts {
            settings.retry.max_attempts = max;
        }
        settings
    }
}

pub async fn run(args: ScrapeArgs, ctx: &CliContext) -> Result<RunSummary> {
    let settings = args.apply(ctx.settings.clone());
    let today = chrono::Local::now().date_naive();
    let config = settings.scrape_config(today, args.from, args.to)?;
    tracing::info!(
        from = %config.start_date,
        to = %config.end_date,
        output = %settings.output_dir.display(),
        "Starting scrape"
    );

    let sink = TextFileSink::create(
        &settings.output_dir,
        config.layout.columns,
        config.layout.no_data_sentinel.clone(),
    )?;
    let driver = ChromiumDriver::launch(BrowserOptions::from(&settings)).await?;

    let (tx, rx) = progress::channel();
    let printer = output::spawn_printer(rx, ctx.output);
    let run_id = format!("run-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S"));

    let mut orchestrator = Orchestrator::new(driver, config, sink)
        .with_cancellation(ctx.cancel.clone())
        .with_progress(tx, run_id);
    let result = orchestrator.run().await;

    let (driver, _) = orchestrator.into_parts();
    if let Err(e) = driver.close().await {
        tracing::warn!("Closing Chromium failed: {e:#}");
    }
    let _ = printer.await;

    let summary = result?;
    for failure in &summary.failed {
        eprintln!("Failed: {}: {}", failure.currency, failure.error);
    }
    Ok(summary)
}
