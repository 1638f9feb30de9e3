//! `currencies`: list the currency codes offered by the search form.

use super::{CliContext, OutputMode};
use crate::renderer::{BrowserOptions, ChromiumDriver};
use anyhow::Result;
use boc_fx::{MemorySink, Orchestrator};

pub async fn run(ctx: &CliContext) -> Result<Vec<String>> {
    let today = chrono::Local::now().date_naive();
    let config = ctx.settings.scrape_config(today, None, None)?;
    let driver = ChromiumDriver::launch(BrowserOptions::from(&ctx.settings)).await?;

    let mut orchestrator = Orchestrator::new(driver, config, MemorySink::default())
        .with_cancellation(ctx.cancel.clone());
    let result = match orchestrator.open().await {
        Ok(()) => orchestrator.list_currencies().await,
        Err(e) => Err(e),
    };

    let (driver, _) = orchestrator.into_parts();
    if let Err(e) = driver.close().await {
        tracing::warn!("Closing Chromium failed: {e:#}");
    }

    let currencies = result?;
    if let Some(text) = render(&currencies, ctx.output)? {
        println!("{text}");
    }
    Ok(currencies)
}

/// Text printed for the listed codes.
pub fn render(currencies: &[String], mode: OutputMode) -> Result<Option<String>> {
    Ok(match mode {
        OutputMode::Human => Some(currencies.join("\n")),
        OutputMode::Json => Some(serde_json::to_string_pretty(currencies)?),
        OutputMode::Quiet => None,
    })
}
