//! A driven browser tab together with everything needed to read it.
//!
//! `Session` owns the [`PageDriver`] for the lifetime of a run and offers the
//! small set of page checks shared by the search executor and the
//! pagination engine: wait for content, detect the rejected marker,
//! resubmit the search.

use crate::driver::{ClickOptions, Locator, PageDriver};
use crate::error::ScrapeResult;
use crate::layout::SiteLayout;
use crate::progress::{Narrator, ProgressEventKind};
use crate::retry::{Attempts, RetryPolicy};
use tokio_util::sync::CancellationToken;

/// Exclusive handle on the single browser tab of a run.
pub struct Session<D> {
    driver: D,
    layout: SiteLayout,
    retry: RetryPolicy,
    cancel: CancellationToken,
    narrator: Narrator,
}

impl<D: PageDriver> Session<D> {
    pub fn new(driver: D, layout: SiteLayout, retry: RetryPolicy) -> Self {
        Self {
            driver,
            layout,
            retry,
            cancel: CancellationToken::new(),
            narrator: Narrator::silent(),
        }
    }

    pub fn set_cancellation(&mut self, cancel: CancellationToken) {
        self.cancel = cancel;
    }

    pub fn set_narrator(&mut self, narrator: Narrator) {
        self.narrator = narrator;
    }

    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    pub fn emit(&mut self, event: ProgressEventKind) {
        self.narrator.emit(event);
    }

    /// Fresh retry budget for one episode.
    pub fn attempts(&self, during: impl Into<String>) -> Attempts {
        self.retry.attempts(during, &self.cancel)
    }

    /// Wait until a result page (of any outcome) is rendered.
    pub async fn wait_content(&mut self) -> ScrapeResult<()> {
        let marker = self.layout.content_marker();
        self.driver.wait_for(&marker).await?;
        Ok(())
    }

    /// Whether the rendered page carries the rejected marker.
    pub async fn is_rejected(&mut self) -> ScrapeResult<bool> {
        self.wait_content().await?;
        let marker = self.layout.rejected_marker();
        Ok(!self.driver.extract_text(&marker).await?.is_empty())
    }

    /// Whether the rendered page carries the no-records marker.
    pub async fn has_no_records(&mut self) -> ScrapeResult<bool> {
        self.wait_content().await?;
        let marker = self.layout.no_records_marker();
        Ok(!self.driver.extract_text(&marker).await?.is_empty())
    }

    /// Click the search button again with whatever the form holds.
    pub async fn resubmit(&mut self) -> ScrapeResult<()> {
        let button = self.layout.search_button.clone();
        self.click(&button).await
    }

    /// Wait for an element, then click it once.
    pub async fn click(&mut self, selector: &str) -> ScrapeResult<()> {
        self.driver
            .wait_for(&Locator::css(selector.to_string()))
            .await?;
        self.driver
            .click(selector, ClickOptions::default())
            .await?;
        Ok(())
    }

    /// Inner text of every element matching `locator`.
    pub async fn texts(&mut self, locator: &Locator) -> ScrapeResult<Vec<String>> {
        Ok(self.driver.extract_text(locator).await?)
    }
}
