//! Pagination with recovery from rejected page changes.
//!
//! Collecting a multi-page result set is a small state machine over a
//! [`PageState`]:
//!
//! - **Collecting**: extract the displayed page and append it. Done after the
//!   last page, otherwise advance.
//! - **Advancing**: click "next" and check the result. Accepted moves to the
//!   next page; rejected starts recovering towards that page.
//! - **Recovering(target)**: resubmit until the rejected marker clears, read
//!   the rendered page links, jump to the largest link not beyond `target`
//!   and walk forward one page at a time, checking every step. When page 1
//!   is the anchor but no link to it is rendered, the UI may sit anywhere
//!   past the target, so the search is submitted again to get back to page
//!   1. Any rejection restarts recovery from scratch.
//!
//! Errors from the driver end the machine (the failed state) and are returned
//! to the caller. A page is appended only once its position is confirmed, so
//! recovery never duplicates or skips rows.

use crate::driver::PageDriver;
use crate::error::{ScrapeError, ScrapeResult};
use crate::model::{
    parse_page_links, AnchorRoute, CurrencyRows, PageState, RecoveryTarget, RowBatch,
};
use crate::progress::ProgressEventKind;
use crate::retry::{ensure_not_cancelled, Attempts};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Collecting,
    Advancing,
    Recovering { target: u32 },
}

/// Where a successful recovery left the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Landing {
    /// On the page before the target; the target still needs a confirmed advance.
    BeforeTarget,
    /// The anchor link was the target itself.
    OnTarget,
}

/// Collects the rows of the currently displayed result set.
pub struct Paginator<'s, D> {
    session: &'s mut Session<D>,
    currency: String,
}

impl<'s, D: PageDriver> Paginator<'s, D> {
    pub fn new(session: &'s mut Session<D>, currency: impl Into<String>) -> Self {
        Self {
            session,
            currency: currency.into(),
        }
    }

    /// Only the page currently displayed.
    pub async fn collect_first(&mut self) -> ScrapeResult<CurrencyRows> {
        let mut rows = CurrencyRows::new(self.session.layout().columns);
        // Only narrated here, so a missing page count is not an error.
        let total = self.read_total_pages().await.ok();
        let batch = self.extract_page(1).await?;
        self.record(&batch, total);
        rows.push(batch)?;
        Ok(rows)
    }

    /// Every page, 1 through the site's page count.
    pub async fn collect_all(&mut self) -> ScrapeResult<CurrencyRows> {
        let total = self.read_total_pages().await?;
        tracing::info!(currency = %self.currency, total, "Collecting all result pages");

        let mut state = PageState::new(total);
        let mut rows = CurrencyRows::new(self.session.layout().columns);
        let mut phase = Phase::Collecting;
        // Retry budget of the page currently being reached; reset once it is collected.
        let mut budget: Option<Attempts> = None;

        loop {
            phase = match phase {
                Phase::Collecting => {
                    let batch = self.extract_page(state.current()).await?;
                    self.record(&batch, Some(total));
                    rows.push(batch)?;
                    budget = None;
                    if state.is_last() {
                        return Ok(rows);
                    }
                    Phase::Advancing
                }
                Phase::Advancing => {
                    let Some(target) = state.next_page() else {
                        return Ok(rows);
                    };
                    ensure_not_cancelled(self.session.cancel_token())?;
                    let next = self.session.layout().next_page_button.clone();
                    self.session.click(&next).await?;
                    if self.session.is_rejected().await? {
                        tracing::warn!(currency = %self.currency, target, "Page change rejected");
                        self.session.emit(ProgressEventKind::AdvanceRejected {
                            currency: self.currency.clone(),
                            target,
                        });
                        Phase::Recovering { target }
                    } else {
                        state.advance();
                        Phase::Collecting
                    }
                }
                Phase::Recovering { target } => {
                    let during = format!("recovery of page {target} for {}", self.currency);
                    let attempts = budget.get_or_insert_with(|| self.session.attempts(during));
                    match self.recover(target, total, attempts).await? {
                        Landing::BeforeTarget => Phase::Advancing,
                        Landing::OnTarget => {
                            state.advance();
                            Phase::Collecting
                        }
                    }
                }
            };
        }
    }

    /// Bring the UI back next to `target` after a rejected page change.
    async fn recover(
        &mut self,
        target: u32,
        total: u32,
        attempts: &mut Attempts,
    ) -> ScrapeResult<Landing> {
        let layout = self.session.layout().clone();
        loop {
            while self.session.is_rejected().await? {
                attempts.next().await?;
                self.session.resubmit().await?;
            }

            self.session
                .driver_mut()
                .wait_for(&layout.page_links_container())
                .await?;
            let labels = self.session.texts(&layout.page_links()).await?;
            let links = parse_page_links(&labels);
            let recovery = RecoveryTarget::select(&links, target);
            tracing::debug!(
                currency = %self.currency,
                target,
                anchor = recovery.anchor,
                ?links,
                "Recovery anchor selected"
            );
            self.session.emit(ProgressEventKind::RecoveryAnchor {
                currency: self.currency.clone(),
                target,
                anchor: recovery.anchor,
            });

            if self.reach_anchor(&recovery, total).await? {
                if recovery.lands_on_target() {
                    return Ok(Landing::OnTarget);
                }
                if self.walk(recovery.anchor, target - 1).await? {
                    return Ok(Landing::BeforeTarget);
                }
            }

            tracing::warn!(
                currency = %self.currency,
                target,
                attempt = attempts.used(),
                "Recovery attempt rejected, starting over"
            );
            self.session.emit(ProgressEventKind::RecoveryRestarted {
                currency: self.currency.clone(),
                target,
                attempt: attempts.used(),
            });
        }
    }

    /// Put the UI on the anchor page. False when the site rejected the move.
    async fn reach_anchor(&mut self, recovery: &RecoveryTarget, total: u32) -> ScrapeResult<bool> {
        match recovery.route() {
            AnchorRoute::Link => {
                let link = self.session.layout().page_link(recovery.anchor, total);
                self.session.click(&link).await?;
            }
            AnchorRoute::FreshSearch => {
                tracing::debug!(
                    currency = %self.currency,
                    target = recovery.target,
                    "No rendered link at or below target, searching again"
                );
                self.session.resubmit().await?;
            }
        }
        Ok(!self.session.is_rejected().await?)
    }

    /// Single-step from `from` to `to` with "next". False if any step was rejected.
    async fn walk(&mut self, from: u32, to: u32) -> ScrapeResult<bool> {
        let next = self.session.layout().next_page_button.clone();
        let mut position = from;
        while position < to {
            ensure_not_cancelled(self.session.cancel_token())?;
            self.session.click(&next).await?;
            if self.session.is_rejected().await? {
                return Ok(false);
            }
            position += 1;
        }
        Ok(true)
    }

    async fn read_total_pages(&mut self) -> ScrapeResult<u32> {
        let locator = self.session.layout().page_count();
        let texts = self.session.texts(&locator).await?;
        let first = texts.first().ok_or(ScrapeError::MissingPageCount)?;
        match first.trim().parse::<u32>() {
            Ok(total) if total >= 1 => Ok(total),
            _ => Err(ScrapeError::MalformedPageCount(first.clone())),
        }
    }

    async fn extract_page(&mut self, page: u32) -> ScrapeResult<RowBatch> {
        let locator = self.session.layout().row_cells();
        let cells = self.session.texts(&locator).await?;
        Ok(RowBatch { page, cells })
    }

    fn record(&mut self, batch: &RowBatch, total: Option<u32>) {
        tracing::debug!(
            currency = %self.currency,
            page = batch.page,
            cells = batch.cells.len(),
            "Page collected"
        );
        self.session.emit(ProgressEventKind::PageCollected {
            currency: self.currency.clone(),
            page: batch.page,
            total,
            cells: batch.cells.len(),
        });
    }
}
