//! Search executor: submit one query and classify the result page.

use crate::driver::{ClickOptions, Locator, PageDriver};
use crate::error::ScrapeResult;
use crate::model::{Query, SearchOutcome};
use crate::progress::ProgressEventKind;
use crate::session::Session;

/// Issues queries against the search form.
pub struct SearchExecutor<'s, D> {
    session: &'s mut Session<D>,
}

impl<'s, D: PageDriver> SearchExecutor<'s, D> {
    pub fn new(session: &'s mut Session<D>) -> Self {
        Self { session }
    }

    /// Fill the form, submit, and classify the outcome.
    ///
    /// A rejected search is resubmitted unchanged until the site accepts it,
    /// so the result is never [`SearchOutcome::Rejected`]. The retries are
    /// bounded by the session's retry policy.
    pub async fn execute(&mut self, query: &Query) -> ScrapeResult<SearchOutcome> {
        tracing::info!(
            currency = %query.currency,
            from = %query.start_text(),
            to = %query.end_text(),
            "Submitting search"
        );
        self.session.emit(ProgressEventKind::SearchStarted {
            currency: query.currency.clone(),
        });

        self.fill_form(query).await?;
        self.session.resubmit().await?;

        let mut attempts = self
            .session
            .attempts(format!("search for {}", query.currency));
        loop {
            match self.classify().await? {
                SearchOutcome::Rejected => {
                    attempts.next().await?;
                    tracing::warn!(
                        currency = %query.currency,
                        attempt = attempts.used(),
                        "Search rejected, resubmitting"
                    );
                    self.session.emit(ProgressEventKind::SearchRejected {
                        currency: query.currency.clone(),
                        attempt: attempts.used(),
                    });
                    self.session.resubmit().await?;
                }
                outcome => {
                    self.session.emit(ProgressEventKind::SearchCompleted {
                        currency: query.currency.clone(),
                        has_data: outcome == SearchOutcome::DataAvailable,
                    });
                    return Ok(outcome);
                }
            }
        }
    }

    /// Inspect the rendered result page.
    pub async fn classify(&mut self) -> ScrapeResult<SearchOutcome> {
        if self.session.is_rejected().await? {
            Ok(SearchOutcome::Rejected)
        } else if self.session.has_no_records().await? {
            Ok(SearchOutcome::NoData)
        } else {
            Ok(SearchOutcome::DataAvailable)
        }
    }

    async fn fill_form(&mut self, query: &Query) -> ScrapeResult<()> {
        let layout = self.session.layout().clone();
        self.replace_text(&layout.start_date_input, &query.start_text())
            .await?;
        self.replace_text(&layout.end_date_input, &query.end_text())
            .await?;

        let driver = self.session.driver_mut();
        driver
            .wait_for(&Locator::css(layout.currency_select.clone()))
            .await?;
        driver
            .select_option(&layout.currency_select, &query.currency)
            .await?;
        Ok(())
    }

    /// Select whatever the field holds and type over it.
    async fn replace_text(&mut self, selector: &str, text: &str) -> ScrapeResult<()> {
        let driver = self.session.driver_mut();
        driver.wait_for(&Locator::css(selector.to_string())).await?;
        driver.click(selector, ClickOptions::select_all()).await?;
        driver.type_text(selector, text).await?;
        Ok(())
    }
}
