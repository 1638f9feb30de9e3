//! Extraction orchestrator: every currency, one after another, through one tab.

use crate::driver::{Locator, PageDriver};
use crate::error::{FailureKind, ScrapeError, ScrapeResult};
use crate::layout::SiteLayout;
use crate::model::{CurrencyResult, Extraction, Query, SearchOutcome};
use crate::output::ResultSink;
use crate::pagination::Paginator;
use crate::progress::{Narrator, ProgressEventKind, ProgressSender};
use crate::retry::{ensure_not_cancelled, RetryPolicy};
use crate::search::SearchExecutor;
use crate::session::Session;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// What to do when one currency cannot be extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the whole run. Files already written stay in place.
    #[default]
    Abort,
    /// Record the failure and move on to the next currency.
    Continue,
}

/// Run configuration handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub layout: SiteLayout,
    /// Walk every result page instead of only the first.
    pub search_all_pages: bool,
    pub retry: RetryPolicy,
    pub failure_policy: FailurePolicy,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ScrapeConfig {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            layout: SiteLayout::default(),
            search_all_pages: true,
            retry: RetryPolicy::default(),
            failure_policy: FailurePolicy::default(),
            start_date,
            end_date,
        }
    }

    /// The last three days up to and including `today`.
    pub fn ending_on(today: NaiveDate) -> Self {
        let start = today.checked_sub_days(Days::new(2)).unwrap_or(today);
        Self::new(start, today)
    }

    pub fn query(&self, currency: &str) -> Query {
        Query::new(self.start_date, self.end_date, currency)
    }
}

/// A currency that could not be extracted in a run that continued past it.
#[derive(Debug)]
pub struct CurrencyFailure {
    pub currency: String,
    pub error: ScrapeError,
}

/// Outcome of a completed run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub currencies: usize,
    pub written: Vec<PathBuf>,
    pub failed: Vec<CurrencyFailure>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Kind of the first failure, if any currency failed.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failed.first().map(|f| f.error.kind())
    }
}

/// Drives searches and pagination for every currency and hands results to a sink.
pub struct Orchestrator<D, S> {
    session: Session<D>,
    config: ScrapeConfig,
    sink: S,
}

impl<D: PageDriver, S: ResultSink> Orchestrator<D, S> {
    pub fn new(driver: D, config: ScrapeConfig, sink: S) -> Self {
        let session = Session::new(driver, config.layout.clone(), config.retry);
        Self {
            session,
            config,
            sink,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.session.set_cancellation(cancel);
        self
    }

    pub fn with_progress(mut self, tx: ProgressSender, run_id: impl Into<String>) -> Self {
        self.session.set_narrator(Narrator::new(Some(tx), run_id));
        self
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    pub fn into_parts(self) -> (D, S) {
        (self.session.into_driver(), self.sink)
    }

    /// Load the search page.
    pub async fn open(&mut self) -> ScrapeResult<()> {
        let url = self.config.layout.url.clone();
        tracing::info!("Visiting {url}");
        self.session
            .emit(ProgressEventKind::RunStarted { url: url.clone() });
        self.session.driver_mut().navigate(&url).await?;
        Ok(())
    }

    /// Currency codes offered by the search form. Never empty.
    pub async fn list_currencies(&mut self) -> ScrapeResult<Vec<String>> {
        let layout = &self.config.layout;
        let select = Locator::css(layout.currency_select.clone());
        let options = layout.currency_options();

        let driver = self.session.driver_mut();
        driver.wait_for(&select).await?;
        let currencies: Vec<String> = driver
            .extract_property(&options, "value")
            .await?
            .into_iter()
            .filter(|value| !value.trim().is_empty())
            .collect();

        if currencies.is_empty() {
            return Err(ScrapeError::NoCurrencies);
        }
        tracing::info!(count = currencies.len(), "Currencies available");
        self.session.emit(ProgressEventKind::CurrenciesListed {
            count: currencies.len(),
        });
        Ok(currencies)
    }

    /// Search one currency and collect its rows (or the no-records result).
    pub async fn extract_currency(&mut self, currency: &str) -> ScrapeResult<Extraction> {
        let query = self.config.query(currency);
        let outcome = SearchExecutor::new(&mut self.session)
            .execute(&query)
            .await?;

        let result = match outcome {
            SearchOutcome::DataAvailable => {
                let header = self
                    .session
                    .texts(&self.config.layout.header_cells())
                    .await?;
                let mut paginator = Paginator::new(&mut self.session, currency);
                let rows = if self.config.search_all_pages {
                    paginator.collect_all().await?
                } else {
                    paginator.collect_first().await?
                };
                CurrencyResult::Records { header, rows }
            }
            SearchOutcome::NoData => CurrencyResult::NoRecords,
            SearchOutcome::Rejected => {
                return Err(ScrapeError::UnsettledSearch {
                    currency: currency.to_string(),
                })
            }
        };
        Ok(Extraction { query, result })
    }

    /// Open the site and extract every currency.
    ///
    /// With [`FailurePolicy::Abort`] the first failure ends the run with that
    /// error. With [`FailurePolicy::Continue`] failures are collected in the
    /// summary; cancellation always ends the run.
    pub async fn run(&mut self) -> ScrapeResult<RunSummary> {
        self.open().await?;
        let currencies = self.list_currencies().await?;

        let mut summary = RunSummary {
            currencies: currencies.len(),
            ..RunSummary::default()
        };

        for currency in &currencies {
            ensure_not_cancelled(self.session.cancel_token())?;

            match self.extract_and_write(currency).await {
                Ok(path) => summary.written.push(path),
                Err(error) => {
                    if matches!(error, ScrapeError::Cancelled)
                        || self.config.failure_policy == FailurePolicy::Abort
                    {
                        return Err(error);
                    }
                    tracing::warn!(%currency, "Extraction failed, continuing: {error}");
                    self.session.emit(ProgressEventKind::CurrencyFailed {
                        currency: currency.clone(),
                        message: error.to_string(),
                    });
                    summary.failed.push(CurrencyFailure {
                        currency: currency.clone(),
                        error,
                    });
                    // Start the next currency from a freshly loaded page.
                    self.open().await?;
                }
            }
        }

        self.session.emit(ProgressEventKind::RunFinished {
            written: summary.written.len(),
            failed: summary.failed.len(),
        });
        Ok(summary)
    }

    async fn extract_and_write(&mut self, currency: &str) -> ScrapeResult<PathBuf> {
        let extraction = self.extract_currency(currency).await?;
        let path = self.sink.write(&extraction)?;
        let rows = match &extraction.result {
            CurrencyResult::Records { rows, .. } => rows.rows().count(),
            CurrencyResult::NoRecords => 0,
        };
        self.session.emit(ProgressEventKind::CurrencyWritten {
            currency: currency.to_string(),
            path: path.display().to_string(),
            rows,
        });
        Ok(path)
    }
}
