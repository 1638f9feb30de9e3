//! Core data types for queries, page positions and extracted rows.

use crate::error::{ScrapeError, ScrapeResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used by the search form and by output file names.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One search request: a date range and a currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub currency: String,
}

impl Query {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, currency: impl Into<String>) -> Self {
        Self {
            start_date,
            end_date,
            currency: currency.into(),
        }
    }

    pub fn start_text(&self) -> String {
        self.start_date.format(DATE_FORMAT).to_string()
    }

    pub fn end_text(&self) -> String {
        self.end_date.format(DATE_FORMAT).to_string()
    }
}

/// Classification of a result page after a submitted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutcome {
    /// The site refused the last action and shows its "wrong search word" message.
    Rejected,
    NoData,
    DataAvailable,
}

/// Position within a multi-page result set.
///
/// `current` is the last page whose rows were confirmed. It only moves
/// forward, one page at a time, and never past `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    current: u32,
    total: u32,
}

impl PageState {
    /// Start on page 1 of `total` pages. `total` must be at least 1.
    pub fn new(total: u32) -> Self {
        debug_assert!(total >= 1);
        Self { current: 1, total }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn is_last(&self) -> bool {
        self.current >= self.total
    }

    /// The page the engine moves to next, if any.
    pub fn next_page(&self) -> Option<u32> {
        (!self.is_last()).then_some(self.current + 1)
    }

    /// Move to the next page. Returns false (and stays put) on the last page.
    pub fn advance(&mut self) -> bool {
        match self.next_page() {
            Some(next) => {
                self.current = next;
                true
            }
            None => false,
        }
    }
}

/// Where recovery restarts its forward walk.
///
/// `anchor` is the largest rendered page link not beyond `target`, or 1 when
/// no rendered link qualifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryTarget {
    pub anchor: u32,
    pub target: u32,
    /// The anchor's page link is rendered and can be clicked.
    pub linked: bool,
}

/// How recovery gets the UI onto the anchor page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorRoute {
    /// Click the anchor's page link.
    Link,
    /// Page 1 is not linked from wherever the UI was left; search again.
    FreshSearch,
}

impl RecoveryTarget {
    pub fn select(links: &[u32], target: u32) -> Self {
        let anchor = links
            .iter()
            .copied()
            .filter(|&page| page <= target)
            .max()
            .unwrap_or(1)
            .max(1);
        Self {
            anchor,
            target,
            linked: links.contains(&anchor),
        }
    }

    pub fn route(&self) -> AnchorRoute {
        if self.linked {
            AnchorRoute::Link
        } else {
            AnchorRoute::FreshSearch
        }
    }

    /// The anchor is the target itself.
    pub fn lands_on_target(&self) -> bool {
        self.anchor == self.target
    }
}

/// Parse rendered page-link labels, skipping anything that is not a page number.
pub fn parse_page_links(labels: &[String]) -> Vec<u32> {
    labels
        .iter()
        .filter_map(|label| label.trim().parse::<u32>().ok())
        .collect()
}

/// Table cells extracted from one result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowBatch {
    pub page: u32,
    pub cells: Vec<String>,
}

/// Row batches of one currency, in page order.
///
/// Exactly one batch per confirmed page, pages 1..k ascending with no gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRows {
    columns: usize,
    batches: Vec<RowBatch>,
}

impl CurrencyRows {
    pub fn new(columns: usize) -> Self {
        Self {
            columns,
            batches: Vec::new(),
        }
    }

    /// Append the batch for the next page.
    pub fn push(&mut self, batch: RowBatch) -> ScrapeResult<()> {
        let expected = self.batches.len() as u32 + 1;
        if batch.page != expected {
            return Err(ScrapeError::PageOrder {
                expected,
                got: batch.page,
            });
        }
        if self.columns == 0 || batch.cells.len() % self.columns != 0 {
            return Err(ScrapeError::MalformedRows {
                page: batch.page,
                cells: batch.cells.len(),
            });
        }
        self.batches.push(batch);
        Ok(())
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn batches(&self) -> &[RowBatch] {
        &self.batches
    }

    /// Number of confirmed pages.
    pub fn page_count(&self) -> usize {
        self.batches.len()
    }

    pub fn cell_count(&self) -> usize {
        self.batches.iter().map(|b| b.cells.len()).sum()
    }

    /// All rows across pages, in order.
    pub fn rows(&self) -> impl Iterator<Item = &[String]> + '_ {
        let columns = self.columns.max(1);
        self.batches.iter().flat_map(move |b| b.cells.chunks(columns))
    }
}

/// What was found for one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CurrencyResult {
    Records {
        header: Vec<String>,
        rows: CurrencyRows,
    },
    NoRecords,
}

/// A finished extraction, ready for the output sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub query: Query,
    pub result: CurrencyResult,
}
