//! Progress event types and broadcast channel for step-by-step narration.
//!
//! The engine emits `ProgressEvent`s while it searches, pages and recovers.
//! They flow through a `tokio::sync::broadcast` channel to every subscriber
//! (the CLI printer, JSON output). When no subscriber exists, events are
//! silently dropped.

use serde::{Deserialize, Serialize};

/// A progress event emitted during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The run this event belongs to.
    pub run_id: String,
    /// Monotonically increasing sequence number.
    pub seq: u64,
    /// The kind of progress event.
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// The search page is being opened.
    RunStarted { url: String },
    /// The currency list was read from the search form.
    CurrenciesListed { count: usize },
    /// A search for one currency was submitted.
    SearchStarted { currency: String },
    /// The site rejected a search; it is being resubmitted.
    SearchRejected { currency: String, attempt: u32 },
    /// A search was classified.
    SearchCompleted { currency: String, has_data: bool },
    /// Rows of one page were confirmed.
    PageCollected {
        currency: String,
        page: u32,
        /// Page count of the result set, when it was read.
        total: Option<u32>,
        cells: usize,
    },
    /// Moving to the next page was rejected.
    AdvanceRejected { currency: String, target: u32 },
    /// Recovery picked the page link it restarts from.
    RecoveryAnchor {
        currency: String,
        target: u32,
        anchor: u32,
    },
    /// A recovery attempt was abandoned and starts over.
    RecoveryRestarted {
        currency: String,
        target: u32,
        attempt: u32,
    },
    /// Results of one currency were written.
    CurrencyWritten {
        currency: String,
        path: String,
        rows: usize,
    },
    /// Extraction of one currency failed.
    CurrencyFailed { currency: String, message: String },
    /// The run finished.
    RunFinished { written: usize, failed: usize },
}

impl std::fmt::Display for ProgressEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RunStarted { url } => write!(f, "Visiting page: {url}..."),
            Self::CurrenciesListed { count } => write!(f, "Found {count} currencies"),
            Self::SearchStarted { currency } => {
                write!(f, "Searching records for currency: {currency}...")
            }
            Self::SearchRejected { currency, attempt } => write!(
                f,
                "Website isn't behaving as expected, retrying search for {currency} (attempt {attempt})..."
            ),
            Self::SearchCompleted { currency, has_data } => {
                if *has_data {
                    write!(f, "Searching finished, records found for {currency}")
                } else {
                    write!(f, "No records for currency: {currency}")
                }
            }
            Self::PageCollected {
                currency,
                page,
                total,
                cells,
            } => match total {
                Some(total) => write!(
                    f,
                    "Loaded page {page}/{total} for {currency} ({cells} cells)"
                ),
                None => write!(f, "Loaded page {page} for {currency} ({cells} cells)"),
            },
            Self::AdvanceRejected { currency, target } => write!(
                f,
                "Website isn't behaving as expected while opening page {target} for {currency}, recovering..."
            ),
            Self::RecoveryAnchor {
                currency,
                target,
                anchor,
            } => write!(
                f,
                "Recovering {currency}: walking from page {anchor} towards page {target}"
            ),
            Self::RecoveryRestarted {
                currency,
                target,
                attempt,
            } => write!(
                f,
                "Recovery towards page {target} for {currency} failed, starting over (attempt {attempt})"
            ),
            Self::CurrencyWritten {
                currency,
                path,
                rows,
            } => write!(f, "Wrote {rows} rows for {currency} to {path}"),
            Self::CurrencyFailed { currency, message } => {
                write!(f, "Extraction failed for {currency}: {message}")
            }
            Self::RunFinished { written, failed } => {
                write!(f, "Finished: {written} files written, {failed} currencies failed")
            }
        }
    }
}

/// Sender handle for emitting progress events.
pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a new progress broadcast channel with a bounded buffer.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Numbers and tags events for one run.
#[derive(Debug, Clone, Default)]
pub struct Narrator {
    tx: Option<ProgressSender>,
    run_id: String,
    seq: u64,
}

impl Narrator {
    pub fn new(tx: Option<ProgressSender>, run_id: impl Into<String>) -> Self {
        Self {
            tx,
            run_id: run_id.into(),
            seq: 0,
        }
    }

    /// A narrator that drops everything.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Emit an event, ignoring send errors (no receivers listening).
    pub fn emit(&mut self, event: ProgressEventKind) {
        if let Some(ref sender) = self.tx {
            self.seq += 1;
            let _ = sender.send(ProgressEvent {
                run_id: self.run_id.clone(),
                seq: self.seq,
                event,
            });
        }
    }
}
