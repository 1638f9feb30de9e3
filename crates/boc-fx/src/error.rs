//! Error taxonomy for the extraction engine.
//!
//! Driver-level failures (`DriverError`) come from the page automation
//! collaborator. Everything the engine itself can fail with is a
//! `ScrapeError`; `FailureKind` groups those into the classes the process
//! reports through its exit status.

use crate::driver::Locator;

/// Failures raised by a [`PageDriver`](crate::driver::PageDriver).
#[derive(thiserror::Error, Debug)]
pub enum DriverError {
    #[error("Timed out after {timeout_ms}ms waiting for {locator}")]
    Timeout { locator: Locator, timeout_ms: u64 },

    #[error("Element not found: {locator}")]
    ElementNotFound { locator: Locator },

    #[error("Script error: {0}")]
    Script(String),

    #[error("Navigation error: {0}")]
    Navigation(String),
}

/// All errors that can end the extraction of a currency or a whole run.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("No currencies available")]
    NoCurrencies,

    #[error("Could not find number of pages for current currency")]
    MissingPageCount,

    #[error("Page count is not a number: {0:?}")]
    MalformedPageCount(String),

    #[error("Page {page} yielded {cells} cells, not a whole number of rows")]
    MalformedRows { page: u32, cells: usize },

    #[error("Result header has {fields} fields, expected at least 7")]
    MalformedHeader { fields: usize },

    #[error("Site kept rejecting requests during {during} ({attempts} attempts)")]
    RecoveryExhausted { during: String, attempts: u32 },

    #[error("Extraction cancelled")]
    Cancelled,

    #[error("Page {got} collected out of order, expected page {expected}")]
    PageOrder { expected: u32, got: u32 },

    #[error("Search for {currency} ended while the site still rejected it")]
    UnsettledSearch { currency: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used for reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Structural,
    RecoveryExhausted,
    Cancelled,
    Driver,
    Io,
    Internal,
}

impl FailureKind {
    /// Process exit status for a run that ended with this kind of failure.
    pub fn exit_code(self) -> i32 {
        match self {
            FailureKind::Driver | FailureKind::Internal => 1,
            FailureKind::Structural => 2,
            FailureKind::Timeout => 3,
            FailureKind::RecoveryExhausted => 4,
            FailureKind::Io => 5,
            FailureKind::Cancelled => 130,
        }
    }
}

impl ScrapeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ScrapeError::Driver(DriverError::Timeout { .. }) => FailureKind::Timeout,
            ScrapeError::Driver(_) => FailureKind::Driver,
            ScrapeError::NoCurrencies
            | ScrapeError::MissingPageCount
            | ScrapeError::MalformedPageCount(_)
            | ScrapeError::MalformedRows { .. }
            | ScrapeError::MalformedHeader { .. } => FailureKind::Structural,
            ScrapeError::RecoveryExhausted { .. } => FailureKind::RecoveryExhausted,
            ScrapeError::Cancelled => FailureKind::Cancelled,
            ScrapeError::PageOrder { .. } | ScrapeError::UnsettledSearch { .. } => {
                FailureKind::Internal
            }
            ScrapeError::Io(_) => FailureKind::Io,
        }
    }
}

pub type DriverResult<T> = Result<T, DriverError>;
pub type ScrapeResult<T> = Result<T, ScrapeError>;
