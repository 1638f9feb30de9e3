//! boc-fx: extraction engine for the Bank of China exchange rate history.
//!
//! Drives a single browser tab through search, pagination and recovery from
//! the site's spurious rejections, then hands per-currency rows to an output
//! sink. The browser itself sits behind the [`PageDriver`] trait.

pub mod driver;
pub mod error;
pub mod layout;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod pagination;
pub mod progress;
pub mod retry;
pub mod search;
pub mod session;

pub use driver::{ClickOptions, Locator, PageDriver};
pub use error::{DriverError, DriverResult, FailureKind, ScrapeError, ScrapeResult};
pub use layout::{SiteLayout, COLUMN_COUNT};
pub use model::*;
pub use orchestrator::{CurrencyFailure, FailurePolicy, Orchestrator, RunSummary, ScrapeConfig};
pub use output::{MemorySink, ResultSink, TextFileSink};
pub use pagination::Paginator;
pub use retry::RetryPolicy;
pub use search::SearchExecutor;
pub use session::Session;
pub use tokio_util::sync::CancellationToken;
