//! Page driver abstraction for a single browser tab.
//!
//! Defines the `PageDriver` trait the extraction engine is written against.
//! The concrete Chromium implementation lives in the CLI crate; tests use a
//! scripted in-memory site.
//!
//! Every operation may suspend until the page responds. Waits are bounded by
//! the driver and fail with [`DriverError::Timeout`](crate::DriverError).
//! Callers never assume immediate consistency: after any navigation-triggering
//! click or select they wait for a known content marker again.

use crate::error::DriverResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How to find elements on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "query", rename_all = "snake_case")]
pub enum Locator {
    /// A CSS selector.
    Css(String),
    /// An XPath expression.
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css `{s}`"),
            Self::XPath(s) => write!(f, "xpath `{s}`"),
        }
    }
}

/// Options for a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOptions {
    /// Number of consecutive clicks. Three clicks select a text field's content.
    pub click_count: u8,
}

impl ClickOptions {
    /// Triple click, selecting all existing content of a text field.
    pub fn select_all() -> Self {
        Self { click_count: 3 }
    }
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self { click_count: 1 }
    }
}

/// A single browser tab the engine drives.
///
/// Operations are issued strictly sequentially; the engine never has two
/// requests in flight against the same tab.
#[async_trait]
pub trait PageDriver: Send {
    /// Load a URL in the tab.
    async fn navigate(&mut self, url: &str) -> DriverResult<()>;
    /// Block until at least one element matches, or time out.
    async fn wait_for(&mut self, locator: &Locator) -> DriverResult<()>;
    /// Click the first element matching a CSS selector.
    async fn click(&mut self, selector: &str, options: ClickOptions) -> DriverResult<()>;
    /// Type text into the element matching a CSS selector.
    async fn type_text(&mut self, selector: &str, text: &str) -> DriverResult<()>;
    /// Choose an option of a `<select>` by value.
    async fn select_option(&mut self, selector: &str, value: &str) -> DriverResult<()>;
    /// Inner HTML of every matching element. Empty when nothing matches.
    async fn extract_text(&mut self, locator: &Locator) -> DriverResult<Vec<String>>;
    /// A DOM property (e.g. `value`) of every matching element. Empty when nothing matches.
    async fn extract_property(
        &mut self,
        locator: &Locator,
        property: &str,
    ) -> DriverResult<Vec<String>>;
}
