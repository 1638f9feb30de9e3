//! Browser side of the scraper: locating and driving Chromium.

pub mod chromium;
pub mod scripts;

pub use chromium::ChromiumDriver;

use crate::config::Settings;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing at a Chromium binary.
pub const CHROMIUM_ENV: &str = "BOCFX_CHROMIUM_PATH";

/// How to launch and pace the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    pub headless: bool,
    pub chromium_path: Option<PathBuf>,
    pub wait_timeout: Duration,
    pub settle: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for BrowserOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            headless: settings.headless,
            chromium_path: settings.chromium_path.clone(),
            wait_timeout: Duration::from_millis(settings.wait_timeout_ms),
            settle: Duration::from_millis(settings.settle_ms),
        }
    }
}

/// Find the Chromium binary path.
///
/// Checks `BOCFX_CHROMIUM_PATH`, then the configured path, then the usual
/// binary names on `PATH` and the standard macOS install location.
pub fn find_chromium(configured: Option<&Path>) -> Option<PathBuf> {
    if let Ok(p) = std::env::var(CHROMIUM_ENV) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(path) = configured {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}
