//! CLI subcommand implementations for the boc-fx binary.

pub mod currencies;
pub mod doctor;
pub mod output;
pub mod scrape;

use crate::config::Settings;
use boc_fx::{CancellationToken, ScrapeError};

pub use output::OutputMode;

/// Shared state handed to every subcommand.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub settings: Settings,
    pub output: OutputMode,
    pub cancel: CancellationToken,
}

/// Exit status for an error that ended a command.
///
/// Engine errors map through their failure kind; anything else is 1.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ScrapeError>())
        .map(|e| e.kind().exit_code())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_code_for_engine_errors() {
        let err = anyhow::Error::new(ScrapeError::Cancelled);
        assert_eq!(exit_code_for(&err), 130);

        let err = anyhow::Error::new(ScrapeError::MissingPageCount);
        assert_eq!(exit_code_for(&err), 2);
    }

    #[test]
    fn test_exit_code_for_wrapped_error() {
        let err: anyhow::Result<()> = Err(ScrapeError::RecoveryExhausted {
            during: "search for USD".to_string(),
            attempts: 3,
        })
        .context("scrape failed");
        assert_eq!(exit_code_for(&err.unwrap_err()), 4);
    }

    #[test]
    fn test_exit_code_for_other_errors() {
        let err = anyhow::anyhow!("Chromium not found");
        assert_eq!(exit_code_for(&err), 1);
    }
}
