//! Progress narration on stdout.

use boc_fx::progress::{ProgressEvent, ProgressReceiver};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// How a command reports to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Narration sentences.
    #[default]
    Human,
    /// One JSON object per line.
    Json,
    /// Nothing but errors (on stderr).
    Quiet,
}

impl OutputMode {
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if json {
            Self::Json
        } else {
            Self::Human
        }
    }
}

/// Render one event for the given mode; `None` when nothing should be printed.
pub fn format_event(event: &ProgressEvent, mode: OutputMode) -> Option<String> {
    match mode {
        OutputMode::Human => Some(event.event.to_string()),
        OutputMode::Json => serde_json::to_string(event).ok(),
        OutputMode::Quiet => None,
    }
}

/// Print events until every sender is gone.
pub fn spawn_printer(mut rx: ProgressReceiver, mode: OutputMode) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(line) = format_event(&event, mode) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Progress output fell behind, {skipped} events skipped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
