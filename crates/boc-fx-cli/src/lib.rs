//! boc-fx command-line front-end: settings, the Chromium page driver and the
//! subcommands of the `boc-fx` binary.

pub mod cli;
pub mod config;
pub mod renderer;

pub use config::{resolve_config_path, Settings};
pub use renderer::ChromiumDriver;
