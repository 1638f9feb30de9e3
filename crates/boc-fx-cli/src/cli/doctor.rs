//! Environment readiness check.

use super::{CliContext, OutputMode};
use crate::config::resolve_config_path;
use crate::renderer::find_chromium;
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What `doctor` found.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorReport {
    pub os: String,
    pub arch: String,
    pub config_file: Option<PathBuf>,
    pub chromium: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub output_dir_writable: bool,
}

impl DoctorReport {
    pub fn ready(&self) -> bool {
        self.chromium.is_some() && self.output_dir_writable
    }
}

/// Check Chromium availability and the output directory.
pub fn check(ctx: &CliContext, explicit_config: Option<&Path>) -> DoctorReport {
    let settings = &ctx.settings;
    DoctorReport {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        config_file: resolve_config_path(explicit_config),
        chromium: find_chromium(settings.chromium_path.as_deref()),
        output_dir: settings.output_dir.clone(),
        output_dir_writable: is_writable(&settings.output_dir),
    }
}

pub fn run(ctx: &CliContext, explicit_config: Option<&Path>) -> Result<bool> {
    let report = check(ctx, explicit_config);
    match ctx.output {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputMode::Quiet => {}
        OutputMode::Human => print_report(&report),
    }
    Ok(report.ready())
}

fn print_report(report: &DoctorReport) {
    println!("boc-fx Doctor");
    println!("=============");
    println!();
    println!("OS:   {}", report.os);
    println!("Arch: {}", report.arch);
    match &report.config_file {
        Some(path) => println!("Config: {}", path.display()),
        None => println!("Config: built-in defaults"),
    }
    println!();

    match &report.chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install Chrome or Chromium, or set BOCFX_CHROMIUM_PATH."
        ),
    }
    if report.output_dir_writable {
        println!(
            "[OK] Output directory is writable: {}",
            report.output_dir.display()
        );
    } else {
        println!(
            "[!!] Output directory is not writable: {}",
            report.output_dir.display()
        );
    }

    println!();
    if report.ready() {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }
}

/// Whether files can be created in `dir`, creating it if needed.
fn is_writable(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(format!(".boc-fx-probe-{}", std::process::id()));
    match std::fs::write(&probe, b"") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}
