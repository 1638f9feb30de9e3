//! boc-fx: Bank of China exchange rate history scraper, entry point.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use boc_fx::CancellationToken;
use boc_fx_cli::cli::scrape::{self, ScrapeArgs};
use boc_fx_cli::cli::{currencies, doctor, exit_code_for, CliContext, OutputMode};
use boc_fx_cli::config::Settings;

#[derive(Parser)]
#[command(
    name = "boc-fx",
    about = "Download Bank of China foreign exchange rate history, one file per currency",
    version
)]
struct Cli {
    /// Print progress and results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Print nothing but errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Path to a JSON settings file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every currency and write one file each (default).
    Scrape(ScrapeArgs),

    /// List the currency codes offered by the search form.
    Currencies,

    /// Check Chromium and the output directory.
    Doctor,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   boc-fx completions bash > ~/.local/share/bash-completion/completions/boc-fx
    ///   boc-fx completions zsh > ~/.zfunc/_boc-fx
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "boc-fx", &mut std::io::stdout());
        return Ok(0);
    }

    let settings = Settings::resolve(cli.config.as_deref())?;
    let cancel = CancellationToken::new();
    let ctx = CliContext {
        settings,
        output: OutputMode::from_flags(cli.json, cli.quiet),
        cancel: cancel.clone(),
    };

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current step");
            cancel.cancel();
        }
    });

    match cli.command.unwrap_or(Commands::Scrape(ScrapeArgs::default())) {
        Commands::Scrape(args) => {
            let summary = scrape::run(args, &ctx).await?;
            Ok(summary
                .failure_kind()
                .map(|kind| kind.exit_code())
                .unwrap_or(0))
        }
        Commands::Currencies => {
            currencies::run(&ctx).await?;
            Ok(0)
        }
        Commands::Doctor => {
            let ready = doctor::run(&ctx, cli.config.as_deref())?;
            Ok(if ready { 0 } else { 1 })
        }
        Commands::Completions { .. } => Ok(0),
    }
}
