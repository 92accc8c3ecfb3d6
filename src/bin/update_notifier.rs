//! Command-line front end: runs one scheduled update check in the terminal.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use update_notifier::{
    ConsolePrompt, FileSettings, Host, HttpTransport, LatestVersionFetcher, NotifierConfig,
    SettingsStore, StaticManifest, SystemLinkOpener, TracingAnalytics, UpdateNotifier,
    UpdateScheduler,
};

#[derive(Debug, Parser)]
#[command(name = "update-notifier", version, about = "Check for a newer release and offer to download it")]
struct Cli {
    /// Version of the application being checked
    #[arg(long)]
    current_version: String,

    /// Endpoint returning the latest version as JSON
    #[arg(long)]
    url: String,

    /// Page opened when the user chooses to download
    #[arg(long)]
    download_url: String,

    /// Settings file holding the snooze state
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Prompt even when checks are snoozed
    #[arg(long)]
    force: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("update_notifier=debug,analytics=info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("update_notifier=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> update_notifier::Result<()> {
    let config = NotifierConfig {
        latest_version_url: cli.url,
        download_url: cli.download_url,
        ..NotifierConfig::default()
    };

    let settings: Arc<dyn SettingsStore> = Arc::new(match cli.settings {
        Some(path) => FileSettings::open(path),
        None => FileSettings::in_temp_dir("update_notifier_settings.bin"),
    });

    let fetcher = Arc::new(LatestVersionFetcher::from_manifest(
        &StaticManifest::from_version(&cli.current_version),
        &config.latest_version_url,
        Arc::new(HttpTransport::new(&config)),
    )?);

    let scheduler = UpdateScheduler::new(&config, settings.clone());
    let notifier = UpdateNotifier::new(
        config,
        fetcher.clone(),
        settings,
        Host {
            prompt: Arc::new(ConsolePrompt),
            links: Arc::new(SystemLinkOpener),
            analytics: Arc::new(TracingAnalytics),
        },
    );

    let outcome = if cli.force {
        if fetcher.is_latest_version()? {
            None
        } else {
            Some(notifier.notify()?)
        }
    } else {
        notifier.check_for_updates(&scheduler)?
    };

    match outcome {
        Some(outcome) if outcome.agreed => println!("Opening the download page."),
        Some(_) => println!("Update skipped."),
        None => println!("No update to show (version {}).", fetcher.current_version()),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("update check failed: {e}");
            ExitCode::FAILURE
        }
    }
}
