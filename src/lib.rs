//! # update-notifier
//!
//! A Rust library that tells desktop app users when a newer release is available.
//!
//! It decides whether a check should run, fetches the latest version once per
//! process, asks the user whether to download it, and records the answer.
//! Rendering the prompt, opening links, persisting settings and analytics are
//! supplied by the host through small traits.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use update_notifier::*;
//!
//! fn main() -> update_notifier::Result<()> {
//!     let config = NotifierConfig {
//!         latest_version_url: "https://example.com/latest.json".to_string(),
//!         download_url: "https://example.com/download".to_string(),
//!         ..NotifierConfig::default()
//!     };
//!
//!     let settings: Arc<dyn SettingsStore> =
//!         Arc::new(FileSettings::in_temp_dir("my_app_updates.bin"));
//!     let fetcher = Arc::new(LatestVersionFetcher::from_manifest(
//!         &StaticManifest::from_version(env!("CARGO_PKG_VERSION")),
//!         &config.latest_version_url,
//!         Arc::new(HttpTransport::new(&config)),
//!     )?);
//!
//!     let scheduler = UpdateScheduler::new(&config, settings.clone());
//!     let notifier = UpdateNotifier::new(
//!         config,
//!         fetcher,
//!         settings,
//!         Host {
//!             prompt: Arc::new(ConsolePrompt),
//!             links: Arc::new(SystemLinkOpener),
//!             analytics: Arc::new(TracingAnalytics),
//!         },
//!     );
//!
//!     // Your application code here...
//!     notifier.check_for_updates(&scheduler)?;
//!     Ok(())
//! }
//! ```
//!
//! # Snoozing
//!
//! The prompt carries a "Don't remind me again" checkbox. Ticking it sets
//! `sleepUpdateCheck` in the settings store, and [`UpdateScheduler`] then
//! declines scheduled checks until the snooze window (7 days by default)
//! has passed. Showing a prompt always resets the flag first.
//!
//! # Network failures
//!
//! When the version endpoint cannot be reached at all, the current version
//! is treated as the latest, so the user is never bothered. HTTP errors and
//! malformed payloads are returned as [`Error::Fetch`] and
//! [`Error::InvalidVersion`].
//!

mod config;
mod error;
mod fetcher;
mod host;
mod notifier;
mod scheduler;
mod settings;
mod version;

pub use config::{DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SLEEP_WINDOW_MS, NotifierConfig};
pub use error::{Error, Result, TransportError, UNSUCCESSFUL_REQUEST};
pub use fetcher::{
    HttpTransport, LatestVersionFetcher, ManifestProvider, StaticManifest, Transport, VersionPayload,
};
pub use host::{
    AnalyticsSink, ChoiceDialogOptions, ChoiceDialogResponse, ConsolePrompt, LinkOpener,
    PromptCollaborator, SystemLinkOpener, TracingAnalytics,
};
pub use notifier::{
    DOWNLOAD_INDEX, DOWNLOAD_LABEL, Host, NOTIFY_EVENT, NotifyOutcome, SKIP_INDEX, SKIP_LABEL,
    UpdateNotifier,
};
pub use scheduler::{Clock, SchedulerState, SystemClock, UpdateScheduler};
pub use settings::{
    FileSettings, LAST_UPDATE_NOTIFY, MemorySettings, SLEEP_UPDATE_CHECK, SettingValue,
    SettingsStore,
};
pub use version::{Version, is_at_least};
