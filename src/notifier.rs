use humanly::HumanTime;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::NotifierConfig;
use crate::error::Result;
use crate::fetcher::LatestVersionFetcher;
use crate::host::{AnalyticsSink, ChoiceDialogOptions, LinkOpener, PromptCollaborator};
use crate::scheduler::{Clock, SystemClock, UpdateScheduler};
use crate::settings::SettingsStore;
use crate::version::Version;

/// Index of the "Download" button; also the default choice.
pub const DOWNLOAD_INDEX: usize = 0;
/// Index of the "Skip" button; also the cancel choice.
pub const SKIP_INDEX: usize = 1;

pub const DOWNLOAD_LABEL: &str = "Download";
pub const SKIP_LABEL: &str = "Skip";

/// Name of the analytics event emitted after every prompt.
pub const NOTIFY_EVENT: &str = "update_notification";

/// What the user chose in one notification cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyOutcome {
    /// The user picked "Download"
    pub agreed: bool,
    /// The user asked not to be reminded for the snooze window
    pub sleep_update_check: bool,
}

/// The collaborators the host application provides.
pub struct Host {
    pub prompt: Arc<dyn PromptCollaborator>,
    pub links: Arc<dyn LinkOpener>,
    pub analytics: Arc<dyn AnalyticsSink>,
}

/// Runs the prompt-and-record cycle for an available update.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use update_notifier::*;
///
/// let config = NotifierConfig {
///     latest_version_url: "https://example.com/latest.json".to_string(),
///     download_url: "https://example.com/download".to_string(),
///     ..NotifierConfig::default()
/// };
/// let settings: Arc<dyn SettingsStore> = Arc::new(FileSettings::in_temp_dir("my_app_updates.bin"));
/// let fetcher = Arc::new(LatestVersionFetcher::from_manifest(
///     &StaticManifest::from_version(env!("CARGO_PKG_VERSION")),
///     &config.latest_version_url,
///     Arc::new(HttpTransport::new(&config)),
/// )?);
/// let host = Host {
///     prompt: Arc::new(ConsolePrompt),
///     links: Arc::new(SystemLinkOpener),
///     analytics: Arc::new(TracingAnalytics),
/// };
///
/// let scheduler = UpdateScheduler::new(&config, settings.clone());
/// let notifier = UpdateNotifier::new(config, fetcher, settings, host);
///
/// if let Some(outcome) = notifier.check_for_updates(&scheduler)? {
///     println!("user agreed to download: {}", outcome.agreed);
/// }
/// # Ok::<(), update_notifier::Error>(())
/// ```
pub struct UpdateNotifier {
    config: NotifierConfig,
    fetcher: Arc<LatestVersionFetcher>,
    settings: Arc<dyn SettingsStore>,
    host: Host,
    clock: Arc<dyn Clock>,
}

impl UpdateNotifier {
    pub fn new(
        config: NotifierConfig,
        fetcher: Arc<LatestVersionFetcher>,
        settings: Arc<dyn SettingsStore>,
        host: Host,
    ) -> Self {
        Self::with_clock(config, fetcher, settings, host, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: NotifierConfig,
        fetcher: Arc<LatestVersionFetcher>,
        settings: Arc<dyn SettingsStore>,
        host: Host,
        clock: Arc<dyn Clock>,
    ) -> Self {
        UpdateNotifier {
            config,
            fetcher,
            settings,
            host,
            clock,
        }
    }

    /// Shows the update prompt for the latest version and records the answer.
    ///
    /// The snooze state is reset before the prompt is shown, so a prompt that
    /// fails or is dismissed abnormally still counts as a notification. A
    /// failed fetch returns before anything is written.
    ///
    /// Must not run concurrently with another `notify` on the same settings.
    pub fn notify(&self) -> Result<NotifyOutcome> {
        let latest = self.fetcher.latest_version()?;

        self.settings.set_last_update_notify(self.clock.now());
        self.settings.set_sleep_update_check(false);

        tracing::info!(%latest, current = %self.fetcher.current_version(), "showing update prompt");
        let response = self.host.prompt.show_choice_dialog(&self.dialog_options(&latest))?;

        let outcome = NotifyOutcome {
            agreed: response.selected_index == DOWNLOAD_INDEX,
            sleep_update_check: response.checkbox_checked,
        };

        self.settings.set_sleep_update_check(outcome.sleep_update_check);
        self.host.analytics.log_event(NOTIFY_EVENT, event_properties(&outcome, &latest));

        if outcome.agreed {
            self.host.links.open(&self.config.download_url);
        }

        tracing::info!(
            agreed = outcome.agreed,
            sleep_update_check = outcome.sleep_update_check,
            "update prompt answered"
        );
        Ok(outcome)
    }

    /// Runs a scheduled check: prompts only when checks are not snoozed and
    /// a newer version exists.
    ///
    /// Returns `Ok(None)` when no prompt was shown.
    pub fn check_for_updates(&self, scheduler: &UpdateScheduler) -> Result<Option<NotifyOutcome>> {
        if !scheduler.should_check_for_updates() {
            return Ok(None);
        }

        if self.fetcher.is_latest_version()? {
            tracing::debug!(current = %self.fetcher.current_version(), "already on the latest version");
            return Ok(None);
        }

        self.notify().map(Some)
    }

    fn dialog_options(&self, latest: &Version) -> ChoiceDialogOptions {
        ChoiceDialogOptions {
            buttons: [DOWNLOAD_LABEL.to_string(), SKIP_LABEL.to_string()],
            default_index: DOWNLOAD_INDEX,
            cancel_index: SKIP_INDEX,
            title: self.config.dialog_title.clone(),
            message: format!(
                "Version {} is available. You are running version {}.",
                latest,
                self.fetcher.current_version()
            ),
            checkbox_label: format!(
                "Don't remind me again for {}",
                human_window(self.config.sleep_window())
            ),
            checkbox_default: false,
        }
    }
}

/// Renders the snooze window for the prompt, in whole days where possible.
fn human_window(window: Duration) -> String {
    const DAY_SECS: u64 = 24 * 60 * 60;

    let secs = window.as_secs();
    match secs / DAY_SECS {
        1 if secs % DAY_SECS == 0 => "1 day".to_string(),
        days if days > 0 && secs % DAY_SECS == 0 => format!("{} days", days),
        _ => HumanTime::from(window).to_string(),
    }
}

fn event_properties(outcome: &NotifyOutcome, latest: &Version) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("agreed".to_string(), Value::Bool(outcome.agreed));
    properties.insert(
        "sleep_update_check".to_string(),
        Value::Bool(outcome.sleep_update_check),
    );
    properties.insert("latest_version".to_string(), Value::String(latest.to_string()));
    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, UNSUCCESSFUL_REQUEST};
    use crate::fetcher::tests::FakeTransport;
    use crate::host::tests::{RecordingAnalytics, RecordingOpener, ScriptedPrompt};
    use crate::scheduler::tests::FixedClock;
    use crate::settings::{LAST_UPDATE_NOTIFY, MemorySettings, SLEEP_UPDATE_CHECK, SettingValue};
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    const LANDING_URL: &str = "https://example.com/download";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    fn config() -> NotifierConfig {
        NotifierConfig {
            latest_version_url: "https://example.com/latest.json".to_string(),
            download_url: LANDING_URL.to_string(),
            ..NotifierConfig::default()
        }
    }

    struct Harness {
        settings: Arc<MemorySettings>,
        transport: Arc<FakeTransport>,
        prompt: Arc<ScriptedPrompt>,
        links: Arc<RecordingOpener>,
        analytics: Arc<RecordingAnalytics>,
        notifier: UpdateNotifier,
    }

    fn harness(current: &str, transport: Arc<FakeTransport>, prompt: ScriptedPrompt) -> Harness {
        let settings = Arc::new(MemorySettings::new());
        let prompt = Arc::new(prompt);
        let links = Arc::new(RecordingOpener::default());
        let analytics = Arc::new(RecordingAnalytics::default());
        let fetcher = Arc::new(LatestVersionFetcher::new(
            Version::parse(current).unwrap(),
            "https://example.com/latest.json",
            transport.clone(),
        ));
        let host = Host {
            prompt: prompt.clone(),
            links: links.clone(),
            analytics: analytics.clone(),
        };
        let notifier =
            UpdateNotifier::with_clock(config(), fetcher, settings.clone(), host, Arc::new(FixedClock(now())));

        Harness {
            settings,
            transport,
            prompt,
            links,
            analytics,
            notifier,
        }
    }

    fn scheduler(settings: Arc<MemorySettings>) -> UpdateScheduler {
        UpdateScheduler::with_clock(&config(), settings, Arc::new(FixedClock(now())))
    }

    #[test]
    fn test_download_without_snooze() {
        let h = harness("1.0.0", FakeTransport::version("1.1.0"), ScriptedPrompt::answering(DOWNLOAD_INDEX, false));
        h.settings.set_sleep_update_check(true);

        let outcome = h.notifier.notify().unwrap();

        assert_eq!(
            outcome,
            NotifyOutcome {
                agreed: true,
                sleep_update_check: false
            }
        );
        assert_eq!(h.links.opened(), vec![LANDING_URL.to_string()]);
        assert_eq!(h.settings.last_update_notify(), Some(now()));
        assert_eq!(h.settings.get(SLEEP_UPDATE_CHECK), Some(SettingValue::Bool(false)));
    }

    #[test]
    fn test_skip_with_snooze() {
        let h = harness("1.0.0", FakeTransport::version("1.1.0"), ScriptedPrompt::answering(SKIP_INDEX, true));

        let outcome = h.notifier.notify().unwrap();

        assert_eq!(
            outcome,
            NotifyOutcome {
                agreed: false,
                sleep_update_check: true
            }
        );
        assert!(h.links.opened().is_empty());
        assert_eq!(h.settings.get(SLEEP_UPDATE_CHECK), Some(SettingValue::Bool(true)));
        assert_eq!(
            h.settings.get(LAST_UPDATE_NOTIFY),
            Some(SettingValue::Timestamp(now().timestamp_millis()))
        );
    }

    #[test]
    fn test_dialog_contents() {
        let h = harness("1.0.0", FakeTransport::version("v1.1.0"), ScriptedPrompt::answering(SKIP_INDEX, false));
        h.notifier.notify().unwrap();

        let shown = h.prompt.shown();
        assert_eq!(shown.len(), 1);
        let options = &shown[0];
        assert_eq!(options.buttons, ["Download".to_string(), "Skip".to_string()]);
        assert_eq!(options.default_index, DOWNLOAD_INDEX);
        assert_eq!(options.cancel_index, SKIP_INDEX);
        assert_eq!(options.title, "Update available");
        assert!(options.message.contains("1.1.0"));
        assert_eq!(options.checkbox_label, "Don't remind me again for 7 days");
        assert!(!options.checkbox_default);
    }

    #[test]
    fn test_snooze_window_label() {
        assert_eq!(human_window(Duration::from_secs(7 * 24 * 60 * 60)), "7 days");
        assert_eq!(human_window(Duration::from_secs(24 * 60 * 60)), "1 day");
        assert_eq!(human_window(Duration::from_secs(14 * 24 * 60 * 60)), "14 days");
        assert!(!human_window(Duration::from_secs(90 * 60)).is_empty());
    }

    #[test]
    fn test_analytics_event_records_outcome() {
        let h = harness("1.0.0", FakeTransport::version("1.1.0"), ScriptedPrompt::answering(SKIP_INDEX, true));
        h.notifier.notify().unwrap();

        let events = h.analytics.events();
        assert_eq!(events.len(), 1);
        let (name, properties) = &events[0];
        assert_eq!(name, NOTIFY_EVENT);
        assert_eq!(properties["agreed"], Value::Bool(false));
        assert_eq!(properties["sleep_update_check"], Value::Bool(true));
        assert_eq!(properties["latest_version"], Value::String("1.1.0".to_string()));
    }

    #[test]
    fn test_fetch_failure_leaves_state_untouched() {
        let h = harness("1.0.0", FakeTransport::failing(500), ScriptedPrompt::answering(DOWNLOAD_INDEX, false));
        h.settings.set_sleep_update_check(true);

        assert!(matches!(h.notifier.notify(), Err(Error::Fetch(_))));
        assert_eq!(h.settings.last_update_notify(), None);
        assert!(h.settings.sleep_update_check());
        assert!(h.prompt.shown().is_empty());
        assert!(h.analytics.events().is_empty());
    }

    #[test]
    fn test_prompt_failure_keeps_reset_state() {
        let h = harness("1.0.0", FakeTransport::version("1.1.0"), ScriptedPrompt::unavailable());
        h.settings.set_sleep_update_check(true);

        assert!(matches!(h.notifier.notify(), Err(Error::PromptUnavailable(_))));
        assert_eq!(h.settings.last_update_notify(), Some(now()));
        assert!(!h.settings.sleep_update_check());
        assert!(h.links.opened().is_empty());
        assert!(h.analytics.events().is_empty());
    }

    #[test]
    fn test_check_prompts_when_update_available() {
        let h = harness("1.0.0", FakeTransport::version("1.1.0"), ScriptedPrompt::answering(DOWNLOAD_INDEX, false));

        let outcome = h.notifier.check_for_updates(&scheduler(h.settings.clone())).unwrap();

        assert_eq!(outcome.map(|o| o.agreed), Some(true));
        assert_eq!(h.transport.call_count(), 1);
    }

    #[test]
    fn test_check_skips_prompt_when_up_to_date() {
        let h = harness("1.1.0", FakeTransport::version("1.1.0"), ScriptedPrompt::answering(DOWNLOAD_INDEX, false));

        let outcome = h.notifier.check_for_updates(&scheduler(h.settings.clone())).unwrap();

        assert_eq!(outcome, None);
        assert!(h.prompt.shown().is_empty());
        assert_eq!(h.settings.last_update_notify(), None);
    }

    #[test]
    fn test_check_treats_unreachable_server_as_up_to_date() {
        let h = harness(
            "1.0.0",
            FakeTransport::failing(UNSUCCESSFUL_REQUEST),
            ScriptedPrompt::answering(DOWNLOAD_INDEX, false),
        );

        assert_eq!(h.notifier.check_for_updates(&scheduler(h.settings.clone())).unwrap(), None);
        assert!(h.prompt.shown().is_empty());
    }

    #[test]
    fn test_check_does_not_fetch_while_snoozed() {
        let h = harness("1.0.0", FakeTransport::version("1.1.0"), ScriptedPrompt::answering(DOWNLOAD_INDEX, false));
        h.settings.set_sleep_update_check(true);
        h.settings.set_last_update_notify(now() - TimeDelta::hours(1));

        assert_eq!(h.notifier.check_for_updates(&scheduler(h.settings.clone())).unwrap(), None);
        assert_eq!(h.transport.call_count(), 0);
        assert!(h.prompt.shown().is_empty());
    }

    #[test]
    fn test_repeated_cycles_fetch_once() {
        let h = harness("1.0.0", FakeTransport::version("1.1.0"), ScriptedPrompt::answering(SKIP_INDEX, false));

        h.notifier.notify().unwrap();
        h.notifier.notify().unwrap();

        assert_eq!(h.transport.call_count(), 1);
        assert_eq!(h.prompt.shown().len(), 2);
    }
}
