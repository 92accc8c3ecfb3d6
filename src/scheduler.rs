use chrono::{DateTime, Utc};
use humanly::{HumanDuration, HumanTime};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::config::NotifierConfig;
use crate::settings::SettingsStore;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Snapshot of the persisted scheduling state, for display and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerState {
    pub last_update_notify: Option<DateTime<Utc>>,
    pub sleep_update_check: bool,
}

/// Decides whether a scheduled update check should run.
///
/// Reads and writes go straight to the settings store; nothing is cached.
pub struct UpdateScheduler {
    settings: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    sleep_window_ms: i64,
}

impl UpdateScheduler {
    pub fn new(config: &NotifierConfig, settings: Arc<dyn SettingsStore>) -> Self {
        Self::with_clock(config, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &NotifierConfig, settings: Arc<dyn SettingsStore>, clock: Arc<dyn Clock>) -> Self {
        UpdateScheduler {
            settings,
            clock,
            sleep_window_ms: config.sleep_window_millis(),
        }
    }

    /// Returns `true` when checks are not snoozed, or when the snooze window
    /// has elapsed, in which case the snooze flag is cleared in the store.
    ///
    /// Elapsed time is computed as `lastUpdateNotify - now`, the order stored
    /// state has always been evaluated with. For a timestamp in the past this
    /// is negative, so such a snooze is only lifted by the next prompt.
    pub fn should_check_for_updates(&self) -> bool {
        if !self.settings.sleep_update_check() {
            return true;
        }
        let Some(last) = self.settings.last_update_notify() else {
            return true;
        };

        let now = self.clock.now();
        let elapsed = last.timestamp_millis().saturating_sub(now.timestamp_millis());
        if elapsed > self.sleep_window_ms {
            tracing::debug!("update snooze window elapsed, resuming checks");
            self.settings.set_sleep_update_check(false);
            return true;
        }

        tracing::debug!(
            last_notified = %pretty_date(last, now),
            "update checks snoozed"
        );
        false
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState {
            last_update_notify: self.settings.last_update_notify(),
            sleep_update_check: self.settings.sleep_update_check(),
        }
    }
}

/// Formats `then` relative to `now`, e.g. "3 days ago".
///
/// Anything more than a week in the past is shown as a full date instead.
pub(crate) fn pretty_date(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(then);

    if diff.num_days() > 7 {
        return then.format("%x %X").to_string();
    }

    if diff.num_seconds() < 0 {
        let future = Duration::from_secs(diff.num_seconds().unsigned_abs());
        return format!("in {}", HumanTime::from(future).to_string());
    }

    let ago = Duration::from_secs(diff.num_seconds().max(0) as u64);
    let past_time = SystemTime::now().checked_sub(ago).unwrap_or(SystemTime::UNIX_EPOCH);
    HumanDuration::from(Some(past_time)).to_string()
}
