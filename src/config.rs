use serde::Deserialize;
use std::time::Duration;

/// Default snooze window: 7 days.
pub const DEFAULT_SLEEP_WINDOW_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// Default request timeout for the HTTP transport, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 2;

/// Settings for the update check, usually embedded in the host's own config.
///
/// Every field has a default, so partial documents deserialize.
///
/// # Examples
///
/// ```
/// use update_notifier::NotifierConfig;
///
/// let config = NotifierConfig {
///     latest_version_url: "https://example.com/latest.json".to_string(),
///     download_url: "https://example.com/download".to_string(),
///     ..NotifierConfig::default()
/// };
///
/// assert_eq!(config.sleep_window().as_secs(), 7 * 24 * 60 * 60);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Endpoint returning `{"version": "..."}` (or a GitHub release object)
    pub latest_version_url: String,
    /// Landing page opened when the user picks "Download"
    pub download_url: String,
    /// How long the "remind me later" checkbox suppresses checks
    pub sleep_window_ms: u64,
    /// Title of the update prompt
    pub dialog_title: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl NotifierConfig {
    pub fn sleep_window(&self) -> Duration {
        Duration::from_millis(self.sleep_window_ms)
    }

    /// The snooze window as signed milliseconds, saturating at `i64::MAX`.
    pub(crate) fn sleep_window_millis(&self) -> i64 {
        i64::try_from(self.sleep_window_ms).unwrap_or(i64::MAX)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        NotifierConfig {
            latest_version_url: String::new(),
            download_url: String::new(),
            sleep_window_ms: DEFAULT_SLEEP_WINDOW_MS,
            dialog_title: "Update available".to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: concat!("update-notifier/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: NotifierConfig = serde_json::from_str(
            r#"{"latest_version_url": "https://example.com/latest.json", "sleep_window_ms": 1000}"#,
        )
        .unwrap();

        assert_eq!(config.latest_version_url, "https://example.com/latest.json");
        assert_eq!(config.sleep_window(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(2));
        assert_eq!(config.dialog_title, "Update available");
        assert!(config.download_url.is_empty());
    }

    #[test]
    fn test_default_window_is_seven_days() {
        let config = NotifierConfig::default();
        assert_eq!(config.sleep_window_millis(), 604_800_000);
    }

    #[test]
    fn test_oversized_window_saturates() {
        let config = NotifierConfig {
            sleep_window_ms: u64::MAX,
            ..NotifierConfig::default()
        };
        assert_eq!(config.sleep_window_millis(), i64::MAX);
    }
}
