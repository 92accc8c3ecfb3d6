use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use chrono::{DateTime, TimeZone, Utc};

/// Settings key holding the epoch-millisecond time the last prompt was shown.
pub const LAST_UPDATE_NOTIFY: &str = "lastUpdateNotify";
/// Settings key holding whether scheduled checks are snoozed.
pub const SLEEP_UPDATE_CHECK: &str = "sleepUpdateCheck";

/// A value held by a [`SettingsStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingValue {
    Bool(bool),
    /// Milliseconds since the Unix epoch
    Timestamp(i64),
}

/// Generic key-value persistence supplied by the host application.
///
/// Every write is expected to be durable (or at least visible to the next
/// `get`) as soon as `set` returns; callers never buffer.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<SettingValue>;

    fn set(&self, key: &str, value: SettingValue);

    /// When the update prompt was last shown, if ever.
    fn last_update_notify(&self) -> Option<DateTime<Utc>> {
        match self.get(LAST_UPDATE_NOTIFY) {
            Some(SettingValue::Timestamp(ms)) => Utc.timestamp_millis_opt(ms).single(),
            _ => None,
        }
    }

    fn set_last_update_notify(&self, at: DateTime<Utc>) {
        self.set(LAST_UPDATE_NOTIFY, SettingValue::Timestamp(at.timestamp_millis()));
    }

    /// Whether scheduled checks are snoozed. Absent or mistyped means `false`.
    fn sleep_update_check(&self) -> bool {
        matches!(self.get(SLEEP_UPDATE_CHECK), Some(SettingValue::Bool(true)))
    }

    fn set_sleep_update_check(&self, sleep: bool) {
        self.set(SLEEP_UPDATE_CHECK, SettingValue::Bool(sleep));
    }
}

/// Settings held only in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, SettingValue>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.lock().ok()?.get(key).copied()
    }

    fn set(&self, key: &str, value: SettingValue) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value);
        }
    }
}

/// Settings persisted to a compact binary file.
///
/// The whole map is rewritten after every `set`. A missing or corrupt file
/// starts out empty, and write failures are logged rather than surfaced.
///
/// # Examples
///
/// ```no_run
/// use update_notifier::{FileSettings, SettingsStore};
///
/// let settings = FileSettings::open(std::env::temp_dir().join("my_app_updates.bin"));
/// if settings.sleep_update_check() {
///     println!("update checks are snoozed");
/// }
/// ```
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    values: Mutex<HashMap<String, SettingValue>>,
}

impl FileSettings {
    /// Opens (or lazily creates) the settings file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = load(&path);
        FileSettings {
            path,
            values: Mutex::new(values),
        }
    }

    /// Settings file in the system temp directory, shared across runs.
    pub fn in_temp_dir(file_name: &str) -> Self {
        Self::open(std::env::temp_dir().join(file_name))
    }

    fn save(&self, values: &HashMap<String, SettingValue>) {
        let data = match postcard::to_allocvec(values) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("failed to encode settings: {e}");
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::warn!(path = %parent.display(), "failed to create settings directory: {e}");
                }
            }
        }

        if let Err(e) = fs::write(&self.path, data) {
            tracing::warn!(path = %self.path.display(), "failed to write settings: {e}");
        }
    }
}

fn load(path: &Path) -> HashMap<String, SettingValue> {
    let Ok(data) = fs::read(path) else {
        return HashMap::new();
    };

    match postcard::from_bytes::<HashMap<String, SettingValue>>(&data) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable settings file: {e}");
            HashMap::new()
        }
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.lock().ok()?.get(key).copied()
    }

    fn set(&self, key: &str, value: SettingValue) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value);
            self.save(&values);
        }
    }
}
