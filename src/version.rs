use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Matches the first semantic version embedded in a release tag.
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?")
        .expect("version pattern is valid")
});

/// A semantic version, ordered by semver precedence.
///
/// Build metadata is kept for display but ignored by `==`, `Ord` and `Hash`.
///
/// # Examples
///
/// ```
/// use update_notifier::Version;
///
/// let current: Version = "1.0.0".parse().unwrap();
/// let latest = Version::parse("desktop-v1.1.0").unwrap();
///
/// assert!(latest > current);
/// assert_eq!(latest.to_string(), "1.1.0");
/// ```
#[derive(Debug, Clone)]
pub struct Version(semver::Version);

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version(semver::Version::new(major, minor, patch))
    }

    /// Parses a version string or release tag.
    ///
    /// Accepts bare versions (`1.2.3`), `v`-prefixed tags (`v1.2.3`) and
    /// tags with a textual prefix (`desktop-v1.2.3-beta.1`).
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let candidate = VERSION_RE
            .find(trimmed)
            .map(|m| m.as_str())
            .ok_or_else(|| Error::InvalidVersion {
                version: s.to_string(),
                reason: "no semantic version found".to_string(),
            })?;

        semver::Version::parse(candidate)
            .map(Version)
            .map_err(|e| Error::InvalidVersion {
                version: s.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Returns `true` iff `a >= b` under semantic-version ordering.
///
/// Build metadata does not take part in precedence.
pub fn is_at_least(a: &Version, b: &Version) -> bool {
    a >= b
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp_precedence(&other.0)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.major.hash(state);
        self.0.minor.hash(state);
        self.0.patch.hash(state);
        self.0.pre.hash(state);
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(serde::de::Error::custom)
    }
}
