use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::config::NotifierConfig;
use crate::error::{Error, Result, TransportError};
use crate::version::{Version, is_at_least};

/// Body returned by the latest-version endpoint.
///
/// Accepts `{"version": "1.2.3"}` as well as a GitHub release object, whose
/// `tag_name` carries the version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VersionPayload {
    #[serde(alias = "tag_name")]
    pub version: String,
}

/// Fetches the latest-version payload from a remote source.
pub trait Transport: Send + Sync {
    /// Fails with [`UNSUCCESSFUL_REQUEST`](crate::UNSUCCESSFUL_REQUEST) as the
    /// status when no response was received at all.
    fn fetch_latest_version_payload(&self, url: &str) -> std::result::Result<VersionPayload, TransportError>;
}

/// Blocking HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    user_agent: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &NotifierConfig) -> Self {
        HttpTransport {
            user_agent: config.user_agent.clone(),
            timeout: config.request_timeout(),
        }
    }
}

impl Transport for HttpTransport {
    fn fetch_latest_version_payload(&self, url: &str) -> std::result::Result<VersionPayload, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.timeout)
            .build()
            .map_err(|e| TransportError::unsuccessful(e.to_string()))?;

        let response = client
            .get(url)
            .send()
            .map_err(|e| TransportError::unsuccessful(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(status.as_u16(), format!("HTTP error: {}", status)));
        }

        // A body cut short by a timeout or reset never completed either.
        let body = response
            .text()
            .map_err(|e| TransportError::unsuccessful(format!("failed to read body: {}", e)))?;

        serde_json::from_str::<VersionPayload>(&body)
            .map_err(|e| TransportError::new(status.as_u16(), format!("invalid payload: {}", e)))
    }
}

/// Read-only view of the running application's manifest.
pub trait ManifestProvider: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Manifest backed by a fixed map, typically built from `CARGO_PKG_VERSION`.
#[derive(Debug, Clone, Default)]
pub struct StaticManifest {
    entries: HashMap<String, String>,
}

impl StaticManifest {
    pub fn from_version(version: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert("version".to_string(), version.to_string());
        StaticManifest { entries }
    }
}

impl ManifestProvider for StaticManifest {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Fetches the latest released version at most once.
///
/// The first call to [`latest_version`](Self::latest_version) performs the
/// fetch; callers arriving while it is in flight block until it settles, and
/// every later call gets the same result, failures included. Keep one fetcher
/// for the lifetime of the process.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use update_notifier::{HttpTransport, LatestVersionFetcher, NotifierConfig, StaticManifest};
///
/// let config = NotifierConfig {
///     latest_version_url: "https://example.com/latest.json".to_string(),
///     ..NotifierConfig::default()
/// };
/// let fetcher = LatestVersionFetcher::from_manifest(
///     &StaticManifest::from_version(env!("CARGO_PKG_VERSION")),
///     &config.latest_version_url,
///     Arc::new(HttpTransport::new(&config)),
/// )?;
///
/// if !fetcher.is_latest_version()? {
///     println!("Version {} is available", fetcher.latest_version()?);
/// }
/// # Ok::<(), update_notifier::Error>(())
/// ```
pub struct LatestVersionFetcher {
    current_version: Version,
    url: String,
    transport: Arc<dyn Transport>,
    latest: OnceLock<Result<Version>>,
}

impl LatestVersionFetcher {
    pub fn new(current_version: Version, url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        LatestVersionFetcher {
            current_version,
            url: url.into(),
            transport,
            latest: OnceLock::new(),
        }
    }

    /// Reads the current version from `manifest` once, at construction.
    pub fn from_manifest(
        manifest: &dyn ManifestProvider,
        url: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let raw = manifest.get("version").ok_or(Error::MissingManifestVersion)?;
        let current_version = Version::parse(&raw)?;
        Ok(Self::new(current_version, url, transport))
    }

    pub fn current_version(&self) -> &Version {
        &self.current_version
    }

    /// The latest released version, fetched on first use.
    ///
    /// A request that never completed resolves to the current version so the
    /// caller concludes there is nothing to install.
    pub fn latest_version(&self) -> Result<Version> {
        self.latest.get_or_init(|| self.fetch()).clone()
    }

    /// Whether the running version is at least the latest released one.
    pub fn is_latest_version(&self) -> Result<bool> {
        let latest = self.latest_version()?;
        Ok(is_at_least(&self.current_version, &latest))
    }

    fn fetch(&self) -> Result<Version> {
        tracing::debug!(url = %self.url, "fetching latest version");

        match self.transport.fetch_latest_version_payload(&self.url) {
            Ok(payload) => {
                let latest = Version::parse(&payload.version)?;
                tracing::debug!(%latest, current = %self.current_version, "latest version resolved");
                Ok(latest)
            }
            Err(e) if e.is_unsuccessful_request() => {
                tracing::warn!("latest version unavailable, assuming current: {e}");
                Ok(self.current_version.clone())
            }
            Err(e) => {
                tracing::warn!("latest version fetch failed: {e}");
                Err(Error::Fetch(e))
            }
        }
    }
}
