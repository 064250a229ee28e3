//! Tool configuration loaded from an optional TOML file.
//!
//! The file adjusts how builds reach the outside world rather than what they
//! package: the hosted release service endpoints (for self-hosted instances
//! or local test servers), a global HTTP timeout, and a replacement
//! bootstrap template. Every key is optional. Blank strings and a zero
//! timeout are treated as absent so templated files fall back cleanly to the
//! built-in defaults.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;

use crate::source::HostedService;
use crate::source::hosted::{DEFAULT_API_BASE_URL, DEFAULT_DOWNLOAD_BASE_URL};

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Read {
        /// The configuration path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration TOML.
    #[error("invalid configuration {path}: {source}")]
    Parse {
        /// The configuration path.
        path: Utf8PathBuf,
        /// The parser's error.
        #[source]
        source: toml::de::Error,
    },
}

/// Settings read from the configuration file.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PackagerConfig {
    /// Hosted release service endpoints.
    pub hosted: HostedConfig,
    /// Global timeout for each HTTP request, in seconds. Absent or zero
    /// means no timeout.
    pub http_timeout_secs: Option<u64>,
    /// Replacement bootstrap template. Relative paths are resolved against
    /// the directory holding the configuration file.
    pub bootstrap_template: Option<Utf8PathBuf>,
}

/// The `[hosted]` table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HostedConfig {
    /// REST API endpoint used to look up the latest release.
    pub api_base_url: Option<String>,
    /// Web endpoint serving release downloads.
    pub download_base_url: Option<String>,
}

impl PackagerConfig {
    /// Read the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read and
    /// [`ConfigError::Parse`] when its contents are invalid.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let (Some(template), Some(base)) = (&config.bootstrap_template, path.parent()) {
            if template.is_relative() && !template.as_str().trim().is_empty() {
                config.bootstrap_template = Some(base.join(template));
            }
        }
        Ok(config)
    }

    /// The hosted service described by `[hosted]`, with defaults for
    /// missing or blank endpoints.
    ///
    /// # Examples
    ///
    /// ```
    /// use tappack::config::PackagerConfig;
    /// use tappack::source::HostedService;
    ///
    /// let config: PackagerConfig =
    ///     toml::from_str("[hosted]\napi_base_url = \"  \"\n").expect("valid");
    /// assert_eq!(config.hosted_service(), HostedService::default());
    /// ```
    #[must_use]
    pub fn hosted_service(&self) -> HostedService {
        HostedService::new(
            non_blank(self.hosted.api_base_url.as_deref()).unwrap_or(DEFAULT_API_BASE_URL),
            non_blank(self.hosted.download_base_url.as_deref())
                .unwrap_or(DEFAULT_DOWNLOAD_BASE_URL),
        )
    }

    /// The configured HTTP timeout, if any.
    #[must_use]
    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// The configured bootstrap template path, if any.
    #[must_use]
    pub fn bootstrap_template(&self) -> Option<&Utf8Path> {
        self.bootstrap_template
            .as_deref()
            .filter(|path| !path.as_str().trim().is_empty())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
