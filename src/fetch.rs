//! HTTP retrieval of remote dependency archives and release metadata.
//!
//! Provides a trait-based abstraction over the network so that sources can
//! be exercised in tests without network access. The production
//! implementation uses a blocking `ureq` agent; requests are issued once,
//! with no retry or backoff.

use std::time::Duration;

/// Media type requested from the hosted release API.
const RELEASE_API_ACCEPT: &str = "application/vnd.github+json";

/// Pinned hosted release API version.
const RELEASE_API_VERSION: &str = "2022-11-28";

/// Upper bound on a downloaded archive body.
const MAX_BODY_BYTES: u64 = 512 * 1024 * 1024;

/// Trait for fetching remote resources.
///
/// # Examples
///
/// ```
/// use tappack::fetch::HttpFetcher;
///
/// let fetcher = HttpFetcher::default();
/// // Use fetcher.fetch_bytes("https://example.test/lib.zip") in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait Fetcher {
    /// Download the body at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Request JSON from the hosted release API.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a
    /// body that is not JSON.
    fn fetch_json(&self, url: &str) -> Result<serde_json::Value, FetchError>;
}

/// Errors arising from HTTP retrieval.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request could not be completed.
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The response body was not valid JSON.
    #[error("invalid JSON from {url}: {reason}")]
    Json {
        /// The URL that was requested.
        url: String,
        /// The parser's description of the problem.
        reason: String,
    },
}

impl FetchError {
    /// The URL the failed request targeted.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. } | Self::Transport { url, .. } | Self::Json { url, .. } => {
                url
            }
        }
    }

    /// Whether the server reported that the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// HTTP fetcher backed by a `ureq` agent.
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher with an optional global request timeout.
    ///
    /// With `None`, requests block until the server answers or the
    /// connection fails.
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|e| map_ureq_error(url, &e))
    }

    fn fetch_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        let mut response = self
            .agent
            .get(url)
            .header("Accept", RELEASE_API_ACCEPT)
            .header("X-GitHub-Api-Version", RELEASE_API_VERSION)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| map_ureq_error(url, &e))?;
        serde_json::from_str(&text).map_err(|e| FetchError::Json {
            url: url.to_owned(),
            reason: e.to_string(),
        })
    }
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(status) => FetchError::Status {
            url: url.to_owned(),
            status: *status,
        },
        other => FetchError::Transport {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::not_found(404, true)]
    #[case::server_error(500, false)]
    #[case::forbidden(403, false)]
    fn status_codes_map_to_status_errors(#[case] status: u16, #[case] not_found: bool) {
        let mapped = map_ureq_error("https://example.test/lib.zip", &ureq::Error::StatusCode(status));
        assert!(matches!(mapped, FetchError::Status { status: s, .. } if s == status));
        assert_eq!(mapped.is_not_found(), not_found);
        assert_eq!(mapped.url(), "https://example.test/lib.zip");
    }

    #[test]
    fn other_errors_map_to_transport() {
        let mapped = map_ureq_error("https://example.test/lib.zip", &ureq::Error::HostNotFound);
        assert!(matches!(mapped, FetchError::Transport { .. }));
        assert!(mapped.to_string().contains("example.test"));
    }
}
