//! Release assets published on a hosted source-control service.
//!
//! A release asset resolves to a deterministic download URL built from the
//! repository, a release tag and the asset file name. When no version is
//! pinned, the tag of the latest release is looked up through the service's
//! REST API. The lookup happens lazily on first collection and is memoised
//! for the lifetime of the source.

use std::cell::OnceCell;

use crate::archive_path::ArchivePath;
use crate::dependency::ReleaseAssetConfig;
use crate::error::{PackError, Result};
use crate::events::{BuildEvent, BuildObserver};
use crate::fetch::Fetcher;
use crate::file_map::FileMap;
use crate::source::remote::{RemoteArchiveSource, network_error};

/// Default REST API endpoint of the hosted service.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Default web endpoint serving release downloads.
pub const DEFAULT_DOWNLOAD_BASE_URL: &str = "https://github.com";

/// Endpoints of the hosted source-control service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedService {
    api_base_url: String,
    download_base_url: String,
}

impl HostedService {
    /// Create a service description. Trailing slashes are ignored.
    #[must_use]
    pub fn new(api_base_url: &str, download_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_owned(),
            download_base_url: download_base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// The REST endpoint describing the latest release of `org/repo`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tappack::source::HostedService;
    ///
    /// let url = HostedService::default().latest_release_url("frontmatter", "berry-lib");
    /// assert_eq!(url, "https://api.github.com/repos/frontmatter/berry-lib/releases/latest");
    /// ```
    #[must_use]
    pub fn latest_release_url(&self, org: &str, repo: &str) -> String {
        format!("{}/repos/{org}/{repo}/releases/latest", self.api_base_url)
    }

    /// The download URL of `filename` attached to release `tag`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tappack::source::HostedService;
    ///
    /// let url = HostedService::default().asset_url("o", "r", "v1.0.0", "r.zip");
    /// assert_eq!(url, "https://github.com/o/r/releases/download/v1.0.0/r.zip");
    /// ```
    #[must_use]
    pub fn asset_url(&self, org: &str, repo: &str, tag: &str, filename: &str) -> String {
        format!(
            "{}/{org}/{repo}/releases/download/{tag}/{filename}",
            self.download_base_url
        )
    }
}

impl Default for HostedService {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL, DEFAULT_DOWNLOAD_BASE_URL)
    }
}

/// A ZIP asset attached to a hosted release.
#[derive(Debug)]
pub struct HostedReleaseAssetSource {
    config: ReleaseAssetConfig,
    service: HostedService,
    url: OnceCell<String>,
}

impl HostedReleaseAssetSource {
    /// Create an unresolved source.
    #[must_use]
    pub const fn new(config: ReleaseAssetConfig, service: HostedService) -> Self {
        Self {
            config,
            service,
            url: OnceCell::new(),
        }
    }

    /// The dependency name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The dependency configuration.
    #[must_use]
    pub const fn config(&self) -> &ReleaseAssetConfig {
        &self.config
    }

    /// Resolve the download URL, querying the latest release at most once.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::TagNotFound`] when the repository has no
    /// release tag, and [`PackError::Network`] when the lookup fails.
    pub fn download_url(
        &self,
        fetcher: &dyn Fetcher,
        observer: &mut dyn BuildObserver,
    ) -> Result<&str> {
        if let Some(url) = self.url.get() {
            return Ok(url);
        }
        let tag = match self.config.explicit_tag() {
            Some(tag) => tag,
            None => self.latest_tag(fetcher, observer)?,
        };
        let url = self.service.asset_url(
            &self.config.org,
            &self.config.repo,
            &tag,
            &self.config.filename,
        );
        Ok(self.url.get_or_init(|| url))
    }

    /// Download the asset and key its entries below `prefix`.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::download_url`] and
    /// [`RemoteArchiveSource::collect`].
    pub fn collect(
        &self,
        prefix: &ArchivePath,
        fetcher: &dyn Fetcher,
        observer: &mut dyn BuildObserver,
    ) -> Result<FileMap> {
        let url = self.download_url(fetcher, observer)?;
        RemoteArchiveSource::new(self.name(), url).collect(prefix, fetcher, observer)
    }

    fn latest_tag(
        &self,
        fetcher: &dyn Fetcher,
        observer: &mut dyn BuildObserver,
    ) -> Result<String> {
        let not_found = || PackError::TagNotFound {
            org: self.config.org.clone(),
            repo: self.config.repo.clone(),
        };
        let url = self
            .service
            .latest_release_url(&self.config.org, &self.config.repo);
        let release = match fetcher.fetch_json(&url) {
            Ok(release) => release,
            Err(err) if err.is_not_found() => return Err(not_found()),
            Err(err) => return Err(network_error(err)),
        };
        let tag = release
            .get("tag_name")
            .and_then(serde_json::Value::as_str)
            .filter(|tag| !tag.is_empty())
            .ok_or_else(not_found)?;
        observer.on_event(BuildEvent::ResolvedLatestTag {
            name: self.config.name.clone(),
            tag: tag.to_owned(),
        });
        Ok(tag.to_owned())
    }
}
