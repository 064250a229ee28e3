//! End-to-end build of a `.tapp` archive from a module directory.
//!
//! [`Packager::load`] reads the whole module graph up front; collection,
//! patching, bootstrap generation and archive assembly run afterwards in
//! [`Packager::build_archive`]. Nothing is written to disk until the archive
//! is complete, and [`Packager::write`] replaces the destination atomically.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::NamedTempFile;

use crate::archive::{ARCHIVE_EXTENSION, build_archive};
use crate::archive_path::ArchivePath;
use crate::bootstrap::{BootstrapParams, BootstrapTemplate, submodule_paths};
use crate::channel::ChannelId;
use crate::config::PackagerConfig;
use crate::error::{PackError, Result};
use crate::events::{BuildEvent, BuildObserver};
use crate::fetch::Fetcher;
use crate::file_map::FileMap;
use crate::source::{HostedService, Loader, LocalModule};

/// Inputs of a build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Root module directory.
    pub module_path: Utf8PathBuf,
    /// Active release channel.
    pub channel_id: Option<ChannelId>,
    /// Hosted release service endpoints.
    pub hosted: HostedService,
    /// Template of the generated bootstrap file.
    pub bootstrap_template: BootstrapTemplate,
}

impl BuildOptions {
    /// Options for `module_path` with default endpoints and template.
    #[must_use]
    pub fn new(module_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            module_path: module_path.into(),
            channel_id: None,
            hosted: HostedService::default(),
            bootstrap_template: BootstrapTemplate::default(),
        }
    }

    /// Select the release channel.
    #[must_use]
    pub fn with_channel(mut self, channel_id: Option<ChannelId>) -> Self {
        self.channel_id = channel_id;
        self
    }

    /// Apply settings from a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Io`] when the configured bootstrap template
    /// cannot be read.
    pub fn with_config(mut self, config: &PackagerConfig) -> Result<Self> {
        self.hosted = config.hosted_service();
        if let Some(path) = config.bootstrap_template() {
            self.bootstrap_template = BootstrapTemplate::from_file(path)?;
        }
        Ok(self)
    }
}

/// A loaded root module ready to be packaged.
#[derive(Debug)]
pub struct Packager {
    module: LocalModule,
    template: BootstrapTemplate,
}

impl Packager {
    /// Load the module graph described by `options`.
    ///
    /// # Errors
    ///
    /// Returns any filesystem, manifest or dependency error found while
    /// loading.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tappack::events::LogObserver;
    /// use tappack::fetch::HttpFetcher;
    /// use tappack::packager::{BuildOptions, Packager};
    ///
    /// let mut observer = LogObserver;
    /// let packager = Packager::load(BuildOptions::new("blinds"), &mut observer)?;
    /// let written = packager.write(None, &HttpFetcher::default(), &mut observer)?;
    /// println!("{written}");
    /// # Ok::<(), tappack::error::PackError>(())
    /// ```
    pub fn load(options: BuildOptions, observer: &mut dyn BuildObserver) -> Result<Self> {
        let module = Loader::new(options.channel_id, options.hosted, observer)
            .load_root(&options.module_path)?;
        Ok(Self {
            module,
            template: options.bootstrap_template,
        })
    }

    /// The root module.
    #[must_use]
    pub const fn module(&self) -> &LocalModule {
        &self.module
    }

    /// Collect and patch every file of the module graph.
    ///
    /// # Errors
    ///
    /// Propagates collection and patch errors.
    pub fn collect(
        &self,
        fetcher: &dyn Fetcher,
        observer: &mut dyn BuildObserver,
    ) -> Result<FileMap> {
        self.module.collect(&ArchivePath::root(), fetcher, observer)
    }

    /// Render the bootstrap file for the collected `files`.
    #[must_use]
    pub fn bootstrap(&self, files: &FileMap, observer: &mut dyn BuildObserver) -> String {
        let paths = submodule_paths(files);
        observer.on_event(BuildEvent::BootstrapPaths {
            paths: paths.iter().map(ToString::to_string).collect(),
        });
        self.template.render(&BootstrapParams {
            paths: &paths,
            module_name: self.module.name(),
            auto_import: self.module.autoexec().import,
            channel_id: self.module.channel_id(),
        })
    }

    /// Build the archive in memory.
    ///
    /// # Errors
    ///
    /// Propagates collection, patch and archive errors.
    pub fn build_archive(
        &self,
        fetcher: &dyn Fetcher,
        observer: &mut dyn BuildObserver,
    ) -> Result<Vec<u8>> {
        let files = self.collect(fetcher, observer)?;
        let bootstrap = self.bootstrap(&files, observer);
        build_archive(bootstrap.as_bytes(), &files, observer)
    }

    /// `<module name>.tapp` inside the module directory.
    #[must_use]
    pub fn default_output(&self) -> Utf8PathBuf {
        self.module
            .root()
            .join(format!("{}.{ARCHIVE_EXTENSION}", self.module.name()))
    }

    /// Build the archive and write it to `output`, or to
    /// [`Self::default_output`] when `None`. Returns the written path.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Io`] when the destination cannot be written, and
    /// propagates build errors. The destination is untouched on failure.
    pub fn write(
        &self,
        output: Option<&Utf8Path>,
        fetcher: &dyn Fetcher,
        observer: &mut dyn BuildObserver,
    ) -> Result<Utf8PathBuf> {
        let target = output.map_or_else(|| self.default_output(), Utf8Path::to_path_buf);
        let bytes = self.build_archive(fetcher, observer)?;
        persist_atomically(&target, &bytes)?;
        observer.on_event(BuildEvent::ArchiveWritten {
            path: target.clone(),
            size: bytes.len(),
        });
        Ok(target)
    }
}

/// Write `bytes` to a temporary file beside `target` and rename it into
/// place.
fn persist_atomically(target: &Utf8Path, bytes: &[u8]) -> Result<()> {
    let dir = target
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| PackError::io(dir, e))?;
    temp.write_all(bytes)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| PackError::io(target, e))?;
    temp.persist(target)
        .map_err(|e| PackError::io(target, e.error))?;
    Ok(())
}
