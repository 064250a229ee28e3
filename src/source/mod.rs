//! Dependency sources and recursive file collection.
//!
//! A [`Source`] produces the files of one dependency as a [`FileMap`] keyed
//! under a caller-chosen prefix. Local modules recurse into their own
//! dependencies, so collecting the root module yields a depth-first
//! pre-order flattening of the whole dependency graph.

pub mod hosted;
pub mod loader;
pub mod local;
pub mod remote;

use crate::archive_path::ArchivePath;
use crate::error::Result;
use crate::events::BuildObserver;
use crate::fetch::Fetcher;
use crate::file_map::FileMap;

pub use hosted::{HostedReleaseAssetSource, HostedService};
pub use loader::Loader;
pub use local::LocalModule;
pub use remote::RemoteArchiveSource;

/// A resolved dependency.
#[derive(Debug)]
pub enum Source {
    /// A module directory on disk, with its own dependencies.
    Local(Box<LocalModule>),
    /// A ZIP archive at a direct URL.
    Remote(RemoteArchiveSource),
    /// A ZIP asset attached to a hosted release.
    Hosted(HostedReleaseAssetSource),
}

impl Source {
    /// The name the source is packaged under.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Local(module) => module.name(),
            Self::Remote(remote) => remote.name(),
            Self::Hosted(hosted) => hosted.name(),
        }
    }

    /// Collect the source's files below `prefix`.
    ///
    /// # Errors
    ///
    /// Propagates filesystem, network, archive and patch errors from the
    /// underlying variant.
    pub fn collect(
        &self,
        prefix: &ArchivePath,
        fetcher: &dyn Fetcher,
        observer: &mut dyn BuildObserver,
    ) -> Result<FileMap> {
        match self {
            Self::Local(module) => module.collect(prefix, fetcher, observer),
            Self::Remote(remote) => remote.collect(prefix, fetcher, observer),
            Self::Hosted(hosted) => hosted.collect(prefix, fetcher, observer),
        }
    }
}
