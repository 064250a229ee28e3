//! Error types for the tappack build pipeline.
//!
//! Every variant is fatal: a build that hits one aborts before any archive
//! is written. Soft conditions (missing patch targets, unmatched channel
//! overrides) are not errors; they are reported through
//! [`crate::events::BuildEvent`] instead.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can abort a build.
#[derive(Debug, Error)]
pub enum PackError {
    /// A manifest or dependency field is missing or malformed.
    #[error("invalid configuration in {origin}: {reason}")]
    Configuration {
        /// Where the bad value was found (manifest path, dependency key).
        origin: String,
        /// Description of the problem.
        reason: String,
    },

    /// The root module's manifest does not declare a `name`.
    #[error("manifest {path} does not declare a module name")]
    MissingModuleName {
        /// Path to the offending manifest.
        path: Utf8PathBuf,
    },

    /// An object declared a type discriminator that is not recognised.
    #[error("invalid object type {value:?} in {origin}; expected one of: {expected}")]
    UnknownType {
        /// Where the object was declared.
        origin: String,
        /// The rejected discriminator, if any was present.
        value: Option<String>,
        /// Comma-separated list of accepted discriminators.
        expected: &'static str,
    },

    /// A declared local path is missing or is not a directory.
    #[error("path {path} {reason}")]
    Filesystem {
        /// The offending path.
        path: Utf8PathBuf,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// An HTTP request failed or returned a non-success status.
    #[error("download failed for {url}: {reason}")]
    Network {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The hosted release API returned no tag for a repository.
    #[error("no release tag found for {org}/{repo}")]
    TagNotFound {
        /// Repository owner.
        org: String,
        /// Repository name.
        repo: String,
    },

    /// Downloaded bytes are not a valid ZIP archive.
    #[error("invalid archive from {origin}: {reason}")]
    Format {
        /// URL or dependency name the archive came from.
        origin: String,
        /// Description of the decoding failure.
        reason: String,
    },

    /// A patch target could not be decoded with its configured encoding.
    #[error("cannot decode {path} as {encoding}")]
    Encoding {
        /// Archive path of the patch target.
        path: String,
        /// The configured encoding.
        encoding: String,
    },

    /// The output archive could not be assembled.
    #[error("failed to assemble archive entry {entry}: {reason}")]
    ArchiveWrite {
        /// The entry being written.
        entry: String,
        /// Description of the failure.
        reason: String,
    },

    /// Local dependencies refer back to a module that is still loading.
    #[error("cyclic dependency: {}", render_chain(.chain))]
    CyclicDependency {
        /// Module directories from the outermost module to the repeated one.
        chain: Vec<Utf8PathBuf>,
    },

    /// Reading module files or writing the archive failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The path being read or written.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl PackError {
    /// Build a [`PackError::Configuration`] from anything displayable.
    pub fn configuration(origin: impl Into<String>, reason: impl ToString) -> Self {
        Self::Configuration {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`PackError::Io`] for `path`.
    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn render_chain(chain: &[Utf8PathBuf]) -> String {
    chain
        .iter()
        .map(|path| path.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Result type alias using [`PackError`].
pub type Result<T> = std::result::Result<T, PackError>;
