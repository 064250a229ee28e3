//! Structured progress and warning events emitted by the build pipeline.
//!
//! The core never prints. Every step reports a [`BuildEvent`] to a
//! caller-supplied [`BuildObserver`]; the CLI renders them to stderr, library
//! users can forward them to the `log` facade with [`LogObserver`], and tests
//! record them for assertions.

use camino::Utf8PathBuf;
use log::{debug, info, warn};
use std::fmt;

use crate::archive_path::ArchivePath;

/// Something that happened while building an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// A module directory has no manifest and is packaged as a bare leaf.
    MissingManifest {
        /// The module directory.
        path: Utf8PathBuf,
        /// The name the module will be packaged under.
        name: String,
    },
    /// A channel-only object had no entry for the active channel and was
    /// dropped.
    ChannelOverrideUnmatched {
        /// Where the object was declared.
        origin: String,
        /// The active channel, if any.
        channel_id: Option<String>,
    },
    /// A local module directory is being collected.
    CollectingLocal {
        /// The module directory.
        path: Utf8PathBuf,
    },
    /// A remote archive is being downloaded.
    Downloading {
        /// Dependency name.
        name: String,
        /// Resolved download URL.
        url: String,
    },
    /// The latest release tag of a hosted repository was looked up.
    ResolvedLatestTag {
        /// Dependency name.
        name: String,
        /// The tag reported by the release API.
        tag: String,
    },
    /// A patch rewrote a collected file.
    Patched {
        /// The patched archive path.
        path: ArchivePath,
        /// Number of version strings replaced.
        replacements: usize,
    },
    /// A patch targets a path that was not collected.
    PatchTargetMissing {
        /// Name of the module that declared the patch.
        module: String,
        /// The missing archive path.
        path: ArchivePath,
    },
    /// Submodule search paths were derived for the bootstrap file.
    BootstrapPaths {
        /// The derived directories.
        paths: Vec<String>,
    },
    /// The module ships its own root bootstrap file, replacing the generated
    /// one.
    BootstrapOverridden,
    /// An entry was written to the archive.
    ArchiveEntry {
        /// Entry path.
        path: ArchivePath,
        /// Entry size in bytes.
        size: usize,
    },
    /// The finished archive was written to disk.
    ArchiveWritten {
        /// Destination path.
        path: Utf8PathBuf,
        /// Archive size in bytes.
        size: usize,
    },
}

impl BuildEvent {
    /// Whether the event reports a soft error rather than progress.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::MissingManifest { .. }
                | Self::ChannelOverrideUnmatched { .. }
                | Self::PatchTargetMissing { .. }
        )
    }

    /// Whether the event is per-file detail rather than a build milestone.
    #[must_use]
    pub const fn is_detail(&self) -> bool {
        matches!(self, Self::ArchiveEntry { .. } | Self::Patched { .. })
    }
}

impl fmt::Display for BuildEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingManifest { path, name } => write!(
                f,
                "No manifest found in directory \"{path}\". Will be packaged as \"{name}\" without dependencies"
            ),
            Self::ChannelOverrideUnmatched { origin, channel_id } => write!(
                f,
                "{origin} only has channel configuration and channel {} is not listed; skipping",
                channel_id.as_deref().unwrap_or("<none>")
            ),
            Self::CollectingLocal { path } => write!(f, "Iterating dependency in path \"{path}\"..."),
            Self::Downloading { name, url } => {
                write!(f, "Downloading dependency \"{name}\" from \"{url}\"...")
            }
            Self::ResolvedLatestTag { name, tag } => {
                write!(f, "Latest release of \"{name}\" is {tag}")
            }
            Self::Patched { path, replacements } => {
                write!(f, "Patched \"{path}\" ({replacements} replacements)")
            }
            Self::PatchTargetMissing { module, path } => write!(
                f,
                "Manifest for \"{module}\" defines a patch that targets path \"{path}\", but no such path was found."
            ),
            Self::BootstrapPaths { paths } => {
                write!(f, "Added submodule paths to autoexec.be: {paths:?}")
            }
            Self::BootstrapOverridden => {
                write!(f, "Module ships its own autoexec.be; generated bootstrap discarded")
            }
            Self::ArchiveEntry { path, size } => {
                write!(f, "Writing file \"{path}\" ({size} bytes) to archive...")
            }
            Self::ArchiveWritten { path, size } => {
                write!(f, "Wrote output archive ({size} bytes) to \"{path}\"")
            }
        }
    }
}

/// Receiver for [`BuildEvent`]s.
pub trait BuildObserver {
    /// Handle a single event.
    fn on_event(&mut self, event: BuildEvent);
}

/// Forwards events to the `log` facade.
///
/// Warnings map to `warn!`, per-file detail to `debug!`, everything else to
/// `info!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl BuildObserver for LogObserver {
    fn on_event(&mut self, event: BuildEvent) {
        if event.is_warning() {
            warn!("{event}");
        } else if event.is_detail() {
            debug!("{event}");
        } else {
            info!("{event}");
        }
    }
}

/// Stores events in arrival order.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct RecordingObserver {
    /// Every event received so far.
    pub events: Vec<BuildEvent>,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingObserver {
    /// Events for which `is_warning` holds.
    #[must_use]
    pub fn warnings(&self) -> Vec<&BuildEvent> {
        self.events.iter().filter(|e| e.is_warning()).collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl BuildObserver for RecordingObserver {
    fn on_event(&mut self, event: BuildEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::missing_manifest(
        BuildEvent::MissingManifest { path: Utf8PathBuf::from("/m"), name: "m".to_owned() },
        true
    )]
    #[case::patch_missing(
        BuildEvent::PatchTargetMissing { module: "m".to_owned(), path: ArchivePath::from("v.be") },
        true
    )]
    #[case::channel_unmatched(
        BuildEvent::ChannelOverrideUnmatched { origin: "patch #0".to_owned(), channel_id: None },
        true
    )]
    #[case::progress(BuildEvent::CollectingLocal { path: Utf8PathBuf::from("/m") }, false)]
    #[case::overridden(BuildEvent::BootstrapOverridden, false)]
    fn classifies_warnings(#[case] event: BuildEvent, #[case] expected: bool) {
        assert_eq!(event.is_warning(), expected);
    }

    #[test]
    fn recording_observer_keeps_order() {
        let mut observer = RecordingObserver::default();
        observer.on_event(BuildEvent::BootstrapOverridden);
        observer.on_event(BuildEvent::CollectingLocal {
            path: Utf8PathBuf::from("/m"),
        });
        assert_eq!(observer.events.len(), 2);
        assert_eq!(observer.events.first(), Some(&BuildEvent::BootstrapOverridden));
        assert!(observer.warnings().is_empty());
    }

    #[test]
    fn patch_missing_message_names_module_and_path() {
        let event = BuildEvent::PatchTargetMissing {
            module: "berry_app".to_owned(),
            path: ArchivePath::from("lib/version.be"),
        };
        let msg = event.to_string();
        assert!(msg.contains("berry_app"));
        assert!(msg.contains("lib/version.be"));
    }
}
