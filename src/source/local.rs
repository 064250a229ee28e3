//! Module directories on disk.
//!
//! A local module contributes every regular file under its directory,
//! followed by the files of its dependencies under `<prefix>/<name>`, and
//! then applies its own patches at its prefix. Directory entries are visited
//! in sorted order so the same tree always collects in the same order.

use camino::{Utf8Path, Utf8PathBuf};

use crate::archive::ARCHIVE_EXTENSION;
use crate::archive_path::ArchivePath;
use crate::channel::ChannelId;
use crate::error::{PackError, Result};
use crate::events::{BuildEvent, BuildObserver};
use crate::fetch::Fetcher;
use crate::file_map::FileMap;
use crate::manifest::AutoexecConfig;
use crate::patch::PatchSet;
use crate::source::Source;

/// A loaded module directory.
#[derive(Debug)]
pub struct LocalModule {
    pub(crate) name: String,
    pub(crate) root: Utf8PathBuf,
    pub(crate) channel_id: Option<ChannelId>,
    pub(crate) dependencies: Vec<Source>,
    pub(crate) patches: PatchSet,
    pub(crate) autoexec: AutoexecConfig,
}

impl LocalModule {
    /// The module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The canonical module directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// The channel the module was resolved for.
    #[must_use]
    pub const fn channel_id(&self) -> Option<&ChannelId> {
        self.channel_id.as_ref()
    }

    /// Dependencies in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[Source] {
        &self.dependencies
    }

    /// The module's own patches.
    #[must_use]
    pub const fn patches(&self) -> &PatchSet {
        &self.patches
    }

    /// Resolved bootstrap settings.
    #[must_use]
    pub const fn autoexec(&self) -> AutoexecConfig {
        self.autoexec
    }

    /// Collect the module tree below `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Io`] when a file cannot be read, and propagates
    /// errors from dependencies and patches.
    pub fn collect(
        &self,
        prefix: &ArchivePath,
        fetcher: &dyn Fetcher,
        observer: &mut dyn BuildObserver,
    ) -> Result<FileMap> {
        observer.on_event(BuildEvent::CollectingLocal {
            path: self.root.clone(),
        });
        let mut files = FileMap::new();
        read_tree(&self.root, prefix, &mut files)?;
        for dependency in &self.dependencies {
            let child = dependency.collect(&prefix.join(dependency.name()), fetcher, observer)?;
            files.extend(child);
        }
        self.patches.apply(&mut files, prefix, observer)?;
        Ok(files)
    }
}

/// Read every regular file below `dir` into `files`, keyed below `at`.
/// Built archives are skipped.
///
/// Symbolic links to files are followed; links to directories are not.
fn read_tree(dir: &Utf8Path, at: &ArchivePath, files: &mut FileMap) -> Result<()> {
    let mut entries = dir
        .read_dir_utf8()
        .map_err(|e| PackError::io(dir, e))?
        .map(|entry| entry.map(|e| e.path().to_path_buf()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| PackError::io(dir, e))?;
    entries.sort();

    for path in entries {
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let target = at.join(file_name);
        let link = path
            .symlink_metadata()
            .map_err(|e| PackError::io(&path, e))?
            .file_type()
            .is_symlink();
        let metadata = path.metadata().map_err(|e| PackError::io(&path, e))?;
        if metadata.is_dir() {
            if !link {
                read_tree(&path, &target, files)?;
            }
        } else if metadata.is_file() && path.extension() != Some(ARCHIVE_EXTENSION) {
            let data = std::fs::read(&path).map_err(|e| PackError::io(&path, e))?;
            files.insert(target, data);
        }
    }
    Ok(())
}
