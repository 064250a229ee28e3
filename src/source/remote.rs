//! ZIP archives downloaded from a direct URL.

use std::io::{Cursor, Read};

use camino::Utf8PathBuf;

use crate::archive_path::ArchivePath;
use crate::error::{PackError, Result};
use crate::events::{BuildEvent, BuildObserver};
use crate::fetch::{FetchError, Fetcher};
use crate::file_map::FileMap;

/// A dependency whose files are the entries of a remote ZIP archive.
///
/// Remote archives are leaves: any manifest they contain is packaged as a
/// plain file and not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArchiveSource {
    name: String,
    url: String,
}

impl RemoteArchiveSource {
    /// Create a source for the archive at `url`.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// The dependency name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The archive URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download the archive and key its file entries below `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Network`] when the download fails and
    /// [`PackError::Format`] when the body is not a usable ZIP archive.
    pub fn collect(
        &self,
        prefix: &ArchivePath,
        fetcher: &dyn Fetcher,
        observer: &mut dyn BuildObserver,
    ) -> Result<FileMap> {
        observer.on_event(BuildEvent::Downloading {
            name: self.name.clone(),
            url: self.url.clone(),
        });
        let bytes = fetcher.fetch_bytes(&self.url).map_err(network_error)?;
        read_archive(&bytes, &self.url, prefix)
    }
}

/// Convert a failed download into a [`PackError::Network`].
pub(crate) fn network_error(err: FetchError) -> PackError {
    PackError::Network {
        url: err.url().to_owned(),
        reason: err.to_string(),
    }
}

/// Read every file entry of the ZIP archive in `bytes`, keyed below
/// `prefix`. Directory entries are skipped.
///
/// # Errors
///
/// Returns [`PackError::Format`] when the archive cannot be decoded or an
/// entry escapes the archive root.
pub fn read_archive(bytes: &[u8], origin: &str, prefix: &ArchivePath) -> Result<FileMap> {
    let format_error = |reason: String| PackError::Format {
        origin: origin.to_owned(),
        reason,
    };
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| format_error(e.to_string()))?;
    let mut files = FileMap::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| format_error(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let relative = entry
            .enclosed_name()
            .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
            .ok_or_else(|| {
                format_error(format!("entry {:?} escapes the archive root", entry.name()))
            })?;
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| format_error(format!("cannot read entry {relative}: {e}")))?;
        files.insert(prefix.join(relative.as_str()), data);
    }
    Ok(files)
}
