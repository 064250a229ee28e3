//! Assembly of the output `.tapp` archive.
//!
//! A `.tapp` file is a ZIP archive with stored (uncompressed) entries, which
//! Tasmota reads in place. The bootstrap file is always the first entry.
//! Every entry carries the same fixed modification time, so identical
//! inputs produce byte-identical archives.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::archive_path::ArchivePath;
use crate::error::{PackError, Result};
use crate::events::{BuildEvent, BuildObserver};
use crate::file_map::FileMap;

/// Name of the bootstrap entry at the archive root.
pub const BOOTSTRAP_FILE_NAME: &str = "autoexec.be";

/// Extension of output archives.
pub const ARCHIVE_EXTENSION: &str = "tapp";

/// Build the archive bytes from a generated bootstrap and collected files.
///
/// When `files` already holds a root `autoexec.be`, that file takes the
/// first slot instead of `generated` and a
/// [`BuildEvent::BootstrapOverridden`] is emitted.
///
/// # Errors
///
/// Returns [`PackError::ArchiveWrite`] when an entry cannot be written.
///
/// # Examples
///
/// ```
/// use tappack::archive::build_archive;
/// use tappack::events::LogObserver;
/// use tappack::file_map::FileMap;
///
/// let bytes = build_archive(b"print('hi')", &FileMap::new(), &mut LogObserver)
///     .expect("archive");
/// assert!(bytes.starts_with(b"PK"));
/// ```
pub fn build_archive(
    generated: &[u8],
    files: &FileMap,
    observer: &mut dyn BuildObserver,
) -> Result<Vec<u8>> {
    let bootstrap_path = ArchivePath::new(BOOTSTRAP_FILE_NAME);
    let bootstrap = match files.get(&bootstrap_path) {
        Some(own) => {
            observer.on_event(BuildEvent::BootstrapOverridden);
            own
        }
        None => generated,
    };

    let mut writer = EntryWriter::new();
    writer.write(&bootstrap_path, bootstrap, observer)?;
    for (path, data) in files.iter().filter(|(path, _)| **path != bootstrap_path) {
        writer.write(path, data, observer)?;
    }
    writer.finish()
}

/// ZIP writer producing stored entries with a fixed timestamp.
struct EntryWriter {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl EntryWriter {
    fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default()
                .compression_method(CompressionMethod::Stored)
                .last_modified_time(DateTime::default()),
        }
    }

    fn write(
        &mut self,
        path: &ArchivePath,
        data: &[u8],
        observer: &mut dyn BuildObserver,
    ) -> Result<()> {
        let failed = |reason: String| PackError::ArchiveWrite {
            entry: path.to_string(),
            reason,
        };
        observer.on_event(BuildEvent::ArchiveEntry {
            path: path.clone(),
            size: data.len(),
        });
        self.writer
            .start_file(path.as_str(), self.options)
            .map_err(|e| failed(e.to_string()))?;
        self.writer
            .write_all(data)
            .map_err(|e| failed(e.to_string()))
    }

    fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.writer.finish().map_err(|e| PackError::ArchiveWrite {
            entry: "central directory".to_owned(),
            reason: e.to_string(),
        })?;
        Ok(cursor.into_inner())
    }
}
