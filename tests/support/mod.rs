//! Shared fixtures for the packaging integration suites.
//!
//! Exposes a [`ModuleTree`] builder that lays out module directories inside a
//! temporary workspace, a [`StaticFetcher`] that serves canned archives and
//! release metadata without network access, and helpers for building and
//! reading ZIP payloads.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read, Write};

use camino::Utf8PathBuf;
use tappack::fetch::{FetchError, Fetcher};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// A temporary workspace holding one or more module directories.
pub struct ModuleTree {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl ModuleTree {
    /// Create an empty workspace.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .expect("utf-8 temp dir")
            .canonicalize_utf8()
            .expect("canonical temp dir");
        Self { _dir: dir, root }
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> &Self {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(&path, contents).expect("write fixture file");
        self
    }

    /// Absolute path of `relative` inside the workspace.
    pub fn path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }
}

/// Serves fixed responses per URL and counts requests.
#[derive(Default)]
pub struct StaticFetcher {
    bytes: HashMap<String, Vec<u8>>,
    json: HashMap<String, serde_json::Value>,
    calls: RefCell<Vec<String>>,
}

impl StaticFetcher {
    /// Serve `body` for downloads of `url`.
    pub fn with_bytes(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bytes.insert(url.to_owned(), body);
        self
    }

    /// Serve `body` for API requests to `url`.
    pub fn with_json(mut self, url: &str, body: serde_json::Value) -> Self {
        self.json.insert(url.to_owned(), body);
        self
    }

    /// How often `url` was requested.
    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.borrow().iter().filter(|seen| *seen == url).count()
    }

    fn record(&self, url: &str) {
        self.calls.borrow_mut().push(url.to_owned());
    }
}

fn not_found(url: &str) -> FetchError {
    FetchError::Status {
        url: url.to_owned(),
        status: 404,
    }
}

impl Fetcher for StaticFetcher {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.record(url);
        self.bytes.get(url).cloned().ok_or_else(|| not_found(url))
    }

    fn fetch_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        self.record(url);
        self.json.get(url).cloned().ok_or_else(|| not_found(url))
    }
}

/// Build a ZIP archive holding `entries`.
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start entry");
        writer.write_all(contents.as_bytes()).expect("write entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Read every entry of `archive` in stored order.
pub fn archive_entries(archive: &[u8]) -> Vec<(String, String)> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).expect("valid zip");
    (0..zip.len())
        .map(|index| {
            let mut file = zip.by_index(index).expect("entry");
            let mut text = String::new();
            file.read_to_string(&mut text).expect("utf-8 entry");
            (file.name().to_owned(), text)
        })
        .collect()
}

/// Look up the contents of `name` in `entries`.
pub fn entry<'a>(entries: &'a [(String, String)], name: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|(entry_name, _)| entry_name == name)
        .map(|(_, text)| text.as_str())
}

