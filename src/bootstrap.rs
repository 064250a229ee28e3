//! Generation of the `autoexec.be` bootstrap file.
//!
//! Tasmota runs `autoexec.be` when it loads an application archive. The
//! generated file adds every directory holding Berry sources to the
//! interpreter's search path and optionally imports the root module. It is
//! rendered from a template with four placeholders: `{paths}`,
//! `{module_name}`, `{import}` and `{channel_id}`. Other braces are left
//! alone, since Berry uses them for map literals.

use std::collections::BTreeSet;

use camino::Utf8Path;

use crate::archive_path::ArchivePath;
use crate::channel::ChannelId;
use crate::error::{PackError, Result};
use crate::file_map::FileMap;

/// Extensions of Berry source and compiled files.
pub const SOURCE_EXTENSIONS: [&str; 2] = ["be", "bec"];

/// The built-in bootstrap template.
pub const DEFAULT_TEMPLATE: &str = include_str!("autoexec.be.template");

/// Directories holding Berry files, excluding the archive root, sorted.
///
/// # Examples
///
/// ```
/// use tappack::archive_path::ArchivePath;
/// use tappack::bootstrap::submodule_paths;
/// use tappack::file_map::FileMap;
///
/// let files: FileMap = [
///     (ArchivePath::new("init.be"), Vec::new()),
///     (ArchivePath::new("D/x/y.be"), Vec::new()),
///     (ArchivePath::new("D/x/z.bec"), Vec::new()),
///     (ArchivePath::new("D/readme.md"), Vec::new()),
/// ]
/// .into_iter()
/// .collect();
/// let paths = submodule_paths(&files);
/// assert_eq!(paths, [ArchivePath::new("D/x")]);
/// ```
#[must_use]
pub fn submodule_paths(files: &FileMap) -> Vec<ArchivePath> {
    files
        .paths()
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
        })
        .map(ArchivePath::parent)
        .filter(|dir| !dir.is_root())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Values substituted into a [`BootstrapTemplate`].
#[derive(Debug, Clone, Copy)]
pub struct BootstrapParams<'a> {
    /// Directories added to the search path.
    pub paths: &'a [ArchivePath],
    /// Name of the root module.
    pub module_name: &'a str,
    /// Whether the root module is imported.
    pub auto_import: bool,
    /// Active release channel.
    pub channel_id: Option<&'a ChannelId>,
}

/// A bootstrap template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapTemplate {
    text: String,
}

impl BootstrapTemplate {
    /// Wrap template text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read a template from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Io`] when the file cannot be read as UTF-8.
    pub fn from_file(path: &Utf8Path) -> Result<Self> {
        std::fs::read_to_string(path)
            .map(Self::new)
            .map_err(|e| PackError::io(path, e))
    }

    /// Substitute the placeholders in a single pass.
    ///
    /// Substituted values are never rescanned, so a module name containing
    /// `{paths}` is inserted literally.
    ///
    /// # Examples
    ///
    /// ```
    /// use tappack::archive_path::ArchivePath;
    /// use tappack::bootstrap::{BootstrapParams, BootstrapTemplate};
    /// use tappack::channel::ChannelId;
    ///
    /// let template = BootstrapTemplate::new("{module_name} {paths} {import} {channel_id} {x}");
    /// let paths = [ArchivePath::new("D/x")];
    /// let channel = ChannelId::from("qa");
    /// let text = template.render(&BootstrapParams {
    ///     paths: &paths,
    ///     module_name: "app",
    ///     auto_import: true,
    ///     channel_id: Some(&channel),
    /// });
    /// assert_eq!(text, r#"app ["D/x"] true "qa" {x}"#);
    /// ```
    #[must_use]
    pub fn render(&self, params: &BootstrapParams<'_>) -> String {
        let mut rendered = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();
        while let Some(position) = rest.find('{') {
            let (head, tail) = rest.split_at(position);
            rendered.push_str(head);
            match substitution(tail, params) {
                Some((value, after)) => {
                    rendered.push_str(&value);
                    rest = after;
                }
                None => {
                    rendered.push('{');
                    rest = tail.get(1..).unwrap_or_default();
                }
            }
        }
        rendered.push_str(rest);
        rendered
    }
}

impl Default for BootstrapTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

/// Match a placeholder at the start of `text`, returning its value and the
/// remaining text.
fn substitution<'t>(text: &'t str, params: &BootstrapParams<'_>) -> Option<(String, &'t str)> {
    let placeholders: [(&str, fn(&BootstrapParams<'_>) -> String); 4] = [
        ("{paths}", |p| berry_list(p.paths)),
        ("{module_name}", |p| p.module_name.to_owned()),
        ("{import}", |p| p.auto_import.to_string()),
        ("{channel_id}", |p| {
            p.channel_id
                .map_or_else(|| "nil".to_owned(), |id| berry_string(id.as_str()))
        }),
    ];
    placeholders.iter().find_map(|(placeholder, value)| {
        text.strip_prefix(placeholder)
            .map(|after| (value(params), after))
    })
}

fn berry_list(paths: &[ArchivePath]) -> String {
    let items: Vec<String> = paths.iter().map(|p| berry_string(p.as_str())).collect();
    format!("[{}]", items.join(", "))
}

fn berry_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}
