//! Semantic wrapper for paths inside a TAPP archive.
//!
//! Archive paths are relative, use `/` as separator, and never contain empty
//! or `.` segments. [`ArchivePath`] normalises on construction so that keys
//! built from a filesystem walk, a ZIP listing, or a manifest entry compare
//! equal when they name the same file.

use std::fmt;

/// A normalised, relative, forward-slash path inside an archive.
///
/// The empty path denotes the archive root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// The archive root.
    #[must_use]
    pub const fn root() -> Self {
        Self(String::new())
    }

    /// Create a path, normalising separators and dropping empty and `.`
    /// segments.
    ///
    /// # Example
    ///
    /// ```
    /// use tappack::archive_path::ArchivePath;
    ///
    /// let path = ArchivePath::new("./lib\\util//math.be");
    /// assert_eq!(path.as_str(), "lib/util/math.be");
    /// ```
    #[must_use]
    pub fn new(path: &str) -> Self {
        let normalised = path
            .split(['/', '\\'])
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect::<Vec<_>>()
            .join("/");
        Self(normalised)
    }

    /// Get the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether any segment is `..`, so the path may leave the directory it
    /// is joined to.
    ///
    /// # Example
    ///
    /// ```
    /// use tappack::archive_path::ArchivePath;
    ///
    /// assert!(ArchivePath::new("lib/../../x.be").climbs_out());
    /// assert!(!ArchivePath::new("lib/x..be").climbs_out());
    /// ```
    #[must_use]
    pub fn climbs_out(&self) -> bool {
        self.0.split('/').any(|segment| segment == "..")
    }

    /// Whether this is the archive root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Append `child` below this path.
    ///
    /// # Example
    ///
    /// ```
    /// use tappack::archive_path::ArchivePath;
    ///
    /// let prefix = ArchivePath::new("deps");
    /// assert_eq!(prefix.join("x/y.be").as_str(), "deps/x/y.be");
    /// assert_eq!(ArchivePath::root().join("x/y.be").as_str(), "x/y.be");
    /// ```
    #[must_use]
    pub fn join(&self, child: &str) -> Self {
        let tail = Self::new(child);
        if self.is_root() {
            return tail;
        }
        if tail.is_root() {
            return self.clone();
        }
        Self(format!("{}/{}", self.0, tail.0))
    }

    /// The containing directory, or the root for top-level entries.
    #[must_use]
    pub fn parent(&self) -> Self {
        self.0
            .rsplit_once('/')
            .map_or_else(Self::root, |(dir, _)| Self(dir.to_owned()))
    }

    /// The extension of the final segment, without the dot.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let name = self.0.rsplit('/').next()?;
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => Some(ext),
            _ => None,
        }
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ArchivePath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ArchivePath {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("a/b.be", "a/b.be")]
    #[case::dot_prefix("./a/b.be", "a/b.be")]
    #[case::backslashes("a\\b\\c.be", "a/b/c.be")]
    #[case::doubled("a//b/", "a/b")]
    #[case::root(".", "")]
    fn normalises(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(ArchivePath::new(input).as_str(), expected);
    }

    #[rstest]
    #[case::nested("a/b/c.be", "a/b")]
    #[case::top_level("c.be", "")]
    fn parent_of(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(ArchivePath::new(input).parent().as_str(), expected);
    }

    #[rstest]
    #[case::source("lib/a.be", Some("be"))]
    #[case::compiled("a.bec", Some("bec"))]
    #[case::none("lib/Makefile", None)]
    #[case::dotfile(".hidden", None)]
    #[case::dotted_dir("v1.0/readme", None)]
    fn extension_of(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(ArchivePath::new(input).extension(), expected);
    }

    #[test]
    fn join_below_root_and_prefix() {
        let root = ArchivePath::root();
        assert_eq!(root.join("a.be"), ArchivePath::new("a.be"));
        assert_eq!(
            ArchivePath::new("dep").join("sub").join("a.be"),
            ArchivePath::new("dep/sub/a.be")
        );
        assert_eq!(ArchivePath::new("dep").join("."), ArchivePath::new("dep"));
    }
}
