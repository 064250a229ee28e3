//! Ordered mapping from archive path to file contents.

use indexmap::IndexMap;

use crate::archive_path::ArchivePath;

/// Collected files keyed by [`ArchivePath`], in insertion order.
///
/// Inserting an existing key replaces its contents but keeps the position
/// of the first insertion, so archive entry order reflects the order in
/// which paths were first discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMap {
    entries: IndexMap<ArchivePath, Vec<u8>>,
}

impl FileMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the contents stored at `path`.
    ///
    /// Returns the previous contents when the path was already present.
    pub fn insert(&mut self, path: ArchivePath, data: Vec<u8>) -> Option<Vec<u8>> {
        self.entries.insert(path, data)
    }

    /// Move every entry of `other` into this map, in `other`'s order.
    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Contents stored at `path`.
    #[must_use]
    pub fn get(&self, path: &ArchivePath) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    /// Mutable contents stored at `path`.
    pub fn get_mut(&mut self, path: &ArchivePath) -> Option<&mut Vec<u8>> {
        self.entries.get_mut(path)
    }

    /// Iterate over `(path, contents)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ArchivePath, &[u8])> {
        self.entries.iter().map(|(path, data)| (path, data.as_slice()))
    }

    /// Iterate over paths in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &ArchivePath> {
        self.entries.keys()
    }
}

impl IntoIterator for FileMap {
    type Item = (ArchivePath, Vec<u8>);
    type IntoIter = indexmap::map::IntoIter<ArchivePath, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(ArchivePath, Vec<u8>)> for FileMap {
    fn from_iter<I: IntoIterator<Item = (ArchivePath, Vec<u8>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of(entries: &[(&str, &str)]) -> FileMap {
        entries
            .iter()
            .map(|(path, data)| (ArchivePath::new(path), data.as_bytes().to_vec()))
            .collect()
    }

    fn paths(map: &FileMap) -> Vec<&str> {
        map.paths().map(ArchivePath::as_str).collect()
    }

    #[test]
    fn collision_keeps_first_position_and_last_value() {
        let mut map = map_of(&[("a.be", "1"), ("b.be", "2")]);
        let previous = map.insert(ArchivePath::new("a.be"), b"3".to_vec());

        assert_eq!(previous.as_deref(), Some(b"1".as_slice()));
        assert_eq!(paths(&map), ["a.be", "b.be"]);
        assert_eq!(map.get(&ArchivePath::new("a.be")), Some(b"3".as_slice()));
    }

    #[test]
    fn extend_appends_new_paths_after_existing() {
        let mut map = map_of(&[("a.be", "1"), ("b.be", "2")]);
        map.extend(map_of(&[("dep/c.be", "3"), ("b.be", "4")]));

        assert_eq!(paths(&map), ["a.be", "b.be", "dep/c.be"]);
        assert_eq!(map.get(&ArchivePath::new("b.be")), Some(b"4".as_slice()));
    }
}
