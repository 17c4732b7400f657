//! Filtered, numbered file listings.

use std::path::Path;

use crate::core::{Error, Result, utils};
use crate::listing::entry::{Entry, EntryKind, FileInfo};
use crate::listing::filter::{ExtensionFilter, ListOptions};
use crate::listing::walk::walk;

/// Result of a directory listing: a flat, numbered sequence of entries.
///
/// A root that does not exist is not an error: the listing is returned with `exists() == false`
/// and no entries, so check `exists()` before trusting an empty result.
#[derive(Debug, Clone)]
pub struct Listing {
    root: String,
    exists: bool,
    recursive: bool,
    filter: ExtensionFilter,
    entries: Vec<Entry>,
}

impl Listing {
    pub(crate) fn new(root: String, exists: bool, options: &ListOptions, entries: Vec<Entry>) -> Self {
        Self {
            root,
            exists,
            recursive: options.recursive,
            filter: options.extensions.clone(),
            entries,
        }
    }

    /// The listed directory, with `/` separators.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn filter(&self) -> &ExtensionFilter {
        &self.filter
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Number of collected entries.
    pub fn numfiles(&self) -> usize {
        self.entries.len()
    }

    /// Entry `n` (1-based), if there is one.
    pub fn get(&self, n: usize) -> Option<&Entry> {
        n.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// Describes entry `n` (1-based). The file is stat'ed at call time, so sizes and times reflect
    /// the disk now, not when the listing was taken.
    pub fn getfile(&self, n: usize) -> Result<FileInfo> {
        let entry = self.get(n).ok_or(Error::InvalidIndex {
            index: n,
            count: self.entries.len(),
        })?;
        entry.info()
    }
}

impl<'a> IntoIterator for &'a Listing {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Lists the regular files under `dir` whose extension is in `extensions`.
///
/// * `extensions` - comma-separated list (`"txt, md"`); empty or `*` keeps every file.
/// * `recursive` - descend into subdirectories.
/// * `verbose` - show a progress spinner on stderr.
///
/// Symbolic links, directories and special files are never listed. Files are numbered from 1 in
/// visiting order across the whole walk.
///
/// ### Example:
/// ```
/// let dir = std::env::temp_dir().join("file_kit_doc_readfiles");
/// std::fs::create_dir_all(dir.join("sub")).unwrap();
/// std::fs::write(dir.join("a.txt"), b"a").unwrap();
/// std::fs::write(dir.join("sub/c.txt"), b"c").unwrap();
///
/// let listing = file_kit::readfiles(&dir.to_string_lossy(), "txt", true, false).unwrap();
/// assert_eq!(listing.numfiles(), 2);
/// assert_eq!(listing.getfile(1).unwrap().name, "a.txt");
/// # std::fs::remove_dir_all(&dir).unwrap();
/// ```
pub fn readfiles(dir: &str, extensions: &str, recursive: bool, verbose: bool) -> Result<Listing> {
    let options = ListOptions::new()
        .extensions(extensions)
        .recursive(recursive)
        .verbose(verbose);
    readfiles_with(dir, &options)
}

/// [`readfiles`] taking its settings as [`ListOptions`].
pub fn readfiles_with(dir: &str, options: &ListOptions) -> Result<Listing> {
    let root = utils::to_slashes(dir);
    let mut entries = Vec::new();

    let exists = walk(Path::new(dir), options.recursive, options.verbose, |visit| {
        if visit.kind != EntryKind::File {
            return;
        }
        let (_, extension) = utils::split_name(visit.name);
        if options.extensions.matches(extension) {
            let index = entries.len() + 1;
            entries.push(Entry::new(index, visit));
        }
    })?;

    tracing::debug!(root = %root, exists, count = entries.len(), "listed files");
    Ok(Listing::new(root, exists, options, entries))
}
