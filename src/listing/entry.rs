use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::core::Result;
use crate::core::error::IoContext;
use crate::core::utils;
use crate::listing::walk::Visit;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    SymlinkToFile,
    SymlinkToDir,
}

impl EntryKind {
    /// True for directories and links resolving to one.
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory | EntryKind::SymlinkToDir)
    }

    pub fn is_file(&self) -> bool {
        matches!(self, EntryKind::File | EntryKind::SymlinkToFile)
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self, EntryKind::SymlinkToFile | EntryKind::SymlinkToDir)
    }
}

/// One record of a directory listing.
///
/// The name and path strings use `/` as separator and are meant for display; names that are not
/// valid UTF-8 show replacement characters there. [`Entry::path`] is the exact on-disk path.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    index: usize,
    base_name: String,
    extension: String,
    full_name: String,
    parent_dir: String,
    full_path: String,
    path: PathBuf,
    kind: EntryKind,
    depth: usize,
}

impl Entry {
    pub(crate) fn new(index: usize, visit: &Visit<'_>) -> Entry {
        let (base_name, extension) = utils::split_name(visit.name);
        Entry {
            index,
            base_name: base_name.to_string(),
            extension: extension.to_string(),
            full_name: visit.name.to_string(),
            parent_dir: visit.dir.to_string(),
            full_path: utils::join_slashed(visit.dir, visit.name),
            path: visit.path.to_path_buf(),
            kind: visit.kind,
            depth: visit.depth,
        }
    }

    /// 1-based position in the listing it belongs to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Name without its last extension.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Extension without the dot, as found on disk (not case-folded).
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn parent_dir(&self) -> &str {
        &self.parent_dir
    }

    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Nesting level below the listing root; direct children are at depth 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Stats the entry now and combines the result with the recorded names.
    pub fn info(&self) -> Result<FileInfo> {
        let path = self.path.as_path();
        // links are described as links, so dangling ones can still be stat'ed
        let meta = if self.kind.is_symlink() {
            std::fs::symlink_metadata(path)
        } else {
            std::fs::metadata(path)
        }
        .at(path)?;

        Ok(FileInfo {
            barename: self.base_name.clone(),
            ext: self.extension.clone(),
            name: self.full_name.clone(),
            dir: self.parent_dir.clone(),
            fullname: self.full_path.clone(),
            kind: self.kind,
            level: self.depth,
            mode: stat::mode(&meta),
            size: meta.len(),
            atime: meta.accessed().ok(),
            mtime: meta.modified().ok(),
            ctime: stat::ctime(&meta),
            is_directory: self.kind.is_dir(),
        })
    }
}

/// Names of a listed entry plus a fresh `stat` of it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    pub barename: String,
    pub ext: String,
    pub name: String,
    pub dir: String,
    pub fullname: String,
    pub kind: EntryKind,
    pub level: usize,
    pub mode: u32,
    pub size: u64,
    pub atime: Option<SystemTime>,
    pub mtime: Option<SystemTime>,
    pub ctime: Option<SystemTime>,
    pub is_directory: bool,
}

#[cfg(unix)]
mod stat {
    use std::fs::Metadata;
    use std::os::unix::fs::MetadataExt;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn mode(meta: &Metadata) -> u32 {
        meta.mode()
    }

    pub fn ctime(meta: &Metadata) -> Option<SystemTime> {
        let secs = u64::try_from(meta.ctime()).ok()?;
        let nanos = u32::try_from(meta.ctime_nsec()).ok()?;
        UNIX_EPOCH.checked_add(Duration::new(secs, nanos))
    }
}

#[cfg(not(unix))]
mod stat {
    use std::fs::Metadata;
    use std::time::SystemTime;

    pub fn mode(meta: &Metadata) -> u32 {
        if meta.permissions().readonly() { 0o444 } else { 0o666 }
    }

    pub fn ctime(meta: &Metadata) -> Option<SystemTime> {
        meta.created().ok()
    }
}
