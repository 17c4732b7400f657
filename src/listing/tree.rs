//! Directory-tree listings: directories only (`readdirs`), or directories and files side by side
//! (`dirlist`).

use std::path::Path;

use crate::core::{Result, utils};
use crate::listing::entry::{Entry, EntryKind};
use crate::listing::files::Listing;
use crate::listing::filter::{ExtensionFilter, ListOptions};
use crate::listing::walk::walk;

/// Directories and files of a tree, in two separately numbered sequences.
#[derive(Debug, Clone)]
pub struct TreeListing {
    root: String,
    exists: bool,
    recursive: bool,
    dirs: Vec<Entry>,
    files: Vec<Entry>,
}

impl TreeListing {
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Directories and links to directories.
    pub fn dirs(&self) -> &[Entry] {
        &self.dirs
    }

    /// Regular files and links to files (dangling links included).
    pub fn files(&self) -> &[Entry] {
        &self.files
    }
}

/// Lists the directories under `dir`, each with its depth. Symbolic links are skipped.
/// The result's filter is always [`ExtensionFilter::All`].
///
/// All subdirectories of a directory are listed before any of them is descended into, so the order
/// is not a tree pre-order: `docs`, `src`, then `docs/drafts`.
pub fn readdirs(dir: &str, recursive: bool, verbose: bool) -> Result<Listing> {
    let options = ListOptions::new()
        .extensions(ExtensionFilter::All)
        .recursive(recursive)
        .verbose(verbose);
    let root = utils::to_slashes(dir);
    let mut dirs = Vec::new();

    let exists = walk(Path::new(dir), recursive, verbose, |visit| {
        if visit.kind == EntryKind::Directory {
            let index = dirs.len() + 1;
            dirs.push(Entry::new(index, visit));
        }
    })?;

    tracing::debug!(root = %root, exists, count = dirs.len(), "listed directories");
    Ok(Listing::new(root, exists, &options, dirs))
}

/// Lists directories and files under `dir`. Symbolic links are listed with their own kind
/// ([`EntryKind::SymlinkToDir`] / [`EntryKind::SymlinkToFile`]) but never followed.
/// `extensions` filters the files only. Directories come in the same order as in [`readdirs`].
pub fn dirlist(dir: &str, extensions: &str, recursive: bool, verbose: bool) -> Result<TreeListing> {
    let options = ListOptions::new()
        .extensions(extensions)
        .recursive(recursive)
        .verbose(verbose);
    dirlist_with(dir, &options)
}

/// [`dirlist`] taking its settings as [`ListOptions`].
pub fn dirlist_with(dir: &str, options: &ListOptions) -> Result<TreeListing> {
    let root = utils::to_slashes(dir);
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    let exists = walk(Path::new(dir), options.recursive, options.verbose, |visit| {
        if visit.kind.is_dir() {
            let index = dirs.len() + 1;
            dirs.push(Entry::new(index, visit));
            return;
        }
        let (_, extension) = utils::split_name(visit.name);
        if options.extensions.matches(extension) {
            let index = files.len() + 1;
            files.push(Entry::new(index, visit));
        }
    })?;

    tracing::debug!(
        root = %root,
        exists,
        dirs = dirs.len(),
        files = files.len(),
        "listed tree"
    );
    Ok(TreeListing {
        root,
        exists,
        recursive: options.recursive,
        dirs,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    mod readdirs {
        use super::*;

        #[test]
        fn test_readdirs_recursive_depths() {
            let temp_dir = setup_test_env();
            let root = root_of(&temp_dir);

            let listing = readdirs(&root, true, false).unwrap();

            let dirs: Vec<_> = listing.iter().map(|e| (e.full_name(), e.depth())).collect();
            assert_eq!(dirs, vec![("docs", 1), ("src", 1), ("drafts", 2)]);
            assert!(listing.iter().all(|e| e.kind() == EntryKind::Directory));
        }

        #[test]
        fn test_readdirs_flat() {
            let temp_dir = setup_test_env();
            let listing = readdirs(&root_of(&temp_dir), false, false).unwrap();

            let dirs: Vec<_> = listing.iter().map(|e| e.full_name()).collect();
            assert_eq!(dirs, vec!["docs", "src"]);
        }

        #[test]
        fn test_readdirs_getfile_reports_directory() {
            let temp_dir = setup_test_env();
            let listing = readdirs(&root_of(&temp_dir), true, false).unwrap();

            let info = listing.getfile(3).unwrap();

            assert!(info.is_directory);
            assert_eq!(info.name, "drafts");
            assert_eq!(info.level, 2);
        }

        #[test]
        fn test_readdirs_missing_root() {
            let temp_dir = setup_test_env();
            let listing = readdirs(&format!("{}/void", root_of(&temp_dir)), true, false).unwrap();

            assert!(!listing.exists());
            assert_eq!(listing.numfiles(), 0);
        }
    }

    mod dirlist {
        use super::*;

        #[test]
        fn test_dirlist_recursive() {
            let temp_dir = setup_test_env();
            let root = root_of(&temp_dir);

            let tree = dirlist(&root, "", true, false).unwrap();

            assert!(tree.exists());
            assert!(tree.is_recursive());
            let dirs: Vec<_> = tree.dirs().iter().map(|e| e.full_name()).collect();
            let files: Vec<_> = tree.files().iter().map(|e| e.full_path()).collect();
            assert_eq!(dirs, vec!["docs", "src", "drafts"]);
            assert_eq!(
                files,
                vec![
                    format!("{root}/README.md"),
                    format!("{root}/docs/guide.md"),
                    format!("{root}/docs/drafts/wip.txt"),
                    format!("{root}/src/main.rs"),
                ]
            );
            let indices: Vec<_> = tree.files().iter().map(|e| e.index()).collect();
            assert_eq!(indices, vec![1, 2, 3, 4]);
        }

        #[test]
        fn test_dirlist_filters_files_only() {
            let temp_dir = setup_test_env();
            let tree = dirlist(&root_of(&temp_dir), "md", true, false).unwrap();

            assert_eq!(tree.dirs().len(), 3);
            let files: Vec<_> = tree.files().iter().map(|e| e.full_name()).collect();
            assert_eq!(files, vec!["README.md", "guide.md"]);
        }

        #[cfg(unix)]
        #[test]
        fn test_dirlist_lists_symlinks() {
            use std::os::unix::fs::symlink;

            let temp_dir = setup_test_env();
            let root = temp_dir.path();
            symlink(root.join("docs"), root.join("docs_link")).unwrap();
            symlink(root.join("README.md"), root.join("readme_link")).unwrap();

            let tree = dirlist(&root_of(&temp_dir), "", true, false).unwrap();

            let link_dir = tree.dirs().iter().find(|e| e.full_name() == "docs_link").unwrap();
            assert_eq!(link_dir.kind(), EntryKind::SymlinkToDir);
            let link_file = tree.files().iter().find(|e| e.full_name() == "readme_link").unwrap();
            assert_eq!(link_file.kind(), EntryKind::SymlinkToFile);
            // not followed: guide.md appears once
            assert_eq!(tree.files().iter().filter(|e| e.full_name() == "guide.md").count(), 1);
        }

        #[test]
        fn test_dirlist_missing_root() {
            let temp_dir = setup_test_env();
            let tree = dirlist(&format!("{}/void", root_of(&temp_dir)), "", true, false).unwrap();

            assert!(!tree.exists());
            assert!(tree.dirs().is_empty());
            assert!(tree.files().is_empty());
        }
    }

    /// README.md, docs/guide.md, docs/drafts/wip.txt, src/main.rs
    fn setup_test_env() -> TempDir {
        let temp_dir = TempDir::new("tree_test").unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("docs/drafts")).unwrap();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("README.md"), b"# readme").unwrap();
        std::fs::write(root.join("docs/guide.md"), b"guide").unwrap();
        std::fs::write(root.join("docs/drafts/wip.txt"), b"wip").unwrap();
        std::fs::write(root.join("src/main.rs"), b"fn main() {}").unwrap();
        temp_dir
    }

    fn root_of(temp_dir: &TempDir) -> String {
        utils::to_slashes(temp_dir.path().to_string_lossy())
    }
}
