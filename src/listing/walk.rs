//! Directory traversal shared by all listers.
//!
//! The walk is depth-first over an explicit stack: inside each directory the non-directory entries
//! are reported first, then the subdirectories, and only then (when recursive) is each
//! subdirectory walked in turn. Entries are taken in name order. Symbolic links are
//! reported with their resolved kind but never descended into, so link cycles cannot trap the walk.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::core::{Error, Result, utils};
use crate::listing::entry::EntryKind;
use crate::listing::progress::Progress;

/// Host artifacts that are never reported, compared case-insensitively.
const EXCLUDED_NAMES: [&str; 2] = ["system volume information", "recycler"];

/// An entry met during the walk.
pub(crate) struct Visit<'a> {
    /// On-disk path, built from the raw name.
    pub path: &'a Path,
    /// Parent directory with `/` separators, for display.
    pub dir: &'a str,
    /// Name decoded lossily, for display and extension matching.
    pub name: &'a str,
    pub kind: EntryKind,
    pub depth: usize,
}

struct Frame {
    path: PathBuf,
    display: String,
    depth: usize,
}

/// Walks `root` and calls `visit` for every reportable entry.
///
/// Returns `Ok(false)` without visiting anything when `root` does not exist. Failing to open the
/// root itself is an error; an unreadable subdirectory or entry is logged and skipped.
pub(crate) fn walk<F>(root: &Path, recursive: bool, verbose: bool, mut visit: F) -> Result<bool>
where
    F: FnMut(&Visit<'_>),
{
    if !root.exists() {
        tracing::debug!(root = %root.display(), "listing root does not exist");
        return Ok(false);
    }

    let progress = Progress::new(verbose);
    let mut stack = vec![Frame {
        path: root.to_path_buf(),
        display: utils::to_slashes(root.to_string_lossy()),
        depth: 0,
    }];

    while let Some(frame) = stack.pop() {
        let children = match read_children(&frame.path) {
            Ok(children) => children,
            Err(e) if frame.depth == 0 => {
                return Err(Error::DirectoryOpenFailed {
                    path: frame.path,
                    source: e,
                });
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable directory {}: {}", frame.display, e);
                continue;
            }
        };

        let depth = frame.depth + 1;
        let (dirs, others): (Vec<_>, Vec<_>) = children
            .into_iter()
            .partition(|(_, kind)| *kind == EntryKind::Directory);

        for (raw_name, kind) in others.iter().chain(dirs.iter()) {
            let path = frame.path.join(raw_name);
            let name = raw_name.to_string_lossy();
            progress.visit(&utils::join_slashed(&frame.display, &name));
            tracing::trace!(dir = %frame.display, name = %name, ?kind, depth, "visit");
            visit(&Visit {
                path: &path,
                dir: &frame.display,
                name: &name,
                kind: *kind,
                depth,
            });
        }

        if recursive {
            // reversed, so the first subdirectory is walked first
            for (raw_name, _) in dirs.iter().rev() {
                stack.push(Frame {
                    path: frame.path.join(raw_name),
                    display: utils::join_slashed(&frame.display, &raw_name.to_string_lossy()),
                    depth,
                });
            }
        }
    }

    Ok(true)
}

/// Reads one directory level, classified and sorted by name. Excluded and unreadable entries are
/// dropped, as are special files (sockets, fifos, devices).
fn read_children(dir: &Path) -> std::io::Result<Vec<(OsString, EntryKind)>> {
    let mut children = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), "skipping unreadable entry: {e}");
                continue;
            }
        };
        let name = entry.file_name();
        if is_excluded(&name.to_string_lossy()) {
            continue;
        }

        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), ?name, "skipping entry without type: {e}");
                continue;
            }
        };

        let kind = if file_type.is_symlink() {
            // a dangling link is reported as a link to a file
            match std::fs::metadata(entry.path()) {
                Ok(meta) if meta.is_dir() => EntryKind::SymlinkToDir,
                _ => EntryKind::SymlinkToFile,
            }
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            continue;
        };

        children.push((name, kind));
    }

    children.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(children)
}

fn is_excluded(name: &str) -> bool {
    if name == "." || name == ".." {
        return true;
    }
    let lower = name.to_lowercase();
    EXCLUDED_NAMES.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_is_excluded() {
        assert!(is_excluded("."));
        assert!(is_excluded(".."));
        assert!(is_excluded("System Volume Information"));
        assert!(is_excluded("RECYCLER"));
        assert!(!is_excluded("recycled"));
        assert!(!is_excluded(".hidden"));
    }

    #[test]
    fn test_walk_missing_root() {
        let temp_dir = setup_test_env();
        let root = temp_dir.path().join("nope");
        let mut visited = 0;

        let exists = walk(&root, true, false, |_| visited += 1).unwrap();

        assert!(!exists);
        assert_eq!(visited, 0);
    }

    #[test]
    fn test_walk_root_is_file() {
        let temp_dir = setup_test_env();
        let file = temp_dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();

        let err = walk(&file, true, false, |_| {}).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DirectoryOpenFailed);
    }

    #[test]
    fn test_walk_preorder_files_first() {
        let temp_dir = setup_test_env();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("a/deep")).unwrap();
        std::fs::create_dir_all(root.join("b")).unwrap();
        std::fs::write(root.join("z.txt"), b"").unwrap();
        std::fs::write(root.join("a/1.txt"), b"").unwrap();
        std::fs::write(root.join("a/deep/2.txt"), b"").unwrap();
        std::fs::write(root.join("b/3.txt"), b"").unwrap();

        let mut seen = Vec::new();
        walk(root, true, false, |v| {
            seen.push((v.name.to_string(), v.depth))
        })
        .unwrap();

        let expected = [
            ("z.txt", 1),
            ("a", 1),
            ("b", 1),
            ("1.txt", 2),
            ("deep", 2),
            ("2.txt", 3),
            ("3.txt", 2),
        ];
        let expected: Vec<_> = expected.iter().map(|(n, d)| (n.to_string(), *d)).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_walk_not_recursive_reports_subdirs_only() {
        let temp_dir = setup_test_env();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("sub/inner.txt"), b"").unwrap();

        let mut seen = Vec::new();
        walk(root, false, false, |v| seen.push(v.name.to_string())).unwrap();

        assert_eq!(seen, vec!["sub".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_classifies_but_does_not_follow_links() {
        use std::os::unix::fs::symlink;

        let temp_dir = setup_test_env();
        let root = temp_dir.path();
        std::fs::create_dir(root.join("real")).unwrap();
        std::fs::write(root.join("real/file.txt"), b"").unwrap();
        symlink(root.join("real"), root.join("link_dir")).unwrap();
        symlink(root.join("real/file.txt"), root.join("link_file")).unwrap();
        symlink(root.join("missing"), root.join("dangling")).unwrap();
        symlink(root, root.join("real/loop")).unwrap();

        let mut seen = Vec::new();
        walk(root, true, false, |v| {
            seen.push((v.name.to_string(), v.kind))
        })
        .unwrap();

        assert!(seen.contains(&("link_dir".to_string(), EntryKind::SymlinkToDir)));
        assert!(seen.contains(&("link_file".to_string(), EntryKind::SymlinkToFile)));
        assert!(seen.contains(&("dangling".to_string(), EntryKind::SymlinkToFile)));
        assert!(seen.contains(&("loop".to_string(), EntryKind::SymlinkToDir)));
        // file.txt is reached once, through `real` only
        assert_eq!(seen.iter().filter(|(n, _)| n == "file.txt").count(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_walk_descends_into_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = setup_test_env();
        let root = temp_dir.path();
        let dir = root.join(OsStr::from_bytes(b"caf\xe9"));
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("inner.txt"), b"").unwrap();

        let mut seen = Vec::new();
        walk(root, true, false, |v| {
            seen.push((v.path.to_path_buf(), v.name.to_string(), v.depth))
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                (dir.clone(), "caf\u{FFFD}".to_string(), 1),
                (dir.join("inner.txt"), "inner.txt".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_walk_skips_excluded_directories() {
        let temp_dir = setup_test_env();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("RECYCLER")).unwrap();
        std::fs::write(root.join("RECYCLER/trash.txt"), b"").unwrap();
        std::fs::write(root.join("keep.txt"), b"").unwrap();

        let mut seen = Vec::new();
        walk(root, true, false, |v| seen.push(v.name.to_string())).unwrap();

        assert_eq!(seen, vec!["keep.txt".to_string()]);
    }

    fn setup_test_env() -> TempDir {
        TempDir::new("walk_test").unwrap()
    }
}
