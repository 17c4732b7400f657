use std::path::{Component, Path, PathBuf};

use crate::core::Result;
use crate::core::error::IoContext;

/// Mode for directories created on behalf of a new file: owner-only rwx.
pub const DEFAULT_DIR_MODE: u32 = 0o700;

/// Rewrites `\` separators to `/` on Windows and drops trailing separators (the root
/// itself is kept as `/`). Elsewhere `\` is an ordinary name character and is kept.
pub fn to_slashes<S: AsRef<str>>(path: S) -> String {
    let mut s = if cfg!(windows) {
        path.as_ref().replace('\\', "/")
    } else {
        path.as_ref().to_string()
    };
    while s.len() > 1 && s.ends_with('/') {
        s.pop();
    }
    s
}

/// Joins a slash-normalized directory and an entry name.
pub fn join_slashed(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Splits a file name at its last `.` into `(base, extension)`.
/// A name without a dot has an empty extension.
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => (&name[..idx], &name[idx + 1..]),
        None => (name, ""),
    }
}

/// Resolves `.` and `..` segments lexically, without touching the disk.
/// Leading `..` of a relative path are kept; `..` at the root stays at the root.
pub fn normalize<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => result.push(component),
            },
            _ => result.push(component),
        }
    }
    result
}

/// Creates every missing directory in `dir` with `mode` (ignored off Unix).
/// `dir` is [`normalize`]d first, so `a/../b` creates `b` only.
/// Returns the directories that were actually created, outermost first.
pub fn make_path<P: AsRef<Path>>(dir: P, mode: u32) -> Result<Vec<PathBuf>> {
    let dir = normalize(dir);
    let mut created = Vec::new();
    let mut built = PathBuf::new();

    for component in dir.components() {
        built.push(component);
        if built.as_os_str().is_empty() || built.is_dir() {
            continue;
        }
        if built.exists() {
            return Err(crate::core::Error::InvalidTarget { path: built });
        }
        create_dir(&built, mode).at(&built)?;
        tracing::debug!(path = %built.display(), "created directory");
        created.push(built.clone());
    }

    Ok(created)
}

#[cfg(unix)]
fn create_dir(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new().mode(mode).create(path)
}

#[cfg(not(unix))]
fn create_dir(path: &Path, _mode: u32) -> std::io::Result<()> {
    std::fs::DirBuilder::new().create(path)
}
