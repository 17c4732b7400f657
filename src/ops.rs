//! One-shot file operations built on [`FileHandle`]. Each call opens, works and closes; no state
//! survives between calls.

use std::path::Path;

use crate::core::error::IoContext;
use crate::core::{Error, Result};
use crate::handle::{DEFAULT_CHUNK_SIZE, FileHandle, OpenMode};

/// Creates (or truncates) `path`, parents included, and writes `data` into it.
pub fn create<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<()> {
    let mut fh = FileHandle::create(path)?;
    fh.write(data)?;
    fh.close()
}

/// Appends `data` to `path`, creating the file (and its parents) if needed.
pub fn append<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<()> {
    let mut fh = FileHandle::open(path, OpenMode::APPEND)?;
    fh.write(data)?;
    fh.close()
}

/// Reads `length` bytes of `path` starting at `offset`; `None` reads to the end. A range running
/// past the end of the file is cut short, an `offset` past the end is `OutOfRange`.
pub fn content<P: AsRef<Path>>(path: P, offset: u64, length: Option<u64>) -> Result<Vec<u8>> {
    let mut fh = FileHandle::open(path, OpenMode::READ)?;
    fh.seek(offset)?;
    let length = length.unwrap_or(fh.filesize() - offset);
    let data = fh.read(length, true)?;
    fh.close()?;
    Ok(data)
}

/// Copies `src` to `dst` in chunks and returns the number of bytes copied.
///
/// With `overwrite == false` an existing `dst` is left untouched and `Exists` is returned.
/// On Unix the permission bits of `src` are carried over.
pub fn copy<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dst: Q, overwrite: bool) -> Result<u64> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    let mut input = FileHandle::open(src, OpenMode::READ)?;

    if dst.exists() {
        if !overwrite {
            return Err(Error::Exists {
                path: dst.to_path_buf(),
            });
        }
        if same_file(src, dst)? {
            return Err(Error::InvalidTarget {
                path: dst.to_path_buf(),
            });
        }
    }

    let mut output = FileHandle::create(dst)?;
    let mut copied = 0;
    loop {
        let chunk = input.read(DEFAULT_CHUNK_SIZE as u64, true)?;
        if chunk.is_empty() {
            break;
        }
        output.write(&chunk)?;
        copied += chunk.len() as u64;
    }
    output.close()?;
    input.close()?;

    let permissions = std::fs::metadata(src).at(src)?.permissions();
    std::fs::set_permissions(dst, permissions).at(dst)?;

    tracing::debug!(src = %src.display(), dst = %dst.display(), copied, "copied file");
    Ok(copied)
}

fn same_file(a: &Path, b: &Path) -> Result<bool> {
    Ok(a.canonicalize().at(a)? == b.canonicalize().at(b)?)
}

/// Sets the permission bits of `path`. Off Unix only the write bits matter: no write bit makes the
/// file read-only.
pub fn chmod<P: AsRef<Path>>(path: P, mode: u32) -> Result<()> {
    let path = path.as_ref();
    std::fs::set_permissions(path, permissions_from_mode(path, mode)?).at(path)
}

#[cfg(unix)]
fn permissions_from_mode(_path: &Path, mode: u32) -> Result<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Ok(std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn permissions_from_mode(path: &Path, mode: u32) -> Result<std::fs::Permissions> {
    let mut permissions = std::fs::metadata(path).at(path)?.permissions();
    permissions.set_readonly(mode & 0o222 == 0);
    Ok(permissions)
}

/// Changes owner and/or group of `path`; `None` leaves that id alone. Does nothing off Unix.
#[cfg(unix)]
pub fn chown<P: AsRef<Path>>(path: P, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
    let path = path.as_ref();
    std::os::unix::fs::chown(path, uid, gid).at(path)
}

#[cfg(not(unix))]
pub fn chown<P: AsRef<Path>>(_path: P, _uid: Option<u32>, _gid: Option<u32>) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use anyhow::Result;
    use tempdir::TempDir;

    mod create {
        use super::*;

        #[test]
        fn test_create_writes_content() -> Result<()> {
            let temp_dir = setup_test_env();
            let path = temp_dir.path().join("new/dir/file.txt");

            create(&path, b"payload")?;

            assert_eq!(std::fs::read(&path)?, b"payload");
            Ok(())
        }

        #[test]
        fn test_create_replaces_content() -> Result<()> {
            let temp_dir = setup_test_env();
            let path = temp_dir.path().join("file.txt");
            std::fs::write(&path, b"a much longer previous content")?;

            create(&path, b"short")?;

            assert_eq!(std::fs::read(&path)?, b"short");
            Ok(())
        }
    }

    mod append {
        use super::*;

        #[test]
        fn test_append_extends() -> Result<()> {
            let temp_dir = setup_test_env();
            let path = temp_dir.path().join("log.txt");

            append(&path, b"one\n")?;
            append(&path, b"two\n")?;

            assert_eq!(std::fs::read(&path)?, b"one\ntwo\n");
            Ok(())
        }
    }

    mod content {
        use super::*;

        #[test]
        fn test_content_slices() -> Result<()> {
            let temp_dir = setup_test_env();
            let path = temp_dir.path().join("data.txt");
            std::fs::write(&path, b"Hello, World!\n")?;

            assert_eq!(content(&path, 0, None)?, b"Hello, World!\n");
            assert_eq!(content(&path, 7, Some(5))?, b"World");
            assert_eq!(content(&path, 7, Some(100))?, b"World!\n");
            assert!(content(&path, 14, None)?.is_empty());
            Ok(())
        }

        #[test]
        fn test_content_offset_past_end() {
            let temp_dir = setup_test_env();
            let path = temp_dir.path().join("data.txt");
            std::fs::write(&path, b"abc").unwrap();

            let err = content(&path, 4, None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::OutOfRange);
        }

        #[test]
        fn test_content_missing_file() {
            let temp_dir = setup_test_env();
            let err = content(temp_dir.path().join("none"), 0, None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }

    mod copy {
        use super::*;

        #[test]
        fn test_copy_reproduces_bytes() -> Result<()> {
            let temp_dir = setup_test_env();
            let src = temp_dir.path().join("src.bin");
            let dst = temp_dir.path().join("out/dst.bin");
            let data: Vec<u8> = (0..DEFAULT_CHUNK_SIZE * 2 + 17).map(|i| (i % 251) as u8).collect();
            std::fs::write(&src, &data)?;

            let copied = super::super::copy(&src, &dst, false)?;

            assert_eq!(copied, data.len() as u64);
            assert_eq!(std::fs::read(&dst)?, data);
            assert_eq!(std::fs::metadata(&dst)?.len(), std::fs::metadata(&src)?.len());
            Ok(())
        }

        #[test]
        fn test_copy_empty_file() -> Result<()> {
            let temp_dir = setup_test_env();
            let src = temp_dir.path().join("empty");
            let dst = temp_dir.path().join("empty.copy");
            std::fs::write(&src, b"")?;

            assert_eq!(super::super::copy(&src, &dst, false)?, 0);
            assert!(dst.is_file());
            Ok(())
        }

        #[test]
        fn test_copy_no_overwrite_leaves_destination() -> Result<()> {
            let temp_dir = setup_test_env();
            let src = temp_dir.path().join("src.txt");
            let dst = temp_dir.path().join("dst.txt");
            std::fs::write(&src, b"new")?;
            std::fs::write(&dst, b"original")?;

            let err = super::super::copy(&src, &dst, false).unwrap_err();

            assert_eq!(err.kind(), ErrorKind::Exists);
            assert_eq!(std::fs::read(&dst)?, b"original");
            Ok(())
        }

        #[test]
        fn test_copy_overwrite() -> Result<()> {
            let temp_dir = setup_test_env();
            let src = temp_dir.path().join("src.txt");
            let dst = temp_dir.path().join("dst.txt");
            std::fs::write(&src, b"new")?;
            std::fs::write(&dst, b"original")?;

            super::super::copy(&src, &dst, true)?;

            assert_eq!(std::fs::read(&dst)?, b"new");
            Ok(())
        }

        #[test]
        fn test_copy_onto_itself_refused() -> Result<()> {
            let temp_dir = setup_test_env();
            let src = temp_dir.path().join("self.txt");
            std::fs::write(&src, b"keep me")?;

            let err = super::super::copy(&src, &src, true).unwrap_err();

            assert_eq!(err.kind(), ErrorKind::InvalidTarget);
            assert_eq!(std::fs::read(&src)?, b"keep me");
            Ok(())
        }

        #[cfg(unix)]
        #[test]
        fn test_copy_keeps_permissions() -> Result<()> {
            use std::os::unix::fs::PermissionsExt;

            let temp_dir = setup_test_env();
            let src = temp_dir.path().join("script.sh");
            let dst = temp_dir.path().join("script.copy");
            std::fs::write(&src, b"#!/bin/sh\n")?;
            chmod(&src, 0o750)?;

            super::super::copy(&src, &dst, false)?;

            let mode = std::fs::metadata(&dst)?.permissions().mode();
            assert_eq!(mode & 0o777, 0o750);
            Ok(())
        }
    }

    mod ownership {
        use super::*;

        #[cfg(unix)]
        #[test]
        fn test_chown_to_current_owner() -> Result<()> {
            use std::os::unix::fs::MetadataExt;

            let temp_dir = setup_test_env();
            let path = temp_dir.path().join("owned.txt");
            std::fs::write(&path, b"")?;
            let meta = std::fs::metadata(&path)?;

            chown(&path, Some(meta.uid()), Some(meta.gid()))?;
            chown(&path, None, None)?;
            Ok(())
        }

        #[test]
        fn test_chmod_missing_file() {
            let temp_dir = setup_test_env();
            let err = chmod(temp_dir.path().join("none"), 0o600).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::IoFailure);
        }
    }

    fn setup_test_env() -> TempDir {
        TempDir::new("ops_test").unwrap()
    }
}
