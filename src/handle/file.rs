//! Random-access file handle with a cached cursor and size.
//!
//! ### Key Features:
//! - **Cursor tracking**: `position` and `size` are kept by the handle, so every bounds check is
//!   made against the cached values before the OS is touched.
//! - **In-place splicing**: `insert` shifts the tail of the file forward, `extract` shifts it
//!   backward, both without a temporary file. Chunked variants bound the memory used.
//! - **Advisory locking**: re-entrant exclusive `flock(2)` with a depth counter.
//!
//! Invariant: outside of a call in progress, `0 <= position <= size`. The one way to break it is
//! [`FileHandle::refresh_size`] after another process shrank the file; reads then fail with
//! `OutOfRange` until the cursor is moved back inside the file.
//!
//! Multi-step operations (`insert`, `extract`) are not transactional. If the OS fails halfway, the
//! file is left partially shifted and the cached size is not updated.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::core::error::IoContext;
use crate::core::utils::{self, DEFAULT_DIR_MODE};
use crate::core::{Error, Result};
use crate::handle::lock::FileLock;
use crate::handle::mode::OpenMode;

/// Default chunk size for the streaming splice variants and for copying.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Where [`FileHandle::insert`] places new data.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InsertAt {
    Offset(u64),
    /// Resolves to the current size of the file.
    End,
}

impl From<u64> for InsertAt {
    fn from(offset: u64) -> Self {
        InsertAt::Offset(offset)
    }
}

/// An open, stateful reference to one regular file.
///
/// ### Usage notes:
/// - The handle never follows a symlink at open time: opening a link or a directory fails with
///   `InvalidTarget`.
/// - Writable handles are opened with OS read access too, since splicing has to read the tail
///   back. `read()` still honours the mode the handle was opened with.
/// - Not thread-safe (wrap in `Mutex` if needed).
///
/// ### Example:
/// ```
/// use file_kit::{FileHandle, InsertAt};
///
/// let path = std::env::temp_dir().join("file_kit_doc_handle.txt");
/// let mut fh = FileHandle::create(&path).unwrap();
/// fh.write(b"Hello World").unwrap();
/// fh.insert(InsertAt::Offset(5), b",").unwrap();
/// fh.seek(0).unwrap();
/// assert_eq!(fh.read(12, false).unwrap(), b"Hello, World");
/// fh.close().unwrap();
/// # std::fs::remove_file(&path).unwrap();
/// ```
#[derive(Debug)]
pub struct FileHandle {
    path: PathBuf,
    file: Option<File>,
    position: u64,
    size: u64,
    mode: OpenMode,
    lock: FileLock,
}

impl FileHandle {
    /// Opens `path` with `mode` (see [`OpenMode`] for the accepted strings).
    ///
    /// A missing file is created, together with any missing parent directories, when the mode
    /// allows writing; otherwise `NotFound` is returned. Existing content is never truncated.
    /// In append mode the cursor starts at the end of the file.
    ///
    /// `.` and `..` in `path` are resolved lexically before anything is created or opened, and
    /// [`FileHandle::path`] reports the resolved path.
    pub fn open<P: AsRef<Path>, M: Into<OpenMode>>(path: P, mode: M) -> Result<Self> {
        let path = &utils::normalize(path);
        let mode = mode.into();

        match std::fs::symlink_metadata(path) {
            Ok(meta) if !meta.file_type().is_file() => {
                return Err(Error::InvalidTarget {
                    path: path.to_path_buf(),
                });
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if !mode.creates() {
                    return Err(Error::NotFound {
                        path: path.to_path_buf(),
                    });
                }
                make_parent(path)?;
            }
            Err(e) => return Err(Error::io(path, e)),
        }

        let file = OpenOptions::new()
            .read(true)
            .write(mode.write)
            .create(mode.creates())
            .open(path)
            .at(path)?;

        Self::from_file(path, file, mode)
    }

    /// Creates `path` (and its parents) for reading and writing, discarding any existing content.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = &utils::normalize(path);
        check_target(path)?;
        make_parent(path)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .at(path)?;

        Self::from_file(path, file, OpenMode::READ_WRITE)
    }

    /// Like [`FileHandle::create`], but fails with `Exists` if `path` is already there.
    pub fn newfile<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = &utils::normalize(path);
        make_parent(path)?;

        let file = match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::Exists {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(Error::io(path, e)),
        };

        Self::from_file(path, file, OpenMode::READ_WRITE)
    }

    fn from_file(path: &Path, file: File, mode: OpenMode) -> Result<Self> {
        let size = file.metadata().at(path)?.len();
        let position = if mode.append { size } else { 0 };
        seek_to(&file, path, position)?;

        tracing::debug!(path = %path.display(), %mode, size, "opened file");

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            position,
            size,
            mode,
            lock: FileLock::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn is_readable(&self) -> bool {
        self.mode.read
    }

    pub fn is_writable(&self) -> bool {
        self.mode.write
    }

    pub fn is_appendable(&self) -> bool {
        self.mode.append
    }

    /// Current cursor position.
    pub fn tell(&self) -> u64 {
        self.position
    }

    /// Cached file length.
    pub fn filesize(&self) -> u64 {
        self.size
    }

    /// Current lock depth; `0` means unlocked.
    pub fn locked(&self) -> usize {
        self.lock.depth()
    }

    /// Whether the OS-level lock is currently held (exactly when `locked() > 0`).
    pub fn is_locked(&self) -> bool {
        self.lock.is_held()
    }

    /// Releases the lock (however deep), flushes and closes the descriptor.
    /// Closing an already closed handle does nothing.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };

        let mut result = Ok(());
        while self.lock.depth() > 0 {
            if let Err(e) = self.lock.release(&file) {
                // dropping the descriptor releases the lock anyway
                self.lock = FileLock::default();
                result = Err(Error::io(&self.path, e));
                break;
            }
        }
        if let Err(e) = file.flush() {
            result = result.and(Err(Error::io(&self.path, e)));
        }

        tracing::debug!(path = %self.path.display(), size = self.size, "closed file");
        result
    }

    /// Moves the cursor to `pos`, which must lie within `0..=size`.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        let file = open_file(&self.file, &self.path)?;
        if pos > self.size {
            return Err(Error::out_of_range(&self.path, pos, 0, self.size));
        }
        seek_to(file, &self.path, pos)?;
        self.position = pos;
        Ok(())
    }

    /// Reads `length` bytes at the cursor and advances it.
    ///
    /// A read running past the end fails with `OutOfRange`, unless `stop_at_end` is set, in which
    /// case it returns the bytes up to the end. A cursor that already lies past the end always
    /// fails.
    pub fn read(&mut self, length: u64, stop_at_end: bool) -> Result<Vec<u8>> {
        if length == 0 {
            return Ok(Vec::new());
        }
        let file = open_file(&self.file, &self.path)?;
        if !self.mode.read {
            return Err(Error::NotReadable {
                path: self.path.clone(),
            });
        }

        let mut length = length;
        if self.position.saturating_add(length) > self.size {
            if self.position > self.size || !stop_at_end {
                return Err(Error::out_of_range(
                    &self.path,
                    self.position,
                    length,
                    self.size,
                ));
            }
            length = self.size - self.position;
        }

        let buf = read_exact_at(file, &self.path, self.position, length)?;
        self.position += length;
        Ok(buf)
    }

    /// Writes `data` at the cursor, overwriting what is there and growing the file when the write
    /// runs past the end.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        let file = open_file(&self.file, &self.path)?;
        if !self.mode.write {
            return Err(Error::NotWritable {
                path: self.path.clone(),
            });
        }

        write_all_at(file, &self.path, self.position, data)?;
        self.position += data.len() as u64;
        if self.position > self.size {
            self.size = self.position;
        }
        Ok(())
    }

    /// [`FileHandle::write`] for optional data: `None` is a no-op, or an `EmptyWrite` failure when
    /// `reject_nil` is set.
    pub fn write_opt(&mut self, data: Option<&[u8]>, reject_nil: bool) -> Result<()> {
        match data {
            Some(data) => self.write(data),
            None if reject_nil => Err(Error::EmptyWrite {
                path: self.path.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Moves the cursor to the end and writes `data` there.
    pub fn append_data(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        self.seek(self.size)?;
        self.write(data)
    }

    /// Shrinks the file to `length` bytes. Does nothing when the file is not longer than that.
    ///
    /// The handle must be writable even for a request that would change nothing: a read-only
    /// handle fails with `NotWritable` whatever `length` is.
    pub fn truncate(&mut self, length: u64) -> Result<()> {
        let file = self.ensure_writable()?;
        if self.size <= length {
            return Ok(());
        }

        file.set_len(length).at(&self.path)?;
        let position = self.position.min(length);
        seek_to(file, &self.path, position)?;
        self.position = position;
        self.size = length;
        Ok(())
    }

    /// Splices `data` into the file at `at`, shifting everything from there on forward.
    ///
    /// The whole tail is buffered in memory; see [`FileHandle::insert_chunked`] for large files.
    /// Afterwards the cursor sits right after the inserted bytes.
    pub fn insert<A: Into<InsertAt>>(&mut self, at: A, data: &[u8]) -> Result<()> {
        let file = self.ensure_writable()?;
        let offset = self.resolve(at.into(), data.len())?;

        let tail = read_exact_at(file, &self.path, offset, self.size - offset)?;
        write_all_at(file, &self.path, offset, data)?;
        write_all_at(file, &self.path, offset + data.len() as u64, &tail)?;

        self.finish_insert(offset, data.len())
    }

    /// Streaming form of [`FileHandle::insert`]: the tail is moved back-to-front in pieces of at
    /// most `chunk_size` bytes.
    pub fn insert_chunked<A: Into<InsertAt>>(
        &mut self,
        at: A,
        data: &[u8],
        chunk_size: usize,
    ) -> Result<()> {
        let file = self.ensure_writable()?;
        let offset = self.resolve(at.into(), data.len())?;
        let shift = data.len() as u64;
        let chunk = chunk_size.max(1) as u64;

        if shift > 0 {
            let mut end = self.size;
            while end > offset {
                let start = end.saturating_sub(chunk).max(offset);
                let buf = read_exact_at(file, &self.path, start, end - start)?;
                write_all_at(file, &self.path, start + shift, &buf)?;
                end = start;
            }
            write_all_at(file, &self.path, offset, data)?;
        }

        self.finish_insert(offset, data.len())
    }

    fn resolve(&self, at: InsertAt, length: usize) -> Result<u64> {
        match at {
            InsertAt::End => Ok(self.size),
            InsertAt::Offset(offset) if offset > self.size => Err(Error::out_of_range(
                &self.path,
                offset,
                length as u64,
                self.size,
            )),
            InsertAt::Offset(offset) => Ok(offset),
        }
    }

    fn finish_insert(&mut self, offset: u64, inserted: usize) -> Result<()> {
        let file = open_file(&self.file, &self.path)?;
        self.size += inserted as u64;
        self.position = offset + inserted as u64;
        seek_to(file, &self.path, self.position)?;
        tracing::trace!(
            path = %self.path.display(),
            offset,
            inserted,
            size = self.size,
            "inserted bytes"
        );
        Ok(())
    }

    /// Cuts `length` bytes out of the file at the cursor and returns them, shifting the rest of the
    /// file backward. A range running past the end is clamped to the end. The cursor does not move.
    pub fn extract(&mut self, length: u64) -> Result<Vec<u8>> {
        let (start, length, removed) = match self.extract_head(length)? {
            Extracted::Done(removed) => return Ok(removed),
            Extracted::Pending {
                start,
                length,
                removed,
            } => (start, length, removed),
        };

        let file = open_file(&self.file, &self.path)?;
        let tail_start = start + length;
        let tail = read_exact_at(file, &self.path, tail_start, self.size - tail_start)?;
        write_all_at(file, &self.path, start, &tail)?;

        self.finish_extract(start, length)?;
        Ok(removed)
    }

    /// Streaming form of [`FileHandle::extract`]: the tail is moved front-to-back in pieces of at
    /// most `chunk_size` bytes. The removed range itself is still returned in one buffer.
    pub fn extract_chunked(&mut self, length: u64, chunk_size: usize) -> Result<Vec<u8>> {
        let (start, length, removed) = match self.extract_head(length)? {
            Extracted::Done(removed) => return Ok(removed),
            Extracted::Pending {
                start,
                length,
                removed,
            } => (start, length, removed),
        };

        let file = open_file(&self.file, &self.path)?;
        let chunk = chunk_size.max(1) as u64;
        let mut src = start + length;
        while src < self.size {
            let n = chunk.min(self.size - src);
            let buf = read_exact_at(file, &self.path, src, n)?;
            write_all_at(file, &self.path, src - length, &buf)?;
            src += n;
        }

        self.finish_extract(start, length)?;
        Ok(removed)
    }

    /// Shared front half of both extract forms: checks, reads the removed range and handles the
    /// case where the range reaches the end of the file.
    fn extract_head(&mut self, length: u64) -> Result<Extracted> {
        let file = self.ensure_writable()?;
        let start = self.position;
        if start > self.size {
            return Err(Error::out_of_range(&self.path, start, length, self.size));
        }
        if length == 0 {
            return Ok(Extracted::Done(Vec::new()));
        }

        if start.saturating_add(length) >= self.size {
            let removed = read_exact_at(file, &self.path, start, self.size - start)?;
            file.set_len(start).at(&self.path)?;
            seek_to(file, &self.path, start)?;
            self.size = start;
            return Ok(Extracted::Done(removed));
        }

        let removed = read_exact_at(file, &self.path, start, length)?;
        Ok(Extracted::Pending {
            start,
            length,
            removed,
        })
    }

    fn finish_extract(&mut self, start: u64, length: u64) -> Result<()> {
        let file = open_file(&self.file, &self.path)?;
        let size = self.size - length;
        file.set_len(size).at(&self.path)?;
        seek_to(file, &self.path, start)?;
        self.size = size;
        self.position = start;
        tracing::trace!(
            path = %self.path.display(),
            start,
            removed = length,
            size,
            "extracted bytes"
        );
        Ok(())
    }

    /// Takes the exclusive advisory lock, or deepens it if already held. Returns the new depth.
    pub fn lock(&mut self) -> Result<usize> {
        let file = open_file(&self.file, &self.path)?;
        let depth = self.lock.acquire(file).at(&self.path)?;
        if depth == 1 {
            tracing::debug!(path = %self.path.display(), "acquired lock");
        }
        Ok(depth)
    }

    /// Undoes one [`FileHandle::lock`]; the OS lock is dropped when the depth reaches zero.
    /// Returns the remaining depth.
    pub fn unlock(&mut self) -> Result<usize> {
        let file = open_file(&self.file, &self.path)?;
        match self.lock.release(file).at(&self.path)? {
            Some(depth) => {
                if depth == 0 {
                    tracing::debug!(path = %self.path.display(), "released lock");
                }
                Ok(depth)
            }
            None => Err(Error::NotLocked {
                path: self.path.clone(),
            }),
        }
    }

    /// Creates the missing directories leading to this handle's file.
    pub fn make_path(&self) -> Result<()> {
        make_parent(&self.path)
    }

    /// Re-reads the file length from the OS, picking up changes made behind the handle's back.
    /// The cursor is left alone, even if it now lies past the end.
    pub fn refresh_size(&mut self) -> Result<u64> {
        let file = open_file(&self.file, &self.path)?;
        self.size = file.metadata().at(&self.path)?.len();
        Ok(self.size)
    }

    fn ensure_writable(&self) -> Result<&File> {
        let file = open_file(&self.file, &self.path)?;
        if !self.mode.write {
            return Err(Error::NotWritable {
                path: self.path.clone(),
            });
        }
        Ok(file)
    }
}

impl Drop for FileHandle {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close {}: {}", self.path.display(), e);
        }
    }
}

enum Extracted {
    Done(Vec<u8>),
    Pending {
        start: u64,
        length: u64,
        removed: Vec<u8>,
    },
}

fn open_file<'a>(file: &'a Option<File>, path: &Path) -> Result<&'a File> {
    file.as_ref().ok_or_else(|| Error::Closed {
        path: path.to_path_buf(),
    })
}

fn check_target(path: &Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if !meta.file_type().is_file() => Err(Error::InvalidTarget {
            path: path.to_path_buf(),
        }),
        _ => Ok(()),
    }
}

fn make_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        utils::make_path(parent, DEFAULT_DIR_MODE)?;
    }
    Ok(())
}

fn seek_to(file: &File, path: &Path, pos: u64) -> Result<()> {
    let mut file = file;
    file.seek(SeekFrom::Start(pos)).at(path)?;
    Ok(())
}

fn read_exact_at(file: &File, path: &Path, pos: u64, length: u64) -> Result<Vec<u8>> {
    seek_to(file, path, pos)?;
    let mut buf = vec![0u8; length as usize];
    let mut file = file;
    file.read_exact(&mut buf).at(path)?;
    Ok(buf)
}

fn write_all_at(file: &File, path: &Path, pos: u64, data: &[u8]) -> Result<()> {
    seek_to(file, path, pos)?;
    let mut file = file;
    file.write_all(data).at(path)?;
    Ok(())
}
