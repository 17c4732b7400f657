//! Open-handle registry scoped to whoever owns it.
//!
//! Replaces a process-wide table of open files: create one `HandleRegistry` per session (or per
//! application) and route opens through it when a bulk [`HandleRegistry::close_all`] is needed.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::core::{Result, utils};
use crate::handle::file::FileHandle;
use crate::handle::mode::OpenMode;

/// A handle shared between the registry and its caller.
pub type SharedHandle = Rc<RefCell<FileHandle>>;

/// Path-keyed table of handles opened through it.
///
/// ### Usage notes:
/// - Opening a path that is already registered replaces the entry. The replaced handle is **not**
///   closed: it stays usable by whoever still holds it and is closed when its last reference goes
///   away.
/// - Handles closed directly with [`FileHandle::close`] stay registered until
///   [`HandleRegistry::close`] or [`HandleRegistry::close_all`]; closing them again is a no-op.
/// - Single-threaded (`Rc`/`RefCell`).
#[derive(Default)]
pub struct HandleRegistry {
    handles: BTreeMap<PathBuf, SharedHandle>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `path` and registers the handle under it.
    pub fn open<P: AsRef<Path>, M: Into<OpenMode>>(
        &mut self,
        path: P,
        mode: M,
    ) -> Result<SharedHandle> {
        let handle = FileHandle::open(path.as_ref(), mode)?;
        Ok(self.register(handle))
    }

    /// Creates (truncating) `path` and registers the handle under it.
    pub fn create<P: AsRef<Path>>(&mut self, path: P) -> Result<SharedHandle> {
        let handle = FileHandle::create(path.as_ref())?;
        Ok(self.register(handle))
    }

    /// Registers an already open handle under its own path.
    pub fn register(&mut self, handle: FileHandle) -> SharedHandle {
        let path = handle.path().to_path_buf();
        let shared = Rc::new(RefCell::new(handle));
        if self.handles.insert(path.clone(), Rc::clone(&shared)).is_some() {
            tracing::debug!(path = %path.display(), "replaced registered handle");
        }
        shared
    }

    /// Looks `path` up the way handles are keyed: with `.` and `..` resolved.
    pub fn get<P: AsRef<Path>>(&self, path: P) -> Option<SharedHandle> {
        self.handles.get(&utils::normalize(path)).cloned()
    }

    pub fn contains<P: AsRef<Path>>(&self, path: P) -> bool {
        self.handles.contains_key(&utils::normalize(path))
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Closes the handle registered under `path` and forgets it.
    /// Returns `false` when nothing was registered there.
    pub fn close<P: AsRef<Path>>(&mut self, path: P) -> Result<bool> {
        match self.handles.remove(&utils::normalize(path)) {
            Some(handle) => {
                handle.borrow_mut().close()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Closes every registered handle and empties the registry.
    ///
    /// All handles are attempted; the first failure is returned.
    pub fn close_all(&mut self) -> Result<()> {
        let mut result = Ok(());
        for (path, handle) in std::mem::take(&mut self.handles) {
            let closed = match handle.try_borrow_mut() {
                Ok(mut handle) => handle.close(),
                Err(_) => {
                    tracing::warn!("Handle {} is in use, not closed", path.display());
                    Ok(())
                }
            };
            if let Err(e) = closed {
                tracing::warn!("Failed to close {}: {}", path.display(), e);
                result = result.and(Err(e));
            }
        }
        result
    }
}

impl Drop for HandleRegistry {
    fn drop(&mut self) {
        if let Err(e) = self.close_all() {
            tracing::warn!("Failed to close registered handles: {}", e);
        }
    }
}
