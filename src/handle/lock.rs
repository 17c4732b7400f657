//! Re-entrant advisory lock bookkeeping.
//!
//! The lock is advisory and single-owner: it only keeps out other processes
//! that also call `flock(2)` on the same file, and it is not a concurrency
//! primitive for threads sharing one handle.

use std::fs::File;
use std::io;

#[derive(Debug, Default)]
pub struct FileLock {
    depth: usize,
    held: bool,
}

impl FileLock {
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Increments the depth, taking the OS lock on the 0 -> 1 transition.
    pub fn acquire(&mut self, file: &File) -> io::Result<usize> {
        if self.depth == 0 {
            os::lock_exclusive(file)?;
            self.held = true;
        }
        self.depth += 1;
        Ok(self.depth)
    }

    /// Decrements the depth, releasing the OS lock on the 1 -> 0 transition.
    /// Returns `None` when nothing was locked.
    pub fn release(&mut self, file: &File) -> io::Result<Option<usize>> {
        if self.depth == 0 {
            return Ok(None);
        }
        if self.depth == 1 {
            os::unlock(file)?;
            self.held = false;
        }
        self.depth -= 1;
        Ok(Some(self.depth))
    }
}

#[cfg(unix)]
mod os {
    use std::fs::File;
    use std::io;
    use std::os::unix::io::AsRawFd;

    pub fn lock_exclusive(file: &File) -> io::Result<()> {
        flock(file, libc::LOCK_EX)
    }

    pub fn unlock(file: &File) -> io::Result<()> {
        flock(file, libc::LOCK_UN)
    }

    fn flock(file: &File, operation: libc::c_int) -> io::Result<()> {
        loop {
            // SAFETY: the descriptor is owned by `file` and stays open for the call.
            let ret = unsafe { libc::flock(file.as_raw_fd(), operation) };
            if ret == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}

#[cfg(not(unix))]
mod os {
    use std::fs::File;
    use std::io;

    pub fn lock_exclusive(file: &File) -> io::Result<()> {
        file.lock()
    }

    pub fn unlock(file: &File) -> io::Result<()> {
        file.unlock()
    }
}
