//! Random-access file handles and filtered directory listings for Rust.
//!
//! ### Overview
//!
//! `file-kit` is a thin, stateful layer over the host filesystem. It keeps a cursor and a cached
//! size for every open file so that reads, writes and in-place splices are bounds-checked before
//! the OS is touched, and it walks directory trees into flat, numbered listings.
//!
//! **Key ideas**:
//! - **Handles**: [`FileHandle`] opens a file in a mode parsed from `r`/`w`/`a`, and offers
//!   `seek`/`read`/`write`/`truncate`, plus `insert`/`extract` which shift the rest of the file.
//! - **Locking**: re-entrant exclusive advisory locks (`flock(2)`) with a depth counter.
//! - **Registry**: [`HandleRegistry`] tracks handles by path for a bulk `close_all`, scoped to
//!   its owner instead of the process.
//! - **Listings**: [`readfiles`], [`readdirs`] and [`dirlist`] walk a tree with extension
//!   filtering. A missing root is a normal result (`exists() == false`), not an error.
//! - **One-shot operations**: [`ops`] creates, appends, slices and copies whole files.
//!
//! Everything is synchronous and single-threaded; nothing here is `Sync`.

mod core;
mod handle;
mod listing;
pub mod ops;

pub use crate::core::utils::{DEFAULT_DIR_MODE, make_path};
pub use crate::core::{Error, ErrorKind, Result};
pub use crate::handle::{
    DEFAULT_CHUNK_SIZE, FileHandle, HandleRegistry, InsertAt, OpenMode, SharedHandle,
};
pub use crate::listing::{
    Entry, EntryKind, ExtensionFilter, FileInfo, ListOptions, Listing, TreeListing, dirlist,
    dirlist_with, readdirs, readfiles, readfiles_with,
};
