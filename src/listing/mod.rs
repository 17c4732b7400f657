mod entry;
mod files;
mod filter;
mod progress;
mod tree;
mod walk;

pub use entry::{Entry, EntryKind, FileInfo};
pub use files::{Listing, readfiles, readfiles_with};
pub use filter::{ExtensionFilter, ListOptions};
pub use tree::{TreeListing, dirlist, dirlist_with, readdirs};
