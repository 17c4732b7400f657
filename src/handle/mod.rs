mod file;
mod lock;
mod mode;
mod registry;


pub use file::{DEFAULT_CHUNK_SIZE, FileHandle, InsertAt};
pub use mode::OpenMode;
pub use registry::{HandleRegistry, SharedHandle};
