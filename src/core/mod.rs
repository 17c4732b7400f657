pub mod error;
pub mod utils;

pub use error::{Error, ErrorKind};

pub type Result<T> = std::result::Result<T, Error>;
