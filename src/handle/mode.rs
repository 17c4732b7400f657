use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Access mode of a [`FileHandle`](crate::FileHandle).
///
/// Parsed from a mode string by looking for the letters `r`, `w` and `a`
/// anywhere in it, ignoring case: `"r"`, `"rw"`, `"Append"` and `"wr+"` are all
/// valid. A string with none of the letters means read-only. Append implies
/// write access.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OpenMode {
    pub read: bool,
    pub write: bool,
    pub append: bool,
}

impl OpenMode {
    pub const READ: OpenMode = OpenMode {
        read: true,
        write: false,
        append: false,
    };
    pub const WRITE: OpenMode = OpenMode {
        read: false,
        write: true,
        append: false,
    };
    pub const READ_WRITE: OpenMode = OpenMode {
        read: true,
        write: true,
        append: false,
    };
    pub const APPEND: OpenMode = OpenMode {
        read: false,
        write: true,
        append: true,
    };

    pub fn parse(mode: &str) -> OpenMode {
        let mode = mode.to_ascii_lowercase();
        let append = mode.contains('a');
        let write = append || mode.contains('w');
        let read = mode.contains('r') || !write;
        OpenMode {
            read,
            write,
            append,
        }
    }

    /// True when opening a missing file should create it.
    pub fn creates(&self) -> bool {
        self.write || self.append
    }
}

impl Default for OpenMode {
    fn default() -> Self {
        OpenMode::READ
    }
}

impl FromStr for OpenMode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(OpenMode::parse(s))
    }
}

impl From<&str> for OpenMode {
    fn from(s: &str) -> Self {
        OpenMode::parse(s)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.read {
            f.write_str("r")?;
        }
        if self.append {
            f.write_str("a")
        } else if self.write {
            f.write_str("w")
        } else {
            Ok(())
        }
    }
}
