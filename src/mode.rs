use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::str::FromStr;

use crate::errors::StreamError;

/// Permission bits for files created by the truncating and appending
/// modes.
const CREATE_MODE: u32 = 0o644;

/// Access discipline a stream is opened with.
///
/// Each mode maps onto one fixed set of access and creation flags of the
/// underlying open call; the classic one-letter spellings are accepted
/// through [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing file, reads only (`r`).
    Read,
    /// Existing file, reads and writes (`r+`).
    ReadWrite,
    /// Created if absent, truncated otherwise, writes only (`w`).
    WriteTruncate,
    /// Created if absent, truncated otherwise, reads and writes (`w+`).
    ReadWriteTruncate,
    /// Created if absent, every write lands at the end (`a`).
    Append,
    /// Created if absent, reads anywhere, writes land at the end (`a+`).
    ReadAppend,
}

impl OpenMode {
    /// Open `path` with the access and creation semantics of this mode.
    pub(crate) fn open(self, path: &Path) -> io::Result<File> {
        let mut options = OpenOptions::new();
        match self {
            OpenMode::Read => {
                options.read(true);
            }
            OpenMode::ReadWrite => {
                options.read(true).write(true);
            }
            OpenMode::WriteTruncate => {
                options
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .mode(CREATE_MODE);
            }
            OpenMode::ReadWriteTruncate => {
                options
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .mode(CREATE_MODE);
            }
            OpenMode::Append => {
                options.append(true).create(true).mode(CREATE_MODE);
            }
            OpenMode::ReadAppend => {
                options
                    .read(true)
                    .append(true)
                    .create(true)
                    .mode(CREATE_MODE);
            }
        }
        options.open(path)
    }
}

impl FromStr for OpenMode {
    type Err = StreamError;

    fn from_str(spelling: &str) -> std::result::Result<Self, Self::Err> {
        match spelling {
            "r" => Ok(OpenMode::Read),
            "r+" => Ok(OpenMode::ReadWrite),
            "w" => Ok(OpenMode::WriteTruncate),
            "w+" => Ok(OpenMode::ReadWriteTruncate),
            "a" => Ok(OpenMode::Append),
            "a+" => Ok(OpenMode::ReadAppend),
            other => Err(StreamError::Mode(other.to_owned())),
        }
    }
}
