use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unexpected end of data at offset {offset:#x} (need {need} bytes, have {have})")]
    UnexpectedEof { offset: u64, need: u64, have: u64 },

    #[error("seek target {target} outside data of {size} bytes")]
    SeekOutOfRange { target: i128, size: u64 },

    #[error("invalid integer width {width}: expected 1, 2, 3 or 4")]
    InvalidWidth { width: usize },

    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid flex archive: {message}")]
    InvalidFlex { message: String },

    #[error("flex entry {index} not found (archive has {count} entries)")]
    EntryNotFound { index: usize, count: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
