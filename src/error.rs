// Error types for the library and playback sides of tapedeck
// The binary wraps these in anyhow with context; the core only ever sees these

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can end a play session early
#[derive(Debug, Error)]
pub enum PlayError {
    /// Song file could not be opened
    #[error("failed to open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File opened but the decoder rejected it (corrupt or unsupported)
    #[error("failed to decode '{}': {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// Raw keyboard mode could not be engaged (stdin is not a terminal)
    #[error("could not switch the terminal to raw mode: {0}")]
    TerminalMode(#[source] io::Error),

    /// No usable audio output device
    #[error("audio output unavailable: {0}")]
    Output(String),
}

/// Library file and ingestion failures
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("library file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to parse library file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("couldn't find song: {0}")]
    SongNotFound(String),

    #[error("'{}' is not a supported audio file", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("downloader `{program}` failed: {message}")]
    Download { program: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type PlayResult<T> = std::result::Result<T, PlayError>;
pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
