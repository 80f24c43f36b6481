use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures that abort a whole engine call.
///
/// Per-line problems never show up here; they are [`LineRejection`]s and the
/// line is simply left out of the output.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The file could not be opened or read
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A chunk size of zero was requested
    #[error("invalid chunk size {size} for {parameter}: must be at least 1")]
    InvalidChunkSize { parameter: &'static str, size: usize },

    /// Engine configuration could not be loaded
    #[error("configuration error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl EngineError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn config(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub(crate) fn check_chunk_size(parameter: &'static str, size: usize) -> Result<usize> {
        if size == 0 {
            Err(Self::InvalidChunkSize { parameter, size })
        } else {
            Ok(size)
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Why a single line produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LineRejection {
    /// Empty or whitespace-only line
    Blank,
    /// Line bytes are not valid UTF-8
    InvalidUtf8,
    /// No `MM-DD HH:MM:SS.mmm` timestamp at the start of the line
    MissingTimestamp,
    /// Timestamp present but the rest fits none of the layouts
    NoLayoutMatched,
    /// A layout matched but the tag was empty after trimming
    EmptyTag,
    /// A pid or tid does not fit in 32 bits
    InvalidId,
}

impl LineRejection {
    pub fn name(&self) -> &'static str {
        match self {
            LineRejection::Blank => "Blank",
            LineRejection::InvalidUtf8 => "InvalidUtf8",
            LineRejection::MissingTimestamp => "MissingTimestamp",
            LineRejection::NoLayoutMatched => "NoLayoutMatched",
            LineRejection::EmptyTag => "EmptyTag",
            LineRejection::InvalidId => "InvalidId",
        }
    }
}

impl fmt::Display for LineRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineRejection::Blank => write!(f, "blank line"),
            LineRejection::InvalidUtf8 => write!(f, "line is not valid UTF-8"),
            LineRejection::MissingTimestamp => write!(f, "no leading timestamp"),
            LineRejection::NoLayoutMatched => write!(f, "no layout matched"),
            LineRejection::EmptyTag => write!(f, "empty tag"),
            LineRejection::InvalidId => write!(f, "pid or tid out of range"),
        }
    }
}
