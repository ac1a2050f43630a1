//! Error types and handling

use crate::image::Fourcc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The backend rejected a (symbology, option, value) combination.
    #[error("unsupported configuration: symbology {symbology}, option {option:#x}, value {value}")]
    UnsupportedConfig {
        symbology: i32,
        option: i32,
        value: i32,
    },

    /// Configuration text did not match the option grammar.
    #[error("unknown configuration: {0:?}")]
    ParseConfig(String),

    /// A format string that is not exactly four ASCII characters.
    #[error("invalid format fourcc: {0:?}")]
    InvalidFormat(String),

    /// The scanner cannot decode images in this format.
    #[error("unsupported image format {0}")]
    UnsupportedFormat(Fourcc),

    #[error("image data holds {actual} bytes, expected {expected}")]
    DataLength { expected: u64, actual: u64 },

    #[error("access past end of SymbolIterator")]
    EndOfIteration,

    #[error("{0}")]
    Unsupported(&'static str),

    /// The backend returned no handle from a constructor.
    #[error("native engine could not allocate {0}")]
    OutOfMemory(&'static str),

    /// An operation mixed objects created by different engines.
    #[error("objects belong to different engines")]
    EngineMismatch,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
