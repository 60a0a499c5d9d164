//! Error type for the whole crate.
//!
//! A hand-rolled enum rather than `thiserror`, because this crate is
//! meant to be embedded without pulling in a derive-macro dependency for
//! something this small.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;
pub type UnitResult = Result<()>;

pub use std::io::Error as IoError;

/// All fatal conditions from spec section 7 ("ERROR HANDLING DESIGN").
///
/// Every variant here is fatal: the pipeline tears down in an orderly way
/// (queues marked finished, threads joined, `ContainerWriter` destructor
/// runs so the header is always rewritten) and then the error is returned
/// to the caller. There is no retry path — block encoding is deterministic,
/// so a failure means either a malformed input or OOM, neither of which a
/// retry fixes.
#[derive(Debug)]
pub enum Error {
    /// A frame file could not be opened or decoded. Carries the expanded
    /// path template and the frame index that failed.
    InputOpenFailed { template: String, frame: i64 },

    /// YCbCrA conversion or channel interleaving failed inside a SetBuilder.
    ConversionFailed(String),

    /// The external block encoder returned an error for a given channel.
    BlockEncodeFailed(String),

    /// A scratch or staging buffer could not be grown.
    AllocationFailed(String),

    /// A short write or underlying I/O write failure.
    Write(IoError),

    /// A seek failed; carries the attempted offset and whence mode, matching
    /// the original C encoder's diagnostic ("oops - bad seek ...").
    Seek { offset: u64, whence: &'static str },

    /// Invalid CLI arguments — must fail before the pipeline starts.
    BadArgs(String),

    /// Anything else read/written that doesn't fit the file format.
    Invalid(String),
}

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::Invalid(message.into())
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        Error::ConversionFailed(message.into())
    }

    pub fn block_encode(message: impl Into<String>) -> Self {
        Error::BlockEncodeFailed(message.into())
    }

    pub fn bad_args(message: impl Into<String>) -> Self {
        Error::BadArgs(message.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InputOpenFailed { template, frame } =>
                write!(f, "can't open frame {} of '{}'", frame, template),
            Error::ConversionFailed(message) => write!(f, "conversion failed: {}", message),
            Error::BlockEncodeFailed(message) => write!(f, "block encode failed: {}", message),
            Error::AllocationFailed(message) => write!(f, "allocation failed: {}", message),
            Error::Write(io) => write!(f, "write error: {}", io),
            Error::Seek { offset, whence } => write!(f, "seek error: offset {} ({})", offset, whence),
            Error::BadArgs(message) => write!(f, "bad arguments: {}", message),
            Error::Invalid(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Write(io) => Some(io),
            _ => None,
        }
    }
}

/// Enable using the `?` operator on io::Result. Any I/O error encountered
/// while writing the container is treated as a fatal write error; read-side
/// I/O errors are wrapped by the caller into `InputOpenFailed` instead,
/// since that carries more useful context (the template and frame index).
impl From<IoError> for Error {
    fn from(error: IoError) -> Self {
        Error::Write(error)
    }
}
