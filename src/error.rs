//! Error types threaded through every fallible call in the crate.
//!
//! Modeled on the teacher's `OozError`/`Res<T>` idiom: a single struct that
//! carries a classification, the call-site location, and an optional chain
//! of context, rather than a grab-bag of ad-hoc error types per module.

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::panic::Location;

/// Classification of a failure, independent of the message attached to it.
/// Variants mirror the spec's error-kind taxonomy; callers match on
/// `kind()`, never on the rendered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZstdErrorKind {
    /// Input shorter or longer than the declared frame/block extent.
    SrcSizeWrong,
    /// Bad magic number or a reserved bit was set.
    PrefixUnknown,
    /// Declared window size exceeds this build's configured cap.
    FrameParameterUnsupported,
    /// Structural violation mid-stream: bad FSE table, invalid Huffman
    /// weights, out-of-range offset, litLen exceeding available literals,
    /// a back-reference before `base`, and similar.
    CorruptionDetected,
    /// Output buffer cannot hold the next produced run.
    DstSizeTooSmall,
    /// Dictionary magic or embedded entropy tables are malformed.
    DictionaryCorrupted,
    /// Dictionary id (or content) does not match what the frame expects.
    DictionaryWrong,
    /// A pool or scratch allocation failed.
    MemoryAllocation,
    /// A streaming API call arrived out of the state machine's order.
    Stage,
}

impl Display for ZstdErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            ZstdErrorKind::SrcSizeWrong => "source size wrong",
            ZstdErrorKind::PrefixUnknown => "unknown frame prefix",
            ZstdErrorKind::FrameParameterUnsupported => "frame parameter unsupported",
            ZstdErrorKind::CorruptionDetected => "corruption detected",
            ZstdErrorKind::DstSizeTooSmall => "destination too small",
            ZstdErrorKind::DictionaryCorrupted => "dictionary corrupted",
            ZstdErrorKind::DictionaryWrong => "wrong dictionary",
            ZstdErrorKind::MemoryAllocation => "allocation failed",
            ZstdErrorKind::Stage => "called out of sequence",
        };
        f.write_str(s)
    }
}

/// The crate's error type.
#[derive(Debug)]
pub struct ZstdError {
    kind: ZstdErrorKind,
    message: Option<String>,
    context: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
    location: &'static Location<'static>,
}

pub type Result<T> = std::result::Result<T, ZstdError>;

impl ZstdError {
    #[track_caller]
    pub fn new(kind: ZstdErrorKind) -> Self {
        ZstdError {
            kind,
            message: None,
            context: None,
            source: None,
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn msg(kind: ZstdErrorKind, message: impl Into<String>) -> Self {
        ZstdError {
            kind,
            message: Some(message.into()),
            context: None,
            source: None,
            location: Location::caller(),
        }
    }

    pub fn kind(&self) -> ZstdErrorKind {
        self.kind
    }

    /// Attach (or extend) call-site context, mirroring the teacher's
    /// `.at(self)?` idiom.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = match self.context.take() {
            Some(existing) => Some(format!("{existing} <- {}", context.into())),
            None => Some(context.into()),
        };
        self
    }
}

impl StdError for ZstdError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl Display for ZstdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.location)?;
        if let Some(context) = &self.context {
            write!(f, " ({context})")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(source) = &self.source {
            write!(f, "\ncaused by {source}")?;
        }
        Ok(())
    }
}

impl From<ZstdError> for std::io::Error {
    fn from(value: ZstdError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, value)
    }
}

/// Extension trait letting call sites tack a short description onto a
/// `Result`'s error without losing its kind or location.
pub trait WithContext<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> WithContext<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

#[track_caller]
pub fn err<T>(kind: ZstdErrorKind, message: impl Into<String>) -> Result<T> {
    Err(ZstdError::msg(kind, message))
}
