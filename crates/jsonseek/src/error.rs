use std::io;

use bstr::BString;
use thiserror::Error;

use crate::{ContainerKind, Path};

/// Errors produced while decoding a document or accessing it by path.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The source is larger than [`CodecOptions::max_document_size`].
    ///
    /// [`CodecOptions::max_document_size`]: crate::CodecOptions::max_document_size
    #[error("document of {size} bytes exceeds the maximum of {max} bytes")]
    OversizedInput { size: u64, max: u64 },

    /// The document is not valid JSON.
    #[error("malformed JSON at byte {offset}: {source} (near {token:?})")]
    MalformedJson {
        offset: u64,
        /// The raw bytes of the offending token, when there is one.
        token: BString,
        source: SyntaxError,
    },

    /// The path does not exist in the index.
    #[error("path '{path}' not found")]
    PathNotFound { path: Path },

    /// The path exists but its node has a different shape than requested.
    #[error("path '{path}' is {found}, expected {expected}")]
    TypeMismatch {
        path: Path,
        expected: &'static str,
        found: &'static str,
    },

    /// A recorded byte range cannot be read back.
    #[error("invalid byte range {start}..={end}")]
    InvalidRange { start: u64, end: u64 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl CodecError {
    /// Returns `true` for the outcomes callers are expected to handle as
    /// "no data": [`PathNotFound`](Self::PathNotFound) and
    /// [`TypeMismatch`](Self::TypeMismatch).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PathNotFound { .. } | Self::TypeMismatch { .. })
    }

    pub(crate) fn malformed(offset: u64, token: impl Into<BString>, source: SyntaxError) -> Self {
        Self::MalformedJson {
            offset,
            token: token.into(),
            source,
        }
    }

    pub(crate) fn not_found(path: &Path) -> Self {
        Self::PathNotFound { path: path.clone() }
    }
}

/// The specific syntax rule a malformed document broke.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("bare token is neither null nor an integer")]
    InvalidBareToken,
    #[error("unexpected byte")]
    UnexpectedByte,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unbalanced containers at end of input")]
    UnbalancedContainers,
    #[error("closing bracket does not match the open container")]
    MismatchedBracket,
    #[error("object key without a value")]
    MissingValue,
    #[error("expected ',' between elements")]
    MissingComma,
    #[error("nesting exceeds the configured depth")]
    NestingTooDeep,
    #[error("trailing data after the root value")]
    TrailingData,
    #[error("empty input")]
    EmptyInput,
}

/// Errors produced by the [`Encoder`](crate::Encoder).
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("encoder misuse: {0}")]
    Usage(#[from] UsageError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A call sequence that cannot produce a valid response document.
///
/// These are programming errors in the caller. After the first one the
/// encoder refuses every further call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("keyed element inside an array")]
    KeyInArray,
    #[error("unkeyed element inside an object")]
    MissingKey,
    #[error("keyed element at the document root")]
    KeyAtRoot,
    #[error("{0} closed while no container is open")]
    NothingOpen(ContainerKind),
    #[error("{closing} closed while {open} is open")]
    MismatchedEnd {
        open: ContainerKind,
        closing: ContainerKind,
    },
    #[error("the document already has a root value")]
    SecondRoot,
    #[error("the encoder was poisoned by an earlier error")]
    Poisoned,
}
