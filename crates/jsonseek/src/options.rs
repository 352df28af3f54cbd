/// Default for [`CodecOptions::max_document_size`]: 100 MiB.
pub const DEFAULT_MAX_DOCUMENT_SIZE: u64 = 100 * 1024 * 1024;

/// Default for [`CodecOptions::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Configuration for decoding documents.
///
/// # Examples
///
/// ```rust
/// use jsonseek::CodecOptions;
///
/// let options = CodecOptions {
///     max_document_size: 1024 * 1024,
///     ..Default::default()
/// };
/// assert_eq!(options.max_depth, jsonseek::DEFAULT_MAX_DEPTH);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Largest accepted document, in bytes.
    ///
    /// A source longer than this is rejected with
    /// [`CodecError::OversizedInput`](crate::CodecError::OversizedInput)
    /// before any byte is scanned, whatever its content.
    ///
    /// # Default
    ///
    /// 104 857 600 (100 MiB)
    pub max_document_size: u64,

    /// Deepest accepted nesting of arrays and objects.
    ///
    /// # Default
    ///
    /// 512
    pub max_depth: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
