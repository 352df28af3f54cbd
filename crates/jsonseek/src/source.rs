use std::{
    fs::File,
    io::{self, BufRead, BufReader, Cursor, Read, Seek, SeekFrom},
};

use crate::{CodecError, CodecOptions};

/// A seekable byte source positioned by absolute byte offsets.
///
/// A source is borrowed mutably by one scan at a time; every scan seeks to
/// the offset it needs before reading, so a source can serve any number of
/// sequential scans.
#[derive(Debug)]
pub struct Source<R> {
    reader: BufReader<R>,
    len: u64,
    pos: u64,
}

impl Source<Cursor<Vec<u8>>> {
    /// Wraps an in-memory buffer.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let len = bytes.len() as u64;
        Self {
            reader: BufReader::new(Cursor::new(bytes)),
            len,
            pos: 0,
        }
    }
}

impl Source<File> {
    /// Opens a file.
    ///
    /// # Errors
    ///
    /// Returns any error from opening or measuring the file.
    pub fn open(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        Self::new(File::open(path)?)
    }
}

impl<R: Read + Seek> Source<R> {
    /// Wraps a seekable reader, measuring its length once.
    ///
    /// # Errors
    ///
    /// Returns any error from seeking the reader.
    pub fn new(mut inner: R) -> io::Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self {
            reader: BufReader::new(inner),
            len,
            pos: 0,
        })
    }

    /// Total length in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if the source has no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset of the next byte [`next_byte`](Self::next_byte) returns.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Rejects the source if it is larger than the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::OversizedInput`].
    pub fn check_size(&self, options: &CodecOptions) -> Result<(), CodecError> {
        if self.len > options.max_document_size {
            tracing::debug!(
                size = self.len,
                max = options.max_document_size,
                "rejecting oversized document"
            );
            return Err(CodecError::OversizedInput {
                size: self.len,
                max: options.max_document_size,
            });
        }
        Ok(())
    }

    /// Moves the cursor to an absolute offset.
    ///
    /// # Errors
    ///
    /// Propagates seek errors from the reader.
    pub fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        if offset != self.pos {
            self.reader.seek(SeekFrom::Start(offset))?;
            self.pos = offset;
        }
        Ok(())
    }

    /// Reads one byte, or `None` at the end of the source.
    ///
    /// # Errors
    ///
    /// Propagates read errors from the reader.
    #[inline]
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let buf = self.reader.fill_buf()?;
        let Some(&byte) = buf.first() else {
            return Ok(None);
        };
        self.reader.consume(1);
        self.pos += 1;
        Ok(Some(byte))
    }

    /// Reads the inclusive range `start..=end` verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidRange`] if `start > end` or the range
    /// extends past the end of the source.
    pub fn read_range(&mut self, start: u64, end: u64) -> Result<Vec<u8>, CodecError> {
        if start > end || end >= self.len {
            return Err(CodecError::InvalidRange { start, end });
        }
        let len = usize::try_from(end - start + 1)
            .map_err(|_| CodecError::InvalidRange { start, end })?;
        self.seek_to(start)?;
        let mut bytes = vec![0; len];
        self.reader.read_exact(&mut bytes)?;
        self.pos += len as u64;
        Ok(bytes)
    }

    /// Unwraps the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}
