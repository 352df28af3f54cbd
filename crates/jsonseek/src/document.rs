use std::{
    fs::File,
    io::{Cursor, Read, Seek},
};

use crate::{
    CodecError, CodecOptions, ContainerKind, Index, Mode, Path, Scanner, Source, Value, accessor,
};

/// A document together with its options and, once built, its index.
///
/// The first query builds the [`Index`] with one pass over the source;
/// every later query reuses it and reads only the bytes it needs.
///
/// # Examples
///
/// ```rust
/// use jsonseek::{ContainerKind, Document, Value};
///
/// let mut doc = Document::from_bytes(r#"{"Status":200,"Rows":[{"id":1},{"id":2}]}"#)?;
/// assert_eq!(doc.count("Rows")?, 2);
/// assert_eq!(doc.type_of("Rows:0")?, ContainerKind::Object);
/// assert_eq!(doc.get("Rows:1:id")?, Value::from(2));
/// assert_eq!(doc.get_raw("Rows:0")?, br#"{"id":1}"#);
/// # Ok::<(), jsonseek::CodecError>(())
/// ```
#[derive(Debug)]
pub struct Document<R> {
    source: Source<R>,
    options: CodecOptions,
    index: Option<Index>,
}

impl Document<Cursor<Vec<u8>>> {
    /// Wraps an in-memory document.
    ///
    /// # Errors
    ///
    /// [`CodecError::OversizedInput`] if the buffer is larger than the
    /// default maximum.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, CodecError> {
        Self::from_source(Source::from_bytes(bytes), CodecOptions::default())
    }
}

impl Document<File> {
    /// Opens a document stored in a file.
    ///
    /// # Errors
    ///
    /// I/O errors, or [`CodecError::OversizedInput`].
    pub fn open_path(
        path: impl AsRef<std::path::Path>,
        options: CodecOptions,
    ) -> Result<Self, CodecError> {
        Self::from_source(Source::open(path)?, options)
    }
}

impl<R: Read + Seek> Document<R> {
    /// Wraps a seekable reader with default options.
    ///
    /// # Errors
    ///
    /// As for [`with_options`](Self::with_options).
    pub fn open(reader: R) -> Result<Self, CodecError> {
        Self::with_options(reader, CodecOptions::default())
    }

    /// Wraps a seekable reader.
    ///
    /// The size guard runs here, before any byte is read.
    ///
    /// # Errors
    ///
    /// I/O errors from measuring the reader, or
    /// [`CodecError::OversizedInput`].
    pub fn with_options(reader: R, options: CodecOptions) -> Result<Self, CodecError> {
        Self::from_source(Source::new(reader)?, options)
    }

    /// Wraps an existing source.
    ///
    /// # Errors
    ///
    /// [`CodecError::OversizedInput`].
    pub fn from_source(source: Source<R>, options: CodecOptions) -> Result<Self, CodecError> {
        source.check_size(&options)?;
        Ok(Self {
            source,
            options,
            index: None,
        })
    }

    #[must_use]
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Length of the document in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.source.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Checks that the document is well formed.
    ///
    /// A document whose index has been built is already known to be valid.
    ///
    /// # Errors
    ///
    /// The first [`CodecError::MalformedJson`].
    pub fn validate(&mut self) -> Result<(), CodecError> {
        if self.index.is_some() {
            return Ok(());
        }
        accessor::validate(&mut self.source, &self.options)
    }

    /// Returns the index, building it on first use.
    ///
    /// # Errors
    ///
    /// The first [`CodecError::MalformedJson`]. Nothing is cached on error.
    pub fn index(&mut self) -> Result<&Index, CodecError> {
        self.parts().map(|(_, index, _)| index)
    }

    /// See [`accessor::exists`].
    ///
    /// # Errors
    ///
    /// Only from building the index.
    pub fn exists(&mut self, path: impl Into<Path>) -> Result<bool, CodecError> {
        let path = path.into();
        Ok(accessor::exists(self.index()?, &path))
    }

    /// See [`accessor::type_of`].
    ///
    /// # Errors
    ///
    /// From building the index, or as for [`accessor::type_of`].
    pub fn type_of(&mut self, path: impl Into<Path>) -> Result<ContainerKind, CodecError> {
        let path = path.into();
        accessor::type_of(self.index()?, &path)
    }

    /// See [`accessor::count`].
    ///
    /// # Errors
    ///
    /// From building the index, or as for [`accessor::count`].
    pub fn count(&mut self, path: impl Into<Path>) -> Result<usize, CodecError> {
        let path = path.into();
        accessor::count(self.index()?, &path)
    }

    /// See [`accessor::get`].
    ///
    /// # Errors
    ///
    /// From building the index, or as for [`accessor::get`].
    pub fn get(&mut self, path: impl Into<Path>) -> Result<Value, CodecError> {
        let path = path.into();
        let (source, index, options) = self.parts()?;
        accessor::get(source, index, &path, options)
    }

    /// See [`accessor::get_raw`].
    ///
    /// # Errors
    ///
    /// From building the index, or as for [`accessor::get_raw`].
    pub fn get_raw(&mut self, path: impl Into<Path>) -> Result<Vec<u8>, CodecError> {
        let path = path.into();
        let (source, index, options) = self.parts()?;
        accessor::get_raw(source, index, &path, options)
    }

    /// Starts a fresh scan over the whole document.
    ///
    /// # Errors
    ///
    /// As for [`Scanner::new`].
    pub fn events(&mut self, mode: Mode) -> Result<Scanner<'_, R>, CodecError> {
        Scanner::new(&mut self.source, mode, None, &self.options)
    }

    /// Gives back the reader.
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }

    fn parts(&mut self) -> Result<(&mut Source<R>, &Index, &CodecOptions), CodecError> {
        let index = match self.index.take() {
            Some(index) => index,
            None => accessor::build_index(&mut self.source, &self.options)?,
        };
        let index: &Index = self.index.insert(index);
        Ok((&mut self.source, index, &self.options))
    }
}
