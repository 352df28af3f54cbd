//! Incremental, streaming JSON writer.
//!
//! An [`Encoder`] writes a document to any [`Write`] sink one call at a
//! time, keeping only a stack of open containers. It inserts separators and
//! escapes strings, and refuses call sequences that would produce an invalid
//! document.
//!
//! ```rust
//! use jsonseek::Encoder;
//!
//! let mut enc = Encoder::new(Vec::new());
//! enc.start_object()?;
//! enc.add_keyed_scalar("Status", 200)?;
//! enc.start_keyed_array("Rows")?;
//! enc.add_scalar(1)?;
//! enc.add_scalar(2)?;
//! let out = enc.finish()?;
//! assert_eq!(out, br#"{"Status":200,"Rows":[1, 2]}"#);
//! # Ok::<(), jsonseek::EncodeError>(())
//! ```
use std::io::Write;

use crate::{ContainerKind, EncodeError, UsageError, Value, escape::write_escaped};

/// Written between two array elements.
pub const ARRAY_SEPARATOR: &str = ", ";
/// Written between two object members.
pub const OBJECT_SEPARATOR: &str = ",";

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: ContainerKind,
    has_elements: bool,
}

/// Writes one JSON document to `W`.
///
/// Keyed calls (`*_keyed_*`) are only valid directly inside an object, the
/// unkeyed ones only inside an array or for the root value. The first
/// failing call poisons the encoder: everything after it returns
/// [`UsageError::Poisoned`] and writes nothing.
#[derive(Debug)]
pub struct Encoder<W: Write> {
    writer: W,
    frames: Vec<Frame>,
    root_written: bool,
    poisoned: bool,
}

impl<W: Write> Encoder<W> {
    /// Creates an encoder writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames: Vec::new(),
            root_written: false,
            poisoned: false,
        }
    }

    /// Number of containers currently open.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` once a call has failed.
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Borrows the sink.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Opens an array as the root or as the next array element.
    ///
    /// # Errors
    ///
    /// [`UsageError::MissingKey`] inside an object, [`UsageError::SecondRoot`]
    /// once the root value is complete.
    pub fn start_array(&mut self) -> Result<(), EncodeError> {
        self.run(|enc| enc.open(None, ContainerKind::Array))
    }

    /// Opens an object as the root or as the next array element.
    ///
    /// # Errors
    ///
    /// As for [`start_array`](Self::start_array).
    pub fn start_object(&mut self) -> Result<(), EncodeError> {
        self.run(|enc| enc.open(None, ContainerKind::Object))
    }

    /// Opens an array as the member `key` of the current object.
    ///
    /// # Errors
    ///
    /// [`UsageError::KeyInArray`] inside an array, [`UsageError::KeyAtRoot`]
    /// with no container open.
    pub fn start_keyed_array(&mut self, key: &str) -> Result<(), EncodeError> {
        self.run(|enc| enc.open(Some(key), ContainerKind::Array))
    }

    /// Opens an object as the member `key` of the current object.
    ///
    /// # Errors
    ///
    /// As for [`start_keyed_array`](Self::start_keyed_array).
    pub fn start_keyed_object(&mut self, key: &str) -> Result<(), EncodeError> {
        self.run(|enc| enc.open(Some(key), ContainerKind::Object))
    }

    /// Writes a value as the root or as the next array element.
    ///
    /// Arrays and objects are written out whole.
    ///
    /// # Errors
    ///
    /// As for [`start_array`](Self::start_array), plus I/O errors.
    pub fn add_scalar(&mut self, value: impl Into<Value>) -> Result<(), EncodeError> {
        let value = value.into();
        self.run(|enc| {
            enc.begin_element(None)?;
            write!(enc.writer, "{value}")?;
            Ok(())
        })
    }

    /// Writes a value as the member `key` of the current object.
    ///
    /// # Errors
    ///
    /// As for [`start_keyed_array`](Self::start_keyed_array), plus I/O
    /// errors.
    pub fn add_keyed_scalar(
        &mut self,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), EncodeError> {
        let value = value.into();
        self.run(|enc| {
            enc.begin_element(Some(key))?;
            write!(enc.writer, "{value}")?;
            Ok(())
        })
    }

    /// Writes pre-encoded bytes verbatim as the root or the next array
    /// element. The bytes are not checked.
    ///
    /// # Errors
    ///
    /// As for [`add_scalar`](Self::add_scalar).
    pub fn append_raw(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.run(|enc| {
            enc.begin_element(None)?;
            enc.writer.write_all(bytes)?;
            Ok(())
        })
    }

    /// Writes pre-encoded bytes verbatim as the member `key`.
    ///
    /// # Errors
    ///
    /// As for [`add_keyed_scalar`](Self::add_keyed_scalar).
    pub fn append_keyed_raw(&mut self, key: &str, bytes: &[u8]) -> Result<(), EncodeError> {
        self.run(|enc| {
            enc.begin_element(Some(key))?;
            enc.writer.write_all(bytes)?;
            Ok(())
        })
    }

    /// Closes the innermost container, which must be an array.
    ///
    /// # Errors
    ///
    /// [`UsageError::NothingOpen`] or [`UsageError::MismatchedEnd`].
    pub fn end_array(&mut self) -> Result<(), EncodeError> {
        self.run(|enc| enc.close(ContainerKind::Array))
    }

    /// Closes the innermost container, which must be an object.
    ///
    /// # Errors
    ///
    /// [`UsageError::NothingOpen`] or [`UsageError::MismatchedEnd`].
    pub fn end_object(&mut self) -> Result<(), EncodeError> {
        self.run(|enc| enc.close(ContainerKind::Object))
    }

    /// Closes every container still open, innermost first, flushes and
    /// returns the sink.
    ///
    /// # Errors
    ///
    /// [`UsageError::Poisoned`] after an earlier failure, or I/O errors.
    pub fn finish(mut self) -> Result<W, EncodeError> {
        if self.poisoned {
            return Err(UsageError::Poisoned.into());
        }
        if !self.frames.is_empty() {
            tracing::warn!(open = self.frames.len(), "closing unterminated containers");
        }
        while let Some(frame) = self.frames.last() {
            let kind = frame.kind;
            self.close(kind)?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn run(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        if self.poisoned {
            return Err(UsageError::Poisoned.into());
        }
        let result = op(self);
        if let Err(err) = &result {
            tracing::debug!(%err, depth = self.frames.len(), "encoder poisoned");
            self.poisoned = true;
        }
        result
    }

    /// Checks that an element may go here, then writes its separator and key.
    fn begin_element(&mut self, key: Option<&str>) -> Result<(), EncodeError> {
        let Some(frame) = self.frames.last_mut() else {
            if key.is_some() {
                return Err(UsageError::KeyAtRoot.into());
            }
            if self.root_written {
                return Err(UsageError::SecondRoot.into());
            }
            self.root_written = true;
            return Ok(());
        };

        let separator = match (frame.kind, key) {
            (ContainerKind::Array, Some(_)) => return Err(UsageError::KeyInArray.into()),
            (ContainerKind::Object, None) => return Err(UsageError::MissingKey.into()),
            (ContainerKind::Array, None) => ARRAY_SEPARATOR,
            (ContainerKind::Object, Some(_)) => OBJECT_SEPARATOR,
        };
        if frame.has_elements {
            self.writer.write_all(separator.as_bytes())?;
        }
        frame.has_elements = true;

        if let Some(key) = key {
            self.writer.write_all(b"\"")?;
            write_escaped(key, &mut self.writer)?;
            self.writer.write_all(b"\":")?;
        }
        Ok(())
    }

    fn open(&mut self, key: Option<&str>, kind: ContainerKind) -> Result<(), EncodeError> {
        self.begin_element(key)?;
        self.writer.write_all(&[kind.open_byte()])?;
        self.frames.push(Frame {
            kind,
            has_elements: false,
        });
        Ok(())
    }

    fn close(&mut self, kind: ContainerKind) -> Result<(), EncodeError> {
        match self.frames.last() {
            None => return Err(UsageError::NothingOpen(kind).into()),
            Some(frame) if frame.kind != kind => {
                return Err(UsageError::MismatchedEnd {
                    open: frame.kind,
                    closing: kind,
                }
                .into());
            }
            Some(_) => {}
        }
        self.frames.pop();
        self.writer.write_all(&[kind.close_byte()])?;
        Ok(())
    }
}
