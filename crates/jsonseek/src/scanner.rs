//! The single-pass decode state machine.
//!
//! A [`Scanner`] reads a [`Source`] one byte at a time and yields
//! [`Event`]s as containers close. It runs in one of two modes:
//!
//! - [`Mode::Index`] records only byte ranges ([`Span`]s): one event for
//!   every container, plus one for every scalar object member. Scalar array
//!   elements only bump their array's length, so memory stays proportional
//!   to the number of containers even for huge arrays of scalars.
//! - [`Mode::Value`] materializes [`Value`]s. Nested containers are folded
//!   into their parent and only the root of the scanned range produces an
//!   event.
//!
//! Scanning can be restricted to a [`ByteRange`]; the range must then hold
//! exactly one complete value, which becomes the root of the scan and of
//! every emitted path.
//!
//! # Examples
//!
//! ```rust
//! use jsonseek::{CodecOptions, Mode, Payload, Scanner, Source, path};
//!
//! let mut source = Source::from_bytes(r#"{"a":[1,2]}"#);
//! let options = CodecOptions::default();
//! let events: Vec<_> = Scanner::new(&mut source, Mode::Index, None, &options)
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//!
//! assert_eq!(events[0].path, path!["a"]);
//! let Payload::Span(span) = &events[0].payload else { unreachable!() };
//! assert_eq!((span.start, span.end), (5, 9));
//! ```
use std::{
    collections::VecDeque,
    io::{Read, Seek},
    iter::FusedIterator,
};

use bstr::BString;

use crate::{
    CodecError, CodecOptions, ContainerKind, Map, Path, PathItem, Source, SyntaxError, Value,
    escape::EscapeBuffer,
};

/// What a scan produces for each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Byte ranges only.
    Index,
    /// Materialized values.
    Value,
}

/// An inclusive byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

/// Shape of an indexed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// An array with `len` direct elements.
    Array { len: usize },
    Object,
    /// A string, integer or `null`.
    Scalar,
}

impl Shape {
    /// The container kind, or `None` for scalars.
    #[must_use]
    pub fn container_kind(self) -> Option<ContainerKind> {
        match self {
            Shape::Array { .. } => Some(ContainerKind::Array),
            Shape::Object => Some(ContainerKind::Object),
            Shape::Scalar => None,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Shape::Array { .. } => ContainerKind::Array.name(),
            Shape::Object => ContainerKind::Object.name(),
            Shape::Scalar => "a scalar",
        }
    }
}

/// Location of a node in the source.
///
/// For containers `start` and `end` are the offsets of the opening and
/// closing bracket; for scalars they are the first and last byte of the
/// token, quotes included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u64,
    pub end: u64,
    pub shape: Shape,
}

impl Span {
    /// The byte range covered by the node.
    #[must_use]
    pub fn range(&self) -> ByteRange {
        ByteRange {
            start: self.start,
            end: self.end,
        }
    }
}

/// Payload of an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Span(Span),
    Value(Value),
}

/// One `(path, payload)` pair produced by a [`Scanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Location relative to the root of the scan.
    pub path: Path,
    pub payload: Payload,
}

// ------------------------------------------------------------------------------------------------
// Internal state
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Unquoted,
    Quoted,
    EscapePending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarMode {
    Key,
    Value,
}

#[derive(Debug)]
enum FrameValues {
    /// Index mode keeps no values.
    None,
    Array(Vec<Value>),
    Object(Map),
}

impl FrameValues {
    fn new(mode: Mode, kind: ContainerKind) -> Self {
        match (mode, kind) {
            (Mode::Index, _) => Self::None,
            (Mode::Value, ContainerKind::Array) => Self::Array(Vec::new()),
            (Mode::Value, ContainerKind::Object) => Self::Object(Map::new()),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::None => Value::Null,
            Self::Array(a) => Value::Array(a),
            Self::Object(m) => Value::Object(m),
        }
    }
}

/// Stack entry – one per open container
#[derive(Debug)]
struct Frame {
    kind: ContainerKind,
    start: u64,
    /// Key or index under the parent; `None` for the scan root.
    segment: Option<PathItem>,
    /// Direct children committed so far.
    len: usize,
    pending_key: Option<String>,
    values: FrameValues,
}

/// The decode state machine; see the [module documentation](self).
///
/// The scanner borrows its source mutably for its whole life. Dropping it
/// part way through is fine, but it cannot be resumed: start a new scan.
#[derive(Debug)]
pub struct Scanner<'s, R> {
    source: &'s mut Source<R>,
    mode: Mode,
    /// Exclusive end offset of the scan.
    limit: u64,
    max_depth: usize,
    /// Report scalar elements of the root array too.
    element_spans: bool,

    lex: LexState,
    var_mode: VarMode,
    frames: Vec<Frame>,

    /// Decoded bytes of the quoted token being read.
    text: Vec<u8>,
    /// Whether `text` needs to be kept once the token closes.
    keep_text: bool,
    token_start: u64,
    escape: EscapeBuffer,

    /// Unquoted token being read.
    bare: Vec<u8>,
    bare_start: u64,

    /// A value just completed; only `,` or a closing bracket may follow.
    after_value: bool,
    root_done: bool,

    queue: VecDeque<Event>,
    finished: bool,
}

impl<R> Iterator for Scanner<'_, R>
where
    R: Read + Seek,
{
    type Item = Result<Event, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }
            if let Err(err) = self.step() {
                self.finished = true;
                self.queue.clear();
                return Some(Err(err));
            }
        }
    }
}

impl<R> FusedIterator for Scanner<'_, R> where R: Read + Seek {}

impl<'s, R> Scanner<'s, R>
where
    R: Read + Seek,
{
    /// Starts a scan over `range`, or over the whole source when `range` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// - [`CodecError::OversizedInput`] for a whole-source scan of a source
    ///   larger than [`CodecOptions::max_document_size`]; no byte is read.
    /// - [`CodecError::InvalidRange`] if `range` is reversed or extends past
    ///   the end of the source.
    pub fn new(
        source: &'s mut Source<R>,
        mode: Mode,
        range: Option<ByteRange>,
        options: &CodecOptions,
    ) -> Result<Self, CodecError> {
        let (start, limit) = match range {
            Some(ByteRange { start, end }) => {
                if start > end || end >= source.len() {
                    return Err(CodecError::InvalidRange { start, end });
                }
                (start, end + 1)
            }
            None => {
                source.check_size(options)?;
                (0, source.len())
            }
        };
        source.seek_to(start)?;
        tracing::trace!(?mode, start, limit, "starting scan");

        Ok(Self {
            source,
            mode,
            limit,
            max_depth: options.max_depth,
            element_spans: false,
            lex: LexState::Unquoted,
            var_mode: VarMode::Value,
            frames: Vec::with_capacity(16),
            text: Vec::new(),
            keep_text: false,
            token_start: start,
            escape: EscapeBuffer::new(),
            bare: Vec::new(),
            bare_start: start,
            after_value: false,
            root_done: false,
            queue: VecDeque::new(),
            finished: false,
        })
    }

    /// Also reports a [`Span`] for every scalar element of the root array,
    /// with the element's index as its path.
    ///
    /// Only index mode reports them. Containers already produce their own
    /// events, so together this locates any direct element without
    /// materializing the array.
    #[must_use]
    pub fn with_element_spans(mut self) -> Self {
        self.element_spans = true;
        self
    }

    /// The mode this scanner runs in.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    // --------------------------------------------------------------------------------------------
    // Byte dispatch
    // --------------------------------------------------------------------------------------------

    fn step(&mut self) -> Result<(), CodecError> {
        let offset = self.source.position();
        #[cfg(any(test, feature = "fuzzing"))]
        assert!(
            offset <= self.limit && self.frames.len() <= self.max_depth,
            "Internal error: scan left its range or outgrew the depth guard"
        );
        if offset >= self.limit {
            return self.finalize();
        }
        let Some(byte) = self.source.next_byte()? else {
            return self.finalize();
        };

        match self.lex {
            LexState::Quoted => match byte {
                b'\\' => {
                    self.escape.open();
                    self.lex = LexState::EscapePending;
                }
                b'"' => self.close_string(offset)?,
                _ => self.push_text(byte),
            },
            LexState::EscapePending => match self.escape.feed(byte) {
                Ok(Some(literal)) => {
                    self.push_text(literal);
                    self.lex = LexState::Quoted;
                }
                Ok(None) => {}
                Err(err) => {
                    return Err(CodecError::malformed(offset - 1, vec![b'\\', byte], err));
                }
            },
            LexState::Unquoted => match byte {
                b'"' => {
                    self.reject_pending_bare()?;
                    self.open_string(offset)?;
                }
                b'{' => {
                    self.reject_pending_bare()?;
                    self.open_container(ContainerKind::Object, offset)?;
                }
                b'[' => {
                    self.reject_pending_bare()?;
                    self.open_container(ContainerKind::Array, offset)?;
                }
                b'}' => {
                    self.flush_bare()?;
                    self.close_container(ContainerKind::Object, offset)?;
                }
                b']' => {
                    self.flush_bare()?;
                    self.close_container(ContainerKind::Array, offset)?;
                }
                b',' => {
                    self.flush_bare()?;
                    self.comma(offset)?;
                }
                b':' => {
                    self.flush_bare()?;
                    self.colon(offset)?;
                }
                b' ' | b'\t' | b'\n' | b'\r' => self.flush_bare()?,
                _ => {
                    if self.bare.is_empty() {
                        self.begin_value(offset, false, byte)?;
                        self.bare_start = offset;
                    }
                    self.bare.push(byte);
                }
            },
        }
        Ok(())
    }

    /// End of the source or of the range.
    fn finalize(&mut self) -> Result<(), CodecError> {
        self.finished = true;
        if self.lex == LexState::Unquoted && !self.escape.is_pending() {
            self.flush_bare()?;
        } else {
            let token = BString::from(&self.text[..self.text.len().min(32)]);
            return Err(CodecError::malformed(
                self.token_start,
                token,
                SyntaxError::UnterminatedString,
            ));
        }
        if let Some(frame) = self.frames.last() {
            return Err(CodecError::malformed(
                frame.start,
                vec![frame.kind.open_byte()],
                SyntaxError::UnbalancedContainers,
            ));
        }
        if !self.root_done {
            return Err(CodecError::malformed(
                self.source.position(),
                BString::default(),
                SyntaxError::EmptyInput,
            ));
        }
        Ok(())
    }

    // --------------------------------------------------------------------------------------------
    // Tokens
    // --------------------------------------------------------------------------------------------

    /// Checks that a key or value may start at `offset`.
    fn begin_value(&self, offset: u64, quoted: bool, byte: u8) -> Result<(), CodecError> {
        if self.after_value {
            let err = if self.frames.is_empty() {
                SyntaxError::TrailingData
            } else {
                SyntaxError::MissingComma
            };
            return Err(CodecError::malformed(offset, vec![byte], err));
        }
        if let Some(frame) = self.frames.last() {
            if frame.kind == ContainerKind::Object
                && self.var_mode == VarMode::Key
                && (!quoted || frame.pending_key.is_some())
            {
                return Err(CodecError::malformed(
                    offset,
                    vec![byte],
                    SyntaxError::UnexpectedByte,
                ));
            }
        }
        Ok(())
    }

    /// A bare token ran straight into a quote or an opening bracket.
    fn reject_pending_bare(&self) -> Result<(), CodecError> {
        if self.bare.is_empty() {
            return Ok(());
        }
        Err(CodecError::malformed(
            self.bare_start,
            self.bare.clone(),
            SyntaxError::InvalidBareToken,
        ))
    }

    fn open_string(&mut self, offset: u64) -> Result<(), CodecError> {
        self.begin_value(offset, true, b'"')?;
        let is_key = matches!(self.frames.last(), Some(f) if f.kind == ContainerKind::Object)
            && self.var_mode == VarMode::Key;
        self.keep_text = is_key || self.mode == Mode::Value;
        self.text.clear();
        self.escape.reset();
        self.token_start = offset;
        self.lex = LexState::Quoted;
        Ok(())
    }

    #[inline]
    fn push_text(&mut self, byte: u8) {
        self.text.push(byte);
    }

    fn close_string(&mut self, offset: u64) -> Result<(), CodecError> {
        self.lex = LexState::Unquoted;
        let bytes = core::mem::take(&mut self.text);
        let text = String::from_utf8(bytes).map_err(|err| {
            let token = err.into_bytes();
            CodecError::malformed(self.token_start, token, SyntaxError::InvalidUtf8)
        })?;

        if let Some(frame) = self.frames.last_mut() {
            if frame.kind == ContainerKind::Object && self.var_mode == VarMode::Key {
                frame.pending_key = Some(text);
                return Ok(());
            }
        }

        let value = if self.keep_text {
            Value::String(text)
        } else {
            // Index mode never looks at scalar values; reuse the allocation.
            self.text = text.into_bytes();
            self.text.clear();
            Value::Null
        };
        self.commit_scalar(value, self.token_start, offset)
    }

    fn flush_bare(&mut self) -> Result<(), CodecError> {
        if self.bare.is_empty() {
            return Ok(());
        }
        let token = core::mem::take(&mut self.bare);
        let value = parse_bare(&token).ok_or_else(|| {
            CodecError::malformed(self.bare_start, token.clone(), SyntaxError::InvalidBareToken)
        })?;
        let end = self.bare_start + token.len() as u64 - 1;
        self.bare = token;
        self.bare.clear();
        self.commit_scalar(value, self.bare_start, end)
    }

    fn commit_scalar(&mut self, value: Value, start: u64, end: u64) -> Result<(), CodecError> {
        self.after_value = true;
        let scalar_span = Span {
            start,
            end,
            shape: Shape::Scalar,
        };

        let root_element = self.element_spans && self.frames.len() == 1;
        let Some(frame) = self.frames.last_mut() else {
            self.root_done = true;
            let payload = match self.mode {
                Mode::Index => Payload::Span(scalar_span),
                Mode::Value => Payload::Value(value),
            };
            self.queue.push_back(Event {
                path: Path::root(),
                payload,
            });
            return Ok(());
        };

        frame.len += 1;
        let key = match frame.kind {
            ContainerKind::Array => {
                if let FrameValues::Array(values) = &mut frame.values {
                    values.push(value);
                } else if root_element {
                    self.queue.push_back(Event {
                        path: Path::from(vec![PathItem::Index(frame.len - 1)]),
                        payload: Payload::Span(scalar_span),
                    });
                }
                return Ok(());
            }
            ContainerKind::Object => frame.pending_key.take(),
        };
        let Some(key) = key else {
            return Err(CodecError::malformed(
                start,
                BString::default(),
                SyntaxError::UnexpectedByte,
            ));
        };
        if let FrameValues::Object(map) = &mut frame.values {
            map.insert(key, value);
            return Ok(());
        }

        let path = self.current_path().join(PathItem::Key(key));
        self.queue.push_back(Event {
            path,
            payload: Payload::Span(scalar_span),
        });
        Ok(())
    }

    // --------------------------------------------------------------------------------------------
    // Structure
    // --------------------------------------------------------------------------------------------

    fn open_container(&mut self, kind: ContainerKind, offset: u64) -> Result<(), CodecError> {
        self.begin_value(offset, false, kind.open_byte())?;
        if self.frames.len() >= self.max_depth {
            return Err(CodecError::malformed(
                offset,
                vec![kind.open_byte()],
                SyntaxError::NestingTooDeep,
            ));
        }

        let segment = match self.frames.last_mut() {
            None => None,
            Some(parent) => match parent.kind {
                ContainerKind::Array => {
                    let index = parent.len;
                    parent.len += 1;
                    Some(PathItem::Index(index))
                }
                ContainerKind::Object => {
                    parent.len += 1;
                    Some(PathItem::Key(parent.pending_key.take().unwrap_or_default()))
                }
            },
        };

        self.frames.push(Frame {
            kind,
            start: offset,
            segment,
            len: 0,
            pending_key: None,
            values: FrameValues::new(self.mode, kind),
        });
        self.var_mode = match kind {
            ContainerKind::Array => VarMode::Value,
            ContainerKind::Object => VarMode::Key,
        };
        self.after_value = false;
        Ok(())
    }

    fn close_container(&mut self, kind: ContainerKind, offset: u64) -> Result<(), CodecError> {
        let close = kind.close_byte();
        let Some(frame) = self.frames.last() else {
            let err = if self.root_done {
                SyntaxError::TrailingData
            } else {
                SyntaxError::UnexpectedByte
            };
            return Err(CodecError::malformed(offset, vec![close], err));
        };
        if frame.kind != kind {
            return Err(CodecError::malformed(
                offset,
                vec![close],
                SyntaxError::MismatchedBracket,
            ));
        }
        if frame.pending_key.is_some() {
            return Err(CodecError::malformed(
                offset,
                vec![close],
                SyntaxError::MissingValue,
            ));
        }
        if frame.len > 0 && !self.after_value {
            // trailing comma
            return Err(CodecError::malformed(
                offset,
                vec![close],
                SyntaxError::UnexpectedByte,
            ));
        }

        let path = self.current_path();
        let Some(frame) = self.frames.pop() else {
            return Ok(());
        };

        match self.mode {
            Mode::Index => {
                let shape = match frame.kind {
                    ContainerKind::Array => Shape::Array { len: frame.len },
                    ContainerKind::Object => Shape::Object,
                };
                self.queue.push_back(Event {
                    path,
                    payload: Payload::Span(Span {
                        start: frame.start,
                        end: offset,
                        shape,
                    }),
                });
            }
            Mode::Value => {
                let value = frame.values.into_value();
                match self.frames.last_mut() {
                    None => self.queue.push_back(Event {
                        path,
                        payload: Payload::Value(value),
                    }),
                    Some(parent) => match (&mut parent.values, frame.segment) {
                        (FrameValues::Array(values), _) => values.push(value),
                        (FrameValues::Object(map), Some(PathItem::Key(key))) => {
                            map.insert(key, value);
                        }
                        _ => {}
                    },
                }
            }
        }

        if self.frames.is_empty() {
            self.root_done = true;
        }
        self.after_value = true;
        self.var_mode = VarMode::Value;
        Ok(())
    }

    fn comma(&mut self, offset: u64) -> Result<(), CodecError> {
        let Some(frame) = self.frames.last() else {
            let err = if self.root_done {
                SyntaxError::TrailingData
            } else {
                SyntaxError::UnexpectedByte
            };
            return Err(CodecError::malformed(offset, vec![b','], err));
        };
        if !self.after_value {
            return Err(CodecError::malformed(
                offset,
                vec![b','],
                SyntaxError::UnexpectedByte,
            ));
        }
        self.var_mode = match frame.kind {
            ContainerKind::Array => VarMode::Value,
            ContainerKind::Object => VarMode::Key,
        };
        self.after_value = false;
        Ok(())
    }

    fn colon(&mut self, offset: u64) -> Result<(), CodecError> {
        match self.frames.last() {
            Some(frame)
                if frame.kind == ContainerKind::Object
                    && self.var_mode == VarMode::Key
                    && frame.pending_key.is_some() =>
            {
                self.var_mode = VarMode::Value;
                Ok(())
            }
            _ => Err(CodecError::malformed(
                offset,
                vec![b':'],
                SyntaxError::UnexpectedByte,
            )),
        }
    }

    /// Path of the innermost open container, relative to the scan root.
    fn current_path(&self) -> Path {
        self.frames
            .iter()
            .filter_map(|frame| frame.segment.clone())
            .collect()
    }
}

/// Parses an unquoted token: `null` or a base-10 integer.
fn parse_bare(token: &[u8]) -> Option<Value> {
    if token == b"null" {
        return Some(Value::Null);
    }
    let digits = token.strip_prefix(b"-").unwrap_or(token);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    // ASCII digits with an optional sign are valid UTF-8.
    let text = core::str::from_utf8(token).ok()?;
    text.parse::<i64>().ok().map(Value::Number)
}
