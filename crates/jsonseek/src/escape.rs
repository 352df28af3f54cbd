//! The escape table shared by the decoder and the encoder.
//!
//! The table is deliberately small: backslash, double quote, newline,
//! carriage return, tab, backspace and form feed. The decoder accepts exactly
//! these sequences and the encoder produces exactly these sequences, so the
//! two sides stay byte-for-byte compatible with each other. Every other
//! character, space included, travels unescaped.
//!
//! # Errors
//!
//! [`EscapeBuffer::feed`] returns [`SyntaxError::InvalidEscape`] for any
//! sequence that is not in the table (`\/`, `A`, `\x`, ...).
use std::io;

use crate::SyntaxError;

/// `(literal, escape)` pairs: the literal byte is written as `\` followed by
/// the escape byte.
pub const ESCAPE_TABLE: [(u8, u8); 7] = [
    (b'\\', b'\\'),
    (b'"', b'"'),
    (b'\n', b'n'),
    (b'\r', b'r'),
    (b'\t', b't'),
    (0x08, b'b'),
    (0x0C, b'f'),
];

/// Longest escape sequence in the table, backslash included.
const MAX_SEQUENCE_LEN: usize = 2;

/// Returns the escape byte for a literal that must be escaped.
#[must_use]
pub fn escape(literal: u8) -> Option<u8> {
    ESCAPE_TABLE
        .iter()
        .find_map(|&(lit, esc)| (lit == literal).then_some(esc))
}

/// Returns the literal for the byte following a backslash.
#[must_use]
pub fn unescape(escaped: u8) -> Option<u8> {
    ESCAPE_TABLE
        .iter()
        .find_map(|&(lit, esc)| (esc == escaped).then_some(lit))
}

/// Writes `src` with every table literal replaced by its escape sequence.
///
/// Only the bytes in [`ESCAPE_TABLE`] are touched; runs of other bytes are
/// copied through in one write.
///
/// # Errors
///
/// Propagates errors from `out`.
pub fn write_escaped<W: io::Write + ?Sized>(src: &str, out: &mut W) -> io::Result<()> {
    let bytes = src.as_bytes();
    let mut run_start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if let Some(esc) = escape(b) {
            out.write_all(&bytes[run_start..i])?;
            out.write_all(&[b'\\', esc])?;
            run_start = i + 1;
        }
    }
    out.write_all(&bytes[run_start..])
}

/// Escapes `src` into a new string.
#[must_use]
pub fn escape_string(src: &str) -> String {
    let mut out = String::with_capacity(src.len() + 2);
    let mut run_start = 0;
    // Table literals are ASCII, so every split lands on a char boundary.
    for (i, b) in src.bytes().enumerate() {
        if let Some(esc) = escape(b) {
            out.push_str(&src[run_start..i]);
            out.push('\\');
            out.push(char::from(esc));
            run_start = i + 1;
        }
    }
    out.push_str(&src[run_start..]);
    out
}

/// Pending buffer for an escape sequence inside a quoted token.
///
/// The decoder opens the buffer when it reads a backslash and feeds it every
/// following byte until the accumulated sequence matches a table entry.
#[derive(Debug, Default)]
pub(crate) struct EscapeBuffer {
    buffer: [u8; MAX_SEQUENCE_LEN],
    len: u8,
}

impl EscapeBuffer {
    /// Creates a closed buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new sequence with the backslash that introduced it.
    pub fn open(&mut self) {
        self.buffer[0] = b'\\';
        self.len = 1;
    }

    /// Returns `true` while a sequence is being accumulated.
    pub fn is_pending(&self) -> bool {
        self.len > 0
    }

    /// Clears any accumulated bytes.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Feeds the next byte of the sequence.
    ///
    /// - Returns `Ok(None)` while the sequence is still incomplete.
    /// - Returns `Ok(Some(byte))` with the decoded literal once the buffer
    ///   matches a table entry, and closes the buffer.
    /// - Returns `Err` once the buffer is full without matching.
    pub fn feed(&mut self, byte: u8) -> Result<Option<u8>, SyntaxError> {
        let len = usize::from(self.len);
        if len == 0 || len >= MAX_SEQUENCE_LEN {
            self.reset();
            return Err(SyntaxError::InvalidEscape);
        }
        self.buffer[len] = byte;
        self.len += 1;

        let resolved = match &self.buffer[..usize::from(self.len)] {
            [b'\\', escaped] => unescape(*escaped),
            _ => None,
        };
        match resolved {
            Some(literal) => {
                self.reset();
                Ok(Some(literal))
            }
            None if usize::from(self.len) < MAX_SEQUENCE_LEN => Ok(None),
            None => {
                self.reset();
                Err(SyntaxError::InvalidEscape)
            }
        }
    }
}
