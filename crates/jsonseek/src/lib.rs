//! A memory-bounded JSON codec for request and response bodies.
//!
//! Decoding is split in two. One forward pass over a seekable [`Source`]
//! builds an [`Index`] of byte offsets; after that, any subtree can be
//! fetched by [`Path`] by seeking to its range and decoding only those bytes.
//! Encoding goes the other way: an [`Encoder`] streams a document straight
//! into an [`std::io::Write`] sink, one element at a time.
//!
//! The accepted grammar is a subset of JSON. Bare literals are limited to
//! `null` and base-10 integers, and strings use the short escape table in
//! [`escape`].
//!
//! ```rust
//! use jsonseek::{Document, Encoder, Value};
//!
//! let mut doc = Document::from_bytes(r#"{"Rows":[{"id":1,"name":"a"},{"id":2,"name":"b"}]}"#)?;
//! let mut out = Encoder::new(Vec::new());
//! out.start_array()?;
//! for i in 0..doc.count("Rows")? {
//!     out.add_scalar(doc.get(format!("Rows:{i}:name").as_str())?)?;
//! }
//! assert_eq!(out.finish()?, br#"["a", "b"]"#);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod accessor;
mod document;
mod encoder;
mod error;
pub mod escape;
pub mod index;
mod options;
mod path;
mod scanner;
mod source;
mod value;


pub use accessor::{build_index, count, exists, get, get_raw, type_of, validate};
pub use document::Document;
pub use encoder::{ARRAY_SEPARATOR, Encoder, OBJECT_SEPARATOR};
pub use error::{CodecError, EncodeError, SyntaxError, UsageError};
pub use index::{Index, IndexNode, NodeId};
pub use options::{CodecOptions, DEFAULT_MAX_DEPTH, DEFAULT_MAX_DOCUMENT_SIZE};
pub use path::{Path, PathItem, PathItemFrom, SEPARATOR};
pub use scanner::{ByteRange, Event, Mode, Payload, Scanner, Shape, Span};
pub use source::Source;
pub use value::{Array, ContainerKind, Map, Value};

#[doc(hidden)]
pub use std::vec;

/// Builds a [`Path`] from a list of keys and indices.
///
/// ```rust
/// # use jsonseek::{path, Path, PathItem};
/// let p = path![0, "foo", 2];
/// assert_eq!(
///     p,
///     Path::from(vec![
///         PathItem::Index(0),
///         PathItem::Key("foo".into()),
///         PathItem::Index(2)
///     ])
/// );
/// assert!(path![].is_root());
/// ```
#[macro_export]
macro_rules! path {
    ( $( $elem:expr ),* $(,)? ) => {{
        #[allow(unused_imports)]
        use $crate::PathItemFrom;
        let items: $crate::vec::Vec<$crate::PathItem> =
            $crate::vec![$($crate::PathItem::from_path_component($elem)),*];
        $crate::Path::from(items)
    }};
}
