//! Path queries against an indexed document.
//!
//! Build the [`Index`] once with [`build_index`], then answer any number of
//! queries. Structural queries ([`exists`], [`type_of`], [`count`]) only look
//! at the index. [`get`] seeks to the node's byte range and decodes just that
//! range; [`get_raw`] copies the range without decoding it.
//!
//! ```rust
//! use jsonseek::{Source, Value, accessor, path, CodecOptions};
//!
//! let options = CodecOptions::default();
//! let mut source = Source::from_bytes(r#"{"Rows":[{"id":1},{"id":2}]}"#);
//! let index = accessor::build_index(&mut source, &options).unwrap();
//!
//! assert_eq!(accessor::count(&index, &path!["Rows"]).unwrap(), 2);
//! let id = accessor::get(&mut source, &index, &path!["Rows", 1, "id"], &options).unwrap();
//! assert_eq!(id, Value::from(2));
//! ```
use std::io::{Read, Seek};

use crate::{
    ByteRange, CodecError, CodecOptions, ContainerKind, Index, Mode, Path, PathItem, Payload,
    Scanner, Shape, Source, Span, SyntaxError, Value, index::Lookup,
};

/// Scans the whole source once, discarding everything but the verdict.
///
/// # Errors
///
/// [`CodecError::OversizedInput`] or the first [`CodecError::MalformedJson`].
pub fn validate<R: Read + Seek>(
    source: &mut Source<R>,
    options: &CodecOptions,
) -> Result<(), CodecError> {
    Scanner::new(source, Mode::Index, None, options)?.try_for_each(|event| event.map(drop))
}

/// Scans the whole source once and builds its [`Index`].
///
/// # Errors
///
/// [`CodecError::OversizedInput`] or the first [`CodecError::MalformedJson`].
pub fn build_index<R: Read + Seek>(
    source: &mut Source<R>,
    options: &CodecOptions,
) -> Result<Index, CodecError> {
    Index::build(Scanner::new(source, Mode::Index, None, options)?)
}

/// Returns `true` if `path` names a node or a scalar array element.
#[must_use]
pub fn exists(index: &Index, path: &Path) -> bool {
    !matches!(index.lookup(path), Lookup::Missing)
}

/// Returns the container kind at `path`.
///
/// # Errors
///
/// [`CodecError::PathNotFound`] if the path is absent,
/// [`CodecError::TypeMismatch`] if it names a scalar.
pub fn type_of(index: &Index, path: &Path) -> Result<ContainerKind, CodecError> {
    let shape = shape_at(index, path)?;
    shape.container_kind().ok_or_else(|| CodecError::TypeMismatch {
        path: path.clone(),
        expected: "a container",
        found: shape.name(),
    })
}

/// Returns the number of elements of the array at `path`.
///
/// # Errors
///
/// [`CodecError::PathNotFound`] if the path is absent,
/// [`CodecError::TypeMismatch`] if it names an object or a scalar.
pub fn count(index: &Index, path: &Path) -> Result<usize, CodecError> {
    match shape_at(index, path)? {
        Shape::Array { len } => Ok(len),
        shape => Err(CodecError::TypeMismatch {
            path: path.clone(),
            expected: ContainerKind::Array.name(),
            found: shape.name(),
        }),
    }
}

fn shape_at(index: &Index, path: &Path) -> Result<Shape, CodecError> {
    match index.lookup(path) {
        Lookup::Node(_, span) => Ok(span.shape),
        Lookup::Element { .. } => Ok(Shape::Scalar),
        Lookup::Missing => Err(CodecError::not_found(path)),
    }
}

/// Decodes the subtree at `path`.
///
/// Only the node's own byte range is decoded. A scalar array element has no
/// range of its own: its parent array is scanned up to the element, without
/// materializing anything, and then only the element is decoded.
///
/// # Errors
///
/// - [`CodecError::PathNotFound`] if the path is absent.
/// - [`CodecError::InvalidRange`] if the recorded range does not fit the
///   source, which happens when the index belongs to another document.
/// - [`CodecError::MalformedJson`] if the range does not hold exactly one
///   value.
pub fn get<R: Read + Seek>(
    source: &mut Source<R>,
    index: &Index,
    path: &Path,
    options: &CodecOptions,
) -> Result<Value, CodecError> {
    match index.lookup(path) {
        Lookup::Node(_, span) => decode_range(source, span.range(), options),
        Lookup::Element {
            parent_span,
            index: element,
            ..
        } => {
            let span = locate_element(source, parent_span.range(), element, path, options)?;
            decode_range(source, span.range(), options)
        }
        Lookup::Missing => Err(CodecError::not_found(path)),
    }
}

/// Returns the source bytes of the node at `path`, verbatim.
///
/// Scalar array elements are located the same way [`get`] locates them;
/// `options` applies to that scan.
///
/// # Errors
///
/// As for [`get`].
pub fn get_raw<R: Read + Seek>(
    source: &mut Source<R>,
    index: &Index,
    path: &Path,
    options: &CodecOptions,
) -> Result<Vec<u8>, CodecError> {
    let span = match index.lookup(path) {
        Lookup::Node(_, span) => span,
        Lookup::Element {
            parent_span,
            index: element,
            ..
        } => locate_element(source, parent_span.range(), element, path, options)?,
        Lookup::Missing => return Err(CodecError::not_found(path)),
    };
    source.read_range(span.start, span.end)
}

/// Scans `array` in index mode until its scalar element `element` closes.
fn locate_element<R: Read + Seek>(
    source: &mut Source<R>,
    array: ByteRange,
    element: usize,
    path: &Path,
    options: &CodecOptions,
) -> Result<Span, CodecError> {
    tracing::trace!(%path, element, "locating array element");
    let target = PathItem::Index(element);
    for event in Scanner::new(source, Mode::Index, Some(array), options)?.with_element_spans() {
        let event = event?;
        match (&*event.path, event.payload) {
            ([item], Payload::Span(span)) if *item == target && span.shape == Shape::Scalar => {
                return Ok(span);
            }
            _ => {}
        }
    }
    Err(CodecError::not_found(path))
}

fn decode_range<R: Read + Seek>(
    source: &mut Source<R>,
    range: ByteRange,
    options: &CodecOptions,
) -> Result<Value, CodecError> {
    tracing::trace!(start = range.start, end = range.end, "decoding range");
    let mut value = None;
    for event in Scanner::new(source, Mode::Value, Some(range), options)? {
        if let Payload::Value(v) = event?.payload {
            value = Some(v);
        }
    }
    value.ok_or_else(|| CodecError::malformed(range.start, Vec::new(), SyntaxError::EmptyInput))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::path;

    const DOC: &str = r#"{"Status":200,"Rows":[{"id":1,"tags":["a","b"]},{"id":2,"tags":[]}],"Meta":{"7":null}}"#;

    fn indexed() -> (Source<std::io::Cursor<Vec<u8>>>, Index) {
        let mut source = Source::from_bytes(DOC);
        let index = build_index(&mut source, &CodecOptions::default()).unwrap();
        (source, index)
    }

    #[rstest]
    #[case(path![], true)]
    #[case(path!["Status"], true)]
    #[case(path!["Rows", 1, "tags"], true)]
    #[case(path!["Rows", 0, "tags", 1], true)]
    #[case(path!["Meta", 7], true)]
    #[case(path!["Rows", 2], false)]
    #[case(path!["Rows", "id"], false)]
    #[case(path!["Status", 0], false)]
    #[case(path!["Nope"], false)]
    fn exists_cases(#[case] path: Path, #[case] expected: bool) {
        let (_, index) = indexed();
        assert_eq!(exists(&index, &path), expected);
    }

    #[test]
    fn type_of_reports_containers() {
        let (_, index) = indexed();
        assert_eq!(type_of(&index, &path![]).unwrap(), ContainerKind::Object);
        assert_eq!(
            type_of(&index, &path!["Rows"]).unwrap(),
            ContainerKind::Array
        );
        assert!(matches!(
            type_of(&index, &path!["Status"]),
            Err(CodecError::TypeMismatch {
                found: "a scalar",
                ..
            })
        ));
        assert!(matches!(
            type_of(&index, &path!["x"]),
            Err(CodecError::PathNotFound { .. })
        ));
    }

    #[test]
    fn count_only_counts_arrays() {
        let (_, index) = indexed();
        assert_eq!(count(&index, &path!["Rows"]).unwrap(), 2);
        assert_eq!(count(&index, &path!["Rows", 1, "tags"]).unwrap(), 0);
        let err = count(&index, &path!["Meta"]).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "path 'Meta' is an object, expected an array"
        );
    }

    #[rstest]
    #[case(path!["Status"], "200")]
    #[case(path!["Rows", 0, "tags"], r#"["a", "b"]"#)]
    #[case(path!["Rows", 0, "tags", 1], r#""b""#)]
    #[case(path!["Rows", 1], r#"{"id":2,"tags":[]}"#)]
    #[case(path!["Meta", "7"], "null")]
    fn get_decodes_only_the_subtree(#[case] path: Path, #[case] expected: &str) {
        let (mut source, index) = indexed();
        let value = get(&mut source, &index, &path, &CodecOptions::default()).unwrap();
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn get_raw_copies_bytes() {
        let (mut source, index) = indexed();
        let options = CodecOptions::default();
        assert_eq!(
            get_raw(&mut source, &index, &path!["Rows", 0, "tags"], &options).unwrap(),
            br#"["a","b"]"#
        );
        assert_eq!(
            get_raw(&mut source, &index, &path!["Rows", 0, "tags", 0], &options).unwrap(),
            br#""a""#
        );
        assert!(matches!(
            get_raw(&mut source, &index, &path!["Rows", 5], &options),
            Err(CodecError::PathNotFound { .. })
        ));
    }

    #[rstest]
    #[case(0, "007", 7)]
    #[case(2, "-3", -3)]
    #[case(4, "12", 12)]
    fn array_elements_come_verbatim_from_their_own_bytes(
        #[case] element: usize,
        #[case] raw: &str,
        #[case] expected: i64,
    ) {
        let mut source = Source::from_bytes(r#"{"a":[007, [1, 2], -3, {"b":[4]}, 12]}"#);
        let options = CodecOptions::default();
        let index = build_index(&mut source, &options).unwrap();
        let path = path!["a", element];
        assert_eq!(
            get_raw(&mut source, &index, &path, &options).unwrap(),
            raw.as_bytes()
        );
        assert_eq!(
            get(&mut source, &index, &path, &options).unwrap(),
            Value::from(expected)
        );
    }

    #[test]
    fn element_lookups_honor_the_depth_guard() {
        let nested = format!("{}{}", "[".repeat(600), "]".repeat(600));
        let mut source = Source::from_bytes(format!("[1, {nested}, 2]"));
        let options = CodecOptions {
            max_depth: 1000,
            ..Default::default()
        };
        let index = build_index(&mut source, &options).unwrap();
        for (element, value, raw) in [(0usize, 1i64, "1"), (2, 2, "2")] {
            let path = path![element];
            assert_eq!(
                get(&mut source, &index, &path, &options).unwrap(),
                Value::from(value)
            );
            assert_eq!(
                get_raw(&mut source, &index, &path, &options).unwrap(),
                raw.as_bytes()
            );
        }
    }

    #[rstest]
    #[case("01", "x")]
    #[case("1", "y")]
    #[case("001", "z")]
    fn leading_zero_segments_name_their_own_key(#[case] segment: &str, #[case] expected: &str) {
        let mut source = Source::from_bytes(r#"{"01":"x","1":"y","001":"z"}"#);
        let options = CodecOptions::default();
        let index = build_index(&mut source, &options).unwrap();
        let path = Path::parse(segment);
        assert_eq!(
            get(&mut source, &index, &path, &options).unwrap(),
            Value::from(expected)
        );
    }

    #[test]
    fn index_of_a_longer_document_is_an_invalid_range() {
        let (_, index) = indexed();
        let mut short = Source::from_bytes("{}");
        let err = get(&mut short, &index, &path!["Rows"], &CodecOptions::default()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidRange { .. }));
    }

    #[test]
    fn validate_reports_first_error() {
        let mut source = Source::from_bytes(r#"{"a":tru}"#);
        let err = validate(&mut source, &CodecOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            CodecError::MalformedJson {
                offset: 5,
                source: SyntaxError::InvalidBareToken,
                ..
            }
        ));
    }
}
