#![expect(missing_docs)]

mod common;

use jsonseek::{
    CodecError, CodecOptions, DEFAULT_MAX_DOCUMENT_SIZE, Document, Mode, Scanner, Source,
};
use rstest::rstest;

#[rstest]
#[case::minimal_object("{}", 1)]
#[case::scalar("1", 0)]
#[case::garbage("not json at all", 4)]
fn oversized_regardless_of_content(#[case] input: &str, #[case] max: u64) {
    let options = CodecOptions {
        max_document_size: max,
        ..Default::default()
    };
    let reader = std::io::Cursor::new(input.as_bytes().to_vec());
    let err = Document::with_options(reader, options).unwrap_err();
    assert!(matches!(
        err,
        CodecError::OversizedInput { size, max: m } if size == input.len() as u64 && m == max
    ));
}

#[test]
fn no_byte_is_read_from_an_oversized_source() {
    let mut blank = common::Blank::new(DEFAULT_MAX_DOCUMENT_SIZE + 1);
    let source = Source::new(&mut blank).unwrap();
    let err = Document::from_source(source, CodecOptions::default()).unwrap_err();
    assert!(matches!(err, CodecError::OversizedInput { .. }));
    assert_eq!(blank.bytes_read, 0);
}

#[test]
fn scanner_applies_the_guard_too() {
    let mut blank = common::Blank::new(DEFAULT_MAX_DOCUMENT_SIZE + 1);
    let mut source = Source::new(&mut blank).unwrap();
    let err = Scanner::new(&mut source, Mode::Index, None, &CodecOptions::default()).unwrap_err();
    assert!(matches!(err, CodecError::OversizedInput { .. }));
    drop(source);
    assert_eq!(blank.bytes_read, 0);
}

#[test]
fn exactly_at_the_limit_is_accepted() {
    let options = CodecOptions {
        max_document_size: 2,
        ..Default::default()
    };
    let mut doc = Document::with_options(std::io::Cursor::new(b"[]".to_vec()), options).unwrap();
    assert_eq!(doc.count("").unwrap(), 0);
}
