#![expect(missing_docs)]

mod common;

use std::io::Write;

use jsonseek::{CodecError, CodecOptions, ContainerKind, Document, Mode, Payload, Value, path};

fn fixture_file(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("jsonseek-{}-{name}.json", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(common::RESPONSE.as_bytes()).unwrap();
    path
}

#[test]
fn index_of_a_response() {
    let mut doc = Document::from_bytes(common::RESPONSE).unwrap();
    insta::assert_snapshot!(doc.index().unwrap().to_string(), @r"
    $ object 1..=296
    Status scalar 17..=19
    Message scalar 37..=42
    Rows array[2] 57..=255
    Rows:0 object 67..=158
    Rows:0:id scalar 87..=87
    Rows:0:name scalar 110..=116
    Rows:0:tags array[2] 139..=148
    Rows:1 object 169..=249
    Rows:1:id scalar 189..=189
    Rows:1:name scalar 212..=215
    Rows:1:tags array[0] 238..=239
    Paging object 272..=294
    Paging:page scalar 281..=281
    Paging:total scalar 293..=293
    ");
}

#[test]
fn queries_against_a_file() {
    let path = fixture_file("queries");
    let mut doc = Document::open_path(&path, CodecOptions::default()).unwrap();

    assert_eq!(doc.get("Status").unwrap(), Value::from(200));
    assert_eq!(doc.get("Message").unwrap(), Value::from("ok\n"));
    assert_eq!(doc.get_raw("Message").unwrap(), br#""ok\n""#);
    assert_eq!(doc.type_of("Paging").unwrap(), ContainerKind::Object);
    assert_eq!(doc.count("Rows").unwrap(), 2);
    assert_eq!(doc.get("Rows:0:tags:1").unwrap(), Value::from("b"));
    assert_eq!(doc.get("Rows:1:name").unwrap(), Value::Null);
    assert_eq!(doc.get_raw("Rows:0:tags").unwrap(), br#"["a", "b"]"#);
    assert!(doc.exists(path!["Rows", 1, "tags"]).unwrap());
    assert!(!doc.exists(path!["Rows", 1, "tags", 0]).unwrap());

    drop(doc);
    std::fs::remove_file(path).unwrap();
}

#[test]
fn recoverable_errors_do_not_spoil_the_document() {
    let mut doc = Document::from_bytes(common::RESPONSE).unwrap();

    let err = doc.count("Paging").unwrap_err();
    assert!(matches!(
        err,
        CodecError::TypeMismatch {
            expected: "an array",
            found: "an object",
            ..
        }
    ));
    let err = doc.type_of("Status").unwrap_err();
    assert!(err.is_recoverable());
    assert!(doc.get("Rows:2").unwrap_err().is_recoverable());

    assert_eq!(doc.get("Paging:total").unwrap(), Value::from(2));
}

#[test]
fn value_events_yield_the_whole_document() {
    let mut doc = Document::from_bytes(common::RESPONSE).unwrap();
    let events: Vec<_> = doc
        .events(Mode::Value)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(events.len(), 1);
    let Payload::Value(Value::Object(root)) = &events[0].payload else {
        panic!("expected an object");
    };
    assert_eq!(root.keys().collect::<Vec<_>>(), ["Status", "Message", "Rows", "Paging"]);
}
