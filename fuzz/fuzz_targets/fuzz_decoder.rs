#![no_main]
use std::{cell::RefCell, io::Cursor};

use arbitrary::Arbitrary;
use jsonseek::{
    CodecError, CodecOptions, Document, Encoder, Mode, Path, PathItem, Payload, Shape, Source,
    accessor,
};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde_json::{Map, Value};

const HEADER: usize = 1; // depth guard

thread_local! {
    static RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_os_rng());
}

static WS_TABLE: &[&[u8]] = &[b" ", b"\t", b"\n", b"\r"];

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// Mostly mutates existing inputs; one time in ten writes a fresh document
/// from the accepted subset, padded with whitespace.
fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if size <= HEADER || seed.is_multiple_of(10) {
        data[0] = with_rng(|rng| rng.next_u32() as u8);
        let mut len = HEADER;
        len += append_whitespace(&mut data[len..], max_size - len);
        len += append_value(&mut data[len..], size.max(16), max_size - len);
        len += append_whitespace(&mut data[len..], max_size - len);
        len
    } else {
        fuzzer_mutate(data, size, max_size)
    }
}

fn append_whitespace(buf: &mut [u8], limit: usize) -> usize {
    with_rng(|rng| {
        if limit == 0 {
            return 0;
        }
        let mut written = 0;
        for _ in 0..rng.random_range(1..=limit.min(4)) {
            let w = WS_TABLE[rng.random_range(0..WS_TABLE.len())];
            if written + w.len() > limit {
                break;
            }
            buf[written..written + w.len()].copy_from_slice(w);
            written += w.len();
        }
        written
    })
}

fn append_value(data: &mut [u8], size: usize, limit: usize) -> usize {
    let value = loop {
        let s = with_rng(|rng| rng.random_range(size / 2..size * 2));
        let bytes: Vec<u8> = with_rng(|rng| (0..s).map(|_| rng.random::<u8>()).collect());
        if let Ok(value) = SubsetValue::arbitrary(&mut arbitrary::Unstructured::new(&bytes)) {
            break value;
        }
    };
    let Ok(serialized) = serde_json::to_vec(&value.0) else {
        return 0;
    };
    let len = serialized.len().min(limit);
    data[..len].copy_from_slice(&serialized[..len]);
    len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

/// JSON restricted to `null`, integers, strings, arrays and objects.
#[derive(Debug)]
struct SubsetValue(Value);

impl<'a> Arbitrary<'a> for SubsetValue {
    fn arbitrary(u: &mut arbitrary::Unstructured<'_>) -> arbitrary::Result<Self> {
        let value = match u.choose_index(16)? {
            0 => Value::Null,
            1..=3 => Value::from(i64::arbitrary(u)?),
            4..=8 => {
                let s: String = u.arbitrary()?;
                // `\u00XX` escapes are outside the accepted table.
                Value::String(s.chars().filter(|c| !c.is_ascii_control() || "\n\r\t\u{8}\u{c}".contains(*c)).collect())
            }
            9..=12 => {
                let elems: Vec<SubsetValue> = u.arbitrary()?;
                Value::Array(elems.into_iter().map(|v| v.0).collect())
            }
            _ => {
                let m: Vec<(String, SubsetValue)> = u.arbitrary()?;
                Value::Object(Map::from_iter(m.into_iter().map(|(k, v)| (k, v.0))))
            }
        };
        Ok(SubsetValue(value))
    }
}

fn decode(data: &[u8]) {
    let Some((&flags, body)) = data.split_first() else {
        return;
    };
    let options = CodecOptions {
        max_depth: usize::from(flags).max(1),
        ..Default::default()
    };

    let mut source = Source::from_bytes(body);
    let index = match accessor::build_index(&mut source, &options) {
        Ok(index) => index,
        Err(CodecError::MalformedJson { .. }) => return,
        Err(err) => panic!("unexpected error {err}"),
    };

    // Every indexed range decodes, and its raw bytes decode to the same value.
    // Direct array elements go through the same check.
    let mut paths = Vec::new();
    for (path, span) in index.entries() {
        if let Shape::Array { len } = span.shape {
            paths.extend((0..len.min(8)).map(|i| path.join(PathItem::Index(i))));
        }
        paths.push(path);
    }
    for path in paths {
        let value = accessor::get(&mut source, &index, &path, &options).unwrap();
        let raw = accessor::get_raw(&mut source, &index, &path, &options).unwrap();
        let mut alone = Document::with_options(Cursor::new(raw), options).unwrap();
        assert_eq!(alone.get(Path::root()).unwrap(), value, "path {path}");
    }

    // A value-mode scan of the whole source agrees with the indexed root.
    let root = accessor::get(&mut source, &index, &Path::root(), &options).unwrap();
    let mut doc = Document::from_bytes(body).unwrap();
    let events: Vec<_> = doc.events(Mode::Value).unwrap().collect::<Result<_, _>>().unwrap();
    assert!(matches!(&events[..], [event] if event.payload == Payload::Value(root.clone())));

    // Re-encoding the root and reading it back is lossless.
    let mut enc = Encoder::new(Vec::new());
    enc.add_scalar(root.clone()).unwrap();
    let mut again = Document::from_bytes(enc.finish().unwrap()).unwrap();
    assert_eq!(again.get(Path::root()).unwrap(), root);
}

fuzz_target!(|data: &[u8]| decode(data));
