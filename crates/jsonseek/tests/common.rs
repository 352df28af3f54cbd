#![allow(missing_docs, dead_code)]

use std::{
    cell::Cell,
    io::{self, Read, Seek, SeekFrom},
    rc::Rc,
};

/// A gateway response as it arrives from a backend.
pub const RESPONSE: &str = r#"
{
    "Status": 200,
    "Message": "ok\n",
    "Rows": [
        {
            "id": 1,
            "name": "first",
            "tags": ["a", "b"]
        },
        {
            "id": 2,
            "name": null,
            "tags": []
        }
    ],
    "Paging": {"page": 1, "total": 2}
}
"#;

/// A seekable reader of `len` spaces that counts every byte it hands out.
#[derive(Debug)]
pub struct Blank {
    pub len: u64,
    pub pos: u64,
    pub bytes_read: u64,
}

impl Blank {
    pub fn new(len: u64) -> Self {
        Self {
            len,
            pos: 0,
            bytes_read: 0,
        }
    }
}

impl Read for Blank {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let left = usize::try_from(self.len.saturating_sub(self.pos)).unwrap_or(usize::MAX);
        let n = buf.len().min(left);
        buf[..n].fill(b' ');
        self.pos += n as u64;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

impl Seek for Blank {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.pos = match pos {
            SeekFrom::Start(p) => p,
            SeekFrom::End(d) => self.len.saturating_add_signed(d),
            SeekFrom::Current(d) => self.pos.saturating_add_signed(d),
        };
        Ok(self.pos)
    }
}

/// Wraps a seekable reader and tallies every byte it hands out.
///
/// The tally is shared so it stays readable after a document takes the
/// reader.
#[derive(Debug)]
pub struct Counting<R> {
    inner: R,
    bytes_read: Rc<Cell<u64>>,
}

impl<R> Counting<R> {
    pub fn new(inner: R) -> (Self, Rc<Cell<u64>>) {
        let bytes_read = Rc::new(Cell::new(0));
        let reader = Self {
            inner,
            bytes_read: Rc::clone(&bytes_read),
        };
        (reader, bytes_read)
    }
}

impl<R: Read> Read for Counting<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read.set(self.bytes_read.get() + n as u64);
        Ok(n)
    }
}

impl<R: Seek> Seek for Counting<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
