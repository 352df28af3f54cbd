//! The byte-offset index.
//!
//! An [`Index`] is a tree shaped like the document, stored as an arena of
//! [`IndexNode`]s. Every container of the document has a node carrying its
//! [`Span`]; so does every scalar object member. Scalar array elements have
//! no node: they are covered by their array's length and byte range.
//!
//! ```rust
//! use jsonseek::{CodecOptions, Index, Mode, Scanner, Shape, Source, path};
//!
//! let mut source = Source::from_bytes(r#"{"a":1,"b":[2,3]}"#);
//! let scanner = Scanner::new(&mut source, Mode::Index, None, &CodecOptions::default()).unwrap();
//! let index = Index::build(scanner).unwrap();
//!
//! let b = index.span(&path!["b"]).unwrap();
//! assert_eq!(b.shape, Shape::Array { len: 2 });
//! assert_eq!((b.start, b.end), (11, 15));
//! ```
use core::fmt;
use std::io::{Read, Seek};

use indexmap::IndexMap;

use crate::{CodecError, Path, PathItem, Payload, Scanner, Shape, Span};

/// Handle to a node in an [`Index`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One node of the index tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexNode {
    span: Option<Span>,
    children: IndexMap<PathItem, NodeId>,
}

impl IndexNode {
    /// The node's location, once its closing event has been folded in.
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        self.span
    }

    /// Child nodes in the order they were first seen.
    pub fn children(&self) -> impl Iterator<Item = (&PathItem, NodeId)> {
        self.children.iter().map(|(item, id)| (item, *id))
    }
}

/// Where a path lands in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// A node with a span of its own.
    Node(NodeId, Span),
    /// A scalar array element, known only through its parent array.
    Element {
        parent: NodeId,
        parent_span: Span,
        index: usize,
    },
    Missing,
}

/// The nested offset index of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    nodes: Vec<IndexNode>,
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}

impl Index {
    /// The root node, present in every index.
    pub const ROOT: NodeId = NodeId(0);

    /// An index with nothing but an empty root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![IndexNode::default()],
        }
    }

    /// Drains an index-mode scanner into a new index.
    ///
    /// Value payloads are ignored, so a value-mode scanner yields an empty
    /// index.
    ///
    /// # Errors
    ///
    /// Returns the first error the scanner reports.
    pub fn build<R: Read + Seek>(scanner: Scanner<'_, R>) -> Result<Self, CodecError> {
        let mut index = Self::new();
        for event in scanner {
            let event = event?;
            if let Payload::Span(span) = event.payload {
                index.insert(&event.path, span);
            }
        }
        tracing::debug!(
            nodes = index.nodes.len(),
            root = ?index.root().span,
            "built document index"
        );
        Ok(index)
    }

    /// Records `span` at `path`, creating intermediate nodes as needed.
    ///
    /// Recording a path twice (a repeated object key) keeps the later span and
    /// drops the children that belonged to the earlier one.
    pub fn insert(&mut self, path: &Path, span: Span) {
        let id = self.node_for(path);
        if self.nodes[id.0].span.is_some() {
            let stale: Vec<PathItem> = self.nodes[id.0]
                .children
                .iter()
                .filter(|(_, child)| {
                    self.nodes[child.0]
                        .span
                        .is_none_or(|s| s.start < span.start)
                })
                .map(|(item, _)| item.clone())
                .collect();
            tracing::trace!(%path, stale = stale.len(), "repeated key");
            for item in &stale {
                self.nodes[id.0].children.shift_remove(item);
            }
        }
        self.nodes[id.0].span = Some(span);
    }

    fn node_for(&mut self, path: &Path) -> NodeId {
        let mut current = Self::ROOT;
        for item in path.iter() {
            current = if let Some(&child) = self.nodes[current.0].children.get(item) {
                child
            } else {
                let child = NodeId(self.nodes.len());
                self.nodes.push(IndexNode::default());
                self.nodes[current.0].children.insert(item.clone(), child);
                child
            };
        }
        current
    }

    /// Returns a node by handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` comes from another index.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &IndexNode {
        &self.nodes[id.0]
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> &IndexNode {
        self.node(Self::ROOT)
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.nodes[0].span.is_none()
    }

    /// Resolves `path` against the index.
    ///
    /// A numeric segment applied to an object looks up the key spelled by its
    /// digits.
    #[must_use]
    pub fn lookup(&self, path: &Path) -> Lookup {
        let Some(mut span) = self.root().span else {
            return Lookup::Missing;
        };
        let mut current = Self::ROOT;

        for (depth, item) in path.iter().enumerate() {
            let node = self.node(current);
            let child = match (span.shape, item) {
                (Shape::Object, PathItem::Key(_)) => node.children.get(item),
                (Shape::Object, PathItem::Index(i)) => {
                    node.children.get(&PathItem::Key(i.to_string()))
                }
                (Shape::Array { len }, PathItem::Index(i)) if *i < len => {
                    match node.children.get(item) {
                        Some(child) => Some(child),
                        None if depth + 1 == path.len() => {
                            return Lookup::Element {
                                parent: current,
                                parent_span: span,
                                index: *i,
                            };
                        }
                        None => return Lookup::Missing,
                    }
                }
                _ => None,
            };
            let Some(&child) = child else {
                return Lookup::Missing;
            };
            let Some(child_span) = self.node(child).span else {
                return Lookup::Missing;
            };
            current = child;
            span = child_span;
        }
        Lookup::Node(current, span)
    }

    /// The span recorded at `path`, if `path` names a node.
    #[must_use]
    pub fn span(&self, path: &Path) -> Option<Span> {
        match self.lookup(path) {
            Lookup::Node(_, span) => Some(span),
            Lookup::Element { .. } | Lookup::Missing => None,
        }
    }

    /// Every recorded `(path, span)`, depth first, parents before children.
    #[must_use]
    pub fn entries(&self) -> Vec<(Path, Span)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(Self::ROOT, Path::root())];
        while let Some((id, path)) = stack.pop() {
            let node = self.node(id);
            for (item, child) in node.children.iter().rev() {
                stack.push((*child, path.join(item.clone())));
            }
            if let Some(span) = node.span {
                out.push((path, span));
            }
        }
        out
    }
}

impl fmt::Display for Index {
    /// One line per entry: path (`$` for the root), shape, byte range.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (path, span) in self.entries() {
            if path.is_root() {
                f.write_str("$")?;
            } else {
                write!(f, "{path}")?;
            }
            match span.shape {
                Shape::Array { len } => write!(f, " array[{len}]")?,
                Shape::Object => f.write_str(" object")?,
                Shape::Scalar => f.write_str(" scalar")?,
            }
            writeln!(f, " {}..={}", span.start, span.end)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CodecOptions, Mode, Source, path};

    fn index_of(input: &str) -> Index {
        let mut source = Source::from_bytes(input);
        let scanner =
            Scanner::new(&mut source, Mode::Index, None, &CodecOptions::default()).unwrap();
        Index::build(scanner).unwrap()
    }

    #[test]
    fn renders_entries_depth_first() {
        let index = index_of(r#"{"a":1,"b":[2,{"c":"x"}],"d":{}}"#);
        insta::assert_snapshot!(index.to_string(), @r"
        $ object 0..=31
        a scalar 5..=5
        b array[2] 11..=23
        b:1 object 14..=22
        b:1:c scalar 19..=21
        d object 29..=30
        ");
    }

    #[test]
    fn scalar_arrays_stay_small() {
        let doc = format!("[{}]", vec!["7"; 10_000].join(","));
        let index = index_of(&doc);
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.span(&path![]).unwrap().shape,
            Shape::Array { len: 10_000 }
        );
    }

    #[test]
    fn lookup_resolves_nodes_elements_and_misses() {
        let index = index_of(r#"{"a":{"0":[5,[6]]}}"#);

        assert!(matches!(index.lookup(&path!["a"]), Lookup::Node(..)));
        // numeric segment falls back to the object key
        assert!(matches!(index.lookup(&path!["a", 0]), Lookup::Node(..)));
        assert!(matches!(
            index.lookup(&path!["a", 0, 0]),
            Lookup::Element { index: 0, .. }
        ));
        assert!(matches!(index.lookup(&path!["a", 0, 1]), Lookup::Node(..)));
        assert_eq!(index.lookup(&path!["a", 0, 2]), Lookup::Missing);
        assert_eq!(index.lookup(&path!["a", 0, 0, 0]), Lookup::Missing);
        assert_eq!(index.lookup(&path!["a", 0, "x"]), Lookup::Missing);
        assert_eq!(index.lookup(&path!["z"]), Lookup::Missing);
    }

    #[test]
    fn repeated_key_keeps_the_last_value() {
        let index = index_of(r#"{"a":{"x":{"deep":1}},"a":{"y":[2]}}"#);
        insta::assert_snapshot!(index.to_string(), @r"
        $ object 0..=35
        a object 26..=34
        a:y array[1] 31..=33
        ");
        let index = index_of(r#"{"a":{"x":1},"a":[5]}"#);
        assert_eq!(index.lookup(&path!["a", "x"]), Lookup::Missing);
        assert_eq!(index.entries().len(), 2);
    }

    #[test]
    fn empty_index_has_no_root() {
        let index = Index::new();
        assert!(index.is_empty());
        assert_eq!(index.lookup(&Path::root()), Lookup::Missing);
    }

    #[test]
    fn insert_creates_intermediate_nodes() {
        let mut index = Index::new();
        let span = Span {
            start: 3,
            end: 4,
            shape: Shape::Object,
        };
        index.insert(&path!["x", 2], span);
        assert_eq!(index.len(), 3);
        assert_eq!(index.root().children().count(), 1);
        // nothing on the way has a span yet
        assert_eq!(index.lookup(&path!["x", 2]), Lookup::Missing);
    }
}
