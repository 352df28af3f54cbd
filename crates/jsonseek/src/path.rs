//! Paths locating a node relative to the document root.
//!
//! The external form joins segments with `:`. A segment made only of ASCII
//! digits, without a leading zero, is an array index; anything else is an
//! object key, and the empty string is the root:
//!
//! ```rust
//! use jsonseek::{Path, PathItem, path};
//!
//! let p = Path::parse("rows:0:name");
//! assert_eq!(p, path!["rows", 0, "name"]);
//! assert_eq!(p.to_string(), "rows:0:name");
//! assert!(Path::parse("").is_root());
//! ```
use core::{convert::Infallible, fmt, ops::Deref, str::FromStr};

/// Separator between segments in the external path syntax.
pub const SEPARATOR: char = ':';

/// One segment of a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathItem {
    /// A key into a JSON object.
    Key(String),
    /// An index into a JSON array.
    Index(usize),
}

impl PathItem {
    /// Parses one segment of the external syntax.
    ///
    /// `"01"` stays a key: an index always prints back as the segment it
    /// was parsed from.
    #[must_use]
    pub fn parse(segment: &str) -> Self {
        let canonical = segment == "0" || !segment.starts_with('0');
        if canonical && !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = segment.parse() {
                return Self::Index(index);
            }
        }
        Self::Key(segment.to_string())
    }

    #[must_use]
    /// Returns the index if this component is an index, otherwise `None`.
    pub fn as_index(&self) -> Option<usize> {
        if let Self::Index(v) = self {
            Some(*v)
        } else {
            None
        }
    }

    #[must_use]
    /// Returns the key if this component is a key, otherwise `None`.
    pub fn as_key(&self) -> Option<&str> {
        if let Self::Key(v) = self {
            Some(v)
        } else {
            None
        }
    }
}

impl fmt::Display for PathItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathItem {
    fn from(s: &str) -> Self {
        Self::Key(s.to_string())
    }
}

impl From<String> for PathItem {
    fn from(s: String) -> Self {
        Self::Key(s)
    }
}

impl From<usize> for PathItem {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

#[doc(hidden)]
pub trait PathItemFrom<T> {
    fn from_path_component(value: T) -> PathItem;
}

// use macro_rules to implement for i8..i64, u8..u64, isize, usize, &str and
// String
macro_rules! impl_unsigned_as_path_component {
    ($($t:ty),+) => {
        $(
            impl PathItemFrom<$t> for PathItem {
                fn from_path_component(value: $t) -> Self {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
                    PathItem::Index(value as usize)
                }
            }
        )+
    };
}
impl_unsigned_as_path_component!(u8, u16, u32, u64, usize);

macro_rules! impl_signed_as_path_component {
    ($($t:ty),+) => {
        $(
            impl PathItemFrom<$t> for PathItem {
                fn from_path_component(value: $t) -> Self {
                    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                    PathItem::Index(value.max(0) as usize)
                }
            }
        )+
    };
}
impl_signed_as_path_component!(i8, i16, i32, i64, isize);

impl PathItemFrom<&str> for PathItem {
    fn from_path_component(value: &str) -> Self {
        PathItem::Key(value.to_string())
    }
}

impl PathItemFrom<String> for PathItem {
    fn from_path_component(value: String) -> Self {
        PathItem::Key(value)
    }
}

/// An ordered list of segments; empty for the document root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Path(Vec<PathItem>);

impl Path {
    /// The document root.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parses the colon-delimited external syntax. Every string is a valid
    /// path.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.is_empty() {
            return Self::root();
        }
        s.split(SEPARATOR).map(PathItem::parse).collect()
    }

    /// Returns `true` for the document root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends a segment.
    pub fn push(&mut self, item: PathItem) {
        self.0.push(item);
    }

    /// Returns a new path with `item` appended.
    #[must_use]
    pub fn join(&self, item: PathItem) -> Self {
        let mut joined = self.clone();
        joined.push(item);
        joined
    }
}

impl Deref for Path {
    type Target = [PathItem];

    fn deref(&self) -> &[PathItem] {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<&Path> for Path {
    fn from(p: &Path) -> Self {
        p.clone()
    }
}

impl From<Vec<PathItem>> for Path {
    fn from(items: Vec<PathItem>) -> Self {
        Self(items)
    }
}

impl FromIterator<PathItem> for Path {
    fn from_iter<T: IntoIterator<Item = PathItem>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// Custom (de)serialization so that a path becomes e.g. `["foo", 0, "bar"]`
// instead of the default tagged representation.
#[cfg(feature = "serde")]
mod serde_impls {
    use core::fmt;

    use serde::{
        Deserialize, Deserializer, Serialize, Serializer,
        de::{Error, Unexpected, Visitor},
    };

    use super::PathItem;

    impl Serialize for PathItem {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match self {
                PathItem::Key(k) => serializer.serialize_str(k),
                PathItem::Index(i) => serializer.serialize_u64(*i as u64),
            }
        }
    }

    struct PathItemVisitor;

    impl Visitor<'_> for PathItemVisitor {
        type Value = PathItem;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or unsigned integer")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(PathItem::Key(value.to_string()))
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(PathItem::Key(value))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            usize::try_from(value)
                .map(PathItem::Index)
                .map_err(|_| Error::invalid_value(Unexpected::Unsigned(value), &"a usize index"))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            usize::try_from(value)
                .map(PathItem::Index)
                .map_err(|_| Error::invalid_value(Unexpected::Signed(value), &"non-negative index"))
        }
    }

    impl<'de> Deserialize<'de> for PathItem {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(PathItemVisitor)
        }
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;
    use crate::path;

    #[test]
    fn test_path_item_from() {
        let key = PathItem::from_path_component("test");
        assert_eq!(key, PathItem::Key("test".into()));
        let index = PathItem::from_path_component(8u8);
        assert_eq!(index, PathItem::Index(8usize));
    }

    #[test]
    fn test_path_item_macro() {
        let p = path![0, "foo", 2];
        assert_eq!(
            p,
            Path::from(vec![
                PathItem::Index(0),
                PathItem::Key("foo".into()),
                PathItem::Index(2)
            ])
        );
    }

    #[rstest]
    #[case("", path![])]
    #[case("a", path!["a"])]
    #[case("b:0", path!["b", 0])]
    #[case("a:b:c", path!["a", "b", "c"])]
    #[case("0x:1", path!["0x", 1])]
    #[case("a::b", path!["a", "", "b"])]
    #[case("-1", path!["-1"])]
    #[case("0", path![0])]
    #[case("01", path!["01"])]
    #[case("a:007:10", path!["a", "007", 10])]
    fn parses_colon_syntax(#[case] input: &str, #[case] expected: Path) {
        assert_eq!(Path::parse(input), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[test]
    fn overflowing_index_is_a_key() {
        let p = Path::parse("99999999999999999999999");
        assert_eq!(p, path!["99999999999999999999999"]);
    }
}
