//! Materialized JSON values.
//!
//! The decoder produces [`Value`]s only for the subtree a caller asks for. The
//! value model is intentionally narrow: the only bare literals the codec
//! understands are `null` and integers.
use core::fmt;

use indexmap::IndexMap;

use crate::{
    encoder::{ARRAY_SEPARATOR, OBJECT_SEPARATOR},
    escape::escape_string,
};

/// An object, in insertion order.
pub type Map = IndexMap<String, Value>;
/// An array of values.
pub type Array = Vec<Value>;

/// The two kinds of JSON container.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Array,
    Object,
}

impl ContainerKind {
    /// The byte that opens a container of this kind.
    #[must_use]
    pub fn open_byte(self) -> u8 {
        match self {
            Self::Array => b'[',
            Self::Object => b'{',
        }
    }

    /// The byte that closes a container of this kind.
    #[must_use]
    pub fn close_byte(self) -> u8 {
        match self {
            Self::Array => b']',
            Self::Object => b'}',
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Array => "an array",
            Self::Object => "an object",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A JSON value as understood by the codec.
///
/// # Examples
///
/// ```
/// use jsonseek::{Map, Value};
///
/// let mut map = Map::new();
/// map.insert("key".to_string(), Value::from("value"));
/// map.insert("rows".to_string(), Value::from(vec![Value::from(1), Value::Null]));
/// let v = Value::Object(map);
/// assert_eq!(v.to_string(), r#"{"key":"value","rows":[1, null]}"#);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Null,
    Number(i64),
    String(String),
    Array(Array),
    Object(Map),
}

macro_rules! impl_from_int_for_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::Number(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int_for_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Self::Object(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl Value {
    /// Returns `true` if the value is [`Null`].
    ///
    /// [`Null`]: Value::Null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the integer if the value is a [`Number`](Value::Number).
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        if let Self::Number(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    /// Returns the string slice if the value is a [`String`](Value::String).
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if let Self::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Returns the elements if the value is an [`Array`](Value::Array).
    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        if let Self::Array(a) = self {
            Some(a)
        } else {
            None
        }
    }

    /// Returns the members if the value is an [`Object`](Value::Object).
    #[must_use]
    pub fn as_object(&self) -> Option<&Map> {
        if let Self::Object(m) = self {
            Some(m)
        } else {
            None
        }
    }

    /// Returns the container kind, or `None` for scalars.
    #[must_use]
    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            Self::Array(_) => Some(ContainerKind::Array),
            Self::Object(_) => Some(ContainerKind::Object),
            Self::Null | Self::Number(_) | Self::String(_) => None,
        }
    }

    /// Renders the value as compact JSON bytes, exactly as the
    /// [`Encoder`](crate::Encoder) would write it.
    #[must_use]
    pub fn to_json_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "\"{}\"", escape_string(s)),
            Value::Array(arr) => {
                f.write_str("[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        f.write_str(ARRAY_SEPARATOR)?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Object(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(OBJECT_SEPARATOR)?;
                    }
                    write!(f, "\"{}\":{}", escape_string(k), v)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_compact_json() {
        let mut inner = Map::new();
        inner.insert("b".into(), Value::from("x\"y"));
        let mut outer = Map::new();
        outer.insert("a".into(), Value::Object(inner));
        outer.insert("n".into(), Value::from(vec![Value::from(-3), Value::Null]));
        assert_eq!(
            Value::Object(outer).to_string(),
            r#"{"a":{"b":"x\"y"},"n":[-3, null]}"#
        );
    }

    #[test]
    fn option_maps_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("s")), Value::String("s".into()));
    }

    #[test]
    fn container_kind_of_scalars_is_none() {
        assert_eq!(Value::Null.container_kind(), None);
        assert_eq!(
            Value::Array(vec![]).container_kind(),
            Some(ContainerKind::Array)
        );
    }
}
