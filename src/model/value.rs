//! Property value type matching the variant the object mapper hands out.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A property value read from a remote object.
///
/// Covers the shapes a BMC property can take:
/// - Containers: association triples, string arrays, double arrays
/// - Scalars: strings, signed/unsigned integers of every width, doubles, bools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// `(forward, reverse, endpoint)` association definitions.
    Associations(Vec<(String, String, String)>),
    StringArray(Vec<String>),
    DoubleArray(Vec<f64>),
    String(String),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    Int32(i32),
    UInt32(u32),
    Int16(i16),
    UInt16(u16),
    Byte(u8),
    Bool(bool),
}

// ============================================================================
// Type checking
// ============================================================================

impl Value {
    /// D-Bus signature of the value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Associations(_) => "a(sss)",
            Value::StringArray(_) => "as",
            Value::DoubleArray(_) => "ad",
            Value::String(_) => "s",
            Value::Int64(_) => "x",
            Value::UInt64(_) => "t",
            Value::Double(_) => "d",
            Value::Int32(_) => "i",
            Value::UInt32(_) => "u",
            Value::Int16(_) => "n",
            Value::UInt16(_) => "q",
            Value::Byte(_) => "y",
            Value::Bool(_) => "b",
        }
    }

    pub fn as_string_array(&self) -> Option<&[String]> {
        match self {
            Value::StringArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Widen any integer variant to i64. `UInt64` values above `i64::MAX` yield `None`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            Value::UInt64(v) => i64::try_from(*v).ok(),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::UInt32(v) => Some(i64::from(*v)),
            Value::Int16(v) => Some(i64::from(*v)),
            Value::UInt16(v) => Some(i64::from(*v)),
            Value::Byte(v) => Some(i64::from(*v)),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<u8> for Value { fn from(v: u8) -> Self { Value::Byte(v) } }
impl From<i16> for Value { fn from(v: i16) -> Self { Value::Int16(v) } }
impl From<u16> for Value { fn from(v: u16) -> Self { Value::UInt16(v) } }
impl From<i32> for Value { fn from(v: i32) -> Self { Value::Int32(v) } }
impl From<u32> for Value { fn from(v: u32) -> Self { Value::UInt32(v) } }
impl From<i64> for Value { fn from(v: i64) -> Self { Value::Int64(v) } }
impl From<u64> for Value { fn from(v: u64) -> Self { Value::UInt64(v) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Double(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::String(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::String(v.to_owned()) } }
impl From<Vec<String>> for Value { fn from(v: Vec<String>) -> Self { Value::StringArray(v) } }
impl From<Vec<f64>> for Value { fn from(v: Vec<f64>) -> Self { Value::DoubleArray(v) } }

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Associations(a) => {
                write!(f, "[")?;
                for (i, (fwd, rev, ep)) in a.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "({fwd}, {rev}, {ep})")?;
                }
                write!(f, "]")
            }
            Value::StringArray(v) => {
                write!(f, "[")?;
                for (i, s) in v.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "\"{}\"", s.replace('"', "\\\""))?;
                }
                write!(f, "]")
            }
            Value::DoubleArray(v) => write!(f, "{v:?}"),
            Value::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}
