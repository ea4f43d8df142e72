//! Interface filter and traversal depth: the two knobs of a subtree query.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Ordered list of interface names restricting a subtree query.
///
/// An empty filter is legal; the mapper treats it as "match every object".
/// Built once and then only read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfaceFilter(SmallVec<[String; 4]>);

impl InterfaceFilter {
    pub fn new<I, S>(interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(interfaces.into_iter().map(Into::into).collect())
    }

    /// The filter that matches everything.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// True if the filter is empty or `interface` is listed.
    pub fn admits(&self, interface: &str) -> bool {
        self.is_empty() || self.0.iter().any(|i| i == interface)
    }

    /// True if the filter is empty or any of `implemented` is listed.
    pub fn matches_any<'a>(&self, implemented: impl IntoIterator<Item = &'a String>) -> bool {
        self.is_empty() || implemented.into_iter().any(|i| self.admits(i))
    }
}

impl<const N: usize> From<[&str; N]> for InterfaceFilter {
    fn from(interfaces: [&str; N]) -> Self {
        Self::new(interfaces)
    }
}

impl From<Vec<String>> for InterfaceFilter {
    fn from(interfaces: Vec<String>) -> Self {
        Self(SmallVec::from_vec(interfaces))
    }
}

/// Traversal depth of a subtree query, forwarded to the mapper verbatim.
///
/// Mapper semantics: `0` (or any negative value) means unbounded, `n > 0`
/// admits objects at most `n` segments below the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Depth(pub i32);

impl Depth {
    pub const UNBOUNDED: Depth = Depth(0);

    pub fn is_unbounded(self) -> bool {
        self.0 <= 0
    }

    /// Whether an object `levels` segments below the root is within range.
    pub fn admits(self, levels: usize) -> bool {
        match usize::try_from(self.0) {
            Ok(0) | Err(_) => true,
            Ok(max) => levels <= max,
        }
    }
}

impl Default for Depth {
    fn default() -> Self {
        Depth::UNBOUNDED
    }
}

impl From<i32> for Depth {
    fn from(v: i32) -> Self {
        Depth(v)
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
