//! ObjectPath — a hierarchical object identifier such as `/xyz/openbmc_project/sensors`.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An absolute object path.
///
/// Ordering, equality and hashing are those of the underlying string, so a
/// sorted `Vec<ObjectPath>` is in lexicographic order of its text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Parse an absolute path. Rejects empty strings, relative paths,
    /// empty segments (`//`) and a trailing `/` on anything but the root.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(Error::InvalidPath(format!("'{path}' is not absolute")));
        }
        if path.len() > 1 && (path.ends_with('/') || path.contains("//")) {
            return Err(Error::InvalidPath(format!("'{path}' has an empty segment")));
        }
        Ok(Self(path))
    }

    /// The root path `/`.
    pub fn root() -> Self {
        Self("/".to_owned())
    }

    /// Replace every character outside `[A-Za-z0-9_/]` with `_`.
    ///
    /// The result is not validated; feed it to [`ObjectPath::new`].
    pub fn escape(raw: &str) -> String {
        raw.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '/' { c } else { '_' })
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Non-empty segments, root first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Last segment, `None` for the root.
    pub fn filename(&self) -> Option<&str> {
        self.segments().last()
    }

    /// The `index`th segment with its final `.extension` removed.
    ///
    /// `/0th/1st/2nd` yields `"1st"` for index 1. Leading-dot names such as
    /// `.hidden` are returned whole.
    pub fn nth_segment(&self, index: usize) -> Option<&str> {
        let segment = self.segments().nth(index)?;
        match segment.rfind('.') {
            Some(dot) if dot > 0 => Some(&segment[..dot]),
            _ => Some(segment),
        }
    }

    pub fn parent(&self) -> Option<ObjectPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_owned())),
            None => None,
        }
    }

    /// Number of segments between `root` and `self`, or `None` unless
    /// `self` lies strictly below `root`.
    pub fn depth_below(&self, root: &ObjectPath) -> Option<usize> {
        if self == root {
            return None;
        }
        let rest = if root.is_root() {
            &self.0[1..]
        } else {
            self.0.strip_prefix(root.as_str())?.strip_prefix('/')?
        };
        Some(rest.split('/').count())
    }

    /// True if `self` is `other` or one of its ancestors.
    pub fn is_ancestor_of(&self, other: &ObjectPath) -> bool {
        self == other || other.depth_below(self).is_some()
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ObjectPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for ObjectPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ObjectPath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ObjectPath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl From<ObjectPath> for String {
    fn from(p: ObjectPath) -> Self {
        p.0
    }
}
