//! Mapper response shapes: which services host which interfaces on an object.

use std::collections::BTreeMap;

use super::ObjectPath;

/// Service name → interfaces that service implements on one object.
pub type ServiceMap = BTreeMap<String, Vec<String>>;

/// A `GetSubTree` reply: every matching path with its service map.
pub type SubTree = Vec<(ObjectPath, ServiceMap)>;
