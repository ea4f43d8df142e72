//! # Object Mapper Model
//!
//! Plain data that crosses every boundary: backend ↔ query ↔ resolver ↔ user.
//!
//! Design rule: no transport types here. This module is pure data: no I/O,
//! no state, no async.

pub mod path;
pub mod value;
pub mod interfaces;
pub mod service_map;

pub use path::ObjectPath;
pub use value::Value;
pub use interfaces::{InterfaceFilter, Depth};
pub use service_map::{ServiceMap, SubTree};
