//! # Mapper Backend Trait
//!
//! This is THE contract between objmapper-rs and whatever answers object
//! mapper queries. Every remote call the query layer and the resolver make
//! is defined here.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryMapper` | `memory` | In-process object registry for testing/embedding |
//!
//! A bus transport implements the same trait; connection handling, timeouts
//! and cancellation are its business and surface as [`Error::Transport`].
//!
//! [`Error::Transport`]: crate::Error::Transport

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::*;
use crate::resolver::ResolveStrategy;
use crate::{Error, Result};

pub use memory::MemoryMapper;

// ============================================================================
// Well-known names
// ============================================================================

/// Bus name of the object mapper service.
pub const MAPPER_SERVICE: &str = "xyz.openbmc_project.ObjectMapper";

/// Object path the mapper serves its methods on.
pub const MAPPER_PATH: &str = "/xyz/openbmc_project/object_mapper";

/// Interface carrying `GetObject`, `GetSubTree` and `GetSubTreePaths`.
pub const MAPPER_INTERFACE: &str = "xyz.openbmc_project.ObjectMapper";

/// Interface implemented by association objects.
pub const ASSOCIATION_INTERFACE: &str = "xyz.openbmc_project.Association";

/// Association property listing the related object paths.
pub const ENDPOINTS_PROPERTY: &str = "endpoints";

// ============================================================================
// Configuration
// ============================================================================

/// Where the mapper lives and how resolutions are scheduled.
///
/// Fixed for the lifetime of a backend; never varies per call. Missing
/// fields fall back to the well-known names above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    /// Bus name every call is addressed to; also the host of association objects.
    pub service: String,
    /// Object the mapper methods are invoked on. A bus transport sends
    /// `GetObject`/`GetSubTree`/`GetSubTreePaths` here.
    pub object_path: ObjectPath,
    /// Interface those mapper methods belong to.
    pub interface: String,
    pub strategy: ResolveStrategy,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            service: MAPPER_SERVICE.to_owned(),
            object_path: ObjectPath::new(MAPPER_PATH)
                .unwrap_or_else(|_| ObjectPath::root()),
            interface: MAPPER_INTERFACE.to_owned(),
            strategy: ResolveStrategy::default(),
        }
    }
}

impl MapperConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }
}

// ============================================================================
// Method identifiers
// ============================================================================

/// The remote methods a backend serves. Used for accounting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapperMethod {
    GetProperty,
    GetSubTree,
    GetSubTreePaths,
    GetObject,
}

impl MapperMethod {
    pub const ALL: [MapperMethod; 4] = [
        MapperMethod::GetProperty,
        MapperMethod::GetSubTree,
        MapperMethod::GetSubTreePaths,
        MapperMethod::GetObject,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MapperMethod::GetProperty => "Get",
            MapperMethod::GetSubTree => "GetSubTree",
            MapperMethod::GetSubTreePaths => "GetSubTreePaths",
            MapperMethod::GetObject => "GetObject",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            MapperMethod::GetProperty => 0,
            MapperMethod::GetSubTree => 1,
            MapperMethod::GetSubTreePaths => 2,
            MapperMethod::GetObject => 3,
        }
    }
}

// ============================================================================
// MapperBackend Trait
// ============================================================================

/// The remote query contract.
///
/// Each method is exactly one remote round trip. Implementations report
/// failures through the returned `Result` and never retry on their own.
#[async_trait]
pub trait MapperBackend: Send + Sync + 'static {
    /// Names the calls are addressed to.
    fn config(&self) -> &MapperConfig;

    /// `org.freedesktop.DBus.Properties.Get` on `path`, hosted by `service`.
    async fn get_property(
        &self,
        service: &str,
        path: &ObjectPath,
        interface: &str,
        property: &str,
    ) -> Result<Value>;

    /// Every object under `root` within `depth` implementing at least one of
    /// `interfaces`, with the services hosting them.
    async fn get_subtree(
        &self,
        root: &ObjectPath,
        depth: Depth,
        interfaces: &InterfaceFilter,
    ) -> Result<SubTree>;

    /// Paths-only variant of [`get_subtree`](Self::get_subtree).
    ///
    /// Default: issues `get_subtree` and drops the service maps. Backends
    /// with a native paths call should override it.
    async fn get_subtree_paths(
        &self,
        root: &ObjectPath,
        depth: Depth,
        interfaces: &InterfaceFilter,
    ) -> Result<Vec<ObjectPath>> {
        let subtree = self.get_subtree(root, depth, interfaces).await?;
        Ok(subtree.into_iter().map(|(path, _)| path).collect())
    }

    /// Services implementing `interfaces` on exactly `path`.
    async fn get_object(
        &self,
        path: &ObjectPath,
        interfaces: &InterfaceFilter,
    ) -> Result<ServiceMap>;
}
