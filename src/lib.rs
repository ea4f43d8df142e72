//! # objmapper-rs — Object Mapper Client
//!
//! Typed, async access to a BMC object mapper, plus the one query the mapper
//! cannot answer natively: *which objects under a root are endpoints of an
//! association*.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `MapperBackend` is the contract between queries and the bus
//! 2. **Injected client**: no global connection; every query borrows a backend
//! 3. **Pass-throughs stay thin**: one remote call each, errors forwarded untouched
//! 4. **Resolver owns the logic**: ordering, short-circuiting, intersection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use objmapper_rs::{Mapper, ObjectPath, InterfaceFilter, Depth};
//!
//! # async fn example() -> objmapper_rs::Result<()> {
//! let mapper = Mapper::open_memory();
//!
//! let sensors = mapper
//!     .associated_subtree_paths(
//!         &ObjectPath::new("/xyz/openbmc_project/inventory/system/chassis/all_sensors")?,
//!         &ObjectPath::new("/xyz/openbmc_project/sensors")?,
//!         Depth::UNBOUNDED,
//!         &InterfaceFilter::from(["xyz.openbmc_project.Sensor.Value"]),
//!     )
//!     .await?;
//!
//! for path in &sensors {
//!     println!("{path}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Backends
//!
//! | Backend | Description |
//! |---------|-------------|
//! | `MemoryMapper` | In-process object registry for testing/embedding |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod bus;
pub mod query;
pub mod resolver;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    ObjectPath, Value, InterfaceFilter, Depth,
    ServiceMap, SubTree,
};

// ============================================================================
// Re-exports: Bus
// ============================================================================

pub use bus::{
    MapperBackend, MapperConfig, MapperMethod, MemoryMapper,
    MAPPER_SERVICE, MAPPER_PATH, MAPPER_INTERFACE,
    ASSOCIATION_INTERFACE, ENDPOINTS_PROPERTY,
};

// ============================================================================
// Re-exports: Resolver
// ============================================================================

pub use resolver::{
    AssociationResolver, Resolution, ResolutionState, ResolveStrategy,
    get_associated_subtree_paths,
};

// ============================================================================
// Top-level Mapper handle
// ============================================================================

/// The primary entry point. A `Mapper` owns a backend and exposes every
/// mapper query on it.
pub struct Mapper<B: MapperBackend> {
    backend: B,
}

impl<B: MapperBackend> Mapper<B> {
    /// Create a Mapper with the given backend.
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    /// Paths under `root` that are endpoints of `association`, sorted.
    pub async fn associated_subtree_paths(
        &self,
        association: &ObjectPath,
        root: &ObjectPath,
        depth: Depth,
        interfaces: &InterfaceFilter,
    ) -> Result<Vec<ObjectPath>> {
        resolver::get_associated_subtree_paths(&self.backend, association, root, depth, interfaces).await
    }

    /// Endpoints of the association object at `association`.
    pub async fn association_endpoints(&self, association: &ObjectPath) -> Result<Vec<ObjectPath>> {
        query::get_association_endpoints(&self.backend, association).await
    }

    pub async fn subtree(
        &self,
        root: &ObjectPath,
        depth: Depth,
        interfaces: &InterfaceFilter,
    ) -> Result<SubTree> {
        query::get_subtree(&self.backend, root, depth, interfaces).await
    }

    pub async fn subtree_paths(
        &self,
        root: &ObjectPath,
        depth: Depth,
        interfaces: &InterfaceFilter,
    ) -> Result<Vec<ObjectPath>> {
        query::get_subtree_paths(&self.backend, root, depth, interfaces).await
    }

    pub async fn object(&self, path: &ObjectPath, interfaces: &InterfaceFilter) -> Result<ServiceMap> {
        query::get_object(&self.backend, path, interfaces).await
    }

    /// Whether any service exposes an object at `path`.
    pub async fn path_exists(&self, path: &ObjectPath) -> bool {
        query::check_path_exists(&self.backend, path).await
    }

    /// Access the underlying backend (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// In-memory mapper for testing and embedding.
impl Mapper<bus::MemoryMapper> {
    pub fn open_memory() -> Self {
        Self::with_backend(bus::MemoryMapper::new())
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Every failure a mapper query can report.
///
/// Errors are values: they compare equal when they carry the same cause, so
/// a caller can tell exactly which remote call failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Bus-level failure, including timeouts and cancellation.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Object, interface, property or subtree root does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed response: expected {expected}, got {got}")]
    MalformedResponse { expected: String, got: String },

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
