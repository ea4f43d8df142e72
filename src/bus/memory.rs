//! In-memory object mapper.
//!
//! This is the reference implementation of `MapperBackend`.
//! It keeps an object registry in a `BTreeMap` protected by an `RwLock` and
//! answers queries with the mapper's semantics:
//!
//! - Subtree queries return strict descendants of the root, in path order.
//!   Depth `<= 0` is unbounded. An empty interface filter matches everything.
//! - A subtree root that is neither `/` nor a registered object nor an
//!   ancestor of one is `NotFound`.
//! - Association objects are hosted by the configured mapper service.
//!
//! ## Test hooks
//!
//! - `fail_next()` makes the next call of one method fail with a given error.
//! - `calls()` counts the calls issued per method, failed ones included.
//!
//! Use this backend for:
//! - Testing the resolver and query layer without a bus
//! - Embedding the resolver in tools that build their own object registry

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::model::*;
use crate::{Error, Result};
use super::{MapperBackend, MapperConfig, MapperMethod, ASSOCIATION_INTERFACE, ENDPOINTS_PROPERTY};

// ============================================================================
// MemoryMapper
// ============================================================================

/// In-memory object registry answering mapper queries.
///
/// Cloning is cheap and clones share the registry.
#[derive(Clone)]
pub struct MemoryMapper {
    inner: Arc<MemoryInner>,
    config: MapperConfig,
}

struct MemoryInner {
    objects: RwLock<BTreeMap<ObjectPath, MemoryObject>>,
    /// method → error returned by its next call
    faults: Mutex<HashMap<MapperMethod, Error>>,
    calls: [AtomicUsize; 4],
}

#[derive(Default)]
struct MemoryObject {
    services: ServiceMap,
    /// (interface, property) → value
    properties: HashMap<(String, String), Value>,
}

impl MemoryMapper {
    pub fn new() -> Self {
        Self::with_config(MapperConfig::default())
    }

    pub fn with_config(config: MapperConfig) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                objects: RwLock::new(BTreeMap::new()),
                faults: Mutex::new(HashMap::new()),
                calls: Default::default(),
            }),
            config,
        }
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Register `interfaces` on `path` under `service`. Merges with anything
    /// already registered there.
    pub fn add_object(&self, path: &ObjectPath, service: &str, interfaces: &[&str]) {
        let mut objects = self.inner.objects.write();
        let hosted = objects
            .entry(path.clone())
            .or_default()
            .services
            .entry(service.to_owned())
            .or_default();
        for iface in interfaces {
            if !hosted.iter().any(|h| h == iface) {
                hosted.push((*iface).to_owned());
            }
        }
    }

    /// Set a property on a registered object.
    pub fn set_property(
        &self,
        path: &ObjectPath,
        interface: &str,
        property: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        let mut objects = self.inner.objects.write();
        let object = objects
            .get_mut(path)
            .ok_or_else(|| Error::NotFound(format!("object {path}")))?;
        object
            .properties
            .insert((interface.to_owned(), property.to_owned()), value.into());
        Ok(())
    }

    /// Register an association object whose `endpoints` are `endpoints`.
    /// Replaces the endpoint list if the association already exists.
    pub fn add_association<I>(&self, path: &ObjectPath, endpoints: I) -> Result<()>
    where
        I: IntoIterator<Item = ObjectPath>,
    {
        let service = self.config.service.clone();
        self.add_object(path, &service, &[ASSOCIATION_INTERFACE]);
        let endpoints: Vec<String> = endpoints.into_iter().map(ObjectPath::into_string).collect();
        self.set_property(path, ASSOCIATION_INTERFACE, ENDPOINTS_PROPERTY, Value::StringArray(endpoints))
    }

    /// Remove an object. Returns true if it existed.
    pub fn remove_object(&self, path: &ObjectPath) -> bool {
        self.inner.objects.write().remove(path).is_some()
    }

    pub fn object_count(&self) -> usize {
        self.inner.objects.read().len()
    }

    // ========================================================================
    // Test hooks
    // ========================================================================

    /// Make the next call of `method` fail with `error`.
    pub fn fail_next(&self, method: MapperMethod, error: Error) {
        self.inner.faults.lock().insert(method, error);
    }

    /// Calls of `method` issued so far, failed ones included.
    pub fn calls(&self, method: MapperMethod) -> usize {
        self.inner.calls[method.index()].load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        MapperMethod::ALL.iter().map(|m| self.calls(*m)).sum()
    }

    pub fn reset_calls(&self) {
        for counter in &self.inner.calls {
            counter.store(0, Ordering::SeqCst);
        }
    }

    /// Count the call and hand out a pending fault, if any.
    fn enter(&self, method: MapperMethod) -> Result<()> {
        self.inner.calls[method.index()].fetch_add(1, Ordering::SeqCst);
        tracing::trace!(
            service = %self.config.service,
            object = %self.config.object_path,
            interface = %self.config.interface,
            method = method.name(),
            "memory mapper call"
        );
        match self.inner.faults.lock().remove(&method) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Query helpers
    // ========================================================================

    fn ensure_root_exists(objects: &BTreeMap<ObjectPath, MemoryObject>, root: &ObjectPath) -> Result<()> {
        if root.is_root() || objects.keys().any(|p| root.is_ancestor_of(p)) {
            Ok(())
        } else {
            Err(Error::NotFound(format!("path or object not found: {root}")))
        }
    }

    /// The part of `services` admitted by `interfaces`; services left with
    /// no interface are dropped.
    fn filter_services(services: &ServiceMap, interfaces: &InterfaceFilter) -> ServiceMap {
        services
            .iter()
            .filter_map(|(service, ifaces)| {
                let kept: Vec<String> = ifaces
                    .iter()
                    .filter(|i| interfaces.admits(i))
                    .cloned()
                    .collect();
                (!kept.is_empty()).then(|| (service.clone(), kept))
            })
            .collect()
    }

    fn collect_subtree(
        &self,
        root: &ObjectPath,
        depth: Depth,
        interfaces: &InterfaceFilter,
    ) -> Result<SubTree> {
        let objects = self.inner.objects.read();
        Self::ensure_root_exists(&objects, root)?;

        let subtree = objects
            .iter()
            .filter(|(path, _)| path.depth_below(root).is_some_and(|levels| depth.admits(levels)))
            .filter_map(|(path, object)| {
                let services = Self::filter_services(&object.services, interfaces);
                (!services.is_empty()).then(|| (path.clone(), services))
            })
            .collect();
        Ok(subtree)
    }
}

impl Default for MemoryMapper {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MapperBackend impl
// ============================================================================

#[async_trait]
impl MapperBackend for MemoryMapper {
    fn config(&self) -> &MapperConfig {
        &self.config
    }

    async fn get_property(
        &self,
        service: &str,
        path: &ObjectPath,
        interface: &str,
        property: &str,
    ) -> Result<Value> {
        self.enter(MapperMethod::GetProperty)?;

        let objects = self.inner.objects.read();
        let object = objects
            .get(path)
            .ok_or_else(|| Error::NotFound(format!("object {path}")))?;

        let hosted = object
            .services
            .get(service)
            .is_some_and(|ifaces| ifaces.iter().any(|i| i == interface));
        if !hosted {
            return Err(Error::NotFound(format!("interface {interface} on {path} via {service}")));
        }

        object
            .properties
            .get(&(interface.to_owned(), property.to_owned()))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("property {interface}.{property} on {path}")))
    }

    async fn get_subtree(
        &self,
        root: &ObjectPath,
        depth: Depth,
        interfaces: &InterfaceFilter,
    ) -> Result<SubTree> {
        self.enter(MapperMethod::GetSubTree)?;
        self.collect_subtree(root, depth, interfaces)
    }

    async fn get_subtree_paths(
        &self,
        root: &ObjectPath,
        depth: Depth,
        interfaces: &InterfaceFilter,
    ) -> Result<Vec<ObjectPath>> {
        self.enter(MapperMethod::GetSubTreePaths)?;
        let subtree = self.collect_subtree(root, depth, interfaces)?;
        Ok(subtree.into_iter().map(|(path, _)| path).collect())
    }

    async fn get_object(
        &self,
        path: &ObjectPath,
        interfaces: &InterfaceFilter,
    ) -> Result<ServiceMap> {
        self.enter(MapperMethod::GetObject)?;

        let objects = self.inner.objects.read();
        let object = objects
            .get(path)
            .ok_or_else(|| Error::NotFound(format!("object {path}")))?;
        let services = Self::filter_services(&object.services, interfaces);
        if services.is_empty() {
            return Err(Error::NotFound(format!("no matching interfaces on {path}")));
        }
        Ok(services)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SENSOR: &str = "xyz.openbmc_project.Sensor.Value";
    const INVENTORY: &str = "xyz.openbmc_project.Inventory.Item";

    fn p(s: &str) -> ObjectPath {
        ObjectPath::new(s).unwrap()
    }

    fn sample() -> MemoryMapper {
        let db = MemoryMapper::new();
        db.add_object(&p("/xyz/sensors/temp/cpu0"), "xyz.Hwmon", &[SENSOR]);
        db.add_object(&p("/xyz/sensors/temp/cpu1"), "xyz.Hwmon", &[SENSOR]);
        db.add_object(&p("/xyz/sensors/fan/fan0"), "xyz.Fan", &[SENSOR]);
        db.add_object(&p("/xyz/inventory/board"), "xyz.Inventory", &[INVENTORY]);
        db
    }

    #[tokio::test]
    async fn test_subtree_paths_in_path_order() {
        let db = sample();
        let paths = db
            .get_subtree_paths(&p("/xyz/sensors"), Depth::UNBOUNDED, &InterfaceFilter::from([SENSOR]))
            .await
            .unwrap();
        assert_eq!(
            paths,
            vec![p("/xyz/sensors/fan/fan0"), p("/xyz/sensors/temp/cpu0"), p("/xyz/sensors/temp/cpu1")]
        );
    }

    #[tokio::test]
    async fn test_subtree_respects_depth() {
        let db = sample();
        db.add_object(&p("/xyz/sensors/top"), "xyz.Hwmon", &[SENSOR]);

        let shallow = db
            .get_subtree_paths(&p("/xyz/sensors"), Depth(1), &InterfaceFilter::any())
            .await
            .unwrap();
        assert_eq!(shallow, vec![p("/xyz/sensors/top")]);

        let negative = db
            .get_subtree_paths(&p("/xyz/sensors"), Depth(-1), &InterfaceFilter::any())
            .await
            .unwrap();
        assert_eq!(negative.len(), 4);
    }

    #[tokio::test]
    async fn test_subtree_filters_interfaces_and_services() {
        let db = sample();
        db.add_object(&p("/xyz/sensors/temp/cpu0"), "xyz.Extra", &[INVENTORY]);

        let subtree = db
            .get_subtree(&ObjectPath::root(), Depth::UNBOUNDED, &InterfaceFilter::from([INVENTORY]))
            .await
            .unwrap();
        assert_eq!(subtree.len(), 2);
        let (path, services) = &subtree[1];
        assert_eq!(path, &p("/xyz/sensors/temp/cpu0"));
        assert_eq!(services.len(), 1);
        assert_eq!(services["xyz.Extra"], vec![INVENTORY.to_string()]);
    }

    #[tokio::test]
    async fn test_subtree_excludes_root_itself() {
        let db = sample();
        db.add_object(&p("/xyz/sensors"), "xyz.Hwmon", &[SENSOR]);
        let paths = db
            .get_subtree_paths(&p("/xyz/sensors"), Depth::UNBOUNDED, &InterfaceFilter::any())
            .await
            .unwrap();
        assert!(!paths.contains(&p("/xyz/sensors")));
    }

    #[tokio::test]
    async fn test_subtree_unknown_root_is_not_found() {
        let db = sample();
        let err = db
            .get_subtree_paths(&p("/nowhere"), Depth::UNBOUNDED, &InterfaceFilter::any())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_association_property() {
        let db = sample();
        let assoc = p("/xyz/inventory/board/all_sensors");
        db.add_association(&assoc, [p("/xyz/sensors/temp/cpu0")]).unwrap();

        let service = db.config().service.clone();
        let value = db
            .get_property(&service, &assoc, ASSOCIATION_INTERFACE, ENDPOINTS_PROPERTY)
            .await
            .unwrap();
        assert_eq!(value, Value::StringArray(vec!["/xyz/sensors/temp/cpu0".into()]));

        // wrong service does not host the interface
        let err = db
            .get_property("xyz.Other", &assoc, ASSOCIATION_INTERFACE, ENDPOINTS_PROPERTY)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_object() {
        let db = sample();
        let services = db
            .get_object(&p("/xyz/inventory/board"), &InterfaceFilter::any())
            .await
            .unwrap();
        assert!(services.contains_key("xyz.Inventory"));

        assert!(db.get_object(&p("/xyz/missing"), &InterfaceFilter::any()).await.is_err());
        assert!(db
            .get_object(&p("/xyz/inventory/board"), &InterfaceFilter::from([SENSOR]))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_fail_next_fires_once_and_counts() {
        let db = sample();
        db.fail_next(MapperMethod::GetSubTreePaths, Error::Transport("bus closed".into()));

        let root = p("/xyz");
        let first = db.get_subtree_paths(&root, Depth::UNBOUNDED, &InterfaceFilter::any()).await;
        assert_eq!(first.unwrap_err(), Error::Transport("bus closed".into()));

        let second = db.get_subtree_paths(&root, Depth::UNBOUNDED, &InterfaceFilter::any()).await;
        assert!(second.is_ok());
        assert_eq!(db.calls(MapperMethod::GetSubTreePaths), 2);
        assert_eq!(db.calls(MapperMethod::GetSubTree), 0);

        db.reset_calls();
        assert_eq!(db.total_calls(), 0);
    }

    #[test]
    fn test_remove_object() {
        let db = sample();
        assert_eq!(db.object_count(), 4);
        assert!(db.remove_object(&p("/xyz/inventory/board")));
        assert!(!db.remove_object(&p("/xyz/inventory/board")));
        assert_eq!(db.object_count(), 3);
    }
}
