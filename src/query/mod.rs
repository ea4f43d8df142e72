//! Mapper queries.
//!
//! One function per remote call, each a thin pass-through over a
//! `MapperBackend`: issue the call once, decode the reply, forward any error
//! untouched.

use crate::bus::{MapperBackend, ASSOCIATION_INTERFACE, ENDPOINTS_PROPERTY};
use crate::model::*;
use crate::{Error, Result};

/// Convert from Value to concrete types.
pub trait FromValue: Sized {
    fn from_value(val: &Value) -> Result<Self>;
}

impl FromValue for Vec<ObjectPath> {
    fn from_value(val: &Value) -> Result<Self> {
        let raw = val.as_string_array().ok_or_else(|| Error::MalformedResponse {
            expected: "as".into(),
            got: val.type_name().into(),
        })?;
        // An entry that is not a valid path can never match a subtree path.
        Ok(raw
            .iter()
            .filter_map(|s| match ObjectPath::new(s.as_str()) {
                Ok(path) => Some(path),
                Err(_) => {
                    tracing::debug!(entry = %s, "skipping invalid object path");
                    None
                }
            })
            .collect())
    }
}

impl FromValue for String {
    fn from_value(val: &Value) -> Result<Self> {
        val.as_str().map(str::to_owned).ok_or_else(|| Error::MalformedResponse {
            expected: "s".into(),
            got: val.type_name().into(),
        })
    }
}

impl FromValue for i64 {
    fn from_value(val: &Value) -> Result<Self> {
        val.as_int().ok_or_else(|| Error::MalformedResponse {
            expected: "integer".into(),
            got: val.type_name().into(),
        })
    }
}

/// Read a typed property from an object hosted by the mapper service.
pub async fn get_property<B, T>(
    backend: &B,
    path: &ObjectPath,
    interface: &str,
    property: &str,
) -> Result<T>
where
    B: MapperBackend + ?Sized,
    T: FromValue,
{
    let service = backend.config().service.as_str();
    let value = backend.get_property(service, path, interface, property).await?;
    T::from_value(&value)
}

/// The `endpoints` of the association object at `association`.
///
/// Wire order is passed through; callers must not depend on it.
pub async fn get_association_endpoints<B>(backend: &B, association: &ObjectPath) -> Result<Vec<ObjectPath>>
where
    B: MapperBackend + ?Sized,
{
    let endpoints: Vec<ObjectPath> =
        get_property(backend, association, ASSOCIATION_INTERFACE, ENDPOINTS_PROPERTY)
            .await
            .inspect_err(|e| tracing::warn!(path = %association, error = %e, "endpoint fetch failed"))?;
    tracing::debug!(path = %association, count = endpoints.len(), "fetched association endpoints");
    Ok(endpoints)
}

/// Paths under `root` within `depth` implementing any of `interfaces`.
pub async fn get_subtree_paths<B>(
    backend: &B,
    root: &ObjectPath,
    depth: Depth,
    interfaces: &InterfaceFilter,
) -> Result<Vec<ObjectPath>>
where
    B: MapperBackend + ?Sized,
{
    let paths = backend
        .get_subtree_paths(root, depth, interfaces)
        .await
        .inspect_err(|e| tracing::warn!(root = %root, depth = %depth, error = %e, "subtree paths fetch failed"))?;
    tracing::debug!(root = %root, depth = %depth, count = paths.len(), "fetched subtree paths");
    Ok(paths)
}

/// Like [`get_subtree_paths`], with the services hosting each object.
pub async fn get_subtree<B>(
    backend: &B,
    root: &ObjectPath,
    depth: Depth,
    interfaces: &InterfaceFilter,
) -> Result<SubTree>
where
    B: MapperBackend + ?Sized,
{
    let subtree = backend
        .get_subtree(root, depth, interfaces)
        .await
        .inspect_err(|e| tracing::warn!(root = %root, depth = %depth, error = %e, "subtree fetch failed"))?;
    tracing::debug!(root = %root, depth = %depth, count = subtree.len(), "fetched subtree");
    Ok(subtree)
}

/// Services implementing `interfaces` on `path`.
pub async fn get_object<B>(backend: &B, path: &ObjectPath, interfaces: &InterfaceFilter) -> Result<ServiceMap>
where
    B: MapperBackend + ?Sized,
{
    backend.get_object(path, interfaces).await
}

/// Whether any service exposes an object at `path`.
///
/// Errors count as "does not exist".
pub async fn check_path_exists<B>(backend: &B, path: &ObjectPath) -> bool
where
    B: MapperBackend + ?Sized,
{
    match backend.get_object(path, &InterfaceFilter::any()).await {
        Ok(services) => !services.is_empty(),
        Err(e) => {
            tracing::debug!(path = %path, error = %e, "existence check failed");
            false
        }
    }
}
