//! End-to-end tests for the single-call mapper queries.
//!
//! Each query is one remote call on the backend; these tests check the
//! decoded replies, that errors come back untouched, and that each query
//! issues exactly the call it wraps.

use objmapper_rs::{
    query, Depth, Error, InterfaceFilter, Mapper, MapperBackend, MapperConfig, MapperMethod,
    MemoryMapper, ObjectPath, Value, ASSOCIATION_INTERFACE, ENDPOINTS_PROPERTY,
};

const SENSOR: &str = "xyz.openbmc_project.Sensor.Value";
const THRESHOLD: &str = "xyz.openbmc_project.Sensor.Threshold.Warning";

fn p(s: &str) -> ObjectPath {
    ObjectPath::new(s).unwrap()
}

// ============================================================================
// Helper: a small sensor tree.
// ============================================================================

fn setup_sensors() -> Mapper<MemoryMapper> {
    let mapper = Mapper::open_memory();
    let db = mapper.backend();
    db.add_object(&p("/sensors/temp/cpu0"), "svc.Hwmon", &[SENSOR, THRESHOLD]);
    db.add_object(&p("/sensors/temp/cpu1"), "svc.Hwmon", &[SENSOR]);
    db.add_object(&p("/sensors/power/psu0"), "svc.Psu", &[SENSOR]);
    mapper
}

// ============================================================================
// 1. Subtree
// ============================================================================

#[tokio::test]
async fn test_subtree_returns_services() {
    let mapper = setup_sensors();
    let subtree = mapper
        .subtree(&p("/sensors"), Depth::UNBOUNDED, &InterfaceFilter::from([THRESHOLD]))
        .await
        .unwrap();

    assert_eq!(subtree.len(), 1);
    let (path, services) = &subtree[0];
    assert_eq!(path, &p("/sensors/temp/cpu0"));
    assert_eq!(services["svc.Hwmon"], vec![THRESHOLD.to_string()]);
    assert_eq!(mapper.backend().calls(MapperMethod::GetSubTree), 1);
}

#[tokio::test]
async fn test_subtree_paths_issue_one_call() {
    let mapper = setup_sensors();
    let paths = mapper
        .subtree_paths(&p("/sensors"), Depth::UNBOUNDED, &InterfaceFilter::from([SENSOR]))
        .await
        .unwrap();

    assert_eq!(paths.len(), 3);
    assert_eq!(mapper.backend().calls(MapperMethod::GetSubTreePaths), 1);
    assert_eq!(mapper.backend().calls(MapperMethod::GetSubTree), 0);
}

#[tokio::test]
async fn test_subtree_error_forwarded() {
    let mapper = setup_sensors();
    mapper
        .backend()
        .fail_next(MapperMethod::GetSubTree, Error::Transport("no reply".into()));
    let err = mapper
        .subtree(&p("/sensors"), Depth::UNBOUNDED, &InterfaceFilter::any())
        .await
        .unwrap_err();
    assert_eq!(err, Error::Transport("no reply".into()));
}

// ============================================================================
// 2. Association endpoints
// ============================================================================

#[tokio::test]
async fn test_endpoints_keep_wire_order() {
    let mapper = setup_sensors();
    let assoc = p("/inventory/board/all_sensors");
    mapper
        .backend()
        .add_association(&assoc, [p("/sensors/temp/cpu1"), p("/sensors/temp/cpu0")])
        .unwrap();

    let endpoints = mapper.association_endpoints(&assoc).await.unwrap();
    assert_eq!(endpoints, vec![p("/sensors/temp/cpu1"), p("/sensors/temp/cpu0")]);
}

#[tokio::test]
async fn test_endpoints_of_missing_object() {
    let mapper = setup_sensors();
    let err = mapper.association_endpoints(&p("/inventory/none")).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_endpoints_wrong_type_is_malformed() {
    let mapper = setup_sensors();
    let db = mapper.backend();
    let assoc = p("/inventory/board/odd");
    db.add_association(&assoc, Vec::<ObjectPath>::new()).unwrap();
    db.set_property(&assoc, ASSOCIATION_INTERFACE, ENDPOINTS_PROPERTY, Value::from("/sensors"))
        .unwrap();

    let err = mapper.association_endpoints(&assoc).await.unwrap_err();
    assert_eq!(err, Error::MalformedResponse { expected: "as".into(), got: "s".into() });
}

#[tokio::test]
async fn test_associations_follow_configured_service() {
    let config = MapperConfig::from_json(r#"{"service": "org.example.Mapper"}"#).unwrap();
    let mapper = Mapper::with_backend(MemoryMapper::with_config(config));
    let assoc = p("/inventory/board/all_sensors");
    mapper.backend().add_association(&assoc, [p("/sensors/a")]).unwrap();

    let services = mapper.object(&assoc, &InterfaceFilter::any()).await.unwrap();
    assert!(services.contains_key("org.example.Mapper"));

    let endpoints = query::get_association_endpoints(mapper.backend(), &assoc).await.unwrap();
    assert_eq!(endpoints, vec![p("/sensors/a")]);
}

// ============================================================================
// 3. Existence check
// ============================================================================

#[tokio::test]
async fn test_path_exists() {
    let mapper = setup_sensors();
    assert!(mapper.path_exists(&p("/sensors/temp/cpu0")).await);
    assert!(!mapper.path_exists(&p("/sensors/temp/cpu9")).await);
    // intermediate path with no object of its own
    assert!(!mapper.path_exists(&p("/sensors/temp")).await);
}

#[tokio::test]
async fn test_path_exists_swallows_errors() {
    let mapper = setup_sensors();
    mapper
        .backend()
        .fail_next(MapperMethod::GetObject, Error::Transport("down".into()));
    assert!(!mapper.path_exists(&p("/sensors/temp/cpu0")).await);
    assert!(mapper.path_exists(&p("/sensors/temp/cpu0")).await);
    assert_eq!(mapper.backend().calls(MapperMethod::GetObject), 2);
}

// ============================================================================
// 4. Typed property reads through a trait object
// ============================================================================

#[tokio::test]
async fn test_typed_property_via_dyn_backend() {
    let mapper = setup_sensors();
    let db = mapper.backend();
    let service = db.config().service.clone();
    db.add_object(&p("/sensors/temp/cpu0"), &service, &[SENSOR]);
    db.set_property(&p("/sensors/temp/cpu0"), SENSOR, "Value", Value::Int64(42))
        .unwrap();

    let backend: &dyn MapperBackend = db;
    let reading: i64 = query::get_property(backend, &p("/sensors/temp/cpu0"), SENSOR, "Value")
        .await
        .unwrap();
    assert_eq!(reading, 42);
}
