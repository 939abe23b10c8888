#![forbid(unsafe_code)]

//! End-to-end CRUD flow against a canned backend: payloads go through
//! the real transformation engine and collection wrapper; only the wire
//! is faked.

use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use matlib_client::models::Unit;
use matlib_client::{
    BackendContext, ClientError, Operation, Resource, ResourceBackend, ResourceClient,
    ResourceSpec,
};
use matlib_core::Keyed;
use matlib_http::{Config, Http};
use matlib_persist::SqliteCache;
use matlib_schema::{Entity, EntitySpec, PropertySpec};
use serde_json::{json, Value};
use uuid::Uuid;

fn client() -> (tempfile::TempDir, ResourceClient) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db").to_string_lossy().to_string();
    let http = Arc::new(
        Http::new(Config {
            base_url: "http://localhost:8000/api".to_string(),
            timeout: std::time::Duration::from_secs(5),
            csrf_path: "/sanctum/csrf-cookie".to_string(),
        })
        .unwrap(),
    );
    let cache = Arc::new(SqliteCache::open(&path).unwrap());
    (dir, ResourceClient::new(http, cache))
}

/// Canned wire: records create/update payloads, serves fixed responses.
#[derive(Default)]
struct CannedUnits {
    last_payload: Mutex<Option<Value>>,
}

#[async_trait]
impl ResourceBackend<Unit> for CannedUnits {
    async fn fetch_all(&self, _ctx: &BackendContext<'_>) -> Result<Vec<Value>, ClientError> {
        Ok(vec![json!({"id": 1, "label": "kg", "name": "Kilogram", "coefficient": 1000})])
    }

    async fn fetch_one(&self, _ctx: &BackendContext<'_>, id: i64) -> Result<Value, ClientError> {
        if id == 1 {
            Ok(json!({"id": 1, "label": "kg", "name": "Kilogram", "coefficient": 1000}))
        } else {
            Err(ClientError::InvalidResponse("unit not found".to_string()))
        }
    }

    async fn create(
        &self,
        _ctx: &BackendContext<'_>,
        payload: Value,
    ) -> Result<Value, ClientError> {
        *self.last_payload.lock().unwrap() = Some(payload.clone());
        let mut stored = payload;
        stored["id"] = json!(7);
        Ok(stored)
    }

    async fn update(
        &self,
        _ctx: &BackendContext<'_>,
        id: i64,
        payload: Value,
    ) -> Result<Value, ClientError> {
        *self.last_payload.lock().unwrap() = Some(payload.clone());
        let mut stored = payload;
        stored["id"] = json!(id);
        Ok(stored)
    }

    async fn destroy(&self, _ctx: &BackendContext<'_>, _id: i64) -> Result<(), ClientError> {
        Ok(())
    }
}

#[tokio::test]
async fn fetch_all_hydrates_a_collection() {
    let (_dir, client) = client();
    let client = client.with_backend::<Unit>(Arc::new(CannedUnits::default()));
    let units = client.fetch_all::<Unit>().await.unwrap();
    assert_eq!(units.count(), 1);
    let unit = units.first().unwrap();
    assert_eq!(unit.display_name(), "Kilogram (kg)");
    assert_eq!(unit.id, Some(1));
    assert_eq!(unit.coefficient, 1000.0);
}

#[tokio::test]
async fn create_serializes_and_rehydrates() {
    let (_dir, client) = client();
    let backend = Arc::new(CannedUnits::default());
    let client = client.with_backend::<Unit>(backend.clone());

    let mut draft = Unit::new();
    draft.name = "Gram".to_string();
    draft.label = "g".to_string();
    let stored = client.create(&draft).await.unwrap();

    assert_eq!(stored.id, Some(7));
    assert_eq!(stored.name, "Gram");
    // A fresh identity for the server-backed instance.
    assert_ne!(stored.uuid(), draft.uuid());

    let sent = backend.last_payload.lock().unwrap().clone().unwrap();
    // Unset fields are omitted from the request payload.
    assert!(sent.get("id").is_none());
    assert!(sent.get("description").is_none());
    assert_eq!(sent["name"], json!("Gram"));
}

#[tokio::test]
async fn update_requires_a_primary_key() {
    let (_dir, client) = client();
    let client = client.with_backend::<Unit>(Arc::new(CannedUnits::default()));
    let draft = Unit::new();
    let err = client.update(&draft).await.unwrap_err();
    assert!(matches!(err, ClientError::MissingKey("id")));
}

#[tokio::test]
async fn destroy_round_trips_through_the_backend() {
    let (_dir, client) = client();
    let client = client.with_backend::<Unit>(Arc::new(CannedUnits::default()));
    let mut unit = Unit::new();
    unit.id = Some(3);
    client.destroy(&unit).await.unwrap();
}

/// A read-only resource: destroy is filtered out by the descriptor.
#[derive(Debug, Clone)]
struct Snapshot {
    uuid: Uuid,
    id: Option<i64>,
}

impl Keyed for Snapshot {
    fn uuid(&self) -> Uuid {
        self.uuid
    }
    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Entity for Snapshot {
    fn spec() -> &'static EntitySpec<Self> {
        static SPEC: OnceLock<EntitySpec<Snapshot>> = OnceLock::new();
        SPEC.get_or_init(|| {
            EntitySpec::builder()
                .property(PropertySpec::mapped(
                    "id",
                    |m: &Snapshot| m.id.map(Value::from),
                    |m, v| m.id = v.as_i64(),
                ))
                .build()
        })
    }

    fn blank() -> Self {
        Self { uuid: Uuid::new_v4(), id: None }
    }
}

impl Resource for Snapshot {
    fn resource() -> &'static ResourceSpec {
        static SPEC: OnceLock<ResourceSpec> = OnceLock::new();
        SPEC.get_or_init(|| {
            ResourceSpec::new("/library/snapshots", "id")
                .except([Operation::Destroy, Operation::Update])
        })
    }
}

#[tokio::test]
async fn filtered_operations_are_rejected() {
    let (_dir, client) = client();
    let mut snapshot = Snapshot::blank();
    snapshot.id = Some(1);
    let err = client.destroy(&snapshot).await.unwrap_err();
    assert!(matches!(err, ClientError::Unsupported(Operation::Destroy)));
}
