//! The resource client: resolves a backend per model type and runs CRUD
//! operations through the transformation engine.

use std::any::TypeId;
use std::sync::Arc;

use matlib_core::{Collection, Keyed, Strategy};
use matlib_http::error::body_message;
use matlib_http::{Http, HttpError};
use matlib_persist::CacheStore;
use matlib_schema::Transform;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::debug;

use crate::backend::{BackendContext, HttpBackend, ResourceBackend};
use crate::resource::{Operation, Resource};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] HttpError),
    /// A 2xx response whose body lacks the expected `data` envelope.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("operation {0} is not enabled for this resource")]
    Unsupported(Operation),
    /// The instance has no primary key yet (named for diagnostics).
    #[error("missing primary key `{0}`")]
    MissingKey(&'static str),
}

/// Accept both envelope forms transparently: `{"data": ...}` or a bare
/// payload.
pub fn extract_payload(value: Value) -> Value {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Strict envelope form for single-record operations: the body must be an
/// object carrying `data`; anything else is an invalid response, with any
/// server-supplied message preserved.
pub fn require_envelope(body: Option<Value>) -> Result<Value, ClientError> {
    match body {
        Some(Value::Object(mut map)) => match map.remove("data") {
            Some(data) => Ok(data),
            None => {
                let message = body_message(&Value::Object(map))
                    .unwrap_or_else(|| "missing data envelope".to_string());
                Err(ClientError::InvalidResponse(message))
            }
        },
        other => {
            let message = other
                .as_ref()
                .and_then(body_message)
                .unwrap_or_else(|| "missing data envelope".to_string());
            Err(ClientError::InvalidResponse(message))
        }
    }
}

/// Holds the HTTP layer, the ETag cache, and the per-type backend
/// registry. Construct one at the composition root and share it.
pub struct ResourceClient {
    http: Arc<Http>,
    cache: Arc<dyn CacheStore>,
    backends: FxHashMap<TypeId, Box<dyn std::any::Any + Send + Sync>>,
}

impl ResourceClient {
    pub fn new(http: Arc<Http>, cache: Arc<dyn CacheStore>) -> Self {
        Self { http, cache, backends: FxHashMap::default() }
    }

    pub fn http(&self) -> &Http {
        &self.http
    }

    pub fn cache(&self) -> &dyn CacheStore {
        self.cache.as_ref()
    }

    /// Register a custom backend for `M`. The first registration wins;
    /// later ones are ignored, so manual overrides stay stable.
    pub fn with_backend<M: Resource>(mut self, backend: Arc<dyn ResourceBackend<M>>) -> Self {
        self.backends
            .entry(TypeId::of::<M>())
            .or_insert_with(|| Box::new(backend));
        self
    }

    fn backend_for<M: Resource>(&self) -> Arc<dyn ResourceBackend<M>> {
        if let Some(entry) = self.backends.get(&TypeId::of::<M>()) {
            if let Some(backend) = entry.downcast_ref::<Arc<dyn ResourceBackend<M>>>() {
                return Arc::clone(backend);
            }
        }
        Arc::new(HttpBackend::<M>::new())
    }

    fn context(&self) -> BackendContext<'_> {
        BackendContext { http: &self.http, cache: self.cache.as_ref() }
    }

    fn ensure<M: Resource>(operation: Operation) -> Result<(), ClientError> {
        if M::resource().allows(operation) {
            Ok(())
        } else {
            Err(ClientError::Unsupported(operation))
        }
    }

    fn key_of<M: Resource>(model: &M) -> Result<i64, ClientError> {
        model.id().ok_or(ClientError::MissingKey(M::resource().key))
    }

    /// Fetch the whole collection, hydrated via the api_response strategy.
    pub async fn fetch_all<M: Resource>(&self) -> Result<Collection<M>, ClientError> {
        Self::ensure::<M>(Operation::FetchAll)?;
        let raw = self.backend_for::<M>().fetch_all(&self.context()).await?;
        debug!(resource = M::resource().path, count = raw.len(), "fetched collection");
        Ok(M::collect_from(Strategy::ApiResponse, &raw))
    }

    pub async fn fetch_one<M: Resource>(&self, id: i64) -> Result<M, ClientError> {
        Self::ensure::<M>(Operation::FetchOne)?;
        let raw = self.backend_for::<M>().fetch_one(&self.context(), id).await?;
        Ok(M::from_payload(Strategy::ApiResponse, &raw))
    }

    /// POST a new record serialized via the api_request strategy; the
    /// server's response (with its assigned key) is hydrated back.
    pub async fn create<M: Resource>(&self, model: &M) -> Result<M, ClientError> {
        Self::ensure::<M>(Operation::Create)?;
        let payload = model.apply_to(Strategy::ApiRequest);
        let raw = self.backend_for::<M>().create(&self.context(), payload).await?;
        Ok(M::from_payload(Strategy::ApiResponse, &raw))
    }

    pub async fn update<M: Resource>(&self, model: &M) -> Result<M, ClientError> {
        Self::ensure::<M>(Operation::Update)?;
        let id = Self::key_of(model)?;
        let payload = model.apply_to(Strategy::ApiRequest);
        let raw = self.backend_for::<M>().update(&self.context(), id, payload).await?;
        Ok(M::from_payload(Strategy::ApiResponse, &raw))
    }

    pub async fn destroy<M: Resource>(&self, model: &M) -> Result<(), ClientError> {
        Self::ensure::<M>(Operation::Destroy)?;
        let id = Self::key_of(model)?;
        self.backend_for::<M>().destroy(&self.context(), id).await
    }

    /// Drop the cached collection response for `M`, forcing the next
    /// fetch_all to hit the server unconditionally.
    pub fn invalidate<M: Resource>(&self) -> Result<(), ClientError> {
        let path = M::resource().path_for(Operation::FetchAll, None);
        let url = self.http.resolve_url(&path);
        if let Err(err) = self.cache.invalidate(&url) {
            debug!(%url, %err, "cache invalidation failed");
        }
        Ok(())
    }
}
