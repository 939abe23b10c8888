//! Resource backends.
//!
//! A backend turns resource operations into raw payloads (post-envelope
//! JSON); the client layer owns hydration. The generic [`HttpBackend`]
//! is the fallback every type gets; a custom backend registered on the
//! client takes priority.

use async_trait::async_trait;
use matlib_http::Http;
use matlib_persist::CacheStore;
use serde_json::Value;

use crate::client::{extract_payload, require_envelope, ClientError};
use crate::resource::{Operation, Resource};

/// Collaborators handed to a backend per call.
pub struct BackendContext<'a> {
    pub http: &'a Http,
    pub cache: &'a dyn CacheStore,
}

#[async_trait]
pub trait ResourceBackend<M: Resource>: Send + Sync {
    async fn fetch_all(&self, ctx: &BackendContext<'_>) -> Result<Vec<Value>, ClientError>;
    async fn fetch_one(&self, ctx: &BackendContext<'_>, id: i64) -> Result<Value, ClientError>;
    async fn create(&self, ctx: &BackendContext<'_>, payload: Value) -> Result<Value, ClientError>;
    async fn update(
        &self,
        ctx: &BackendContext<'_>,
        id: i64,
        payload: Value,
    ) -> Result<Value, ClientError>;
    async fn destroy(&self, ctx: &BackendContext<'_>, id: i64) -> Result<(), ClientError>;
}

/// Generic HTTP fallback: collection GETs run through the ETag cache,
/// everything else is a plain request with the envelope contract.
pub struct HttpBackend<M> {
    _marker: std::marker::PhantomData<fn() -> M>,
}

impl<M> HttpBackend<M> {
    pub fn new() -> Self {
        Self { _marker: std::marker::PhantomData }
    }
}

impl<M> Default for HttpBackend<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<M: Resource> ResourceBackend<M> for HttpBackend<M> {
    async fn fetch_all(&self, ctx: &BackendContext<'_>) -> Result<Vec<Value>, ClientError> {
        let path = M::resource().path_for(Operation::FetchAll, None);
        let body = ctx.http.get_cached(&path, &[], ctx.cache).await?;
        let payload = extract_payload(body);
        Ok(payload.as_array().cloned().unwrap_or_default())
    }

    async fn fetch_one(&self, ctx: &BackendContext<'_>, id: i64) -> Result<Value, ClientError> {
        let path = M::resource().path_for(Operation::FetchOne, Some(id));
        let result = ctx.http.request().auth().get(&path, &[]).await?;
        require_envelope(result.data)
    }

    async fn create(&self, ctx: &BackendContext<'_>, payload: Value) -> Result<Value, ClientError> {
        let path = M::resource().path_for(Operation::Create, None);
        let result = ctx.http.request().auth().post(&path, Some(&payload), &[]).await?;
        require_envelope(result.data)
    }

    async fn update(
        &self,
        ctx: &BackendContext<'_>,
        id: i64,
        payload: Value,
    ) -> Result<Value, ClientError> {
        let path = M::resource().path_for(Operation::Update, Some(id));
        let result = ctx.http.request().auth().put(&path, Some(&payload), &[]).await?;
        require_envelope(result.data)
    }

    async fn destroy(&self, ctx: &BackendContext<'_>, id: i64) -> Result<(), ClientError> {
        let path = M::resource().path_for(Operation::Destroy, Some(id));
        ctx.http.request().auth().delete(&path, &[]).await?;
        Ok(())
    }
}
