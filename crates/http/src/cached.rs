//! ETag-aware cached GET.
//!
//! The cache is an optimization, never a correctness requirement: read
//! and write failures are logged at debug and otherwise ignored.

use matlib_persist::{CacheEntry, CacheStore};
use metrics::counter;
use serde_json::Value;
use tracing::debug;

use crate::client::{Http, HttpResult};
use crate::error::HttpError;

impl Http {
    /// Conditional GET through the cache: supply the stored ETag as
    /// If-None-Match, serve the cached payload on 304 (entry untouched),
    /// and persist {etag, data} on a 200 carrying a new tag.
    pub async fn get_cached(
        &self,
        path: &str,
        params: &[(&str, &str)],
        cache: &dyn CacheStore,
    ) -> Result<Value, HttpError> {
        let key = cache_key(self.resolve_url(path), params);
        let cached = cache.get(&key).unwrap_or_else(|err| {
            debug!(%key, %err, "cache read failed");
            None
        });
        let previous = cached.as_ref().map(|entry| entry.etag.clone());
        let result = self.request().auth().with_etag(previous).get(path, params).await?;
        Ok(reconcile(&key, result, cached, cache))
    }
}

/// Apply the cached-GET contract to a normalized response.
pub(crate) fn reconcile(
    key: &str,
    result: HttpResult,
    cached: Option<CacheEntry>,
    cache: &dyn CacheStore,
) -> Value {
    if result.not_modified {
        counter!("http_cache_hit_total", 1u64);
        return cached.map(|entry| entry.data).unwrap_or(Value::Null);
    }
    counter!("http_cache_miss_total", 1u64);
    let data = result.data.unwrap_or(Value::Null);
    if let Some(etag) = &result.etag {
        if let Err(err) = cache.put(key, etag, &data) {
            debug!(%key, %err, "cache write failed");
        }
    }
    data
}

fn cache_key(url: String, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return url;
    }
    let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{}?{}", url, query.join("&"))
}
