//! Shared HTTP client and fluent request builder.
//!
//! One cookie-holding `reqwest::Client` carries the session; a second
//! bare client serves `anonymous()` requests. The anti-forgery token is
//! scraped from the `XSRF-TOKEN` cookie and mirrored into the
//! `X-XSRF-TOKEN` header on non-GET requests; a 419 triggers one cookie
//! refresh and one replay of the original request.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::header::SET_COOKIE;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::error::HttpError;

const XSRF_COOKIE: &str = "XSRF-TOKEN";
const XSRF_HEADER: &str = "X-XSRF-TOKEN";

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub timeout: Duration,
    /// Path fetched to refresh the anti-forgery cookie after a 419.
    pub csrf_path: String,
}

impl Config {
    pub fn from_env() -> Self {
        let base_url = std::env::var("MATLIB_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000/api".to_string());
        let timeout = std::env::var("MATLIB_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(100));
        let csrf_path = std::env::var("MATLIB_CSRF_PATH")
            .unwrap_or_else(|_| "/sanctum/csrf-cookie".to_string());
        Self { base_url, timeout, csrf_path }
    }
}

/// Normalized response: payload (absent on 304 and empty bodies), status,
/// lowercase headers, the response ETag, and the not-modified flag.
#[derive(Debug, Clone)]
pub struct HttpResult {
    pub data: Option<Value>,
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub etag: Option<String>,
    pub not_modified: bool,
}

pub struct Http {
    cookied: reqwest::Client,
    bare: reqwest::Client,
    config: Config,
    xsrf: RwLock<Option<String>>,
    on_unauthorized: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl Http {
    pub fn new(config: Config) -> Result<Self, HttpError> {
        let cookied = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()?;
        let bare = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { cookied, bare, config, xsrf: RwLock::new(None), on_unauthorized: None })
    }

    /// Invoked on any 401 before the error propagates; navigation is the
    /// caller's business, not the SDK's.
    pub fn with_unauthorized_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Some(Arc::new(hook));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Absolute URLs pass through; everything else is joined onto the
    /// configured base.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.config.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    pub fn request(&self) -> RequestBuilder<'_> {
        RequestBuilder {
            http: self,
            credentials: true,
            use_etag: false,
            if_none_match: None,
            headers: Vec::new(),
        }
    }

    pub(crate) fn client_for(&self, credentials: bool) -> &reqwest::Client {
        if credentials {
            &self.cookied
        } else {
            &self.bare
        }
    }

    pub(crate) fn xsrf_token(&self) -> Option<String> {
        self.xsrf.read().unwrap().clone()
    }

    /// Capture a fresh XSRF-TOKEN cookie from response headers.
    pub(crate) fn remember_xsrf(&self, headers: &reqwest::header::HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let Some(rest) = raw.strip_prefix(&format!("{XSRF_COOKIE}=")) else { continue };
            let token = rest.split(';').next().unwrap_or("");
            if !token.is_empty() {
                *self.xsrf.write().unwrap() = Some(percent_decode(token));
            }
        }
    }

    async fn refresh_xsrf(&self) -> Result<(), HttpError> {
        let url = self.resolve_url(&self.config.csrf_path);
        debug!(%url, "refreshing anti-forgery cookie");
        let response = self.cookied.get(&url).send().await?;
        self.remember_xsrf(response.headers());
        Ok(())
    }
}

pub struct RequestBuilder<'a> {
    http: &'a Http,
    credentials: bool,
    use_etag: bool,
    if_none_match: Option<String>,
    headers: Vec<(String, String)>,
}

impl<'a> RequestBuilder<'a> {
    /// Include the session cookie (the default).
    pub fn auth(mut self) -> Self {
        self.credentials = true;
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.credentials = false;
        self
    }

    /// Arm conditional-GET semantics: send If-None-Match when a previous
    /// tag is known and accept 304 as success.
    pub fn with_etag(mut self, previous: Option<String>) -> Self {
        self.use_etag = true;
        self.if_none_match = previous;
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub async fn get(self, path: &str, params: &[(&str, &str)]) -> Result<HttpResult, HttpError> {
        self.execute(Method::GET, path, None, params).await
    }

    pub async fn post(
        self,
        path: &str,
        body: Option<&Value>,
        params: &[(&str, &str)],
    ) -> Result<HttpResult, HttpError> {
        self.execute(Method::POST, path, body, params).await
    }

    pub async fn put(
        self,
        path: &str,
        body: Option<&Value>,
        params: &[(&str, &str)],
    ) -> Result<HttpResult, HttpError> {
        self.execute(Method::PUT, path, body, params).await
    }

    pub async fn patch(
        self,
        path: &str,
        body: Option<&Value>,
        params: &[(&str, &str)],
    ) -> Result<HttpResult, HttpError> {
        self.execute(Method::PATCH, path, body, params).await
    }

    pub async fn delete(
        self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<HttpResult, HttpError> {
        self.execute(Method::DELETE, path, None, params).await
    }

    async fn execute(
        self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        params: &[(&str, &str)],
    ) -> Result<HttpResult, HttpError> {
        let url = self.http.resolve_url(path);
        let mut replayed = false;
        loop {
            let client = self.http.client_for(self.credentials);
            let mut req = client.request(method.clone(), &url);
            if !params.is_empty() {
                req = req.query(params);
            }
            for (name, value) in &self.headers {
                req = req.header(name.as_str(), value.as_str());
            }
            if self.use_etag {
                if let Some(tag) = &self.if_none_match {
                    req = req.header(reqwest::header::IF_NONE_MATCH, tag.as_str());
                }
            }
            if method != Method::GET && self.credentials {
                if let Some(token) = self.http.xsrf_token() {
                    req = req.header(XSRF_HEADER, token);
                }
            }
            if let Some(body) = body {
                req = req.json(body);
            }

            let response = req.send().await?;
            self.http.remember_xsrf(response.headers());
            let status = response.status();
            let headers = lower_headers(response.headers());
            let etag = headers.get("etag").cloned();

            let accepted =
                status.is_success() || (self.use_etag && status == StatusCode::NOT_MODIFIED);
            if accepted {
                let not_modified = status == StatusCode::NOT_MODIFIED;
                let data = if not_modified { None } else { read_body(response).await? };
                return Ok(HttpResult {
                    data,
                    status: status.as_u16(),
                    headers,
                    etag,
                    not_modified,
                });
            }

            let body_value = read_body(response).await.unwrap_or(None);
            if status.as_u16() == 419 && !replayed {
                replayed = true;
                debug!(%url, "anti-forgery token mismatch; replaying once");
                if self.http.refresh_xsrf().await.is_ok() {
                    continue;
                }
            }
            if status == StatusCode::UNAUTHORIZED {
                if let Some(hook) = &self.http.on_unauthorized {
                    hook();
                }
            }
            return Err(HttpError::status(
                status.as_u16(),
                headers,
                body_value,
                url,
                method.to_string(),
            ));
        }
    }
}

async fn read_body(response: reqwest::Response) -> Result<Option<Value>, HttpError> {
    let text = response.text().await?;
    if text.is_empty() {
        return Ok(None);
    }
    // Non-JSON bodies come back as their raw text.
    Ok(Some(serde_json::from_str(&text).unwrap_or(Value::String(text))))
}

fn lower_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}

/// Minimal %XX decoder for cookie values; malformed escapes pass through.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(byte) = u8::from_str_radix(&input[i + 1..i + 3], 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).to_string()
}
