//! Matlib HTTP access layer: fluent request builder over a shared
//! cookie-session client, ETag-aware cached GET, anti-forgery token
//! handling, and a server-push (SSE) subscriber.

#![forbid(unsafe_code)]

pub mod cached;
pub mod client;
pub mod error;
pub mod stream;

pub use client::{Config, Http, HttpResult, RequestBuilder};
pub use error::HttpError;
pub use stream::{CancelHandle, EventStream, StreamBuilder};
