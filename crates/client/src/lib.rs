//! Matlib public client facade.
//!
//! This crate binds model types to REST resources: a [`ResourceSpec`]
//! per type, a backend trait with a defined priority (registered custom
//! backend, else the generic HTTP fallback), and the [`ResourceClient`]
//! that callers hold.

#![forbid(unsafe_code)]

pub mod backend;
pub mod client;
pub mod models;
pub mod resource;

pub use backend::{BackendContext, HttpBackend, ResourceBackend};
pub use client::{extract_payload, require_envelope, ClientError, ResourceClient};
pub use resource::{substitute_id, Operation, PathOverride, Resource, ResourceSpec};

// Everything a model definition needs in one import.
pub mod prelude {
    pub use crate::resource::{Operation, PathOverride, Resource, ResourceSpec};
    pub use matlib_core::prelude::*;
    pub use matlib_schema::prelude::*;
}
