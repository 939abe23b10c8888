//! Matlib core types: transformation strategies, dotted-path JSON access,
//! and the ordered collection wrapper returned by fetch-many operations.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod collection;
pub mod paths;

pub use collection::Collection;

/// A named transformation direction selecting which path/function mapping
/// applies when hydrating or serializing a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ApiResponse,
    ApiRequest,
    Form,
    Ui,
    Export,
    Cache,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ApiResponse => "api_response",
            Strategy::ApiRequest => "api_request",
            Strategy::Form => "form",
            Strategy::Ui => "ui",
            Strategy::Export => "export",
            Strategy::Cache => "cache",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity accessors shared by every model instance: a stable `uuid`
/// assigned once at construction and the server-assigned primary key.
pub trait Keyed {
    fn uuid(&self) -> Uuid;
    /// Domain primary key; `None` until the server has assigned one.
    fn id(&self) -> Option<i64>;
}

/// A label/value pair for select inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub value: serde_json::Value,
}

impl Choice {
    pub fn new(label: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self { label: label.into(), value: value.into() }
    }
}

pub mod prelude {
    pub use super::{Choice, Collection, Keyed, Strategy};
}
