//! Field registry accessors: enumerate a type's presentation metadata
//! and resolve per-instance option lists, display values, and filter
//! values with the documented fallbacks.

use matlib_core::Choice;
use serde_json::Value;

use crate::field::FieldSpec;
use crate::Entity;

pub trait Fields: Entity {
    /// Every property with presentation metadata, in registration order.
    fn fields() -> Vec<(&'static str, &'static FieldSpec<Self>)> {
        Self::spec()
            .properties()
            .iter()
            .filter_map(|p| p.field.as_ref().map(|f| (p.name, f)))
            .collect()
    }

    fn field(name: &str) -> Option<&'static FieldSpec<Self>> {
        Self::spec().field(name)
    }

    /// Resolve a field's option list with the instance as context.
    /// Unknown fields yield an empty list.
    fn field_options(&self, name: &str) -> Vec<Choice> {
        Self::field(name).map(|f| f.resolve_options(self)).unwrap_or_default()
    }

    /// Static form: only fixed option lists resolve without an instance.
    fn static_field_options(name: &str) -> Vec<Choice> {
        Self::field(name).map(|f| f.static_options()).unwrap_or_default()
    }

    /// Fields default to editable when no metadata says otherwise.
    fn is_field_editable(name: &str) -> bool {
        Self::field(name).map(|f| f.editable).unwrap_or(true)
    }

    /// Format a value for display; falls back to the value's string form.
    fn field_display_value(name: &str, value: &Value) -> String {
        match Self::field(name) {
            Some(field) => field.display_value(value),
            None => match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }
    }

    /// Value used for filtering; falls back to the raw value.
    fn field_filter_value(name: &str, value: &Value) -> Value {
        match Self::field(name) {
            Some(field) => field.filter_value(value),
            None => value.clone(),
        }
    }

    /// Per-property help texts, in registration order.
    fn descriptions() -> Vec<(&'static str, &'static str)> {
        Self::spec()
            .properties()
            .iter()
            .filter_map(|p| {
                p.field.as_ref().and_then(|f| f.description).map(|d| (p.name, d))
            })
            .collect()
    }
}

impl<T: Entity> Fields for T {}
