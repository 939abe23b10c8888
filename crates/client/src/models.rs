//! Reference model: the measurement unit from the materials library.
//!
//! Kept as the canonical exercise vehicle for the engine; the wider ERP
//! catalog (materials, warehouses, standards) is out of scope here and
//! follows the same pattern.

use std::sync::OnceLock;

use matlib_core::{Keyed, Strategy};
use matlib_schema::{Entity, EntitySpec, FieldSpec, InputType, PropertySpec, Rule, ToRule};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::resource::{Resource, ResourceSpec};

/// A measurement unit: stored values are kept in micro units server-side;
/// `coefficient` scales them for display.
#[derive(Debug, Clone)]
pub struct Unit {
    uuid: Uuid,
    pub id: Option<i64>,
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    pub coefficient: f64,
}

impl Unit {
    pub fn new() -> Self {
        <Self as Entity>::blank()
    }

    /// Full name with the short label, e.g. `Kilogram (kg)`.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.label)
    }
}

impl Default for Unit {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyed for Unit {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Entity for Unit {
    fn spec() -> &'static EntitySpec<Self> {
        static SPEC: OnceLock<EntitySpec<Unit>> = OnceLock::new();
        SPEC.get_or_init(|| {
            EntitySpec::builder()
                .property(
                    PropertySpec::mapped(
                        "id",
                        |m: &Unit| m.id.map(Value::from),
                        |m, v| m.id = v.as_i64(),
                    )
                    .to(Strategy::Export, ToRule::Path("id")),
                )
                .property(
                    PropertySpec::mapped(
                        "name",
                        |m: &Unit| Some(json!(m.name)),
                        |m, v| {
                            if let Some(s) = v.as_str() {
                                m.name = s.to_string();
                            }
                        },
                    )
                    .field(
                        FieldSpec::new()
                            .label("Name")
                            .input(InputType::Text)
                            .placeholder("Full unit name")
                            .required(),
                    )
                    .rule(Rule::max_length(255))
                    .to(Strategy::Export, ToRule::Path("name")),
                )
                .property(
                    PropertySpec::mapped(
                        "label",
                        |m: &Unit| Some(json!(m.label)),
                        |m, v| {
                            if let Some(s) = v.as_str() {
                                m.label = s.to_string();
                            }
                        },
                    )
                    .field(
                        FieldSpec::new()
                            .label("Short name")
                            .input(InputType::Text)
                            .placeholder("Short form shown next to values")
                            .required(),
                    )
                    .rule(Rule::max_length(16))
                    .to(Strategy::Export, ToRule::Path("label")),
                )
                .property(
                    PropertySpec::mapped(
                        "description",
                        |m: &Unit| m.description.clone().map(Value::from),
                        |m, v| m.description = v.as_str().map(String::from),
                    )
                    .field(
                        FieldSpec::new()
                            .label("Description")
                            .input(InputType::Text)
                            .placeholder("Optional description"),
                    )
                    .to(Strategy::Export, ToRule::Path("description")),
                )
                .property(
                    PropertySpec::mapped(
                        "coefficient",
                        |m: &Unit| Some(json!(m.coefficient)),
                        |m, v| {
                            if let Some(n) = v.as_f64() {
                                m.coefficient = n;
                            }
                        },
                    )
                    .field(
                        FieldSpec::new()
                            .label("Base value coefficient")
                            .input(InputType::Number)
                            .description(
                                "Stored values are in micro units; the coefficient \
                                 scales them for display.",
                            )
                            .required()
                            .display(|v| match v.as_f64() {
                                Some(n) => format!("{}", (n * 10_000.0).round() / 10_000.0),
                                None => v.to_string(),
                            }),
                    )
                    .rule(Rule::unsigned())
                    .to(Strategy::Export, ToRule::Path("coefficient")),
                )
                .property(
                    // Derived, export-only: never hydrated, never sent back.
                    PropertySpec::new(
                        "display_name",
                        |m: &Unit| Some(json!(m.display_name())),
                        |_, _| {},
                    )
                    .to(Strategy::Export, ToRule::Path("display_name")),
                )
                .build()
        })
    }

    fn blank() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            id: None,
            name: String::new(),
            label: String::new(),
            description: None,
            coefficient: 1.0,
        }
    }
}

impl Resource for Unit {
    fn resource() -> &'static ResourceSpec {
        static SPEC: OnceLock<ResourceSpec> = OnceLock::new();
        SPEC.get_or_init(|| ResourceSpec::new("/library/materials/units", "id"))
    }
}
