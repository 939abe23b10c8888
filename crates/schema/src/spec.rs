//! Per-type specification tables.
//!
//! The table is the decorator-free registration surface: one
//! [`PropertySpec`] per property, collected by a builder inside the
//! model's static initializer. Registration is once-per-type and
//! idempotent by construction; repeated `property()` calls for the same
//! name merge rather than duplicate.

use matlib_core::Strategy;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::field::FieldSpec;
use crate::rules::Rule;

/// How a property pulls its value out of an external representation.
pub enum FromRule<M> {
    /// Extract at a dotted path in the source document.
    Path(&'static str),
    /// Invoke with the full source document; `None` leaves the property
    /// untouched.
    Compute(fn(&Value) -> Option<Value>),
    /// Resolve a single object at a path and build one related instance.
    /// The builder fn owns the typed construction and assignment.
    RelatedOne(&'static str, fn(&mut M, &Value, Strategy)),
    /// Resolve an array at a path and build a related collection.
    RelatedMany(&'static str, fn(&mut M, &[Value], Strategy)),
}

/// How a property lands in an outgoing payload.
pub enum ToRule {
    /// Set at a dotted destination path.
    Path(&'static str),
    /// Serialize with a function; stored under the property name.
    Serialize(fn(&Value) -> Value),
}

/// One property's complete registration: typed accessors plus the
/// transformation, presentation, and validation metadata hung off it.
/// Optional hooks are `Option` fields resolved here, once, not probed
/// per call.
pub struct PropertySpec<M> {
    pub name: &'static str,
    /// Current value as JSON; `None` means unset (distinct from null).
    pub value: fn(&M) -> Option<Value>,
    /// Assign from a JSON value; ignores shapes the field can't hold.
    pub assign: fn(&mut M, &Value),
    pub from: Vec<(Strategy, FromRule<M>)>,
    pub to: Vec<(Strategy, ToRule)>,
    pub field: Option<FieldSpec<M>>,
    pub rules: Vec<Rule>,
}

impl<M> PropertySpec<M> {
    pub fn new(
        name: &'static str,
        value: fn(&M) -> Option<Value>,
        assign: fn(&mut M, &Value),
    ) -> Self {
        Self { name, value, assign, from: Vec::new(), to: Vec::new(), field: None, rules: Vec::new() }
    }

    /// Symmetric default mapping: `api_response` reads the property name,
    /// `api_request` writes it back under the same name.
    pub fn mapped(
        name: &'static str,
        value: fn(&M) -> Option<Value>,
        assign: fn(&mut M, &Value),
    ) -> Self {
        Self::new(name, value, assign)
            .from(Strategy::ApiResponse, FromRule::Path(name))
            .to(Strategy::ApiRequest, ToRule::Path(name))
    }

    pub fn from(mut self, strategy: Strategy, rule: FromRule<M>) -> Self {
        self.from.push((strategy, rule));
        self
    }

    pub fn to(mut self, strategy: Strategy, rule: ToRule) -> Self {
        self.to.push((strategy, rule));
        self
    }

    pub fn field(mut self, field: FieldSpec<M>) -> Self {
        self.field = Some(field);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// The first from-rule registered for a strategy, if any.
    pub fn from_rule(&self, strategy: Strategy) -> Option<&FromRule<M>> {
        self.from.iter().find(|(s, _)| *s == strategy).map(|(_, r)| r)
    }

    pub fn to_rule(&self, strategy: Strategy) -> Option<&ToRule> {
        self.to.iter().find(|(s, _)| *s == strategy).map(|(_, r)| r)
    }

    fn merge(&mut self, other: PropertySpec<M>) {
        self.from.extend(other.from);
        self.to.extend(other.to);
        if other.field.is_some() {
            self.field = other.field;
        }
        self.rules.extend(other.rules);
    }
}

/// The full per-type table, built once and shared by every instance.
pub struct EntitySpec<M> {
    properties: Vec<PropertySpec<M>>,
    by_name: FxHashMap<&'static str, usize>,
}

impl<M> EntitySpec<M> {
    pub fn builder() -> EntitySpecBuilder<M> {
        EntitySpecBuilder { properties: Vec::new() }
    }

    pub fn properties(&self) -> &[PropertySpec<M>] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertySpec<M>> {
        self.by_name.get(name).map(|&idx| &self.properties[idx])
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec<M>> {
        self.property(name).and_then(|p| p.field.as_ref())
    }
}

pub struct EntitySpecBuilder<M> {
    properties: Vec<PropertySpec<M>>,
}

impl<M> EntitySpecBuilder<M> {
    /// Register a property. A repeated name merges mappings and rules
    /// into the earlier registration instead of adding a duplicate row.
    pub fn property(mut self, property: PropertySpec<M>) -> Self {
        match self.properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => existing.merge(property),
            None => self.properties.push(property),
        }
        self
    }

    pub fn build(self) -> EntitySpec<M> {
        let mut properties = self.properties;
        // Fold the field-level `required` shortcut into the rule list.
        for prop in &mut properties {
            let wants_required = prop.field.as_ref().map(|f| f.required).unwrap_or(false);
            if wants_required && !prop.rules.iter().any(|r| r.kind() == crate::rules::RuleKind::Required) {
                prop.rules.push(Rule::required());
            }
        }
        let by_name = properties
            .iter()
            .enumerate()
            .map(|(idx, p)| (p.name, idx))
            .collect();
        EntitySpec { properties, by_name }
    }
}
