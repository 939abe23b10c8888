//! Validation engine: evaluate every registered rule and collect the
//! violations. Violations are data, never errors — callers decide what
//! to do with them.

use serde_json::Value;

use crate::rules::Violation;
use crate::Entity;

pub trait Validate: Entity {
    /// Evaluate every rule on every property against the current values.
    /// All failures are collected; evaluation never short-circuits.
    fn validation_errors(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        for prop in Self::spec().properties() {
            if prop.rules.is_empty() {
                continue;
            }
            let value = (prop.value)(self).unwrap_or(Value::Null);
            for rule in &prop.rules {
                if !rule.passes(&value) {
                    violations.push(Violation {
                        property: prop.name,
                        rule: rule.kind(),
                        message: rule.message(),
                    });
                }
            }
        }
        violations
    }

    fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }
}

impl<T: Entity> Validate for T {}
