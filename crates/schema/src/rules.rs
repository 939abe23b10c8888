//! Validation rules and violations.
//!
//! Rules are evaluated independently and all failures are collected.
//! A rule whose value type doesn't match its check passes: `min` on a
//! string is a no-op, `min_length` on a number is a no-op. Callers that
//! want type enforcement declare it separately; this layer preserves the
//! permissive contract.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Required,
    Unsigned,
    Min,
    Max,
    MinLength,
    MaxLength,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::Unsigned => "unsigned",
            RuleKind::Min => "min",
            RuleKind::Max => "max",
            RuleKind::MinLength => "min_length",
            RuleKind::MaxLength => "max_length",
        }
    }
}

#[derive(Debug, Clone)]
enum Check {
    Required,
    Unsigned,
    Min(f64),
    Max(f64),
    MinLength(usize),
    MaxLength(usize),
}

/// A single validation rule: a predicate over one value plus a
/// human-readable message.
#[derive(Debug, Clone)]
pub struct Rule {
    check: Check,
    message: Option<String>,
}

impl Rule {
    pub fn required() -> Self {
        Self { check: Check::Required, message: None }
    }

    pub fn unsigned() -> Self {
        Self { check: Check::Unsigned, message: None }
    }

    pub fn min(n: f64) -> Self {
        Self { check: Check::Min(n), message: None }
    }

    pub fn max(n: f64) -> Self {
        Self { check: Check::Max(n), message: None }
    }

    pub fn min_length(n: usize) -> Self {
        Self { check: Check::MinLength(n), message: None }
    }

    pub fn max_length(n: usize) -> Self {
        Self { check: Check::MaxLength(n), message: None }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn kind(&self) -> RuleKind {
        match self.check {
            Check::Required => RuleKind::Required,
            Check::Unsigned => RuleKind::Unsigned,
            Check::Min(_) => RuleKind::Min,
            Check::Max(_) => RuleKind::Max,
            Check::MinLength(_) => RuleKind::MinLength,
            Check::MaxLength(_) => RuleKind::MaxLength,
        }
    }

    /// Evaluate the rule against a value. `Value::Null` stands in for an
    /// unset property.
    pub fn passes(&self, value: &Value) -> bool {
        match &self.check {
            Check::Required => match value {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            },
            Check::Unsigned => value.as_f64().map(|n| n >= 0.0).unwrap_or(true),
            Check::Min(min) => value.as_f64().map(|n| n >= *min).unwrap_or(true),
            Check::Max(max) => value.as_f64().map(|n| n <= *max).unwrap_or(true),
            Check::MinLength(min) => match value {
                Value::String(s) => s.trim().chars().count() >= *min,
                _ => true,
            },
            Check::MaxLength(max) => match value {
                Value::String(s) => s.trim().chars().count() <= *max,
                _ => true,
            },
        }
    }

    pub fn message(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        match &self.check {
            Check::Required => "Field is required".to_string(),
            Check::Unsigned => "Value must not be negative".to_string(),
            Check::Min(n) => format!("Value must be at least {n}"),
            Check::Max(n) => format!("Value must be at most {n}"),
            Check::MinLength(n) => format!("Must be at least {n} characters"),
            Check::MaxLength(n) => format!("Must be at most {n} characters"),
        }
    }
}

/// One failed rule on one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub property: &'static str,
    pub rule: RuleKind,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_rejects_empty_values() {
        let rule = Rule::required();
        assert!(!rule.passes(&Value::Null));
        assert!(!rule.passes(&json!("   ")));
        assert!(rule.passes(&json!(0)));
        assert!(rule.passes(&json!(false)));
        assert!(rule.passes(&json!("ok")));
    }

    #[test]
    fn min_ignores_non_numeric_values() {
        let rule = Rule::min(5.0);
        assert!(rule.passes(&Value::Null));
        assert!(rule.passes(&json!("abc")));
        assert!(rule.passes(&json!(5)));
        assert!(!rule.passes(&json!(4)));
    }

    #[test]
    fn max_ignores_non_numeric_values() {
        let rule = Rule::max(10.0);
        assert!(rule.passes(&json!({"a": 1})));
        assert!(rule.passes(&json!(10)));
        assert!(!rule.passes(&json!(11)));
    }

    #[test]
    fn unsigned_ignores_non_numeric_values() {
        let rule = Rule::unsigned();
        assert!(rule.passes(&json!("negative")));
        assert!(rule.passes(&Value::Null));
        assert!(rule.passes(&json!(0)));
        assert!(!rule.passes(&json!(-1)));
    }

    #[test]
    fn length_rules_ignore_non_strings() {
        assert!(Rule::min_length(3).passes(&json!(12)));
        assert!(Rule::max_length(3).passes(&json!(true)));
        assert!(Rule::min_length(3).passes(&json!("abc")));
        assert!(!Rule::min_length(3).passes(&json!("ab ")));
        assert!(!Rule::max_length(3).passes(&json!("abcd")));
    }

    #[test]
    fn custom_messages_override_defaults() {
        let rule = Rule::required().with_message("Name it");
        assert_eq!(rule.message(), "Name it");
        assert_eq!(Rule::min(2.0).message(), "Value must be at least 2");
    }
}
