//! Field presentation metadata: everything a form or table needs to
//! render a property without knowing the model type.

use matlib_core::Choice;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Text,
    TextArea,
    LongText,
    Number,
    Boolean,
    Select,
    MultiSelect,
    Date,
    DateTime,
    Checkbox,
    Radio,
}

/// Where a select field's choices come from: a fixed list, or a resolver
/// invoked with the current instance (context-dependent options, e.g. a
/// dropdown filtered by the instance's type).
pub enum OptionsSource<M> {
    Static(Vec<Choice>),
    Resolver(fn(&M) -> Vec<Choice>),
}

/// Presentation hints for one property. `display` and `filter` are
/// optional formatting hooks; accessors fall back to the value's string
/// form and the raw value respectively.
pub struct FieldSpec<M> {
    pub label: Option<&'static str>,
    pub input: Option<InputType>,
    pub placeholder: Option<&'static str>,
    pub description: Option<&'static str>,
    pub hidden: bool,
    pub multiple: bool,
    pub editable: bool,
    pub required: bool,
    pub options: Option<OptionsSource<M>>,
    pub display: Option<fn(&Value) -> String>,
    pub filter: Option<fn(&Value) -> Value>,
}

impl<M> Default for FieldSpec<M> {
    fn default() -> Self {
        Self {
            label: None,
            input: None,
            placeholder: None,
            description: None,
            hidden: false,
            multiple: false,
            editable: true,
            required: false,
            options: None,
            display: None,
            filter: None,
        }
    }
}

impl<M> FieldSpec<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn input(mut self, input: InputType) -> Self {
        self.input = Some(input);
        self
    }

    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    /// Shortcut folded into the property's rule list at build time.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn choices(mut self, choices: Vec<Choice>) -> Self {
        self.options = Some(OptionsSource::Static(choices));
        self
    }

    pub fn choices_with(mut self, resolver: fn(&M) -> Vec<Choice>) -> Self {
        self.options = Some(OptionsSource::Resolver(resolver));
        self
    }

    pub fn display(mut self, display: fn(&Value) -> String) -> Self {
        self.display = Some(display);
        self
    }

    pub fn filter(mut self, filter: fn(&Value) -> Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Resolve the option list for an instance; an absent source yields an
    /// empty list.
    pub fn resolve_options(&self, instance: &M) -> Vec<Choice> {
        match &self.options {
            Some(OptionsSource::Static(choices)) => choices.clone(),
            Some(OptionsSource::Resolver(resolver)) => resolver(instance),
            None => Vec::new(),
        }
    }

    /// Static form: only a fixed list can be resolved without an instance.
    pub fn static_options(&self) -> Vec<Choice> {
        match &self.options {
            Some(OptionsSource::Static(choices)) => choices.clone(),
            _ => Vec::new(),
        }
    }

    /// Format a value for display, falling back to its string form.
    pub fn display_value(&self, value: &Value) -> String {
        if let Some(display) = self.display {
            return display(value);
        }
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Value used for filtering, falling back to the raw value.
    pub fn filter_value(&self, value: &Value) -> Value {
        match self.filter {
            Some(filter) => filter(value),
            None => value.clone(),
        }
    }
}

impl<M> std::fmt::Debug for FieldSpec<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("label", &self.label)
            .field("input", &self.input)
            .field("hidden", &self.hidden)
            .field("editable", &self.editable)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}
