//! Resource descriptors: the immutable {path, key} binding that lets a
//! model type self-serve CRUD operations, plus path resolution.

use matlib_schema::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchAll,
    FetchOne,
    Create,
    Update,
    Destroy,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::FetchAll => "fetch_all",
            Operation::FetchOne => "fetch_one",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Destroy => "destroy",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-operation path override: a fixed template (id substitution still
/// applies) or a builder function.
pub enum PathOverride {
    Fixed(&'static str),
    Build(fn(Option<i64>) -> String),
}

/// Immutable per-type resource binding. Built once in the model's static
/// initializer; read-only afterward.
pub struct ResourceSpec {
    pub path: &'static str,
    /// Primary-key field name, used in diagnostics; the typed accessor is
    /// `Keyed::id`.
    pub key: &'static str,
    only: Option<Vec<Operation>>,
    except: Vec<Operation>,
    overrides: Vec<(Operation, PathOverride)>,
}

impl ResourceSpec {
    pub fn new(path: &'static str, key: &'static str) -> Self {
        Self { path, key, only: None, except: Vec::new(), overrides: Vec::new() }
    }

    /// Restrict the installed operations to this set.
    pub fn only(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.only = Some(operations.into_iter().collect());
        self
    }

    /// Remove operations from the default full set. Ignored when `only`
    /// is present.
    pub fn except(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.except.extend(operations);
        self
    }

    pub fn override_path(mut self, operation: Operation, path: PathOverride) -> Self {
        self.overrides.push((operation, path));
        self
    }

    pub fn allows(&self, operation: Operation) -> bool {
        match &self.only {
            Some(only) => only.contains(&operation),
            None => !self.except.contains(&operation),
        }
    }

    /// Resolve the request path for an operation, honoring overrides and
    /// the id substitution policy.
    pub fn path_for(&self, operation: Operation, id: Option<i64>) -> String {
        let template = self
            .overrides
            .iter()
            .find(|(op, _)| *op == operation)
            .map(|(_, o)| o);
        match template {
            Some(PathOverride::Build(build)) => build(id),
            Some(PathOverride::Fixed(path)) => match id {
                Some(id) => substitute_id(path, id),
                None => (*path).to_string(),
            },
            None => match id {
                Some(id) => substitute_id(self.path, id),
                None => self.path.to_string(),
            },
        }
    }
}

/// A literal `{id}` or `:id` token is replaced; otherwise the id is
/// appended as an extra segment.
pub fn substitute_id(path: &str, id: i64) -> String {
    let id = id.to_string();
    if path.contains("{id}") {
        return path.replace("{id}", &id);
    }
    if path.contains(":id") {
        return path.replace(":id", &id);
    }
    let sep = if path.ends_with('/') { "" } else { "/" };
    format!("{path}{sep}{id}")
}

/// A model type bound to a REST resource.
pub trait Resource: Entity + Send + Sync {
    fn resource() -> &'static ResourceSpec;
}
