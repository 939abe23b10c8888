//! Declarative model metadata: per-type specification tables carrying
//! field presentation hints, transformation mappings, and validation
//! rules, plus the engines that evaluate them.
//!
//! A model type declares its spec once, in a static initializer:
//!
//! ```ignore
//! impl Entity for Unit {
//!     fn spec() -> &'static EntitySpec<Self> {
//!         static SPEC: OnceLock<EntitySpec<Unit>> = OnceLock::new();
//!         SPEC.get_or_init(|| {
//!             EntitySpec::builder()
//!                 .property(
//!                     PropertySpec::mapped(
//!                         "name",
//!                         |m: &Unit| Some(json!(m.name)),
//!                         |m, v| { if let Some(s) = v.as_str() { m.name = s.into() } },
//!                     )
//!                     .field(FieldSpec::new().label("Name").required())
//!                 )
//!                 .build()
//!         })
//!     }
//!     ...
//! }
//! ```

#![forbid(unsafe_code)]

pub mod field;
pub mod fields;
pub mod rules;
pub mod spec;
pub mod transform;
pub mod validate;

pub use field::{FieldSpec, InputType, OptionsSource};
pub use fields::Fields;
pub use rules::{Rule, RuleKind, Violation};
pub use spec::{EntitySpec, EntitySpecBuilder, FromRule, PropertySpec, ToRule};
pub use transform::Transform;
pub use validate::Validate;

use matlib_core::Keyed;

/// A model type with an attached specification table.
///
/// `blank()` constructs a fresh instance with a new uuid; the spec is
/// built once per type and shared by every instance.
pub trait Entity: Keyed + Sized + 'static {
    fn spec() -> &'static EntitySpec<Self>;
    fn blank() -> Self;
}

pub mod prelude {
    pub use super::field::{FieldSpec, InputType, OptionsSource};
    pub use super::rules::{Rule, RuleKind, Violation};
    pub use super::spec::{EntitySpec, FromRule, PropertySpec, ToRule};
    pub use super::{Entity, Fields, Transform, Validate};
}
