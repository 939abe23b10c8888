//! Transformation engine: hydrate a model from an external document and
//! serialize it back, per strategy.

use matlib_core::{paths, Collection, Strategy};
use serde_json::Value;

use crate::spec::{FromRule, ToRule};
use crate::Entity;

pub trait Transform: Entity {
    /// Apply every "from" mapping registered under `strategy`, mutating
    /// in place and returning the receiver for chaining.
    ///
    /// An empty or non-object source is a no-op. A mapping whose path is
    /// missing from the source leaves the property at its prior value.
    fn apply_from(&mut self, strategy: Strategy, source: &Value) -> &mut Self {
        let Some(obj) = source.as_object() else {
            return self;
        };
        if obj.is_empty() {
            return self;
        }
        for prop in Self::spec().properties() {
            match prop.from_rule(strategy) {
                None => continue,
                Some(FromRule::Path(path)) => {
                    if let Some(value) = paths::get(source, path) {
                        (prop.assign)(self, value);
                    }
                }
                Some(FromRule::Compute(extract)) => {
                    if let Some(value) = extract(source) {
                        (prop.assign)(self, &value);
                    }
                }
                Some(FromRule::RelatedOne(path, build)) => {
                    if let Some(value) = paths::get(source, path) {
                        if value.is_object() {
                            build(self, value, strategy);
                        }
                    }
                }
                Some(FromRule::RelatedMany(path, build)) => {
                    if let Some(Value::Array(items)) = paths::get(source, path) {
                        build(self, items, strategy);
                    }
                }
            }
        }
        self
    }

    /// Construct a fresh instance and hydrate it.
    fn from_payload(strategy: Strategy, source: &Value) -> Self {
        let mut instance = Self::blank();
        instance.apply_from(strategy, source);
        instance
    }

    /// Hydrate one instance per element, preserving order.
    fn collect_from(strategy: Strategy, items: &[Value]) -> Collection<Self> {
        items.iter().map(|item| Self::from_payload(strategy, item)).collect()
    }

    /// Walk the "to" map for `strategy` and assemble an outgoing payload.
    /// Unset (`None`) properties are omitted entirely; explicit nulls are
    /// serialized as null.
    fn apply_to(&self, strategy: Strategy) -> Value {
        let mut out = Value::Object(serde_json::Map::new());
        for prop in Self::spec().properties() {
            let Some(rule) = prop.to_rule(strategy) else {
                continue;
            };
            let Some(value) = (prop.value)(self) else {
                continue;
            };
            match rule {
                ToRule::Path(path) => paths::set(&mut out, path, value),
                ToRule::Serialize(serialize) => {
                    out[prop.name] = serialize(&value);
                }
            }
        }
        out
    }

    /// Copy every registered property from `other`, keeping the
    /// receiver's identity.
    fn refresh(&mut self, other: &Self) -> &mut Self {
        for prop in Self::spec().properties() {
            if let Some(value) = (prop.value)(other) {
                (prop.assign)(self, &value);
            }
        }
        self
    }

    /// A fresh instance (new uuid) carrying this one's property values.
    fn clone_with_new_identity(&self) -> Self {
        let mut instance = Self::blank();
        instance.refresh(self);
        instance
    }
}

impl<T: Entity> Transform for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{EntitySpec, PropertySpec};
    use matlib_core::Keyed;
    use serde_json::json;
    use std::sync::OnceLock;
    use uuid::Uuid;

    #[derive(Debug, Clone)]
    struct Tag {
        uuid: Uuid,
        id: Option<i64>,
        name: String,
    }

    impl Keyed for Tag {
        fn uuid(&self) -> Uuid {
            self.uuid
        }
        fn id(&self) -> Option<i64> {
            self.id
        }
    }

    impl Entity for Tag {
        fn spec() -> &'static EntitySpec<Self> {
            static SPEC: OnceLock<EntitySpec<Tag>> = OnceLock::new();
            SPEC.get_or_init(|| {
                EntitySpec::builder()
                    .property(PropertySpec::mapped(
                        "id",
                        |m: &Tag| m.id.map(Value::from),
                        |m, v| m.id = v.as_i64(),
                    ))
                    .property(PropertySpec::mapped(
                        "name",
                        |m: &Tag| Some(json!(m.name)),
                        |m, v| {
                            if let Some(s) = v.as_str() {
                                m.name = s.to_string();
                            }
                        },
                    ))
                    .build()
            })
        }

        fn blank() -> Self {
            Self { uuid: Uuid::new_v4(), id: None, name: String::new() }
        }
    }

    #[derive(Debug, Clone)]
    struct Part {
        uuid: Uuid,
        id: Option<i64>,
        name: String,
        full_name: String,
        note: Option<String>,
        flags: Value,
        tags: Collection<Tag>,
        primary_tag: Option<Tag>,
    }

    impl Keyed for Part {
        fn uuid(&self) -> Uuid {
            self.uuid
        }
        fn id(&self) -> Option<i64> {
            self.id
        }
    }

    impl Entity for Part {
        fn spec() -> &'static EntitySpec<Self> {
            static SPEC: OnceLock<EntitySpec<Part>> = OnceLock::new();
            SPEC.get_or_init(|| {
                EntitySpec::builder()
                    .property(PropertySpec::mapped(
                        "id",
                        |m: &Part| m.id.map(Value::from),
                        |m, v| m.id = v.as_i64(),
                    ))
                    .property(
                        PropertySpec::new(
                            "name",
                            |m: &Part| Some(json!(m.name)),
                            |m, v| {
                                if let Some(s) = v.as_str() {
                                    m.name = s.to_string();
                                }
                            },
                        )
                        .from(Strategy::ApiResponse, FromRule::Path("attributes.name"))
                        .to(Strategy::ApiRequest, ToRule::Path("attributes.name")),
                    )
                    .property(
                        PropertySpec::new(
                            "full_name",
                            |m: &Part| Some(json!(m.full_name)),
                            |m, v| {
                                if let Some(s) = v.as_str() {
                                    m.full_name = s.to_string();
                                }
                            },
                        )
                        .from(
                            Strategy::ApiResponse,
                            FromRule::Compute(|data| {
                                let first = data.get("first")?.as_str()?;
                                let last = data.get("last")?.as_str()?;
                                Some(json!(format!("{first} {last}")))
                            }),
                        ),
                    )
                    .property(
                        PropertySpec::new(
                            "note",
                            |m: &Part| m.note.clone().map(Value::from),
                            |m, v| m.note = v.as_str().map(String::from),
                        )
                        .from(Strategy::ApiResponse, FromRule::Path("note"))
                        .to(Strategy::ApiRequest, ToRule::Path("note")),
                    )
                    .property(
                        PropertySpec::new(
                            "flags",
                            |m: &Part| Some(m.flags.clone()),
                            |m, v| m.flags = v.clone(),
                        )
                        .from(Strategy::ApiResponse, FromRule::Path("flags"))
                        .to(Strategy::ApiRequest, ToRule::Path("flags")),
                    )
                    .property(PropertySpec::new(
                        "tags",
                        |_| None,
                        |_, _| {},
                    )
                    .from(
                        Strategy::ApiResponse,
                        FromRule::RelatedMany("relationships.tags", |m, items, strategy| {
                            m.tags = Tag::collect_from(strategy, items);
                        }),
                    ))
                    .property(PropertySpec::new(
                        "primary_tag",
                        |_| None,
                        |_, _| {},
                    )
                    .from(
                        Strategy::ApiResponse,
                        FromRule::RelatedOne("relationships.primary", |m, value, strategy| {
                            m.primary_tag = Some(Tag::from_payload(strategy, value));
                        }),
                    ))
                    .build()
            })
        }

        fn blank() -> Self {
            Self {
                uuid: Uuid::new_v4(),
                id: None,
                name: "initial".to_string(),
                full_name: String::new(),
                note: None,
                flags: Value::Null,
                tags: Collection::default(),
                primary_tag: None,
            }
        }
    }

    #[test]
    fn missing_path_keeps_prior_value() {
        let mut part = Part::blank();
        part.apply_from(Strategy::ApiResponse, &json!({"id": 3}));
        assert_eq!(part.name, "initial");
        assert_eq!(part.id, Some(3));
    }

    #[test]
    fn empty_source_is_a_noop() {
        let mut part = Part::blank();
        part.apply_from(Strategy::ApiResponse, &json!({}));
        part.apply_from(Strategy::ApiResponse, &json!(null));
        part.apply_from(Strategy::ApiResponse, &json!([1, 2]));
        assert_eq!(part.name, "initial");
        assert!(part.id.is_none());
    }

    #[test]
    fn compute_rules_see_the_whole_document() {
        let part = Part::from_payload(
            Strategy::ApiResponse,
            &json!({"first": "Hot", "last": "Rolled"}),
        );
        assert_eq!(part.full_name, "Hot Rolled");
    }

    #[test]
    fn relationships_expand_recursively() {
        let part = Part::from_payload(
            Strategy::ApiResponse,
            &json!({
                "id": 1,
                "attributes": {"name": "beam"},
                "relationships": {
                    "tags": [{"id": 10, "name": "steel"}, {"id": 11, "name": "rolled"}],
                    "primary": {"id": 10, "name": "steel"}
                }
            }),
        );
        assert_eq!(part.tags.count(), 2);
        assert_eq!(part.tags.first().unwrap().name, "steel");
        assert_eq!(part.primary_tag.as_ref().unwrap().id, Some(10));
    }

    #[test]
    fn unset_values_are_omitted_nulls_are_kept() {
        let mut part = Part::blank();
        part.name = "beam".to_string();
        part.note = None;
        let payload = part.apply_to(Strategy::ApiRequest);
        // `note` maps `None` to an absent Value, so the key is skipped;
        // `flags` holds an explicit null, which is serialized; the
        // relationship properties have no to-rule at all.
        assert_eq!(payload, json!({"attributes": {"name": "beam"}, "flags": null}));
    }

    #[test]
    fn round_trip_reproduces_mapped_subset() {
        let data = json!({"id": 5, "attributes": {"name": "beam"}, "note": "hollow"});
        let part = Part::from_payload(Strategy::ApiResponse, &data);
        let payload = part.apply_to(Strategy::ApiRequest);
        assert_eq!(payload["attributes"]["name"], data["attributes"]["name"]);
        assert_eq!(payload["note"], data["note"]);
    }

    #[test]
    fn refresh_copies_values_but_keeps_identity() {
        let source = Part::from_payload(
            Strategy::ApiResponse,
            &json!({"id": 5, "attributes": {"name": "beam"}}),
        );
        let mut target = Part::blank();
        let before = target.uuid();
        target.refresh(&source);
        assert_eq!(target.name, "beam");
        assert_eq!(target.id, Some(5));
        assert_eq!(target.uuid(), before);

        let cloned = source.clone_with_new_identity();
        assert_eq!(cloned.name, "beam");
        assert_ne!(cloned.uuid(), source.uuid());
    }
}
