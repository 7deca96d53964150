//! Raw value coercion.
//!
//! Request sources hold text; keyword arguments may already be typed. Both
//! go through [`coerce`], which produces a [`ParamValue`] for a
//! [`TargetType`] or fails with a typed error.

use hyperpony_core::{EntityLookup, HyperponyError, HyperponyResult};
use uuid::Uuid;

use crate::descriptor::{ErrorPolicy, TargetType};
use crate::value::ParamValue;

/// A looked-up source entry.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// One or more text values from the request.
    Text(Vec<String>),
    /// A typed value handed over by the caller.
    Value(ParamValue),
}

impl RawValue {
    /// A single text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(vec![value.into()])
    }
}

/// Coercion inputs that stay fixed for one parameter.
#[derive(Clone, Copy)]
pub struct Coercion<'a> {
    /// The lookup key, used in error messages.
    pub key: &'a str,
    /// What failures the parameter captures; decides the not-found variant.
    pub policy: ErrorPolicy,
    /// Entity lookup collaborator.
    pub lookup: Option<&'a dyn EntityLookup>,
}

impl std::fmt::Debug for Coercion<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coercion")
            .field("key", &self.key)
            .field("policy", &self.policy)
            .field("lookup", &self.lookup.is_some())
            .finish()
    }
}

/// Coerces a raw entry to `target`.
///
/// # Errors
///
/// `TypeConversion` for invalid text, `EntityNotFound`/`EntityNotFoundWithPk`
/// on a lookup miss, `Configuration` when an entity target has no lookup.
pub fn coerce(raw: &RawValue, target: &TargetType, cx: Coercion<'_>) -> HyperponyResult<ParamValue> {
    match raw {
        RawValue::Text(values) => coerce_text(values, target, cx),
        RawValue::Value(value) => {
            if target.is_satisfied_by(value) {
                return Ok(value.clone());
            }
            let texts = value.to_raw_list().ok_or_else(|| {
                HyperponyError::type_conversion(
                    cx.key,
                    format!("{value:?}"),
                    target.to_string(),
                    format!("cannot convert a {} value", value.kind()),
                )
            })?;
            coerce_text(&texts, target, cx)
        }
    }
}

/// Coerces a list of raw text values to `target`.
///
/// List targets convert every value; scalar targets use the first one.
///
/// # Errors
///
/// See [`coerce`].
pub fn coerce_text(
    values: &[String],
    target: &TargetType,
    cx: Coercion<'_>,
) -> HyperponyResult<ParamValue> {
    match target {
        TargetType::List(element) => values
            .iter()
            .map(|v| coerce_scalar(v, element, cx))
            .collect::<HyperponyResult<Vec<_>>>()
            .map(ParamValue::List),
        TargetType::UntypedList => Ok(ParamValue::List(
            values.iter().cloned().map(ParamValue::Str).collect(),
        )),
        TargetType::Optional(inner) => match values.first() {
            None => Ok(ParamValue::Null),
            Some(_) => coerce_text(values, inner, cx),
        },
        scalar => {
            let first = values.first().ok_or_else(|| {
                HyperponyError::type_conversion(cx.key, "", scalar.to_string(), "no value")
            })?;
            coerce_scalar(first, scalar, cx)
        }
    }
}

fn coerce_scalar(value: &str, target: &TargetType, cx: Coercion<'_>) -> HyperponyResult<ParamValue> {
    let invalid = |reason: String| {
        HyperponyError::type_conversion(cx.key, value, target.to_string(), reason)
    };

    match target {
        TargetType::Str => Ok(ParamValue::Str(value.to_string())),
        TargetType::Int => value
            .trim()
            .parse::<i64>()
            .map(ParamValue::Int)
            .map_err(|e| invalid(e.to_string())),
        TargetType::Float => value
            .trim()
            .parse::<f64>()
            .map(ParamValue::Float)
            .map_err(|e| invalid(e.to_string())),
        TargetType::Bool => Ok(ParamValue::Bool(parse_bool(value))),
        TargetType::Uuid => Uuid::parse_str(value.trim())
            .map(ParamValue::Uuid)
            .map_err(|e| invalid(e.to_string())),
        TargetType::Entity(entity) => lookup_entity(entity, value, cx),
        TargetType::Optional(inner) => coerce_scalar(value, inner, cx),
        TargetType::List(element) => {
            coerce_scalar(value, element, cx).map(|v| ParamValue::List(vec![v]))
        }
        TargetType::UntypedList => Ok(ParamValue::List(vec![ParamValue::Str(value.to_string())])),
    }
}

/// Boolean coercion: empty text (a bare `?flag`) and case-insensitive
/// `"false"` are false, anything else is true.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    !(value.is_empty() || value.eq_ignore_ascii_case("false"))
}

fn lookup_entity(entity: &str, pk: &str, cx: Coercion<'_>) -> HyperponyResult<ParamValue> {
    let lookup = cx.lookup.ok_or_else(|| {
        HyperponyError::configuration(format!(
            "parameter '{}' targets entity {entity} but no entity lookup is registered",
            cx.key
        ))
    })?;

    match lookup.get_by_pk(entity, pk) {
        Ok(found) => Ok(ParamValue::Entity(found)),
        Err(HyperponyError::EntityNotFound { entity } | HyperponyError::EntityNotFoundWithPk { entity, .. }) => {
            if cx.policy.wants_pk() {
                Err(HyperponyError::entity_not_found_with_pk(entity, pk))
            } else {
                Err(HyperponyError::entity_not_found(entity))
            }
        }
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperpony_core::{Entity, MemoryEntityStore};
    use proptest::prelude::*;
    use std::any::Any;

    #[derive(Debug)]
    struct User(u32);

    impl Entity for User {
        fn entity_name(&self) -> &str {
            "User"
        }

        fn pk(&self) -> String {
            self.0.to_string()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn cx(policy: ErrorPolicy) -> Coercion<'static> {
        Coercion {
            key: "p1",
            policy,
            lookup: None,
        }
    }

    fn text(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_scalars_use_first_value() {
        let out = coerce_text(&text(&["1", "2"]), &TargetType::Int, cx(ErrorPolicy::Propagate));
        assert_eq!(out.unwrap(), ParamValue::Int(1));
        let out = coerce_text(&text(&["1.1"]), &TargetType::Float, cx(ErrorPolicy::Propagate));
        assert_eq!(out.unwrap(), ParamValue::Float(1.1));
    }

    #[test]
    fn test_invalid_int() {
        let err = coerce_text(&text(&["a"]), &TargetType::Int, cx(ErrorPolicy::Propagate))
            .unwrap_err();
        assert_eq!(err.error_code(), "TYPE_CONVERSION");
        assert!(err.to_string().contains("'p1'"));
    }

    #[test]
    fn test_bool_values() {
        assert!(!parse_bool("false"));
        assert!(!parse_bool("False"));
        assert!(!parse_bool("FALSE"));
        assert!(!parse_bool(""));
        assert!(parse_bool("true"));
        assert!(parse_bool("0"));
        assert!(parse_bool("on"));
    }

    #[test]
    fn test_lists() {
        let out = coerce_text(
            &text(&["1", "2"]),
            &TargetType::list(TargetType::Int),
            cx(ErrorPolicy::Propagate),
        );
        assert_eq!(out.unwrap(), ParamValue::from(vec![1_i64, 2]));

        let out = coerce_text(&text(&["1", "2"]), &TargetType::UntypedList, cx(ErrorPolicy::Propagate));
        assert_eq!(out.unwrap(), ParamValue::from(vec!["1", "2"]));
    }

    #[test]
    fn test_uuid() {
        let id = Uuid::now_v7();
        let out = coerce_text(&[id.to_string()], &TargetType::Uuid, cx(ErrorPolicy::Propagate));
        assert_eq!(out.unwrap(), ParamValue::Uuid(id));
        assert!(coerce_text(&text(&["nope"]), &TargetType::Uuid, cx(ErrorPolicy::Propagate)).is_err());
    }

    #[test]
    fn test_typed_value_passes_through() {
        let raw = RawValue::Value(ParamValue::Int(5));
        assert_eq!(
            coerce(&raw, &TargetType::Int, cx(ErrorPolicy::Propagate)).unwrap(),
            ParamValue::Int(5)
        );
        assert_eq!(
            coerce(&raw, &TargetType::Str, cx(ErrorPolicy::Propagate)).unwrap(),
            ParamValue::Str("5".to_string())
        );
    }

    #[test]
    fn test_entity_lookup() {
        let store = MemoryEntityStore::new().with(User(1));
        let cx = Coercion {
            key: "user",
            policy: ErrorPolicy::Propagate,
            lookup: Some(&store),
        };
        let found = coerce_text(&text(&["1"]), &TargetType::entity("User"), cx).unwrap();
        assert!(matches!(found, ParamValue::Entity(ref e) if e.pk() == "1"));

        let err = coerce_text(&text(&["2"]), &TargetType::entity("User"), cx).unwrap_err();
        assert_eq!(err.error_code(), "ENTITY_NOT_FOUND");

        let with_pk = Coercion {
            policy: ErrorPolicy::CaptureNotFoundWithPk,
            ..cx
        };
        let err = coerce_text(&text(&["2"]), &TargetType::entity("User"), with_pk).unwrap_err();
        assert!(matches!(err, HyperponyError::EntityNotFoundWithPk { ref pk, .. } if pk == "2"));
    }

    #[test]
    fn test_entity_without_lookup() {
        let err = coerce_text(&text(&["1"]), &TargetType::entity("User"), cx(ErrorPolicy::Propagate))
            .unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_optional_empty_is_null() {
        let target = TargetType::optional(TargetType::Int);
        assert_eq!(
            coerce_text(&[], &target, cx(ErrorPolicy::Propagate)).unwrap(),
            ParamValue::Null
        );
        assert_eq!(
            coerce_text(&text(&["1"]), &target, cx(ErrorPolicy::Propagate)).unwrap(),
            ParamValue::Int(1)
        );
    }

    proptest! {
        #[test]
        fn test_bool_coercion_never_fails(value in ".*") {
            let out = coerce_text(&[value.clone()], &TargetType::Bool, cx(ErrorPolicy::Propagate));
            let expected = !(value.is_empty() || value.eq_ignore_ascii_case("false"));
            prop_assert_eq!(out.unwrap(), ParamValue::Bool(expected));
        }

        #[test]
        fn test_int_text_roundtrip(n in any::<i64>()) {
            let out = coerce_text(&[n.to_string()], &TargetType::Int, cx(ErrorPolicy::Propagate));
            prop_assert_eq!(out.unwrap(), ParamValue::Int(n));
        }
    }
}
