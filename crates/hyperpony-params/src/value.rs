//! Resolved parameter values.
//!
//! The engine produces one [`ParamValue`] per declared parameter and stores
//! them in a [`ParamValues`] map the view reads from. Typed access goes
//! through [`FromParamValue`].

use std::fmt;

use hyperpony_core::{EntityRef, HyperponyError, HyperponyResult};
use indexmap::IndexMap;
use thiserror::Error;
use uuid::Uuid;

/// A coercion or lookup failure captured as data.
///
/// Parameters opt into receiving this instead of an error through their
/// [`ErrorPolicy`](crate::ErrorPolicy).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamFailure {
    /// The raw value could not be converted.
    #[error("invalid value '{value}' for parameter '{key}': {message}")]
    InvalidValue {
        /// The lookup key.
        key: String,
        /// The offending raw value.
        value: String,
        /// What went wrong.
        message: String,
    },

    /// The entity lookup missed.
    #[error("{entity} matching query does not exist")]
    NotFound {
        /// The entity type name.
        entity: String,
    },

    /// The entity lookup missed; carries the key that was looked up.
    #[error("{entity} with pk {pk} does not exist")]
    NotFoundWithPk {
        /// The entity type name.
        entity: String,
        /// The primary key.
        pk: String,
    },
}

impl ParamFailure {
    /// Converts a recoverable error into a failure value.
    ///
    /// Returns `None` for errors that never become data.
    #[must_use]
    pub fn from_error(error: &HyperponyError) -> Option<Self> {
        match error {
            HyperponyError::TypeConversion {
                key, value, reason, ..
            } => Some(Self::InvalidValue {
                key: key.clone(),
                value: value.clone(),
                message: reason.clone(),
            }),
            HyperponyError::EntityNotFound { entity } => Some(Self::NotFound {
                entity: entity.clone(),
            }),
            HyperponyError::EntityNotFoundWithPk { entity, pk } => Some(Self::NotFoundWithPk {
                entity: entity.clone(),
                pk: pk.clone(),
            }),
            _ => None,
        }
    }

    /// The primary key, for `NotFoundWithPk`.
    #[must_use]
    pub fn pk(&self) -> Option<&str> {
        match self {
            Self::NotFoundWithPk { pk, .. } => Some(pk),
            _ => None,
        }
    }
}

impl From<ParamFailure> for HyperponyError {
    fn from(failure: ParamFailure) -> Self {
        match failure {
            ParamFailure::InvalidValue {
                key,
                value,
                message,
            } => Self::TypeConversion {
                key,
                value,
                target: "value".to_string(),
                reason: message,
            },
            ParamFailure::NotFound { entity } => Self::EntityNotFound { entity },
            ParamFailure::NotFoundWithPk { entity, pk } => Self::EntityNotFoundWithPk { entity, pk },
        }
    }
}

/// A resolved parameter value.
#[derive(Clone)]
pub enum ParamValue {
    /// Absent optional parameter.
    Null,
    /// Text.
    Str(String),
    /// Integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// UUID.
    Uuid(Uuid),
    /// Multi-valued parameter.
    List(Vec<ParamValue>),
    /// A looked-up or handed-over entity.
    Entity(EntityRef),
    /// A captured failure.
    Failure(ParamFailure),
}

impl ParamValue {
    /// Returns `true` for [`ParamValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the captured failure, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ParamFailure> {
        match self {
            Self::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    /// Textual form of a scalar, used when a keyword value has to be coerced.
    #[must_use]
    pub fn to_raw(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Uuid(u) => Some(u.to_string()),
            Self::Entity(entity) => Some(entity.pk()),
            Self::Null | Self::List(_) | Self::Failure(_) => None,
        }
    }

    /// Textual form of every element, flattening one level of list.
    #[must_use]
    pub fn to_raw_list(&self) -> Option<Vec<String>> {
        match self {
            Self::List(items) => items.iter().map(Self::to_raw).collect(),
            other => other.to_raw().map(|raw| vec![raw]),
        }
    }

    /// Short type name for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Str(_) => "str",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Uuid(_) => "uuid",
            Self::List(_) => "list",
            Self::Entity(_) => "entity",
            Self::Failure(_) => "failure",
        }
    }
}

impl fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Uuid(u) => f.debug_tuple("Uuid").field(u).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Entity(entity) => write!(f, "Entity({}:{})", entity.entity_name(), entity.pk()),
            Self::Failure(failure) => f.debug_tuple("Failure").field(failure).finish(),
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Entity(a), Self::Entity(b)) => {
                a.entity_name() == b.entity_name() && a.pk() == b.pk()
            }
            (Self::Failure(a), Self::Failure(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Uuid> for ParamValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<EntityRef> for ParamValue {
    fn from(value: EntityRef) -> Self {
        Self::Entity(value)
    }
}

impl From<ParamFailure> for ParamValue {
    fn from(value: ParamFailure) -> Self {
        Self::Failure(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Typed extraction from a [`ParamValue`].
///
/// Returns `None` when the stored value has a different shape.
pub trait FromParamValue: Sized {
    /// Converts the value.
    fn from_param_value(value: &ParamValue) -> Option<Self>;
}

impl FromParamValue for ParamValue {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromParamValue for String {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromParamValue for i64 {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromParamValue for f64 {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Float(x) => Some(*x),
            #[allow(clippy::cast_precision_loss)]
            ParamValue::Int(i) => Some(*i as Self),
            _ => None,
        }
    }
}

impl FromParamValue for bool {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromParamValue for Uuid {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }
}

impl FromParamValue for EntityRef {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Entity(entity) => Some(entity.clone()),
            _ => None,
        }
    }
}

impl FromParamValue for ParamFailure {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        value.failure().cloned()
    }
}

impl<T: FromParamValue> FromParamValue for Vec<T> {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::List(items) => items.iter().map(T::from_param_value).collect(),
            _ => None,
        }
    }
}

impl<T: FromParamValue> FromParamValue for Option<T> {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Null => Some(None),
            other => T::from_param_value(other).map(Some),
        }
    }
}

impl<T: FromParamValue> FromParamValue for Result<T, ParamFailure> {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Failure(failure) => Some(Err(failure.clone())),
            other => T::from_param_value(other).map(Ok),
        }
    }
}

/// The resolved parameters of one view invocation, in declaration order.
///
/// # Example
///
/// ```
/// use hyperpony_params::{ParamFailure, ParamValues};
///
/// let mut values = ParamValues::new();
/// values.set("page", 2_i64);
/// values.set("q", None::<String>);
///
/// assert_eq!(values.get::<i64>("page"), Some(2));
/// assert_eq!(values.get::<Option<String>>("q"), Some(None));
/// assert_eq!(values.get::<Result<i64, ParamFailure>>("page"), Some(Ok(2)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamValues {
    values: IndexMap<String, ParamValue>,
}

impl ParamValues {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, replacing any previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Typed access. `None` when absent or of a different shape.
    #[must_use]
    pub fn get<T: FromParamValue>(&self, name: &str) -> Option<T> {
        self.values.get(name).and_then(T::from_param_value)
    }

    /// Typed access that reports what went wrong.
    ///
    /// # Errors
    ///
    /// `MissingParameter` when absent, `TypeConversion` when the stored value
    /// has a different shape.
    pub fn require<T: FromParamValue>(&self, name: &str) -> HyperponyResult<T> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| HyperponyError::missing_parameter(name))?;
        T::from_param_value(value).ok_or_else(|| {
            HyperponyError::type_conversion(
                name,
                format!("{value:?}"),
                std::any::type_name::<T>(),
                format!("stored value is {}", value.kind()),
            )
        })
    }

    /// The untyped value.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Returns `true` if a value is set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Removes a value.
    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.values.shift_remove(name)
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParamValues {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut values = Self::new();
        for (k, v) in iter {
            values.set(k, v);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperpony_core::{Entity, MemoryEntityStore, EntityLookup};
    use std::any::Any;

    #[derive(Debug)]
    struct Tag(&'static str);

    impl Entity for Tag {
        fn entity_name(&self) -> &str {
            "Tag"
        }

        fn pk(&self) -> String {
            self.0.to_string()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_typed_get() {
        let values = ParamValues::new()
            .with("s", "x")
            .with("i", 3_i64)
            .with("f", 1.5)
            .with("b", true)
            .with("l", vec![1_i64, 2]);
        assert_eq!(values.get::<String>("s"), Some("x".to_string()));
        assert_eq!(values.get::<i64>("i"), Some(3));
        assert_eq!(values.get::<f64>("f"), Some(1.5));
        assert_eq!(values.get::<bool>("b"), Some(true));
        assert_eq!(values.get::<Vec<i64>>("l"), Some(vec![1, 2]));
        assert_eq!(values.get::<i64>("s"), None);
        assert_eq!(values.get::<String>("missing"), None);
    }

    #[test]
    fn test_require_errors() {
        let values = ParamValues::new().with("s", "x");
        let err = values.require::<i64>("missing").unwrap_err();
        assert_eq!(err.error_code(), "MISSING_PARAMETER");
        let err = values.require::<i64>("s").unwrap_err();
        assert_eq!(err.error_code(), "TYPE_CONVERSION");
    }

    #[test]
    fn test_failure_as_result() {
        let failure = ParamFailure::NotFoundWithPk {
            entity: "Tag".to_string(),
            pk: "7".to_string(),
        };
        let values = ParamValues::new().with("tag", failure.clone());
        let got = values.get::<Result<EntityRef, ParamFailure>>("tag").unwrap();
        assert_eq!(got.unwrap_err(), failure);
        assert_eq!(failure.pk(), Some("7"));
    }

    #[test]
    fn test_entity_equality_by_pk() {
        let store = MemoryEntityStore::new().with(Tag("rust"));
        let a = ParamValue::Entity(store.get_by_pk("Tag", "rust").unwrap());
        let b = ParamValue::Entity(std::sync::Arc::new(Tag("rust")));
        assert_eq!(a, b);
        assert_eq!(a.to_raw(), Some("rust".to_string()));
    }

    #[test]
    fn test_failure_error_roundtrip() {
        let err = HyperponyError::entity_not_found_with_pk("Tag", "9");
        let failure = ParamFailure::from_error(&err).unwrap();
        assert_eq!(failure.pk(), Some("9"));
        let back: HyperponyError = failure.into();
        assert_eq!(back.error_code(), err.error_code());
        assert!(ParamFailure::from_error(&HyperponyError::missing_parameter("x")).is_none());
    }

    #[test]
    fn test_raw_list() {
        let value = ParamValue::from(vec!["a", "b"]);
        assert_eq!(value.to_raw_list(), Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(ParamValue::Null.to_raw_list(), None);
        assert_eq!(ParamValue::Int(4).to_raw_list(), Some(vec!["4".to_string()]));
    }
}
