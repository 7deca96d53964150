//! Parameter declarations.
//!
//! A view declares its parameters once, as a table of [`ParamDescriptor`]s.
//! Each descriptor names the lookup key, the target type, the default, the
//! request origins it may be read from, and what happens when coercion fails.

use std::fmt;

use http::Method;

use crate::value::ParamValue;

/// The type a raw value is coerced to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetType {
    /// Text.
    Str,
    /// Signed integer.
    Int,
    /// Floating point.
    Float,
    /// Boolean.
    Bool,
    /// UUID in canonical textual form.
    Uuid,
    /// Entity looked up by primary key; carries the entity type name.
    Entity(String),
    /// Every raw value coerced to the element type.
    List(Box<TargetType>),
    /// Every raw value kept as text.
    UntypedList,
    /// Absence resolves to null.
    Optional(Box<TargetType>),
}

impl TargetType {
    /// `Entity` target for the named entity type.
    #[must_use]
    pub fn entity(name: impl Into<String>) -> Self {
        Self::Entity(name.into())
    }

    /// `List` of the given element type.
    #[must_use]
    pub fn list(element: Self) -> Self {
        Self::List(Box::new(element))
    }

    /// `Optional` wrapper.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        match inner {
            already @ Self::Optional(_) => already,
            other => Self::Optional(Box::new(other)),
        }
    }

    /// Returns `true` if absence may resolve to null.
    #[must_use]
    pub const fn accepts_null(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// The type without its optional wrapper.
    #[must_use]
    pub fn unwrap_optional(&self) -> &Self {
        match self {
            Self::Optional(inner) => inner.unwrap_optional(),
            other => other,
        }
    }

    /// Derives the target from a default value.
    ///
    /// Null and failure defaults fall back to text.
    #[must_use]
    pub fn from_default(value: &ParamValue) -> Self {
        match value {
            ParamValue::Int(_) => Self::Int,
            ParamValue::Float(_) => Self::Float,
            ParamValue::Bool(_) => Self::Bool,
            ParamValue::Uuid(_) => Self::Uuid,
            ParamValue::Entity(entity) => Self::Entity(entity.entity_name().to_string()),
            ParamValue::List(items) => items
                .first()
                .map_or(Self::UntypedList, |first| Self::list(Self::from_default(first))),
            ParamValue::Null | ParamValue::Str(_) | ParamValue::Failure(_) => Self::Str,
        }
    }

    /// Returns `true` if `value` already has this type.
    #[must_use]
    pub fn is_satisfied_by(&self, value: &ParamValue) -> bool {
        match (self, value) {
            (Self::Optional(_), ParamValue::Null)
            | (Self::Str, ParamValue::Str(_))
            | (Self::Int, ParamValue::Int(_))
            | (Self::Float, ParamValue::Float(_))
            | (Self::Bool, ParamValue::Bool(_))
            | (Self::Uuid, ParamValue::Uuid(_)) => true,
            (Self::Entity(name), ParamValue::Entity(entity)) => entity.entity_name() == name,
            (Self::List(element), ParamValue::List(items)) => {
                items.iter().all(|item| element.is_satisfied_by(item))
            }
            (Self::UntypedList, ParamValue::List(items)) => {
                items.iter().all(|item| matches!(item, ParamValue::Str(_)))
            }
            (Self::Optional(inner), other) => inner.is_satisfied_by(other),
            _ => false,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str => write!(f, "str"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "bool"),
            Self::Uuid => write!(f, "uuid"),
            Self::Entity(name) => write!(f, "{name}"),
            Self::List(element) => write!(f, "list[{element}]"),
            Self::UntypedList => write!(f, "list"),
            Self::Optional(inner) => write!(f, "{inner} | None"),
        }
    }
}

/// A channel a parameter value may be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Query string of a GET request (the query is read for every method).
    Get,
    /// Form data of a POST request.
    Post,
    /// Body of a PUT request.
    Put,
    /// Body of a PATCH request.
    Patch,
    /// Body of a DELETE request.
    Delete,
    /// Route path captures.
    Path,
    /// Explicit keyword values from the caller.
    Kwargs,
}

impl Origin {
    const fn bit(self) -> u8 {
        match self {
            Self::Get => 1,
            Self::Post => 1 << 1,
            Self::Put => 1 << 2,
            Self::Patch => 1 << 3,
            Self::Delete => 1 << 4,
            Self::Path => 1 << 5,
            Self::Kwargs => 1 << 6,
        }
    }

    /// The origin matching an HTTP method, if any.
    #[must_use]
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET | Method::HEAD => Some(Self::Get),
            Method::POST => Some(Self::Post),
            Method::PUT => Some(Self::Put),
            Method::PATCH => Some(Self::Patch),
            Method::DELETE => Some(Self::Delete),
            _ => None,
        }
    }
}

/// A set of [`Origin`]s.
///
/// # Example
///
/// ```
/// use hyperpony_params::{Origin, OriginSet};
/// use http::Method;
///
/// let set = OriginSet::from([Origin::Post, Origin::Kwargs]);
/// assert!(set.contains_method(&Method::POST));
/// assert!(!set.contains_method(&Method::PUT));
/// assert!(OriginSet::ALL.contains(Origin::Path));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginSet(u8);

impl OriginSet {
    /// Every origin.
    pub const ALL: Self = Self(0b111_1111);

    /// No origin.
    pub const NONE: Self = Self(0);

    /// Adds an origin.
    #[must_use]
    pub const fn with(self, origin: Origin) -> Self {
        Self(self.0 | origin.bit())
    }

    /// Returns `true` if the origin is in the set.
    #[must_use]
    pub const fn contains(self, origin: Origin) -> bool {
        self.0 & origin.bit() != 0
    }

    /// Returns `true` if the origin for `method` is in the set.
    #[must_use]
    pub fn contains_method(self, method: &Method) -> bool {
        Origin::from_method(method).is_some_and(|origin| self.contains(origin))
    }

    /// Returns `true` if empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for OriginSet {
    fn default() -> Self {
        Self::ALL
    }
}

impl<const N: usize> From<[Origin; N]> for OriginSet {
    fn from(origins: [Origin; N]) -> Self {
        origins.into_iter().collect()
    }
}

impl FromIterator<Origin> for OriginSet {
    fn from_iter<T: IntoIterator<Item = Origin>>(iter: T) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

impl fmt::Debug for OriginSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const ORIGINS: [Origin; 7] = [
            Origin::Get,
            Origin::Post,
            Origin::Put,
            Origin::Patch,
            Origin::Delete,
            Origin::Path,
            Origin::Kwargs,
        ];
        f.debug_set()
            .entries(ORIGINS.iter().filter(|o| self.contains(**o)))
            .finish()
    }
}

/// Which failures a parameter receives as a [`ParamFailure`](crate::ParamFailure)
/// value instead of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Every failure propagates.
    #[default]
    Propagate,
    /// Conversion failures become `InvalidValue`.
    CaptureConversion,
    /// Lookup misses become `NotFound`.
    CaptureNotFound,
    /// Lookup misses become `NotFoundWithPk`.
    CaptureNotFoundWithPk,
    /// Conversion failures and lookup misses (with pk) are both captured.
    CaptureAny,
}

impl ErrorPolicy {
    /// Returns `true` if lookup misses should carry the looked-up key.
    #[must_use]
    pub const fn wants_pk(self) -> bool {
        matches!(self, Self::CaptureNotFoundWithPk | Self::CaptureAny)
    }

    /// Returns `true` if conversion failures are captured.
    #[must_use]
    pub const fn captures_conversion(self) -> bool {
        matches!(self, Self::CaptureConversion | Self::CaptureAny)
    }

    /// Returns `true` if lookup misses are captured.
    #[must_use]
    pub const fn captures_not_found(self) -> bool {
        matches!(
            self,
            Self::CaptureNotFound | Self::CaptureNotFoundWithPk | Self::CaptureAny
        )
    }
}

/// The default of a parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParamDefault {
    /// No default; absence is an error unless the target accepts null.
    #[default]
    Required,
    /// Used when no value is found.
    Value(ParamValue),
}

/// One declared parameter.
///
/// # Example
///
/// ```
/// use hyperpony_params::{ErrorPolicy, Origin, OriginSet, ParamDescriptor, TargetType};
///
/// let page = ParamDescriptor::new("page").default(1_i64);
/// assert_eq!(page.target_type(), &TargetType::Int);
///
/// let contact = ParamDescriptor::new("contact")
///     .target(TargetType::entity("Contact"))
///     .query_key("id")
///     .origins([Origin::Get, Origin::Path])
///     .on_error(ErrorPolicy::CaptureNotFoundWithPk);
/// assert_eq!(contact.key(), "id");
/// assert!(!contact.allowed_origins().contains(Origin::Post));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    name: String,
    query_key: Option<String>,
    default: ParamDefault,
    target: TargetType,
    explicit_target: bool,
    origins: OriginSet,
    on_error: ErrorPolicy,
    parse_body: bool,
    ignore_view_stack: bool,
}

impl ParamDescriptor {
    /// A required text parameter read from every origin.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query_key: None,
            default: ParamDefault::Required,
            target: TargetType::Str,
            explicit_target: false,
            origins: OriginSet::ALL,
            on_error: ErrorPolicy::Propagate,
            parse_body: true,
            ignore_view_stack: false,
        }
    }

    /// Sets the default. Also sets the target type unless one was given.
    #[must_use]
    pub fn default(mut self, value: impl Into<ParamValue>) -> Self {
        let value = value.into();
        if !self.explicit_target {
            self.target = TargetType::from_default(&value);
        }
        self.default = ParamDefault::Value(value);
        self
    }

    /// Sets the target type explicitly.
    #[must_use]
    pub fn target(mut self, target: TargetType) -> Self {
        self.target = target;
        self.explicit_target = true;
        self
    }

    /// Wraps the current target in `Optional`.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.target = TargetType::optional(self.target);
        self.explicit_target = true;
        self
    }

    /// Reads the value under a different key.
    #[must_use]
    pub fn query_key(mut self, key: impl Into<String>) -> Self {
        self.query_key = Some(key.into());
        self
    }

    /// Restricts the origins.
    #[must_use]
    pub fn origins(mut self, origins: impl Into<OriginSet>) -> Self {
        self.origins = origins.into();
        self
    }

    /// Sets the error policy.
    #[must_use]
    pub const fn on_error(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }

    /// Enables or disables parsing of url-encoded and JSON bodies.
    #[must_use]
    pub const fn parse_body(mut self, enabled: bool) -> Self {
        self.parse_body = enabled;
        self
    }

    /// Reads request values even when the view is not at the stack root.
    #[must_use]
    pub const fn ignore_view_stack(mut self, enabled: bool) -> Self {
        self.ignore_view_stack = enabled;
        self
    }

    /// The attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The lookup key, defaulting to the name.
    #[must_use]
    pub fn key(&self) -> &str {
        self.query_key.as_deref().unwrap_or(&self.name)
    }

    /// The default.
    #[must_use]
    pub const fn default_value(&self) -> &ParamDefault {
        &self.default
    }

    /// The target type.
    #[must_use]
    pub const fn target_type(&self) -> &TargetType {
        &self.target
    }

    /// The allowed origins.
    #[must_use]
    pub const fn allowed_origins(&self) -> OriginSet {
        self.origins
    }

    /// The error policy.
    #[must_use]
    pub const fn error_policy(&self) -> ErrorPolicy {
        self.on_error
    }

    /// Whether bodies are parsed.
    #[must_use]
    pub const fn parses_body(&self) -> bool {
        self.parse_body
    }

    /// Whether the view-stack check is skipped.
    #[must_use]
    pub const fn ignores_view_stack(&self) -> bool {
        self.ignore_view_stack
    }
}
