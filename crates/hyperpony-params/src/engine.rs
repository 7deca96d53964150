//! The parameter injection engine.
//!
//! Resolves every declared parameter of one view invocation:
//!
//! ```text
//! UNRESOLVED -> LOOKUP -> FOUND  -> COERCED | captured failure | error
//!                      -> ABSENT -> DEFAULTED | NULL | MissingParameter
//! ```
//!
//! Construction-time values and caller-supplied entity instances bypass the
//! lookup entirely.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use hyperpony_core::{EntityLookup, HyperponyError, HyperponyResult, Request, RequestContext};
use hyperpony_telemetry::fields;
use hyperpony_telemetry::metrics::{record_param_resolution, ParamOutcome};

use crate::coerce::{coerce, Coercion, RawValue};
use crate::descriptor::{OriginSet, ParamDefault, ParamDescriptor};
use crate::source::{SourceOptions, SourceTable, DEFAULT_MAX_BODY_BYTES};
use crate::value::{ParamFailure, ParamValue, ParamValues};

/// Engine-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Parse url-encoded and JSON bodies for parameters that allow it.
    pub parse_form_body: bool,
    /// Bodies above this size are not parsed.
    pub max_body_bytes: usize,
    /// Read request values regardless of the view stack.
    pub ignore_view_stack: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            parse_form_body: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            ignore_view_stack: false,
        }
    }
}

/// Declared parameter tables, keyed by view type.
///
/// Populated once at registration time.
#[derive(Debug, Default, Clone)]
pub struct ParamRegistry {
    tables: HashMap<TypeId, Arc<[ParamDescriptor]>>,
}

impl ParamRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the parameter table of `V`.
    ///
    /// # Errors
    ///
    /// `Configuration` if two descriptors share a name.
    pub fn register<V: 'static>(&mut self, descriptors: Vec<ParamDescriptor>) -> HyperponyResult<()> {
        self.register_type_id(TypeId::of::<V>(), std::any::type_name::<V>(), descriptors)
    }

    /// Registers a table under an explicit type id.
    ///
    /// # Errors
    ///
    /// `Configuration` if two descriptors share a name.
    pub fn register_type_id(
        &mut self,
        type_id: TypeId,
        type_name: &str,
        descriptors: Vec<ParamDescriptor>,
    ) -> HyperponyResult<()> {
        for (i, descriptor) in descriptors.iter().enumerate() {
            if descriptors[..i].iter().any(|d| d.name() == descriptor.name()) {
                return Err(HyperponyError::configuration(format!(
                    "parameter '{}' is declared twice on {type_name}",
                    descriptor.name()
                )));
            }
        }
        self.tables.insert(type_id, descriptors.into());
        Ok(())
    }

    /// The table of `V`, if registered.
    #[must_use]
    pub fn get<V: 'static>(&self) -> Option<Arc<[ParamDescriptor]>> {
        self.get_by_type_id(TypeId::of::<V>())
    }

    /// The table registered under `type_id`.
    #[must_use]
    pub fn get_by_type_id(&self, type_id: TypeId) -> Option<Arc<[ParamDescriptor]>> {
        self.tables.get(&type_id).cloned()
    }

    /// Number of registered tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Inputs of one resolution.
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    /// The request the view runs on.
    pub request: &'a dyn Request,
    /// The request context; supplies view-stack depth and entity overrides.
    pub context: &'a RequestContext,
    /// Caller keyword values (`KWARGS` origin).
    pub kwargs: &'a ParamValues,
}

/// Resolves parameter tables against requests.
///
/// # Example
///
/// ```
/// use hyperpony_core::{HttpRequest, RequestContext};
/// use hyperpony_params::{ParamDescriptor, ParamEngine, ParamValues, Resolution};
///
/// let engine = ParamEngine::new();
/// let request = HttpRequest::builder().uri("/?p1=bbb").build().unwrap();
/// let mut ctx = RequestContext::new();
/// ctx.push_frame("Page", false);
///
/// let params = [ParamDescriptor::new("p1").default("aaa"), ParamDescriptor::new("p2").default(7_i64)];
/// let values = engine
///     .resolve(
///         &params,
///         Resolution { request: &request, context: &ctx, kwargs: &ParamValues::new() },
///         ParamValues::new(),
///     )
///     .unwrap();
/// assert_eq!(values.get::<String>("p1").as_deref(), Some("bbb"));
/// assert_eq!(values.get::<i64>("p2"), Some(7));
/// ```
#[derive(Clone, Default)]
pub struct ParamEngine {
    options: EngineOptions,
    lookup: Option<Arc<dyn EntityLookup>>,
}

impl fmt::Debug for ParamEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamEngine")
            .field("options", &self.options)
            .field("lookup", &self.lookup.is_some())
            .finish()
    }
}

impl ParamEngine {
    /// An engine with default options and no entity lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the options.
    #[must_use]
    pub const fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the entity lookup.
    #[must_use]
    pub fn with_lookup(mut self, lookup: Arc<dyn EntityLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// The options.
    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Resolves `descriptors`, starting from the construction-time `preset`.
    ///
    /// Preset names are left untouched.
    ///
    /// # Errors
    ///
    /// The first uncaptured failure: `MissingParameter`, `TypeConversion`,
    /// `EntityNotFound`, `EntityNotFoundWithPk`, or `Configuration`.
    pub fn resolve(
        &self,
        descriptors: &[ParamDescriptor],
        input: Resolution<'_>,
        preset: ParamValues,
    ) -> HyperponyResult<ParamValues> {
        let mut values = preset;
        let mut tables: HashMap<(OriginSet, SourceOptions), SourceTable> = HashMap::new();
        let at_root = input.context.depth() <= 1;

        for descriptor in descriptors {
            let name = descriptor.name();

            if values.contains(name) {
                tracing::debug!({ fields::PARAM } = name, "construction-time value kept");
                record_param_resolution(ParamOutcome::Overridden);
                continue;
            }

            if let Some(entity) = input.context.entity_override(name) {
                tracing::debug!({ fields::PARAM } = name, "entity instance handed over by caller");
                values.set(name, ParamValue::Entity(entity.clone()));
                record_param_resolution(ParamOutcome::Overridden);
                continue;
            }

            let read_request = at_root
                || input.request.is_embedded()
                || self.options.ignore_view_stack
                || descriptor.ignores_view_stack();
            let options = SourceOptions {
                parse_body: self.options.parse_form_body && descriptor.parses_body(),
                max_body_bytes: self.options.max_body_bytes,
                read_request,
            };
            let origins = descriptor.allowed_origins();
            let table = tables.entry((origins, options)).or_insert_with(|| {
                SourceTable::build(input.request, origins, options, input.kwargs)
            });

            let (value, outcome) = match self.resolve_one(descriptor, table.get(descriptor.key())) {
                Ok(resolved) => resolved,
                Err(error) => {
                    tracing::debug!(
                        { fields::PARAM } = name,
                        { fields::ERROR } = %error,
                        "parameter resolution failed"
                    );
                    record_param_resolution(ParamOutcome::Failed);
                    return Err(error);
                }
            };

            tracing::debug!(
                { fields::PARAM } = name,
                outcome = outcome.as_str(),
                value = ?value,
                "parameter resolved"
            );
            record_param_resolution(outcome);
            values.set(name, value);
        }

        Ok(values)
    }

    fn resolve_one(
        &self,
        descriptor: &ParamDescriptor,
        raw: Option<&RawValue>,
    ) -> HyperponyResult<(ParamValue, ParamOutcome)> {
        let target = descriptor.target_type();
        let cx = Coercion {
            key: descriptor.key(),
            policy: descriptor.error_policy(),
            lookup: self.lookup.as_deref(),
        };

        if let Some(raw) = raw {
            return match coerce(raw, target, cx) {
                Ok(value) => Ok((value, ParamOutcome::Coerced)),
                Err(error) => capture(descriptor, error).map(|failure| {
                    (ParamValue::Failure(failure), ParamOutcome::Captured)
                }),
            };
        }

        match descriptor.default_value() {
            ParamDefault::Value(default) if !default.is_null() => {
                let value = coerce(&RawValue::Value(default.clone()), target, cx)?;
                Ok((value, ParamOutcome::Defaulted))
            }
            _ if target.accepts_null() => Ok((ParamValue::Null, ParamOutcome::Null)),
            _ => {
                tracing::warn!(
                    { fields::PARAM } = descriptor.key(),
                    "no value found for required parameter"
                );
                Err(HyperponyError::missing_parameter(descriptor.key()))
            }
        }
    }
}

fn capture(descriptor: &ParamDescriptor, error: HyperponyError) -> HyperponyResult<ParamFailure> {
    let policy = descriptor.error_policy();
    let captured = match &error {
        HyperponyError::TypeConversion { .. } => policy.captures_conversion(),
        HyperponyError::EntityNotFound { .. } | HyperponyError::EntityNotFoundWithPk { .. } => {
            policy.captures_not_found()
        }
        _ => false,
    };
    if captured {
        if let Some(failure) = ParamFailure::from_error(&error) {
            return Ok(failure);
        }
    }
    Err(error)
}
