//! Arguments of a named-view invocation.

use std::collections::HashMap;

use hyperpony_core::{EntityRef, Params, QueryDict};
use hyperpony_params::{ParamValue, ParamValues};

/// What the caller hands to an invoked view.
///
/// # Example
///
/// ```
/// use hyperpony_core::QueryDict;
/// use hyperpony_view::InvokeArgs;
///
/// let args = InvokeArgs::new()
///     .get(QueryDict::from_pairs([("filter", "open")]))
///     .path_kwarg("list_id", "3")
///     .kwarg("compact", true);
/// assert!(args.post.is_none());
/// assert_eq!(args.path_kwargs.get("list_id"), Some("3"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InvokeArgs {
    /// Query data of the embedded request.
    pub get: Option<QueryDict>,
    /// Form data; presence makes the embedded request a `POST`.
    pub post: Option<QueryDict>,
    /// Positional path parameters, filling the route's parameters in order.
    pub path_args: Vec<String>,
    /// Named path parameters.
    pub path_kwargs: Params,
    /// Keyword values passed to the view. Entities bypass their lookup.
    pub extra_kwargs: ParamValues,
    /// Construction-time parameter values.
    pub init: ParamValues,
}

impl InvokeArgs {
    /// No data, no parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the query data.
    #[must_use]
    pub fn get(mut self, query: QueryDict) -> Self {
        self.get = Some(query);
        self
    }

    /// Sets the form data.
    #[must_use]
    pub fn post(mut self, form: QueryDict) -> Self {
        self.post = Some(form);
        self
    }

    /// Appends a positional path parameter.
    #[must_use]
    pub fn path_arg(mut self, value: impl Into<String>) -> Self {
        self.path_args.push(value.into());
        self
    }

    /// Sets a named path parameter.
    #[must_use]
    pub fn path_kwarg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_kwargs.set(name, value);
        self
    }

    /// Sets a keyword value.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.extra_kwargs.set(name, value);
        self
    }

    /// Sets a construction-time value.
    #[must_use]
    pub fn init(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.init.set(name, value);
        self
    }

    /// Fills the route's `required` parameters.
    ///
    /// Named values come first, then positional ones in order; whatever is
    /// still missing is taken from a keyword value of the same name, an
    /// entity contributing its primary key.
    pub(crate) fn path_params(&self, required: &[&str]) -> Params {
        let mut positional = self.path_args.iter();
        let mut params = Params::new();
        for &name in required {
            let value = self
                .path_kwargs
                .get(name)
                .map(str::to_string)
                .or_else(|| positional.next().cloned())
                .or_else(|| self.extra_kwargs.raw(name).and_then(ParamValue::to_raw));
            if let Some(value) = value {
                params.push(name, value);
            }
        }
        params
    }

    /// Splits keyword values into entity instances and everything else.
    pub(crate) fn split_kwargs(extra: ParamValues) -> (HashMap<String, EntityRef>, ParamValues) {
        let mut entities = HashMap::new();
        let mut kwargs = ParamValues::new();
        for (name, value) in extra.iter() {
            match value {
                ParamValue::Entity(entity) => {
                    entities.insert(name.to_string(), entity.clone());
                }
                other => kwargs.set(name, other.clone()),
            }
        }
        (entities, kwargs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperpony_core::Entity;
    use std::any::Any;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Contact(u32);

    impl Entity for Contact {
        fn entity_name(&self) -> &str {
            "Contact"
        }

        fn pk(&self) -> String {
            self.0.to_string()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_named_then_positional() {
        let args = InvokeArgs::new()
            .path_arg("10")
            .path_arg("20")
            .path_kwarg("b", "2");
        let params = args.path_params(&["a", "b", "c"]);
        assert_eq!(params.get("a"), Some("10"));
        assert_eq!(params.get("b"), Some("2"));
        assert_eq!(params.get("c"), Some("20"));
    }

    #[test]
    fn test_backfill_from_entity_kwarg() {
        let contact: EntityRef = Arc::new(Contact(42));
        let args = InvokeArgs::new().kwarg("contact_id", contact);
        let params = args.path_params(&["contact_id"]);
        assert_eq!(params.get("contact_id"), Some("42"));
    }

    #[test]
    fn test_missing_stays_missing() {
        let params = InvokeArgs::new().path_params(&["id"]);
        assert!(params.is_empty());
    }

    #[test]
    fn test_split_kwargs() {
        let contact: EntityRef = Arc::new(Contact(1));
        let extra = ParamValues::new().with("contact", contact).with("page", 2_i64);
        let (entities, kwargs) = InvokeArgs::split_kwargs(extra);
        assert_eq!(entities.get("contact").map(|e| e.pk()).as_deref(), Some("1"));
        assert!(!kwargs.contains("contact"));
        assert_eq!(kwargs.get::<i64>("page"), Some(2));
    }
}
