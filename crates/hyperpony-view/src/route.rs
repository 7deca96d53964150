//! Registered views and singleton path specs.

use std::any::TypeId;
use std::sync::Arc;

use hyperpony_config::ViewsConfig;
use hyperpony_core::{HyperponyError, HyperponyResult};
use hyperpony_htmx::{ElementMeta, ELEMENT_MARKER};
use hyperpony_params::ParamDescriptor;

use crate::client_state::ClientStateSchema;
use crate::view::{dashed_type_name, short_type_name, View, ViewConfig};

/// Everything dispatch needs to know about a view, computed once.
#[derive(Debug, Clone)]
pub struct ViewInfo {
    pub(crate) name: String,
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) element_id: String,
    pub(crate) config: ViewConfig,
    pub(crate) params: Arc<[ParamDescriptor]>,
    pub(crate) element: Option<ElementMeta>,
    pub(crate) client_state: Option<ClientStateSchema>,
}

impl ViewInfo {
    pub(crate) fn of<V: View>(
        name: impl Into<String>,
        view: &V,
        params: Arc<[ParamDescriptor]>,
        settings: &ViewsConfig,
    ) -> Self {
        let type_name = short_type_name::<V>();
        let element = view.element().map(|mut meta| {
            if meta.element_id.is_none() {
                meta.element_id = Some(type_name.to_string());
            }
            if meta.marker == ELEMENT_MARKER {
                meta.marker.clone_from(&settings.element_marker);
            }
            meta
        });
        let element_id = element
            .as_ref()
            .and_then(|meta| meta.element_id.clone())
            .unwrap_or_else(|| type_name.to_string());

        Self {
            name: name.into(),
            type_id: TypeId::of::<V>(),
            type_name,
            element_id,
            config: view.config(),
            params,
            element,
            client_state: view.client_state(),
        }
    }

    /// The route name, or the type path for unrouted nested views.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The view type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The short type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The element id, defaulting to the type name.
    #[must_use]
    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// Dispatch options.
    #[must_use]
    pub const fn config(&self) -> ViewConfig {
        self.config
    }

    /// Declared parameters.
    #[must_use]
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Returns `true` if the view is an element.
    #[must_use]
    pub const fn is_element(&self) -> bool {
        self.element.is_some()
    }
}

/// A routed view.
pub(crate) struct Route {
    pub(crate) view: Arc<dyn View>,
    pub(crate) info: ViewInfo,
}

/// Where [`Site::create_path`](crate::Site::create_path) registers a view.
///
/// Without options the path is `/<TypeName>` and the route name is the
/// type's module path joined with `-`.
///
/// # Example
///
/// ```
/// use hyperpony_view::PathSpec;
///
/// let spec = PathSpec::new().suffix("{todo_id}").name("todo-item");
/// assert_eq!(spec.path_for("TodoItem").unwrap(), "/TodoItem/{todo_id}");
/// assert!(PathSpec::new().suffix("x").full_path("/y").path_for("T").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSpec {
    suffix: Option<String>,
    full_path: Option<String>,
    name: Option<String>,
}

impl PathSpec {
    /// The default spec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a suffix to the type name path.
    #[must_use]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Uses `path` verbatim.
    #[must_use]
    pub fn full_path(mut self, path: impl Into<String>) -> Self {
        self.full_path = Some(path.into());
        self
    }

    /// Overrides the route name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The path pattern for a view type named `type_name`.
    ///
    /// # Errors
    ///
    /// `Configuration` if both a suffix and a full path are set.
    pub fn path_for(&self, type_name: &str) -> HyperponyResult<String> {
        match (&self.full_path, &self.suffix) {
            (Some(_), Some(_)) => Err(HyperponyError::configuration(
                "Either full_path or path_suffix can be specified, not both.",
            )),
            (Some(full), None) => Ok(full.clone()),
            (None, suffix) => {
                let suffix = suffix.as_deref().unwrap_or_default();
                let sep = if suffix.is_empty() || suffix.starts_with('/') {
                    ""
                } else {
                    "/"
                };
                Ok(format!("/{type_name}{sep}{suffix}"))
            }
        }
    }

    pub(crate) fn name_for<V: ?Sized>(&self) -> String {
        self.name.clone().unwrap_or_else(dashed_type_name::<V>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperpony_core::{HyperponyResult, Response};

    use crate::context::ViewContext;

    struct Plain;

    impl View for Plain {
        fn get(&self, _cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
            Ok(Response::html("plain"))
        }
    }

    struct Card;

    impl View for Card {
        fn element(&self) -> Option<ElementMeta> {
            Some(ElementMeta::default().with_tag("section"))
        }

        fn get(&self, _cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
            Ok(Response::html("card"))
        }
    }

    #[test]
    fn test_path_defaults() {
        assert_eq!(PathSpec::new().path_for("Todo").unwrap(), "/Todo");
        assert_eq!(PathSpec::new().suffix("/edit").path_for("Todo").unwrap(), "/Todo/edit");
        assert_eq!(PathSpec::new().full_path("/todos/").path_for("Todo").unwrap(), "/todos/");
        assert!(PathSpec::new().name_for::<Plain>().ends_with("route-tests-Plain"));
        assert_eq!(PathSpec::new().name("x").name_for::<Plain>(), "x");
    }

    #[test]
    fn test_both_paths_rejected() {
        let err = PathSpec::new().suffix("a").full_path("/b").path_for("T").unwrap_err();
        assert!(err.to_string().contains("not both"));
    }

    #[test]
    fn test_info_element_defaults() {
        let settings = ViewsConfig {
            element_marker: "data-hp".to_string(),
            ..Default::default()
        };
        let info = ViewInfo::of("card", &Card, Arc::from(Vec::new()), &settings);
        let meta = info.element.as_ref().unwrap();
        assert_eq!(meta.element_id.as_deref(), Some("Card"));
        assert_eq!(meta.tag, "section");
        assert_eq!(meta.marker, "data-hp");
        assert_eq!(info.element_id(), "Card");

        let info = ViewInfo::of("plain", &Plain, Arc::from(Vec::new()), &settings);
        assert!(!info.is_element());
        assert_eq!(info.element_id(), "Plain");
    }
}
