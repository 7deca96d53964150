//! The view trait.

use http::{Method, StatusCode};
use hyperpony_core::{HyperponyResult, Response};
use hyperpony_htmx::ElementMeta;
use hyperpony_params::ParamDescriptor;

use crate::client_state::ClientStateSchema;
use crate::context::ViewContext;

/// Per-view dispatch options.
///
/// These select pipeline stages; they never reorder them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfig {
    /// Redirect anonymous callers to the login URL.
    pub login_required: bool,
    /// Resolve declared parameters before the handler runs.
    pub inject_params: bool,
    /// Render nested invocations on an isolated request.
    pub isolate_request: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            login_required: false,
            inject_params: true,
            isolate_request: true,
        }
    }
}

impl ViewConfig {
    /// Requires an authenticated caller.
    #[must_use]
    pub const fn login_required(mut self) -> Self {
        self.login_required = true;
        self
    }

    /// Sets whether parameters are injected.
    #[must_use]
    pub const fn with_inject_params(mut self, enabled: bool) -> Self {
        self.inject_params = enabled;
        self
    }

    /// Sets whether nested renders use an isolated request.
    #[must_use]
    pub const fn with_isolate_request(mut self, enabled: bool) -> Self {
        self.isolate_request = enabled;
        self
    }
}

/// A request handler unit.
///
/// Implement [`View::get`]; the mutating verbs default to running their
/// `handle_*` hook and then rendering through `get`, so a form view only
/// overrides the hook:
///
/// ```
/// use hyperpony_core::{HyperponyResult, Response};
/// use hyperpony_params::ParamDescriptor;
/// use hyperpony_view::{View, ViewContext};
///
/// struct Greeting;
///
/// impl View for Greeting {
///     fn params(&self) -> Vec<ParamDescriptor> {
///         vec![ParamDescriptor::new("name").default("world")]
///     }
///
///     fn get(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
///         let name: String = cx.require("name")?;
///         Ok(Response::html(format!("<p>Hello {name}</p>")))
///     }
/// }
/// ```
pub trait View: Send + Sync + 'static {
    /// Dispatch options.
    fn config(&self) -> ViewConfig {
        ViewConfig::default()
    }

    /// Declared parameters. Read once, when the view is registered.
    fn params(&self) -> Vec<ParamDescriptor> {
        Vec::new()
    }

    /// Element metadata; `Some` makes the view an element.
    ///
    /// A missing id defaults to the view's type name.
    fn element(&self) -> Option<ElementMeta> {
        None
    }

    /// Client state fields.
    fn client_state(&self) -> Option<ClientStateSchema> {
        None
    }

    /// Renders the view.
    fn get(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response>;

    /// Side effects of a `POST`.
    fn handle_post(&self, _cx: &mut ViewContext<'_>) -> HyperponyResult<()> {
        Ok(())
    }

    /// Side effects of a `PUT`.
    fn handle_put(&self, _cx: &mut ViewContext<'_>) -> HyperponyResult<()> {
        Ok(())
    }

    /// Side effects of a `PATCH`.
    fn handle_patch(&self, _cx: &mut ViewContext<'_>) -> HyperponyResult<()> {
        Ok(())
    }

    /// Side effects of a `DELETE`.
    fn handle_delete(&self, _cx: &mut ViewContext<'_>) -> HyperponyResult<()> {
        Ok(())
    }

    /// Handles a `POST`.
    fn post(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        self.handle_post(cx)?;
        self.get(cx)
    }

    /// Handles a `PUT`.
    fn put(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        self.handle_put(cx)?;
        self.get(cx)
    }

    /// Handles a `PATCH`.
    fn patch(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        self.handle_patch(cx)?;
        self.get(cx)
    }

    /// Handles a `DELETE`.
    fn delete(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        self.handle_delete(cx)?;
        self.get(cx)
    }

    /// Routes the request to the handler of its method.
    ///
    /// `HEAD` renders like `GET`; other methods get `405`.
    fn dispatch(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        let method = cx.request().method().clone();
        match method {
            Method::GET | Method::HEAD => self.get(cx),
            Method::POST => self.post(cx),
            Method::PUT => self.put(cx),
            Method::PATCH => self.patch(cx),
            Method::DELETE => self.delete(cx),
            _ => Ok(Response::new(StatusCode::METHOD_NOT_ALLOWED)),
        }
    }
}

/// Last path segment of a type name, without generic arguments.
pub(crate) fn short_type_name<V: ?Sized>() -> &'static str {
    let full = std::any::type_name::<V>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Module path and type name joined with `-`.
pub(crate) fn dashed_type_name<V: ?Sized>() -> String {
    let full = std::any::type_name::<V>();
    full.split('<').next().unwrap_or(full).replace("::", "-")
}
