//! The per-dispatch view context.

use std::fmt;

use http::Method;
use hyperpony_core::{
    HyperponyError, HyperponyResult, OobBuffer, Params, Request, RequestContext, Response,
};
use hyperpony_htmx::{hook_push_url, hook_swap_oob, swap_body, ElementMeta, PushUrl, SwapSpec};
use hyperpony_params::{FromParamValue, ParamValues};

use crate::client_state::ClientState;
use crate::invoke::InvokeArgs;
use crate::route::ViewInfo;
use crate::site::Site;
use crate::view::View;

/// What a view sees while it handles one invocation.
///
/// Created by the site for every dispatch, top-level or nested. The
/// pipeline stages fill in the resolved parameters, element metadata and
/// client state before the handler runs.
pub struct ViewContext<'r> {
    pub(crate) site: &'r Site,
    pub(crate) info: &'r ViewInfo,
    pub(crate) request: &'r dyn Request,
    pub(crate) ctx: &'r mut RequestContext,
    pub(crate) kwargs: ParamValues,
    pub(crate) params: ParamValues,
    pub(crate) element: Option<ElementMeta>,
    pub(crate) client_state: Option<ClientState>,
}

impl fmt::Debug for ViewContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewContext")
            .field("view", &self.info.name)
            .field("method", self.request.method())
            .field("path", &self.request.path())
            .field("depth", &self.ctx.depth())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl<'r> ViewContext<'r> {
    pub(crate) fn new(
        site: &'r Site,
        info: &'r ViewInfo,
        request: &'r dyn Request,
        ctx: &'r mut RequestContext,
        kwargs: ParamValues,
        preset: ParamValues,
    ) -> Self {
        Self {
            site,
            info,
            request,
            ctx,
            kwargs,
            params: preset,
            element: info.element.clone(),
            client_state: None,
        }
    }

    /// The site the view is registered on.
    #[must_use]
    pub fn site(&self) -> &'r Site {
        self.site
    }

    /// The request the view runs on.
    #[must_use]
    pub fn request(&self) -> &'r dyn Request {
        self.request
    }

    /// The request context.
    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &*self.ctx
    }

    /// Mutable access to the request context.
    pub fn context_mut(&mut self) -> &mut RequestContext {
        &mut *self.ctx
    }

    /// The view's route name.
    #[must_use]
    pub fn view_name(&self) -> &str {
        &self.info.name
    }

    /// Static facts about the view.
    #[must_use]
    pub fn info(&self) -> &ViewInfo {
        self.info
    }

    /// Caller keyword values.
    #[must_use]
    pub fn kwargs(&self) -> &ParamValues {
        &self.kwargs
    }

    /// Returns `true` for `HEAD` requests.
    #[must_use]
    pub fn is_head(&self) -> bool {
        self.request.method() == Method::HEAD
    }

    /// Returns `true` for `GET` requests.
    #[must_use]
    pub fn is_get(&self) -> bool {
        self.request.method() == Method::GET
    }

    /// Returns `true` for `POST` requests.
    #[must_use]
    pub fn is_post(&self) -> bool {
        self.request.method() == Method::POST
    }

    /// Returns `true` for `PUT` requests.
    #[must_use]
    pub fn is_put(&self) -> bool {
        self.request.method() == Method::PUT
    }

    /// Returns `true` for `PATCH` requests.
    #[must_use]
    pub fn is_patch(&self) -> bool {
        self.request.method() == Method::PATCH
    }

    /// Returns `true` for `DELETE` requests.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.request.method() == Method::DELETE
    }

    /// Returns `true` if the view was invoked by name from another view.
    #[must_use]
    pub fn is_embedded_view(&self) -> bool {
        self.request.is_embedded()
    }

    /// The URL of the current route, with its captured parameters.
    ///
    /// # Errors
    ///
    /// `ViewNotFound` when the request did not come through a route,
    /// `Routing` if the route cannot be reversed.
    pub fn url(&self) -> HyperponyResult<String> {
        let name = self
            .request
            .route_name()
            .ok_or_else(|| HyperponyError::ViewNotFound {
                name: self.info.name.clone(),
            })?;
        self.site.reverse(name, self.request.path_params())
    }

    /// Resolved parameters.
    #[must_use]
    pub fn params(&self) -> &ParamValues {
        &self.params
    }

    /// A resolved parameter.
    #[must_use]
    pub fn param<T: FromParamValue>(&self, name: &str) -> Option<T> {
        self.params.get(name)
    }

    /// A resolved parameter that must be present.
    ///
    /// # Errors
    ///
    /// `MissingParameter` if absent, `TypeConversion` if of another type.
    pub fn require<T: FromParamValue>(&self, name: &str) -> HyperponyResult<T> {
        self.params.require(name)
    }

    /// Element metadata of this invocation.
    #[must_use]
    pub fn element(&self) -> Option<&ElementMeta> {
        self.element.as_ref()
    }

    /// The element id, defaulting to the view's type name.
    #[must_use]
    pub fn element_id(&self) -> &str {
        self.element
            .as_ref()
            .and_then(|meta| meta.element_id.as_deref())
            .unwrap_or(self.info.element_id.as_str())
    }

    /// Overrides the element id for this invocation.
    pub fn set_element_id(&mut self, element_id: impl Into<String>) {
        if let Some(meta) = self.element.as_mut() {
            meta.element_id = Some(element_id.into());
        }
    }

    /// Client state of this invocation.
    #[must_use]
    pub fn client_state(&self) -> Option<&ClientState> {
        self.client_state.as_ref()
    }

    /// Mutable client state of this invocation.
    pub fn client_state_mut(&mut self) -> Option<&mut ClientState> {
        self.client_state.as_mut()
    }

    /// Attributes carrying the client state into the markup.
    ///
    /// # Errors
    ///
    /// `ClientState` if the view declares no client state.
    pub fn client_state_attrs(&self) -> HyperponyResult<String> {
        let element_id = self.element_id();
        match (&self.info.client_state, &self.client_state) {
            (Some(schema), Some(state)) => schema.render_attrs(element_id, state),
            _ => Err(HyperponyError::ClientState {
                element_id: element_id.to_string(),
                message: "view declares no client state".to_string(),
            }),
        }
    }

    /// Queues a handler for the final response.
    ///
    /// # Errors
    ///
    /// `OutOfContextInvocation` outside a dispatch.
    pub fn add_response_handler<F>(&mut self, handler: F) -> HyperponyResult<()>
    where
        F: FnOnce(Response, &mut OobBuffer) -> HyperponyResult<Option<Response>> + 'static,
    {
        self.ctx.add_response_handler(handler)
    }

    /// Queues `fragments` as out-of-band swaps of the final response.
    ///
    /// # Errors
    ///
    /// `OutOfContextInvocation` outside a dispatch.
    pub fn add_swap_oob(&mut self, fragments: Vec<Response>, spec: SwapSpec) -> HyperponyResult<()> {
        hook_swap_oob(self.ctx, fragments, spec)
    }

    /// Sets `HX-Push-Url` on the final response.
    ///
    /// # Errors
    ///
    /// `OutOfContextInvocation` outside a dispatch.
    pub fn push_url(&mut self, url: impl Into<PushUrl>) -> HyperponyResult<()> {
        hook_push_url(self.ctx, url)
    }

    /// Retargets the final response to the whole body.
    ///
    /// # Errors
    ///
    /// `OutOfContextInvocation` outside a dispatch.
    pub fn swap_body(&mut self) -> HyperponyResult<()> {
        self.ctx
            .add_response_handler(|response, _| swap_body(response).map(Some))
    }

    /// Invokes the view registered under `name` on an embedded request.
    ///
    /// # Errors
    ///
    /// `ViewNotFound`, `Routing`, or whatever the invoked view fails with.
    pub fn invoke(&mut self, name: &str, args: InvokeArgs) -> HyperponyResult<Response> {
        self.site.invoke(self.ctx, self.request, name, args)
    }

    /// Like [`invoke`](Self::invoke), returning the body text.
    ///
    /// # Errors
    ///
    /// As [`invoke`](Self::invoke); `UnsupportedResponseType` for non-text
    /// bodies.
    pub fn embed(&mut self, name: &str, args: InvokeArgs) -> HyperponyResult<String> {
        self.site.embed(self.ctx, self.request, name, args)
    }

    /// Invokes the singleton view `V`.
    ///
    /// # Errors
    ///
    /// `ViewNotRegistered` without a singleton path.
    pub fn invoke_view<V: View>(&mut self, args: InvokeArgs) -> HyperponyResult<Response> {
        self.site.invoke_view::<V>(self.ctx, self.request, args)
    }

    /// Embeds the singleton view `V`.
    ///
    /// # Errors
    ///
    /// `ViewNotRegistered` without a singleton path.
    pub fn embed_view<V: View>(&mut self, args: InvokeArgs) -> HyperponyResult<String> {
        self.site.embed_view::<V>(self.ctx, self.request, args)
    }

    /// Invokes the singleton view `V` and swaps its response in out-of-band.
    ///
    /// # Errors
    ///
    /// `ViewNotRegistered` without a singleton path.
    pub fn swap_oob_view<V: View>(&mut self, args: InvokeArgs, spec: SwapSpec) -> HyperponyResult<()> {
        self.site.swap_oob_view::<V>(self.ctx, self.request, args, spec)
    }

    /// The path of the singleton view `V`.
    ///
    /// # Errors
    ///
    /// `ViewNotRegistered` without a singleton path.
    pub fn reverse_view<V: View>(&self, params: &Params) -> HyperponyResult<String> {
        self.site.reverse_view::<V>(params)
    }

    /// Renders `view` as a logical child and returns its text.
    ///
    /// # Errors
    ///
    /// Whatever the child view fails with.
    pub fn render_nested<V: View>(&mut self, view: &V, kwargs: ParamValues) -> HyperponyResult<String> {
        self.site.render_nested(self.ctx, self.request, view, kwargs)
    }
}
