//! The view registry and dispatcher.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use hyperpony_config::HyperponyConfig;
use hyperpony_core::{
    EntityLookup, HttpRequest, HyperponyError, HyperponyResult, Params, Request, RequestContext,
    Response,
};
use hyperpony_htmx::{hook_swap_oob, SwapSpec};
use hyperpony_params::{EngineOptions, ParamEngine, ParamRegistry, ParamValues};
use hyperpony_router::{RouteError, Router};
use hyperpony_telemetry::fields;

use crate::context::ViewContext;
use crate::invoke::InvokeArgs;
use crate::request::{EmbeddedRequest, IsolatedRequest};
use crate::route::{PathSpec, Route, ViewInfo};
use crate::stages;
use crate::view::{dashed_type_name, short_type_name, View};

/// Named views, their routes, and the parameter engine.
///
/// Registration takes `&mut self`; once built, a site is shared read-only
/// and every request gets its own [`RequestContext`].
///
/// # Example
///
/// ```
/// use hyperpony_core::{HttpRequest, HyperponyResult, Response};
/// use hyperpony_params::ParamDescriptor;
/// use hyperpony_view::{Site, View, ViewContext};
///
/// struct Page;
///
/// impl View for Page {
///     fn params(&self) -> Vec<ParamDescriptor> {
///         vec![ParamDescriptor::new("p1").default("aaa")]
///     }
///
///     fn get(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
///         Ok(Response::html(cx.require::<String>("p1")?))
///     }
/// }
///
/// let mut site = Site::new();
/// site.route("page", "/page/", Page).unwrap();
///
/// let request = HttpRequest::builder().uri("/page/?p1=bbb").build().unwrap();
/// let response = site.dispatch(request).unwrap();
/// assert_eq!(response.text().unwrap(), "bbb");
/// ```
pub struct Site {
    config: HyperponyConfig,
    router: Router,
    routes: HashMap<String, Route>,
    singletons: HashMap<TypeId, String>,
    registry: ParamRegistry,
    engine: ParamEngine,
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("routes", &self.router.len())
            .field("singletons", &self.singletons.len())
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl Default for Site {
    fn default() -> Self {
        Self::new()
    }
}

impl Site {
    /// A site with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HyperponyConfig::default())
    }

    /// A site using `config`.
    #[must_use]
    pub fn with_config(config: HyperponyConfig) -> Self {
        let options = EngineOptions {
            parse_form_body: config.params.parse_form_body,
            max_body_bytes: config.params.max_body_bytes,
            ignore_view_stack: config.params.ignore_view_stack,
        };
        Self {
            config,
            router: Router::new(),
            routes: HashMap::new(),
            singletons: HashMap::new(),
            registry: ParamRegistry::new(),
            engine: ParamEngine::new().with_options(options),
        }
    }

    /// Sets the entity lookup used by entity parameters.
    #[must_use]
    pub fn with_lookup(mut self, lookup: Arc<dyn EntityLookup>) -> Self {
        self.engine = self.engine.with_lookup(lookup);
        self
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &HyperponyConfig {
        &self.config
    }

    /// The parameter engine.
    #[must_use]
    pub fn engine(&self) -> &ParamEngine {
        &self.engine
    }

    /// Declared parameter tables by view type.
    #[must_use]
    pub fn registry(&self) -> &ParamRegistry {
        &self.registry
    }

    /// The route table.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Registers `view` under `name` at `pattern`.
    ///
    /// # Errors
    ///
    /// `Configuration` for duplicate parameter names, `Routing` for a
    /// duplicate route name or an invalid pattern.
    pub fn route<V: View>(
        &mut self,
        name: impl Into<String>,
        pattern: &str,
        view: V,
    ) -> HyperponyResult<()> {
        let name = name.into();
        self.registry.register::<V>(view.params())?;
        self.router.insert(name.clone(), pattern)?;

        let params = self
            .registry
            .get::<V>()
            .ok_or_else(|| HyperponyError::internal("parameter table vanished after registration"))?;
        let info = ViewInfo::of(name.clone(), &view, params, &self.config.views);
        tracing::debug!({ fields::VIEW } = %name, pattern, "route registered");
        self.routes.insert(
            name,
            Route {
                view: Arc::new(view),
                info,
            },
        );
        Ok(())
    }

    /// Registers `view` under its own unique route.
    ///
    /// Returns the route name. A view type can be registered this way once.
    ///
    /// # Errors
    ///
    /// `Configuration` when called twice for `V` or when `spec` sets both a
    /// suffix and a full path; otherwise as [`route`](Self::route).
    pub fn create_path<V: View>(&mut self, view: V, spec: PathSpec) -> HyperponyResult<String> {
        if self.singletons.contains_key(&TypeId::of::<V>()) {
            return Err(HyperponyError::configuration(
                "create_path() can only be called once per view type.",
            ));
        }
        let pattern = spec.path_for(short_type_name::<V>())?;
        let name = spec.name_for::<V>();
        self.route(name.clone(), &pattern, view)?;
        self.singletons.insert(TypeId::of::<V>(), name.clone());
        Ok(name)
    }

    /// Static facts about the view registered under `name`.
    #[must_use]
    pub fn view_info(&self, name: &str) -> Option<&ViewInfo> {
        self.routes.get(name).map(|route| &route.info)
    }

    /// The singleton route name of `V`.
    #[must_use]
    pub fn path_name<V: View>(&self) -> Option<&str> {
        self.singletons.get(&TypeId::of::<V>()).map(String::as_str)
    }

    /// Builds the path of route `name`.
    ///
    /// # Errors
    ///
    /// `Routing` for unknown routes or missing parameters.
    pub fn reverse(&self, name: &str, params: &Params) -> HyperponyResult<String> {
        Ok(self.router.reverse(name, params)?)
    }

    /// Builds the path of the singleton view `V`.
    ///
    /// # Errors
    ///
    /// `ViewNotRegistered` without a singleton path.
    pub fn reverse_view<V: View>(&self, params: &Params) -> HyperponyResult<String> {
        self.reverse(self.singleton::<V>()?, params)
    }

    /// Dispatches a top-level request.
    ///
    /// Response handlers and out-of-band swaps queued anywhere in the view
    /// tree are applied once, to the final response.
    ///
    /// # Errors
    ///
    /// `Routing` if no route matches; otherwise whatever the view fails with.
    pub fn dispatch(&self, mut request: HttpRequest) -> HyperponyResult<Response> {
        let matched = self
            .router
            .resolve(request.path())
            .ok_or_else(|| RouteError::NoMatch(request.path().to_string()))?;
        let name = matched.name.to_string();
        let route = self
            .routes
            .get(&name)
            .ok_or_else(|| HyperponyError::ViewNotFound { name: name.clone() })?;
        request.set_route(name, matched.params);

        let mut ctx = RequestContext::new();
        let span = tracing::info_span!(
            "request",
            { fields::REQUEST_ID } = %ctx.request_id(),
            method = %request.method(),
            path = request.path(),
        );
        let _guard = span.enter();

        let result = self.run(
            route.view.as_ref(),
            &route.info,
            &request,
            &mut ctx,
            ParamValues::new(),
            ParamValues::new(),
        );
        let elapsed_ms = ctx.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(response) => tracing::debug!(
                status = response.status().as_u16(),
                elapsed_ms,
                "request completed"
            ),
            Err(error) => tracing::debug!(
                error_code = error.error_code(),
                elapsed_ms,
                "request failed"
            ),
        }
        result
    }

    /// Dispatches a top-level request, turning errors into responses.
    ///
    /// Errors become a plain-text body with the error's status code.
    pub fn handle(&self, request: HttpRequest) -> Response {
        match self.dispatch(request) {
            Ok(response) => response,
            Err(error) => {
                let status = error.status_code();
                if status.is_server_error() {
                    tracing::error!({ fields::ERROR } = %error, error_code = error.error_code(), "view dispatch failed");
                } else {
                    tracing::warn!({ fields::ERROR } = %error, error_code = error.error_code(), "view dispatch rejected");
                }
                Response::text_plain(error.to_string()).with_status(status)
            }
        }
    }

    /// Invokes the view registered under `name` on an embedded request.
    ///
    /// The target runs through the same pipeline as a top-level dispatch.
    /// Its route parameters are filled from `args`, backfilling from
    /// keyword values; entity keyword values reach the view without a
    /// lookup.
    ///
    /// # Errors
    ///
    /// `ViewNotFound`, `Routing` if the path cannot be built, or whatever
    /// the view fails with.
    pub fn invoke(
        &self,
        ctx: &mut RequestContext,
        request: &dyn Request,
        name: &str,
        args: InvokeArgs,
    ) -> HyperponyResult<Response> {
        let route = self.routes.get(name).ok_or_else(|| HyperponyError::ViewNotFound {
            name: name.to_string(),
        })?;
        let required = self.router.required_params(name)?;
        let params = args.path_params(&required);
        let path = self.router.reverse(name, &params)?;

        let InvokeArgs {
            get,
            post,
            extra_kwargs,
            init,
            ..
        } = args;
        let (entities, kwargs) = InvokeArgs::split_kwargs(extra_kwargs);
        let embedded = EmbeddedRequest::new(request, get, post).with_route(name, path, params);
        tracing::debug!(
            { fields::VIEW } = name,
            path = embedded.path(),
            method = %embedded.method(),
            entities = entities.len(),
            "invoking view"
        );

        ctx.stage_entity_overrides(entities);
        self.run(route.view.as_ref(), &route.info, &embedded, ctx, kwargs, init)
    }

    /// Like [`invoke`](Self::invoke), returning the body text.
    ///
    /// # Errors
    ///
    /// As [`invoke`](Self::invoke); `UnsupportedResponseType` for bodies
    /// that are not UTF-8.
    pub fn embed(
        &self,
        ctx: &mut RequestContext,
        request: &dyn Request,
        name: &str,
        args: InvokeArgs,
    ) -> HyperponyResult<String> {
        let response = self.invoke(ctx, request, name, args)?;
        Ok(response.text()?.to_string())
    }

    /// Invokes the singleton view `V`.
    ///
    /// # Errors
    ///
    /// `ViewNotRegistered` without a singleton path; otherwise as
    /// [`invoke`](Self::invoke).
    pub fn invoke_view<V: View>(
        &self,
        ctx: &mut RequestContext,
        request: &dyn Request,
        args: InvokeArgs,
    ) -> HyperponyResult<Response> {
        self.invoke(ctx, request, self.singleton::<V>()?, args)
    }

    /// Embeds the singleton view `V`.
    ///
    /// # Errors
    ///
    /// `ViewNotRegistered` without a singleton path; otherwise as
    /// [`embed`](Self::embed).
    pub fn embed_view<V: View>(
        &self,
        ctx: &mut RequestContext,
        request: &dyn Request,
        args: InvokeArgs,
    ) -> HyperponyResult<String> {
        self.embed(ctx, request, self.singleton::<V>()?, args)
    }

    /// Invokes the singleton view `V` and queues its response as an
    /// out-of-band swap of the final response.
    ///
    /// # Errors
    ///
    /// `ViewNotRegistered` without a singleton path,
    /// `OutOfContextInvocation` outside a dispatch; otherwise as
    /// [`invoke`](Self::invoke).
    pub fn swap_oob_view<V: View>(
        &self,
        ctx: &mut RequestContext,
        request: &dyn Request,
        args: InvokeArgs,
        spec: SwapSpec,
    ) -> HyperponyResult<()> {
        let response = self.invoke_view::<V>(ctx, request, args)?;
        hook_swap_oob(ctx, vec![response], spec)
    }

    /// Renders `view` as a logical child of the current render.
    ///
    /// Unless the view opts out, it sees the request as a bare `GET`. Text
    /// responses come back as their body; others as a short description.
    ///
    /// # Errors
    ///
    /// Whatever the view fails with.
    pub fn render_nested<V: View>(
        &self,
        ctx: &mut RequestContext,
        request: &dyn Request,
        view: &V,
        kwargs: ParamValues,
    ) -> HyperponyResult<String> {
        let params = self
            .registry
            .get::<V>()
            .unwrap_or_else(|| view.params().into());
        let name = self
            .path_name::<V>()
            .map_or_else(dashed_type_name::<V>, str::to_string);
        let info = ViewInfo::of(name, view, params, &self.config.views);

        let response = if info.config().isolate_request {
            let isolated = IsolatedRequest::new(request);
            self.run(view, &info, &isolated, ctx, kwargs, ParamValues::new())?
        } else {
            self.run(view, &info, request, ctx, kwargs, ParamValues::new())?
        };

        Ok(match response.text_or_none() {
            Some(text) => text.to_string(),
            None => format!(
                "<Response status_code={}, \"{}\">",
                response.status().as_u16(),
                response.content_type()
            ),
        })
    }

    fn singleton<V: View>(&self) -> HyperponyResult<&str> {
        self.path_name::<V>()
            .ok_or_else(|| HyperponyError::ViewNotRegistered {
                view: std::any::type_name::<V>().to_string(),
            })
    }

    fn run(
        &self,
        view: &dyn View,
        info: &ViewInfo,
        request: &dyn Request,
        ctx: &mut RequestContext,
        kwargs: ParamValues,
        preset: ParamValues,
    ) -> HyperponyResult<Response> {
        let mut cx = ViewContext::new(self, info, request, ctx, kwargs, preset);
        stages::pipeline(info).process(&mut cx, |cx| view.dispatch(cx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};

    struct Hello;

    impl View for Hello {
        fn get(&self, _cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
            Ok(Response::html("hello"))
        }
    }

    struct Detail;

    impl View for Detail {
        fn get(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
            Ok(Response::html(format!("detail {}", cx.url()?)))
        }
    }

    #[test]
    fn test_dispatch_routes_by_path() {
        let mut site = Site::new();
        site.route("hello", "/hello/", Hello).unwrap();
        let request = HttpRequest::builder().uri("/hello/").build().unwrap();
        assert_eq!(site.dispatch(request).unwrap().text().unwrap(), "hello");
    }

    #[test]
    fn test_unknown_path_is_404() {
        let site = Site::new();
        let request = HttpRequest::builder().uri("/nope/").build().unwrap();
        let err = site.dispatch(request).unwrap_err();
        assert!(matches!(err, HyperponyError::Routing(RouteError::NoMatch(_))));

        let request = HttpRequest::builder().uri("/nope/").build().unwrap();
        assert_eq!(site.handle(request).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_duplicate_route_name() {
        let mut site = Site::new();
        site.route("hello", "/hello/", Hello).unwrap();
        let err = site.route("hello", "/other/", Hello).unwrap_err();
        assert!(matches!(err, HyperponyError::Routing(RouteError::DuplicateName(_))));
    }

    #[test]
    fn test_url_reverses_current_route() {
        let mut site = Site::new();
        site.route("detail", "/items/{item_id}/", Detail).unwrap();
        let request = HttpRequest::builder().uri("/items/5/").build().unwrap();
        let response = site.dispatch(request).unwrap();
        assert_eq!(response.text().unwrap(), "detail /items/5/");
    }

    #[test]
    fn test_unsupported_method() {
        let mut site = Site::new();
        site.route("hello", "/hello/", Hello).unwrap();
        let request = HttpRequest::builder()
            .method(Method::OPTIONS)
            .uri("/hello/")
            .build()
            .unwrap();
        assert_eq!(site.dispatch(request).unwrap().status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_create_path_twice_fails() {
        let mut site = Site::new();
        let name = site.create_path(Hello, PathSpec::new()).unwrap();
        assert!(name.ends_with("site-tests-Hello"));
        assert_eq!(site.router().pattern(&name), Some("/Hello"));
        assert_eq!(site.reverse_view::<Hello>(&Params::new()).unwrap(), "/Hello");

        let err = site.create_path(Hello, PathSpec::new()).unwrap_err();
        assert!(err.to_string().contains("only be called once"));
    }

    #[test]
    fn test_unregistered_singleton() {
        let site = Site::new();
        let err = site.reverse_view::<Hello>(&Params::new()).unwrap_err();
        assert!(matches!(err, HyperponyError::ViewNotRegistered { .. }));
        assert!(err.to_string().contains("was not registered with create_path()"));
    }

    #[test]
    fn test_invoke_unknown_name() {
        let site = Site::new();
        let request = HttpRequest::builder().uri("/").build().unwrap();
        let mut ctx = RequestContext::new();
        let err = site
            .invoke(&mut ctx, &request, "missing", InvokeArgs::new())
            .unwrap_err();
        assert!(matches!(err, HyperponyError::ViewNotFound { .. }));
    }
}
