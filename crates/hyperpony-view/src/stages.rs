//! Pipeline stages of a view dispatch.
//!
//! Each stage is a zero-sized interceptor over [`ViewContext`]. The chain is
//! assembled per dispatch from the view's [`ViewInfo`]: every view gets the
//! response processing and view stack stages, the others are switched on by
//! the view's configuration.

use hyperpony_core::{HyperponyResult, Response};
use hyperpony_htmx::wrap_element;
use hyperpony_middleware::{Interceptor, Next, Pipeline, Stage};
use hyperpony_params::Resolution;
use hyperpony_telemetry::fields;
use hyperpony_telemetry::metrics::record_view_dispatch;

use crate::client_state::collect_client_states;
use crate::context::ViewContext;
use crate::route::ViewInfo;

/// Builds the chain for one dispatch of `info`.
pub(crate) fn pipeline<'r>(info: &ViewInfo) -> Pipeline<ViewContext<'r>> {
    let config = info.config();
    Pipeline::builder()
        .stage(Stage::ResponseProcessing, ResponseProcessing)
        .stage(Stage::ViewStack, ViewStack)
        .stage_if(config.login_required, Stage::LoginRequired, LoginRequired)
        .stage_if(info.is_element(), Stage::Element, ElementWrap)
        .stage_if(info.client_state.is_some(), Stage::ClientState, ClientStateLoad)
        .stage_if(config.inject_params, Stage::InjectParams, InjectParams)
        .build()
}

/// Runs the response handler queue and the OOB flush once, at the root.
pub(crate) struct ResponseProcessing;

impl<'r> Interceptor<ViewContext<'r>> for ResponseProcessing {
    fn name(&self) -> &'static str {
        "response_processing"
    }

    fn process(
        &self,
        cx: &mut ViewContext<'r>,
        next: Next<'_, ViewContext<'r>>,
    ) -> HyperponyResult<Response> {
        let root = cx.ctx.depth() == 0;
        let response = next.run(cx)?;
        if root {
            cx.ctx.process_response(response)
        } else {
            Ok(response)
        }
    }
}

/// Tracks the call frame for the duration of the view.
pub(crate) struct ViewStack;

impl<'r> Interceptor<ViewContext<'r>> for ViewStack {
    fn name(&self) -> &'static str {
        "view_stack"
    }

    fn process(
        &self,
        cx: &mut ViewContext<'r>,
        next: Next<'_, ViewContext<'r>>,
    ) -> HyperponyResult<Response> {
        let embedded = cx.request.is_embedded();
        let depth = cx.ctx.push_frame(cx.info.name.as_str(), embedded);
        let span = tracing::debug_span!(
            "view",
            { fields::VIEW } = %cx.info.name,
            { fields::DEPTH } = depth,
            embedded
        );
        let _guard = span.enter();
        record_view_dispatch(&cx.info.name, embedded);

        let result = next.run(cx);
        cx.ctx.pop_frame();

        if let Err(error) = &result {
            tracing::debug!({ fields::ERROR } = %error, "view failed");
        }
        result
    }
}

/// Redirects anonymous callers to the login URL.
pub(crate) struct LoginRequired;

impl<'r> Interceptor<ViewContext<'r>> for LoginRequired {
    fn name(&self) -> &'static str {
        "login_required"
    }

    fn process(
        &self,
        cx: &mut ViewContext<'r>,
        next: Next<'_, ViewContext<'r>>,
    ) -> HyperponyResult<Response> {
        if cx.request.identity().is_authenticated() {
            return next.run(cx);
        }
        let settings = &cx.site.config().views;
        let location = format!(
            "{}?{}={}",
            settings.login_url,
            settings.redirect_field,
            urlencoding::encode(cx.request.path())
        );
        tracing::debug!(location = %location, "anonymous caller redirected to login");
        Response::redirect(&location)
    }
}

/// Wraps the handler's fragment in the element tag.
pub(crate) struct ElementWrap;

impl<'r> Interceptor<ViewContext<'r>> for ElementWrap {
    fn name(&self) -> &'static str {
        "element"
    }

    fn process(
        &self,
        cx: &mut ViewContext<'r>,
        next: Next<'_, ViewContext<'r>>,
    ) -> HyperponyResult<Response> {
        let response = next.run(cx)?;
        match &cx.element {
            Some(meta) => wrap_element(response, meta),
            None => Ok(response),
        }
    }
}

/// Seeds the client state and applies what the client sent back.
pub(crate) struct ClientStateLoad;

impl<'r> Interceptor<ViewContext<'r>> for ClientStateLoad {
    fn name(&self) -> &'static str {
        "client_state"
    }

    fn process(
        &self,
        cx: &mut ViewContext<'r>,
        next: Next<'_, ViewContext<'r>>,
    ) -> HyperponyResult<Response> {
        let info = cx.info;
        let Some(schema) = info.client_state.as_ref() else {
            return next.run(cx);
        };
        let mut state = schema.defaults();

        let settings = &cx.site.config().client_state;
        if settings.enabled {
            if cx.request.is_htmx() && cx.ctx.client_state().is_none() {
                let collected = collect_client_states(cx.request, &settings.key_prefix);
                cx.ctx.set_client_state(collected);
            }
            let element_id = cx.element_id().to_string();
            if let Some(raw) = cx.ctx.client_state().and_then(|states| states.get(&element_id)) {
                schema.decode(&element_id, raw, &mut state)?;
            }
        }

        cx.client_state = Some(state);
        next.run(cx)
    }
}

/// Resolves the declared parameters.
pub(crate) struct InjectParams;

impl<'r> Interceptor<ViewContext<'r>> for InjectParams {
    fn name(&self) -> &'static str {
        "inject_params"
    }

    fn process(
        &self,
        cx: &mut ViewContext<'r>,
        next: Next<'_, ViewContext<'r>>,
    ) -> HyperponyResult<Response> {
        let preset = std::mem::take(&mut cx.params);
        let resolved = cx.site.engine().resolve(
            cx.info.params(),
            Resolution {
                request: cx.request,
                context: &*cx.ctx,
                kwargs: &cx.kwargs,
            },
            preset,
        )?;
        cx.params = resolved;
        next.run(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{View, ViewConfig};
    use crate::Site;
    use hyperpony_htmx::ElementMeta;

    struct Bare;

    impl View for Bare {
        fn config(&self) -> ViewConfig {
            ViewConfig::default().with_inject_params(false)
        }

        fn get(&self, _cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
            Ok(Response::html("bare"))
        }
    }

    struct Full;

    impl View for Full {
        fn config(&self) -> ViewConfig {
            ViewConfig::default().login_required()
        }

        fn element(&self) -> Option<ElementMeta> {
            Some(ElementMeta::default())
        }

        fn client_state(&self) -> Option<crate::ClientStateSchema> {
            Some(crate::ClientStateSchema::new())
        }

        fn get(&self, _cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
            Ok(Response::html("full"))
        }
    }

    #[test]
    fn test_minimal_chain() {
        let mut site = Site::new();
        site.route("bare", "/bare/", Bare).unwrap();
        let info = site.view_info("bare").unwrap();
        let pipeline = pipeline(info);
        assert_eq!(pipeline.stage_names(), vec!["response_processing", "view_stack"]);
    }

    #[test]
    fn test_full_chain_order() {
        let mut site = Site::new();
        site.route("full", "/full/", Full).unwrap();
        let info = site.view_info("full").unwrap();
        let pipeline = pipeline(info);
        assert_eq!(
            pipeline.stage_names(),
            vec![
                "response_processing",
                "view_stack",
                "login_required",
                "element",
                "client_state",
                "inject_params"
            ]
        );
    }
}
