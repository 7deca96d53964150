//! Fixed-order view dispatch pipeline.
//!
//! Stages are registered against a [`Stage`] slot and always run in the
//! order of that enum, whatever the order of registration. A route picks
//! which stages it needs; it never reorders them.
//!
//! ## Stages
//!
//! 1. **Response processing** - root only; runs the handler queue and OOB flush
//! 2. **View stack** - pushes the call frame, opens the view span
//! 3. **Login required** - redirects anonymous callers
//! 4. **Element** - wraps the returned fragment
//! 5. **Client state** - applies inbound client state
//! 6. **Inject params** - resolves declared parameters
//!
//! The view handler runs after the last stage.

use std::fmt;

use hyperpony_core::{HyperponyResult, Response};

use crate::interceptor::{Interceptor, Next};

/// A boxed interceptor.
pub type BoxedInterceptor<C> = Box<dyn Interceptor<C>>;

/// The ordered chain of interceptors for one dispatch.
///
/// # Example
///
/// ```
/// use hyperpony_core::Response;
/// use hyperpony_middleware::{FnInterceptor, Pipeline, Stage};
///
/// let pipeline = Pipeline::<Vec<String>>::builder()
///     .stage(Stage::InjectParams, FnInterceptor::new("inject", |cx: &mut Vec<String>, next| {
///         cx.push("inject".to_string());
///         next.run(cx)
///     }))
///     .stage(Stage::ViewStack, FnInterceptor::new("stack", |cx: &mut Vec<String>, next| {
///         cx.push("stack".to_string());
///         next.run(cx)
///     }))
///     .build();
///
/// let mut order = Vec::new();
/// pipeline.process(&mut order, |_| Ok(Response::html("ok"))).unwrap();
/// assert_eq!(order, vec!["stack", "inject"]);
/// ```
pub struct Pipeline<C> {
    stages: Vec<(Stage, BoxedInterceptor<C>)>,
}

impl<C> Pipeline<C> {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder<C> {
        PipelineBuilder::new()
    }

    /// Runs `handler` behind every stage.
    pub fn process<H>(&self, cx: &mut C, handler: H) -> HyperponyResult<Response>
    where
        H: FnOnce(&mut C) -> HyperponyResult<Response>,
    {
        self.build_chain(handler).run(cx)
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a, C>
    where
        H: FnOnce(&mut C) -> HyperponyResult<Response> + 'a,
    {
        let mut next = Next::handler(handler);
        for (_, interceptor) in self.stages.iter().rev() {
            next = Next::new(interceptor.as_ref(), next);
        }
        next
    }

    /// The registered stages, in execution order.
    #[must_use]
    pub fn stages(&self) -> Vec<Stage> {
        self.stages.iter().map(|(stage, _)| *stage).collect()
    }

    /// Interceptor names, in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .map(|(_, interceptor)| interceptor.name())
            .collect()
    }

    /// Number of registered stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if `stage` is registered.
    #[must_use]
    pub fn contains(&self, stage: Stage) -> bool {
        self.stages.iter().any(|(s, _)| *s == stage)
    }
}

impl<C> fmt::Debug for Pipeline<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for a [`Pipeline`].
pub struct PipelineBuilder<C> {
    stages: Vec<(Stage, BoxedInterceptor<C>)>,
}

impl<C> PipelineBuilder<C> {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Registers `interceptor` in the `stage` slot, replacing any previous one.
    #[must_use]
    pub fn stage<I>(mut self, stage: Stage, interceptor: I) -> Self
    where
        I: Interceptor<C> + 'static,
    {
        self.stages.retain(|(s, _)| *s != stage);
        self.stages.push((stage, Box::new(interceptor)));
        self
    }

    /// Registers `interceptor` only when `enabled`.
    #[must_use]
    pub fn stage_if<I>(self, enabled: bool, stage: Stage, interceptor: I) -> Self
    where
        I: Interceptor<C> + 'static,
    {
        if enabled {
            self.stage(stage, interceptor)
        } else {
            self
        }
    }

    /// Builds the pipeline, sorting the stages into their fixed order.
    #[must_use]
    pub fn build(mut self) -> Pipeline<C> {
        self.stages.sort_by_key(|(stage, _)| *stage);
        Pipeline {
            stages: self.stages,
        }
    }
}

impl<C> Default for PipelineBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Slots of the dispatch pipeline, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: response handler queue and OOB flush, root dispatch only
    ResponseProcessing = 1,
    /// Stage 2: call frame, view span and dispatch metric
    ViewStack = 2,
    /// Stage 3: login redirect
    LoginRequired = 3,
    /// Stage 4: element wrapping
    Element = 4,
    /// Stage 5: inbound client state
    ClientState = 5,
    /// Stage 6: parameter injection
    InjectParams = 6,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ResponseProcessing => "response_processing",
            Self::ViewStack => "view_stack",
            Self::LoginRequired => "login_required",
            Self::Element => "element",
            Self::ClientState => "client_state",
            Self::InjectParams => "inject_params",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 6] {
        [
            Self::ResponseProcessing,
            Self::ViewStack,
            Self::LoginRequired,
            Self::Element,
            Self::ClientState,
            Self::InjectParams,
        ]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
