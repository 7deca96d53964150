//! Request-scoped state.
//!
//! One [`RequestContext`] exists per top-level request and is threaded by
//! `&mut` through every view invocation, nested or embedded. It owns the view
//! call stack, the response handler queue, the out-of-band buffer and the
//! per-invocation entity overrides.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::EntityRef;
use crate::error::{HyperponyError, HyperponyResult};
use crate::response::Response;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines of one request together.
///
/// # Example
///
/// ```
/// use hyperpony_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A deferred response mutation.
///
/// Receives the response produced by the whole view tree and the request's
/// out-of-band buffer. Returning `Ok(None)` keeps the response unchanged.
pub type ResponseHandler =
    Box<dyn FnOnce(Response, &mut OobBuffer) -> HyperponyResult<Option<Response>>>;

/// One queued out-of-band fragment, already annotated with its swap directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OobFragment {
    /// The swap strategy, e.g. `outerHTML`.
    pub strategy: String,
    /// The `hx-swap-oob` attribute value.
    pub directive: String,
    /// Serialized markup to append.
    pub html: String,
}

/// Accumulates out-of-band fragments until the root response is flushed.
#[derive(Debug, Default)]
pub struct OobBuffer {
    fragments: Vec<OobFragment>,
}

impl OobBuffer {
    /// Queues a fragment.
    pub fn push(&mut self, fragment: OobFragment) {
        self.fragments.push(fragment);
    }

    /// Queued fragments in call order.
    #[must_use]
    pub fn fragments(&self) -> &[OobFragment] {
        &self.fragments
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Appends every queued fragment after the body, in call order.
    ///
    /// An empty buffer returns the response unchanged.
    pub fn flush(&mut self, mut response: Response) -> HyperponyResult<Response> {
        if self.fragments.is_empty() {
            return Ok(response);
        }
        let mut body = response.text()?.to_string();
        for fragment in self.fragments.drain(..) {
            body.push_str(&fragment.html);
        }
        response.set_body(body);
        Ok(response)
    }
}

/// One active view invocation.
#[derive(Debug)]
pub struct Frame {
    /// The view name.
    pub view: String,
    /// Whether the invocation runs on a fabricated embedded request.
    pub embedded: bool,
    /// Entity instances handed over by the caller, keyed by parameter name.
    pub entity_overrides: HashMap<String, EntityRef>,
}

/// Per-request state threaded through the view pipeline.
///
/// # Example
///
/// ```
/// use hyperpony_core::{RequestContext, Response};
///
/// let mut ctx = RequestContext::new();
/// assert!(ctx.add_response_handler(|_, _| Ok(None)).is_err());
///
/// ctx.push_frame("Page", false);
/// ctx.add_response_handler(|mut r: Response, _| {
///     r.set_body("replaced");
///     Ok(Some(r))
/// }).unwrap();
/// ctx.pop_frame();
///
/// let response = ctx.process_response(Response::html("original")).unwrap();
/// assert_eq!(response.text().unwrap(), "replaced");
/// ```
pub struct RequestContext {
    request_id: RequestId,
    stack: Vec<Frame>,
    handlers: Vec<ResponseHandler>,
    oob: OobBuffer,
    staged_overrides: HashMap<String, EntityRef>,
    client_state: Option<HashMap<String, String>>,
    started_at: Instant,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("stack", &self.stack)
            .field("handlers", &self.handlers.len())
            .field("oob", &self.oob)
            .finish_non_exhaustive()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// Creates a context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with the given request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            stack: Vec::new(),
            handlers: Vec::new(),
            oob: OobBuffer::default(),
            staged_overrides: HashMap::new(),
            client_state: None,
            started_at: Instant::now(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Pushes a view frame, moving any staged entity overrides into it.
    ///
    /// Returns the new depth.
    pub fn push_frame(&mut self, view: impl Into<String>, embedded: bool) -> usize {
        self.stack.push(Frame {
            view: view.into(),
            embedded,
            entity_overrides: std::mem::take(&mut self.staged_overrides),
        });
        self.stack.len()
    }

    /// Pops the innermost frame.
    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.stack.pop()
    }

    /// Number of active view invocations.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns `true` when exactly one view is active.
    #[must_use]
    pub fn is_at_root(&self) -> bool {
        self.stack.len() == 1
    }

    /// The innermost frame.
    #[must_use]
    pub fn current_frame(&self) -> Option<&Frame> {
        self.stack.last()
    }

    /// Fails unless called during a view dispatch.
    pub fn ensure_in_view(&self, operation: &str) -> HyperponyResult<()> {
        if self.stack.is_empty() {
            return Err(HyperponyError::out_of_context(operation));
        }
        Ok(())
    }

    /// Stages entity instances for the next pushed frame.
    pub fn stage_entity_overrides(&mut self, overrides: HashMap<String, EntityRef>) {
        self.staged_overrides = overrides;
    }

    /// Returns the entity instance the caller handed over for `param`, if any.
    #[must_use]
    pub fn entity_override(&self, param: &str) -> Option<&EntityRef> {
        self.stack
            .last()
            .and_then(|frame| frame.entity_overrides.get(param))
    }

    /// Appends a response handler. Only valid inside a view dispatch.
    pub fn add_response_handler<F>(&mut self, handler: F) -> HyperponyResult<()>
    where
        F: FnOnce(Response, &mut OobBuffer) -> HyperponyResult<Option<Response>> + 'static,
    {
        self.ensure_in_view("add_response_handler")?;
        self.handlers.push(Box::new(handler));
        Ok(())
    }

    /// Number of queued response handlers.
    #[must_use]
    pub fn pending_handlers(&self) -> usize {
        self.handlers.len()
    }

    /// The out-of-band buffer.
    #[must_use]
    pub fn oob(&self) -> &OobBuffer {
        &self.oob
    }

    /// Mutable access to the out-of-band buffer.
    pub fn oob_mut(&mut self) -> &mut OobBuffer {
        &mut self.oob
    }

    /// Runs queued handlers in FIFO order, then flushes the out-of-band buffer.
    ///
    /// Drains both queues, so a second call is a no-op.
    pub fn process_response(&mut self, mut response: Response) -> HyperponyResult<Response> {
        let handlers = std::mem::take(&mut self.handlers);
        tracing::debug!(
            request_id = %self.request_id,
            handlers = handlers.len(),
            "running response handlers"
        );
        for handler in handlers {
            if let Some(replaced) = handler(response.clone(), &mut self.oob)? {
                response = replaced;
            }
        }
        self.oob.flush(response)
    }

    /// Client state collected from the request, if already collected.
    #[must_use]
    pub fn client_state(&self) -> Option<&HashMap<String, String>> {
        self.client_state.as_ref()
    }

    /// Stores the client state collected from the request.
    pub fn set_client_state(&mut self, state: HashMap<String, String>) {
        self.client_state = Some(state);
    }
}
