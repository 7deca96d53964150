//! The [`Interceptor`] trait and the [`Next`] continuation.
//!
//! An interceptor sees a mutable exchange value `C` and decides whether to
//! continue down the chain. Everything runs synchronously on the caller's
//! thread: a nested view dispatch is an ordinary call that finishes before
//! its parent's interceptor resumes.
//!
//! # Example
//!
//! ```
//! use hyperpony_core::{HyperponyResult, Response};
//! use hyperpony_middleware::{Interceptor, Next};
//!
//! struct Footer;
//!
//! impl Interceptor<Vec<&'static str>> for Footer {
//!     fn name(&self) -> &'static str {
//!         "footer"
//!     }
//!
//!     fn process(
//!         &self,
//!         cx: &mut Vec<&'static str>,
//!         next: Next<'_, Vec<&'static str>>,
//!     ) -> HyperponyResult<Response> {
//!         cx.push("footer");
//!         let mut response = next.run(cx)?;
//!         let body = format!("{}<footer></footer>", response.text()?);
//!         response.set_body(body);
//!         Ok(response)
//!     }
//! }
//! ```

use std::fmt;

use hyperpony_core::{HyperponyResult, Response};

/// One step of a dispatch chain.
///
/// # Invariants
///
/// - call `next.run()` at most once; not calling it short-circuits the chain
/// - errors from downstream are returned, never swallowed
pub trait Interceptor<C>: Send + Sync {
    /// Name used in logs and stage listings.
    fn name(&self) -> &'static str;

    /// Processes the exchange, usually by calling `next.run(cx)`.
    fn process(&self, cx: &mut C, next: Next<'_, C>) -> HyperponyResult<Response>;
}

type Terminal<'a, C> = Box<dyn FnOnce(&mut C) -> HyperponyResult<Response> + 'a>;

/// The remainder of a chain.
///
/// Consumed by [`Next::run`], so it can only be continued once.
pub struct Next<'a, C> {
    inner: NextInner<'a, C>,
}

enum NextInner<'a, C> {
    Chain {
        interceptor: &'a dyn Interceptor<C>,
        next: Box<Next<'a, C>>,
    },
    Handler(Terminal<'a, C>),
}

impl<'a, C> Next<'a, C> {
    /// Continues with `interceptor`, then `next`.
    pub fn new(interceptor: &'a dyn Interceptor<C>, next: Self) -> Self {
        Self {
            inner: NextInner::Chain {
                interceptor,
                next: Box::new(next),
            },
        }
    }

    /// A terminal continuation invoking the handler.
    pub fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut C) -> HyperponyResult<Response> + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Runs the next interceptor or the handler.
    pub fn run(self, cx: &mut C) -> HyperponyResult<Response> {
        match self.inner {
            NextInner::Chain { interceptor, next } => {
                tracing::trace!(stage = interceptor.name(), "entering stage");
                interceptor.process(cx, *next)
            }
            NextInner::Handler(handler) => handler(cx),
        }
    }
}

impl<C> fmt::Debug for Next<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            NextInner::Chain { interceptor, .. } => {
                f.debug_tuple("Next").field(&interceptor.name()).finish()
            }
            NextInner::Handler(_) => f.write_str("Next(handler)"),
        }
    }
}

/// An interceptor built from a closure.
///
/// ```
/// use hyperpony_middleware::{FnInterceptor, Interceptor};
///
/// let count = FnInterceptor::new("count", |cx: &mut u32, next| {
///     *cx += 1;
///     next.run(cx)
/// });
/// assert_eq!(Interceptor::<u32>::name(&count), "count");
/// ```
pub struct FnInterceptor<F> {
    name: &'static str,
    func: F,
}

impl<F> FnInterceptor<F> {
    /// Creates a closure-backed interceptor.
    pub fn new<C>(name: &'static str, func: F) -> Self
    where
        F: Fn(&mut C, Next<'_, C>) -> HyperponyResult<Response> + Send + Sync,
    {
        Self { name, func }
    }
}

impl<F> fmt::Debug for FnInterceptor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<C, F> Interceptor<C> for FnInterceptor<F>
where
    F: Fn(&mut C, Next<'_, C>) -> HyperponyResult<Response> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&self, cx: &mut C, next: Next<'_, C>) -> HyperponyResult<Response> {
        (self.func)(cx, next)
    }
}
