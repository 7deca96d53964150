//! # Hyperpony Middleware
//!
//! Synchronous interceptor chain used by view dispatch.
//!
//! Cross-cutting view behaviour (response processing, call-stack tracking,
//! login checks, element wrapping, client state, parameter injection) is
//! expressed as [`Interceptor`]s registered in fixed [`Stage`] slots. Routes
//! choose which stages apply; the order never changes.
//!
//! ```text
//! dispatch → response_processing → view_stack → login_required
//!          → element → client_state → inject_params → handler
//! ```
//!
//! ## Example
//!
//! ```
//! use hyperpony_middleware::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages.len(), 6);
//! assert_eq!(stages[0].name(), "response_processing");
//! assert_eq!(stages[5].name(), "inject_params");
//! ```

#![doc(html_root_url = "https://docs.rs/hyperpony-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod interceptor;
pub mod pipeline;

pub use interceptor::{FnInterceptor, Interceptor, Next};
pub use pipeline::{BoxedInterceptor, Pipeline, PipelineBuilder, Stage};
