//! # Hyperpony
//!
//! **Composable htmx views for Rust**
//!
//! Hyperpony builds pages out of small, independently addressable views:
//!
//! - **Typed parameters** declared per view and resolved from the query
//!   string, form body, path, or the calling view
//! - **Nested views** invoked by name on fabricated requests, or rendered in
//!   place as logical children
//! - **Elements** that wrap themselves in an id-carrying tag so htmx can
//!   swap them
//! - **Out-of-band swaps** queued anywhere in the view tree and appended to
//!   the final response once
//!
//! ## Quick Start
//!
//! ```rust
//! use hyperpony::prelude::*;
//!
//! struct Greeting;
//!
//! impl View for Greeting {
//!     fn params(&self) -> Vec<ParamDescriptor> {
//!         vec![ParamDescriptor::new("name").default("world")]
//!     }
//!
//!     fn element(&self) -> Option<ElementMeta> {
//!         Some(ElementMeta::new("greeting"))
//!     }
//!
//!     fn get(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
//!         let name: String = cx.require("name")?;
//!         Ok(Response::html(format!("Hello {name}")))
//!     }
//! }
//!
//! let mut site = Site::new();
//! site.route("greeting", "/hello/", Greeting).unwrap();
//!
//! let request = HttpRequest::builder().uri("/hello/?name=pony").build().unwrap();
//! let response = site.handle(request);
//! assert!(response.text().unwrap().ends_with(">Hello pony</div>"));
//! ```
//!
//! ## Architecture
//!
//! Every dispatch, top-level or nested, runs the same fixed chain:
//!
//! ```text
//! Request → ResponseProcessing → ViewStack → LoginRequired → Element → ClientState → InjectParams → View
//!                  ↓
//! Response ← handler queue + OOB flush (root only)
//! ```

#![doc(html_root_url = "https://docs.rs/hyperpony/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Request/response model and errors
pub use hyperpony_core as core;

// Named routes
pub use hyperpony_router as router;

// Parameter declaration and resolution
pub use hyperpony_params as params;

// Fragments, elements and OOB swaps
pub use hyperpony_htmx as htmx;

// The interceptor chain
pub use hyperpony_middleware as middleware;

// Views and the site
pub use hyperpony_view as view;

// Configuration loading
pub use hyperpony_config as config;

// Logging and metrics
pub use hyperpony_telemetry as telemetry;

use hyperpony_config::HyperponyConfig;
use hyperpony_telemetry::{init_telemetry, TelemetryResult};
use hyperpony_view::Site;

/// Installs logging and metrics from `config` and returns a site using it.
///
/// # Errors
///
/// Returns `TelemetryError` if a global subscriber or recorder is already
/// installed.
pub fn init(config: HyperponyConfig) -> TelemetryResult<Site> {
    init_telemetry(&config.telemetry_config())?;
    Ok(Site::with_config(config))
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use hyperpony::prelude::*;
///
/// let args = InvokeArgs::new().kwarg("page", 2_i64);
/// assert!(args.get.is_none());
/// ```
pub mod prelude {
    pub use hyperpony_core::{
        downcast_entity, Entity, EntityLookup, EntityRef, HttpRequest, HyperponyError,
        HyperponyResult, Identity, MemoryEntityStore, Params, QueryDict, Request,
        RequestContext, Response,
    };

    pub use hyperpony_params::{
        ErrorPolicy, Origin, OriginSet, ParamDescriptor, ParamFailure, ParamValue, ParamValues,
        TargetType,
    };

    pub use hyperpony_htmx::{
        hook_push_url, hook_swap_oob, push_url, swap_body, swap_oob, wrap_element, ElementMeta,
        PushUrl, SwapSpec,
    };

    pub use hyperpony_view::{
        ClientState, ClientStateField, ClientStateSchema, InvokeArgs, PathSpec, Site, View,
        ViewConfig, ViewContext,
    };

    pub use hyperpony_config::{ConfigLoader, HyperponyConfig};
}
