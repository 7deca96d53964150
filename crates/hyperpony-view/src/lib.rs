//! # Hyperpony View
//!
//! Views and their dispatch for Hyperpony.
//!
//! A [`View`] is registered on a [`Site`] under a route name. Every dispatch,
//! top-level or nested, runs through the same fixed pipeline:
//!
//! 1. response processing (root dispatch only)
//! 2. view stack bookkeeping
//! 3. login redirect, when [`ViewConfig::login_required`] is set
//! 4. element wrapping, for views returning [`View::element`]
//! 5. client state, for views returning [`View::client_state`]
//! 6. parameter injection, unless switched off
//!
//! ## Nesting
//!
//! From inside a handler, [`ViewContext::invoke`] runs another registered
//! view on an embedded request and [`ViewContext::render_nested`] renders a
//! view instance as a logical child. Response handlers and out-of-band swaps
//! queued anywhere in the tree are applied once, to the outermost response.
//!
//! ```
//! use hyperpony_core::{HttpRequest, HyperponyResult, Response};
//! use hyperpony_htmx::ElementMeta;
//! use hyperpony_view::{InvokeArgs, PathSpec, Site, View, ViewContext};
//!
//! struct Counter;
//!
//! impl View for Counter {
//!     fn element(&self) -> Option<ElementMeta> {
//!         Some(ElementMeta::default())
//!     }
//!
//!     fn get(&self, _cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
//!         Ok(Response::html("<span>0</span>"))
//!     }
//! }
//!
//! struct Page;
//!
//! impl View for Page {
//!     fn get(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
//!         let counter = cx.embed_view::<Counter>(InvokeArgs::new())?;
//!         Ok(Response::html(format!("<main>{counter}</main>")))
//!     }
//! }
//!
//! let mut site = Site::new();
//! site.create_path(Counter, PathSpec::new()).unwrap();
//! site.route("page", "/", Page).unwrap();
//!
//! let request = HttpRequest::builder().uri("/").build().unwrap();
//! let body = site.handle(request).text().unwrap().to_string();
//! assert!(body.starts_with("<main><div id=\"Counter\""));
//! ```

#![doc(html_root_url = "https://docs.rs/hyperpony-view/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client_state;
mod context;
mod invoke;
mod request;
mod route;
mod site;
mod stages;
mod view;

pub use client_state::{
    collect_client_states, ClientState, ClientStateField, ClientStateSchema, FieldKind,
    CLIENT_STATE_ATTR,
};
pub use context::ViewContext;
pub use invoke::InvokeArgs;
pub use request::{EmbeddedRequest, IsolatedRequest};
pub use route::{PathSpec, ViewInfo};
pub use site::Site;
pub use view::{View, ViewConfig};
