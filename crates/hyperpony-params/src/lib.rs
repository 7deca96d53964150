//! # Hyperpony Params
//!
//! Declarative, typed request parameters for Hyperpony views.
//!
//! A view declares a table of [`ParamDescriptor`]s. Before the handler runs,
//! the [`ParamEngine`] builds a [`SourceTable`] from the request, coerces the
//! raw values to each descriptor's [`TargetType`], and hands the view a
//! [`ParamValues`] map.
//!
//! ## Precedence
//!
//! Query string values override body values for the same key; caller
//! keyword values override both. Path captures only fill keys nothing else
//! provided.
//!
//! ## Failures as data
//!
//! A descriptor's [`ErrorPolicy`] turns conversion failures and entity
//! lookup misses into a [`ParamFailure`] value the handler can branch on:
//!
//! ```rust
//! use hyperpony_core::{HttpRequest, RequestContext};
//! use hyperpony_params::{
//!     ErrorPolicy, ParamDescriptor, ParamEngine, ParamFailure, ParamValues, Resolution, TargetType,
//! };
//!
//! let request = HttpRequest::builder().uri("/?page=abc").build().unwrap();
//! let mut ctx = RequestContext::new();
//! ctx.push_frame("List", false);
//!
//! let params = [ParamDescriptor::new("page")
//!     .target(TargetType::Int)
//!     .on_error(ErrorPolicy::CaptureConversion)];
//! let values = ParamEngine::new()
//!     .resolve(
//!         &params,
//!         Resolution { request: &request, context: &ctx, kwargs: &ParamValues::new() },
//!         ParamValues::new(),
//!     )
//!     .unwrap();
//!
//! let page = values.get::<Result<i64, ParamFailure>>("page").unwrap();
//! assert!(page.is_err());
//! ```

#![doc(html_root_url = "https://docs.rs/hyperpony-params/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod coerce;
mod descriptor;
mod engine;
mod source;
mod value;

pub use coerce::{coerce, coerce_text, parse_bool, Coercion, RawValue};
pub use descriptor::{ErrorPolicy, Origin, OriginSet, ParamDefault, ParamDescriptor, TargetType};
pub use engine::{EngineOptions, ParamEngine, ParamRegistry, Resolution};
pub use source::{SourceOptions, SourceTable, DEFAULT_MAX_BODY_BYTES};
pub use value::{FromParamValue, ParamFailure, ParamValue, ParamValues};
