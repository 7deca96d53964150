//! # Hyperpony Core
//!
//! Core types shared by every Hyperpony crate:
//!
//! - [`Request`] / [`HttpRequest`] - the request surface views observe
//! - [`Response`] - buffered responses with element and streaming flags
//! - [`QueryDict`] - ordered multi-valued query and form data
//! - [`RequestContext`] - request-scoped call stack, handler queue and OOB buffer
//! - [`Entity`] / [`EntityLookup`] - primary-key lookups for entity parameters
//! - [`HyperponyError`] - the error taxonomy

#![doc(html_root_url = "https://docs.rs/hyperpony-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod entity;
mod error;
mod identity;
mod query_dict;
mod request;
mod response;

pub use context::{Frame, OobBuffer, OobFragment, RequestContext, RequestId, ResponseHandler};
pub use entity::{downcast_entity, Entity, EntityLookup, EntityRef, MemoryEntityStore};
pub use error::{ErrorCategory, HyperponyError, HyperponyResult};
pub use identity::{Identity, UserIdentity};
pub use query_dict::QueryDict;
pub use request::{HttpRequest, HttpRequestBuilder, Request, HX_REQUEST};
pub use response::{Response, TEXT_HTML_UTF8};

pub use hyperpony_router::Params;
