//! # Hyperpony Test
//!
//! Test utilities for Hyperpony sites: a request factory, an in-memory
//! client that runs requests through the full view pipeline, and response
//! assertions.
//!
//! ## Example
//!
//! ```
//! use hyperpony_core::{HyperponyResult, Response};
//! use hyperpony_params::ParamDescriptor;
//! use hyperpony_test::TestClient;
//! use hyperpony_view::{Site, View, ViewContext};
//!
//! struct Search;
//!
//! impl View for Search {
//!     fn params(&self) -> Vec<ParamDescriptor> {
//!         vec![ParamDescriptor::new("q").default("")]
//!     }
//!
//!     fn get(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
//!         let q: String = cx.require("q")?;
//!         Ok(Response::html(format!("<p>results for {q}</p>")))
//!     }
//! }
//!
//! let mut site = Site::new();
//! site.route("search", "/search/", Search).unwrap();
//!
//! let client = TestClient::new(site);
//! client
//!     .get("/search/?q=pony")
//!     .htmx()
//!     .send()
//!     .assert_success()
//!     .assert_contains("results for pony");
//! ```

#![doc(html_root_url = "https://docs.rs/hyperpony-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
