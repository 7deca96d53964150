//! Test error types.

use hyperpony_core::HyperponyError;
use thiserror::Error;

/// Errors that can occur while building requests or reading responses.
#[derive(Error, Debug)]
pub enum TestError {
    /// Request building failed
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// Response body reading failed
    #[error("body read error: {0}")]
    BodyRead(String),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Form encoding failed
    #[error("form encoding error: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),

    /// The view dispatch failed
    #[error("dispatch error: {0}")]
    Dispatch(#[source] HyperponyError),
}
