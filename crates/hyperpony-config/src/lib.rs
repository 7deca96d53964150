//! Typed configuration for Hyperpony.
//!
//! - TOML and JSON files, merged key by key over defaults or a preset
//! - `.env` loading through `dotenvy`
//! - `HYPERPONY__SECTION__KEY` environment overrides
//! - strict parsing (unknown fields fail) and validation
//!
//! # Example
//!
//! ```
//! use hyperpony_config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .with_string(
//!         r#"
//!         [params]
//!         max_body_bytes = 65536
//!
//!         [views]
//!         login_url = "/login/"
//!         "#,
//!         "toml",
//!     )
//!     .unwrap()
//!     .with_env_prefix("HYPERPONY")
//!     .load()
//!     .unwrap();
//!
//! assert_eq!(config.params.max_body_bytes, 65536);
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! include_location = false
//!
//! [metrics]
//! enabled = true
//!
//! [params]
//! parse_form_body = true
//! max_body_bytes = 1048576
//! ignore_view_stack = false
//!
//! [views]
//! login_url = "/accounts/login/"
//! redirect_field = "next"
//! element_marker = "hyperpony-element"
//!
//! [client_state]
//! enabled = true
//! key_prefix = "__hyperpony_cs__"
//! ```

#![doc(html_root_url = "https://docs.rs/hyperpony-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{HyperponyConfig, HyperponyConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    ClientStateConfig, LogFormat, LoggingConfig, MetricsConfig, ParamsConfig, ViewsConfig,
    DEFAULT_MAX_BODY_BYTES,
};
