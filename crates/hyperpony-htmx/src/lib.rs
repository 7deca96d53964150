//! # Hyperpony htmx
//!
//! Response composition for htmx-driven pages:
//!
//! - [`wrap_element`] splices an element view's fragment into its own tag
//! - [`queue_swap`] / [`swap_oob`] attach out-of-band fragments with their
//!   `hx-swap-oob` directives
//! - [`push_url`], [`swap_body`] and the `hook_*` variants set htmx response
//!   headers, immediately or once the whole view tree has rendered
//!
//! Fragments are parsed with `html5ever`.

#![doc(html_root_url = "https://docs.rs/hyperpony-htmx/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod element;
mod fragment;
mod hooks;
mod oob;

pub use element::{escape_attr, wrap_element, ElementMeta, ELEMENT_MARKER};
pub use fragment::{count_root_elements, Fragment};
pub use hooks::{
    hook_push_url, hook_swap_oob, push_url, swap_body, PushUrl, HX_PUSH_URL, HX_RESWAP,
    HX_RETARGET,
};
pub use oob::{annotate, queue_swap, swap_oob, SwapSpec, HX_SWAP_OOB};
