//! Element wrapping.
//!
//! An element view's HTML response is spliced into a single tag carrying its
//! id and htmx swap attributes, so the fragment can later replace itself.

use hyperpony_core::{HyperponyResult, Response};
use hyperpony_telemetry::metrics::record_element_wrap;
use indexmap::IndexMap;

/// Marker attribute on every wrapped element.
pub const ELEMENT_MARKER: &str = "hyperpony-element";

/// Identity and swap metadata of an element.
///
/// # Example
///
/// ```
/// use hyperpony_core::Response;
/// use hyperpony_htmx::{wrap_element, ElementMeta};
///
/// let meta = ElementMeta::new("counter").with_attr("class", "card");
/// let response = wrap_element(Response::html("3"), &meta).unwrap();
/// assert_eq!(
///     response.text().unwrap(),
///     r#"<div id="counter" hx-target="this" hx-swap="outerHTML" class="card" hyperpony-element>3</div>"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementMeta {
    /// The element id.
    pub element_id: Option<String>,
    /// The wrapping tag.
    pub tag: String,
    /// `hx-target` value; empty omits the attribute.
    pub hx_target: String,
    /// `hx-swap` value; empty omits the attribute.
    pub hx_swap: String,
    /// Extra attributes, in order.
    pub attrs: IndexMap<String, String>,
    /// Skip wrapping but still mark the response as an element.
    pub nowrap: bool,
    /// The marker attribute name.
    pub marker: String,
}

impl Default for ElementMeta {
    fn default() -> Self {
        Self {
            element_id: None,
            tag: "div".to_string(),
            hx_target: "this".to_string(),
            hx_swap: "outerHTML".to_string(),
            attrs: IndexMap::new(),
            nowrap: false,
            marker: ELEMENT_MARKER.to_string(),
        }
    }
}

impl ElementMeta {
    /// Metadata with the given id and defaults otherwise.
    #[must_use]
    pub fn new(element_id: impl Into<String>) -> Self {
        Self {
            element_id: Some(element_id.into()),
            ..Self::default()
        }
    }

    /// Metadata that only marks the response.
    #[must_use]
    pub fn nowrap() -> Self {
        Self {
            nowrap: true,
            ..Self::default()
        }
    }

    /// Sets the tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Sets `hx-target`.
    #[must_use]
    pub fn with_hx_target(mut self, target: impl Into<String>) -> Self {
        self.hx_target = target.into();
        self
    }

    /// Sets `hx-swap`.
    #[must_use]
    pub fn with_hx_swap(mut self, swap: impl Into<String>) -> Self {
        self.hx_swap = swap.into();
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Sets the marker attribute name.
    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    fn open_tag(&self) -> String {
        let mut tag = format!("<{}", self.tag);
        let mut push = |name: &str, value: &str| {
            tag.push(' ');
            tag.push_str(name);
            tag.push_str("=\"");
            tag.push_str(&escape_attr(value));
            tag.push('"');
        };
        if let Some(id) = &self.element_id {
            push("id", id);
        }
        if !self.hx_target.is_empty() {
            push("hx-target", &self.hx_target);
        }
        if !self.hx_swap.is_empty() {
            push("hx-swap", &self.hx_swap);
        }
        for (name, value) in &self.attrs {
            push(name, value);
        }
        tag.push(' ');
        tag.push_str(&self.marker);
        tag.push('>');
        tag
    }
}

/// Wraps `response` as an element.
///
/// Already-wrapped responses come back unchanged. Non-HTML and streaming
/// responses are only marked. With `nowrap` the body is left alone.
///
/// # Errors
///
/// `UnsupportedResponseType` if an HTML body is not valid UTF-8.
pub fn wrap_element(mut response: Response, meta: &ElementMeta) -> HyperponyResult<Response> {
    if response.is_element() {
        return Ok(response);
    }

    if !meta.nowrap && response.is_processable("text/html") {
        let wrapped = format!(
            "{}{}</{}>",
            meta.open_tag(),
            response.text()?,
            meta.tag
        );
        response.set_body(wrapped);
        record_element_wrap();
        tracing::trace!(element_id = ?meta.element_id, "wrapped element response");
    }

    response.mark_element();
    Ok(response)
}

/// Escapes a value for a double-quoted attribute.
#[must_use]
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}
