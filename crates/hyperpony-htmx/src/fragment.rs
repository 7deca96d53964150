//! HTML fragment parsing.
//!
//! Fragments are parsed in a `<template>` context with `html5ever` into an
//! `RcDom`, so table parts such as `<tr>` and `<td>` survive as roots. Only the top level is inspected: the compositor needs the root
//! element, its `id`, and a way to set one attribute before serializing it
//! back.

use std::fmt;

use html5ever::serialize::{SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{local_name, namespace_url, ns, parse_fragment, Attribute, LocalName, ParseOpts, QualName};
use hyperpony_core::{HyperponyError, HyperponyResult};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

/// A parsed fragment with exactly one root element.
pub struct Fragment {
    // Keeps the tree alive while `root` is used.
    _dom: RcDom,
    root: Handle,
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("tag", &self.tag_name())
            .field("id", &self.id())
            .finish()
    }
}

impl Fragment {
    /// Parses `html`, requiring exactly one root element.
    ///
    /// Whitespace and comments around the root are ignored.
    ///
    /// # Errors
    ///
    /// `InvalidFragment` when there is not exactly one root element or
    /// there is stray text next to it.
    pub fn parse(html: &str) -> HyperponyResult<Self> {
        let dom = parse_any_fragment(html);
        let (elements, stray_text) = top_level(&dom);
        if elements.len() != 1 || stray_text {
            return Err(HyperponyError::InvalidFragment {
                count: elements.len(),
            });
        }
        let root = elements.into_iter().next().ok_or(HyperponyError::InvalidFragment { count: 0 })?;
        Ok(Self { _dom: dom, root })
    }

    /// The root element's tag name.
    #[must_use]
    pub fn tag_name(&self) -> String {
        match &self.root.data {
            NodeData::Element { name, .. } => name.local.to_string(),
            _ => String::new(),
        }
    }

    /// The root element's `id`, if present and non-empty.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.attribute("id").filter(|id| !id.is_empty())
    }

    /// An attribute of the root element.
    #[must_use]
    pub fn attribute(&self, attr: &str) -> Option<String> {
        match &self.root.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|a| &*a.name.local == attr)
                .map(|a| a.value.to_string()),
            _ => None,
        }
    }

    /// Sets an attribute on the root element, replacing any previous value.
    pub fn set_attribute(&mut self, attr: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &self.root.data {
            let mut attrs = attrs.borrow_mut();
            attrs.retain(|a| &*a.name.local != attr);
            attrs.push(Attribute {
                name: QualName::new(None, ns!(), LocalName::from(attr)),
                value: value.into(),
            });
        }
    }

    /// Serializes the root element, including itself.
    ///
    /// # Errors
    ///
    /// `Internal` if serialization fails.
    pub fn to_html(&self) -> HyperponyResult<String> {
        let mut out = Vec::new();
        let handle: SerializableHandle = self.root.clone().into();
        html5ever::serialize(
            &mut out,
            &handle,
            SerializeOpts {
                traversal_scope: TraversalScope::IncludeNode,
                ..SerializeOpts::default()
            },
        )
        .map_err(|e| HyperponyError::internal_with_source("fragment serialization failed", e))?;
        String::from_utf8(out)
            .map_err(|e| HyperponyError::internal_with_source("fragment serialization failed", e))
    }
}

/// Counts the top-level elements of `html`.
#[must_use]
pub fn count_root_elements(html: &str) -> usize {
    top_level(&parse_any_fragment(html)).0.len()
}

fn parse_any_fragment(html: &str) -> RcDom {
    parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        QualName::new(None, ns!(html), local_name!("template")),
        Vec::new(),
    )
    .one(html)
}

/// Top-level elements, and whether non-whitespace text sits beside them.
fn top_level(dom: &RcDom) -> (Vec<Handle>, bool) {
    // The fragment parser puts its output under a synthetic <html> element.
    let document_children = dom.document.children.borrow();
    let Some(container) = document_children.first() else {
        return (Vec::new(), false);
    };

    let mut elements = Vec::new();
    let mut stray_text = false;
    for child in container.children.borrow().iter() {
        match &child.data {
            NodeData::Element { .. } => elements.push(child.clone()),
            NodeData::Text { contents } => {
                if !contents.borrow().trim().is_empty() {
                    stray_text = true;
                }
            }
            _ => {}
        }
    }
    (elements, stray_text)
}
