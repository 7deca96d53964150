//! Out-of-band composition through the request context.

use hyperpony_core::{HyperponyError, RequestContext, Response};
use hyperpony_htmx::{
    count_root_elements, hook_swap_oob, queue_swap, swap_oob, wrap_element, ElementMeta, Fragment,
    SwapSpec,
};

#[test]
fn test_primary_and_oob_fragment_in_order() {
    let mut ctx = RequestContext::new();
    ctx.push_frame("Main", false);
    let primary = Response::html(r#"<div id="main">Y</div>"#);
    queue_swap(
        &primary,
        &[Response::html(r#"<div id="oob">X</div>"#)],
        &SwapSpec::outer_html(),
        ctx.oob_mut(),
    )
    .unwrap();
    ctx.pop_frame();

    let composed = ctx.process_response(primary).unwrap();
    let text = composed.text().unwrap();
    assert_eq!(count_root_elements(text), 2);
    assert!(text.starts_with(r#"<div id="main">Y</div>"#));

    let oob_part = &text[r#"<div id="main">Y</div>"#.len()..];
    let fragment = Fragment::parse(oob_part).unwrap();
    assert_eq!(fragment.id().as_deref(), Some("oob"));
    assert_eq!(fragment.attribute("hx-swap-oob").as_deref(), Some("outerHTML:#oob"));
}

#[test]
fn test_missing_id_surfaces_from_handler_queue() {
    let mut ctx = RequestContext::new();
    ctx.push_frame("Main", false);
    hook_swap_oob(
        &mut ctx,
        vec![Response::html("<span>no id</span>")],
        SwapSpec::outer_html(),
    )
    .unwrap();
    ctx.pop_frame();

    let err = ctx.process_response(Response::html("<p>x</p>")).unwrap_err();
    assert!(matches!(err, HyperponyError::MissingRootElementId { .. }));
}

#[test]
fn test_wrapped_element_as_oob_fragment() {
    let parent = wrap_element(Response::html("parent"), &ElementMeta::new("parent")).unwrap();
    let child = wrap_element(Response::html("child"), &ElementMeta::new("child")).unwrap();

    let mut ctx = RequestContext::new();
    ctx.push_frame("child", false);
    hook_swap_oob(&mut ctx, vec![parent], SwapSpec::Default).unwrap();
    ctx.pop_frame();

    let composed = ctx.process_response(child).unwrap();
    let text = composed.text().unwrap();
    assert!(text.contains(r#"id="child""#));
    assert!(text.contains(r#"hx-swap-oob="outerHTML""#));
    assert_eq!(count_root_elements(text), 2);
}

#[test]
fn test_wrapped_table_row_swaps_out_of_band() {
    let row = wrap_element(
        Response::html("<td>a</td>"),
        &ElementMeta::new("row-1").with_tag("tr"),
    )
    .unwrap();
    let composed = swap_oob(
        Response::html(r#"<div id="main">Y</div>"#),
        &[row],
        &SwapSpec::Default,
    )
    .unwrap();
    let text = composed.text().unwrap();
    assert!(text.starts_with(r#"<div id="main">Y</div><tr id="row-1""#));
    assert!(text.ends_with("<td>a</td></tr>"));

    let oob_part = &text[r#"<div id="main">Y</div>"#.len()..];
    let fragment = Fragment::parse(oob_part).unwrap();
    assert_eq!(fragment.tag_name(), "tr");
    assert_eq!(fragment.attribute("hx-swap-oob").as_deref(), Some("outerHTML"));
}

#[test]
fn test_flush_without_fragments_is_identity() {
    let mut ctx = RequestContext::new();
    let response = ctx.process_response(Response::html("<p>same</p>")).unwrap();
    assert_eq!(response.text().unwrap(), "<p>same</p>");
}
