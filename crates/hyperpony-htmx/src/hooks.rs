//! htmx response headers and deferred response hooks.

use http::HeaderName;
use hyperpony_core::{HyperponyResult, RequestContext, Response};

use crate::oob::{queue_swap, SwapSpec};

/// `HX-Push-Url` response header.
pub const HX_PUSH_URL: HeaderName = HeaderName::from_static("hx-push-url");
/// `HX-Retarget` response header.
pub const HX_RETARGET: HeaderName = HeaderName::from_static("hx-retarget");
/// `HX-Reswap` response header.
pub const HX_RESWAP: HeaderName = HeaderName::from_static("hx-reswap");

/// Value of the `HX-Push-Url` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushUrl {
    /// Push this URL into the browser history.
    Url(String),
    /// Prevent the history update.
    Disabled,
}

impl From<&str> for PushUrl {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for PushUrl {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<bool> for PushUrl {
    fn from(_: bool) -> Self {
        Self::Disabled
    }
}

impl PushUrl {
    fn header_value(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Disabled => "false",
        }
    }
}

/// Sets `HX-Push-Url`.
///
/// # Errors
///
/// `Internal` if the URL is not a valid header value.
pub fn push_url(mut response: Response, url: impl Into<PushUrl>) -> HyperponyResult<Response> {
    response.set_header(HX_PUSH_URL, url.into().header_value())?;
    Ok(response)
}

/// Retargets the swap to the whole `<body>`.
///
/// # Errors
///
/// Never fails for these static values; the `Result` mirrors [`push_url`].
pub fn swap_body(mut response: Response) -> HyperponyResult<Response> {
    response.set_header(HX_RETARGET, "body")?;
    response.set_header(HX_RESWAP, "innerHTML")?;
    Ok(response)
}

/// Sets `HX-Push-Url` on the final response of the request.
///
/// # Errors
///
/// `OutOfContextInvocation` outside a view dispatch.
pub fn hook_push_url(ctx: &mut RequestContext, url: impl Into<PushUrl>) -> HyperponyResult<()> {
    let url = url.into();
    ctx.add_response_handler(move |response, _| push_url(response, url).map(Some))
}

/// Queues `fragments` as out-of-band swaps of the final response.
///
/// # Errors
///
/// `OutOfContextInvocation` outside a view dispatch. Markup errors surface
/// when the queue runs.
pub fn hook_swap_oob(
    ctx: &mut RequestContext,
    fragments: Vec<Response>,
    spec: SwapSpec,
) -> HyperponyResult<()> {
    ctx.add_response_handler(move |response, oob| {
        queue_swap(&response, &fragments, &spec, oob)?;
        Ok(None)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperpony_core::HyperponyError;

    #[test]
    fn test_push_url_values() {
        let response = push_url(Response::html(""), "/contacts/1").unwrap();
        assert_eq!(response.header("hx-push-url"), Some("/contacts/1"));
        let response = push_url(Response::html(""), false).unwrap();
        assert_eq!(response.header("hx-push-url"), Some("false"));
    }

    #[test]
    fn test_swap_body() {
        let response = swap_body(Response::html("")).unwrap();
        assert_eq!(response.header("hx-retarget"), Some("body"));
        assert_eq!(response.header("hx-reswap"), Some("innerHTML"));
    }

    #[test]
    fn test_hooks_require_view() {
        let mut ctx = RequestContext::new();
        let err = hook_push_url(&mut ctx, "/x").unwrap_err();
        assert!(matches!(err, HyperponyError::OutOfContextInvocation { .. }));
    }

    #[test]
    fn test_hooks_run_at_process_time() {
        let mut ctx = RequestContext::new();
        ctx.push_frame("child", false);
        hook_swap_oob(
            &mut ctx,
            vec![Response::html("<div id='parent'>parent</div>")],
            SwapSpec::outer_html(),
        )
        .unwrap();
        hook_push_url(&mut ctx, "/child").unwrap();
        ctx.pop_frame();

        let response = ctx.process_response(Response::html("<div id='child'>child</div>")).unwrap();
        assert_eq!(response.header("hx-push-url"), Some("/child"));
        assert_eq!(
            response.text().unwrap(),
            r##"<div id='child'>child</div><div id="parent" hx-swap-oob="outerHTML:#parent">parent</div>"##
        );
    }
}
