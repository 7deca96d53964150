//! Out-of-band swaps.
//!
//! Secondary fragments are annotated with an `hx-swap-oob` directive and
//! queued on the request's [`OobBuffer`]; the root dispatch appends them
//! after the primary body once every response handler has run.
//!
//! | Spec | Fragment requirement | Output |
//! |------|----------------------|--------|
//! | `default` | one root with `id` | root tagged `hx-swap-oob="outerHTML"` |
//! | `outerHTML` | one root with `id` | root tagged `outerHTML:#<id>` |
//! | `outerHTML:#t` | one root | root tagged `outerHTML:#t` |
//! | `innerHTML` | one root with `id` | wrapped in `<div hx-swap-oob="innerHTML:#<id>">` |
//! | `<strategy>:#t` | none | wrapped in `<div hx-swap-oob="<strategy>:#t">` |

use std::fmt;
use std::str::FromStr;

use hyperpony_core::{HyperponyError, HyperponyResult, OobBuffer, OobFragment, Response};
use hyperpony_telemetry::metrics::record_oob_fragment;

use crate::fragment::Fragment;

/// The `hx-swap-oob` attribute name.
pub const HX_SWAP_OOB: &str = "hx-swap-oob";

const OUTER_HTML: &str = "outerHTML";

/// How an out-of-band fragment is swapped in.
///
/// # Example
///
/// ```
/// use hyperpony_htmx::SwapSpec;
///
/// assert_eq!("default".parse::<SwapSpec>().unwrap(), SwapSpec::Default);
/// let spec: SwapSpec = "beforeend:#rows".parse().unwrap();
/// assert_eq!(spec.strategy(), "beforeend");
/// assert_eq!(spec.target(), Some("rows"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SwapSpec {
    /// `outerHTML` on the element carrying the fragment root's id.
    #[default]
    Default,
    /// An explicit strategy with an optional target id.
    Strategy {
        /// The htmx swap strategy, e.g. `outerHTML`, `innerHTML`, `beforeend`.
        strategy: String,
        /// The target id without the leading `#`.
        target: Option<String>,
    },
}

impl SwapSpec {
    /// `outerHTML` on the fragment's own id.
    #[must_use]
    pub fn outer_html() -> Self {
        Self::named(OUTER_HTML)
    }

    /// `innerHTML` on the fragment's own id.
    #[must_use]
    pub fn inner_html() -> Self {
        Self::named("innerHTML")
    }

    /// A strategy without explicit target.
    #[must_use]
    pub fn named(strategy: impl Into<String>) -> Self {
        Self::Strategy {
            strategy: strategy.into(),
            target: None,
        }
    }

    /// Sets the target id.
    #[must_use]
    pub fn with_target(self, target: impl Into<String>) -> Self {
        let strategy = match self {
            Self::Default => OUTER_HTML.to_string(),
            Self::Strategy { strategy, .. } => strategy,
        };
        Self::Strategy {
            strategy,
            target: Some(target.into()),
        }
    }

    /// The swap strategy.
    #[must_use]
    pub fn strategy(&self) -> &str {
        match self {
            Self::Default => OUTER_HTML,
            Self::Strategy { strategy, .. } => strategy,
        }
    }

    /// The explicit target id.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Default => None,
            Self::Strategy { target, .. } => target.as_deref(),
        }
    }
}

impl FromStr for SwapSpec {
    type Err = HyperponyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "default" || s == "true" {
            return Ok(Self::Default);
        }
        if s == "false" {
            return Err(HyperponyError::configuration(
                "'false' is not a swap spec; skip the swap instead",
            ));
        }
        match s.split_once(':') {
            None => Ok(Self::named(s)),
            Some((strategy, target)) => {
                let target = target.trim().trim_start_matches('#');
                if strategy.is_empty() || target.is_empty() {
                    return Err(HyperponyError::configuration(format!(
                        "invalid swap spec '{s}', expected '<strategy>' or '<strategy>:#<id>'"
                    )));
                }
                Ok(Self::named(strategy).with_target(target))
            }
        }
    }
}

impl fmt::Display for SwapSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Strategy {
                strategy,
                target: None,
            } => write!(f, "{strategy}"),
            Self::Strategy {
                strategy,
                target: Some(target),
            } => write!(f, "{strategy}:#{target}"),
        }
    }
}

/// Annotates one fragment according to `spec`.
///
/// # Errors
///
/// `MissingRootElementId` when the strategy needs the fragment's own id and
/// it has none; `InvalidFragment` when a root element is needed and there is
/// not exactly one; `UnsupportedResponseType` for a non-UTF-8 body.
pub fn annotate(html: &str, spec: &SwapSpec) -> HyperponyResult<OobFragment> {
    let strategy = spec.strategy().to_string();
    let html = html.trim();

    let missing_id = || HyperponyError::MissingRootElementId {
        strategy: strategy.clone(),
    };

    let (directive, html) = match (spec, spec.target()) {
        (SwapSpec::Default, _) => {
            let mut fragment = Fragment::parse(html)?;
            fragment.id().ok_or_else(missing_id)?;
            fragment.set_attribute(HX_SWAP_OOB, OUTER_HTML);
            (OUTER_HTML.to_string(), fragment.to_html()?)
        }
        (_, None) if strategy == OUTER_HTML => {
            let mut fragment = Fragment::parse(html)?;
            let id = fragment.id().ok_or_else(missing_id)?;
            let directive = format!("{OUTER_HTML}:#{id}");
            fragment.set_attribute(HX_SWAP_OOB, &directive);
            (directive, fragment.to_html()?)
        }
        (_, None) => {
            let fragment = Fragment::parse(html)?;
            let id = fragment.id().ok_or_else(missing_id)?;
            let directive = format!("{strategy}:#{id}");
            let wrapped = wrap_in_container(&directive, html);
            (directive, wrapped)
        }
        (_, Some(target)) if strategy == OUTER_HTML => {
            let mut fragment = Fragment::parse(html)?;
            let directive = format!("{OUTER_HTML}:#{target}");
            fragment.set_attribute(HX_SWAP_OOB, &directive);
            (directive, fragment.to_html()?)
        }
        (_, Some(target)) => {
            let directive = format!("{strategy}:#{target}");
            let wrapped = wrap_in_container(&directive, html);
            (directive, wrapped)
        }
    };

    Ok(OobFragment {
        strategy,
        directive,
        html,
    })
}

fn wrap_in_container(directive: &str, html: &str) -> String {
    format!(
        "<div {HX_SWAP_OOB}=\"{}\">{html}</div>",
        crate::element::escape_attr(directive)
    )
}

/// Queues `additional` fragments for the response.
///
/// # Errors
///
/// `NotHtml` if `response` is not a processable `text/html` response, plus
/// everything [`annotate`] reports.
pub fn queue_swap(
    response: &Response,
    additional: &[Response],
    spec: &SwapSpec,
    oob: &mut OobBuffer,
) -> HyperponyResult<()> {
    ensure_html(response)?;
    for fragment in additional {
        let annotated = annotate(fragment.text()?, spec)?;
        tracing::debug!(
            strategy = %annotated.strategy,
            directive = %annotated.directive,
            "queued out-of-band fragment"
        );
        record_oob_fragment(&annotated.strategy);
        oob.push(annotated);
    }
    Ok(())
}

/// Appends `additional` fragments to `response` right away.
///
/// # Errors
///
/// See [`queue_swap`].
///
/// # Example
///
/// ```
/// use hyperpony_core::Response;
/// use hyperpony_htmx::{swap_oob, SwapSpec};
///
/// let response = swap_oob(
///     Response::html("<div id=\"main\">Y</div>"),
///     &[Response::html("<div id=\"oob\">X</div>")],
///     &SwapSpec::outer_html(),
/// )
/// .unwrap();
/// assert_eq!(
///     response.text().unwrap(),
///     r##"<div id="main">Y</div><div id="oob" hx-swap-oob="outerHTML:#oob">X</div>"##
/// );
/// ```
pub fn swap_oob(
    response: Response,
    additional: &[Response],
    spec: &SwapSpec,
) -> HyperponyResult<Response> {
    let mut buffer = OobBuffer::default();
    queue_swap(&response, additional, spec, &mut buffer)?;
    buffer.flush(response)
}

fn ensure_html(response: &Response) -> HyperponyResult<()> {
    if response.is_processable("text/html") {
        Ok(())
    } else {
        Err(HyperponyError::NotHtml {
            content_type: response.content_type().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_specs() {
        assert_eq!("".parse::<SwapSpec>().unwrap(), SwapSpec::Default);
        assert_eq!("outerHTML".parse::<SwapSpec>().unwrap(), SwapSpec::outer_html());
        assert_eq!(
            "innerHTML:#box".parse::<SwapSpec>().unwrap(),
            SwapSpec::inner_html().with_target("box")
        );
        assert!("innerHTML:#".parse::<SwapSpec>().is_err());
        assert_eq!("true".parse::<SwapSpec>().unwrap(), SwapSpec::Default);
        assert!("false".parse::<SwapSpec>().is_err());
        assert_eq!(SwapSpec::named("afterend").with_target("x").to_string(), "afterend:#x");
    }

    #[test]
    fn test_default_tags_root_with_bare_strategy() {
        let fragment = annotate("<div id='oob'>X</div>", &SwapSpec::Default).unwrap();
        assert_eq!(fragment.directive, "outerHTML");
        assert_eq!(fragment.html, r#"<div id="oob" hx-swap-oob="outerHTML">X</div>"#);
    }

    #[test]
    fn test_outer_html_uses_own_id() {
        let fragment = annotate("<div id='oob'>X</div>", &SwapSpec::outer_html()).unwrap();
        assert_eq!(fragment.directive, "outerHTML:#oob");
        assert_eq!(fragment.strategy, "outerHTML");
    }

    #[test]
    fn test_missing_id_is_an_error() {
        let err = annotate("<span>no id</span>", &SwapSpec::outer_html()).unwrap_err();
        assert!(matches!(err, HyperponyError::MissingRootElementId { .. }));
        assert!(err.to_string().contains("outerHTML:#"));

        let err = annotate("<span>no id</span>", &SwapSpec::Default).unwrap_err();
        assert!(matches!(err, HyperponyError::MissingRootElementId { .. }));

        let err = annotate("<span>no id</span>", &SwapSpec::inner_html()).unwrap_err();
        assert!(matches!(err, HyperponyError::MissingRootElementId { .. }));
    }

    #[test]
    fn test_table_row_and_cell_fragments() {
        let row = annotate(r#"<tr id="row-1"><td>a</td></tr>"#, &SwapSpec::outer_html()).unwrap();
        assert_eq!(row.directive, "outerHTML:#row-1");
        assert_eq!(
            row.html,
            r##"<tr id="row-1" hx-swap-oob="outerHTML:#row-1"><td>a</td></tr>"##
        );

        let row = annotate(r#"<tr id="row-1"><td>a</td></tr>"#, &SwapSpec::Default).unwrap();
        assert_eq!(row.html, r#"<tr id="row-1" hx-swap-oob="outerHTML"><td>a</td></tr>"#);

        let cell = annotate("<td id='c'>x</td>", &SwapSpec::outer_html()).unwrap();
        assert_eq!(cell.html, r##"<td id="c" hx-swap-oob="outerHTML:#c">x</td>"##);

        let cell = annotate("<td id='c'>x</td>", &SwapSpec::Default).unwrap();
        assert_eq!(cell.directive, "outerHTML");
    }

    #[test]
    fn test_explicit_target_needs_no_id() {
        let spec = SwapSpec::outer_html().with_target("slot");
        let fragment = annotate("<span>no id</span>", &spec).unwrap();
        assert_eq!(fragment.html, r##"<span hx-swap-oob="outerHTML:#slot">no id</span>"##);
    }

    #[test]
    fn test_inner_html_wraps() {
        let fragment = annotate("<p id='count'>3</p>", &SwapSpec::inner_html()).unwrap();
        assert_eq!(fragment.directive, "innerHTML:#count");
        assert_eq!(
            fragment.html,
            r##"<div hx-swap-oob="innerHTML:#count"><p id='count'>3</p></div>"##
        );

        let spec = SwapSpec::named("beforeend").with_target("rows");
        let fragment = annotate("<tr><td>a</td></tr><tr><td>b</td></tr>", &spec).unwrap();
        assert!(fragment.html.starts_with(r##"<div hx-swap-oob="beforeend:#rows">"##));
    }

    #[test]
    fn test_queue_requires_html() {
        let mut buffer = OobBuffer::default();
        let json = Response::json(&vec![1, 2]).unwrap();
        let err = queue_swap(
            &json,
            &[Response::html("<div id='a'></div>")],
            &SwapSpec::Default,
            &mut buffer,
        )
        .unwrap_err();
        assert!(matches!(err, HyperponyError::NotHtml { .. }));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_fragments_in_order() {
        let response = swap_oob(
            Response::html("<div id='foo'>foo</div>"),
            &[
                Response::html("<div id='oob1'>oob1</div>"),
                Response::html("<div id='oob2'>oob2</div>"),
            ],
            &SwapSpec::outer_html(),
        )
        .unwrap();
        let text = response.text().unwrap();
        let first = text.find("outerHTML:#oob1").unwrap();
        let second = text.find("outerHTML:#oob2").unwrap();
        assert!(text.starts_with("<div id='foo'>foo</div>"));
        assert!(first < second);
    }
}
