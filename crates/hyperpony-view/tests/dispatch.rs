//! Top-level dispatch through the view pipeline.

use std::any::Any;
use std::sync::Arc;

use http::{Method, StatusCode};
use hyperpony_core::{
    downcast_entity, Entity, EntityRef, HttpRequest, HyperponyError, HyperponyResult, Identity,
    MemoryEntityStore, Response,
};
use hyperpony_htmx::{wrap_element, ElementMeta, SwapSpec};
use hyperpony_params::{ErrorPolicy, ParamDescriptor, ParamFailure, TargetType};
use hyperpony_view::{ClientStateField, ClientStateSchema, Site, View, ViewConfig, ViewContext};

#[derive(Debug)]
struct Contact {
    id: u32,
    name: &'static str,
}

impl Entity for Contact {
    fn entity_name(&self) -> &str {
        "Contact"
    }

    fn pk(&self) -> String {
        self.id.to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn get(uri: &str) -> HttpRequest {
    HttpRequest::builder().uri(uri).build().unwrap()
}

fn post_form(uri: &str, body: &str) -> HttpRequest {
    HttpRequest::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(body.to_string())
        .build()
        .unwrap()
}

struct Echo;

impl View for Echo {
    fn params(&self) -> Vec<ParamDescriptor> {
        vec![ParamDescriptor::new("p1").default("aaa")]
    }

    fn get(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        Ok(Response::html(cx.require::<String>("p1")?))
    }
}

#[test]
fn test_default_then_query_value() {
    let mut site = Site::new();
    site.route("echo", "/echo/", Echo).unwrap();

    assert_eq!(site.handle(get("/echo/")).text().unwrap(), "aaa");
    assert_eq!(site.handle(get("/echo/?p1=bbb")).text().unwrap(), "bbb");
}

#[test]
fn test_query_beats_form_body() {
    let mut site = Site::new();
    site.route("echo", "/echo/", Echo).unwrap();

    let response = site.handle(post_form("/echo/?p1=query", "p1=body"));
    assert_eq!(response.text().unwrap(), "query");

    let response = site.handle(post_form("/echo/", "p1=body"));
    assert_eq!(response.text().unwrap(), "body");
}

struct Counter;

impl View for Counter {
    fn params(&self) -> Vec<ParamDescriptor> {
        vec![ParamDescriptor::new("count").target(TargetType::Int)]
    }

    fn get(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        Ok(Response::html(cx.require::<i64>("count")?.to_string()))
    }
}

#[test]
fn test_parameter_errors_map_to_status() {
    let mut site = Site::new();
    site.route("counter", "/counter/", Counter).unwrap();

    let response = site.handle(get("/counter/"));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().unwrap().contains("'count'"));

    let err = site.dispatch(get("/counter/?count=abc")).unwrap_err();
    assert!(matches!(err, HyperponyError::TypeConversion { .. }));

    assert_eq!(site.handle(get("/counter/?count=12")).text().unwrap(), "12");
}

struct ContactDetail;

impl View for ContactDetail {
    fn params(&self) -> Vec<ParamDescriptor> {
        vec![ParamDescriptor::new("contact")
            .target(TargetType::entity("Contact"))
            .on_error(ErrorPolicy::CaptureNotFoundWithPk)]
    }

    fn get(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        let body = match cx.require::<Result<EntityRef, ParamFailure>>("contact")? {
            Ok(entity) => downcast_entity::<Contact>(&entity)
                .map(|c| c.name.to_string())
                .unwrap_or_default(),
            Err(failure) => format!("missing {}", failure.pk().unwrap_or("?")),
        };
        Ok(Response::html(body))
    }
}

#[test]
fn test_entity_from_path_and_captured_miss() {
    let store = MemoryEntityStore::new().with(Contact { id: 1, name: "Ada" });
    let mut site = Site::new().with_lookup(Arc::new(store));
    site.route("contact", "/contacts/{contact}/", ContactDetail)
        .unwrap();

    assert_eq!(site.handle(get("/contacts/1/")).text().unwrap(), "Ada");
    assert_eq!(site.handle(get("/contacts/9/")).text().unwrap(), "missing 9");
}

struct Secret;

impl View for Secret {
    fn config(&self) -> ViewConfig {
        ViewConfig::default().login_required()
    }

    fn get(&self, _cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        Ok(Response::html("secret"))
    }
}

#[test]
fn test_login_redirect_for_anonymous() {
    let mut site = Site::new();
    site.route("secret", "/secret/", Secret).unwrap();

    let response = site.handle(get("/secret/"));
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.header("location"),
        Some("/accounts/login/?next=%2Fsecret%2F")
    );

    let request = HttpRequest::builder()
        .uri("/secret/")
        .identity(Identity::user("7"))
        .build()
        .unwrap();
    assert_eq!(site.handle(request).text().unwrap(), "secret");
}

struct Card;

impl View for Card {
    fn element(&self) -> Option<ElementMeta> {
        Some(ElementMeta::default().with_attr("class", "card"))
    }

    fn get(&self, _cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        Ok(Response::html("body"))
    }
}

struct Prewrapped;

impl View for Prewrapped {
    fn element(&self) -> Option<ElementMeta> {
        Some(ElementMeta::default())
    }

    fn get(&self, _cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        wrap_element(Response::html("inner"), &ElementMeta::new("own"))
    }
}

#[test]
fn test_element_wrapping() {
    let mut site = Site::new();
    site.route("card", "/card/", Card).unwrap();
    site.route("prewrapped", "/prewrapped/", Prewrapped).unwrap();

    assert_eq!(
        site.handle(get("/card/")).text().unwrap(),
        r#"<div id="Card" hx-target="this" hx-swap="outerHTML" class="card" hyperpony-element>body</div>"#
    );

    let text = site.handle(get("/prewrapped/")).text().unwrap().to_string();
    assert!(text.starts_with(r#"<div id="own""#));
    assert_eq!(text.matches("hyperpony-element").count(), 1);
}

struct WithSidebar {
    fragment: &'static str,
}

impl View for WithSidebar {
    fn get(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        cx.add_swap_oob(vec![Response::html(self.fragment)], SwapSpec::Default)?;
        Ok(Response::html("<main>M</main>"))
    }
}

#[test]
fn test_oob_fragment_appended_once() {
    let mut site = Site::new();
    site.route(
        "page",
        "/page/",
        WithSidebar {
            fragment: r#"<aside id="side">S</aside>"#,
        },
    )
    .unwrap();

    let text = site.handle(get("/page/")).text().unwrap().to_string();
    assert!(text.starts_with("<main>M</main>"));
    assert!(text.contains(r#"hx-swap-oob="outerHTML""#));
    assert_eq!(text.matches("<aside").count(), 1);
}

#[test]
fn test_oob_fragment_without_id_fails() {
    let mut site = Site::new();
    site.route(
        "page",
        "/page/",
        WithSidebar {
            fragment: "<aside>no id</aside>",
        },
    )
    .unwrap();

    let err = site.dispatch(get("/page/")).unwrap_err();
    assert!(matches!(err, HyperponyError::MissingRootElementId { .. }));
    assert_eq!(site.handle(get("/page/")).status(), StatusCode::INTERNAL_SERVER_ERROR);
}

struct Toggle;

impl View for Toggle {
    fn client_state(&self) -> Option<ClientStateSchema> {
        Some(
            ClientStateSchema::new()
                .field("count", ClientStateField::new(0).client_to_server())
                .field("label", ClientStateField::new("x")),
        )
    }

    fn get(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        let state = cx.client_state().cloned().unwrap_or_default();
        let count: i64 = state.get("count").unwrap_or_default();
        let label: String = state.get("label").unwrap_or_default();
        Ok(Response::html(format!(
            "<div {}>{count} {label} {}</div>",
            cx.client_state_attrs()?,
            state.is_present()
        )))
    }
}

fn htmx_post(uri: &str, body: &str) -> HttpRequest {
    HttpRequest::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .header("hx-request", "true")
        .body(body.to_string())
        .build()
        .unwrap()
}

#[test]
fn test_client_state_roundtrip_on_htmx_post() {
    let mut site = Site::new();
    site.route("toggle", "/toggle/", Toggle).unwrap();

    let text = site.handle(get("/toggle/")).text().unwrap().to_string();
    assert!(text.contains("__hyperpony_client_state__='Toggle'"));
    assert!(text.contains(r#"x-data='{"client_state":{"count":0,"label":"x"},"client_to_server_excludes":["label"]}'"#));
    assert!(text.ends_with("0 x false</div>"));

    let body = format!(
        "__hyperpony_cs__Toggle={}",
        urlencoding::encode(r#"{"count":5,"label":"y","other":1}"#)
    );
    let text = site.handle(htmx_post("/toggle/", &body)).text().unwrap().to_string();
    assert!(text.ends_with("5 x true</div>"));
}

#[test]
fn test_client_state_ignored_without_htmx_header() {
    let mut site = Site::new();
    site.route("toggle", "/toggle/", Toggle).unwrap();

    let body = format!("__hyperpony_cs__Toggle={}", urlencoding::encode(r#"{"count":5}"#));
    let text = site.handle(post_form("/toggle/", &body)).text().unwrap().to_string();
    assert!(text.ends_with("0 x false</div>"));
}

#[test]
fn test_client_state_kind_mismatch() {
    let mut site = Site::new();
    site.route("toggle", "/toggle/", Toggle).unwrap();

    let body = format!("__hyperpony_cs__Toggle={}", urlencoding::encode(r#"{"count":"five"}"#));
    let err = site.dispatch(htmx_post("/toggle/", &body)).unwrap_err();
    assert!(matches!(err, HyperponyError::ClientState { ref element_id, .. } if element_id == "Toggle"));
}

struct Form;

impl View for Form {
    fn params(&self) -> Vec<ParamDescriptor> {
        vec![ParamDescriptor::new("title").default("")]
    }

    fn handle_post(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<()> {
        let title: String = cx.require("title")?;
        cx.push_url(format!("/saved/{title}"))?;
        cx.swap_body()
    }

    fn get(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        let verb = if cx.is_post() { "post" } else { "get" };
        Ok(Response::html(format!("<p>{verb}</p>")))
    }
}

#[test]
fn test_post_runs_hook_then_renders() {
    let mut site = Site::new();
    site.route("form", "/form/", Form).unwrap();

    let response = site.handle(post_form("/form/", "title=draft"));
    assert_eq!(response.text().unwrap(), "<p>post</p>");
    assert_eq!(response.header("hx-push-url"), Some("/saved/draft"));
    assert_eq!(response.header("hx-retarget"), Some("body"));
    assert_eq!(response.header("hx-reswap"), Some("innerHTML"));

    let response = site.handle(get("/form/"));
    assert_eq!(response.text().unwrap(), "<p>get</p>");
    assert!(response.header("hx-push-url").is_none());
}

#[test]
fn test_head_renders_like_get() {
    let mut site = Site::new();
    site.route("form", "/form/", Form).unwrap();

    let request = HttpRequest::builder()
        .method(Method::HEAD)
        .uri("/form/")
        .build()
        .unwrap();
    assert_eq!(site.handle(request).status(), StatusCode::OK);
}
