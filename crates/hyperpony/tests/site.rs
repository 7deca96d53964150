//! A site assembled through the facade, driven by configuration.

use hyperpony::config::{LoggingConfig, MetricsConfig, ParamsConfig, ViewsConfig};
use hyperpony::prelude::*;
use hyperpony_test::TestClient;

struct Inbox;

impl View for Inbox {
    fn config(&self) -> ViewConfig {
        ViewConfig::default().login_required()
    }

    fn params(&self) -> Vec<ParamDescriptor> {
        vec![ParamDescriptor::new("page")
            .target(TargetType::Int)
            .default(1_i64)]
    }

    fn get(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        let page: i64 = cx.require("page")?;
        let badge = cx.render_nested(&Badge, ParamValues::new())?;
        Ok(Response::html(format!("<h1>page {page}</h1>{badge}")))
    }
}

struct Badge;

impl View for Badge {
    fn config(&self) -> ViewConfig {
        ViewConfig::default().with_isolate_request(false)
    }

    fn params(&self) -> Vec<ParamDescriptor> {
        vec![ParamDescriptor::new("page").default("none")]
    }

    fn element(&self) -> Option<ElementMeta> {
        Some(ElementMeta::new("badge").with_tag("span"))
    }

    fn get(&self, cx: &mut ViewContext<'_>) -> HyperponyResult<Response> {
        let page: String = cx.require("page")?;
        Ok(Response::html(page))
    }
}

fn config(ignore_view_stack: bool) -> HyperponyConfig {
    HyperponyConfig::builder()
        .logging(LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        })
        .metrics(MetricsConfig { enabled: false })
        .params(ParamsConfig {
            ignore_view_stack,
            ..ParamsConfig::default()
        })
        .views(ViewsConfig {
            login_url: "/signin/".to_string(),
            ..ViewsConfig::default()
        })
        .build()
}

fn client(ignore_view_stack: bool) -> TestClient {
    let mut site = hyperpony::init(config(ignore_view_stack)).unwrap();
    site.route("inbox", "/inbox/", Inbox).unwrap();
    TestClient::new(site)
}

#[test]
fn test_configured_login_url() {
    client(false)
        .get("/inbox/?page=2")
        .send()
        .assert_redirect("/signin/?next=%2Finbox%2F");
}

#[test]
fn test_nested_view_ignores_outer_query() {
    client(false)
        .get("/inbox/?page=2")
        .user("ada")
        .send()
        .assert_success()
        .assert_contains("<h1>page 2</h1>")
        .assert_contains(r#"<span id="badge""#)
        .assert_contains(">none</span>");
}

#[test]
fn test_ignore_view_stack_reads_outer_query() {
    client(true)
        .get("/inbox/?page=2")
        .user("ada")
        .send()
        .assert_success()
        .assert_contains(">2</span>");
}

#[test]
fn test_bad_page_is_server_error() {
    client(false)
        .get("/inbox/?page=two")
        .user("ada")
        .send()
        .assert_status(http::StatusCode::INTERNAL_SERVER_ERROR);
}
