//! HTTP end-to-end tests against a server on an ephemeral port.

use assetpress_core::AssetKind;
use assetpress_tests::*;
use pretty_assertions::assert_eq;
use std::time::Duration;

const ASSET_STATE: &str = "x-asset-state";

async fn serve(ctx: &TestContext) -> ApiTestClient {
    init_test_logging();
    let (addr, _handle) = start_test_server(ctx.app_state())
        .await
        .expect("Failed to start test server");
    ApiTestClient::new(addr)
}

fn state_of(resp: &reqwest::Response) -> String {
    resp.headers()
        .get(ASSET_STATE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::builder().build();
    let client = serve(&ctx).await;

    assert!(client.health().await.unwrap());
    let body: serde_json::Value = client.get("/health").await.unwrap().json().await.unwrap();
    assert_eq!(body["compression"], "enabled");
}

#[tokio::test]
async fn test_js_group_compresses_across_requests() {
    let ctx = TestContext::builder().build();
    let client = serve(&ctx).await;
    let payload = ctx.payload(AssetKind::Js, &["js/a.js", "js/b.js"], "agroup");
    let path = payload.path(false);

    let first = client.get(&path).await.unwrap();
    assert_eq!(first.status(), 200);
    assert_eq!(state_of(&first), "original");
    assert_eq!(
        first.headers()["content-type"].to_str().unwrap(),
        "application/javascript"
    );
    assert!(first.headers().contains_key("x-request-id"));
    assert_eq!(first.text().await.unwrap(), "var alpha = 1;\nvar beta = 2;\n");

    let ready = wait_for(Duration::from_secs(5), Duration::from_millis(20), || {
        let client = &client;
        let path = path.clone();
        async move {
            match client.get(&path).await {
                Ok(resp) => state_of(&resp) == "ready",
                Err(_) => false,
            }
        }
    })
    .await;
    assert!(ready);

    let body = client.get(&path).await.unwrap().text().await.unwrap();
    assert!(body.starts_with("/* js/a.js, js/b.js \n   Compressed: "));
    assert!(body.ends_with("VAR ALPHA = 1;\nVAR BETA = 2;\n"));
}

#[tokio::test]
async fn test_css_append_route() {
    let ctx = TestContext::builder().build();
    let client = serve(&ctx).await;
    let payload = ctx.payload(AssetKind::Css, &["css/site.css"], "styles");

    let resp = client.get(&payload.path(true)).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(state_of(&resp), "appended");
    assert_eq!(resp.headers()["content-type"].to_str().unwrap(), "text/css");
    assert_eq!(resp.text().await.unwrap(), "body { color: red; }\n");
}

#[tokio::test]
async fn test_tampered_signature_is_rejected_as_comment() {
    let ctx = TestContext::builder().build();
    let client = serve(&ctx).await;
    let payload = ctx.payload(AssetKind::Js, &["js/a.js"], "agroup");

    let mut sig = payload.signature().to_string();
    let last = if sig.ends_with('0') { '1' } else { '0' };
    sig.pop();
    sig.push(last);
    let path = format!("/j/agroup/{}/c/{}.js", payload.token(), sig);

    let resp = client.get(&path).await.unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "/* Invalid Request */");
    assert!(ctx.cache.writes().is_empty());
}

#[tokio::test]
async fn test_wrong_extension_and_group_rejected() {
    let ctx = TestContext::builder().build();
    let client = serve(&ctx).await;
    let payload = ctx.payload(AssetKind::Js, &["js/a.js"], "agroup");

    let css_ext = format!("/j/agroup/{}/c/{}.css", payload.token(), payload.signature());
    assert_eq!(client.get(&css_ext).await.unwrap().status(), 400);

    let bad_group = format!("/j/a.group/{}/c/{}.js", payload.token(), payload.signature());
    assert_eq!(client.get(&bad_group).await.unwrap().status(), 400);
}

#[tokio::test]
async fn test_debug_mode_exposes_error() {
    let ctx = TestContext::builder().config(|c| c.debug = true).build();
    let client = serve(&ctx).await;
    let payload = ctx.payload(AssetKind::Js, &["js/a.js"], "agroup");

    let path = format!("/j/other/{}/c/{}.js", payload.token(), payload.signature());
    let resp = client.get(&path).await.unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "/* Invalid payload: Invalid Signature */");
}

#[tokio::test]
async fn test_inline_scripts_are_collapsed() {
    let ctx = TestContext::builder().build();
    let client = serve(&ctx).await;
    let html = "<p>x</p><script>var a = 1;</script><script>var b = 2;</script>";

    let resp = client.post_text("/inline", html).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.text().await.unwrap(),
        "\n<script type=\"text/javascript\">\nvar a = 1;var b = 2;\n</script>\n"
    );
}
