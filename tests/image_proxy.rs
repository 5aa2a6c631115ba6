//! End-to-end tests for the image proxy: a bound loopback listener, a
//! wiremock upstream, and the thumbnail loader fetching through the
//! rewritten URL exactly as grid cells do.

use mosaic::image::{fetch_thumbnail, proxy_url};
use mosaic::proxy;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Bind the proxy on an ephemeral loopback port and return its origin.
async fn start_proxy() -> String {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(proxy::serve(listener, reqwest::Client::new()));
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_thumbnail_loads_through_served_proxy() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photos/1.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
                .insert_header("Content-Type", "image/jpeg"),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let proxy_base = start_proxy().await;
    let url = proxy_url(&proxy_base, &format!("{}/photos/1.jpg", upstream.uri()));

    let client = reqwest::Client::new();
    let bytes = fetch_thumbnail(&client, &url).await.unwrap();
    assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF, 0xE0]);
}

#[tokio::test]
async fn test_proxy_sets_one_day_cache_directive() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![1])
                .insert_header("Content-Type", "image/png"),
        )
        .mount(&upstream)
        .await;

    let proxy_base = start_proxy().await;
    let url = proxy_url(&proxy_base, &format!("{}/p.png", upstream.uri()));

    let response = reqwest::Client::new().get(&url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response
            .headers()
            .get("cache-control")
            .and_then(|v| v.to_str().ok()),
        Some(proxy::CACHE_CONTROL_VALUE)
    );
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("image/png")
    );
}

#[tokio::test]
async fn test_missing_url_parameter_is_rejected() {
    let proxy_base = start_proxy().await;
    let response = reqwest::Client::new()
        .get(format!("{}/api/image-proxy", proxy_base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_upstream_error_maps_to_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;

    let proxy_base = start_proxy().await;
    let url = proxy_url(&proxy_base, &format!("{}/gone.jpg", upstream.uri()));

    let response = reqwest::Client::new().get(&url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 502);
}
