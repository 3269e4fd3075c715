//! End-to-end breaker behaviour against real sockets.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;

mod common;

#[tokio::test]
async fn healthy_upstream_is_relayed_as_json() {
    let upstream = common::start_mock_upstream(r#"{"ok":true}"#).await;
    let proxy = common::start_proxy(upstream).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    let res = common::client()
        .get(proxy.url("/some/path?x=1"))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert!(res.headers().contains_key("x-request-id"));

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "ok": true }));

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn refused_upstream_opens_breaker() {
    let upstream = common::unused_addr().await;
    let proxy = common::start_proxy(upstream).await;

    // First probe fires immediately and fails fast.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let client = common::client();
    for _ in 0..5 {
        let res = client.post(proxy.url("/")).send().await.expect("Proxy unreachable");
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.headers()["access-control-allow-origin"], "*");
        assert_eq!(res.text().await.unwrap(), "Circuit Breaker Detected Failure");
    }

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn slow_upstream_throttles_half_the_traffic() {
    let hits = Arc::new(AtomicU32::new(0));
    let h = hits.clone();
    let upstream = common::start_programmable_upstream(move || {
        let h = h.clone();
        async move {
            h.fetch_add(1, Ordering::SeqCst);
            (Duration::from_millis(5_500), r#"{"slow":true}"#.to_string())
        }
    })
    .await;
    let proxy = common::start_proxy(upstream).await;

    // Wait for the first probe (5.5s) to classify the upstream.
    tokio::time::sleep(Duration::from_millis(6_000)).await;
    let probes = hits.load(Ordering::SeqCst);

    let client = common::client();
    let first = client.get(proxy.url("/")).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(first.text().await.unwrap(), "Circuit Breaker Limiting Traffic");

    let second = client.get(proxy.url("/")).send().await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.text().await.unwrap(), r#"{"slow":true}"#);

    // Only the admitted request (plus any monitor probes) reached the upstream.
    assert!(hits.load(Ordering::SeqCst) >= probes + 1);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn shutdown_stops_server_and_monitor() {
    let upstream = common::start_mock_upstream("{}").await;
    let proxy = common::start_proxy(upstream).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    proxy.shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), proxy.handle)
        .await
        .expect("server should stop after shutdown")
        .unwrap();
    assert!(result.is_ok());
}
