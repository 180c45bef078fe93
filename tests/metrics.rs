//! Prometheus exposition on technical listeners.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use service_orchestrator::observability::metrics::init_metrics;
use service_orchestrator::{with_tech_http_server, Service};

mod common;
use common::{eventually, free_addr};

#[tokio::test]
async fn metrics_endpoint_renders_recorded_series() {
    assert!(init_metrics().is_some());

    let address = free_addr().await;
    let service = Service::new(
        CancellationToken::new(),
        "orders",
        vec![with_tech_http_server(address.clone())],
    )
    .unwrap();

    let svc = service.clone();
    let task = tokio::spawn(async move { svc.start().await });
    assert!(eventually(Duration::from_secs(5), || service.is_alive()).await);
    service.ready().await;

    let res = reqwest::get(format!("http://{address}/metrics")).await.unwrap();
    assert_eq!(res.status(), 200);
    let body = res.text().await.unwrap();
    assert!(body.contains("service_ready"));
    assert!(body.contains("service_alive"));

    service.stop().await;
    task.await.unwrap().unwrap();
}
