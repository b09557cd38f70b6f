//! Per-request metrics regression tests

use super::helpers::*;
use serial_test::serial;
use std::time::Duration;
use tower_cluster_core::{Request, ResponseCode};

#[tokio::test]
#[serial]
async fn request_metrics_exist() {
    init_recorder();

    let client = client_answering("metrics_requests", ResponseCode::OK)
        .build()
        .unwrap();
    let _ = client.send(Request::get("ping"), Duration::from_secs(1)).await;

    assert_counter_exists("cluster_client_results_total");
    assert_metric_has_label("cluster_client_results_total", "service", "metrics_requests");
    assert_metric_has_label("cluster_client_results_total", "status", "Success");
    assert_eq!(
        counter_total("cluster_client_results_total", "service", "metrics_requests"),
        1
    );

    assert_histogram_exists("cluster_client_request_duration_seconds");
    assert_metric_has_label(
        "cluster_client_request_duration_seconds",
        "service",
        "metrics_requests",
    );
}

#[tokio::test]
#[serial]
async fn failed_request_status_label() {
    init_recorder();

    let client = client_answering("metrics_failures", ResponseCode::SERVICE_UNAVAILABLE)
        .build()
        .unwrap();
    let _ = client.send(Request::get("ping"), Duration::from_secs(1)).await;

    assert_metric_has_label("cluster_client_results_total", "status", "ReplicasExhausted");
}
