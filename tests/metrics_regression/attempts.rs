//! Per-attempt metrics regression tests

use super::helpers::*;
use serial_test::serial;
use std::time::Duration;
use tower_cluster_core::{Request, ResponseCode};

#[tokio::test]
#[serial]
async fn attempt_metrics_exist() {
    init_recorder();

    let client = client_answering("metrics_attempts", ResponseCode::OK)
        .build()
        .unwrap();
    let _ = client.send(Request::get("ping"), Duration::from_secs(1)).await;

    assert_counter_exists("cluster_client_attempts_total");
    assert_metric_has_label("cluster_client_attempts_total", "service", "metrics_attempts");
    assert_metric_has_label("cluster_client_attempts_total", "verdict", "accept");
}

#[tokio::test]
#[serial]
async fn rejected_attempt_verdict_label() {
    init_recorder();

    let client = client_answering("metrics_rejects", ResponseCode::SERVICE_UNAVAILABLE)
        .build()
        .unwrap();
    let _ = client.send(Request::get("ping"), Duration::from_secs(1)).await;

    assert_metric_has_label("cluster_client_attempts_total", "verdict", "reject");
    // both replicas were tried once
    assert_eq!(
        counter_total("cluster_client_attempts_total", "service", "metrics_rejects"),
        2
    );
}
