//! Adaptive throttling metrics regression tests

use super::helpers::*;
use serial_test::serial;
use std::time::Duration;
use tower_cluster_core::{Request, ResponseCode};
use tower_cluster_throttling::AdaptiveThrottlingOptions;

#[tokio::test]
#[serial]
async fn throttling_metrics_exist() {
    init_recorder();

    let options = AdaptiveThrottlingOptions::builder("metrics_throttling")
        .minimum_requests(1)
        .probability_cap(1.0)
        .build()
        .unwrap();
    let client = client_answering("metrics_throttling", ResponseCode::SERVICE_UNAVAILABLE)
        .adaptive_throttling(options)
        .build()
        .unwrap();

    // with nothing accepted the probability climbs towards the cap
    for _ in 0..50 {
        let _ = client.send(Request::get("ping"), Duration::from_secs(1)).await;
    }

    assert_gauge_exists("cluster_client_rejection_probability");
    assert_metric_has_label(
        "cluster_client_rejection_probability",
        "service",
        "metrics_throttling",
    );

    assert_counter_exists("cluster_client_throttled_total");
    assert_metric_has_label("cluster_client_throttled_total", "service", "metrics_throttling");
    assert_metric_has_label("cluster_client_results_total", "status", "Throttled");
}
