//! Whole-request retries through the client.

use super::support::{replicas, shared, Reply, ScriptedTransport};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tower_cluster_client::{
    AlwaysRetryPolicy, ClusterClient, ExponentialBackoffRetryStrategy, FixedRetryStrategy,
    FnRetryPolicy, ImmediateRetryStrategy,
};
use tower_cluster_core::{ClusterResultStatus, ReplicaResult, Request, ResponseCode};

#[tokio::test]
async fn no_retries_by_default() {
    let transport = shared(ScriptedTransport::new(Reply::unavailable()));
    let client = ClusterClient::builder()
        .transport(Arc::clone(&transport))
        .cluster(replicas(2))
        .build()
        .unwrap();

    let result = client.send(Request::get("orders"), Duration::from_secs(5)).await;

    assert_eq!(result.status(), ClusterResultStatus::ReplicasExhausted);
    assert_eq!(transport.sent().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn fixed_delays_between_attempts() {
    let transport = shared(ScriptedTransport::new(Reply::unavailable()));
    let client = ClusterClient::builder()
        .transport(Arc::clone(&transport))
        .cluster(replicas(1))
        .retry(
            AlwaysRetryPolicy,
            FixedRetryStrategy::new(3, Duration::from_millis(200)),
        )
        .build()
        .unwrap();
    let started = Instant::now();

    let result = client.send(Request::get("orders"), Duration::from_secs(5)).await;

    assert_eq!(result.status(), ClusterResultStatus::ReplicasExhausted);
    assert_eq!(transport.sent().len(), 3);
    assert_eq!(started.elapsed(), Duration::from_millis(400));
}

#[tokio::test(start_paused = true)]
async fn backoff_never_outlives_the_budget() {
    let transport = shared(ScriptedTransport::new(Reply::unavailable()));
    let client = ClusterClient::builder()
        .transport(Arc::clone(&transport))
        .cluster(replicas(1))
        .retry(
            AlwaysRetryPolicy,
            ExponentialBackoffRetryStrategy::new(10, Duration::from_secs(1)),
        )
        .build()
        .unwrap();
    let started = Instant::now();

    let result = client.send(Request::get("orders"), Duration::from_secs(5)).await;

    // 1s + 2s fit into the budget, the next 4s delay does not
    assert_eq!(transport.sent().len(), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(3));
    assert_eq!(result.status(), ClusterResultStatus::ReplicasExhausted);
}

#[tokio::test]
async fn policies_can_inspect_the_attempts() {
    let transport = shared(ScriptedTransport::new(Reply::code(ResponseCode(500))));
    let client = ClusterClient::builder()
        .transport(Arc::clone(&transport))
        .cluster(replicas(1))
        .retry(
            FnRetryPolicy::new(|results: &[ReplicaResult]| {
                results
                    .iter()
                    .all(|r| r.response().code() == ResponseCode::SERVICE_UNAVAILABLE)
            }),
            ImmediateRetryStrategy::new(5),
        )
        .build()
        .unwrap();

    client.send(Request::get("orders"), Duration::from_secs(5)).await;

    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn successful_requests_are_not_retried() {
    let transport = shared(ScriptedTransport::new(Reply::ok()));
    let client = ClusterClient::builder()
        .transport(Arc::clone(&transport))
        .cluster(replicas(3))
        .retry(AlwaysRetryPolicy, ImmediateRetryStrategy::new(5))
        .build()
        .unwrap();

    let result = client.send(Request::get("orders"), Duration::from_secs(5)).await;

    assert!(result.is_success());
    assert_eq!(transport.sent().len(), 1);
}
