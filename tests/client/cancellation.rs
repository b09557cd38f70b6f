//! Caller cancellation stops the whole request.

use super::support::{replicas, shared, Reply, ScriptedTransport};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_cluster_client::{AlwaysRetryPolicy, ClusterClient, FixedRetryStrategy};
use tower_cluster_core::{ClusterResultStatus, Request};
use tower_cluster_strategy::ParallelRequestStrategy;

async fn cancel_after(token: CancellationToken, after: Duration) {
    tokio::time::sleep(after).await;
    token.cancel();
}

#[tokio::test(start_paused = true)]
async fn cancels_a_sequential_request_in_flight() {
    let transport = shared(ScriptedTransport::new(
        Reply::ok().after(Duration::from_secs(10)),
    ));
    let client = ClusterClient::builder()
        .transport(Arc::clone(&transport))
        .cluster(replicas(3))
        .build()
        .unwrap();
    let token = CancellationToken::new();
    let started = Instant::now();

    let (result, _) = tokio::join!(
        client.send_with_cancellation(Request::get("stock"), Duration::from_secs(60), token.clone()),
        cancel_after(token, Duration::from_secs(2)),
    );

    assert_eq!(result.status(), ClusterResultStatus::Canceled);
    assert!(result.replica_results().is_empty());
    assert!(result.response().is_none());
    assert_eq!(started.elapsed(), Duration::from_secs(2));
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancels_every_parallel_attempt() {
    let transport = shared(ScriptedTransport::new(
        Reply::ok().after(Duration::from_secs(10)),
    ));
    let client = ClusterClient::builder()
        .transport(Arc::clone(&transport))
        .cluster(replicas(3))
        .strategy(ParallelRequestStrategy::new(3).unwrap())
        .build()
        .unwrap();
    let token = CancellationToken::new();
    let started = Instant::now();

    let (result, _) = tokio::join!(
        client.send_with_cancellation(Request::get("stock"), Duration::from_secs(60), token.clone()),
        cancel_after(token, Duration::from_secs(1)),
    );

    assert_eq!(result.status(), ClusterResultStatus::Canceled);
    assert_eq!(started.elapsed(), Duration::from_secs(1));
    assert_eq!(transport.sent().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_retry_delays() {
    let transport = shared(ScriptedTransport::new(Reply::unavailable()));
    let client = ClusterClient::builder()
        .transport(Arc::clone(&transport))
        .cluster(replicas(1))
        .retry(
            AlwaysRetryPolicy,
            FixedRetryStrategy::new(5, Duration::from_secs(10)),
        )
        .build()
        .unwrap();
    let token = CancellationToken::new();

    let (result, _) = tokio::join!(
        client.send_with_cancellation(Request::get("stock"), Duration::from_secs(60), token.clone()),
        cancel_after(token, Duration::from_secs(3)),
    );

    // the delay is abandoned and no further attempt is made
    assert_eq!(result.status(), ClusterResultStatus::Canceled);
    assert_eq!(transport.sent().len(), 1);
}
