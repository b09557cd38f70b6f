//! Adaptive throttling wired into the client.

use super::support::{replicas, shared, Reply, ScriptedTransport};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower_cluster_client::ClusterClient;
use tower_cluster_core::{ClusterResultStatus, Request, Transport};
use tower_cluster_throttling::{AdaptiveThrottlingOptions, ThrottlingEvent, ThrottlingStore};

fn options(service: &str) -> AdaptiveThrottlingOptions {
    AdaptiveThrottlingOptions::builder(service)
        .minimum_requests(10)
        .build()
        .unwrap()
}

fn throttled_client(
    transport: Arc<dyn Transport>,
    store: Arc<ThrottlingStore>,
) -> ClusterClient {
    ClusterClient::builder()
        .service_name("ledger")
        .transport(transport)
        .cluster(replicas(1))
        .adaptive_throttling(options("ledger"))
        .throttling_store(store)
        .build()
        .unwrap()
}

#[tokio::test]
async fn healthy_services_are_never_throttled() {
    let transport = shared(ScriptedTransport::new(Reply::ok()));
    let client = throttled_client(transport.clone(), Arc::new(ThrottlingStore::new()));

    for _ in 0..100 {
        let result = client.send(Request::get("entries"), Duration::from_secs(5)).await;
        assert!(result.is_success());
    }

    assert_eq!(transport.sent().len(), 100);
}

#[tokio::test]
async fn quiet_failures_below_the_minimum_pass_through() {
    let transport = shared(ScriptedTransport::new(Reply::unavailable()));
    let client = throttled_client(transport.clone(), Arc::new(ThrottlingStore::new()));

    for _ in 0..10 {
        let result = client.send(Request::get("entries"), Duration::from_secs(5)).await;
        assert_eq!(result.status(), ClusterResultStatus::ReplicasExhausted);
    }

    assert_eq!(transport.sent().len(), 10);
}

#[tokio::test]
async fn failing_services_get_shed_locally() {
    let transport = shared(ScriptedTransport::new(Reply::unavailable()));
    let shed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&shed);
    let client = ClusterClient::builder()
        .service_name("ledger")
        .transport(transport.clone())
        .cluster(replicas(1))
        .adaptive_throttling(options("ledger"))
        .on_throttling_event(move |event| {
            if matches!(event, ThrottlingEvent::RequestThrottled { .. }) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build()
        .unwrap();

    let mut throttled = 0;
    for _ in 0..200 {
        let result = client.send(Request::get("entries"), Duration::from_secs(5)).await;
        if result.status() == ClusterResultStatus::Throttled {
            assert!(result.replica_results().is_empty());
            throttled += 1;
        }
    }

    assert!(throttled > 0);
    assert_eq!(shed.load(Ordering::SeqCst), throttled);
    assert_eq!(transport.sent().len(), 200 - throttled);
}

#[tokio::test]
async fn clients_sharing_a_store_share_the_verdict() {
    let store = Arc::new(ThrottlingStore::new());
    let failing = shared(ScriptedTransport::new(Reply::unavailable()));
    let first = throttled_client(failing.clone(), Arc::clone(&store));
    for _ in 0..50 {
        first.send(Request::get("entries"), Duration::from_secs(5)).await;
    }

    let healthy = shared(ScriptedTransport::new(Reply::ok()));
    let second = throttled_client(healthy.clone(), Arc::clone(&store));
    let mut throttled = 0;
    for _ in 0..50 {
        let result = second.send(Request::get("entries"), Duration::from_secs(5)).await;
        if result.status() == ClusterResultStatus::Throttled {
            throttled += 1;
        }
    }

    assert_eq!(store.len(), 1);
    assert!(throttled > 0);
}
