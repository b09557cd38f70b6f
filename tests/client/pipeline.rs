//! Pipeline behaviour visible from the outside.

use super::support::{authority, replicas, shared, Reply, ScriptedTransport};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower_cluster_client::{ClusterClient, FixedClusterProvider};
use tower_cluster_core::criteria::AlwaysRejectCriterion;
use tower_cluster_core::{
    ClusterResult, ClusterResultStatus, Next, Replica, Request, RequestContext, RequestModule,
    Response, ResponseCode, ResponseCriterion, ResponseVerdict, SharedCriterion,
};
use tower_cluster_ordering::AdaptiveHealthOrdering;

fn client(transport: Arc<ScriptedTransport>, count: usize) -> ClusterClient {
    ClusterClient::builder()
        .service_name("inventory")
        .transport(transport)
        .cluster(replicas(count))
        .build()
        .unwrap()
}

#[tokio::test]
async fn first_accepting_replica_wins() {
    let transport = shared(
        ScriptedTransport::new(Reply::ok())
            .reply(&authority(1), Reply::unavailable())
            .reply(&authority(2), Reply::code(ResponseCode(502))),
    );
    let client = client(Arc::clone(&transport), 3);

    let result = client.send(Request::get("items/42"), Duration::from_secs(5)).await;

    assert_eq!(result.status(), ClusterResultStatus::Success);
    assert_eq!(transport.sent(), vec![authority(1), authority(2), authority(3)]);
    assert_eq!(result.replica().map(Replica::authority), Some(authority(3)));
    let verdicts: Vec<_> = result.replica_results().iter().map(|r| r.verdict()).collect();
    assert_eq!(
        verdicts,
        vec![
            ResponseVerdict::Reject,
            ResponseVerdict::Reject,
            ResponseVerdict::Accept
        ]
    );
}

#[tokio::test]
async fn client_errors_are_accepted_without_failover() {
    let transport = shared(ScriptedTransport::new(Reply::code(ResponseCode(404))));
    let client = client(Arc::clone(&transport), 3);

    let result = client.send(Request::get("items/missing"), Duration::from_secs(5)).await;

    assert_eq!(result.status(), ClusterResultStatus::Success);
    assert_eq!(result.response().map(Response::code), Some(ResponseCode(404)));
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn rejected_everywhere_is_replicas_exhausted() {
    let transport = shared(ScriptedTransport::new(Reply::unavailable()));
    let client = client(Arc::clone(&transport), 2);

    let result = client.send(Request::get("items"), Duration::from_secs(5)).await;

    assert_eq!(result.status(), ClusterResultStatus::ReplicasExhausted);
    assert_eq!(result.replica_results().len(), 2);
    assert_eq!(
        result.response().map(Response::code),
        Some(ResponseCode::SERVICE_UNAVAILABLE)
    );
}

#[tokio::test]
async fn at_most_three_replicas_by_default() {
    let transport = shared(ScriptedTransport::new(Reply::unavailable()));
    let client = client(Arc::clone(&transport), 5);

    client.send(Request::get("items"), Duration::from_secs(5)).await;

    assert_eq!(transport.sent().len(), 3);
}

#[tokio::test]
async fn empty_cluster_is_replicas_not_found() {
    let transport = shared(ScriptedTransport::new(Reply::ok()));
    let client = ClusterClient::builder()
        .transport(Arc::clone(&transport))
        .cluster(FixedClusterProvider::default())
        .build()
        .unwrap();

    let result = client.send(Request::get("items"), Duration::from_secs(5)).await;

    assert_eq!(result.status(), ClusterResultStatus::ReplicasNotFound);
    assert!(result.response().is_none());
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn absolute_urls_skip_replica_selection() {
    let transport = shared(ScriptedTransport::new(Reply::ok()));
    let client = client(Arc::clone(&transport), 3);

    let result = client
        .send(Request::get("http://gateway:9000/health"), Duration::from_secs(5))
        .await;

    assert!(result.is_success());
    assert_eq!(transport.sent(), vec!["gateway:9000".to_string()]);
    assert_eq!(result.replica_results().len(), 1);
}

#[tokio::test]
async fn bodies_on_get_are_incorrect_arguments() {
    let transport = shared(ScriptedTransport::new(Reply::ok()));
    let client = client(Arc::clone(&transport), 3);

    let result = client
        .send(Request::get("items").with_body("{}"), Duration::from_secs(5))
        .await;

    assert_eq!(result.status(), ClusterResultStatus::IncorrectArguments);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn zero_budget_is_time_expired() {
    let transport = shared(ScriptedTransport::new(Reply::ok()));
    let client = client(Arc::clone(&transport), 3);

    let result = client.send(Request::get("items"), Duration::ZERO).await;

    assert_eq!(result.status(), ClusterResultStatus::TimeExpired);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn custom_criteria_replace_the_defaults() {
    let transport = shared(ScriptedTransport::new(Reply::ok()));
    let client = ClusterClient::builder()
        .transport(Arc::clone(&transport))
        .cluster(replicas(2))
        .criteria(vec![Arc::new(AlwaysRejectCriterion) as SharedCriterion])
        .build()
        .unwrap();

    let result = client.send(Request::get("items"), Duration::from_secs(5)).await;

    assert_eq!(result.status(), ClusterResultStatus::ReplicasExhausted);
    assert_eq!(transport.sent().len(), 2);
}

/// Abstains on everything.
struct Undecided;

impl ResponseCriterion for Undecided {
    fn decide(&self, _response: &Response) -> ResponseVerdict {
        ResponseVerdict::DontKnow
    }
}

#[tokio::test]
async fn undecided_responses_are_accepted() {
    let transport = shared(ScriptedTransport::new(Reply::unavailable()));
    let client = ClusterClient::builder()
        .transport(Arc::clone(&transport))
        .cluster(replicas(2))
        .criteria(vec![Arc::new(Undecided) as SharedCriterion])
        .build()
        .unwrap();

    let result = client.send(Request::get("items"), Duration::from_secs(5)).await;

    assert_eq!(result.status(), ClusterResultStatus::Success);
    assert_eq!(transport.sent().len(), 1);
}

/// Adds a header and counts how often it ran.
struct Tagging {
    calls: AtomicUsize,
}

impl RequestModule for Tagging {
    fn execute<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ClusterResult> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let request = ctx.request().clone().with_header("x-tag", "blue");
            ctx.set_request(request);
            next.run(ctx).await
        })
    }
}

#[tokio::test]
async fn custom_modules_see_every_request() {
    let transport = shared(ScriptedTransport::new(Reply::ok()));
    let tagging = Arc::new(Tagging {
        calls: AtomicUsize::new(0),
    });
    let client = ClusterClient::builder()
        .transport(Arc::clone(&transport))
        .cluster(replicas(1))
        .module(Arc::clone(&tagging))
        .build()
        .unwrap();

    let result = client.send(Request::get("items"), Duration::from_secs(5)).await;

    assert_eq!(tagging.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        result.request().headers().get("x-tag").map(|v| v.to_str().unwrap()),
        Some("blue")
    );
}

#[tokio::test]
async fn health_ordering_moves_traffic_away_from_failing_replicas() {
    let transport = shared(
        ScriptedTransport::new(Reply::ok()).reply(&authority(1), Reply::unavailable()),
    );
    let client = ClusterClient::builder()
        .transport(Arc::clone(&transport))
        .cluster(replicas(3))
        .ordering(AdaptiveHealthOrdering::default())
        .build()
        .unwrap();

    client.send(Request::get("items"), Duration::from_secs(5)).await;
    transport.clear();
    for _ in 0..10 {
        client.send(Request::get("items"), Duration::from_secs(5)).await;
    }

    assert!(!transport.sent().contains(&authority(1)));
}

#[tokio::test]
async fn clones_share_replica_state() {
    let transport = shared(ScriptedTransport::new(Reply::ok()));
    let client = client(transport, 2);
    let clone = client.clone();

    assert!(Arc::ptr_eq(client.replica_storage(), clone.replica_storage()));
    assert!(Arc::ptr_eq(client.throttling_store(), clone.throttling_store()));
}
