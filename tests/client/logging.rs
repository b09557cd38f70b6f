//! Log records emitted per request and per attempt.

use super::support::{replicas, shared, Reply, ScriptedTransport};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tower_cluster_client::{ClusterClient, LoggingOptions};
use tower_cluster_core::Request;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Collects the message of every event.
#[derive(Clone, Default)]
struct Messages(Arc<Mutex<Vec<String>>>);

impl Messages {
    fn count(&self, message: &str) -> usize {
        self.0.lock().iter().filter(|m| m.as_str() == message).count()
    }
}

struct MessageVisitor(Option<String>);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{value:?}"));
        }
    }
}

impl<S: Subscriber> Layer<S> for Messages {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(None);
        event.record(&mut visitor);
        if let Some(message) = visitor.0 {
            self.0.lock().push(message);
        }
    }
}

async fn send_logged(logging: LoggingOptions) -> Messages {
    let messages = Messages::default();
    let subscriber = tracing_subscriber::registry().with(messages.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let transport = shared(
        ScriptedTransport::new(Reply::ok()).reply("replica1:8080", Reply::unavailable()),
    );
    let client = ClusterClient::builder()
        .transport(transport)
        .cluster(replicas(2))
        .logging(logging)
        .build()
        .unwrap();
    client.send(Request::get("audit"), Duration::from_secs(5)).await;

    messages
}

#[tokio::test]
async fn logs_requests_and_attempts_by_default() {
    let messages = send_logged(LoggingOptions::default()).await;

    assert_eq!(messages.count("sending request"), 1);
    assert_eq!(messages.count("request succeeded"), 1);
    assert_eq!(messages.count("sending request to replica"), 2);
    assert_eq!(messages.count("received response from replica"), 2);
}

#[tokio::test]
async fn attempt_logging_can_be_turned_off() {
    let messages = send_logged(LoggingOptions {
        replica_requests: false,
        replica_results: false,
        ..LoggingOptions::default()
    })
    .await;

    assert_eq!(messages.count("sending request"), 1);
    assert_eq!(messages.count("sending request to replica"), 0);
    assert_eq!(messages.count("received response from replica"), 0);
}

#[tokio::test]
async fn request_logging_can_be_turned_off() {
    let messages = send_logged(LoggingOptions {
        requests: false,
        results: false,
        ..LoggingOptions::default()
    })
    .await;

    assert_eq!(messages.count("sending request"), 0);
    assert_eq!(messages.count("request succeeded"), 0);
    assert_eq!(messages.count("sending request to replica"), 2);
}
