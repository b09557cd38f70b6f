use crate::sender::RequestSender;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tower_cluster_core::{Budget, Canceled, Replica, ReplicaResult, Request};

/// Drives attempts against an ordered list of replicas.
///
/// Implementations return the results of every attempt that produced one, in
/// the order the attempts were issued. Cancellation of the logical request
/// is the only error.
pub trait RequestStrategy: Send + Sync {
    fn send<'a>(
        &'a self,
        request: &'a Request,
        sender: &'a dyn RequestSender,
        budget: &'a Budget,
        replicas: &'a [Replica],
        replicas_count: usize,
        cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<ReplicaResult>, Canceled>>;
}
