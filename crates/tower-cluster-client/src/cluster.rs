//! Where replicas come from.

use std::sync::Arc;
use tower_cluster_core::Replica;

/// Supplies the current replica set of a service.
///
/// Called once per logical request; implementations backed by service
/// discovery should return a cached snapshot.
pub trait ClusterProvider: Send + Sync {
    fn replicas(&self) -> Vec<Replica>;
}

impl<T: ClusterProvider + ?Sized> ClusterProvider for Arc<T> {
    fn replicas(&self) -> Vec<Replica> {
        (**self).replicas()
    }
}

/// A static replica list.
#[derive(Debug, Clone, Default)]
pub struct FixedClusterProvider {
    replicas: Vec<Replica>,
}

impl FixedClusterProvider {
    pub fn new(replicas: Vec<Replica>) -> Self {
        Self { replicas }
    }

    /// Parses every URL into a replica.
    pub fn from_urls<I, S>(urls: I) -> Result<Self, url::ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let replicas = urls
            .into_iter()
            .map(|url| url.as_ref().parse())
            .collect::<Result<Vec<Replica>, _>>()?;
        Ok(Self::new(replicas))
    }
}

impl ClusterProvider for FixedClusterProvider {
    fn replicas(&self) -> Vec<Replica> {
        self.replicas.clone()
    }
}
