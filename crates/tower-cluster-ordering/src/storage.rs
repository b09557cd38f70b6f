//! Per-replica state owned by the client.

use parking_lot::{Mutex, RwLock};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tower_cluster_core::Replica;

/// Concurrent map from replica to some piece of learned state.
pub struct ReplicaStorage<T> {
    entries: RwLock<HashMap<Replica, T>>,
}

impl<T> ReplicaStorage<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Applies `f` to the state of `replica`, creating it with `init` first if needed.
    pub fn update<I, F, R>(&self, replica: &Replica, init: I, f: F) -> R
    where
        I: FnOnce() -> T,
        F: FnOnce(&mut T) -> R,
    {
        let mut entries = self.entries.write();
        let state = entries.entry(replica.clone()).or_insert_with(init);
        f(state)
    }

    /// Reads the state of `replica` without creating it.
    pub fn read<F, R>(&self, replica: &Replica, f: F) -> Option<R>
    where
        F: FnOnce(&T) -> R,
    {
        self.entries.read().get(replica).map(f)
    }

    pub fn remove(&self, replica: &Replica) -> Option<T> {
        self.entries.write().remove(replica)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl<T: Clone> ReplicaStorage<T> {
    pub fn get(&self, replica: &Replica) -> Option<T> {
        self.entries.read().get(replica).cloned()
    }
}

impl<T> Default for ReplicaStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ReplicaStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicaStorage")
            .field("replicas", &self.len())
            .finish()
    }
}

type StorageKey = (TypeId, String);

/// Keyed collection of [`ReplicaStorage`]s.
///
/// Storages are identified by the type of state they hold and a key, so two
/// orderings that keep the same kind of state can still stay apart. A
/// provider is created per client and shared by everything in its pipeline.
#[derive(Default)]
pub struct ReplicaStorageProvider {
    storages: Mutex<HashMap<StorageKey, Arc<dyn Any + Send + Sync>>>,
}

impl ReplicaStorageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the storage for state `T` under `key`, creating it on first use.
    pub fn obtain<T>(&self, key: &str) -> Arc<ReplicaStorage<T>>
    where
        T: Send + Sync + 'static,
    {
        let mut storages = self.storages.lock();
        let entry = storages
            .entry((TypeId::of::<T>(), key.to_string()))
            .or_insert_with(|| Arc::new(ReplicaStorage::<T>::new()));

        if let Ok(storage) = Arc::clone(entry).downcast::<ReplicaStorage<T>>() {
            return storage;
        }

        // Unreachable while the key carries the TypeId; reset rather than panic.
        let storage = Arc::new(ReplicaStorage::<T>::new());
        *entry = Arc::clone(&storage) as Arc<dyn Any + Send + Sync>;
        storage
    }

    /// Number of distinct storages created so far.
    pub fn len(&self) -> usize {
        self.storages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.storages.lock().is_empty()
    }
}

impl fmt::Debug for ReplicaStorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicaStorageProvider")
            .field("storages", &self.len())
            .finish()
    }
}
