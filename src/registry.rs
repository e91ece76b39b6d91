// MIT License - Copyright (c) 2026 Peter Wright
// Named registries of pipeline consumers

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use tokio::sync::RwLock;

/// Append/remove-only collection of named consumers (notifiers, storages).
///
/// The pipeline iterates a snapshot taken before each dispatch, so consumers
/// may register or remove themselves while an event is being delivered.
pub struct Registry<T: ?Sized> {
    inner: Arc<RwLock<BTreeMap<String, Arc<T>>>>,
}

impl<T: ?Sized> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl<T: ?Sized> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that does not keep the registry (or its entries) alive.
    ///
    /// Consumers that register themselves hold one of these, otherwise the
    /// registry and the consumer would own each other.
    pub fn downgrade(&self) -> WeakRegistry<T> {
        WeakRegistry {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Add a consumer under `name`, returning any consumer it replaced.
    pub async fn register(&self, name: impl Into<String>, item: Arc<T>) -> Option<Arc<T>> {
        self.inner.write().await.insert(name.into(), item)
    }

    pub async fn remove(&self, name: &str) -> Option<Arc<T>> {
        self.inner.write().await.remove(name)
    }

    pub async fn get(&self, name: &str) -> Option<Arc<T>> {
        self.inner.read().await.get(name).cloned()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.inner.read().await.contains_key(name)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Stable copy of the current entries, in name order.
    pub async fn snapshot(&self) -> Vec<(String, Arc<T>)> {
        self.inner
            .read()
            .await
            .iter()
            .map(|(name, item)| (name.clone(), Arc::clone(item)))
            .collect()
    }
}

/// Non-owning reference to a [`Registry`].
pub struct WeakRegistry<T: ?Sized> {
    inner: Weak<RwLock<BTreeMap<String, Arc<T>>>>,
}

impl<T: ?Sized> Clone for WeakRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> WeakRegistry<T> {
    /// `None` once every owning [`Registry`] handle is gone.
    pub fn upgrade(&self) -> Option<Registry<T>> {
        self.inner.upgrade().map(|inner| Registry { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_remove() {
        let registry: Registry<str> = Registry::new();
        assert!(registry.register("a", Arc::from("first")).await.is_none());
        let replaced = registry.register("a", Arc::from("second")).await;
        assert_eq!(replaced.as_deref(), Some("first"));
        assert_eq!(registry.len().await, 1);

        assert!(registry.remove("a").await.is_some());
        assert!(registry.is_empty().await);
        assert!(registry.remove("a").await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_survives_removal() {
        let registry: Registry<str> = Registry::new();
        registry.register("b", Arc::from("two")).await;
        registry.register("a", Arc::from("one")).await;

        let snapshot = registry.snapshot().await;
        registry.remove("a").await;

        let names: Vec<&str> = snapshot.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(!registry.contains("a").await);
    }

    #[tokio::test]
    async fn test_weak_handle_does_not_keep_entries_alive() {
        let registry: Registry<str> = Registry::new();
        let entry: Arc<str> = Arc::from("one");
        let watcher = Arc::downgrade(&entry);
        registry.register("a", entry).await;

        let weak = registry.downgrade();
        assert!(weak.upgrade().is_some());

        drop(registry);
        assert!(weak.upgrade().is_none());
        assert!(watcher.upgrade().is_none());
    }
}
