// MIT License - Copyright (c) 2026 Peter Wright
// Event storage back-ends

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::event::Event;

/// Default capacity of the in-memory history.
pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// Somewhere the pipeline writes every event it dispatches.
#[async_trait]
pub trait Storage: Send + Sync {
    fn name(&self) -> &str;

    async fn store(&self, event: &Event);

    /// All retained events, oldest first.
    async fn all(&self) -> Vec<Event>;
}

/// Bounded in-memory event history. Once full, each insert evicts the oldest
/// event.
pub struct MemoryStorage {
    name: String,
    capacity: usize,
    events: RwLock<VecDeque<Event>>,
}

impl MemoryStorage {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            events: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn store(&self, event: &Event) {
        if self.capacity == 0 {
            return;
        }
        let mut events = self.events.write().await;
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
    }

    async fn all(&self) -> Vec<Event> {
        self.events.read().await.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CommandCatalog;
    use crate::decode::decode;

    fn zone_open(zone: &str) -> Event {
        let command = CommandCatalog::new().lookup("609");
        let decoded = decode(&command, zone);
        let priority = command.priority;
        Event::new(command, zone, decoded, priority, 1_700_000_000)
    }

    #[tokio::test]
    async fn test_evicts_oldest_first() {
        let storage = MemoryStorage::new("memory", 2);
        storage.store(&zone_open("001")).await;
        storage.store(&zone_open("002")).await;
        storage.store(&zone_open("003")).await;

        let zones: Vec<String> = storage
            .all()
            .await
            .into_iter()
            .filter_map(|e| e.zone)
            .collect();
        assert_eq!(zones, vec!["002".to_string(), "003".to_string()]);
    }

    #[tokio::test]
    async fn test_never_exceeds_capacity() {
        let storage = MemoryStorage::new("memory", 3);
        for i in 0..10 {
            storage.store(&zone_open(&format!("{i:03}"))).await;
            assert!(storage.len().await <= storage.capacity());
        }
        assert_eq!(storage.len().await, 3);
    }

    #[tokio::test]
    async fn test_zero_capacity_retains_nothing() {
        let storage = MemoryStorage::new("memory", 0);
        storage.store(&zone_open("001")).await;
        assert!(storage.is_empty().await);
    }
}
