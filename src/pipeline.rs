// MIT License - Copyright (c) 2026 Peter Wright
// Event pipeline: decode, status update, storage and notifier fan-out

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::catalog::CommandCatalog;
use crate::constants::CommandCode;
use crate::decode::decode;
use crate::error::{Result, TpiError};
use crate::event::{Event, NameTables};
use crate::notifier::{NotifierRegistry, StorageRegistry};
use crate::status::{ConnectionInfo, StatusHandle, StatusWriter, status_channel};

/// Work accepted by the pipeline task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineMessage {
    /// A raw (code, data) pair to turn into an event.
    Dispatch { command: String, data: String },
    /// Connection details changed.
    Connection(ConnectionInfo),
}

/// Cloneable sender into the pipeline task.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    tx: mpsc::UnboundedSender<PipelineMessage>,
}

impl PipelineHandle {
    pub fn enqueue(&self, command: &str, data: &str) -> Result<()> {
        self.tx
            .send(PipelineMessage::Dispatch {
                command: command.to_string(),
                data: data.to_string(),
            })
            .map_err(|_| TpiError::ChannelClosed)
    }

    pub fn enqueue_code(&self, code: CommandCode, data: &str) -> Result<()> {
        self.enqueue(code.as_str(), data)
    }

    pub fn set_connection(&self, info: ConnectionInfo) -> Result<()> {
        self.tx
            .send(PipelineMessage::Connection(info))
            .map_err(|_| TpiError::ChannelClosed)
    }
}

/// Create the pipeline ingress channel.
pub fn pipeline_channel() -> (PipelineHandle, mpsc::UnboundedReceiver<PipelineMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (PipelineHandle { tx }, rx)
}

/// The single serialized consumer of decoded panel traffic.
///
/// Owns the write side of the status aggregate. Storages and notifiers are
/// looked up through their registries on every dispatch, iterating over a
/// snapshot so that a notifier may add or remove registry entries (including
/// itself) while being notified.
pub struct EventPipeline {
    catalog: Arc<CommandCatalog>,
    names: Arc<NameTables>,
    status: StatusWriter,
    notifiers: NotifierRegistry,
    storages: StorageRegistry,
}

impl EventPipeline {
    pub fn new(
        catalog: Arc<CommandCatalog>,
        names: Arc<NameTables>,
        notifiers: NotifierRegistry,
        storages: StorageRegistry,
    ) -> Self {
        let (status, _) = status_channel();
        Self {
            catalog,
            names,
            status,
            notifiers,
            storages,
        }
    }

    pub fn status(&self) -> StatusHandle {
        self.status.subscribe()
    }

    pub fn names(&self) -> &Arc<NameTables> {
        &self.names
    }

    /// Turn one raw (code, data) pair into an event and deliver it.
    ///
    /// Notifier failures are logged and never stop delivery to the rest.
    pub async fn dispatch(&self, command: &str, raw_data: &str) -> Event {
        let command = self.catalog.lookup(command);
        let decoded = decode(&command, raw_data);
        let priority = command.priority;
        let event = Event::now(command, raw_data, decoded, priority);

        debug!(
            "Dispatching {} [{}] data={:?}",
            event.command.code, event.priority, event.raw_data
        );

        self.status.apply(&event);

        for (_, storage) in self.storages.snapshot().await {
            storage.store(&event).await;
        }

        for (key, notifier) in self.notifiers.snapshot().await {
            if let Err(e) = notifier.notify(&event).await {
                error!("Notifier {key} ({}) failed: {e}", notifier.name());
            }
        }

        event
    }

    fn handle(&self, message: PipelineMessage) -> Option<(String, String)> {
        match message {
            PipelineMessage::Dispatch { command, data } => Some((command, data)),
            PipelineMessage::Connection(info) => {
                debug!("Connection state {:?} for {}:{}", info.state, info.host, info.port);
                self.status.set_connection(info);
                None
            }
        }
    }

    /// Process messages until `shutdown` flips to true or every sender is
    /// dropped. A dispatch already under way is allowed to finish.
    pub async fn run(
        self,
        mut rx: mpsc::UnboundedReceiver<PipelineMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                message = rx.recv() => {
                    let Some(message) = message else { break };
                    if let Some((command, data)) = self.handle(message) {
                        self.dispatch(&command, &data).await;
                    }
                }
            }
        }
        info!("Event pipeline stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Priority;
    use crate::notifier::Notifier;
    use crate::storage::{MemoryStorage, Storage};
    use crate::transport::ConnectionState;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    struct Recording {
        name: String,
        seen: Mutex<Vec<String>>,
    }

    impl Recording {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Notifier for Recording {
        fn name(&self) -> &str {
            &self.name
        }

        async fn notify(&self, event: &Event) -> Result<()> {
            self.seen.lock().await.push(event.command.code.clone());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Notifier for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn notify(&self, _event: &Event) -> Result<()> {
            Err(TpiError::notifier("failing", "gateway unreachable"))
        }
    }

    fn pipeline(notifiers: NotifierRegistry, storages: StorageRegistry) -> EventPipeline {
        EventPipeline::new(
            Arc::new(CommandCatalog::new()),
            Arc::new(NameTables::default()),
            notifiers,
            storages,
        )
    }

    #[tokio::test]
    async fn test_failing_notifier_does_not_block_others() {
        let notifiers = NotifierRegistry::default();
        let healthy = Recording::new("healthy");
        // "a" sorts before "b": the failing notifier runs first
        notifiers.register("a", Arc::new(Failing)).await;
        notifiers.register("b", healthy.clone()).await;

        let pipeline = pipeline(notifiers, StorageRegistry::default());
        pipeline.dispatch("601", "1001").await;
        pipeline.dispatch("610", "001").await;

        assert_eq!(*healthy.seen.lock().await, vec!["601".to_string(), "610".to_string()]);
    }

    #[tokio::test]
    async fn test_dispatch_builds_event_and_updates_status() {
        let storages = StorageRegistry::default();
        let memory = Arc::new(MemoryStorage::new("memory", 10));
        storages.register("memory", memory.clone()).await;

        let pipeline = pipeline(NotifierRegistry::default(), storages);
        let status = pipeline.status();

        let event = pipeline.dispatch("601", "1001").await;
        assert_eq!(event.partition.as_deref(), Some("1"));
        assert_eq!(event.zone.as_deref(), Some("001"));
        assert_eq!(event.priority, Priority::High);

        let snapshot = status.snapshot();
        assert_eq!(snapshot.zone_state.get("001").map(String::as_str), Some("Zone Alarm"));
        assert_eq!(snapshot.last_event, Some(event.clone()));
        assert_eq!(memory.all().await, vec![event]);
    }

    #[tokio::test]
    async fn test_unknown_code_flows_through() {
        let pipeline = pipeline(NotifierRegistry::default(), StorageRegistry::default());
        let event = pipeline.dispatch("999", "xyz").await;
        assert_eq!(event.command.known, None);
        assert_eq!(event.priority, Priority::Low);
        assert_eq!(event.data.as_deref(), Some("xyz"));
    }

    #[tokio::test]
    async fn test_run_processes_in_order_then_stops() {
        let notifiers = NotifierRegistry::default();
        let recording = Recording::new("recording");
        notifiers.register("recording", recording.clone()).await;

        let pipeline = pipeline(notifiers, StorageRegistry::default());
        let status = pipeline.status();
        let (handle, rx) = pipeline_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        handle.enqueue("609", "001").unwrap();
        handle
            .set_connection(ConnectionInfo {
                host: "127.0.0.1".to_string(),
                port: 4025,
                state: ConnectionState::Connected,
            })
            .unwrap();
        handle.enqueue_code(CommandCode::ZoneRestored, "001").unwrap();
        drop(handle);

        // Channel closes once drained, ending the loop
        pipeline.run(rx, stop_rx).await;
        drop(stop_tx);

        assert_eq!(*recording.seen.lock().await, vec!["609".to_string(), "610".to_string()]);
        let snapshot = status.snapshot();
        assert_eq!(snapshot.connection.map(|c| c.port), Some(4025));
    }

    #[tokio::test]
    async fn test_no_dispatch_after_stop() {
        let notifiers = NotifierRegistry::default();
        let recording = Recording::new("recording");
        notifiers.register("recording", recording.clone()).await;

        let pipeline = pipeline(notifiers, StorageRegistry::default());
        let (handle, rx) = pipeline_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        stop_tx.send(true).unwrap();
        handle.enqueue("609", "001").unwrap();
        pipeline.run(rx, stop_rx).await;

        assert!(recording.seen.lock().await.is_empty());
    }
}
