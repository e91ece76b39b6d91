// MIT License - Copyright (c) 2026 Peter Wright
// Silent-arm task: raise a software zone alarm while disarmed

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::constants::CommandCode;
use crate::error::Result;
use crate::event::Event;
use crate::notifier::{Notifier, NotifierRegistry};
use crate::pipeline::PipelineHandle;
use crate::registry::WeakRegistry;

/// Registry key the task runs under.
pub const SILENT_ARM_KEY: &str = "silent-arm";

const ALARM_TRIGGERS: &[CommandCode] = &[CommandCode::ZoneOpen];

const SHUTDOWN_TRIGGERS: &[CommandCode] = &[
    CommandCode::PartitionArmed,
    CommandCode::SystemArmingInProgress,
];

/// Turns a Zone Open on a watched zone into a Software Zone Alarm (`S01`)
/// event, until one of its partitions is armed. Arming removes the task from
/// the notifier registry.
///
/// The task only holds a weak handle to the registry it lives in, so dropping
/// the registry frees it along with every other notifier.
pub struct SilentArmTask {
    partitions: HashSet<String>,
    zones: HashSet<String>,
    notifiers: WeakRegistry<dyn Notifier>,
    pipeline: PipelineHandle,
}

impl SilentArmTask {
    pub fn new(
        partitions: impl IntoIterator<Item = String>,
        zones: impl IntoIterator<Item = String>,
        notifiers: &NotifierRegistry,
        pipeline: PipelineHandle,
    ) -> Self {
        Self {
            partitions: partitions.into_iter().collect(),
            zones: zones.into_iter().collect(),
            notifiers: notifiers.downgrade(),
            pipeline,
        }
    }

    /// Register with the notifier registry.
    pub async fn start(self) -> Arc<Self> {
        debug!("Starting silent-arm task");
        let task = Arc::new(self);
        if let Some(registry) = task.notifiers.upgrade() {
            registry.register(SILENT_ARM_KEY, task.clone()).await;
        }
        task
    }

    pub async fn stop(&self) {
        debug!("Stopping silent-arm task");
        if let Some(registry) = self.notifiers.upgrade() {
            registry.remove(SILENT_ARM_KEY).await;
        }
    }

    fn should_alarm(&self, event: &Event) -> bool {
        let Some(zone) = &event.zone else {
            return false;
        };
        if !self.zones.contains(zone) {
            return false;
        }
        match &event.partition {
            Some(partition) => self.partitions.contains(partition),
            None => true,
        }
    }

    fn triggered_by(event: &Event, codes: &[CommandCode]) -> bool {
        event.command.known.is_some_and(|code| codes.contains(&code))
    }
}

#[async_trait]
impl Notifier for SilentArmTask {
    fn name(&self) -> &str {
        "Silent Arm Task"
    }

    async fn notify(&self, event: &Event) -> Result<()> {
        if Self::triggered_by(event, ALARM_TRIGGERS) {
            if self.should_alarm(event)
                && let Some(zone) = &event.zone
            {
                info!("Silent-arm task triggered by zone {zone}");
                self.pipeline.enqueue_code(CommandCode::SoftwareZoneAlarm, zone)?;
            }
        } else if Self::triggered_by(event, SHUTDOWN_TRIGGERS)
            && event
                .partition
                .as_ref()
                .is_some_and(|p| self.partitions.contains(p))
        {
            self.stop().await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CommandCatalog;
    use crate::decode::decode;
    use crate::pipeline::{PipelineMessage, pipeline_channel};

    fn event(code: &str, data: &str) -> Event {
        let command = CommandCatalog::new().lookup(code);
        let decoded = decode(&command, data);
        let priority = command.priority;
        Event::new(command, data, decoded, priority, 0)
    }

    #[tokio::test]
    async fn test_zone_open_enqueues_software_alarm() {
        let registry = NotifierRegistry::default();
        let (handle, mut rx) = pipeline_channel();
        let task = SilentArmTask::new(["1".to_string()], ["003".to_string()], &registry, handle)
            .start()
            .await;

        task.notify(&event("609", "003")).await.unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            PipelineMessage::Dispatch {
                command: "S01".to_string(),
                data: "003".to_string(),
            }
        );

        // Unwatched zone
        task.notify(&event("609", "004")).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_arming_removes_task() {
        let registry = NotifierRegistry::default();
        let (handle, _rx) = pipeline_channel();
        let task = SilentArmTask::new(["1".to_string()], ["003".to_string()], &registry, handle)
            .start()
            .await;
        assert!(registry.contains(SILENT_ARM_KEY).await);

        // Arming another partition leaves it in place
        task.notify(&event("652", "20")).await.unwrap();
        assert!(registry.contains(SILENT_ARM_KEY).await);

        task.notify(&event("652", "10")).await.unwrap();
        assert!(!registry.contains(SILENT_ARM_KEY).await);
    }

    #[tokio::test]
    async fn test_registry_drop_frees_task() {
        let registry = NotifierRegistry::default();
        let (handle, _rx) = pipeline_channel();
        let task = Arc::downgrade(
            &SilentArmTask::new(["1".to_string()], ["003".to_string()], &registry, handle)
                .start()
                .await,
        );
        // Only the registry owns it now
        assert!(task.upgrade().is_some());

        drop(registry);
        assert!(task.upgrade().is_none());
    }
}
