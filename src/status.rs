// MIT License - Copyright (c) 2026 Peter Wright
// Live status aggregate derived from the event stream

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::watch;

use crate::constants::CommandCode;
use crate::devices::partition::{ArmMode, DISARMED, armed_description};
use crate::event::Event;
use crate::transport::ConnectionState;

/// Where the daemon is connected and in what state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub state: ConnectionState,
}

/// Read model of the panel, updated by the pipeline for every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub started_at: i64,
    pub last_event: Option<Event>,
    /// Partition id -> last reported condition.
    pub partition_state: BTreeMap<String, String>,
    /// Zone id -> last reported condition.
    pub zone_state: BTreeMap<String, String>,
    /// Partition id -> armed or disarmed description.
    pub armed_state: BTreeMap<String, String>,
    pub connection: Option<ConnectionInfo>,
}

impl Status {
    pub fn new(started_at: i64) -> Self {
        Self {
            started_at,
            last_event: None,
            partition_state: BTreeMap::new(),
            zone_state: BTreeMap::new(),
            armed_state: BTreeMap::new(),
            connection: None,
        }
    }

    /// Fold one event into the aggregate.
    pub fn apply(&mut self, event: &Event) {
        let description = event.command.to_string();

        if let Some(partition) = &event.partition {
            self.partition_state
                .insert(partition.clone(), description.clone());

            if event.command.is(CommandCode::PartitionArmed) {
                let mode = event.data.as_deref().and_then(ArmMode::from_code);
                self.armed_state
                    .insert(partition.clone(), armed_description(mode));
            } else if event.command.is(CommandCode::PartitionDisarmed) {
                self.armed_state
                    .insert(partition.clone(), DISARMED.to_string());
            }
        }

        if let Some(zone) = &event.zone {
            self.zone_state.insert(zone.clone(), description);
        }

        self.last_event = Some(event.clone());
    }
}

/// Single-writer side of the status aggregate. Owned by the pipeline.
#[derive(Debug)]
pub struct StatusWriter {
    tx: watch::Sender<Status>,
}

/// Read-only view of the status aggregate.
///
/// Readers take a copy; they never hold a lock the writer waits on.
#[derive(Debug, Clone)]
pub struct StatusHandle {
    rx: watch::Receiver<Status>,
}

/// Create the status aggregate stamped with the current time.
pub fn status_channel() -> (StatusWriter, StatusHandle) {
    let (tx, rx) = watch::channel(Status::new(Utc::now().timestamp()));
    (StatusWriter { tx }, StatusHandle { rx })
}

impl StatusWriter {
    pub fn apply(&self, event: &Event) {
        self.tx.send_modify(|status| status.apply(event));
    }

    pub fn set_connection(&self, info: ConnectionInfo) {
        self.tx.send_modify(|status| status.connection = Some(info));
    }

    pub fn subscribe(&self) -> StatusHandle {
        StatusHandle {
            rx: self.tx.subscribe(),
        }
    }
}

impl StatusHandle {
    /// Copy of the current status.
    pub fn snapshot(&self) -> Status {
        self.rx.borrow().clone()
    }

    /// Wait until the status changes. Returns an error once the writer is gone.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}
