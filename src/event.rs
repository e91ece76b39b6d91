// MIT License - Copyright (c) 2026 Peter Wright
// Decoded panel events and name tables

use std::collections::HashMap;

use chrono::{Local, TimeZone, Utc};

use crate::catalog::{Command, Priority};
use crate::decode::{Decoded, describe_data};

/// Default timestamp layout for human-readable output.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One decoded, non-control frame from the panel.
///
/// Built exactly once by the pipeline and never mutated afterwards; storages
/// and notifiers only ever see it by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub command: Command,
    /// Data field exactly as received.
    pub raw_data: String,
    /// What is left of the data once zone and partition ids are removed.
    pub data: Option<String>,
    pub zone: Option<String>,
    pub partition: Option<String>,
    pub priority: Priority,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
}

impl Event {
    pub fn new(command: Command, raw_data: &str, decoded: Decoded, priority: Priority, timestamp: i64) -> Self {
        Self {
            command,
            raw_data: raw_data.to_string(),
            data: decoded.data,
            zone: decoded.zone,
            partition: decoded.partition,
            priority,
            timestamp,
        }
    }

    /// Event stamped with the current time.
    pub fn now(command: Command, raw_data: &str, decoded: Decoded, priority: Priority) -> Self {
        Self::new(command, raw_data, decoded, priority, Utc::now().timestamp())
    }

    pub fn describe_data(&self) -> Option<String> {
        describe_data(&self.command, self.data.as_deref())
    }

    /// One-line description, e.g. `Zone Alarm - Main Floor - Front Door`.
    pub fn describe(&self, names: &NameTables) -> String {
        let mut parts = vec![self.command.to_string()];
        if let Some(partition) = &self.partition {
            parts.push(names.partition_name(partition));
        }
        if let Some(zone) = &self.zone {
            parts.push(names.zone_name(zone));
        }
        let mut description = parts.join(" - ");
        if let Some(data) = self.describe_data() {
            description.push_str(": ");
            description.push_str(&data);
        }
        description
    }

    /// Timestamp in local time, formatted with `format`.
    pub fn timestamp_str(&self, format: &str) -> String {
        match Local.timestamp_opt(self.timestamp, 0).single() {
            Some(dt) => dt.format(format).to_string(),
            None => self.timestamp.to_string(),
        }
    }
}

/// Configured display names for zones and partitions.
#[derive(Debug, Clone, Default)]
pub struct NameTables {
    pub zones: HashMap<String, String>,
    pub partitions: HashMap<String, String>,
}

impl NameTables {
    pub fn new(zones: HashMap<String, String>, partitions: HashMap<String, String>) -> Self {
        Self { zones, partitions }
    }

    pub fn zone_name(&self, id: &str) -> String {
        self.zones
            .get(id)
            .cloned()
            .unwrap_or_else(|| format!("Zone {id}"))
    }

    pub fn partition_name(&self, id: &str) -> String {
        self.partitions
            .get(id)
            .cloned()
            .unwrap_or_else(|| format!("Partition {id}"))
    }
}
