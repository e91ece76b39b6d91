// MIT License - Copyright (c) 2026 Peter Wright
// Connection settings and daemon configuration file

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::catalog::{CommandCatalog, Priority};
use crate::constants::{
    ACK_TIMEOUT, DEFAULT_PORT, FRAME_CHANNEL_CAPACITY, PARTITION_ID_WIDTH, READ_CHUNK_SIZE,
    ZONE_ID_WIDTH,
};
use crate::error::{Result, TpiError};
use crate::event::NameTables;
use crate::notifier::mqtt::{DEFAULT_CLIENT_ID, DEFAULT_TOPIC, parse_mqtt_url};
use crate::storage::DEFAULT_HISTORY_SIZE;

/// Settings for one TPI connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Panel host name or IP address
    pub host: String,
    /// TPI port (default: 4025)
    pub port: u16,
    /// Shared secret sent in response to a password request
    pub password: String,
    /// Maximum bytes per socket read
    pub read_chunk_size: usize,
    /// How long to wait for a command acknowledgement
    pub ack_timeout: Duration,
    /// Capacity of the receive -> dispatch frame channel
    pub frame_channel_capacity: usize,
    /// Interval between Poll commands (`None` disables the keepalive)
    pub keepalive_interval: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            password: "user".to_string(),
            read_chunk_size: READ_CHUNK_SIZE,
            ack_timeout: ACK_TIMEOUT,
            frame_channel_capacity: FRAME_CHANNEL_CAPACITY,
            keepalive_interval: None,
        }
    }
}

impl ConnectionConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for ConnectionConfig.
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.config.read_chunk_size = size.max(1);
        self
    }

    pub fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.config.ack_timeout = timeout;
        self
    }

    pub fn frame_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.frame_channel_capacity = capacity.max(1);
        self
    }

    /// Send a Poll every `interval`. A zero interval disables the keepalive.
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.config.keepalive_interval = (!interval.is_zero()).then_some(interval);
        self
    }

    pub fn build(self) -> ConnectionConfig {
        self.config
    }
}

// ---------------------------------------------------------------------------
// Daemon configuration file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub connection: ConnectionToml,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    /// Zone id -> display name
    #[serde(default)]
    pub zones: HashMap<String, String>,
    /// Partition id -> display name
    #[serde(default)]
    pub partitions: HashMap<String, String>,
    #[serde(default)]
    pub commands: CommandOverrides,
    #[serde(default = "default_notifiers")]
    pub notifiers: Vec<NotifierConfig>,
    #[serde(default = "default_storage")]
    pub storage: Vec<StorageConfig>,
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionToml {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub password: String,
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
    /// 0 disables the keepalive poll
    #[serde(default)]
    pub keepalive_interval_ms: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_ack_timeout_ms() -> u64 {
    ACK_TIMEOUT.as_millis() as u64
}
fn default_read_chunk_size() -> usize {
    READ_CHUNK_SIZE
}

/// What to do when the connection to the panel is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconnectPolicy {
    /// Stop the daemon with the connection fault.
    #[default]
    Exit,
    /// Reconnect forever with exponential backoff.
    Backoff,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectConfig {
    #[serde(default)]
    pub policy: ReconnectPolicy,
    #[serde(default = "default_reconnect_delay")]
    pub delay_ms: u64,
    #[serde(default = "default_reconnect_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            policy: ReconnectPolicy::default(),
            delay_ms: default_reconnect_delay(),
            max_delay_ms: default_reconnect_max_delay(),
        }
    }
}

fn default_reconnect_delay() -> u64 {
    5000
}
fn default_reconnect_max_delay() -> u64 {
    60000
}

impl ReconnectConfig {
    /// Delay before reconnect attempt `attempt` (1-based): doubles each time
    /// up to 16x the base delay, never above `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(4);
        let ms = self.delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

/// Per-code display name and priority overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandOverrides {
    #[serde(default)]
    pub names: HashMap<String, String>,
    #[serde(default)]
    pub priorities: HashMap<String, Priority>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", deny_unknown_fields)]
pub enum NotifierConfig {
    Console {
        name: String,
        #[serde(default)]
        priority: Priority,
        #[serde(default)]
        layout: Option<String>,
    },
    Mqtt {
        name: String,
        #[serde(default)]
        priority: Priority,
        #[serde(default)]
        layout: Option<String>,
        url: String,
        #[serde(default = "default_mqtt_client_id")]
        client_id: String,
        #[serde(default = "default_mqtt_topic")]
        topic: String,
    },
}

impl NotifierConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Console { name, .. } | Self::Mqtt { name, .. } => name,
        }
    }
}

fn default_mqtt_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}
fn default_mqtt_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

fn default_notifiers() -> Vec<NotifierConfig> {
    vec![NotifierConfig::Console {
        name: "console".to_string(),
        priority: Priority::Low,
        layout: None,
    }]
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", deny_unknown_fields)]
pub enum StorageConfig {
    Memory {
        name: String,
        #[serde(default = "default_max_size")]
        max_size: usize,
    },
}

impl StorageConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Memory { name, .. } => name,
        }
    }
}

fn default_max_size() -> usize {
    DEFAULT_HISTORY_SIZE
}

fn default_storage() -> Vec<StorageConfig> {
    vec![StorageConfig::Memory {
        name: "memory".to_string(),
        max_size: DEFAULT_HISTORY_SIZE,
    }]
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", deny_unknown_fields)]
pub enum TaskConfig {
    SilentArm {
        partitions: Vec<String>,
        zones: Vec<String>,
    },
}

impl Config {
    /// Read, parse and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TpiError::config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| TpiError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.connection.host.trim().is_empty() {
            return Err(TpiError::config("connection.host must not be empty"));
        }
        if self.connection.password.is_empty() {
            return Err(TpiError::config("connection.password must not be empty"));
        }
        if self.connection.read_chunk_size == 0 {
            return Err(TpiError::config("connection.read_chunk_size must be positive"));
        }
        if self.reconnect.max_delay_ms < self.reconnect.delay_ms {
            return Err(TpiError::config("reconnect.max_delay_ms must be >= reconnect.delay_ms"));
        }

        for id in self.zones.keys() {
            check_id("zone", id, ZONE_ID_WIDTH)?;
        }
        for id in self.partitions.keys() {
            check_id("partition", id, PARTITION_ID_WIDTH)?;
        }

        // Rejects overrides for unknown codes
        self.catalog()?;

        let mut names = HashSet::new();
        for notifier in &self.notifiers {
            if !names.insert(notifier.name()) {
                return Err(TpiError::config(format!("duplicate notifier name: {}", notifier.name())));
            }
            if let NotifierConfig::Mqtt { url, .. } = notifier {
                parse_mqtt_url(url)?;
            }
        }

        let mut names = HashSet::new();
        for storage in &self.storage {
            if !names.insert(storage.name()) {
                return Err(TpiError::config(format!("duplicate storage name: {}", storage.name())));
            }
            let StorageConfig::Memory { name, max_size } = storage;
            if *max_size == 0 {
                return Err(TpiError::config(format!("storage {name}: max_size must be positive")));
            }
        }

        if self.tasks.len() > 1 {
            return Err(TpiError::config("at most one silent-arm task may be configured"));
        }
        for task in &self.tasks {
            let TaskConfig::SilentArm { partitions, zones } = task;
            for id in partitions {
                check_id("partition", id, PARTITION_ID_WIDTH)?;
            }
            for id in zones {
                check_id("zone", id, ZONE_ID_WIDTH)?;
            }
        }

        Ok(())
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::builder()
            .host(self.connection.host.clone())
            .port(self.connection.port)
            .password(self.connection.password.clone())
            .ack_timeout(Duration::from_millis(self.connection.ack_timeout_ms))
            .read_chunk_size(self.connection.read_chunk_size)
            .keepalive_interval(Duration::from_millis(self.connection.keepalive_interval_ms))
            .build()
    }

    pub fn name_tables(&self) -> NameTables {
        NameTables::new(self.zones.clone(), self.partitions.clone())
    }

    pub fn catalog(&self) -> Result<CommandCatalog> {
        CommandCatalog::with_overrides(&self.commands.names, &self.commands.priorities)
    }
}

fn check_id(kind: &str, id: &str, width: usize) -> Result<()> {
    if id.len() == width && id.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(TpiError::config(format!("{kind} id must be {width} digit(s): {id:?}")))
    }
}
