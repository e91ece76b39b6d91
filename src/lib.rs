// MIT License - Copyright (c) 2026 Peter Wright
// EnvisaLink TPI client library
//
//! # evl-daemon
//!
//! Persistent client for the EnvisaLink "Third-Party Interface" (TPI), the
//! CRLF-framed text protocol DSC alarm panels expose over TCP.
//!
//! The connection logs in automatically when the panel asks for the
//! password, correlates every outbound command with its acknowledgement, and
//! feeds decoded events through a single pipeline that updates a status
//! aggregate, writes bounded in-memory history and fans out to notifiers.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use evl_daemon::notifier::{ConsoleNotifier, NotifierRegistry, StorageRegistry};
//! use evl_daemon::pipeline::{EventPipeline, pipeline_channel};
//! use evl_daemon::{CommandCatalog, ConnectionConfig, NameTables, Priority};
//! use evl_daemon::transport::Connection;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConnectionConfig::builder()
//!         .host("192.168.1.50")
//!         .password("user")
//!         .build();
//!
//!     let catalog = Arc::new(CommandCatalog::new());
//!     let names = Arc::new(NameTables::default());
//!     let notifiers = NotifierRegistry::new();
//!     notifiers
//!         .register("console", Arc::new(ConsoleNotifier::new("console", Priority::Low, None, names.clone())))
//!         .await;
//!
//!     let pipeline = EventPipeline::new(catalog.clone(), names, notifiers, StorageRegistry::new());
//!     let status = pipeline.status();
//!     let (handle, rx) = pipeline_channel();
//!     let (_stop, stop_rx) = tokio::sync::watch::channel(false);
//!     tokio::spawn(pipeline.run(rx, stop_rx));
//!
//!     let connection = Connection::open(&config, catalog, handle).await?;
//!     connection.run().await?;
//!     println!("{:?}", status.snapshot().last_event);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod constants;
pub mod daemon;
pub mod decode;
pub mod devices;
pub mod error;
pub mod event;
pub mod notifier;
pub mod pipeline;
pub mod protocol;
pub mod registry;
pub mod status;
pub mod storage;
pub mod tasks;
pub mod transport;

// Re-exports for convenience
pub use catalog::{Classification, Command, CommandCatalog, Priority};
pub use config::{Config, ConnectionConfig, ConnectionConfigBuilder, ReconnectPolicy};
pub use constants::{CommandCode, LoginType};
pub use daemon::EvlDaemon;
pub use devices::keypad::LedState;
pub use devices::partition::ArmMode;
pub use error::{Result, TpiError};
pub use event::{Event, NameTables};
pub use notifier::Notifier;
pub use pipeline::{EventPipeline, PipelineHandle};
pub use status::{ConnectionInfo, Status, StatusHandle};
pub use storage::{MemoryStorage, Storage};
pub use transport::{Connection, ConnectionHandle, ConnectionState};
