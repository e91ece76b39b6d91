// MIT License - Copyright (c) 2026 Peter Wright
// Daemon wiring: configuration -> registries, pipeline and connection

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::catalog::CommandCatalog;
use crate::config::{Config, NotifierConfig, ReconnectPolicy, StorageConfig, TaskConfig};
use crate::error::{Result, TpiError};
use crate::event::NameTables;
use crate::notifier::mqtt::MqttSettings;
use crate::notifier::{ConsoleNotifier, MqttNotifier, NotifierRegistry, StorageRegistry};
use crate::pipeline::{EventPipeline, PipelineHandle, pipeline_channel};
use crate::status::StatusHandle;
use crate::storage::MemoryStorage;
use crate::tasks::SilentArmTask;
use crate::transport::{Connection, ConnectionHandle};

/// Everything one configuration needs at runtime.
///
/// The pipeline task is started on construction and keeps running across
/// reconnects; [`EvlDaemon::run`] owns the connection lifecycle.
pub struct EvlDaemon {
    config: Config,
    catalog: Arc<CommandCatalog>,
    notifiers: NotifierRegistry,
    storages: StorageRegistry,
    pipeline: PipelineHandle,
    status: StatusHandle,
    pipeline_stop: watch::Sender<bool>,
    pipeline_task: JoinHandle<()>,
}

impl EvlDaemon {
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let catalog = Arc::new(config.catalog()?);
        let names = Arc::new(config.name_tables());

        let notifiers = NotifierRegistry::new();
        for notifier in &config.notifiers {
            register_notifier(&notifiers, notifier, &names).await?;
        }

        let storages = StorageRegistry::new();
        for storage in &config.storage {
            let StorageConfig::Memory { name, max_size } = storage;
            storages
                .register(name.clone(), Arc::new(MemoryStorage::new(name.clone(), *max_size)))
                .await;
        }

        let pipeline = EventPipeline::new(catalog.clone(), names, notifiers.clone(), storages.clone());
        let status = pipeline.status();
        let (handle, rx) = pipeline_channel();
        let (pipeline_stop, stop_rx) = watch::channel(false);
        let pipeline_task = tokio::spawn(pipeline.run(rx, stop_rx));

        for task in &config.tasks {
            let TaskConfig::SilentArm { partitions, zones } = task;
            SilentArmTask::new(
                partitions.iter().cloned(),
                zones.iter().cloned(),
                &notifiers,
                handle.clone(),
            )
            .start()
            .await;
        }

        info!(
            "Daemon ready: {} notifier(s), {} storage(s)",
            notifiers.len().await,
            storages.len().await
        );

        Ok(Self {
            config,
            catalog,
            notifiers,
            storages,
            pipeline: handle,
            status,
            pipeline_stop,
            pipeline_task,
        })
    }

    /// Read-only status snapshots.
    pub fn status(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Entry point for raw (code, data) pairs from outside the connection.
    pub fn pipeline(&self) -> PipelineHandle {
        self.pipeline.clone()
    }

    pub fn notifiers(&self) -> &NotifierRegistry {
        &self.notifiers
    }

    pub fn storages(&self) -> &StorageRegistry {
        &self.storages
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Connect once, without any reconnect policy.
    pub async fn connect(&self) -> Result<Connection> {
        Connection::open(
            &self.config.connection_config(),
            self.catalog.clone(),
            self.pipeline.clone(),
        )
        .await
    }

    /// Keep a connection to the panel until `stop` flips to true.
    ///
    /// Connection faults either end the run (`exit` policy) or trigger a
    /// reconnect after a growing delay (`backoff` policy).
    pub async fn run(&self, mut stop: watch::Receiver<bool>) -> Result<()> {
        let reconnect = &self.config.reconnect;
        let mut attempt: u32 = 0;

        loop {
            if *stop.borrow() {
                return Ok(());
            }

            let connected = tokio::select! {
                result = self.connect() => result,
                _ = stop_requested(&mut stop) => return Ok(()),
            };

            let fault = match connected {
                Ok(connection) => {
                    attempt = 0;
                    let handle = connection.handle();
                    let run = connection.run();
                    tokio::pin!(run);
                    tokio::select! {
                        result = &mut run => match result {
                            Ok(()) => return Ok(()),
                            Err(e) => e,
                        },
                        _ = stop_requested(&mut stop) => {
                            stop_connection(&handle, run).await;
                            return Ok(());
                        }
                    }
                }
                Err(e) => e,
            };

            match reconnect.policy {
                ReconnectPolicy::Exit => {
                    error!("Connection fault: {fault}");
                    return Err(fault);
                }
                ReconnectPolicy::Backoff => {
                    attempt = attempt.saturating_add(1);
                    let delay = reconnect.delay_for(attempt);
                    warn!(
                        "Connection fault: {fault}. Reconnecting in {:.1}s (attempt {attempt})",
                        delay.as_secs_f64()
                    );
                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = stop_requested(&mut stop) => return Ok(()),
                    }
                }
            }
        }
    }

    /// Stop the pipeline, letting any dispatch in progress finish.
    pub async fn shutdown(self) {
        let _ = self.pipeline_stop.send(true);
        if let Err(e) = self.pipeline_task.await {
            error!("Pipeline task panicked: {e}");
        }
        info!("Daemon stopped");
    }
}

/// Resolves once `stop` is true or its sender is gone.
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

async fn stop_connection(
    handle: &ConnectionHandle,
    run: std::pin::Pin<&mut impl std::future::Future<Output = Result<()>>>,
) {
    handle.stop();
    match tokio::time::timeout(Duration::from_secs(5), run).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Connection ended with {e}"),
        Err(_) => warn!("Connection tasks did not stop in time"),
    }
}

async fn register_notifier(
    registry: &NotifierRegistry,
    config: &NotifierConfig,
    names: &Arc<NameTables>,
) -> Result<()> {
    match config {
        NotifierConfig::Console { name, priority, layout } => {
            let notifier = ConsoleNotifier::new(name.clone(), *priority, layout.clone(), names.clone());
            registry.register(name.clone(), Arc::new(notifier)).await;
        }
        NotifierConfig::Mqtt {
            name,
            priority,
            layout,
            url,
            client_id,
            topic,
        } => {
            let mut settings = MqttSettings::from_url(url)
                .map_err(|e| TpiError::config(format!("notifier {name}: {e}")))?;
            settings.client_id = client_id.clone();
            settings.topic = topic.clone();
            let notifier = MqttNotifier::start(name.clone(), *priority, layout.clone(), settings, names.clone());
            registry.register(name.clone(), Arc::new(notifier)).await;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::SILENT_ARM_KEY;

    fn config(extra: &str) -> Config {
        let text = format!(
            "[connection]\nhost = \"127.0.0.1\"\nport = 1\npassword = \"user\"\n{extra}"
        );
        Config::from_toml_str(&text).unwrap()
    }

    #[tokio::test]
    async fn test_registries_built_from_config() {
        let daemon = EvlDaemon::new(config(
            "[[storage]]\ntype = \"memory\"\nname = \"a\"\n[[storage]]\ntype = \"memory\"\nname = \"b\"\nmax_size = 5\n\
             [[tasks]]\ntype = \"silent-arm\"\npartitions = [\"1\"]\nzones = [\"001\"]",
        ))
        .await
        .unwrap();

        assert_eq!(daemon.storages().len().await, 2);
        // Default console notifier plus the silent-arm task
        assert_eq!(daemon.notifiers().len().await, 2);
        daemon.shutdown().await;
    }

    #[tokio::test]
    async fn test_exit_policy_returns_connection_fault() {
        // Nothing listens on port 1
        let daemon = EvlDaemon::new(config("")).await.unwrap();
        let (_stop_tx, stop_rx) = watch::channel(false);
        let result = daemon.run(stop_rx).await;
        assert!(matches!(result, Err(ref e) if e.is_fatal()));
        daemon.shutdown().await;
    }

    #[tokio::test]
    async fn test_backoff_policy_stops_on_request() {
        let daemon = EvlDaemon::new(config(
            "[reconnect]\npolicy = \"backoff\"\ndelay_ms = 10000\nmax_delay_ms = 10000",
        ))
        .await
        .unwrap();
        let (stop_tx, stop_rx) = watch::channel(false);
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = stop_tx.send(true);
        });
        assert!(daemon.run(stop_rx).await.is_ok());
        stopper.await.unwrap();
        daemon.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_frees_notifiers() {
        let daemon = EvlDaemon::new(config(
            "[[tasks]]\ntype = \"silent-arm\"\npartitions = [\"1\"]\nzones = [\"001\"]",
        ))
        .await
        .unwrap();

        let console = Arc::downgrade(&daemon.notifiers().get("console").await.unwrap());
        let silent_arm = Arc::downgrade(&daemon.notifiers().get(SILENT_ARM_KEY).await.unwrap());

        daemon.shutdown().await;
        assert!(console.upgrade().is_none());
        assert!(silent_arm.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_stop_during_connect() {
        // Unroutable, so the connect either hangs or fails fast into backoff
        let text = "[connection]\nhost = \"10.255.255.1\"\nport = 4025\npassword = \"user\"\n\
                    [reconnect]\npolicy = \"backoff\"\ndelay_ms = 10000\nmax_delay_ms = 10000";
        let daemon = Arc::new(EvlDaemon::new(Config::from_toml_str(text).unwrap()).await.unwrap());
        let (stop_tx, stop_rx) = watch::channel(false);

        let run = tokio::spawn({
            let daemon = daemon.clone();
            async move { daemon.run(stop_rx).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        stop_tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(2), run)
            .await
            .expect("run did not stop while connecting")
            .unwrap();
        assert!(result.is_ok());

        let Ok(daemon) = Arc::try_unwrap(daemon) else {
            panic!("daemon still shared");
        };
        daemon.shutdown().await;
    }
}
