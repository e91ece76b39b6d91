// MIT License - Copyright (c) 2026 Peter Wright
// Direct TCP connection to the EnvisaLink TPI

use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::catalog::{Classification, CommandCatalog};
use crate::config::ConnectionConfig;
use crate::constants::{CommandCode, LoginType};
use crate::error::{Result, TpiError};
use crate::pipeline::PipelineHandle;
use crate::protocol;
use crate::status::ConnectionInfo;
use crate::transport::ConnectionState;
use crate::transport::command::{OutboundCommand, SendEngine};
use crate::transport::framer::Framer;

/// Cloneable control surface for a running connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    outbound: mpsc::UnboundedSender<OutboundCommand>,
    shutdown: Arc<watch::Sender<bool>>,
    state: watch::Receiver<ConnectionState>,
}

impl ConnectionHandle {
    /// Queue a command for the panel. It is written once every earlier
    /// command has been acknowledged or timed out.
    pub fn send(&self, code: CommandCode, data: &str) -> Result<()> {
        self.outbound
            .send(OutboundCommand::new(code.as_str(), data))
            .map_err(|_| TpiError::Disconnected)
    }

    /// Ask every connection task to stop.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }
}

/// A live TPI session.
///
/// Four tasks run per connection: receive (socket -> framer -> frame
/// channel), dispatch (checksum, login and ack routing, pipeline), send (one
/// command at a time with ack-wait) and an optional keepalive poll. A
/// receive or write failure stops all of them.
pub struct Connection {
    handle: ConnectionHandle,
    info: ConnectionInfo,
    state_tx: watch::Sender<ConnectionState>,
    pipeline: PipelineHandle,
    faults: mpsc::UnboundedReceiver<TpiError>,
    tasks: Vec<JoinHandle<()>>,
}

impl Connection {
    /// Connect to the panel and start the connection tasks.
    ///
    /// The login handshake is driven by the panel: it sends a password
    /// request as soon as the socket opens and the dispatch task answers it.
    pub async fn open(
        config: &ConnectionConfig,
        catalog: Arc<CommandCatalog>,
        pipeline: PipelineHandle,
    ) -> Result<Self> {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let mut info = ConnectionInfo {
            host: config.host.clone(),
            port: config.port,
            state: ConnectionState::Connecting,
        };
        let _ = pipeline.set_connection(info.clone());

        info!("Connecting to {}", config.address());
        let stream = TcpStream::connect(config.address()).await.map_err(|e| {
            error!("TCP connect to {} failed: {e}", config.address());
            TpiError::Io(e)
        })?;
        if let Ok(peer) = stream.peer_addr() {
            info.host = peer.ip().to_string();
            info.port = peer.port();
        }
        debug!("TCP socket connected");

        let (reader, writer) = stream.into_split();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shutdown_tx = Arc::new(shutdown_tx);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (ack_tx, ack_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::channel(config.frame_channel_capacity);
        let (fault_tx, faults) = mpsc::unbounded_channel();

        let mut tasks = Vec::with_capacity(4);

        tasks.push(spawn_receive_task(
            reader,
            config.read_chunk_size,
            frame_tx,
            fault_tx.clone(),
            shutdown_tx.clone(),
        ));

        tasks.push(spawn_dispatch_task(
            frame_rx,
            catalog,
            pipeline.clone(),
            ack_tx,
            outbound_tx.clone(),
            config.password.clone(),
        ));

        let engine = SendEngine::new(writer, ack_rx, config.ack_timeout);
        let send_shutdown = shutdown_tx.clone();
        let send_rx = shutdown_rx.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = engine.run(outbound_rx, send_rx).await {
                error!("Send task failed: {e}");
                let _ = fault_tx.send(e);
                let _ = send_shutdown.send(true);
            }
        }));

        if let Some(period) = config.keepalive_interval {
            tasks.push(spawn_keepalive_task(period, outbound_tx.clone(), shutdown_rx.clone()));
        }

        let handle = ConnectionHandle {
            outbound: outbound_tx,
            shutdown: shutdown_tx,
            state: state_rx,
        };

        info.state = ConnectionState::Connected;
        let _ = state_tx.send(ConnectionState::Connected);
        let _ = pipeline.set_connection(info.clone());
        info!("Connected to {}:{}", info.host, info.port);

        Ok(Self {
            handle,
            info,
            state_tx,
            pipeline,
            faults,
            tasks,
        })
    }

    pub fn handle(&self) -> ConnectionHandle {
        self.handle.clone()
    }

    pub fn info(&self) -> &ConnectionInfo {
        &self.info
    }

    /// Wait for the connection to end.
    ///
    /// Returns `Ok(())` after [`ConnectionHandle::stop`], or the connection
    /// fault (`Disconnected` / `Io`) that ended it.
    pub async fn run(mut self) -> Result<()> {
        let mut shutdown = self.handle.shutdown.subscribe();
        let _ = shutdown.wait_for(|stopped| *stopped).await;

        // Let in-flight frames reach the pipeline before reporting
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                error!("Connection task panicked: {e}");
            }
        }

        let _ = self.state_tx.send(ConnectionState::Disconnected);
        self.info.state = ConnectionState::Disconnected;
        let _ = self.pipeline.set_connection(self.info.clone());

        match self.faults.try_recv() {
            Ok(fault) => Err(fault),
            Err(_) => {
                info!("Connection closed");
                Ok(())
            }
        }
    }
}

fn spawn_receive_task(
    mut reader: OwnedReadHalf,
    chunk_size: usize,
    frames: mpsc::Sender<String>,
    faults: mpsc::UnboundedSender<TpiError>,
    shutdown_tx: Arc<watch::Sender<bool>>,
) -> JoinHandle<()> {
    let mut shutdown = shutdown_tx.subscribe();
    tokio::spawn(async move {
        let mut buf = vec![0u8; chunk_size];
        let mut framer = Framer::new();

        let fault = loop {
            let read = tokio::select! {
                biased;
                _ = shutdown.wait_for(|stopped| *stopped) => break None,
                read = reader.read(&mut buf) => read,
            };
            match read {
                Ok(0) => {
                    debug!("Receive: connection closed by peer");
                    break Some(TpiError::Disconnected);
                }
                Ok(n) => {
                    for frame in framer.feed(&buf[..n]) {
                        debug!("RX: {frame}");
                        let _ = frames.send(frame).await;
                    }
                }
                Err(e) => {
                    error!("Receive: read error: {e}");
                    break Some(TpiError::Io(e));
                }
            }
        };

        if let Some(partial) = framer.finish() {
            warn!("Discarding incomplete frame at end of stream: {partial:?}");
        }
        if let Some(fault) = fault {
            let _ = faults.send(fault);
        }
        let _ = shutdown_tx.send(true);
    })
}

fn spawn_dispatch_task(
    mut frames: mpsc::Receiver<String>,
    catalog: Arc<CommandCatalog>,
    pipeline: PipelineHandle,
    acks: mpsc::UnboundedSender<String>,
    outbound: mpsc::UnboundedSender<OutboundCommand>,
    password: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if !protocol::validate(&frame) {
                error!("{}", TpiError::ChecksumMismatch { frame });
                continue;
            }
            let protocol::Frame { code, data, .. } = protocol::split(&frame);
            let command = catalog.lookup(&code);

            match command.classification {
                Classification::Login => match LoginType::from_code(&data) {
                    Some(LoginType::PasswordRequest) => {
                        info!("Password requested, logging in");
                        let login = OutboundCommand::new(CommandCode::NetworkLogin.as_str(), password.as_str());
                        if outbound.send(login).is_err() {
                            warn!("Send task gone, cannot log in");
                        }
                        continue;
                    }
                    Some(LoginType::LoginSuccess) => info!("Login successful"),
                    Some(login) => error!("Login failed: {}", login.description()),
                    None => warn!("Unrecognised login sub-code {data:?}"),
                },
                Classification::Ack => {
                    let _ = acks.send(data);
                    continue;
                }
                _ => {}
            }

            if pipeline.enqueue(&code, &data).is_err() {
                warn!("Event pipeline stopped, dropping {code}");
            }
        }
        debug!("Dispatch task stopped");
    })
}

fn spawn_keepalive_task(
    period: std::time::Duration,
    outbound: mpsc::UnboundedSender<OutboundCommand>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        // The first tick fires immediately
        ticker.tick().await;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait_for(|stopped| *stopped) => break,
                _ = ticker.tick() => {
                    debug!("Keepalive poll");
                    if outbound.send(OutboundCommand::new(CommandCode::Poll.as_str(), "")).is_err() {
                        break;
                    }
                }
            }
        }
    })
}
