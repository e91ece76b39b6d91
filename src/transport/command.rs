// MIT License - Copyright (c) 2026 Peter Wright
// Outbound command engine: one command in flight, acknowledged or timed out

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, Instant, timeout_at};
use tracing::{debug, error, info, warn};

use crate::error::{Result, TpiError};
use crate::protocol::encode_packet;

/// A command queued for the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCommand {
    pub code: String,
    pub data: String,
}

impl OutboundCommand {
    pub fn new(code: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            data: data.into(),
        }
    }
}

/// The command currently waiting for an acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAck {
    pub command: String,
    pub deadline: Instant,
}

impl PendingAck {
    fn new(command: &str, ack_timeout: Duration) -> Self {
        Self {
            command: command.to_string(),
            deadline: Instant::now() + ack_timeout,
        }
    }

    /// Check an ack's data field against the pending command.
    pub fn resolve(&self, acked: &str) -> Result<()> {
        if acked == self.command {
            Ok(())
        } else {
            Err(TpiError::AckMismatch {
                expected: self.command.clone(),
                received: acked.to_string(),
            })
        }
    }
}

/// Writes outbound commands strictly one at a time.
///
/// After each write the engine waits for the next ack from `acks` (the data
/// field of a Command Acknowledge frame). A wrong or missing ack is reported
/// and the engine moves on; commands are never retried.
pub struct SendEngine<W> {
    writer: W,
    acks: mpsc::UnboundedReceiver<String>,
    ack_timeout: Duration,
}

impl<W: AsyncWrite + Unpin> SendEngine<W> {
    pub fn new(writer: W, acks: mpsc::UnboundedReceiver<String>, ack_timeout: Duration) -> Self {
        Self {
            writer,
            acks,
            ack_timeout,
        }
    }

    /// Send one command and wait for its acknowledgement.
    ///
    /// Write failures are fatal (`Io`); ack problems are returned as
    /// `AckMismatch` / `AckTimeout` and leave the engine usable.
    pub async fn send(&mut self, code: &str, data: &str) -> Result<()> {
        // An ack that arrives with nothing in flight must not be matched
        // against this command.
        while let Ok(stale) = self.acks.try_recv() {
            warn!("Discarding unexpected acknowledgement of {stale}");
        }

        let packet = encode_packet(code, data);
        debug!("TX: {}", packet.trim_end());
        self.writer.write_all(packet.as_bytes()).await.map_err(|e| {
            error!("Failed to write command {code}: {e}");
            TpiError::Io(e)
        })?;
        self.writer.flush().await?;

        let pending = PendingAck::new(code, self.ack_timeout);
        match timeout_at(pending.deadline, self.acks.recv()).await {
            Ok(Some(acked)) => {
                debug!("Acknowledged: {acked}");
                pending.resolve(&acked)
            }
            Ok(None) => Err(TpiError::ChannelClosed),
            Err(_) => Err(TpiError::AckTimeout {
                command: pending.command,
            }),
        }
    }

    /// Drain `outbound` until shutdown or until the queue closes.
    ///
    /// Returns the first fatal error; non-fatal ack errors are logged.
    pub async fn run(
        mut self,
        mut outbound: mpsc::UnboundedReceiver<OutboundCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        loop {
            if *shutdown.borrow() {
                break;
            }
            let command = tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                command = outbound.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };

            match self.send(&command.code, &command.data).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => error!("{e}"),
            }
        }
        info!("Send task stopped");
        let _ = self.writer.shutdown().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    async fn read_packet(reader: &mut tokio::io::DuplexStream) -> String {
        let mut buf = vec![0u8; 256];
        let n = reader.read(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf[..n]).to_string()
    }

    #[tokio::test]
    async fn test_send_writes_packet_and_accepts_matching_ack() {
        let (writer, mut panel) = tokio::io::duplex(256);
        let (ack_tx, ack_rx) = mpsc::unbounded_channel();
        let mut engine = SendEngine::new(writer, ack_rx, Duration::from_secs(2));

        ack_tx.send("005".to_string()).unwrap();
        // The ack above is stale; deliver the real one after the write
        let send = tokio::spawn(async move { engine.send("005", "user").await });
        assert_eq!(read_packet(&mut panel).await, "005user54\r\n");
        ack_tx.send("005".to_string()).unwrap();

        assert!(send.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_ack_mismatch_is_reported() {
        let (writer, mut panel) = tokio::io::duplex(256);
        let (ack_tx, ack_rx) = mpsc::unbounded_channel();
        let mut engine = SendEngine::new(writer, ack_rx, Duration::from_secs(2));

        let send = tokio::spawn(async move { engine.send("000", "").await });
        assert_eq!(read_packet(&mut panel).await, "00090\r\n");
        ack_tx.send("005".to_string()).unwrap();

        match send.await.unwrap() {
            Err(TpiError::AckMismatch { expected, received }) => {
                assert_eq!(expected, "000");
                assert_eq!(received, "005");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ack_timeout_is_not_fatal() {
        let (writer, _panel) = tokio::io::duplex(256);
        let (_ack_tx, ack_rx) = mpsc::unbounded_channel();
        let mut engine = SendEngine::new(writer, ack_rx, Duration::from_secs(2));

        let err = engine.send("000", "").await.unwrap_err();
        assert!(matches!(err, TpiError::AckTimeout { ref command } if command == "000"));
        assert!(!err.is_fatal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_continues_after_ack_fault() {
        let (writer, mut panel) = tokio::io::duplex(256);
        let (ack_tx, ack_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        let engine = SendEngine::new(writer, ack_rx, Duration::from_secs(2));
        let task = tokio::spawn(engine.run(out_rx, stop_rx));

        out_tx.send(OutboundCommand::new("000", "")).unwrap();
        out_tx.send(OutboundCommand::new("005", "user")).unwrap();

        // First command times out, second still goes out
        assert_eq!(read_packet(&mut panel).await, "00090\r\n");
        assert_eq!(read_packet(&mut panel).await, "005user54\r\n");
        ack_tx.send("005".to_string()).unwrap();

        stop_tx.send(true).unwrap();
        assert!(task.await.unwrap().is_ok());
    }
}
