//! Queue transport boundary
//!
//! The broker itself (connection, redelivery, backoff) is an external
//! collaborator; this module pins down the interface the consumption loop
//! depends on. A delivery carries the parsed JSON payload plus a disposition
//! handle, and terminal state (acked/failed) flows back to the transport so
//! it can confirm or requeue per its own policy.
//!
//! Channel-backed implementations over `tokio::sync::mpsc` serve both the
//! binary's wiring and the tests. The binary's external feed is NDJSON on
//! stdin, with results written as NDJSON to stdout.

use crate::payload::SubResourceResult;
use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Errors surfaced by transport implementations
#[derive(Error, Debug)]
pub enum TransportError {
    /// The outbound channel's receiving side is gone
    #[error("outbound channel closed")]
    Closed,
}

/// Terminal state of one delivery, reported back to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Processing completed; the transport may confirm the message
    Acked(Uuid),
    /// Processing faulted; the transport may requeue per its policy
    Failed(Uuid),
}

/// One inbound message, with its payload already parsed as JSON
///
/// The disposition handle is consumed by [`Delivery::ack`] or
/// [`Delivery::fail`]; a delivery has exactly one terminal state.
#[derive(Debug)]
pub struct Delivery {
    /// Correlation id assigned on receipt, carried through logs and results
    pub id: Uuid,
    /// Parsed message payload
    pub payload: serde_json::Value,
    disposition_tx: mpsc::UnboundedSender<Disposition>,
}

impl Delivery {
    /// Wrap a payload with a fresh correlation id
    pub fn new(
        payload: serde_json::Value,
        disposition_tx: mpsc::UnboundedSender<Disposition>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            disposition_tx,
        }
    }

    /// Mark the delivery successfully processed
    pub fn ack(self) {
        if self.disposition_tx.send(Disposition::Acked(self.id)).is_err() {
            debug!(delivery_id = %self.id, "Disposition receiver dropped, ack not observed");
        }
    }

    /// Mark the delivery failed (eligible for redelivery by the transport)
    pub fn fail(self) {
        if self.disposition_tx.send(Disposition::Failed(self.id)).is_err() {
            debug!(delivery_id = %self.id, "Disposition receiver dropped, fail not observed");
        }
    }
}

/// Source of inbound deliveries
///
/// `next` returning `None` means the channel is closed; the consumption loop
/// exits and releases its resources.
#[async_trait]
pub trait MessageSource: Send {
    /// Wait for the next delivery, or `None` when the source is exhausted
    async fn next(&mut self) -> Option<Delivery>;
}

/// Destination for fetched sub-resource results
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Forward one result onward
    async fn publish(&self, result: SubResourceResult) -> Result<(), TransportError>;
}

/// Channel-backed [`MessageSource`]
pub struct ChannelSource {
    rx: mpsc::Receiver<serde_json::Value>,
    disposition_tx: mpsc::UnboundedSender<Disposition>,
}

#[async_trait]
impl MessageSource for ChannelSource {
    async fn next(&mut self) -> Option<Delivery> {
        let payload = self.rx.recv().await?;
        Some(Delivery::new(payload, self.disposition_tx.clone()))
    }
}

/// Build a channel-backed source
///
/// Returns the payload sender (the feeder side), the source itself, and the
/// receiver on which dispositions can be observed.
pub fn channel_source(
    capacity: usize,
) -> (
    mpsc::Sender<serde_json::Value>,
    ChannelSource,
    mpsc::UnboundedReceiver<Disposition>,
) {
    let (payload_tx, rx) = mpsc::channel(capacity);
    let (disposition_tx, disposition_rx) = mpsc::unbounded_channel();
    (
        payload_tx,
        ChannelSource { rx, disposition_tx },
        disposition_rx,
    )
}

/// Channel-backed [`ResultSink`]
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SubResourceResult>,
}

#[async_trait]
impl ResultSink for ChannelSink {
    async fn publish(&self, result: SubResourceResult) -> Result<(), TransportError> {
        self.tx.send(result).map_err(|_| TransportError::Closed)
    }
}

/// Build a channel-backed sink plus its receiving side
pub fn channel_sink() -> (ChannelSink, mpsc::UnboundedReceiver<SubResourceResult>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx }, rx)
}

/// Feed the inbound channel from NDJSON lines on stdin
///
/// Lines that fail to parse as JSON are logged and skipped without producing
/// a delivery. The task ends on stdin EOF or when the channel closes, which
/// in turn ends the consumption loop.
pub fn spawn_stdin_feeder(tx: mpsc::Sender<serde_json::Value>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<serde_json::Value>(&line) {
                        Ok(payload) => {
                            if tx.send(payload).await.is_err() {
                                info!("Inbound channel closed, stopping stdin feeder");
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Skipping non-JSON input line");
                        }
                    }
                }
                Ok(None) => {
                    info!("Stdin closed, stopping feeder");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read from stdin, stopping feeder");
                    break;
                }
            }
        }
    })
}

/// Write outbound results as NDJSON to stdout
pub fn spawn_stdout_writer(
    mut rx: mpsc::UnboundedReceiver<SubResourceResult>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(result) = rx.recv().await {
            match serde_json::to_string(&result) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!(error = %e, "Failed to serialize outbound result"),
            }
        }
    })
}

/// Log dispositions as they are reported
///
/// Stands in for a broker client's confirm/requeue calls.
pub fn spawn_disposition_logger(
    mut rx: mpsc::UnboundedReceiver<Disposition>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(disposition) = rx.recv().await {
            match disposition {
                Disposition::Acked(id) => info!(delivery_id = %id, "Message acknowledged"),
                Disposition::Failed(id) => warn!(delivery_id = %id, "Message failed"),
            }
        }
    })
}
