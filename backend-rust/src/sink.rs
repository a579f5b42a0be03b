//! Outbound delivery path for decoded records (C6).
//!
//! The only implemented sink logs each record as JSON at `info` level.
//! RabbitMQ/Redis/database sinks are configuration placeholders only —
//! recognized by `Config` (see `config.rs`), never dialed.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::record::DeviceRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    async fn deliver(&self, record: DeviceRecord) -> Result<(), SinkError>;
}

/// JSON-lines-to-tracing sink. The only kind actually dialed; any other
/// `sink.kind` value falls back to this with a startup warning.
pub struct LoggingSink;

#[async_trait::async_trait]
impl Sink for LoggingSink {
    async fn deliver(&self, record: DeviceRecord) -> Result<(), SinkError> {
        let json = serde_json::to_string(&record)?;
        info!(imei = %record.imei, "{json}");
        Ok(())
    }
}

/// Picks the concrete sink for `kind`. Broker/database sinks aren't wired
/// up yet, so any kind other than `"log"` warns and falls back rather than
/// failing to start.
pub fn build_sink(kind: &str) -> Box<dyn Sink> {
    match kind {
        "log" => Box::new(LoggingSink),
        other => {
            warn!("sink.kind={other:?} is not implemented, falling back to \"log\"");
            Box::new(LoggingSink)
        }
    }
}

/// Drains the record queue into `sink` until every sender is dropped.
/// A delivery error is logged and the record is dropped — the protocol
/// ack already happened, so no retransmission will occur for it.
pub async fn run_sink(sink: Box<dyn Sink>, mut records: mpsc::Receiver<DeviceRecord>) {
    while let Some(record) = records.recv().await {
        let imei = record.imei.clone();
        if let Err(e) = sink.deliver(record).await {
            warn!("sink delivery failed for {imei}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> DeviceRecord {
        DeviceRecord {
            imei: "356307042441013".to_string(),
            timestamp_ms: 1,
            priority: 0,
            longitude: 0,
            latitude: 0,
            altitude: 0,
            angle: 0,
            satellite_count: 0,
            speed: 0,
            event_id: 0,
            server_timestamp_iso: "2026-01-01 00:00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn logging_sink_accepts_a_record() {
        let sink = LoggingSink;
        assert!(sink.deliver(sample_record()).await.is_ok());
    }

    #[test]
    fn unknown_sink_kind_falls_back_to_logging() {
        // build_sink never panics or fails for an unrecognized kind; the
        // fallback is LoggingSink under a different name, which we can't
        // downcast, so we just assert it constructs without issue.
        let _ = build_sink("rabbitmq");
        let _ = build_sink("log");
    }
}
