//! Acceptor + bounded worker pool (C5).
//!
//! One acceptor task funnels accepted sockets into a bounded connection
//! queue; a fixed pool of worker tasks drains it, each running the
//! connection FSM (C4) to completion before taking the next socket.
//! Backpressure on the connection queue blocks the acceptor; backpressure
//! on the record queue (owned by the caller, see `main.rs`) blocks workers
//! in turn — by design, the acceptor is the single point that ultimately
//! slows down under sink pressure.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::connection;
use crate::record::DeviceRecord;

const CONNECTION_QUEUE_CAPACITY: usize = 1000;

/// Binds `listen_addr` and runs the acceptor + worker pool until the
/// listener itself fails (never under normal operation).
pub async fn run(
    listen_addr: &str,
    workers: usize,
    read_timeout: Duration,
    timezone: String,
    record_tx: mpsc::Sender<DeviceRecord>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen_addr).await?;
    info!("listening on {listen_addr}");
    serve(listener, workers, read_timeout, timezone, record_tx).await
}

/// Runs the acceptor + worker pool against an already-bound listener.
/// Split out from `run` so tests can bind to an ephemeral port.
pub async fn serve(
    listener: TcpListener,
    workers: usize,
    read_timeout: Duration,
    timezone: String,
    record_tx: mpsc::Sender<DeviceRecord>,
) -> anyhow::Result<()> {
    let (conn_tx, conn_rx) = mpsc::channel::<(TcpStream, SocketAddr)>(CONNECTION_QUEUE_CAPACITY);
    let conn_rx = Arc::new(Mutex::new(conn_rx));

    for id in 0..workers.max(1) {
        let conn_rx = conn_rx.clone();
        let record_tx = record_tx.clone();
        let timezone = timezone.clone();
        tokio::spawn(async move {
            loop {
                let next = conn_rx.lock().await.recv().await;
                let Some((stream, peer)) = next else {
                    info!("worker {id}: connection queue closed, exiting");
                    return;
                };
                connection::handle(stream, peer, record_tx.clone(), read_timeout, timezone.clone()).await;
            }
        });
    }

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                if conn_tx.send((stream, peer)).await.is_err() {
                    warn!("connection queue closed, dropping {peer}");
                }
            }
            Err(e) => {
                warn!("accept error: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec8_wire::{encode_packet, AvlRecord, Priority};
    use std::collections::HashSet;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    /// P8: under a small worker pool and many simultaneous connections,
    /// every frame is decoded and delivered exactly once, and no worker
    /// deadlocks waiting on another connection.
    #[tokio::test]
    async fn concurrent_connections_each_deliver_exactly_one_record() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (record_tx, mut record_rx) = mpsc::channel(64);

        tokio::spawn(serve(
            listener,
            3,
            Duration::from_secs(2),
            "Asia/Jakarta".to_string(),
            record_tx,
        ));

        const DEVICE_COUNT: i64 = 12;
        let mut tasks = Vec::new();
        for n in 0..DEVICE_COUNT {
            tasks.push(tokio::spawn(async move {
                let imei = format!("{:015}", 356_307_042_441_000i64 + n);
                let mut stream = TcpStream::connect(addr).await.unwrap();

                let mut handshake = Vec::new();
                handshake.extend_from_slice(&15u16.to_be_bytes());
                handshake.extend_from_slice(imei.as_bytes());
                stream.write_all(&handshake).await.unwrap();
                let mut ack = [0u8; 1];
                stream.read_exact(&mut ack).await.unwrap();
                assert_eq!(ack[0], 0x01);

                let record = AvlRecord {
                    timestamp_ms: 1,
                    priority: Priority::Low,
                    longitude: n as i32,
                    latitude: 0,
                    altitude: 0,
                    angle: 0,
                    satellite_count: 0,
                    speed: 0,
                    event_id: 0,
                    io_elements: vec![],
                };
                let frame = encode_packet(&[record]);
                stream.write_all(&frame).await.unwrap();

                let mut frame_ack = [0u8; 4];
                stream.read_exact(&mut frame_ack).await.unwrap();
                imei
            }));
        }

        let mut sent_imeis = HashSet::new();
        for task in tasks {
            sent_imeis.insert(task.await.unwrap());
        }
        assert_eq!(sent_imeis.len(), DEVICE_COUNT as usize);

        let mut received_imeis = HashSet::new();
        for _ in 0..DEVICE_COUNT {
            let record = record_rx.recv().await.expect("every device's record is delivered");
            received_imeis.insert(record.imei);
        }
        assert_eq!(received_imeis, sent_imeis);
    }
}
