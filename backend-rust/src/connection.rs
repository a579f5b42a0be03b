//! Per-connection handshake and data-frame loop (C4).
//!
//! `AwaitImei → Registered → (Reading ↔ Acked) → Closed`, looped for the
//! life of the TCP flow. Never panics to the caller — every error is
//! logged and the connection is closed; the device is expected to
//! reconnect and retransmit whatever wasn't acked.

use std::time::Duration;

use codec8_wire::decode_packet;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::record::DeviceRecord;

const IMEI_LEN: usize = 15;
const HEADER_LEN: usize = 8; // preamble(4) + payload_len(4)
const FRAME_TAIL_LEN: usize = 4; // crc16 field, already counted in payload_len+12

/// Runs the FSM for one accepted connection to completion.
pub async fn handle(
    mut stream: TcpStream,
    peer: std::net::SocketAddr,
    record_tx: mpsc::Sender<DeviceRecord>,
    read_timeout: Duration,
    timezone: String,
) {
    let imei = match await_imei(&mut stream, read_timeout).await {
        Ok(imei) => imei,
        Err(e) => {
            warn!("{peer}: handshake failed: {e}");
            return;
        }
    };
    info!(imei = %imei, "{peer}: registered");

    loop {
        match read_frame(&mut stream, read_timeout).await {
            Ok(Some(frame)) => match decode_packet(&frame) {
                Ok(packet) => {
                    let ack = packet.ack_bytes();
                    if let Err(e) = stream.write_all(&ack).await {
                        warn!(imei = %imei, "{peer}: failed to write ack: {e}");
                        return;
                    }

                    for avl in &packet.records {
                        let record = DeviceRecord::from_avl(&imei, avl, &timezone);
                        if record_tx.send(record).await.is_err() {
                            warn!(imei = %imei, "{peer}: sink queue closed, dropping record");
                        }
                    }
                }
                Err(e) => {
                    warn!(imei = %imei, "{peer}: decode failed: {e}");
                    return;
                }
            },
            Ok(None) => {
                info!(imei = %imei, "{peer}: connection closed by peer");
                return;
            }
            Err(e) => {
                warn!(imei = %imei, "{peer}: read error: {e}");
                return;
            }
        }
    }
}

/// `AwaitImei`: length-delimited read of the handshake frame. Closes
/// silently (by returning an error the caller logs and drops) on a
/// malformed length prefix or unparseable IMEI digits.
async fn await_imei(stream: &mut TcpStream, read_timeout: Duration) -> anyhow::Result<String> {
    let mut len_buf = [0u8; 2];
    timeout(read_timeout, stream.read_exact(&mut len_buf)).await??;
    let declared_len = u16::from_be_bytes(len_buf) as usize;
    if declared_len != IMEI_LEN {
        let _ = stream.write_all(&[0x00]).await;
        anyhow::bail!("handshake length prefix {declared_len} != {IMEI_LEN}");
    }

    let mut imei_buf = [0u8; IMEI_LEN];
    timeout(read_timeout, stream.read_exact(&mut imei_buf)).await??;

    let sanitized: String = imei_buf
        .iter()
        .copied()
        .filter(|&b| (0x20..=0x7E).contains(&b))
        .map(|b| b as char)
        .collect();

    if sanitized.parse::<i64>().is_err() {
        let _ = stream.write_all(&[0x00]).await;
        anyhow::bail!("IMEI {sanitized:?} is not a valid decimal number");
    }

    stream.write_all(&[0x01]).await?;
    Ok(sanitized)
}

/// `Reading`: reads one complete Codec 8 frame. Returns `Ok(None)` on a
/// clean EOF before any bytes of the next frame arrive (peer closed).
async fn read_frame(stream: &mut TcpStream, read_timeout: Duration) -> anyhow::Result<Option<Vec<u8>>> {
    let mut header = [0u8; HEADER_LEN];
    match timeout(read_timeout, stream.read_exact(&mut header)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Ok(Err(e)) => return Err(e.into()),
        Err(e) => return Err(e.into()),
    }

    let payload_len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    let remaining = payload_len + FRAME_TAIL_LEN;
    let total_len = payload_len + HEADER_LEN + FRAME_TAIL_LEN; // payload_len + 12

    let mut frame = Vec::with_capacity(total_len);
    frame.extend_from_slice(&header);
    let mut rest = vec![0u8; remaining];
    timeout(read_timeout, stream.read_exact(&mut rest)).await??;
    frame.extend_from_slice(&rest);

    Ok(Some(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec8_wire::{encode_packet, AvlRecord, Priority};
    use tokio::net::{TcpListener, TcpStream};

    async fn loopback_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (client, server)
    }

    #[tokio::test]
    async fn s1_imei_handshake_is_accepted_and_parsed() {
        let (mut client, mut server) = loopback_pair().await;
        tokio::spawn(async move {
            let mut frame = Vec::new();
            frame.extend_from_slice(&15u16.to_be_bytes());
            frame.extend_from_slice(b"356307042441013");
            client.write_all(&frame).await.unwrap();

            let mut ack = [0u8; 1];
            client.read_exact(&mut ack).await.unwrap();
            assert_eq!(ack[0], 0x01);
        });

        let imei = await_imei(&mut server, Duration::from_secs(1)).await.unwrap();
        assert_eq!(imei, "356307042441013");
    }

    #[tokio::test]
    async fn bad_handshake_length_is_rejected() {
        let (mut client, mut server) = loopback_pair().await;
        tokio::spawn(async move {
            client.write_all(&10u16.to_be_bytes()).await.unwrap();
            client.write_all(b"1234567890").await.unwrap();
        });

        let result = await_imei(&mut server, Duration::from_secs(1)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn full_fsm_decodes_and_acks_one_frame() {
        let (mut client, server) = loopback_pair().await;
        let (record_tx, mut record_rx) = mpsc::channel(8);

        let peer = client.local_addr().unwrap();
        tokio::spawn(handle(
            server,
            peer,
            record_tx,
            Duration::from_secs(1),
            "Asia/Jakarta".to_string(),
        ));

        let mut handshake = Vec::new();
        handshake.extend_from_slice(&15u16.to_be_bytes());
        handshake.extend_from_slice(b"356307042441013");
        client.write_all(&handshake).await.unwrap();
        let mut ack = [0u8; 1];
        client.read_exact(&mut ack).await.unwrap();
        assert_eq!(ack[0], 0x01);

        let record = AvlRecord {
            timestamp_ms: 1_700_000_000_000,
            priority: Priority::High,
            longitude: 107_000_000,
            latitude: -6_200_000,
            altitude: 50,
            angle: 90,
            satellite_count: 9,
            speed: 42,
            event_id: 1,
            io_elements: vec![],
        };
        let frame = encode_packet(&[record]);
        client.write_all(&frame).await.unwrap();

        let mut frame_ack = [0u8; 4];
        client.read_exact(&mut frame_ack).await.unwrap();
        assert_eq!(u32::from_be_bytes(frame_ack), 1);

        let delivered = record_rx.recv().await.unwrap();
        assert_eq!(delivered.imei, "356307042441013");
        assert_eq!(delivered.longitude, 107_000_000);
    }
}
