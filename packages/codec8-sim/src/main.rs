//! codec8-sim — synthetic Teltonika Codec 8 tracker
//!
//! Connects to an `avl-server` instance, performs the IMEI handshake, then
//! sends one AVL frame per tick with a slowly drifting position. Useful for
//! manual end-to-end testing and for watching the server's worker pool
//! under sustained load from a handful of simulated devices.
//!
//! Never crashes on connection loss — it logs and reconnects, mirroring how
//! a real tracker would retry after losing its TCP flow.

use std::time::Duration;

use clap::Parser;
use codec8_wire::{encode_packet, AvlRecord, IoElement, Priority};
use rand::Rng;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "codec8-sim", about = "Synthetic Codec 8 tracker")]
struct Args {
    /// Server address to connect to
    #[arg(long, default_value = "127.0.0.1:5000")]
    server: String,
    /// 15-digit IMEI to present during the handshake
    #[arg(long, default_value = "356307042441013")]
    imei: String,
    /// Seconds between AVL frames
    #[arg(long, default_value = "5")]
    interval_secs: u64,
    /// AVL records per frame
    #[arg(long, default_value = "1")]
    records_per_frame: u32,
    /// Starting longitude, degrees x 10^7
    #[arg(long, default_value = "1068175000")]
    start_longitude: i32,
    /// Starting latitude, degrees x 10^7
    #[arg(long, default_value = "-63001000")]
    start_latitude: i32,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let mut longitude = args.start_longitude;
    let mut latitude = args.start_latitude;
    let mut rng = rand::thread_rng();

    loop {
        match run_session(&args, &mut longitude, &mut latitude, &mut rng).await {
            Ok(()) => warn!("codec8-sim: session to {} ended, reconnecting", args.server),
            Err(e) => warn!("codec8-sim: session error: {e}, reconnecting in 2s"),
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
}

async fn run_session(
    args: &Args,
    longitude: &mut i32,
    latitude: &mut i32,
    rng: &mut impl Rng,
) -> std::io::Result<()> {
    let mut stream = TcpStream::connect(&args.server).await?;
    info!("codec8-sim: connected to {}", args.server);

    // Handshake: 2-byte length prefix + 15 ASCII digits.
    let imei_bytes = args.imei.as_bytes();
    let mut handshake = Vec::with_capacity(2 + imei_bytes.len());
    handshake.extend_from_slice(&(imei_bytes.len() as u16).to_be_bytes());
    handshake.extend_from_slice(imei_bytes);
    stream.write_all(&handshake).await?;

    let mut ack = [0u8; 1];
    stream.read_exact(&mut ack).await?;
    if ack[0] != 0x01 {
        warn!("codec8-sim: handshake rejected by server (byte {:#04x})", ack[0]);
        return Ok(());
    }
    info!("codec8-sim: IMEI {} registered", args.imei);

    loop {
        *longitude += rng.gen_range(-50..=50);
        *latitude += rng.gen_range(-50..=50);

        let records: Vec<AvlRecord> = (0..args.records_per_frame)
            .map(|i| synthetic_record(*longitude, *latitude, i))
            .collect();
        let frame = encode_packet(&records);

        stream.write_all(&frame).await?;

        let mut ack = [0u8; 4];
        stream.read_exact(&mut ack).await?;
        let acked = u32::from_be_bytes(ack);
        info!(
            "codec8-sim: sent {} record(s), server acked {}",
            records.len(),
            acked
        );

        tokio::time::sleep(Duration::from_secs(args.interval_secs)).await;
    }
}

fn synthetic_record(longitude: i32, latitude: i32, seq: u32) -> AvlRecord {
    let timestamp_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;

    AvlRecord {
        timestamp_ms,
        priority: Priority::Low,
        longitude,
        latitude,
        altitude: 50,
        angle: 180,
        satellite_count: 9,
        speed: 42,
        event_id: if seq == 0 { 0 } else { 1 },
        io_elements: vec![
            IoElement { id: 1, length: 1, value: vec![1] },            // ignition
            IoElement { id: 66, length: 2, value: vec![0x15, 0x7C] },  // external voltage
        ],
    }
}
