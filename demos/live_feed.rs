//! Live feed - capturing from a producer task until stopped.
//!
//! This example demonstrates:
//! - Feeding a `ChannelSource` from a separate task
//! - Ending the capture early with a `StopHandle`
//! - Listing the primary queue after the capture
//!
//! ```sh
//! RUST_LOG=info cargo run --example live_feed
//! ```

use std::time::Duration;

use bytes::Bytes;
use packet_monitor::capture::{stop_channel, ChannelSource};
use packet_monitor::report::write_stdout_json;
use packet_monitor::transport::ScriptedTransport;
use packet_monitor::Monitor;
use tracing_subscriber::EnvFilter;

fn udp_frame(seq: u8) -> Bytes {
    let mut frame = vec![0u8; 64];
    frame[12] = 0x08;
    frame[14] = 0x45;
    frame[23] = 17;
    frame[26..30].copy_from_slice(&[192, 168, 1, 100]);
    frame[30..34].copy_from_slice(&[192, 168, 1, 1]);
    frame[63] = seq;
    Bytes::from(frame)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut monitor = Monitor::builder()
        .transport(ScriptedTransport::always(true))
        .build()?;

    let (tx, mut source) = ChannelSource::channel(64);
    let (stop, mut signal) = stop_channel();

    // Producer: one frame every 20ms, then ask the capture to stop.
    let producer = tokio::spawn(async move {
        for seq in 0..10u8 {
            if tx.send(udp_frame(seq)).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        stop.stop();
    });

    let report = monitor
        .start_capture(&mut source, Duration::from_secs(30), &mut signal)
        .await?;
    producer.await?;

    write_stdout_json(&report)?;
    for row in monitor.list_primary() {
        write_stdout_json(&row)?;
    }

    monitor.filter("192.168.1.100", "192.168.1.1");
    write_stdout_json(&monitor.replay().await?)?;
    write_stdout_json(&monitor.stats())?;

    Ok(())
}
