//! Pipeline - one full pass over synthetic traffic.
//!
//! This example demonstrates:
//! - Capturing preloaded frames with a `MemorySource`
//! - Decoding, filtering and replaying through a lossy link
//! - Emitting every stage as JSON lines on stdout (logs go to stderr)
//!
//! ```sh
//! RUST_LOG=debug cargo run --example pipeline
//! ```

use std::time::Duration;

use bytes::Bytes;
use packet_monitor::capture::{MemorySource, StopSignal};
use packet_monitor::report::{write_json_lines, write_stdout_json};
use packet_monitor::transport::LossyTransport;
use packet_monitor::{Monitor, MonitorConfig};
use tracing_subscriber::EnvFilter;

/// Ethernet + IPv4 frame carrying a TCP (6) or UDP (17) header.
fn ipv4_frame(src: [u8; 4], dst: [u8; 4], protocol: u8, len: usize) -> Bytes {
    let mut frame = vec![0u8; len.max(54)];
    frame[12] = 0x08;
    frame[14] = 0x45;
    frame[23] = protocol;
    frame[26..30].copy_from_slice(&src);
    frame[30..34].copy_from_slice(&dst);
    Bytes::from(frame)
}

fn synthetic_traffic() -> Vec<Bytes> {
    let host = [192, 168, 1, 100];
    let gateway = [192, 168, 1, 1];
    let other = [10, 0, 0, 7];

    let mut frames = Vec::new();
    for i in 0..8 {
        frames.push(ipv4_frame(host, gateway, 6, 60 + i * 10));
        frames.push(ipv4_frame(gateway, host, 6, 1200));
        frames.push(ipv4_frame(host, other, 17, 80));
    }
    // Bulk transfer: enough oversized frames to trip the per-pass limit.
    for _ in 0..12 {
        frames.push(ipv4_frame(gateway, host, 6, 2000));
    }
    frames
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = MonitorConfig::default();
    let mut monitor = Monitor::builder()
        .transport(LossyTransport::with_seed(config.lossy_success_percent, 42))
        .config(config)
        .retry_delay(Duration::from_millis(5))
        .build()?;

    let mut source = MemorySource::new(synthetic_traffic());
    let capture = monitor
        .start_capture(
            &mut source,
            Duration::from_secs(1),
            &mut StopSignal::never(),
        )
        .await?;
    write_stdout_json(&capture)?;

    let analyses = monitor.decode_all();
    write_json_lines(&mut std::io::stdout().lock(), &analyses[..3])?;

    write_stdout_json(&monitor.filter_default())?;
    write_stdout_json(&monitor.stats())?;

    // Two replay cycles: the second one retries what the first could not send.
    for _ in 0..2 {
        write_stdout_json(&monitor.replay().await?)?;
        monitor.requeue_retries();
    }

    eprintln!("{}", monitor.stats());
    Ok(())
}
