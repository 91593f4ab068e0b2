//! # packet-monitor
//!
//! Protocol-layer decoding and a staged packet pipeline.
//!
//! Captured frames flow through three queues owned by a [`Monitor`]:
//!
//! - **primary**: everything captured, in arrival order
//! - **matched**: frames exchanged between a chosen endpoint pair
//! - **retry**: frames whose replay failed, waiting for another cycle
//!
//! ## Architecture
//!
//! - **Decoder** ([`protocol`]): Ethernet → IPv4/IPv6 → TCP/UDP walk over
//!   byte ranges of a frame, bounded to five transitions
//! - **Pipeline** ([`capture`], [`filter`], [`replay`]): capture under a time
//!   budget, endpoint filtering with an oversize limit, bounded-retry replay
//!   over a pluggable [`transport::Transport`]
//!
//! Frame acquisition and transmission stay outside the crate behind the
//! [`capture::FrameSource`] and [`transport::Transport`] traits.
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use bytes::Bytes;
//! use packet_monitor::capture::{MemorySource, StopSignal};
//! use packet_monitor::transport::ScriptedTransport;
//! use packet_monitor::Monitor;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let mut frame = vec![0u8; 54];
//! frame[12] = 0x08; // IPv4
//! frame[14] = 0x45;
//! frame[23] = 6; // TCP
//! frame[26..30].copy_from_slice(&[192, 168, 1, 100]);
//! frame[30..34].copy_from_slice(&[192, 168, 1, 1]);
//!
//! let mut monitor = Monitor::builder()
//!     .transport(ScriptedTransport::always(true))
//!     .build()
//!     .unwrap();
//!
//! let mut source = MemorySource::new([Bytes::from(frame)]);
//! monitor
//!     .start_capture(&mut source, Duration::from_secs(1), &mut StopSignal::never())
//!     .await
//!     .unwrap();
//!
//! monitor.filter("192.168.1.100", "192.168.1.1");
//! let replay = monitor.replay().await.unwrap();
//! assert_eq!(replay.sent, 1);
//! # });
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod filter;
pub mod protocol;
pub mod queue;
pub mod replay;
pub mod report;
pub mod stats;
pub mod transport;

mod monitor;

pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use monitor::{BoxTransport, FilterSummary, Monitor, MonitorBuilder, ReplaySummary};
pub use protocol::{decode, Frame, LayerKind};
