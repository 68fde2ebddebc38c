//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Daqlink Telemetry Ingestion Service
//!
//! This crate ingests streaming telemetry from two independent onboard
//! data-acquisition units over raw TCP, reconstructs discrete records from
//! a length-prefixed byte stream, decodes each record's JSON payload
//! according to which unit sent it, projects selected fields into live
//! dashboard state, and appends every decoded record to a per-unit log.
//!
//! # Architecture
//!
//! ```text
//! Supervisor
//!     ↓ (one task per role)
//! ConnectionListener ── FramedRead<FrameCodec> ── PacketDecoder
//!     │                                               │
//!     │ StateUpdate (mpsc)                            │ LogEntry (bounded mpsc)
//!     ↓                                               ↓
//! StateWriter task ── watch ──> readers          RecordLogger worker ──> RecordSink
//! ```
//!
//! Concurrency discipline: socket reads suspend only the owning listener's
//! task; the dashboard has exactly one writer (the state task), fed by
//! message passing; each role's log has its own worker behind a bounded
//! queue so persistence latency can never stall the network path.
//!
//! # Example
//!
//! ```no_run
//! use daqlink_service::{FileSink, IngestConfig, RecordSink, Role, Supervisor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = IngestConfig::new()
//!         .with_listener(Role::Primary, "172.20.10.1:8080".parse()?)
//!         .with_listener(Role::Secondary, "172.20.10.1:8081".parse()?);
//!
//!     let supervisor = Supervisor::start(config, |role| {
//!         Ok(Box::new(FileSink::create(format!("telemetry-{role}.log"))?) as Box<dyn RecordSink>)
//!     })
//!     .await?;
//!
//!     let mut dashboard = supervisor.dashboard();
//!     while dashboard.changed().await.is_ok() {
//!         println!("{:?}", *dashboard.borrow_and_update());
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod decoder;
mod error;
mod listener;
mod logger;
mod packet;
mod state;
mod supervisor;
mod types;

pub use config::{IngestConfig, ListenerConfig};
pub use decoder::PacketDecoder;
pub use error::{Result, TelemetryError};
pub use listener::{ConnectionListener, SessionEnd};
pub use logger::{FileSink, LogEntry, RecordLogger, RecordSink};
pub use packet::{Acceleration, PrimaryPacket, RtkCorrection, SecondaryPacket, TelemetryRecord};
pub use state::{
    DashboardState, StateSink, StateUpdate, StateWriter, WHEEL_DIAMETER_M, project, speed_from_rpm,
};
pub use supervisor::Supervisor;
pub use types::{ListenerState, Role};
