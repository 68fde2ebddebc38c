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

//! Asynchronous per-role record logging
//!
//! Every decoded record is appended to its role's log. The append call is
//! fire-and-forget: the listener hands the record to a bounded queue and
//! goes back to the socket; a dedicated worker thread per role drains the
//! queue into the sink. Records for one role land in arrival order; records
//! for different roles have no ordering relationship. Sink failures are
//! logged and never travel back to the ingestion path.
//!
//! The queue is bounded. If the sink cannot keep up and the queue fills,
//! new records are dropped and counted rather than stalling the network
//! path or growing the backlog without limit.

use crate::error::TelemetryError;
use crate::packet::TelemetryRecord;
use crate::types::Role;
use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Timestamp layout for log lines. No colons, so a line prefix can double
/// as a filename fragment (same layout the log tooling already expects).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H.%M.%S%.6f";

/// One record queued for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// When the record was ingested
    pub timestamp: DateTime<Utc>,
    /// The decoded record
    pub record: TelemetryRecord,
}

impl LogEntry {
    /// Render the entry as one log line: `timestamp<space>json`.
    pub fn line(&self) -> serde_json::Result<String> {
        let json = self.record.to_json()?;
        Ok(format!("{} {}", self.timestamp.format(TIMESTAMP_FORMAT), json))
    }
}

/// Append-only destination for one role's log entries.
///
/// Constructed once per role by the caller, used from a single worker
/// thread — implementations only need to be safe for sequential,
/// single-producer use. File naming and rotation stay with the caller.
pub trait RecordSink: Send + 'static {
    /// Append one entry. Called strictly in arrival order.
    fn append(&mut self, entry: &LogEntry) -> std::io::Result<()>;
}

/// [`RecordSink`] writing `timestamp<space>json` lines to a file.
#[derive(Debug)]
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    /// Open (or create) `path` for appending.
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<FileSink> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(FileSink {
            writer: BufWriter::new(file),
        })
    }
}

impl RecordSink for FileSink {
    fn append(&mut self, entry: &LogEntry) -> std::io::Result<()> {
        let line = entry.line()?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        // One record per flush: a crash loses at most the in-flight entry.
        self.writer.flush()
    }
}

/// Handle for appending records to one role's log stream.
#[derive(Debug)]
pub struct RecordLogger {
    role: Role,
    tx: mpsc::Sender<LogEntry>,
    dropped: Arc<AtomicU64>,
    worker: JoinHandle<()>,
}

impl RecordLogger {
    /// Spawn the worker for `role`, draining into `sink`.
    ///
    /// `buffer` bounds the pending-record queue.
    pub fn spawn(role: Role, sink: Box<dyn RecordSink>, buffer: usize) -> RecordLogger {
        let (tx, rx) = mpsc::channel(buffer);
        let worker = tokio::task::spawn_blocking(move || worker_loop(role, sink, rx));
        RecordLogger {
            role,
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
            worker,
        }
    }

    /// The role this logger appends for.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Queue one record for persistence. Returns immediately.
    ///
    /// On a full queue the record is dropped and counted; ingestion is
    /// never delayed by a slow sink.
    pub fn append(&self, record: TelemetryRecord, timestamp: DateTime<Utc>) {
        let entry = LogEntry { timestamp, record };
        match self.tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    role = %self.role,
                    dropped,
                    "record log backlog full, dropping record"
                );
            }
            Err(TrySendError::Closed(_)) => {
                warn!(role = %self.role, "record log worker gone, dropping record");
            }
        }
    }

    /// Number of records dropped due to a full queue.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Close the queue and wait for the worker to drain it.
    pub async fn close(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}

fn worker_loop(role: Role, mut sink: Box<dyn RecordSink>, mut rx: mpsc::Receiver<LogEntry>) {
    while let Some(entry) = rx.blocking_recv() {
        if let Err(source) = sink.append(&entry) {
            // Reported here and nowhere else: persistence failure must not
            // reach the ingestion path.
            let err = TelemetryError::Persist(source);
            error!(role = %role, error = %err, "failed to persist telemetry record");
        }
    }
    debug!(role = %role, "record log worker finished");
}
