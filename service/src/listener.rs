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

//! Per-role connection listener
//!
//! One listener owns one listen socket and serves one unit. Its life is the
//! state machine `Binding → Listening → (Accepting ⇄ Serving) → Stopped`:
//! block until the unit connects, ingest frames until the session ends,
//! publish the connection status at both edges, return to accept. Exactly
//! one session per role is ever active — a second connection attempt waits
//! in the transport backlog until the first session ends.
//!
//! Error discipline within a session: a malformed payload discards that
//! frame only; a truncated or oversized frame ends the session; both leave
//! the listener accepting again. Only a bind failure stops a listener, and
//! it stops only that role.

use crate::config::ListenerConfig;
use crate::decoder::PacketDecoder;
use crate::error::{Result, TelemetryError};
use crate::logger::RecordLogger;
use crate::state::{StateSink, StateUpdate, project};
use crate::types::{ListenerState, Role};
use chrono::Utc;
use daqlink_framecodec::FrameCodec;
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, warn};

/// How a serving session came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The unit closed the connection on a frame boundary
    Disconnected,
    /// Shutdown was requested while the session was active
    ShutdownRequested,
}

/// Listener for one role's telemetry connection.
pub struct ConnectionListener {
    role: Role,
    listener: TcpListener,
    local_addr: SocketAddr,
    decoder: PacketDecoder,
    state_sink: StateSink,
    logger: RecordLogger,
    state: Arc<AtomicU8>,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl ConnectionListener {
    /// Open the listen socket for `config`.
    ///
    /// Binding eagerly makes the bound address observable before the accept
    /// loop starts (port 0 resolves here) and surfaces
    /// [`TelemetryError::Bind`] — fatal for this role, harmless to others —
    /// at startup rather than somewhere inside a task.
    pub async fn bind(
        config: &ListenerConfig,
        state_sink: StateSink,
        logger: RecordLogger,
        running: Arc<AtomicBool>,
        shutdown: Arc<Notify>,
    ) -> Result<ConnectionListener> {
        let state = Arc::new(AtomicU8::new(ListenerState::Binding.as_u8()));
        let listener = TcpListener::bind(config.bind_address)
            .await
            .map_err(|source| TelemetryError::Bind {
                role: config.role,
                addr: config.bind_address,
                source,
            })?;
        let local_addr = listener.local_addr()?;
        info!(role = %config.role, addr = %local_addr, "telemetry listener bound");

        Ok(ConnectionListener {
            role: config.role,
            listener,
            local_addr,
            decoder: PacketDecoder::new(config.role),
            state_sink,
            logger,
            state,
            running,
            shutdown,
        })
    }

    /// The role this listener serves.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The actual bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ListenerState {
        ListenerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Shared handle observing this listener's state after `run` consumes
    /// it.
    pub(crate) fn state_handle(&self) -> Arc<AtomicU8> {
        self.state.clone()
    }

    fn set_state(&self, new_state: ListenerState) {
        self.state.store(new_state.as_u8(), Ordering::Release);
    }

    /// Run the accept loop until shutdown.
    ///
    /// Never returns an error: every failure mode is handled at its scope
    /// and logged from here.
    pub async fn run(mut self) {
        self.set_state(ListenerState::Listening);
        info!(role = %self.role, addr = %self.local_addr, "listening for telemetry");

        while self.running.load(Ordering::SeqCst) {
            self.set_state(ListenerState::Accepting);

            let (socket, peer) = tokio::select! {
                result = self.listener.accept() => match result {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        // Transient: log and go right back to accepting,
                        // with a short sleep to avoid a tight error loop.
                        error!(role = %self.role, error = %err, "failed to accept connection");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        continue;
                    }
                },
                _ = self.shutdown.notified() => break,
            };

            info!(role = %self.role, peer = %peer, "unit connected");
            self.set_state(ListenerState::Serving);
            self.state_sink
                .publish(StateUpdate::Connected(self.role, true))
                .await;

            let end = self.serve(socket).await;

            self.state_sink
                .publish(StateUpdate::Connected(self.role, false))
                .await;

            match end {
                Ok(SessionEnd::Disconnected) => {
                    info!(role = %self.role, "unit disconnected");
                }
                Ok(SessionEnd::ShutdownRequested) => break,
                Err(err) => {
                    warn!(role = %self.role, error = %err, "session ended on protocol violation");
                }
            }
        }

        self.set_state(ListenerState::Stopped);
        info!(role = %self.role, "listener stopped");
    }

    /// Ingest frames from one session until it ends.
    async fn serve(&mut self, socket: TcpStream) -> Result<SessionEnd> {
        // Fresh codec per session: framing state never crosses connections.
        let mut frames = FramedRead::new(socket, FrameCodec::new());

        loop {
            let frame = tokio::select! {
                frame = frames.next() => frame,
                _ = self.shutdown.notified() => return Ok(SessionEnd::ShutdownRequested),
            };

            match frame {
                Some(Ok(payload)) => match self.decoder.decode(&payload) {
                    Ok(record) => {
                        debug!(role = %self.role, record = ?record, "decoded telemetry record");
                        let updates = project(&record);
                        self.logger.append(record, Utc::now());
                        self.state_sink.publish_all(updates).await;
                    }
                    Err(err) => {
                        // Per-frame: the malformed frame is discarded and
                        // the session keeps reading.
                        warn!(role = %self.role, error = %err, "discarding malformed frame");
                    }
                },
                Some(Err(err)) => return Err(err.into()),
                None => return Ok(SessionEnd::Disconnected),
            }
        }
    }
}

impl std::fmt::Debug for ConnectionListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionListener")
            .field("role", &self.role)
            .field("local_addr", &self.local_addr)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{LogEntry, RecordSink};
    use crate::state::StateWriter;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;

    struct NullSink;

    impl RecordSink for NullSink {
        fn append(&mut self, _entry: &LogEntry) -> std::io::Result<()> {
            Ok(())
        }
    }

    async fn bound_listener(role: Role) -> (ConnectionListener, tokio::sync::watch::Receiver<crate::DashboardState>, Arc<Notify>, Arc<AtomicBool>) {
        let config = ListenerConfig::new(role, "127.0.0.1:0".parse().unwrap());
        let (sink, writer, dashboard) = StateWriter::channel(64);
        tokio::spawn(writer.run());
        let logger = RecordLogger::spawn(role, Box::new(NullSink), 64);
        let running = Arc::new(AtomicBool::new(true));
        let shutdown = Arc::new(Notify::new());
        let listener = ConnectionListener::bind(&config, sink, logger, running.clone(), shutdown.clone())
            .await
            .unwrap();
        (listener, dashboard, shutdown, running)
    }

    fn wire_frame(payload: &[u8]) -> Vec<u8> {
        let mut bytes = (payload.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[tokio::test]
    async fn bind_conflict_is_a_bind_error() {
        let (first, _dashboard, _shutdown, _running) = bound_listener(Role::Primary).await;
        let config = ListenerConfig::new(Role::Primary, first.local_addr());

        let (sink, writer, _watch) = StateWriter::channel(8);
        tokio::spawn(writer.run());
        let logger = RecordLogger::spawn(Role::Primary, Box::new(NullSink), 8);
        let result = ConnectionListener::bind(
            &config,
            sink,
            logger,
            Arc::new(AtomicBool::new(true)),
            Arc::new(Notify::new()),
        )
        .await;

        match result {
            Err(TelemetryError::Bind { role, addr, .. }) => {
                assert_eq!(role, Role::Primary);
                assert_eq!(addr, first.local_addr());
            }
            other => panic!("expected Bind error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn session_updates_connection_status_both_ways() {
        let (listener, mut dashboard, shutdown, running) = bound_listener(Role::Secondary).await;
        let addr = listener.local_addr();
        let task = tokio::spawn(listener.run());

        let mut unit = TcpStream::connect(addr).await.unwrap();
        dashboard
            .wait_for(|state| state.secondary_connected)
            .await
            .unwrap();

        unit.write_all(&wire_frame(br#"{"yaw":12.0}"#)).await.unwrap();
        unit.shutdown().await.unwrap();
        drop(unit);

        dashboard
            .wait_for(|state| !state.secondary_connected)
            .await
            .unwrap();

        running.store(false, Ordering::SeqCst);
        shutdown.notify_waiters();
        // Nudge the accept loop in case the notification raced past it.
        let _ = TcpStream::connect(addr).await;
        task.await.unwrap();
    }
}
