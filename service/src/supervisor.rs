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

//! Supervisor owning the listener and state-writer tasks
//!
//! The supervisor is the one entry point the surrounding application talks
//! to: it validates the configuration, starts one listener task per role
//! plus the single state-writer task, and hands back a watch receiver for
//! the dashboard. Listener tasks run for the process lifetime; a per-role
//! startup failure (bind, sink construction) disables that role only and
//! leaves the rest of the service up.

use crate::config::IngestConfig;
use crate::error::Result;
use crate::listener::ConnectionListener;
use crate::logger::{RecordLogger, RecordSink};
use crate::state::{DashboardState, StateWriter};
use crate::types::{ListenerState, Role};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Metadata for one started listener.
struct RoleHandle {
    role: Role,
    local_addr: SocketAddr,
    state: Arc<AtomicU8>,
}

/// Supervisor for the telemetry ingestion service.
///
/// # Example
///
/// ```no_run
/// use daqlink_service::{FileSink, IngestConfig, RecordSink, Role, Supervisor};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = IngestConfig::new()
///         .with_listener(Role::Primary, "0.0.0.0:8080".parse()?)
///         .with_listener(Role::Secondary, "0.0.0.0:8081".parse()?);
///
///     let supervisor = Supervisor::start(config, |role| {
///         Ok(Box::new(FileSink::create(format!("{role}.log"))?) as Box<dyn RecordSink>)
///     })
///     .await?;
///
///     let dashboard = supervisor.dashboard();
///     // ... run the application, read the dashboard ...
///     supervisor.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct Supervisor {
    /// Running flag, cleared on shutdown
    running: Arc<AtomicBool>,
    /// Shutdown notification fanned out to every listener
    shutdown_notify: Arc<Notify>,
    /// How long shutdown waits per task before abandoning it
    shutdown_grace: Duration,
    /// Started listeners (roles that failed at startup are absent)
    roles: Vec<RoleHandle>,
    /// Listener task handles, taken by `shutdown`
    tasks: tokio::sync::Mutex<Vec<(Role, JoinHandle<()>)>>,
    /// State-writer task handle, taken by `shutdown`
    state_task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    /// Dashboard snapshot channel
    dashboard: watch::Receiver<DashboardState>,
}

impl Supervisor {
    /// Validate `config`, start the state writer and one listener per
    /// configured role, and return the running supervisor.
    ///
    /// `make_sink` constructs the log-append collaborator for each role.
    /// A role whose sink construction or bind fails is logged and disabled;
    /// the other roles start normally. Only an invalid configuration fails
    /// the whole start.
    pub async fn start<F>(config: IngestConfig, mut make_sink: F) -> Result<Supervisor>
    where
        F: FnMut(Role) -> std::io::Result<Box<dyn RecordSink>>,
    {
        config.validate()?;

        let (state_sink, writer, dashboard) = StateWriter::channel(config.state_buffer);
        let state_task = tokio::spawn(writer.run());

        let running = Arc::new(AtomicBool::new(true));
        let shutdown_notify = Arc::new(Notify::new());
        let mut roles = Vec::new();
        let mut tasks = Vec::new();

        for listener_config in &config.listeners {
            let role = listener_config.role;

            let sink = match make_sink(role) {
                Ok(sink) => sink,
                Err(err) => {
                    error!(role = %role, error = %err, "record sink construction failed, role disabled");
                    continue;
                }
            };
            let logger = RecordLogger::spawn(role, sink, config.log_buffer);

            match ConnectionListener::bind(
                listener_config,
                state_sink.clone(),
                logger,
                running.clone(),
                shutdown_notify.clone(),
            )
            .await
            {
                Ok(listener) => {
                    roles.push(RoleHandle {
                        role,
                        local_addr: listener.local_addr(),
                        state: listener.state_handle(),
                    });
                    tasks.push((role, tokio::spawn(listener.run())));
                }
                Err(err) => {
                    error!(role = %role, error = %err, "bind failed, role disabled");
                }
            }
        }
        // The writer must observe only the listeners' sinks, so its loop
        // ends when they do.
        drop(state_sink);

        info!(
            roles = roles.len(),
            configured = config.listeners.len(),
            "telemetry ingestion started"
        );

        Ok(Supervisor {
            running,
            shutdown_notify,
            shutdown_grace: config.shutdown_grace,
            roles,
            tasks: tokio::sync::Mutex::new(tasks),
            state_task: tokio::sync::Mutex::new(Some(state_task)),
            dashboard,
        })
    }

    /// A receiver observing every dashboard snapshot.
    pub fn dashboard(&self) -> watch::Receiver<DashboardState> {
        self.dashboard.clone()
    }

    /// The bound address for `role`, if that role started.
    pub fn local_addr(&self, role: Role) -> Option<SocketAddr> {
        self.roles
            .iter()
            .find(|handle| handle.role == role)
            .map(|handle| handle.local_addr)
    }

    /// The lifecycle state of `role`'s listener, if that role started.
    pub fn listener_state(&self, role: Role) -> Option<ListenerState> {
        self.roles
            .iter()
            .find(|handle| handle.role == role)
            .map(|handle| ListenerState::from_u8(handle.state.load(Ordering::Acquire)))
    }

    /// Check if the supervisor is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Shut down gracefully: stop accepting, end active sessions, wait for
    /// every task up to the configured grace period.
    ///
    /// Idempotent; a second call finds nothing left to stop.
    pub async fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        info!("shutting down telemetry ingestion");
        self.shutdown_notify.notify_waiters();

        for (role, mut task) in self.tasks.lock().await.drain(..) {
            if tokio::time::timeout(self.shutdown_grace, &mut task)
                .await
                .is_err()
            {
                warn!(role = %role, "listener did not stop within grace period, aborting");
                task.abort();
                let _ = task.await;
            }
        }

        // All listeners (and their state sinks) are gone; the writer drains
        // and exits on its own.
        if let Some(mut task) = self.state_task.lock().await.take() {
            if tokio::time::timeout(self.shutdown_grace, &mut task)
                .await
                .is_err()
            {
                warn!("state writer did not stop within grace period, aborting");
                task.abort();
                let _ = task.await;
            }
        }

        info!("telemetry ingestion stopped");
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("running", &self.is_running())
            .field("roles", &self.roles.len())
            .finish()
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            warn!("Supervisor dropped while still running");
            self.running.store(false, Ordering::SeqCst);
            self.shutdown_notify.notify_waiters();
        }
    }
}
