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

//! Dashboard state projection and the single-writer state task
//!
//! Listeners never touch [`DashboardState`] directly. Each one posts
//! [`StateUpdate`] messages through a [`StateSink`]; one [`StateWriter`]
//! task consumes the merged stream, folds updates into the state it owns,
//! and publishes snapshots through a `tokio::sync::watch` channel for any
//! number of readers. Two listeners can therefore never interleave at the
//! field level — serialization happens in the channel, not in the readers.

use crate::packet::TelemetryRecord;
use crate::types::Role;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Drive wheel diameter in meters, measured on the vehicle.
pub const WHEEL_DIAMETER_M: f64 = 0.605;

/// Convert motor rpm to road speed in km/h.
///
/// One revolution covers one wheel circumference (`0.605 · π` meters);
/// scaled by 60 min/h over 1000 m/km.
pub fn speed_from_rpm(rpm: f64) -> f64 {
    rpm * WHEEL_DIAMETER_M * std::f64::consts::PI * 60.0 / 1000.0
}

/// Live values surfaced on the driver dashboard.
///
/// Created once, mutated only by the [`StateWriter`] task, observed by the
/// UI through the watch receiver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DashboardState {
    /// Last known pack voltage, in volts
    pub power: f64,
    /// Last known road speed, in km/h
    pub speed: f64,
    /// Whether the primary unit currently has an active session
    pub primary_connected: bool,
    /// Whether the secondary unit currently has an active session
    pub secondary_connected: bool,
}

impl DashboardState {
    /// Connection status for the given role.
    pub fn connected(&self, role: Role) -> bool {
        match role {
            Role::Primary => self.primary_connected,
            Role::Secondary => self.secondary_connected,
        }
    }
}

/// One dashboard field update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateUpdate {
    /// Set the power reading (volts)
    Power(f64),
    /// Set the road speed (km/h)
    Speed(f64),
    /// Set a role's connection status
    Connected(Role, bool),
}

/// Project a decoded record onto dashboard updates.
///
/// Pure: no state is touched here, the returned updates are applied by the
/// writer task. Absent fields produce no update at all — the previous value
/// stays on the dashboard. Secondary records have no dashboard projection.
pub fn project(record: &TelemetryRecord) -> Vec<StateUpdate> {
    match record {
        TelemetryRecord::Primary(packet) => {
            let mut updates = Vec::new();
            if let Some(voltage) = packet.voltage {
                updates.push(StateUpdate::Power(voltage));
            }
            if let Some(rpm) = packet.rpm {
                updates.push(StateUpdate::Speed(speed_from_rpm(rpm)));
            }
            updates
        }
        TelemetryRecord::Secondary(_) => Vec::new(),
    }
}

/// Cloneable producer handle posting updates to the state writer.
#[derive(Debug, Clone)]
pub struct StateSink {
    tx: mpsc::Sender<StateUpdate>,
}

impl StateSink {
    /// Post one update to the writer task.
    ///
    /// Completes once the update is queued; a closed writer (shutdown in
    /// progress) drops the update silently.
    pub async fn publish(&self, update: StateUpdate) {
        let _ = self.tx.send(update).await;
    }

    /// Post a batch of updates in order.
    pub async fn publish_all(&self, updates: Vec<StateUpdate>) {
        for update in updates {
            self.publish(update).await;
        }
    }
}

/// The single writer task owning [`DashboardState`].
#[derive(Debug)]
pub struct StateWriter {
    rx: mpsc::Receiver<StateUpdate>,
    watch_tx: watch::Sender<DashboardState>,
}

impl StateWriter {
    /// Create the update channel, the writer, and a watch receiver for
    /// readers.
    ///
    /// `buffer` bounds the update queue; producers suspend when it is full,
    /// which for dashboard-sized traffic never happens in practice.
    pub fn channel(
        buffer: usize,
    ) -> (StateSink, StateWriter, watch::Receiver<DashboardState>) {
        let (tx, rx) = mpsc::channel(buffer);
        let (watch_tx, watch_rx) = watch::channel(DashboardState::default());
        (StateSink { tx }, StateWriter { rx, watch_tx }, watch_rx)
    }

    /// Run the writer loop until every [`StateSink`] is dropped.
    pub async fn run(mut self) {
        let mut state = DashboardState::default();
        while let Some(update) = self.rx.recv().await {
            Self::apply(&mut state, update);
            self.watch_tx.send_replace(state);
        }
        debug!("state writer finished");
    }

    fn apply(state: &mut DashboardState, update: StateUpdate) {
        match update {
            StateUpdate::Power(volts) => state.power = volts,
            StateUpdate::Speed(kmh) => state.speed = kmh,
            StateUpdate::Connected(Role::Primary, connected) => {
                state.primary_connected = connected;
            }
            StateUpdate::Connected(Role::Secondary, connected) => {
                state.secondary_connected = connected;
            }
        }
    }
}
