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

//! Core types for the telemetry ingestion service

use crate::error::TelemetryError;
use std::fmt;
use std::str::FromStr;

/// Which onboard data-acquisition unit a connection, schema, or log stream
/// belongs to.
///
/// Exactly two units exist. Every role-dependent decision in the service is
/// an exhaustive match on this enum; there is no catch-all arm anywhere, so
/// a new unit cannot be wired in half-way by accident. An unrecognized role
/// name presented at configuration time is rejected up front rather than
/// silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The primary power/drivetrain unit (battery voltage, motor rpm, RTK
    /// correction).
    Primary,
    /// The secondary attitude unit (orientation and acceleration).
    Secondary,
}

impl Role {
    /// Both active roles, in a stable order.
    pub const ALL: [Role; 2] = [Role::Primary, Role::Secondary];

    /// Canonical lowercase name, as accepted by [`Role::from_str`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Primary => "primary",
            Role::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Role::Primary),
            "secondary" => Ok(Role::Secondary),
            other => Err(TelemetryError::Config(format!(
                "unknown telemetry role {:?} (expected \"primary\" or \"secondary\")",
                other
            ))),
        }
    }
}

/// Listener lifecycle state (stored as atomic u8 for lock-free observation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ListenerState {
    /// The listen socket is being opened
    Binding = 0,
    /// Bound and about to enter the accept loop
    Listening = 1,
    /// Blocked waiting for a unit to connect
    Accepting = 2,
    /// A session is active and frames are being ingested
    Serving = 3,
    /// Terminal; ingestion for this role is over for the process lifetime
    Stopped = 4,
}

impl ListenerState {
    /// Convert from u8 (for atomic operations)
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Binding,
            1 => Self::Listening,
            2 => Self::Accepting,
            3 => Self::Serving,
            _ => Self::Stopped,
        }
    }

    /// Convert to u8 (for atomic operations)
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check if the listener has permanently stopped
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binding => write!(f, "binding"),
            Self::Listening => write!(f, "listening"),
            Self::Accepting => write!(f, "accepting"),
            Self::Serving => write!(f, "serving"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}
