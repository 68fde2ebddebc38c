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

//! Telemetry record schemas, one per onboard unit
//!
//! Every field is optional: the units send whatever sensors produced a
//! reading since the last frame, and an absent field means "no update",
//! never zero. Unknown fields in a payload are ignored so a unit firmware
//! ahead of this service does not break ingestion.

use crate::types::Role;
use serde::{Deserialize, Serialize};

/// High-precision GPS correction pair carried inside a primary record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RtkCorrection {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

/// Record schema for the primary power/drivetrain unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PrimaryPacket {
    /// Pack voltage in volts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    /// Motor speed in revolutions per minute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<f64>,
    /// RTK GPS correction, when the base station had a fix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtk: Option<RtkCorrection>,
}

/// Linear acceleration vector in m/s².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Record schema for the secondary attitude unit.
///
/// The secondary unit is an inertial sensor; its records carry vehicle
/// attitude and acceleration. None of these fields project onto the
/// dashboard — they are ingested for the record log only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SecondaryPacket {
    /// Roll angle in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll: Option<f64>,
    /// Pitch angle in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    /// Yaw angle in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
    /// Linear acceleration, when the sensor produced one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceleration: Option<Acceleration>,
}

/// A decoded, role-tagged telemetry record.
///
/// Records are transient: created by the decoder, consumed by the state
/// projector and the record logger, never shared mutably.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetryRecord {
    /// A record from the primary unit
    Primary(PrimaryPacket),
    /// A record from the secondary unit
    Secondary(SecondaryPacket),
}

impl TelemetryRecord {
    /// The role of the unit that produced this record.
    pub fn role(&self) -> Role {
        match self {
            TelemetryRecord::Primary(_) => Role::Primary,
            TelemetryRecord::Secondary(_) => Role::Secondary,
        }
    }

    /// Serialize the inner packet as compact JSON.
    ///
    /// The role tag is not written: each log stream is already per-role, so
    /// the line carries exactly the fields the unit sent.
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            TelemetryRecord::Primary(packet) => serde_json::to_string(packet),
            TelemetryRecord::Secondary(packet) => serde_json::to_string(packet),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_packet_json_omits_absent_fields() {
        let packet = PrimaryPacket {
            voltage: Some(50.7),
            ..Default::default()
        };
        let json = TelemetryRecord::Primary(packet).to_json().unwrap();
        assert_eq!(json, r#"{"voltage":50.7}"#);
    }

    #[test]
    fn secondary_packet_json_round_trip() {
        let packet = SecondaryPacket {
            roll: Some(1.5),
            pitch: None,
            yaw: Some(182.0),
            acceleration: Some(Acceleration {
                x: 0.1,
                y: -0.2,
                z: 9.8,
            }),
        };
        let json = serde_json::to_string(&packet).unwrap();
        let back: SecondaryPacket = serde_json::from_str(&json).unwrap();
        assert_eq!(back, packet);
    }

    #[test]
    fn record_role_tagging() {
        assert_eq!(
            TelemetryRecord::Primary(PrimaryPacket::default()).role(),
            Role::Primary
        );
        assert_eq!(
            TelemetryRecord::Secondary(SecondaryPacket::default()).role(),
            Role::Secondary
        );
    }
}
