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

//! Payload decoding, selected by role
//!
//! The wire carries no schema information at all: which JSON schema a
//! payload follows is decided entirely by which unit's port the connection
//! arrived on. A decoder is therefore constructed once per listener with
//! that listener's role and applied to every frame of every session it
//! serves.

use crate::error::{Result, TelemetryError};
use crate::packet::TelemetryRecord;
use crate::types::Role;

/// Decodes frame payloads into role-tagged telemetry records.
#[derive(Debug, Clone, Copy)]
pub struct PacketDecoder {
    role: Role,
}

impl PacketDecoder {
    /// Create a decoder for the given role's schema.
    pub fn new(role: Role) -> PacketDecoder {
        PacketDecoder { role }
    }

    /// The role whose schema this decoder applies.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Decode one frame payload as UTF-8 JSON for this decoder's schema.
    ///
    /// A malformed payload yields [`TelemetryError::Decode`]. That error is
    /// per-frame: the caller discards the frame and keeps reading the same
    /// connection.
    pub fn decode(&self, payload: &[u8]) -> Result<TelemetryRecord> {
        let record = match self.role {
            Role::Primary => TelemetryRecord::Primary(
                serde_json::from_slice(payload)
                    .map_err(|source| TelemetryError::Decode {
                        role: self.role,
                        source,
                    })?,
            ),
            Role::Secondary => TelemetryRecord::Secondary(
                serde_json::from_slice(payload)
                    .map_err(|source| TelemetryError::Decode {
                        role: self.role,
                        source,
                    })?,
            ),
        };
        Ok(record)
    }
}
