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

//! Error types for the telemetry ingestion service

use crate::types::Role;
use daqlink_framecodec::CodecError;
use std::net::SocketAddr;
use thiserror::Error;

/// Result type for service operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Telemetry service error types
///
/// Propagation policy: everything produced while serving a session is
/// handled at session scope inside the listener task and never escapes it.
/// Only [`TelemetryError::Bind`] is fatal, and only for the one role whose
/// listener failed to come up.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// I/O error from the underlying TCP stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The listen socket for a role could not be opened (fatal for that
    /// role, no retry)
    #[error("failed to bind {role} listener on {addr}: {source}")]
    Bind {
        /// Role whose listener failed to bind
        role: Role,
        /// Address the bind was attempted on
        addr: SocketAddr,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// Framing error from the codec layer (truncated or oversized frame);
    /// ends the current session only
    #[error("framing error: {0}")]
    Codec(#[from] CodecError),

    /// A payload was not valid JSON for the role's schema; the frame is
    /// discarded and the session continues
    #[error("malformed {role} payload: {source}")]
    Decode {
        /// Role whose schema was selected
        role: Role,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be appended to the role's log; never propagated
    /// to the ingestion path
    #[error("record log append failed: {0}")]
    Persist(#[source] std::io::Error),

    /// Invalid configuration detected at construction time
    #[error("configuration error: {0}")]
    Config(String),
}

impl TelemetryError {
    /// Check if the error ends at session scope
    ///
    /// Session-scoped errors end or degrade the current connection but
    /// leave the listener accepting new sessions.
    pub fn is_session_error(&self) -> bool {
        matches!(
            self,
            TelemetryError::Io(_)
                | TelemetryError::Codec(_)
                | TelemetryError::Decode { .. }
                | TelemetryError::Persist(_)
        )
    }

    /// Check if the error is fatal for a role's ingestion
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TelemetryError::Bind { .. } | TelemetryError::Config(_)
        )
    }
}
