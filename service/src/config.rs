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

//! Ingestion configuration types and builders
//!
//! The core consumes per-role `(address, role)` tuples supplied by the
//! caller at construction. There is no command-line surface, environment
//! variable, or persisted configuration here — those belong to the
//! surrounding application.
//!
//! # Example
//!
//! ```
//! use daqlink_service::{IngestConfig, Role};
//!
//! let config = IngestConfig::new()
//!     .with_listener(Role::Primary, "0.0.0.0:8080".parse().unwrap())
//!     .with_listener(Role::Secondary, "0.0.0.0:8081".parse().unwrap());
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{Result, TelemetryError};
use crate::types::Role;
use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for one role's listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Which unit this listener serves
    pub role: Role,
    /// Address and port to listen on
    pub bind_address: SocketAddr,
}

impl ListenerConfig {
    /// Create a listener configuration.
    pub fn new(role: Role, bind_address: SocketAddr) -> ListenerConfig {
        ListenerConfig { role, bind_address }
    }
}

/// Configuration for the whole ingestion service.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// One listener per role
    pub listeners: Vec<ListenerConfig>,

    /// Buffer size of the dashboard-update channel
    pub state_buffer: usize,

    /// Bound on each role's pending-record log queue
    pub log_buffer: usize,

    /// How long shutdown waits for listener tasks before abandoning them
    pub shutdown_grace: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            state_buffer: 64,
            log_buffer: 1024,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl IngestConfig {
    /// Create an empty configuration.
    pub fn new() -> IngestConfig {
        IngestConfig::default()
    }

    /// Add a listener for `role` on `bind_address`.
    pub fn with_listener(mut self, role: Role, bind_address: SocketAddr) -> Self {
        self.listeners.push(ListenerConfig::new(role, bind_address));
        self
    }

    /// Set the dashboard-update channel buffer size.
    pub fn with_state_buffer(mut self, size: usize) -> Self {
        self.state_buffer = size;
        self
    }

    /// Set the per-role log queue bound.
    pub fn with_log_buffer(mut self, size: usize) -> Self {
        self.log_buffer = size;
        self
    }

    /// Set the shutdown grace period.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// The configured listener for `role`, if any.
    pub fn listener(&self, role: Role) -> Option<&ListenerConfig> {
        self.listeners.iter().find(|listener| listener.role == role)
    }

    /// Reject configurations the service cannot honor.
    ///
    /// At most one listener may exist per role (one listen socket, one
    /// session, one log stream per unit), and at least one listener must
    /// be configured.
    pub fn validate(&self) -> Result<()> {
        if self.listeners.is_empty() {
            return Err(TelemetryError::Config(
                "no listeners configured".to_string(),
            ));
        }
        for role in Role::ALL {
            let count = self
                .listeners
                .iter()
                .filter(|listener| listener.role == role)
                .count();
            if count > 1 {
                return Err(TelemetryError::Config(format!(
                    "role {} configured {} times, expected at most once",
                    role, count
                )));
            }
        }
        if self.state_buffer == 0 || self.log_buffer == 0 {
            return Err(TelemetryError::Config(
                "channel buffers must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    #[test]
    fn two_role_config_is_valid() {
        let config = IngestConfig::new()
            .with_listener(Role::Primary, addr(8080))
            .with_listener(Role::Secondary, addr(8081));
        assert!(config.validate().is_ok());
        assert_eq!(config.listener(Role::Primary).unwrap().bind_address, addr(8080));
    }

    #[test]
    fn single_role_config_is_valid() {
        let config = IngestConfig::new().with_listener(Role::Secondary, addr(9000));
        assert!(config.validate().is_ok());
        assert!(config.listener(Role::Primary).is_none());
    }

    #[test]
    fn empty_config_is_rejected() {
        assert!(IngestConfig::new().validate().is_err());
    }

    #[test]
    fn duplicate_role_is_rejected() {
        let config = IngestConfig::new()
            .with_listener(Role::Primary, addr(8080))
            .with_listener(Role::Primary, addr(8082));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("primary"));
    }

    #[test]
    fn zero_buffers_are_rejected() {
        let config = IngestConfig::new()
            .with_listener(Role::Primary, addr(8080))
            .with_log_buffer(0);
        assert!(config.validate().is_err());
    }
}
