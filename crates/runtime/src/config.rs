//! Session configuration.

use serde::{Deserialize, Serialize};

/// Which side of the table this process sits on.
///
/// The host resolves actions and rolls dice. Peers only apply what the host
/// broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionRole {
    #[default]
    Host,
    Peer,
}

/// Runtime configuration shared across the session and its worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub role: SessionRole,
    /// Seed for the host's dice. Two hosts with the same seed and the same
    /// inputs roll the same numbers.
    pub seed: u64,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl SessionConfig {
    pub fn host(seed: u64) -> Self {
        Self {
            role: SessionRole::Host,
            seed,
            ..Self::default()
        }
    }

    pub fn peer() -> Self {
        Self {
            role: SessionRole::Peer,
            ..Self::default()
        }
    }

    pub fn is_host(&self) -> bool {
        self.role == SessionRole::Host
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            role: SessionRole::Host,
            seed: 0,
            event_buffer_size: 100,
            command_buffer_size: 32,
        }
    }
}
