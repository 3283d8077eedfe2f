//! Deployment configuration of a bridge connection.
//!
//! ```toml
//! board_type = "V2718"
//! link = 0
//! board = 0
//! address_modifier = "a24_non_privileged_data"
//! lock_timeout_ms = 5000
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    guard::AccessGuard,
    types::{AddressModifier, BoardType},
};

/// Where the bridge is and how cycles are issued on it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    pub board_type: BoardType,
    /// Optical/USB link number.
    pub link: u32,
    /// Board number on the link.
    pub board: u32,
    /// Address modifier used for every single cycle.
    pub address_modifier: AddressModifier,
    /// How long an operation may wait for the bus before failing.
    pub lock_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            board_type: BoardType::V2718,
            link: 0,
            board: 0,
            address_modifier: AddressModifier::default(),
            lock_timeout_ms: AccessGuard::<()>::DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl BridgeConfig {
    /// Configuration for `board_type` at `link`/`board`, defaults otherwise.
    pub fn new(board_type: BoardType, link: u32, board: u32) -> Self {
        Self {
            board_type,
            link,
            board,
            ..Default::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
