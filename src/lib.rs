//! This crate provides register level access to CAEN VME bridges and some of the modules behind them.
//!
//! Bus cycles themselves are issued by a driver implementing [`BusCycleProvider`]. On top of it:
//! * [`BusController`] owns the bus handle and serializes every transaction on it.
//! * [`V2718`] adds the bridge's pulsers, scaler, I/O lines and front panel display.
//! * [`Module`] offsets every access by a module's base address.
//! * [`V895`] and [`V6533`] map discriminator and HV supply settings onto their registers.
//!
//! Supported bridges:
//! * V1718
//! * V2718
//! * A2818
//! * A2719
//! * A3818
//!
//! Every cycle uses the address modifier from the [`BridgeConfig`], A24 non-privileged data by default,
//! and 16 bit data unless a `_with` variant is asked for another [`DataWidth`].
//!
//! Operations wait at most five seconds (configurable) for the bus before failing with
//! [`Error::LockTimeout`]. Nothing is retried.

pub mod board;
pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod guard;
pub mod module;
pub mod provider;
pub mod registers;
pub mod scaling;
pub mod types;
pub mod v6533;
pub mod v895;

#[cfg(test)]
mod mock_bus;

pub use board::V2718;
pub use config::BridgeConfig;
pub use controller::{Bus, BusController};
pub use error::{Error, Result};
pub use module::Module;
pub use provider::{BusCycleProvider, BusHandle};
pub use types::{AddressModifier, BoardType, DataWidth, RegisterValue};
pub use v6533::{HvChannel, V6533};
pub use v895::V895;
