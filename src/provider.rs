//! The contract with the native driver that performs the physical bus cycles.
//!
//! Every call returns a raw result code which the caller passes through
//! [`check`](crate::error::check) before looking at any other output.
//! Implementations do not need to be thread safe: the controller never
//! issues two calls at once.

use crate::{
    display::DISPLAY_LEN,
    types::{AddressModifier, BoardType, DataWidth, RegisterValue},
};

/// Opaque handle to an open bridge connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusHandle(pub i32);

/// Pulser settings as the driver sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawPulserConf {
    pub period: u8,
    pub width: u8,
    pub unit: u32,
    pub num_pulses: u8,
    pub start: u32,
    pub reset: u32,
}

/// Scaler settings as the driver sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawScalerConf {
    pub limit: u16,
    pub auto_reset: u16,
    pub source: u32,
    pub gate: u32,
    pub reset: u32,
}

/// Input or output line settings as the driver sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawIoConf {
    pub polarity: u32,
    pub led_polarity: u32,
    pub source: u32,
}

/// Implemented by the native bridge driver.
pub trait BusCycleProvider {
    /// Open a connection to `board` on optical/USB `link`.
    fn open(&mut self, board_type: BoardType, link: u32, board: u32) -> (BusHandle, i32);

    /// Release the connection. Called exactly once per successful [`Self::open`].
    fn close(&mut self, handle: BusHandle);

    /// One single read cycle.
    fn read_cycle(
        &mut self,
        handle: BusHandle,
        address: u32,
        am: AddressModifier,
        width: DataWidth,
    ) -> (RegisterValue, i32);

    /// One single write cycle.
    fn write_cycle(
        &mut self,
        handle: BusHandle,
        address: u32,
        value: RegisterValue,
        am: AddressModifier,
        width: DataWidth,
    ) -> i32;

    /// Firmware release of the bridge itself.
    fn read_board_firmware(&mut self, handle: BusHandle) -> u8;

    fn set_pulser_conf(&mut self, handle: BusHandle, pulser: u8, conf: RawPulserConf) -> i32;
    fn get_pulser_conf(&mut self, handle: BusHandle, pulser: u8) -> (RawPulserConf, i32);

    fn set_scaler_conf(&mut self, handle: BusHandle, conf: RawScalerConf) -> i32;
    fn get_scaler_conf(&mut self, handle: BusHandle) -> (RawScalerConf, i32);

    fn set_output_conf(&mut self, handle: BusHandle, channel: u8, conf: RawIoConf) -> i32;
    fn get_output_conf(&mut self, handle: BusHandle, channel: u8) -> (RawIoConf, i32);

    /// The source field of `conf` is ignored, inputs have no selectable source.
    fn set_input_conf(&mut self, handle: BusHandle, channel: u8, conf: RawIoConf) -> i32;
    fn get_input_conf(&mut self, handle: BusHandle, channel: u8) -> (RawIoConf, i32);

    /// Read one of the bridge's internal registers.
    fn read_register(&mut self, handle: BusHandle, register: u16) -> (u32, i32);

    fn set_output_register(&mut self, handle: BusHandle, mask: u16) -> i32;
    fn clear_output_register(&mut self, handle: BusHandle, mask: u16) -> i32;
    /// Set then clear the lines in `mask`.
    fn pulse_output_register(&mut self, handle: BusHandle, mask: u16) -> i32;

    /// Fill the display buffer in the driver's native record layout, see [`crate::display`].
    fn read_display(&mut self, handle: BusHandle) -> ([u8; DISPLAY_LEN], i32);

    fn system_reset(&mut self, handle: BusHandle) -> i32;
    fn reset_scaler_count(&mut self, handle: BusHandle) -> i32;
    fn enable_scaler_gate(&mut self, handle: BusHandle) -> i32;
    fn disable_scaler_gate(&mut self, handle: BusHandle) -> i32;
    fn start_pulser(&mut self, handle: BusHandle, pulser: u8) -> i32;
    fn stop_pulser(&mut self, handle: BusHandle, pulser: u8) -> i32;
}
