//! This module is used to define the internal registers of the bridge.
//!
//! Bit layouts are LSB first: the first field of each bit field struct is bit 0.

use modular_bitfield::prelude::*;
use strum_macros::{EnumIter, FromRepr};

/// Internal bridge registers, as accepted by `read_register`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, FromRepr)]
#[repr(u16)]
pub enum BridgeRegister {
    /// __R__ - Status, see [`StatusRegister`].
    Status = 0x00,
    /// __R/W__ - VME control.
    VmeControl = 0x01,
    /// __R__ - Firmware release.
    FirmwareRelease = 0x02,
    /// __R/W__ - Firmware download.
    FirmwareDownload = 0x03,
    /// __R/W__ - Flash enable.
    FlashEnable = 0x04,
    /// __R/W__ - VME IRQ lines enable.
    IrqLinesEnable = 0x06,
    /// __R__ - Input lines, see [`InputRegister`].
    Input = 0x08,
    /// __R/W__ - Output lines, see [`OutputLines`].
    Output = 0x0A,
    /// __R/W__ - Input multiplexer.
    InputMux = 0x0B,
    /// __R/W__ - Output multiplexer.
    OutputMux = 0x0C,
    /// __R/W__ - LED polarity.
    LedPolarity = 0x0D,
    /// __W__ - Output clear.
    OutputClear = 0x10,
    /// __W__ - Input multiplexer clear.
    InputMuxClear = 0x11,
    /// __W__ - Output multiplexer clear.
    OutputMuxClear = 0x12,
    /// __W__ - LED polarity clear.
    LedPolarityClear = 0x13,
    /// __R/W__ - Period and width of pulser A.
    PulserA0 = 0x16,
    /// __R/W__ - Pulse count and time unit of pulser A.
    PulserA1 = 0x17,
    /// __R/W__ - Period and width of pulser B.
    PulserB0 = 0x19,
    /// __R/W__ - Pulse count and time unit of pulser B.
    PulserB1 = 0x1A,
    /// __R/W__ - Scaler limit and auto reset.
    Scaler0 = 0x1C,
    /// __R__ - Scaler counter value.
    Scaler1 = 0x1D,
    /// __R__ - Display AD[15:0].
    DisplayAdLow = 0x20,
    /// __R__ - Display AD[31:16].
    DisplayAdHigh = 0x21,
    /// __R__ - Display DT[15:0].
    DisplayDtLow = 0x22,
    /// __R__ - Display DT[31:16].
    DisplayDtHigh = 0x23,
    /// __R__ - Display control, left bar.
    DisplayControl1 = 0x24,
    /// __R__ - Display control, right bar.
    DisplayControl2 = 0x25,
    /// __R/W__ - Location monitor AD[15:0].
    LocMonAdLow = 0x28,
    /// __R/W__ - Location monitor AD[31:16].
    LocMonAdHigh = 0x29,
    /// __R/W__ - Location monitor controls.
    LocMonControls = 0x2C,
}

impl From<BridgeRegister> for u16 {
    fn from(value: BridgeRegister) -> Self {
        value as u16
    }
}

/// Decoded [`BridgeRegister::Status`].
#[bitfield(bits = 16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRegister {
    /// Bit 0: VME is held in system reset.
    pub system_reset: bool,
    /// Bit 1: the bridge is the VME system controller.
    pub system_controller: bool,
    #[skip]
    __: B2,
    /// Bit 4: last access was acknowledged with DTACK.
    pub dtack: bool,
    /// Bit 5: last access ended in a bus error.
    pub bus_error: bool,
    #[skip]
    __: B2,
    /// Bits 8..=12: DIP switch positions 0 to 4.
    pub dip_switches: B5,
    #[skip]
    __: B2,
    /// Bit 15: USB link runs at high speed.
    pub usb_high_speed: bool,
}

/// Decoded [`BridgeRegister::Input`].
#[bitfield(bits = 16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRegister {
    pub in0: bool,
    pub in1: bool,
    pub coincidence: bool,
    pub pulser_a_output: bool,
    pub pulser_b_output: bool,
    pub scaler_end_counter: bool,
    pub location_monitor: bool,
    #[skip]
    __: B9,
}

/// Mask of output register lines for `set`/`clear`/`pulse_output_register`.
///
/// ```
/// use caen_vme::registers::OutputLines;
///
/// let mask: u16 = OutputLines::new().with_output_0(true).with_scaler_gate(true).into();
/// assert_eq!(mask, 0x0050);
/// ```
#[bitfield(bits = 16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLines {
    pub pulser_a_start: bool,
    pub pulser_a_reset: bool,
    pub pulser_b_start: bool,
    pub pulser_b_reset: bool,
    pub scaler_gate: bool,
    pub scaler_reset: bool,
    pub output_0: bool,
    pub output_1: bool,
    pub output_2: bool,
    pub output_3: bool,
    pub output_4: bool,
    #[skip]
    __: B5,
}

impl From<OutputLines> for u16 {
    fn from(value: OutputLines) -> Self {
        u16::from_le_bytes(value.into_bytes())
    }
}

impl From<u16> for OutputLines {
    fn from(value: u16) -> Self {
        OutputLines::from_bytes(value.to_le_bytes())
    }
}

impl From<u16> for StatusRegister {
    fn from(value: u16) -> Self {
        StatusRegister::from_bytes(value.to_le_bytes())
    }
}

impl From<u16> for InputRegister {
    fn from(value: u16) -> Self {
        InputRegister::from_bytes(value.to_le_bytes())
    }
}
