//! V6533 six channel high voltage power supply.
//!
//! Board level registers sit at fixed offsets from the module base, the
//! channel registers repeat every [`CHANNEL_STRIDE`] bytes.

use core::fmt;
use std::{thread, time::Duration};

use strum_macros::{EnumIter, FromRepr};
use tracing::debug;

use crate::{
    controller::BusController,
    error::{Error, Result},
    module::Module,
    provider::BusCycleProvider,
    scaling::Scale,
    types::{RegisterValue, decode_raw},
};

/// Distance between the register blocks of two channels.
pub const CHANNEL_STRIDE: u32 = 0x80;

/// Time the current monitor ADC needs before a reading is valid.
pub const IMON_SETTLE_TIME: Duration = Duration::from_millis(100);

/// Board level registers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, FromRepr)]
#[repr(u32)]
pub enum BoardRegister {
    /// __R__ - Maximum output voltage, V.
    MaxVoltage = 0x50,
    /// __R__ - Maximum output current.
    MaxCurrent = 0x54,
    /// __R__ - Board alarm, see [`BoardStatus`].
    Status = 0x58,
    /// __R__ - Firmware release, major in the high byte.
    FirmwareRelease = 0x5C,
    /// __R__ - Number of channels.
    NumChannels = 0x8100,
    /// __R__ - First word of the board description.
    DescriptionStart = 0x8102,
    /// __R__ - Last word of the board description.
    DescriptionEnd = 0x8114,
    /// __R__ - First word of the model name.
    ModelStart = 0x8116,
    /// __R__ - Last word of the model name.
    ModelEnd = 0x811C,
    /// __R__ - Serial number.
    SerialNumber = 0x811E,
    /// __R__ - FPGA firmware release, major in the high byte.
    FpgaFirmwareRelease = 0x8120,
}

impl From<BoardRegister> for u32 {
    fn from(value: BoardRegister) -> Self {
        value as u32
    }
}

/// Per channel registers, as offsets for channel 0.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, FromRepr)]
#[repr(u32)]
pub enum ChannelRegister {
    /// __R/W__ - Voltage set point, 0.1 V.
    VSet = 0x80,
    /// __R/W__ - Current limit, 0.05 mA.
    ISet = 0x84,
    /// __R__ - Monitored voltage, 0.1 V.
    VMon = 0x88,
    /// __R__ - Monitored current in the high range, 0.05 mA.
    IMonHigh = 0x8C,
    /// __R/W__ - Channel enable.
    Enable = 0x90,
    /// __R__ - Channel status, see [`ChannelStatus`].
    Status = 0x94,
    /// __R/W__ - Trip time, 0.1 s.
    TripTime = 0x98,
    /// __R/W__ - Software voltage limit, 0.1 V.
    SvMax = 0x9C,
    /// __R/W__ - Ramp down rate, V/s.
    RampDown = 0xA0,
    /// __R/W__ - Ramp up rate, V/s.
    RampUp = 0xA4,
    /// __R/W__ - Power down mode, see [`PowerDownMode`].
    PowerDown = 0xA8,
    /// __R__ - Output polarity, non-zero is positive.
    Polarity = 0xAC,
    /// __R__ - Temperature, degrees Celsius.
    Temperature = 0xB0,
    /// __R/W__ - Current monitor range, 1 is the low range.
    IMonRange = 0xB4,
    /// __R__ - Monitored current in the low range, 0.005 mA.
    IMonLow = 0xB8,
}

impl ChannelRegister {
    /// Offset of this register for `channel`.
    pub const fn address(self, channel: u8) -> u32 {
        CHANNEL_STRIDE * channel as u32 + self as u32
    }
}

/// Board alarm reported by [`BoardRegister::Status`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, FromRepr)]
#[repr(u32)]
pub enum BoardStatus {
    Channel0Alarm = 0,
    Channel1Alarm = 1,
    Channel2Alarm = 2,
    Channel3Alarm = 3,
    Channel4Alarm = 4,
    Channel5Alarm = 5,
    PowerFail = 8,
    OverPower = 9,
    MaxVoltageUncalibrated = 10,
    MaxCurrentUncalibrated = 11,
}

decode_raw!(BoardStatus, "board status");

/// State of a channel reported by [`ChannelRegister::Status`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, FromRepr)]
#[repr(u32)]
pub enum ChannelStatus {
    On = 0,
    RampUp = 1,
    RampDown = 2,
    OverCurrent = 3,
    OverVoltage = 4,
    UnderVoltage = 5,
    MaxV = 6,
    MaxI = 7,
    Trip = 8,
    OverPower = 9,
    OverTemperature = 10,
    Disabled = 11,
    Interlock = 12,
    Uncalibrated = 13,
    Reserved = 14,
}

decode_raw!(ChannelStatus, "channel status");

/// What a channel does when switched off or tripped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, EnumIter, FromRepr)]
#[repr(u32)]
pub enum PowerDownMode {
    #[default]
    Immediate = 0,
    Ramp = 1,
}

/// A firmware release as `major.minor`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FirmwareRelease {
    pub major: u8,
    pub minor: u8,
}

impl From<RegisterValue> for FirmwareRelease {
    fn from(raw: RegisterValue) -> Self {
        Self {
            major: (raw >> 8) as u8,
            minor: (raw & 0xFF) as u8,
        }
    }
}

impl fmt::Display for FirmwareRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

pub struct V6533<'c, P: BusCycleProvider> {
    module: Module<'c, P>,
}

impl<'c, P: BusCycleProvider> V6533<'c, P> {
    pub const NUM_CHANNELS: u8 = 6;

    pub fn new(controller: &'c BusController<P>, base_address: u32) -> Self {
        Self {
            module: Module::new(controller, base_address),
        }
    }

    pub fn module(&self) -> &Module<'c, P> {
        &self.module
    }

    /// Channel `index`, 0 to 5.
    pub fn channel(&self, index: u8) -> Result<HvChannel<'_, 'c, P>> {
        Error::check_range("channel", index, 0, Self::NUM_CHANNELS - 1)?;
        Ok(HvChannel {
            module: &self.module,
            index,
        })
    }

    pub fn channels(&self) -> impl Iterator<Item = HvChannel<'_, 'c, P>> {
        (0..Self::NUM_CHANNELS).map(move |index| HvChannel {
            module: &self.module,
            index,
        })
    }

    /// Maximum output voltage in volts.
    pub fn max_voltage(&self) -> Result<RegisterValue> {
        self.module.read(BoardRegister::MaxVoltage.into())
    }

    /// Maximum output current, raw.
    pub fn max_current(&self) -> Result<RegisterValue> {
        self.module.read(BoardRegister::MaxCurrent.into())
    }

    pub fn status(&self) -> Result<BoardStatus> {
        let raw = self.module.read(BoardRegister::Status.into())?;
        BoardStatus::try_from(raw as u32)
    }

    pub fn firmware_release(&self) -> Result<FirmwareRelease> {
        self.module
            .read(BoardRegister::FirmwareRelease.into())
            .map(FirmwareRelease::from)
    }

    /// Number of channels as reported by the board.
    pub fn num_channels(&self) -> Result<RegisterValue> {
        self.module.read(BoardRegister::NumChannels.into())
    }

    pub fn description(&self) -> Result<String> {
        self.module.read_string(
            BoardRegister::DescriptionStart.into(),
            BoardRegister::DescriptionEnd.into(),
        )
    }

    pub fn model(&self) -> Result<String> {
        self.module.read_string(
            BoardRegister::ModelStart.into(),
            BoardRegister::ModelEnd.into(),
        )
    }

    pub fn serial_number(&self) -> Result<RegisterValue> {
        self.module.read(BoardRegister::SerialNumber.into())
    }

    pub fn fpga_firmware_release(&self) -> Result<FirmwareRelease> {
        self.module
            .read(BoardRegister::FpgaFirmwareRelease.into())
            .map(FirmwareRelease::from)
    }
}

/// One output of a [`V6533`].
///
/// Voltages are in volts, currents in milliamps and times in seconds.
/// Scaled setters fail before any bus cycle if the value does not fit the register.
pub struct HvChannel<'m, 'c, P: BusCycleProvider> {
    module: &'m Module<'c, P>,
    index: u8,
}

impl<P: BusCycleProvider> HvChannel<'_, '_, P> {
    pub fn index(&self) -> u8 {
        self.index
    }

    fn read(&self, register: ChannelRegister) -> Result<RegisterValue> {
        self.module.read(register.address(self.index))
    }

    fn write(&self, register: ChannelRegister, value: RegisterValue) -> Result<()> {
        self.module.write(register.address(self.index), value)
    }

    fn read_scaled(&self, register: ChannelRegister, scale: Scale) -> Result<f64> {
        self.read(register).map(|raw| scale.to_physical(raw))
    }

    fn write_scaled(&self, register: ChannelRegister, scale: Scale, value: f64) -> Result<()> {
        let raw = scale.to_raw(value)?;
        debug!(channel = self.index, ?register, value, raw, "Writing channel setting");
        self.write(register, raw)
    }

    /// Voltage set point.
    pub fn voltage(&self) -> Result<f64> {
        self.read_scaled(ChannelRegister::VSet, Scale::VOLTAGE)
    }

    pub fn set_voltage(&self, volts: f64) -> Result<()> {
        self.write_scaled(ChannelRegister::VSet, Scale::VOLTAGE, volts)
    }

    pub fn measured_voltage(&self) -> Result<f64> {
        self.read_scaled(ChannelRegister::VMon, Scale::VOLTAGE)
    }

    pub fn current_limit(&self) -> Result<f64> {
        self.read_scaled(ChannelRegister::ISet, Scale::CURRENT)
    }

    pub fn set_current_limit(&self, milliamps: f64) -> Result<()> {
        self.write_scaled(ChannelRegister::ISet, Scale::CURRENT, milliamps)
    }

    /// Whether the current monitor uses its low range.
    pub fn imon_range(&self) -> Result<bool> {
        Ok(self.read(ChannelRegister::IMonRange)? == 1)
    }

    pub fn set_imon_range(&self, low_range: bool) -> Result<()> {
        self.write(ChannelRegister::IMonRange, RegisterValue::from(low_range))
    }

    /// Monitored current in the active range.
    ///
    /// Blocks for [`IMON_SETTLE_TIME`] first, without holding the bus.
    pub fn measured_current(&self) -> Result<f64> {
        thread::sleep(IMON_SETTLE_TIME);
        let index = self.index;
        self.module.transaction(|bus| {
            if bus.read(ChannelRegister::IMonRange.address(index))? == 1 {
                let raw = bus.read(ChannelRegister::IMonLow.address(index))?;
                Ok(Scale::CURRENT_LOW_RANGE.to_physical(raw))
            } else {
                let raw = bus.read(ChannelRegister::IMonHigh.address(index))?;
                Ok(Scale::CURRENT.to_physical(raw))
            }
        })
    }

    pub fn enabled(&self) -> Result<bool> {
        Ok(self.read(ChannelRegister::Enable)? == 1)
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        debug!(channel = self.index, enabled, "Switching HV channel");
        self.write(ChannelRegister::Enable, RegisterValue::from(enabled))
    }

    pub fn power_on(&self) -> Result<()> {
        self.set_enabled(true)
    }

    pub fn power_off(&self) -> Result<()> {
        self.set_enabled(false)
    }

    pub fn status(&self) -> Result<ChannelStatus> {
        let raw = self.read(ChannelRegister::Status)?;
        ChannelStatus::try_from(raw as u32)
    }

    pub fn trip_time(&self) -> Result<f64> {
        self.read_scaled(ChannelRegister::TripTime, Scale::TIME)
    }

    pub fn set_trip_time(&self, seconds: f64) -> Result<()> {
        self.write_scaled(ChannelRegister::TripTime, Scale::TIME, seconds)
    }

    pub fn voltage_limit(&self) -> Result<f64> {
        self.read_scaled(ChannelRegister::SvMax, Scale::VOLTAGE)
    }

    pub fn set_voltage_limit(&self, volts: f64) -> Result<()> {
        self.write_scaled(ChannelRegister::SvMax, Scale::VOLTAGE, volts)
    }

    /// Ramp down rate in V/s.
    pub fn ramp_down_rate(&self) -> Result<u16> {
        Ok(self.read(ChannelRegister::RampDown)? as u16)
    }

    pub fn set_ramp_down_rate(&self, volts_per_second: u16) -> Result<()> {
        self.write(ChannelRegister::RampDown, volts_per_second.into())
    }

    /// Ramp up rate in V/s.
    pub fn ramp_up_rate(&self) -> Result<u16> {
        Ok(self.read(ChannelRegister::RampUp)? as u16)
    }

    pub fn set_ramp_up_rate(&self, volts_per_second: u16) -> Result<()> {
        self.write(ChannelRegister::RampUp, volts_per_second.into())
    }

    pub fn power_down_mode(&self) -> Result<PowerDownMode> {
        Ok(match self.read(ChannelRegister::PowerDown)? {
            1 => PowerDownMode::Ramp,
            _ => PowerDownMode::Immediate,
        })
    }

    pub fn set_power_down_mode(&self, mode: PowerDownMode) -> Result<()> {
        self.write(ChannelRegister::PowerDown, mode as RegisterValue)
    }

    /// `1` for a positive output, `-1` for a negative one.
    pub fn polarity(&self) -> Result<i8> {
        Ok(if self.read(ChannelRegister::Polarity)? != 0 {
            1
        } else {
            -1
        })
    }

    /// Temperature in degrees Celsius.
    pub fn temperature(&self) -> Result<u16> {
        Ok(self.read(ChannelRegister::Temperature)? as u16)
    }
}
