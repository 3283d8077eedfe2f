//! V895 16 channel leading edge discriminator.

use strum_macros::{EnumIter, FromRepr};
use tracing::debug;

use crate::{
    controller::BusController,
    error::{Error, Result},
    module::Module,
    provider::BusCycleProvider,
    types::RegisterValue,
};

/// Fixed registers of the V895, relative to the module base.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, FromRepr)]
#[repr(u32)]
pub enum V895Register {
    /// __W__ - Output width of channels 0 to 7.
    OutputWidthLow = 0x40,
    /// __W__ - Output width of channels 8 to 15.
    OutputWidthHigh = 0x42,
    /// __W__ - Majority threshold.
    MajorityThreshold = 0x48,
    /// __W__ - Pattern of inhibit, one bit per channel.
    InhibitPattern = 0x4A,
    /// __R__ - Module type, two characters.
    Model = 0xFC,
    /// __R__ - Serial number.
    SerialNumber = 0xFE,
}

impl From<V895Register> for u32 {
    fn from(value: V895Register) -> Self {
        value as u32
    }
}

pub struct V895<'c, P: BusCycleProvider> {
    module: Module<'c, P>,
}

impl<'c, P: BusCycleProvider> V895<'c, P> {
    pub const NUM_CHANNELS: u8 = 16;

    pub fn new(controller: &'c BusController<P>, base_address: u32) -> Self {
        Self {
            module: Module::new(controller, base_address),
        }
    }

    pub fn module(&self) -> &Module<'c, P> {
        &self.module
    }

    /// Offset of the threshold register of `channel`.
    pub const fn threshold_offset(channel: u8) -> u32 {
        2 * channel as u32
    }

    /// Set the threshold of `channel` in millivolts, 1 to 255.
    pub fn set_threshold(&self, channel: u8, millivolts: u16) -> Result<()> {
        Error::check_range("channel", channel, 0, Self::NUM_CHANNELS - 1)?;
        Error::check_range("threshold", millivolts, 1, 255)?;
        debug!(channel, millivolts, "Setting discriminator threshold");
        self.module.write(
            Self::threshold_offset(channel),
            RegisterValue::from(millivolts),
        )
    }

    /// Inhibit channels by bit. Bit 16 is accepted although the register holds 16 bits.
    pub fn set_inhibit_pattern(&self, pattern: u32) -> Result<()> {
        Error::check_range("inhibit pattern", pattern, 0, (1 << 17) - 1)?;
        self.module
            .write(V895Register::InhibitPattern.into(), RegisterValue::from(pattern))
    }

    /// Set the output width of channels 0 to 7 (`range` 0) or 8 to 15 (`range` 1).
    ///
    /// `value` 0 to 255 maps non-linearly onto 5 ns to 40 ns.
    pub fn set_output_width(&self, range: u8, value: u16) -> Result<()> {
        Error::check_range("output width", value, 0, 255)?;
        let register = match range {
            0 => V895Register::OutputWidthLow,
            1 => V895Register::OutputWidthHigh,
            _ => return Err(Error::out_of_range("channel range", range, 0, 1)),
        };
        self.module.write(register.into(), RegisterValue::from(value))
    }

    /// Number of channels, 0 to 20, that must fire together.
    pub fn set_majority_threshold(&self, threshold: u8) -> Result<()> {
        Error::check_range("majority threshold", threshold, 0, 20)?;
        self.module.write(
            V895Register::MajorityThreshold.into(),
            Self::majority_encoding(threshold) as RegisterValue,
        )
    }

    /// Register encoding of a majority level, truncated toward zero.
    pub const fn majority_encoding(threshold: u8) -> i32 {
        (threshold as i32 * 50 - 25) / 4
    }

    pub fn model(&self) -> Result<String> {
        let at = u32::from(V895Register::Model);
        self.module.read_string(at, at)
    }

    pub fn serial_number(&self) -> Result<RegisterValue> {
        self.module.read(V895Register::SerialNumber.into())
    }
}
