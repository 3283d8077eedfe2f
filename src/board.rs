//! The V2718 bridge: bus access plus the bridge's own pulsers, scaler and I/O lines.
//!
//! For its methods, "set" writes a configuration and "get" reads it back,
//! whereas "read" returns a live value.

use core::ops::Deref;

use fugit::NanosDurationU64;
use tracing::debug;

use crate::{
    config::BridgeConfig,
    controller::BusController,
    display::DisplaySnapshot,
    error::{Error, Result, check},
    provider::{BusCycleProvider, RawIoConf, RawPulserConf, RawScalerConf},
    registers::{BridgeRegister, InputRegister, StatusRegister},
    types::{BoardType, IoSource, Polarity, TimeUnit},
};

/// Number of pulsers on the bridge.
pub const NUM_PULSERS: u8 = 2;
/// Number of programmable output lines.
pub const NUM_OUTPUTS: u8 = 5;
/// Number of input lines.
pub const NUM_INPUTS: u8 = 2;

/// Configuration of one of the two pulsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulserConfig {
    /// Period in ticks of `unit`.
    pub period: u8,
    /// Width in ticks of `unit`.
    pub width: u8,
    pub unit: TimeUnit,
    /// Number of pulses, `0` runs forever.
    pub num_pulses: u8,
    pub start_signal: IoSource,
    pub reset_signal: IoSource,
}

impl PulserConfig {
    pub fn period_duration(&self) -> NanosDurationU64 {
        self.unit.tick() * u32::from(self.period)
    }

    pub fn width_duration(&self) -> NanosDurationU64 {
        self.unit.tick() * u32::from(self.width)
    }
}

impl From<&PulserConfig> for RawPulserConf {
    fn from(value: &PulserConfig) -> Self {
        RawPulserConf {
            period: value.period,
            width: value.width,
            unit: value.unit as u32,
            num_pulses: value.num_pulses,
            start: value.start_signal as u32,
            reset: value.reset_signal as u32,
        }
    }
}

impl TryFrom<RawPulserConf> for PulserConfig {
    type Error = Error;

    fn try_from(raw: RawPulserConf) -> Result<Self> {
        Ok(PulserConfig {
            period: raw.period,
            width: raw.width,
            unit: TimeUnit::try_from(raw.unit)?,
            num_pulses: raw.num_pulses,
            start_signal: IoSource::try_from(raw.start)?,
            reset_signal: IoSource::try_from(raw.reset)?,
        })
    }
}

/// Configuration of the scaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalerConfig {
    /// Count at which the scaler stops or wraps.
    pub limit: u16,
    pub auto_reset: bool,
    pub source_signal: IoSource,
    pub gate_signal: IoSource,
    pub reset_signal: IoSource,
}

impl From<&ScalerConfig> for RawScalerConf {
    fn from(value: &ScalerConfig) -> Self {
        RawScalerConf {
            limit: value.limit,
            auto_reset: u16::from(value.auto_reset),
            source: value.source_signal as u32,
            gate: value.gate_signal as u32,
            reset: value.reset_signal as u32,
        }
    }
}

impl TryFrom<RawScalerConf> for ScalerConfig {
    type Error = Error;

    fn try_from(raw: RawScalerConf) -> Result<Self> {
        Ok(ScalerConfig {
            limit: raw.limit,
            auto_reset: raw.auto_reset == 1,
            source_signal: IoSource::try_from(raw.source)?,
            gate_signal: IoSource::try_from(raw.gate)?,
            reset_signal: IoSource::try_from(raw.reset)?,
        })
    }
}

/// Configuration of an output line, `0..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub polarity: Polarity,
    pub led_polarity: Polarity,
    pub source_signal: IoSource,
}

/// Configuration of an input line, `0..=1`. Its source is fixed by the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputConfig {
    pub polarity: Polarity,
    pub led_polarity: Polarity,
}

impl TryFrom<RawIoConf> for OutputConfig {
    type Error = Error;

    fn try_from(raw: RawIoConf) -> Result<Self> {
        Ok(OutputConfig {
            polarity: Polarity::try_from(raw.polarity)?,
            led_polarity: Polarity::try_from(raw.led_polarity)?,
            source_signal: IoSource::try_from(raw.source)?,
        })
    }
}

fn check_pulser(pulser: u8) -> Result<()> {
    Error::check_range("pulser", pulser, 0, NUM_PULSERS - 1)
}

fn check_output(channel: u8) -> Result<()> {
    Error::check_range("output channel", channel, 0, NUM_OUTPUTS - 1)
}

fn check_input(channel: u8) -> Result<()> {
    Error::check_range("input channel", channel, 0, NUM_INPUTS - 1)
}

/// A V2718 bridge. Dereferences to its [`BusController`] for plain bus access.
pub struct V2718<P: BusCycleProvider> {
    bus: BusController<P>,
}

impl<P: BusCycleProvider> V2718<P> {
    /// Open the bridge at `link`/`board` with default settings.
    pub fn open(provider: P, link: u32, board: u32) -> Result<Self> {
        Self::from_config(provider, BridgeConfig::new(BoardType::V2718, link, board))
    }

    pub fn from_config(provider: P, config: BridgeConfig) -> Result<Self> {
        Ok(Self {
            bus: BusController::open(provider, config)?,
        })
    }

    /// Firmware release of the bridge.
    pub fn firmware_release(&self) -> Result<u8> {
        self.bus
            .with_session(|provider, handle| Ok(provider.read_board_firmware(handle)))
    }

    pub fn set_pulser_configuration(&self, pulser: u8, config: &PulserConfig) -> Result<()> {
        check_pulser(pulser)?;
        debug!(pulser, ?config, "Setting pulser configuration");
        self.bus.with_session(|provider, handle| {
            check(provider.set_pulser_conf(handle, pulser, config.into()))
        })
    }

    pub fn get_pulser_configuration(&self, pulser: u8) -> Result<PulserConfig> {
        check_pulser(pulser)?;
        let raw = self.bus.with_session(|provider, handle| {
            let (raw, code) = provider.get_pulser_conf(handle, pulser);
            check(code).map(|_| raw)
        })?;
        PulserConfig::try_from(raw)
    }

    pub fn set_scaler_configuration(&self, config: &ScalerConfig) -> Result<()> {
        debug!(?config, "Setting scaler configuration");
        self.bus
            .with_session(|provider, handle| check(provider.set_scaler_conf(handle, config.into())))
    }

    pub fn get_scaler_configuration(&self) -> Result<ScalerConfig> {
        let raw = self.bus.with_session(|provider, handle| {
            let (raw, code) = provider.get_scaler_conf(handle);
            check(code).map(|_| raw)
        })?;
        ScalerConfig::try_from(raw)
    }

    pub fn set_output_configuration(&self, channel: u8, config: &OutputConfig) -> Result<()> {
        check_output(channel)?;
        debug!(channel, ?config, "Setting output configuration");
        let raw = RawIoConf {
            polarity: config.polarity as u32,
            led_polarity: config.led_polarity as u32,
            source: config.source_signal as u32,
        };
        self.bus
            .with_session(|provider, handle| check(provider.set_output_conf(handle, channel, raw)))
    }

    pub fn get_output_configuration(&self, channel: u8) -> Result<OutputConfig> {
        check_output(channel)?;
        let raw = self.bus.with_session(|provider, handle| {
            let (raw, code) = provider.get_output_conf(handle, channel);
            check(code).map(|_| raw)
        })?;
        OutputConfig::try_from(raw)
    }

    pub fn set_input_configuration(&self, channel: u8, config: &InputConfig) -> Result<()> {
        check_input(channel)?;
        debug!(channel, ?config, "Setting input configuration");
        let raw = RawIoConf {
            polarity: config.polarity as u32,
            led_polarity: config.led_polarity as u32,
            source: 0,
        };
        self.bus
            .with_session(|provider, handle| check(provider.set_input_conf(handle, channel, raw)))
    }

    /// Returns the configuration of an input line together with the source it reports.
    pub fn get_input_configuration(&self, channel: u8) -> Result<(InputConfig, IoSource)> {
        check_input(channel)?;
        let raw = self.bus.with_session(|provider, handle| {
            let (raw, code) = provider.get_input_conf(handle, channel);
            check(code).map(|_| raw)
        })?;
        let config = InputConfig {
            polarity: Polarity::try_from(raw.polarity)?,
            led_polarity: Polarity::try_from(raw.led_polarity)?,
        };
        Ok((config, IoSource::try_from(raw.source)?))
    }

    /// Read one of the bridge's internal registers.
    pub fn read_register(&self, register: BridgeRegister) -> Result<u32> {
        self.bus.with_session(|provider, handle| {
            let (value, code) = provider.read_register(handle, register.into());
            check(code).map(|_| value)
        })
    }

    pub fn read_status(&self) -> Result<StatusRegister> {
        let raw = self.read_register(BridgeRegister::Status)?;
        Ok(StatusRegister::from(raw as u16))
    }

    pub fn read_inputs(&self) -> Result<InputRegister> {
        let raw = self.read_register(BridgeRegister::Input)?;
        Ok(InputRegister::from(raw as u16))
    }

    /// Set the output lines in `mask`, see [`OutputLines`](crate::registers::OutputLines).
    pub fn set_output_register(&self, mask: impl Into<u16>) -> Result<()> {
        let mask = mask.into();
        self.bus
            .with_session(|provider, handle| check(provider.set_output_register(handle, mask)))
    }

    pub fn clear_output_register(&self, mask: impl Into<u16>) -> Result<()> {
        let mask = mask.into();
        self.bus
            .with_session(|provider, handle| check(provider.clear_output_register(handle, mask)))
    }

    /// Set and then clear the lines in `mask` with the bus held throughout.
    pub fn pulse_output_register(&self, mask: impl Into<u16>) -> Result<()> {
        let mask = mask.into();
        self.bus
            .with_session(|provider, handle| check(provider.pulse_output_register(handle, mask)))
    }

    /// Fetch a fresh snapshot of the front panel display.
    pub fn read_display(&self) -> Result<DisplaySnapshot> {
        let raw = self.bus.with_session(|provider, handle| {
            let (raw, code) = provider.read_display(handle);
            check(code).map(|_| raw)
        })?;
        Ok(DisplaySnapshot::decode(raw))
    }

    pub fn reset_system(&self) -> Result<()> {
        debug!("Resetting VME system");
        self.bus
            .with_session(|provider, handle| check(provider.system_reset(handle)))
    }

    pub fn reset_scaler_count(&self) -> Result<()> {
        self.bus
            .with_session(|provider, handle| check(provider.reset_scaler_count(handle)))
    }

    pub fn enable_scaler_gate(&self) -> Result<()> {
        self.bus
            .with_session(|provider, handle| check(provider.enable_scaler_gate(handle)))
    }

    pub fn disable_scaler_gate(&self) -> Result<()> {
        self.bus
            .with_session(|provider, handle| check(provider.disable_scaler_gate(handle)))
    }

    /// Current count of the scaler.
    pub fn get_scaler_count(&self) -> Result<u32> {
        self.read_register(BridgeRegister::Scaler1)
    }

    pub fn start_pulser(&self, pulser: u8) -> Result<()> {
        check_pulser(pulser)?;
        self.bus
            .with_session(|provider, handle| check(provider.start_pulser(handle, pulser)))
    }

    pub fn stop_pulser(&self, pulser: u8) -> Result<()> {
        check_pulser(pulser)?;
        self.bus
            .with_session(|provider, handle| check(provider.stop_pulser(handle, pulser)))
    }

    /// Release the bus handle now instead of on drop.
    pub fn close(self) {
        self.bus.close();
    }
}

impl<P: BusCycleProvider> Deref for V2718<P> {
    type Target = BusController<P>;

    fn deref(&self) -> &Self::Target {
        &self.bus
    }
}
