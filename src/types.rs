//! This module contains the enumerated types used on the bridge and in bus cycles.

use fugit::NanosDurationU64;
use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, FromRepr};

use crate::error::{Error, Result};

/// Raw value of a register as returned by a single bus cycle.
pub type RegisterValue = u64;

/// Implements `TryFrom<u32>` for a `FromRepr` enum, failing with [`Error::Decode`].
macro_rules! decode_raw {
    ($ty:ty, $what:literal) => {
        impl TryFrom<u32> for $ty {
            type Error = Error;

            fn try_from(value: u32) -> Result<Self> {
                <$ty>::from_repr(value).ok_or(Error::Decode {
                    what: $what,
                    raw: u64::from(value),
                })
            }
        }
    };
}

pub(crate) use decode_raw;

/// Bridge hardware the bus handle is opened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, FromRepr, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u32)]
pub enum BoardType {
    /// USB to VME bridge.
    V1718 = 0,
    /// VME bridge with optical link.
    V2718 = 1,
    /// PCI board with optical link.
    A2818 = 2,
    /// Optical link piggy-back.
    A2719 = 3,
    /// PCIe board with up to four optical links.
    A3818 = 4,
}

decode_raw!(BoardType, "board type");

/// Width of a single bus cycle, optionally byte swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, FromRepr)]
#[repr(u32)]
pub enum DataWidth {
    D8 = 0x01,
    #[default]
    D16 = 0x02,
    D32 = 0x04,
    D64 = 0x08,
    D16Swapped = 0x12,
    D32Swapped = 0x14,
    D64Swapped = 0x18,
}

impl DataWidth {
    /// Number of bytes moved by one cycle.
    pub const fn bytes(self) -> u32 {
        (self as u32) & 0x0F
    }

    /// Whether the bridge reverses the byte order.
    pub const fn is_swapped(self) -> bool {
        (self as u32) & 0x10 != 0
    }

    /// Truncate `value` to the bits this width carries.
    pub const fn mask(self, value: RegisterValue) -> RegisterValue {
        match self.bytes() {
            8 => value,
            n => value & ((1 << (n * 8)) - 1),
        }
    }
}

/// VME address modifier codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, FromRepr, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum AddressModifier {
    A16Supervisory = 0x2D,
    A16NonPrivileged = 0x29,
    A16Lock = 0x2C,

    A24SupervisoryBlock = 0x3F,
    A24SupervisoryProgram = 0x3E,
    A24SupervisoryData = 0x3D,
    A24SupervisoryBlock64 = 0x3C,

    A24NonPrivilegedBlock = 0x3B,
    A24NonPrivilegedProgram = 0x3A,
    /// Used for every cycle unless configured otherwise.
    #[default]
    A24NonPrivilegedData = 0x39,
    A24NonPrivilegedBlock64 = 0x38,
    A24Lock = 0x32,

    A32SupervisoryBlock = 0x0F,
    A32SupervisoryProgram = 0x0E,
    A32SupervisoryData = 0x0D,
    A32SupervisoryBlock64 = 0x0C,

    A32NonPrivilegedBlock = 0x0B,
    A32NonPrivilegedProgram = 0x0A,
    A32NonPrivilegedData = 0x09,
    A32NonPrivilegedBlock64 = 0x08,
    A32Lock = 0x05,

    /// Configuration ROM / control and status register space.
    CrCsr = 0x2F,
}

decode_raw!(AddressModifier, "address modifier");

/// Signals which can drive the bridge's pulsers, scaler and outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, FromRepr)]
#[repr(u32)]
pub enum IoSource {
    /// Front panel button or software.
    Manual = 0,
    /// Input line 0.
    Input0 = 1,
    /// Input line 1.
    Input1 = 2,
    /// Coincidence of both inputs.
    Coincidence = 3,
    /// Signals from the VME bus.
    VmeSignal = 4,
    /// Various internal signals.
    MiscSignals = 6,
}

decode_raw!(IoSource, "I/O source");

/// Time base for pulser period and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, FromRepr)]
#[repr(u32)]
pub enum TimeUnit {
    Unit25ns = 0,
    Unit1600ns = 1,
    Unit410us = 2,
    Unit104ms = 3,
}

decode_raw!(TimeUnit, "time unit");

impl TimeUnit {
    /// Duration of one tick of this time base.
    pub const fn tick(self) -> NanosDurationU64 {
        match self {
            TimeUnit::Unit25ns => NanosDurationU64::from_ticks(25),
            TimeUnit::Unit1600ns => NanosDurationU64::from_ticks(1_600),
            TimeUnit::Unit410us => NanosDurationU64::from_ticks(410_000),
            TimeUnit::Unit104ms => NanosDurationU64::from_ticks(104_000_000),
        }
    }
}

/// Signal and LED polarity of the bridge's I/O lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, FromRepr)]
#[repr(u32)]
pub enum Polarity {
    /// Normal polarity, LED lit on high.
    #[default]
    ActiveHigh = 0,
    /// Inverted polarity, LED lit on low.
    ActiveLow = 1,
}

decode_raw!(Polarity, "polarity");
