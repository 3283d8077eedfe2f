//! The front panel display snapshot of the last bus cycle.
//!
//! The provider fills a [`DISPLAY_LEN`] byte buffer laid out like the
//! driver's display record on LP64 targets: four native `long` values
//! followed by eleven one-byte booleans, padded to eight byte alignment.
//! Multi-byte fields are little endian.
//!
//! | Bytes     | Field                   |
//! |-----------|-------------------------|
//! | 0..=7     | address                 |
//! | 8..=15    | data                    |
//! | 16..=23   | address modifier        |
//! | 24..=31   | IRQ lines               |
//! | 32        | data strobe 0           |
//! | 33        | data strobe 1           |
//! | 34        | address strobe          |
//! | 35        | interrupt acknowledge   |
//! | 36        | write                   |
//! | 37        | long word               |
//! | 38        | data acknowledge        |
//! | 39        | bus error               |
//! | 40        | system reset            |
//! | 41        | bus request             |
//! | 42        | bus grant               |
//! | 43..=47   | padding                 |

use modular_bitfield::prelude::*;

use crate::{
    error::{Error, Result},
    types::AddressModifier,
};

/// Size of the raw display buffer in bytes.
pub const DISPLAY_LEN: usize = 48;

/// Snapshot of the last cycle seen on the bus. Re-read it to refresh.
///
/// Each flag is the low bit of its byte.
#[bitfield(bits = 384)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySnapshot {
    pub address: B64,
    pub data: B64,
    pub am: B64,
    /// One bit per IRQ line, bit 0 is IRQ1.
    pub irq: B64,
    pub data_strobe_0: bool,
    #[skip]
    __: B7,
    pub data_strobe_1: bool,
    #[skip]
    __: B7,
    pub address_strobe: bool,
    #[skip]
    __: B7,
    pub interrupt_acknowledge: bool,
    #[skip]
    __: B7,
    pub write: bool,
    #[skip]
    __: B7,
    pub long_word: bool,
    #[skip]
    __: B7,
    pub data_acknowledge: bool,
    #[skip]
    __: B7,
    pub bus_error: bool,
    #[skip]
    __: B7,
    pub system_reset: bool,
    #[skip]
    __: B7,
    pub bus_request: bool,
    #[skip]
    __: B7,
    pub bus_grant: bool,
    #[skip]
    __: B7,
    #[skip]
    __: B40,
}

impl DisplaySnapshot {
    /// Decode a raw buffer as filled by the provider.
    pub fn decode(raw: [u8; DISPLAY_LEN]) -> Self {
        Self::from_bytes(raw)
    }

    /// The address modifier of the last cycle, if it is a known code.
    pub fn address_modifier(&self) -> Result<AddressModifier> {
        let raw = self.am();
        let code = u32::try_from(raw).map_err(|_| Error::Decode {
            what: "address modifier",
            raw,
        })?;
        AddressModifier::try_from(code)
    }

    /// Whether IRQ `level` (1 to 7) was asserted.
    pub fn irq_asserted(&self, level: u8) -> bool {
        (1..=7).contains(&level) && self.irq() & (1 << (level - 1)) != 0
    }
}
