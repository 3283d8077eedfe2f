//! Scale factors between raw register counts and physical units.
//!
//! The HV supply stores voltages in steps of 0.1 V, currents in steps of
//! 0.05 mA (0.005 mA on the low monitor range) and times in steps of 0.1 s.
//! Every scaled register is 16 bits wide.

use crate::{
    error::{Error, Result},
    types::RegisterValue,
};

/// Physical value of one raw count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub step: f64,
}

impl Scale {
    pub const VOLTAGE: Scale = Scale::new(0.1);
    pub const CURRENT: Scale = Scale::new(0.05);
    /// Current monitor in its low range.
    pub const CURRENT_LOW_RANGE: Scale = Scale::new(0.005);
    pub const TIME: Scale = Scale::new(0.1);

    /// Largest count a scaled register holds.
    pub const RAW_MAX: RegisterValue = 0xFFFF;

    pub const fn new(step: f64) -> Self {
        Self { step }
    }

    #[inline]
    pub fn to_physical(&self, raw: RegisterValue) -> f64 {
        raw as f64 * self.step
    }

    /// Convert to raw counts, truncating toward zero.
    ///
    /// Fails unless the result fits in `0..=RAW_MAX`.
    pub fn to_raw(&self, value: f64) -> Result<RegisterValue> {
        if !value.is_finite() {
            return Err(Error::NotFinite("scaled value"));
        }
        let counts = (value / self.step).trunc();
        if counts < 0.0 || counts > Self::RAW_MAX as f64 {
            return Err(Error::out_of_range(
                "raw count",
                counts as i64,
                0,
                Self::RAW_MAX as i64,
            ));
        }
        Ok(counts as RegisterValue)
    }
}
