//! A VME module seen through its base address.

use crate::{
    controller::{Bus, BusController},
    error::Result,
    provider::BusCycleProvider,
    types::{DataWidth, RegisterValue},
};

/// Address-relative view over a [`BusController`].
///
/// A module owns no hardware resource; dropping it leaves the bridge open.
pub struct Module<'c, P: BusCycleProvider> {
    controller: &'c BusController<P>,
    base_address: u32,
}

impl<P: BusCycleProvider> Clone for Module<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: BusCycleProvider> Copy for Module<'_, P> {}

impl<'c, P: BusCycleProvider> Module<'c, P> {
    pub fn new(controller: &'c BusController<P>, base_address: u32) -> Self {
        Self {
            controller,
            base_address,
        }
    }

    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    pub fn controller(&self) -> &'c BusController<P> {
        self.controller
    }

    pub fn read(&self, offset: u32) -> Result<RegisterValue> {
        self.read_with(offset, DataWidth::D16)
    }

    pub fn read_with(&self, offset: u32, width: DataWidth) -> Result<RegisterValue> {
        self.transaction(|bus| bus.read_with(offset, width))
    }

    pub fn write(&self, offset: u32, value: RegisterValue) -> Result<()> {
        self.write_with(offset, value, DataWidth::D16)
    }

    pub fn write_with(&self, offset: u32, value: RegisterValue, width: DataWidth) -> Result<()> {
        self.transaction(|bus| bus.write_with(offset, value, width))
    }

    pub fn read_string(&self, start: u32, end: u32) -> Result<String> {
        self.transaction(|bus| bus.read_string(start, end))
    }

    /// Run `f` with the bus held, every offset relative to this module.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut Bus<'_, P>) -> Result<R>) -> Result<R> {
        self.controller.transaction_at(self.base_address, f)
    }
}
