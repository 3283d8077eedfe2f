//! The guarded bus controller: every cycle on a bridge goes through here.

use tracing::{info, trace};

use crate::{
    config::BridgeConfig,
    error::{Error, Result, check},
    guard::AccessGuard,
    provider::{BusCycleProvider, BusHandle},
    types::{AddressModifier, DataWidth, RegisterValue},
};

/// The provider together with the handle it opened.
pub(crate) struct Session<P> {
    pub(crate) provider: P,
    pub(crate) handle: BusHandle,
    open: bool,
}

/// Owns a bridge connection and serializes all access to it.
///
/// Share it between threads by reference or behind an `Arc`. The handle is
/// closed when the controller is dropped or [`closed`](Self::close), both of
/// which require that no operation is borrowing it.
pub struct BusController<P: BusCycleProvider> {
    guard: AccessGuard<Session<P>>,
    config: BridgeConfig,
}

impl<P: BusCycleProvider> BusController<P> {
    /// Open the bridge described by `config` through `provider`.
    pub fn open(mut provider: P, config: BridgeConfig) -> Result<Self> {
        let (handle, code) = provider.open(config.board_type, config.link, config.board);
        check(code)?;
        info!(
            board_type = ?config.board_type,
            link = config.link,
            board = config.board,
            "Opened VME bridge"
        );
        Ok(Self {
            guard: AccessGuard::new(
                Session {
                    provider,
                    handle,
                    open: true,
                },
                config.lock_timeout(),
            ),
            config,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Whether an operation currently holds the bus.
    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Run `f` with the bus held for its whole duration.
    ///
    /// Calling any other guarded operation of this controller from inside `f`
    /// deadlocks until the guard timeout; use the [`Bus`] passed in instead.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut Bus<'_, P>) -> Result<R>) -> Result<R> {
        self.transaction_at(0, f)
    }

    /// Like [`Self::transaction`] with every address relative to `base`.
    pub(crate) fn transaction_at<R>(
        &self,
        base: u32,
        f: impl FnOnce(&mut Bus<'_, P>) -> Result<R>,
    ) -> Result<R> {
        let mut session = self.guard.acquire()?;
        let mut bus = Bus {
            session: &mut *session,
            base,
            am: self.config.address_modifier,
        };
        f(&mut bus)
    }

    /// Run `f` against the raw provider with the bus held.
    pub(crate) fn with_session<R>(&self, f: impl FnOnce(&mut P, BusHandle) -> Result<R>) -> Result<R> {
        let mut session = self.guard.acquire()?;
        let handle = session.handle;
        f(&mut session.provider, handle)
    }

    /// 16 bit read at `address`.
    pub fn read(&self, address: u32) -> Result<RegisterValue> {
        self.read_with(address, DataWidth::D16)
    }

    pub fn read_with(&self, address: u32, width: DataWidth) -> Result<RegisterValue> {
        self.transaction(|bus| bus.read_with(address, width))
    }

    /// 16 bit write of `value` to `address`.
    pub fn write(&self, address: u32, value: RegisterValue) -> Result<()> {
        self.write_with(address, value, DataWidth::D16)
    }

    pub fn write_with(&self, address: u32, value: RegisterValue, width: DataWidth) -> Result<()> {
        self.transaction(|bus| bus.write_with(address, value, width))
    }

    /// Read the ASCII text stored two characters per word in `[start, end]`.
    pub fn read_string(&self, start: u32, end: u32) -> Result<String> {
        self.transaction(|bus| bus.read_string(start, end))
    }

    /// Release the bus handle now instead of on drop.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let session = self.guard.get_mut();
        if session.open {
            session.open = false;
            session.provider.close(session.handle);
            info!(
                link = self.config.link,
                board = self.config.board,
                "Closed VME bridge"
            );
        }
    }
}

impl<P: BusCycleProvider> Drop for BusController<P> {
    fn drop(&mut self) {
        self.release();
    }
}

/// The bus as seen from inside a transaction. No guarding happens here.
pub struct Bus<'s, P> {
    session: &'s mut Session<P>,
    base: u32,
    am: AddressModifier,
}

impl<P: BusCycleProvider> Bus<'_, P> {
    pub fn read(&mut self, offset: u32) -> Result<RegisterValue> {
        self.read_with(offset, DataWidth::D16)
    }

    /// Absolute address of `offset`, failing past the end of the address space.
    fn address(&self, offset: u32) -> Result<u32> {
        self.base.checked_add(offset).ok_or_else(|| {
            Error::out_of_range(
                "address",
                i64::from(self.base) + i64::from(offset),
                0,
                u32::MAX,
            )
        })
    }

    pub fn read_with(&mut self, offset: u32, width: DataWidth) -> Result<RegisterValue> {
        let address = self.address(offset)?;
        let session = &mut *self.session;
        let (raw, code) = session
            .provider
            .read_cycle(session.handle, address, self.am, width);
        check(code)?;
        let value = width.mask(raw);
        trace!(address, ?width, value, "Read cycle");
        Ok(value)
    }

    pub fn write(&mut self, offset: u32, value: RegisterValue) -> Result<()> {
        self.write_with(offset, value, DataWidth::D16)
    }

    pub fn write_with(&mut self, offset: u32, value: RegisterValue, width: DataWidth) -> Result<()> {
        let address = self.address(offset)?;
        let value = width.mask(value);
        let session = &mut *self.session;
        check(
            session
                .provider
                .write_cycle(session.handle, address, value, self.am, width),
        )?;
        trace!(address, ?width, value, "Write cycle");
        Ok(())
    }

    /// Read words from `start` up to and including `end` in steps of two,
    /// high byte first, and trim surrounding whitespace.
    pub fn read_string(&mut self, start: u32, end: u32) -> Result<String> {
        let mut text = String::new();
        for offset in (start..end.saturating_add(2)).step_by(2) {
            let word = self.read(offset)? as u16;
            let [high, low] = word.to_be_bytes();
            text.push(char::from(high));
            text.push(char::from(low));
        }
        Ok(text.trim().to_string())
    }
}
