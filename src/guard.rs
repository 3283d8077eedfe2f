//! Single-flight access to the bus handle.

use std::time::Duration;

use parking_lot::{FairMutex, FairMutexGuard};
use tracing::warn;

use crate::error::{Error, Result};

/// Serializes access to `T`, giving up after a fixed timeout.
///
/// Waiters are served in arrival order. Holding the returned guard marks the
/// bus as in flight; dropping it releases it on every exit path.
/// Acquiring twice from the same thread deadlocks until the timeout.
#[derive(Debug)]
pub struct AccessGuard<T> {
    inner: FairMutex<T>,
    timeout: Duration,
}

impl<T> AccessGuard<T> {
    /// How long [`Self::acquire`] waits by default.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(value: T, timeout: Duration) -> Self {
        Self {
            inner: FairMutex::new(value),
            timeout,
        }
    }

    /// Block until no other operation is in flight.
    pub fn acquire(&self) -> Result<FairMutexGuard<'_, T>> {
        self.inner.try_lock_for(self.timeout).ok_or_else(|| {
            warn!(timeout = ?self.timeout, "Bus access guard timed out");
            Error::LockTimeout(self.timeout)
        })
    }

    pub fn is_busy(&self) -> bool {
        self.inner.is_locked()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Exclusive access without locking, only possible with no guard outstanding.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }
}
