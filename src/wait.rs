//! Bounded, cancellable waiting for data-ready.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;

use crate::error::{Error, Result};
use crate::log::{trace, warning};

/// Interval between data-ready polls.
pub const POLL_INTERVAL_US: u32 = 100;

/// Source of a client-requested cancellation.
pub trait Cancellation {
    /// Returns `true` once the wait should be abandoned.
    fn is_cancelled(&self) -> bool;
}

/// Token that never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl Cancellation for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl<C: Cancellation + ?Sized> Cancellation for &C {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Polls `ready` until it reports `true`, the timeout elapses, or `cancel` fires.
///
/// `ready` is always checked at least once, so a zero timeout performs a single poll.
pub fn poll_until<E, D, C, F>(
    delay: &mut D,
    timeout_us: u32,
    cancel: &C,
    mut ready: F,
) -> Result<(), E>
where
    D: DelayNs + ?Sized,
    C: Cancellation + ?Sized,
    F: FnMut() -> Result<bool, E>,
{
    let mut waited_us: u32 = 0;
    loop {
        if cancel.is_cancelled() {
            warning!("data-ready wait cancelled after {} us", waited_us);
            return Err(Error::Cancelled);
        }
        if ready()? {
            trace!("data ready after {} us", waited_us);
            return Ok(());
        }
        if waited_us >= timeout_us {
            warning!("data-ready wait timed out after {} us", waited_us);
            return Err(Error::Timeout);
        }
        let step = POLL_INTERVAL_US.min(timeout_us - waited_us);
        delay.delay_us(step);
        waited_us += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    #[test]
    fn never_ready_times_out_instead_of_hanging() {
        let polls = Cell::new(0u32);
        let result: Result<(), ()> = poll_until(&mut NoopDelay::new(), 10_000, &NeverCancel, || {
            polls.set(polls.get() + 1);
            Ok(false)
        });
        assert_eq!(result, Err(Error::Timeout));
        assert_eq!(polls.get(), 10_000 / POLL_INTERVAL_US + 1);
    }

    #[test]
    fn returns_as_soon_as_ready() {
        let polls = Cell::new(0u32);
        let result: Result<(), ()> = poll_until(&mut NoopDelay::new(), 10_000, &NeverCancel, || {
            polls.set(polls.get() + 1);
            Ok(polls.get() == 3)
        });
        assert_eq!(result, Ok(()));
        assert_eq!(polls.get(), 3);
    }

    #[test]
    fn zero_timeout_polls_once() {
        let result: Result<(), ()> =
            poll_until(&mut NoopDelay::new(), 0, &NeverCancel, || Ok(true));
        assert_eq!(result, Ok(()));
        let result: Result<(), ()> =
            poll_until(&mut NoopDelay::new(), 0, &NeverCancel, || Ok(false));
        assert_eq!(result, Err(Error::Timeout));
    }

    #[test]
    fn cancellation_is_distinct_from_timeout() {
        let cancel = AtomicBool::new(false);
        let polls = Cell::new(0u32);
        let result: Result<(), ()> = poll_until(&mut NoopDelay::new(), 10_000, &cancel, || {
            polls.set(polls.get() + 1);
            if polls.get() == 2 {
                cancel.store(true, Ordering::Release);
            }
            Ok(false)
        });
        assert_eq!(result, Err(Error::Cancelled));
        assert_eq!(polls.get(), 2);
    }

    #[test]
    fn ready_errors_propagate() {
        let result: Result<(), u8> =
            poll_until(&mut NoopDelay::new(), 1_000, &NeverCancel, || Err(Error::Interface(7)));
        assert_eq!(result, Err(Error::Interface(7)));
    }
}
