//! Waiting for the display to become ready.
//!
//! The framing layer calls [BusyWait::wait_for_busy_clear] before every instruction or data
//! write. The default [PollingBusyWait] polls the busy flag and sleeps between polls, but any
//! strategy with the same contract can be plugged in, for example one that blocks on an
//! interrupt from the D7 line.

use crate::config::Timing;
use crate::{LcdError, LcdResult};
use log::warn;
use std::fmt::Debug;

/// Access to the display a wait strategy may use.
pub trait BusyProbe {
    /// Reads the busy flag.
    fn is_busy(&mut self) -> LcdResult<bool>;

    /// Blocks for the given amount of milliseconds through the hardware delay.
    fn delay_ms(&mut self, ms: u32) -> LcdResult<()>;
}

/// A strategy for waiting until the display clears its busy flag.
pub trait BusyWait: Debug {
    /// Returns once the display is ready.
    ///
    /// # Errors
    /// - [LcdError::Timeout] if the display stays busy for too long.
    fn wait_for_busy_clear(&mut self, probe: &mut dyn BusyProbe) -> LcdResult<()>;
}

/// Polls the busy flag every `tick_ms`, giving up once `timeout_ms` has elapsed.
///
/// The flag is sampled at elapsed times `0, tick, 2 * tick, ..., timeout`, so with the
/// defaults it is read 101 times before reporting a timeout.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PollingBusyWait {
    pub timeout_ms: u32,
    pub tick_ms: u32,
}

impl PollingBusyWait {
    pub fn new(timeout_ms: u32, tick_ms: u32) -> Self {
        Self {
            timeout_ms,
            tick_ms: tick_ms.max(1),
        }
    }

    /// Number of times the flag is read before giving up.
    pub fn max_polls(&self) -> u32 {
        self.timeout_ms
            .div_ceil(self.tick_ms.max(1))
            .saturating_add(1)
    }
}

impl Default for PollingBusyWait {
    fn default() -> Self {
        Timing::default().into()
    }
}

impl From<Timing> for PollingBusyWait {
    fn from(timing: Timing) -> Self {
        PollingBusyWait::new(timing.busy_timeout_ms, timing.busy_tick_ms)
    }
}

impl BusyWait for PollingBusyWait {
    fn wait_for_busy_clear(&mut self, probe: &mut dyn BusyProbe) -> LcdResult<()> {
        let tick_ms = self.tick_ms.max(1);
        let mut elapsed_ms = 0;
        loop {
            if !probe.is_busy()? {
                return Ok(());
            }
            if elapsed_ms >= self.timeout_ms {
                warn!("Busy flag still set after {} ms", elapsed_ms);
                return Err(LcdError::Timeout);
            }
            probe.delay_ms(tick_ms)?;
            elapsed_ms = elapsed_ms.saturating_add(tick_ms);
        }
    }
}
