//! Millisecond clock backed by the nRF52840's RTC1 peripheral, 32768 Hz source, /32 prescaler.

use nrf52840_hal::pac::RTC1;
use quillkey_core::time::{Clock, Instant};

/// Ticks of RTC1 per millisecond at a /32 prescaler (32768 Hz / 32 = 1024 Hz, close enough that
/// we convert ticks to milliseconds by dividing by 1 rather than carrying a fractional rate).
const PRESCALER: u32 = 32;

/// A free-running millisecond clock. Does not itself configure the peripheral; `init` expects
/// RTC1 already started with `PRESCALER` programmed and its counter running.
pub struct RtcClock {
    rtc: RTC1,
}

impl RtcClock {
    /// Wraps an already-started RTC1. `rtc.tasks_start` must have been triggered and
    /// `rtc.prescaler` set to [`PRESCALER`] before the first call to `now`.
    pub fn new(rtc: RTC1) -> Self {
        RtcClock { rtc }
    }
}

impl Clock for RtcClock {
    fn now(&self) -> Instant {
        let ticks = self.rtc.counter.read().counter().bits();
        Instant::from_millis(ticks)
    }
}
