//! Tick sources for [`DeltaT`](crate::deltat::DeltaT).
//!
//! All clocks here count microseconds.

use core::cell::Cell;

use crate::deltat::Clock;

/// A clock that reads whatever value was last stored in a shared cell.
///
/// The owner of the cell decides what time it is, e.g. a log replayer that
/// sets the recorded timestamp before handing out each sample.
#[derive(Debug, Clone, Copy)]
pub struct ManualClock<'a> {
    ticks: &'a Cell<u64>,
}

impl<'a> ManualClock<'a> {
    pub fn new(ticks: &'a Cell<u64>) -> Self {
        ManualClock { ticks }
    }
}

impl Clock for ManualClock<'_> {
    const TICK_HZ: u64 = 1_000_000;

    fn now(&mut self) -> u64 {
        self.ticks.get()
    }
}

/// A clock that advances by a fixed step every time it is read.
///
/// Stands in for a sensor sampled at a constant rate.
#[derive(Debug, Clone, Copy)]
pub struct SteppedClock {
    next: u64,
    step: u64,
}

impl SteppedClock {
    /// Start at `start` microseconds and advance `step` microseconds per reading.
    pub fn new(start: u64, step: u64) -> Self {
        SteppedClock {
            next: start % Self::PERIOD,
            step,
        }
    }

    pub fn from_rate_hz(hz: u32) -> Self {
        Self::new(0, Self::TICK_HZ / u64::from(hz.max(1)))
    }
}

impl Clock for SteppedClock {
    const TICK_HZ: u64 = 1_000_000;

    fn now(&mut self) -> u64 {
        let now = self.next;
        self.next = (self.next + self.step) % Self::PERIOD;
        now
    }
}

/// Wall clock, exposed as a 32-bit microsecond counter.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    pub fn new() -> Self {
        StdClock {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    const TICK_HZ: u64 = 1_000_000;

    fn now(&mut self) -> u64 {
        (self.start.elapsed().as_micros() % u128::from(Self::PERIOD)) as u64
    }
}

/// Uptime from the embassy time driver.
#[cfg(feature = "embassy")]
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

#[cfg(feature = "embassy")]
impl Clock for EmbassyClock {
    const TICK_HZ: u64 = 1_000_000;
    // 64-bit uptime, never wraps in practice
    const PERIOD: u64 = u64::MAX;

    fn now(&mut self) -> u64 {
        embassy_time::Instant::now().as_micros()
    }
}
