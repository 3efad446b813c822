use log::warn;

/// A free-running tick counter.
///
/// Readings lie in `0..PERIOD` and wrap back to zero after `PERIOD - 1`.
pub trait Clock {
    /// Counter ticks per second.
    const TICK_HZ: u64;

    /// Counter modulus.
    const PERIOD: u64 = 1 << 32;

    /// Current counter value.
    fn now(&mut self) -> u64;
}

/// Measures the time between consecutive calls.
///
/// The first call after construction (or after [`DeltaT::reset`]) has no
/// previous timestamp to measure against and returns `0.0`. Callers must treat
/// that as "nothing to integrate yet".
#[derive(Debug)]
pub struct DeltaT<C> {
    clock: C,
    last: Option<u64>,
}

impl<C: Clock> DeltaT<C> {
    pub fn new(clock: C) -> Self {
        DeltaT { clock, last: None }
    }

    /// Seconds since the previous call, read from the clock.
    pub fn elapsed(&mut self) -> f32 {
        let now = self.clock.now();
        self.elapsed_at(now)
    }

    /// Seconds since the previous call, using a caller-supplied tick reading
    /// instead of the clock. Useful when samples carry their own timestamps.
    ///
    /// A reading below the previous one is taken as a single counter wrap,
    /// but only if the wrapped distance is under half the counter period.
    /// Anything further is a timestamp that went backwards and measures zero.
    pub fn elapsed_at(&mut self, now: u64) -> f32 {
        let Some(last) = self.last.replace(now) else {
            return 0.0;
        };

        let ticks = if now >= last {
            now - last
        } else {
            let wrapped = C::PERIOD.saturating_sub(last).saturating_add(now);
            if last >= C::PERIOD || wrapped >= C::PERIOD / 2 {
                warn!("timestamp went backwards: {} -> {}", last, now);
                return 0.0;
            }
            warn!("tick counter wrapped: {} -> {}", last, now);
            wrapped
        };
        ticks as f32 / C::TICK_HZ as f32
    }

    /// Forget the previous timestamp. The next call returns `0.0` again.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Whether a previous timestamp exists.
    pub fn is_primed(&self) -> bool {
        self.last.is_some()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Millisecond counter that wraps at 1000, fed from a script.
    struct ShortCounter {
        readings: &'static [u64],
        index: usize,
    }

    impl Clock for ShortCounter {
        const TICK_HZ: u64 = 1000;
        const PERIOD: u64 = 1000;

        fn now(&mut self) -> u64 {
            let reading = self.readings[self.index];
            self.index += 1;
            reading
        }
    }

    fn counter(readings: &'static [u64]) -> DeltaT<ShortCounter> {
        DeltaT::new(ShortCounter { readings, index: 0 })
    }

    #[test]
    fn test_first_call_is_zero() {
        let mut deltat = counter(&[500, 510]);
        assert!(!deltat.is_primed());
        assert_eq!(deltat.elapsed(), 0.0);
        assert!(deltat.is_primed());
        assert_relative_eq!(deltat.elapsed(), 0.010);
    }

    #[test]
    fn test_consecutive_calls() {
        let mut deltat = counter(&[0, 20, 50, 50]);
        deltat.elapsed();
        assert_relative_eq!(deltat.elapsed(), 0.020);
        assert_relative_eq!(deltat.elapsed(), 0.030);
        assert_eq!(deltat.elapsed(), 0.0);
    }

    #[test]
    fn test_wraparound() {
        let mut deltat = counter(&[990, 10, 30]);
        deltat.elapsed();
        let dt = deltat.elapsed();
        assert!(dt > 0.0);
        assert_relative_eq!(dt, 0.020);
        assert_relative_eq!(deltat.elapsed(), 0.020);
    }

    #[test]
    fn test_reset() {
        let mut deltat = counter(&[100, 200, 300, 400]);
        deltat.elapsed();
        assert_relative_eq!(deltat.elapsed(), 0.100);
        deltat.reset();
        assert!(!deltat.is_primed());
        assert_eq!(deltat.elapsed(), 0.0);
        assert_relative_eq!(deltat.elapsed(), 0.100);
    }

    #[test]
    fn test_explicit_timestamps() {
        let mut deltat = counter(&[]);
        assert_eq!(deltat.elapsed_at(0), 0.0);
        assert_relative_eq!(deltat.elapsed_at(250), 0.250);
        // Readings past the modulus still measure forward
        assert_relative_eq!(deltat.elapsed_at(1250), 1.0);
        assert_eq!(deltat.clock().index, 0);
    }

    #[test]
    fn test_timestamp_regression() {
        let mut deltat = counter(&[]);
        deltat.elapsed_at(900);
        // 300 ms backwards is not a plausible wrap on a 1 s counter
        assert_eq!(deltat.elapsed_at(600), 0.0);
        // Measuring resumes from the regressed reading
        assert_relative_eq!(deltat.elapsed_at(650), 0.050);

        // Past the modulus a backwards step can never be a wrap
        deltat.elapsed_at(5_000);
        assert_eq!(deltat.elapsed_at(4_999), 0.0);
    }

    #[test]
    fn test_microsecond_regression_through_update_at() {
        use crate::clock::ManualClock;
        use crate::integrator::GyroIntegrator;
        use core::cell::Cell;
        use nalgebra::Vector3;

        let unused = Cell::new(0);
        let mut imu = GyroIntegrator::new(ManualClock::new(&unused));
        imu.update_at(Vector3::zeros(), 1_000_000);
        imu.update_at(Vector3::new(0.001, 0.0, 0.0), 999_000);
        assert_eq!(imu.current_attitude().roll, 0.0);
    }
}
