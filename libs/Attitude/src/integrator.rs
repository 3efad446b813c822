use log::{debug, trace};
use nalgebra::{Quaternion, Vector3};
use num_traits::Float;

use crate::deltat::{Clock, DeltaT};

/// Pitch and roll in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Attitude {
    pub pitch: f32,
    pub roll: f32,
}

impl From<Attitude> for (f32, f32) {
    fn from(attitude: Attitude) -> (f32, f32) {
        (attitude.pitch, attitude.roll)
    }
}

/// Construction-time options.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Offset for true north in degrees, positive adds to heading.
    ///
    /// Heading is not estimated without a magnetometer, so this is carried
    /// but never applied.
    pub declination: f32,
}

/// Dead-reckoning attitude estimator driven by a gyroscope alone.
///
/// Holds the orientation as a unit quaternion relative to the attitude at
/// construction. Each [`update`](Self::update) integrates one angular-rate
/// sample over the time since the previous update, renormalizes, and
/// recomputes pitch and roll.
///
/// Not meant to be shared: an update reads and writes both the quaternion
/// and the timer.
#[derive(Debug)]
pub struct GyroIntegrator<C> {
    q: Quaternion<f32>,
    attitude: Attitude,
    config: Config,
    deltat: DeltaT<C>,
}

impl<C: Clock> GyroIntegrator<C> {
    pub fn new(clock: C) -> Self {
        Self::with_config(clock, Config::default())
    }

    pub fn with_config(clock: C, config: Config) -> Self {
        GyroIntegrator {
            q: Quaternion::identity(),
            attitude: Attitude::default(),
            config,
            deltat: DeltaT::new(clock),
        }
    }

    /// Integrate one angular-rate sample, in rad/s about the body x, y and z axes.
    ///
    /// The time step comes from the integrator's clock. The first update after
    /// construction or [`reset`](Self::reset) has a zero time step and leaves
    /// the orientation unchanged.
    pub fn update(&mut self, rate: Vector3<f32>) {
        let dt = self.deltat.elapsed();
        self.integrate(rate, dt);
    }

    /// Like [`update`](Self::update), with the sample's own timestamp in clock ticks.
    pub fn update_at(&mut self, rate: Vector3<f32>, ticks: u64) {
        let dt = self.deltat.elapsed_at(ticks);
        self.integrate(rate, dt);
    }

    fn integrate(&mut self, rate: Vector3<f32>, dt: f32) {
        if dt == 0.0 {
            debug!("zero time step, orientation held");
        }

        // Quaternion kinematics: q_dot = 1/2 * q (x) (0, w)
        let q_dot = self.q * Quaternion::from_imag(rate) * 0.5;
        let q = self.q + q_dot * dt;

        let norm = q.norm();
        assert!(
            norm.is_finite() && norm > 0.0,
            "degenerate quaternion norm {} (rate {:?}, dt {})",
            norm,
            rate,
            dt
        );
        self.q = q / norm;
        self.attitude = attitude_from_quaternion(&self.q);

        trace!(
            "dt {} s, pitch {} deg, roll {} deg",
            dt,
            self.attitude.pitch,
            self.attitude.roll
        );
    }

    /// Most recently derived pitch and roll.
    pub fn current_attitude(&self) -> Attitude {
        self.attitude
    }

    /// Always zero. See [`Config::declination`].
    pub fn heading(&self) -> f32 {
        0.0
    }

    pub fn quaternion(&self) -> Quaternion<f32> {
        self.q
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start a new session: identity orientation, zero attitude, and a timer
    /// that has not been read yet.
    pub fn reset(&mut self) {
        debug!("attitude reset to identity");
        self.q = Quaternion::identity();
        self.attitude = Attitude::default();
        self.deltat.reset();
    }
}

/// Pitch and roll of a unit quaternion `(w, i, j, k)`, in degrees.
///
/// The pitch term is clamped to `[-1, 1]` before the arcsine so rounding near
/// +-90 degrees cannot leave its domain. Rounding can also land just inside
/// it: with f32 state the pitch at the pole reads about 0.02 degrees short.
pub fn attitude_from_quaternion(q: &Quaternion<f32>) -> Attitude {
    let (q0, q1, q2, q3) = (q.w, q.i, q.j, q.k);

    let sin_pitch = (2.0 * (q1 * q3 - q0 * q2)).clamp(-1.0, 1.0);
    let pitch = -Float::asin(sin_pitch);
    let roll = Float::atan2(
        2.0 * (q0 * q1 + q2 * q3),
        q0 * q0 - q1 * q1 - q2 * q2 + q3 * q3,
    );

    Attitude {
        pitch: pitch.to_degrees(),
        roll: roll.to_degrees(),
    }
}
