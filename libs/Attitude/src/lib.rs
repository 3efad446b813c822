//! Gyro-only attitude estimation.
//!
//! Angular rate from a gyroscope is integrated into a unit quaternion, and
//! pitch and roll are derived from that quaternion after every step. This is
//! the Madgwick filter with its correction term removed: there is no
//! accelerometer or magnetometer feedback, so the estimate drifts with gyro
//! bias and heading is always reported as zero.
//!
//! ```
//! use attitude::{GyroIntegrator, SteppedClock};
//! use nalgebra::Vector3;
//!
//! // 100 Hz sample rate
//! let mut imu = GyroIntegrator::new(SteppedClock::from_rate_hz(100));
//! imu.update(Vector3::zeros());
//! imu.update(Vector3::new(0.1, 0.0, 0.0));
//! assert!(imu.current_attitude().roll > 0.0);
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod clock;
pub mod deltat;
pub mod error;
pub mod integrator;
pub mod source;

pub use clock::{ManualClock, SteppedClock};
#[cfg(feature = "embassy")]
pub use clock::EmbassyClock;
#[cfg(feature = "std")]
pub use clock::StdClock;
pub use deltat::{Clock, DeltaT};
pub use error::Error;
pub use integrator::{attitude_from_quaternion, Attitude, Config, GyroIntegrator};
pub use source::{mdps_to_rad_s, AsyncGyroSource, AttitudeSink, GyroSource, Limit, Run};
