use approx::assert_relative_eq;
use attitude::{Attitude, GyroIntegrator, GyroSource, Limit, SteppedClock};

/// Gyro held at rest for one reading, then turning at a constant rate.
struct Turning {
    rate_mdps: [i32; 3],
    reads: usize,
}

impl GyroSource for Turning {
    type Error = core::convert::Infallible;

    fn read_xyz(&mut self) -> Result<[i32; 3], Self::Error> {
        self.reads += 1;
        if self.reads == 1 {
            Ok([0, 0, 0])
        } else {
            Ok(self.rate_mdps)
        }
    }
}

fn stream(rate_mdps: [i32; 3]) -> Vec<Attitude> {
    // 10 ms between readings
    let mut imu = GyroIntegrator::new(SteppedClock::new(0, 10_000));
    let mut gyro = Turning { rate_mdps, reads: 0 };
    imu.run(&mut gyro, Limit::Iterations(4))
        .map(|attitude| attitude.unwrap())
        .collect()
}

#[test]
fn test_level_then_pitch_up() {
    let attitudes = stream([0, 573_000, 0]);
    assert_eq!(attitudes.len(), 4);

    // First reading has no time step to integrate over
    assert_eq!(attitudes[0], Attitude::default());
    assert_eq!(<(f32, f32)>::from(attitudes[0]), (0.0, 0.0));

    // 573 deg/s for 3 x 10 ms is about 17.2 degrees, within Euler step error
    let last = attitudes[3];
    assert_relative_eq!(last.pitch, 17.19, max_relative = 0.03);
    assert_relative_eq!(last.roll, 0.0, epsilon = 1e-3);

    assert!(attitudes[1].pitch < attitudes[2].pitch);
    assert!(attitudes[2].pitch < attitudes[3].pitch);
}

#[test]
fn test_level_then_roll_right() {
    let attitudes = stream([573_000, 0, 0]);
    assert_eq!(attitudes[0], Attitude::default());

    let last = attitudes[3];
    assert_relative_eq!(last.roll, 17.19, max_relative = 0.03);
    assert_relative_eq!(last.pitch, 0.0, epsilon = 1e-3);
}

#[test]
fn test_yaw_leaves_pitch_and_roll_level() {
    let attitudes = stream([0, 0, 573_000]);
    for attitude in attitudes {
        assert_relative_eq!(attitude.pitch, 0.0, epsilon = 1e-3);
        assert_relative_eq!(attitude.roll, 0.0, epsilon = 1e-3);
    }
}
