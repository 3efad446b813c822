//! Where samples come from and where attitudes go.
//!
//! Gyroscope drivers report angular rate as integer milli-degrees per second.
//! [`GyroIntegrator::run`] pulls one such reading per element, converts it to
//! rad/s, integrates it, and yields the resulting attitude.

use nalgebra::Vector3;

use crate::deltat::Clock;
use crate::error::Error;
use crate::integrator::{Attitude, GyroIntegrator};

/// A gyroscope that can be polled for its latest reading.
pub trait GyroSource {
    type Error;

    /// Latest angular rate about x, y and z in milli-degrees per second.
    ///
    /// May block until a fresh sample is available.
    fn read_xyz(&mut self) -> Result<[i32; 3], Self::Error>;
}

impl<S: GyroSource + ?Sized> GyroSource for &mut S {
    type Error = S::Error;

    fn read_xyz(&mut self) -> Result<[i32; 3], Self::Error> {
        (**self).read_xyz()
    }
}

/// A gyroscope read from an async executor, e.g. an I2C driver awaiting its bus.
#[allow(async_fn_in_trait)]
pub trait AsyncGyroSource {
    type Error;

    /// Latest angular rate about x, y and z in milli-degrees per second.
    async fn read_xyz(&mut self) -> Result<[i32; 3], Self::Error>;
}

/// Receives attitude estimates for presentation. Each call supersedes the last.
pub trait AttitudeSink {
    fn show(&mut self, attitude: Attitude);
}

/// Milli-degrees per second to radians per second, per axis.
pub fn mdps_to_rad_s(raw: [i32; 3]) -> Vector3<f32> {
    Vector3::new(
        (raw[0] as f32 / 1000.0).to_radians(),
        (raw[1] as f32 / 1000.0).to_radians(),
        (raw[2] as f32 / 1000.0).to_radians(),
    )
}

/// How many elements [`GyroIntegrator::run`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Limit {
    Unbounded,
    Iterations(usize),
}

impl Limit {
    /// `unbounded` wins over `iteration_limit`.
    pub fn new(iteration_limit: usize, unbounded: bool) -> Self {
        if unbounded {
            Limit::Unbounded
        } else {
            Limit::Iterations(iteration_limit)
        }
    }
}

impl<C: Clock> GyroIntegrator<C> {
    /// Pull one reading, integrate it, and return the new attitude.
    pub fn step<S: GyroSource>(&mut self, source: &mut S) -> Result<Attitude, Error<S::Error>> {
        let raw = source.read_xyz().map_err(Error::Source)?;
        self.update(mdps_to_rad_s(raw));
        Ok(self.current_attitude())
    }

    /// [`step`](Self::step) for an async source.
    pub async fn step_async<S: AsyncGyroSource>(
        &mut self,
        source: &mut S,
    ) -> Result<Attitude, Error<S::Error>> {
        let raw = source.read_xyz().await.map_err(Error::Source)?;
        self.update(mdps_to_rad_s(raw));
        Ok(self.current_attitude())
    }

    /// Stream attitudes computed from `source`, one reading per element.
    ///
    /// Nothing is read until the iterator is advanced. A failed read is
    /// yielded as an `Err` and still counts towards the limit; the next
    /// element tries the source again. Drop the iterator to stop early.
    pub fn run<'a, S: GyroSource>(&'a mut self, source: &'a mut S, limit: Limit) -> Run<'a, C, S> {
        Run {
            integrator: self,
            source,
            remaining: limit,
        }
    }
}

/// Iterator returned by [`GyroIntegrator::run`].
#[derive(Debug)]
pub struct Run<'a, C, S> {
    integrator: &'a mut GyroIntegrator<C>,
    source: &'a mut S,
    remaining: Limit,
}

impl<C: Clock, S: GyroSource> Run<'_, C, S> {
    /// Forward every attitude to `sink`, stopping at the first failed read.
    ///
    /// Returns how many attitudes were shown.
    pub fn drain_into<K: AttitudeSink>(self, sink: &mut K) -> Result<usize, Error<S::Error>> {
        let mut shown = 0;
        for attitude in self {
            sink.show(attitude?);
            shown += 1;
        }
        Ok(shown)
    }
}

impl<C: Clock, S: GyroSource> Iterator for Run<'_, C, S> {
    type Item = Result<Attitude, Error<S::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.remaining {
            Limit::Unbounded => {}
            Limit::Iterations(0) => return None,
            Limit::Iterations(n) => *n -= 1,
        }
        Some(self.integrator.step(self.source))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            Limit::Unbounded => (usize::MAX, None),
            Limit::Iterations(n) => (n, Some(n)),
        }
    }
}
