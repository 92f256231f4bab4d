//! Radiance sampling and irradiance integration.
//!
//! A [`RadianceSampler`] casts one ray per hemisphere direction from a world
//! point, keeps the nearest hit per ray and integrates the gathered radiance
//! into one irradiance value per direction.
//!
//! The grid talks to samplers through the [`IrradianceSampler`] seam so tests
//! and benches can substitute deterministic fakes.

pub mod integrate;
pub mod pool;

use glam::{Vec3, Vec4};

use crate::hemisphere::HemisphereDirections;
use crate::scene::{nearest_hit, Ray, ShadeableObject};

pub use integrate::{integrate_scalar, integrate_vectorized, IntegrationMode};
pub use pool::{ScratchBuffer, ScratchPool};

/// Produces irradiance values for a world-space point.
///
/// Implementations are shared across rayon workers during parallel resampling.
pub trait IrradianceSampler: Sync {
  /// Values written per point; the size of each slot's range in the dense
  /// irradiance buffer.
  fn directions_count(&self) -> usize;

  /// Fill `out` (exactly [`directions_count`](Self::directions_count) long)
  /// with the irradiance seen from `point`.
  fn sample(&self, point: Vec3, out: &mut [Vec4]);
}

/// Hemisphere ray caster with a pooled scratch buffer.
#[derive(Debug)]
pub struct RadianceSampler {
  directions: HemisphereDirections,
  mode: IntegrationMode,
  pool: ScratchPool,
}

impl RadianceSampler {
  /// Resolution used when none is configured.
  pub const DEFAULT_RESOLUTION: u32 = 9;

  /// # Panics
  /// Panics if `resolution` is zero.
  pub fn new(resolution: u32) -> Self {
    Self {
      directions: HemisphereDirections::new(resolution),
      mode: IntegrationMode::default(),
      pool: ScratchPool::new(),
    }
  }

  pub fn with_mode(mut self, mode: IntegrationMode) -> Self {
    self.mode = mode;
    self
  }

  /// Rebuild the direction set. Pooled buffers of the old size are dropped.
  pub fn set_resolution(&mut self, resolution: u32) {
    if resolution == self.directions.resolution() {
      return;
    }
    self.directions = HemisphereDirections::new(resolution);
    self.pool = ScratchPool::new();
    tracing::debug!(resolution, directions = self.directions.len(), "sampler resolution changed");
  }

  pub fn set_mode(&mut self, mode: IntegrationMode) {
    self.mode = mode;
  }

  #[inline]
  pub fn resolution(&self) -> u32 {
    self.directions.resolution()
  }

  #[inline]
  pub fn mode(&self) -> IntegrationMode {
    self.mode
  }

  #[inline]
  pub fn directions(&self) -> &HemisphereDirections {
    &self.directions
  }

  /// Directions per sample point (`2 * R^2`).
  #[inline]
  pub fn samples_count(&self) -> usize {
    self.directions.len()
  }

  #[inline]
  pub fn pool(&self) -> &ScratchPool {
    &self.pool
  }

  /// Sample the irradiance at `point` against `objects`.
  ///
  /// Misses and hits on surfaces without radiance contribute zero.
  ///
  /// # Panics
  /// Panics if `out.len()` differs from [`samples_count`](Self::samples_count).
  pub fn sample<O: ShadeableObject>(&self, point: Vec3, objects: &[O], out: &mut [Vec4]) {
    let count = self.directions.len();
    assert_eq!(
      out.len(),
      count,
      "irradiance output must hold one value per sampling direction"
    );

    let directions = self.directions.directions();
    let mut scratch = self.pool.rent(2 * count, |buffer| {
      for (pair, direction) in buffer.chunks_exact_mut(2).zip(directions) {
        pair[0] = direction.extend(0.0);
      }
    });

    for (i, direction) in directions.iter().enumerate() {
      let ray = Ray::new(point, *direction);
      let radiance = nearest_hit(objects, &ray)
        .and_then(|hit| hit.surface.radiance)
        .unwrap_or(Vec3::ZERO);
      scratch[2 * i + 1] = radiance.extend(0.0);
    }

    integrate::integrate(self.mode, self.directions.resolution(), &scratch, out);
  }

  /// Pair the sampler with the objects it casts rays against.
  pub fn bind<'a, O: ShadeableObject>(&'a self, objects: &'a [O]) -> SceneSampler<'a, O> {
    SceneSampler {
      sampler: self,
      objects,
    }
  }
}

impl Default for RadianceSampler {
  fn default() -> Self {
    Self::new(Self::DEFAULT_RESOLUTION)
  }
}

/// A [`RadianceSampler`] bound to a fixed set of sampling objects.
pub struct SceneSampler<'a, O> {
  sampler: &'a RadianceSampler,
  objects: &'a [O],
}

impl<O: ShadeableObject> IrradianceSampler for SceneSampler<'_, O> {
  fn directions_count(&self) -> usize {
    self.sampler.samples_count()
  }

  fn sample(&self, point: Vec3, out: &mut [Vec4]) {
    self.sampler.sample(point, self.objects, out);
  }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
