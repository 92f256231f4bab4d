//! GridConfig - subdivision and update settings for a [`Grid`](super::Grid).

use glam::IVec3;

use crate::sampler::{IntegrationMode, RadianceSampler};
use crate::transform::GridTransform;

/// Settings a grid is created with. Everything but the sampler fields can
/// also be changed later through the grid's setters.
#[derive(Clone, Debug, PartialEq)]
pub struct GridConfig {
  /// Cells per axis of every subgrid. All components must be positive.
  pub division: IVec3,

  /// Deepest subgrid level. Level 0 is the root; 0 disables subdivision.
  pub max_subgrid_level: i32,

  /// Resample live points on the rayon pool.
  pub parallel_update: bool,

  /// Write each point's debug colour instead of sampling.
  pub debug_colors: bool,

  /// Initial grid transform.
  pub transform: GridTransform,

  /// Hemisphere resolution of the sampler built by [`sampler`](Self::sampler).
  pub sampler_resolution: u32,

  /// Integrator used by [`sampler`](Self::sampler).
  pub integration_mode: IntegrationMode,
}

impl GridConfig {
  pub fn with_division(mut self, division: IVec3) -> Self {
    self.division = division;
    self
  }

  pub fn with_max_subgrid_level(mut self, level: i32) -> Self {
    self.max_subgrid_level = level;
    self
  }

  pub fn with_parallel_update(mut self, parallel: bool) -> Self {
    self.parallel_update = parallel;
    self
  }

  pub fn with_debug_colors(mut self, enabled: bool) -> Self {
    self.debug_colors = enabled;
    self
  }

  pub fn with_transform(mut self, transform: GridTransform) -> Self {
    self.transform = transform;
    self
  }

  pub fn with_sampler_resolution(mut self, resolution: u32) -> Self {
    self.sampler_resolution = resolution;
    self
  }

  pub fn with_integration_mode(mut self, mode: IntegrationMode) -> Self {
    self.integration_mode = mode;
    self
  }

  /// Cells in one subgrid.
  #[inline]
  pub fn cells_per_subgrid(&self) -> usize {
    (self.division.x * self.division.y * self.division.z) as usize
  }

  /// Sampler matching these settings.
  pub fn sampler(&self) -> RadianceSampler {
    RadianceSampler::new(self.sampler_resolution).with_mode(self.integration_mode)
  }
}

impl Default for GridConfig {
  fn default() -> Self {
    Self {
      division: IVec3::splat(2),
      max_subgrid_level: 0,
      parallel_update: false,
      debug_colors: false,
      transform: GridTransform::IDENTITY,
      sampler_resolution: RadianceSampler::DEFAULT_RESOLUTION,
      integration_mode: IntegrationMode::Auto,
    }
  }
}
