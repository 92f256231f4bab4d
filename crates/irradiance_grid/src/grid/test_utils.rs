//! Test utilities for grid tests.
//!
//! Deterministic samplers and object fixtures so structure and buffer
//! layout can be checked without casting rays.

use std::sync::atomic::{AtomicUsize, Ordering};

use glam::{Vec3, Vec4};

use crate::bounds::Aabb3;
use crate::sampler::IrradianceSampler;
use crate::scene::BoundsProxy;

// =============================================================================
// Mock samplers
// =============================================================================

/// Writes the same value everywhere.
pub struct ConstantSampler {
  pub count: usize,
  pub value: Vec4,
}

impl ConstantSampler {
  pub fn new(count: usize, value: Vec4) -> Self {
    Self { count, value }
  }
}

impl IrradianceSampler for ConstantSampler {
  fn directions_count(&self) -> usize {
    self.count
  }

  fn sample(&self, _point: Vec3, out: &mut [Vec4]) {
    out.fill(self.value);
  }
}

/// Writes the sampled position (w = 0) so tests can tell which point landed
/// in which slot.
pub struct PositionSampler {
  pub count: usize,
}

impl IrradianceSampler for PositionSampler {
  fn directions_count(&self) -> usize {
    self.count
  }

  fn sample(&self, point: Vec3, out: &mut [Vec4]) {
    // Shift by a constant so positions stay non-negative in the unit fixtures.
    out.fill((point + Vec3::splat(100.0)).extend(0.0));
  }
}

/// Counts calls; writes zeros.
pub struct CountingSampler {
  pub count: usize,
  pub calls: AtomicUsize,
}

impl CountingSampler {
  pub fn new(count: usize) -> Self {
    Self { count, calls: AtomicUsize::new(0) }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::Relaxed)
  }
}

impl IrradianceSampler for CountingSampler {
  fn directions_count(&self) -> usize {
    self.count
  }

  fn sample(&self, _point: Vec3, out: &mut [Vec4]) {
    self.calls.fetch_add(1, Ordering::Relaxed);
    out.fill(Vec4::ZERO);
  }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn unit_bounds() -> Aabb3 {
  Aabb3::new(Vec3::ZERO, Vec3::ONE)
}

/// Proxy covering the whole unit cube.
pub fn covering_proxy() -> BoundsProxy {
  BoundsProxy::new(Aabb3::new(Vec3::splat(-0.5), Vec3::splat(1.5)))
}

/// Small proxy strictly inside the cell at the unit cube's minimum corner.
pub fn corner_proxy() -> BoundsProxy {
  BoundsProxy::new(Aabb3::new(Vec3::splat(0.1), Vec3::splat(0.2)))
}

/// Small proxy strictly inside the cell at the unit cube's maximum corner.
pub fn far_corner_proxy() -> BoundsProxy {
  BoundsProxy::new(Aabb3::new(Vec3::splat(0.8), Vec3::splat(0.9)))
}
