//! SamplePoint - one deduplicated irradiance sampling position.

use glam::{Vec3, Vec4};

use crate::sampler::IrradianceSampler;
use crate::transform::GridTransform;

/// Stable handle of a sample point inside a [`SampleCache`](super::SampleCache).
///
/// Handles stay valid until the point is trimmed; slots may move on every
/// compaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleHandle(pub(crate) u32);

impl SampleHandle {
  /// Get the raw arena index.
  #[inline]
  pub fn raw(&self) -> u32 {
    self.0
  }
}

/// World position shared by every cell corner that lands on it.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplePoint {
  position: Vec3,
  transformed_position: Vec3,
  pub(crate) slot: Option<u32>,
  pub(crate) refs: u32,
  sample_count: usize,
  debug_color: Vec3,
}

impl SamplePoint {
  pub(crate) fn new(position: Vec3, transform: &GridTransform, slot: u32, debug_color: Vec3) -> Self {
    Self {
      position,
      transformed_position: transform.transform_point(position),
      slot: Some(slot),
      refs: 1,
      sample_count: 0,
      debug_color,
    }
  }

  /// Untransformed grid-space position; the dedup key.
  #[inline]
  pub fn position(&self) -> Vec3 {
    self.position
  }

  /// Position after the current grid transform.
  #[inline]
  pub fn transformed_position(&self) -> Vec3 {
    self.transformed_position
  }

  /// Dense slot in the irradiance buffer.
  #[inline]
  pub fn slot(&self) -> Option<u32> {
    self.slot
  }

  /// Number of cells currently holding this point.
  #[inline]
  pub fn ref_count(&self) -> u32 {
    self.refs
  }

  /// Values written by the last resample (0 before the first one).
  #[inline]
  pub fn sample_count(&self) -> usize {
    self.sample_count
  }

  /// Random colour shown instead of irradiance when debug colours are on.
  #[inline]
  pub fn debug_color(&self) -> Vec3 {
    self.debug_color
  }

  pub(crate) fn apply_transform(&mut self, transform: &GridTransform) {
    self.transformed_position = transform.transform_point(self.position);
  }

  pub(crate) fn set_sample_count(&mut self, count: usize) {
    self.sample_count = count;
  }

  /// Write this point's irradiance range of the dense buffer.
  ///
  /// `irradiance` is the whole dense buffer; the point writes
  /// `[slot * n, slot * n + n)` with `n = sampler.directions_count()`.
  ///
  /// # Panics
  /// Panics if the point has no slot or the buffer is too small for it.
  pub fn update<S: IrradianceSampler + ?Sized>(
    &self,
    sampler: &S,
    irradiance: &mut [Vec4],
    debug_colors: bool,
  ) {
    let Some(slot) = self.slot else {
      panic!("sample slot must be assigned before update");
    };
    let count = sampler.directions_count();
    let start = slot as usize * count;
    assert!(
      start + count <= irradiance.len(),
      "irradiance buffer too small for slot {slot}"
    );
    self.write_range(sampler, &mut irradiance[start..start + count], debug_colors);
  }

  /// Fill an already-sliced `n`-entry range.
  pub(crate) fn write_range<S: IrradianceSampler + ?Sized>(
    &self,
    sampler: &S,
    range: &mut [Vec4],
    debug_colors: bool,
  ) {
    if debug_colors {
      range.fill(self.debug_color.extend(0.0));
    } else {
      sampler.sample(self.transformed_position, range);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use crate::grid::test_utils::{ConstantSampler, CountingSampler};

  fn point(slot: Option<u32>) -> SamplePoint {
    let color = Vec3::new(0.2, 0.4, 0.6);
    SamplePoint { slot, ..SamplePoint::new(Vec3::ONE, &GridTransform::IDENTITY, 0, color) }
  }

  #[test]
  fn test_update_writes_own_range() {
    let sampler = ConstantSampler::new(2, Vec4::ONE);
    let mut buffer = vec![Vec4::ZERO; 6];
    point(Some(1)).update(&sampler, &mut buffer, false);
    assert_eq!(buffer, [Vec4::ZERO, Vec4::ZERO, Vec4::ONE, Vec4::ONE, Vec4::ZERO, Vec4::ZERO]);
  }

  #[test]
  fn test_update_debug_color_skips_sampler() {
    let sampler = CountingSampler::new(3);
    let mut buffer = vec![Vec4::ZERO; 3];
    point(Some(0)).update(&sampler, &mut buffer, true);
    assert_eq!(sampler.calls(), 0);
    assert!(buffer.iter().all(|v| *v == Vec4::new(0.2, 0.4, 0.6, 0.0)));
  }

  #[test]
  #[should_panic(expected = "sample slot must be assigned")]
  fn test_update_without_slot_panics() {
    let sampler = ConstantSampler::new(2, Vec4::ONE);
    point(None).update(&sampler, &mut [Vec4::ZERO; 4], false);
  }

  #[test]
  #[should_panic(expected = "irradiance buffer too small")]
  fn test_update_past_buffer_end_panics() {
    let sampler = ConstantSampler::new(2, Vec4::ONE);
    point(Some(2)).update(&sampler, &mut [Vec4::ZERO; 4], false);
  }
}
