//! Cosine-weighted irradiance integration over a direction set.
//!
//! Input is an interleaved buffer of `N` `(direction, radiance)` pairs, both
//! stored as `Vec4` with `w = 0`. For every direction `i`:
//!
//! ```text
//! irradiance[i] = (4 pi / N) * sum_j max(0, dir_i . dir_j) * radiance_j
//! ```
//!
//! Two implementations compute the same sums in the same order:
//! [`integrate_scalar`] works on `Vec3` components, [`integrate_vectorized`]
//! keeps the packed 4-wide tuples so every step is one SIMD operation.

use std::f32::consts::PI;

use glam::{Vec3, Vec4};

/// Which integration routine the sampler runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegrationMode {
  /// Per-component reference implementation.
  Scalar,
  /// Packed 4-wide implementation.
  Vectorized,
  /// Scalar below [`IntegrationMode::AUTO_VECTORIZE_RESOLUTION`], vectorized
  /// from there on.
  #[default]
  Auto,
}

impl IntegrationMode {
  /// First hemisphere resolution handled by the vectorized path in `Auto`.
  pub const AUTO_VECTORIZE_RESOLUTION: u32 = 15;

  /// Concrete mode for a hemisphere resolution.
  #[inline]
  pub fn resolve(self, resolution: u32) -> IntegrationMode {
    match self {
      IntegrationMode::Auto if resolution < Self::AUTO_VECTORIZE_RESOLUTION => {
        IntegrationMode::Scalar
      }
      IntegrationMode::Auto => IntegrationMode::Vectorized,
      other => other,
    }
  }
}

#[inline]
fn check_lengths(dir_radiance: &[Vec4], out: &[Vec4]) {
  assert_eq!(
    dir_radiance.len(),
    out.len() * 2,
    "direction/radiance buffer must hold two entries per output value"
  );
}

/// Reference integration on `Vec3` components.
///
/// # Panics
/// Panics if `dir_radiance.len() != 2 * out.len()`.
pub fn integrate_scalar(dir_radiance: &[Vec4], out: &mut [Vec4]) {
  check_lengths(dir_radiance, out);
  if out.is_empty() {
    return;
  }
  let scale = 4.0 * PI / out.len() as f32;

  for (i, result) in out.iter_mut().enumerate() {
    let main = dir_radiance[2 * i].truncate();
    let mut irradiance = Vec3::ZERO;
    for pair in dir_radiance.chunks_exact(2) {
      let weight = main.dot(pair[0].truncate()).max(0.0);
      irradiance += pair[1].truncate() * weight;
    }
    *result = (irradiance * scale).extend(0.0);
  }
}

/// Packed integration on `(direction | radiance)` `Vec4` tuples.
///
/// Relies on `w = 0` in both directions and radiances, which keeps the dot
/// product three-dimensional and the result's `w` at zero.
///
/// # Panics
/// Panics if `dir_radiance.len() != 2 * out.len()`.
pub fn integrate_vectorized(dir_radiance: &[Vec4], out: &mut [Vec4]) {
  check_lengths(dir_radiance, out);
  if out.is_empty() {
    return;
  }
  let scale = 4.0 * PI / out.len() as f32;
  let scale = Vec4::new(scale, scale, scale, 0.0);

  for (i, result) in out.iter_mut().enumerate() {
    let main = dir_radiance[2 * i];
    let mut irradiance = Vec4::ZERO;
    for pair in dir_radiance.chunks_exact(2) {
      let weight = main.dot(pair[0]).max(0.0);
      irradiance += pair[1] * weight;
    }
    *result = irradiance * scale;
  }
}

/// Run the routine selected by `mode` for a hemisphere `resolution`.
#[inline]
pub fn integrate(mode: IntegrationMode, resolution: u32, dir_radiance: &[Vec4], out: &mut [Vec4]) {
  match mode.resolve(resolution) {
    IntegrationMode::Vectorized => integrate_vectorized(dir_radiance, out),
    _ => integrate_scalar(dir_radiance, out),
  }
}

#[cfg(test)]
#[path = "integrate_test.rs"]
mod integrate_test;
