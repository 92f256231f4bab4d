//! Concentric square to hemisphere mapping (Shirley and Chiu).
//!
//! The square `[0, 1]^2` is recentred on `[-1, 1]^2` and split into eight
//! octants by its diagonals and axes. Each octant maps onto one eighth of the
//! upper hemisphere (+Y):
//!
//! ```text
//! theta = acos(1 - xx^2)
//! phi   = octant_offset + (pi / 4) * (yy / xx)
//! dir   = (sin(theta) cos(phi), cos(theta), sin(theta) sin(phi))
//! ```
//!
//! where `xx` is the distance from the centre along the octant's major axis
//! and `yy` the position inside the octant.

use std::f32::consts::{FRAC_PI_4, PI};

use glam::{Vec2, Vec3};

/// Angular start of octant `k` (1-based), counter-clockwise from +X.
#[inline]
fn octant_offset(k: u32) -> f32 {
  (k - 1) as f32 * FRAC_PI_4
}

/// Map a point of the unit square onto the upper unit hemisphere.
///
/// The square centre `(0.5, 0.5)` maps straight to the pole `(0, 1, 0)`.
///
/// # Panics
/// Debug-asserts that both coordinates lie in `[0, 1]`.
pub fn point_to_hemisphere(point: Vec2) -> Vec3 {
  debug_assert!(
    (0.0..=1.0).contains(&point.x) && (0.0..=1.0).contains(&point.y),
    "point must lie in the unit square, got {point}"
  );

  let p = point * 2.0 - Vec2::ONE;
  let (x, y) = (p.x, p.y);

  let (xx, yy, offset) = if y > -x {
    if y < x {
      // Octants 1 and 8
      if y > 0.0 {
        (x, y, octant_offset(1))
      } else {
        (x, x + y, octant_offset(8))
      }
    } else if x > 0.0 {
      (y, y - x, octant_offset(2))
    } else {
      (y, -x, octant_offset(3))
    }
  } else if y > x {
    // Octants 4 and 5
    if y > 0.0 {
      (-x, -x - y, octant_offset(4))
    } else {
      (-x, -y, octant_offset(5))
    }
  } else if x > 0.0 {
    (-y, x, octant_offset(7))
  } else if y != 0.0 {
    (-y, x - y, octant_offset(6))
  } else {
    // Centre of the square; the octant formula divides by zero here.
    return Vec3::Y;
  };

  // sin(theta) = xx * sqrt(2 - xx^2); acos(1 - xx^2) rounds to zero for small xx
  let cos_theta = 1.0 - xx * xx;
  let sin_theta = xx * (2.0 - xx * xx).max(0.0).sqrt();
  let phi = offset + FRAC_PI_4 * (yy / xx);
  Vec3::new(sin_theta * phi.cos(), cos_theta, sin_theta * phi.sin())
}

/// Inverse of [`point_to_hemisphere`].
///
/// Expects a unit direction with `y >= 0`. Renderers use the same inverse to
/// find the storage index of an arbitrary direction.
pub fn hemisphere_to_point(direction: Vec3) -> Vec2 {
  // 1 - y = sin^2(theta) / (1 + y), stable near the pole
  let sin_theta = (direction.x * direction.x + direction.z * direction.z).sqrt();
  let xx = sin_theta / (1.0 + direction.y).max(f32::MIN_POSITIVE).sqrt();
  if xx == 0.0 {
    return Vec2::splat(0.5);
  }

  // atan2 covers (-pi, pi]; shift the lower half to a full turn
  let phi = direction.z.atan2(direction.x);
  let angle = if phi < 0.0 { phi + 2.0 * PI } else { phi };

  let along = |k: u32| (angle - octant_offset(k)) * (xx / FRAC_PI_4);
  let p = if angle >= octant_offset(8) {
    Vec2::new(xx, along(8) - xx)
  } else if angle >= octant_offset(7) {
    Vec2::new(along(7), -xx)
  } else if angle >= octant_offset(6) {
    Vec2::new(along(6) - xx, -xx)
  } else if angle >= octant_offset(5) {
    Vec2::new(-xx, -along(5))
  } else if angle >= octant_offset(4) {
    Vec2::new(-xx, -(along(4) - xx))
  } else if angle >= octant_offset(3) {
    Vec2::new(-along(3), xx)
  } else if angle >= octant_offset(2) {
    Vec2::new(xx - along(2), xx)
  } else {
    Vec2::new(xx, along(1))
  };

  ((p + Vec2::ONE) * 0.5).clamp(Vec2::ZERO, Vec2::ONE)
}

#[cfg(test)]
#[path = "mapping_test.rs"]
mod mapping_test;
