//! HemisphereDirections - the fixed sampling direction set for a resolution.

use glam::{Vec2, Vec3};

use super::mapping::{hemisphere_to_point, point_to_hemisphere};

/// Full-sphere direction set built from an `R x R` grid on the unit square.
///
/// Layout (`N = 2 * R^2` entries):
/// - `[0, R^2)`: upper directions, generated column-major (column outer, row
///   inner) so entry `col * R + row` comes from cell `(col, row)`.
/// - `[R^2, 2 R^2)`: the mirrors `(x, -y, z)` of the upper entries, in the same
///   order.
#[derive(Clone, Debug)]
pub struct HemisphereDirections {
  resolution: u32,
  directions: Vec<Vec3>,
}

impl HemisphereDirections {
  /// Build the direction set for the given per-axis resolution.
  ///
  /// # Panics
  /// Panics if `resolution` is zero.
  pub fn new(resolution: u32) -> Self {
    assert!(resolution > 0, "hemisphere resolution must be positive");

    let r = resolution as usize;
    let cell = 1.0 / resolution as f32;
    let half_cell = cell * 0.5;

    let mut directions = Vec::with_capacity(2 * r * r);
    for col in 0..r {
      for row in 0..r {
        let centre = Vec2::new(col as f32, row as f32) * cell + Vec2::splat(half_cell);
        directions.push(point_to_hemisphere(centre));
      }
    }
    directions.extend_from_within(..);
    for mirrored in &mut directions[r * r..] {
      mirrored.y = -mirrored.y;
    }

    Self {
      resolution,
      directions,
    }
  }

  /// Cells per side of the square grid.
  #[inline]
  pub fn resolution(&self) -> u32 {
    self.resolution
  }

  /// All directions, upper half first.
  #[inline]
  pub fn directions(&self) -> &[Vec3] {
    &self.directions
  }

  /// Number of directions (`2 * R^2`).
  #[inline]
  pub fn len(&self) -> usize {
    self.directions.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.directions.is_empty()
  }

  /// Upper-hemisphere directions only.
  #[inline]
  pub fn upper(&self) -> &[Vec3] {
    &self.directions[..self.directions.len() / 2]
  }

  /// Storage index of the grid cell an arbitrary unit direction falls into.
  ///
  /// Lower directions are mirrored into the upper hemisphere and offset by
  /// `R^2`. Generated directions map back to their own index.
  pub fn storage_index(&self, direction: Vec3) -> usize {
    let r = self.resolution as usize;
    let (lookup, offset) = if direction.y < 0.0 {
      (Vec3::new(direction.x, -direction.y, direction.z), r * r)
    } else {
      (direction, 0)
    };

    let point = hemisphere_to_point(lookup);
    let max_cell = (r - 1) as f32;
    let col = (point.x * r as f32).floor().min(max_cell) as usize;
    let row = (point.y * r as f32).floor().min(max_cell) as usize;
    offset + col * r + row
  }
}

#[cfg(test)]
#[path = "directions_test.rs"]
mod directions_test;
