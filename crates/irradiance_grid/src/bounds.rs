//! Axis-aligned bounding volume used for cells and scene objects.

use glam::Vec3;

use crate::transform::GridTransform;

/// Single-precision axis-aligned bounding box.
///
/// Immutable once built: transforms derive a new box instead of mutating.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb3 {
  /// Minimum corner (inclusive).
  pub min: Vec3,
  /// Maximum corner (inclusive).
  pub max: Vec3,
}

impl Aabb3 {
  /// Create a new box from min and max corners.
  ///
  /// # Panics
  /// Debug-asserts that min <= max on all axes.
  pub fn new(min: Vec3, max: Vec3) -> Self {
    debug_assert!(
      min.cmple(max).all(),
      "Aabb3 min must be <= max on all axes (min {min}, max {max})"
    );
    Self { min, max }
  }

  /// Create a box from two opposite corners in any order.
  pub fn from_corners(a: Vec3, b: Vec3) -> Self {
    Self {
      min: a.min(b),
      max: a.max(b),
    }
  }

  /// Create a box from center and half-extents.
  pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
    Self::new(center - half_extents, center + half_extents)
  }

  /// Smallest box enclosing every point. `None` for an empty set.
  pub fn from_points<I>(points: I) -> Option<Self>
  where
    I: IntoIterator<Item = Vec3>,
  {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
    Some(Self { min, max })
  }

  /// Check if this box intersects another.
  ///
  /// Touching boxes count as intersecting, including degenerate (flat) ones.
  #[inline]
  pub fn intersects(&self, other: &Aabb3) -> bool {
    self.max.cmpge(other.min).all() && other.max.cmpge(self.min).all()
  }

  /// Check if this box contains a point (boundary inclusive).
  #[inline]
  pub fn contains_point(&self, point: Vec3) -> bool {
    point.cmpge(self.min).all() && point.cmple(self.max).all()
  }

  /// Same check with a tolerance added on every side.
  #[inline]
  pub fn contains_point_eps(&self, point: Vec3, epsilon: f32) -> bool {
    point.cmpge(self.min - epsilon).all() && point.cmple(self.max + epsilon).all()
  }

  /// Size of the box (max - min).
  #[inline]
  pub fn size(&self) -> Vec3 {
    self.max - self.min
  }

  /// Center of the box.
  #[inline]
  pub fn center(&self) -> Vec3 {
    (self.min + self.max) * 0.5
  }

  /// Map both corners through the transform's axis-aligned matrix.
  ///
  /// The rotation is ignored so the result stays axis-aligned. Negative scales
  /// are handled by reordering the corners.
  pub fn transformed(&self, transform: &GridTransform) -> Aabb3 {
    let m = transform.aa_matrix();
    Aabb3::from_corners(m.transform_point3(self.min), m.transform_point3(self.max))
  }
}
