//! GridTransform - translation, per-axis scale and a rotation about Y.

use std::ops::Add;

use glam::{Mat4, Vec3};

/// World placement of a grid or a scene object.
///
/// Two matrices are derived from the parameters:
/// - [`matrix`](Self::matrix): `translate * rotate_y * scale`, used for points.
/// - [`aa_matrix`](Self::aa_matrix): `translate * scale`, used for axis-aligned
///   bounding volumes so they stay axis-aligned.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridTransform {
  /// World-space translation.
  pub translation: Vec3,
  /// Per-axis scale.
  pub scale: Vec3,
  /// Rotation about the Y axis, in degrees.
  pub y_rotation_degrees: f32,
}

impl GridTransform {
  /// Identity transform.
  pub const IDENTITY: Self = Self {
    translation: Vec3::ZERO,
    scale: Vec3::ONE,
    y_rotation_degrees: 0.0,
  };

  pub fn new(translation: Vec3, scale: Vec3, y_rotation_degrees: f32) -> Self {
    Self {
      translation,
      scale,
      y_rotation_degrees,
    }
  }

  /// Pure translation.
  pub fn from_translation(translation: Vec3) -> Self {
    Self {
      translation,
      ..Self::IDENTITY
    }
  }

  /// Uniform scale about the origin.
  pub fn from_scale(scale: f32) -> Self {
    Self {
      scale: Vec3::splat(scale),
      ..Self::IDENTITY
    }
  }

  pub fn with_translation(mut self, translation: Vec3) -> Self {
    self.translation = translation;
    self
  }

  pub fn with_scale(mut self, scale: Vec3) -> Self {
    self.scale = scale;
    self
  }

  pub fn with_y_rotation(mut self, degrees: f32) -> Self {
    self.y_rotation_degrees = degrees;
    self
  }

  /// Full matrix: `translate * rotate_y * scale`.
  #[inline]
  pub fn matrix(&self) -> Mat4 {
    Mat4::from_translation(self.translation)
      * Mat4::from_rotation_y(self.y_rotation_degrees.to_radians())
      * Mat4::from_scale(self.scale)
  }

  /// Axis-aligned matrix: `translate * scale`. The rotation is ignored.
  #[inline]
  pub fn aa_matrix(&self) -> Mat4 {
    Mat4::from_translation(self.translation) * Mat4::from_scale(self.scale)
  }

  /// Map a point through the full matrix.
  #[inline]
  pub fn transform_point(&self, point: Vec3) -> Vec3 {
    self.matrix().transform_point3(point)
  }

  /// Map a direction through the full matrix (no translation).
  #[inline]
  pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
    self.matrix().transform_vector3(vector)
  }

  /// Map a surface normal. Uses the inverse transpose so non-uniform scales
  /// keep normals perpendicular to their surface.
  #[inline]
  pub fn transform_normal(&self, normal: Vec3) -> Vec3 {
    self
      .matrix()
      .inverse()
      .transpose()
      .transform_vector3(normal)
      .normalize_or_zero()
  }
}

impl Default for GridTransform {
  fn default() -> Self {
    Self::IDENTITY
  }
}

/// Composition: translations and angles add, scales multiply.
impl Add for GridTransform {
  type Output = GridTransform;

  fn add(self, rhs: GridTransform) -> GridTransform {
    GridTransform {
      translation: self.translation + rhs.translation,
      scale: self.scale * rhs.scale,
      y_rotation_degrees: self.y_rotation_degrees + rhs.y_rotation_degrees,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_identity_is_noop() {
    let p = Vec3::new(1.0, -2.0, 3.5);
    assert_eq!(GridTransform::IDENTITY.transform_point(p), p);
    assert_eq!(GridTransform::default().aa_matrix(), Mat4::IDENTITY);
  }

  #[test]
  fn test_scale_then_translate() {
    let t = GridTransform::new(Vec3::new(10.0, 0.0, 0.0), Vec3::splat(2.0), 0.0);
    let p = t.transform_point(Vec3::new(1.0, 1.0, 1.0));
    assert!(p.abs_diff_eq(Vec3::new(12.0, 2.0, 2.0), 1e-6));
  }

  #[test]
  fn test_y_rotation_only_in_full_matrix() {
    let t = GridTransform::IDENTITY.with_y_rotation(90.0);
    let rotated = t.transform_point(Vec3::X);
    // +X rotates onto -Z for a right-handed rotation about Y.
    assert!(rotated.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6), "got {rotated}");

    let aa = t.aa_matrix().transform_point3(Vec3::X);
    assert_eq!(aa, Vec3::X);
  }

  #[test]
  fn test_composition() {
    let a = GridTransform::new(Vec3::new(1.0, 2.0, 3.0), Vec3::splat(2.0), 30.0);
    let b = GridTransform::new(Vec3::new(-1.0, 0.0, 1.0), Vec3::new(1.0, 3.0, 0.5), 15.0);
    let c = a + b;
    assert_eq!(c.translation, Vec3::new(0.0, 2.0, 4.0));
    assert_eq!(c.scale, Vec3::new(2.0, 6.0, 1.0));
    assert_eq!(c.y_rotation_degrees, 45.0);
  }

  #[test]
  fn test_normal_stays_perpendicular_under_non_uniform_scale() {
    let t = GridTransform::IDENTITY.with_scale(Vec3::new(4.0, 1.0, 1.0));
    // Plane x + y = 0 has normal (1, 1, 0); after scaling x by 4 the plane is
    // x/4 + y = 0, whose normal is (1, 4, 0) normalized.
    let n = t.transform_normal(Vec3::new(1.0, 1.0, 0.0).normalize());
    let expected = Vec3::new(1.0, 4.0, 0.0).normalize();
    assert!(n.abs_diff_eq(expected, 1e-5), "got {n}");
  }
}
