//! Scene contracts the grid and the sampler rely on.
//!
//! Objects are plain types implementing [`ShadeableObject`]; the grid only
//! needs their transformed bounds and the sampler only needs ray hits.

pub mod shapes;

use glam::Vec3;

use crate::bounds::Aabb3;

pub use shapes::{BoundsProxy, Room, Wall};

// =============================================================================
// Ray
// =============================================================================

/// Ray with a normalized direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
  origin: Vec3,
  direction: Vec3,
}

impl Ray {
  /// Create a ray; the direction is normalized.
  ///
  /// # Panics
  /// Debug-asserts that the direction is not zero.
  pub fn new(origin: Vec3, direction: Vec3) -> Self {
    debug_assert!(direction.length_squared() > 0.0, "ray direction must not be zero");
    Self {
      origin,
      direction: direction.normalize(),
    }
  }

  #[inline]
  pub fn origin(&self) -> Vec3 {
    self.origin
  }

  #[inline]
  pub fn direction(&self) -> Vec3 {
    self.direction
  }

  /// Point at parameter `t` along the ray.
  #[inline]
  pub fn at(&self, t: f32) -> Vec3 {
    self.origin + self.direction * t
  }
}

// =============================================================================
// Surface / hits
// =============================================================================

/// Surface description with an optional emitted or reflected radiance.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Surface {
  pub radiance: Option<Vec3>,
}

impl Surface {
  /// Surface that contributes no radiance.
  pub const DARK: Self = Self { radiance: None };

  /// Surface with the given RGB radiance.
  ///
  /// # Panics
  /// Debug-asserts that every component is non-negative.
  pub fn with_radiance(radiance: Vec3) -> Self {
    debug_assert!(radiance.cmpge(Vec3::ZERO).all(), "radiance must be non-negative, got {radiance}");
    Self {
      radiance: Some(radiance),
    }
  }
}

/// Reflected direction, computed only when asked for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reflection {
  normal: Vec3,
  incident: Vec3,
}

impl Reflection {
  pub fn new(normal: Vec3, incident: Vec3) -> Self {
    Self { normal, incident }
  }

  /// Normalized mirror direction of the incident ray about the normal.
  pub fn direction(&self) -> Vec3 {
    (self.incident - 2.0 * self.incident.dot(self.normal) * self.normal).normalize_or_zero()
  }
}

/// Nearest intersection of a ray with an object.
#[derive(Clone, Copy, Debug)]
pub struct RayHit<'a> {
  /// Distance from the ray origin, always `> 0`.
  pub distance: f32,
  /// World-space hit point.
  pub point: Vec3,
  /// Surface that was hit.
  pub surface: &'a Surface,
  /// Lazily evaluated reflection direction.
  pub reflection: Reflection,
}

impl<'a> RayHit<'a> {
  pub fn new(distance: f32, point: Vec3, surface: &'a Surface, reflection: Reflection) -> Self {
    debug_assert!(distance > 0.0, "ray hits must lie in front of the origin");
    Self {
      distance,
      point,
      surface,
      reflection,
    }
  }
}

// =============================================================================
// ShadeableObject
// =============================================================================

/// Anything the grid subdivides around or the sampler casts rays against.
pub trait ShadeableObject: Send + Sync {
  /// World-space bounds used to decide which cells need a finer subgrid.
  fn transformed_bounding_volume(&self) -> Aabb3;

  /// Closest hit of the ray with this object, if any.
  fn cast_ray(&self, ray: &Ray) -> Option<RayHit<'_>>;
}

impl<T: ShadeableObject + ?Sized> ShadeableObject for &T {
  fn transformed_bounding_volume(&self) -> Aabb3 {
    (**self).transformed_bounding_volume()
  }

  fn cast_ray(&self, ray: &Ray) -> Option<RayHit<'_>> {
    (**self).cast_ray(ray)
  }
}

impl<T: ShadeableObject + ?Sized> ShadeableObject for Box<T> {
  fn transformed_bounding_volume(&self) -> Aabb3 {
    (**self).transformed_bounding_volume()
  }

  fn cast_ray(&self, ray: &Ray) -> Option<RayHit<'_>> {
    (**self).cast_ray(ray)
  }
}

/// Closest hit among `objects`. Ties keep the first object that reported the
/// distance.
pub fn nearest_hit<'a, O: ShadeableObject>(objects: &'a [O], ray: &Ray) -> Option<RayHit<'a>> {
  let mut nearest: Option<RayHit<'a>> = None;
  for object in objects {
    if let Some(hit) = object.cast_ray(ray) {
      if nearest.as_ref().map_or(true, |n| hit.distance < n.distance) {
        nearest = Some(hit);
      }
    }
  }
  nearest
}
