//! Reference scene shapes: a planar wall, a six-walled room and a bounds-only
//! proxy for dynamic content.

use glam::Vec3;

use super::{nearest_hit, Ray, RayHit, Reflection, ShadeableObject, Surface};
use crate::bounds::Aabb3;
use crate::transform::GridTransform;

/// Tolerance for the in-quad check; planes parallel to an axis have zero-width
/// bounds on that axis.
const WALL_EPSILON: f32 = 1e-4;

// =============================================================================
// Wall
// =============================================================================

/// Double-sided planar quad.
#[derive(Clone, Debug)]
pub struct Wall {
  surface: Surface,
  plane_point: Vec3,
  normal: Vec3,
  bounds: Aabb3,
}

impl Wall {
  /// Build a wall from four coplanar local-space vertices.
  ///
  /// The plane normal follows the winding of the first three vertices.
  pub fn new(vertices: [Vec3; 4], surface: Surface, transform: &GridTransform) -> Self {
    let local_normal = (vertices[1] - vertices[0])
      .cross(vertices[2] - vertices[0])
      .normalize();
    let world = vertices.map(|v| transform.transform_point(v));
    let bounds = Aabb3::from_points(world).unwrap_or(Aabb3::new(world[0], world[0]));

    Self {
      surface,
      plane_point: world[0],
      normal: transform.transform_normal(local_normal),
      bounds,
    }
  }

  #[inline]
  pub fn surface(&self) -> &Surface {
    &self.surface
  }

  /// World-space plane normal.
  #[inline]
  pub fn normal(&self) -> Vec3 {
    self.normal
  }
}

impl ShadeableObject for Wall {
  fn transformed_bounding_volume(&self) -> Aabb3 {
    self.bounds
  }

  fn cast_ray(&self, ray: &Ray) -> Option<RayHit<'_>> {
    let mut normal = self.normal;
    let mut facing = ray.direction().dot(normal);
    if facing == 0.0 {
      return None;
    }
    // Both faces are hittable; reflect about the one facing the ray.
    if facing > 0.0 {
      normal = -normal;
      facing = -facing;
    }

    let t = (self.plane_point - ray.origin()).dot(normal) / facing;
    if !t.is_finite() || t <= 0.0 {
      return None;
    }

    let point = ray.at(t);
    if !self.bounds.contains_point_eps(point, WALL_EPSILON) {
      return None;
    }

    Some(RayHit::new(
      t,
      point,
      &self.surface,
      Reflection::new(normal, ray.direction()),
    ))
  }
}

// =============================================================================
// Room
// =============================================================================

/// Closed box of six walls seen from the inside.
///
/// Wall order: left (-X), right (+X), back (-Z), top (+Y), bottom (-Y),
/// front (+Z).
#[derive(Clone, Debug)]
pub struct Room {
  walls: [Wall; 6],
  bounds: Aabb3,
  transform: GridTransform,
}

impl Room {
  /// Default room scale.
  pub const DEFAULT_SCALE: f32 = 15.5;

  /// Local half extent of the room's bounding volume, slightly inside the
  /// walls so the walls themselves do not drive subdivision.
  const BOUNDS_HALF_EXTENT: f32 = 0.49;

  /// Red left wall, blue right wall, grey elsewhere.
  pub fn new(transform: GridTransform) -> Self {
    let grey = Surface::with_radiance(Vec3::splat(0.4));
    Self::with_surfaces(
      transform,
      [
        Surface::with_radiance(Vec3::new(0.4, 0.0, 0.0)),
        Surface::with_radiance(Vec3::new(0.0, 0.0, 0.7)),
        grey,
        grey,
        grey,
        grey,
      ],
    )
  }

  /// Unit room scaled by [`Self::DEFAULT_SCALE`] around the origin.
  pub fn with_default_scale() -> Self {
    Self::new(GridTransform::from_scale(Self::DEFAULT_SCALE))
  }

  /// Room with one surface per wall, in wall order.
  pub fn with_surfaces(transform: GridTransform, surfaces: [Surface; 6]) -> Self {
    let [left, right, back, top, bottom, front] = surfaces;
    let v = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
    let walls = [
      Wall::new(
        [v(-0.5, -0.5, 0.5), v(-0.5, 0.5, 0.5), v(-0.5, -0.5, -0.5), v(-0.5, 0.5, -0.5)],
        left,
        &transform,
      ),
      Wall::new(
        [v(0.5, -0.5, -0.5), v(0.5, 0.5, -0.5), v(0.5, -0.5, 0.5), v(0.5, 0.5, 0.5)],
        right,
        &transform,
      ),
      Wall::new(
        [v(-0.5, -0.5, -0.5), v(-0.5, 0.5, -0.5), v(0.5, -0.5, -0.5), v(0.5, 0.5, -0.5)],
        back,
        &transform,
      ),
      Wall::new(
        [v(-0.5, 0.5, 0.5), v(-0.5, 0.5, -0.5), v(0.5, 0.5, 0.5), v(0.5, 0.5, -0.5)],
        top,
        &transform,
      ),
      Wall::new(
        [v(-0.5, -0.5, 0.5), v(-0.5, -0.5, -0.5), v(0.5, -0.5, 0.5), v(0.5, -0.5, -0.5)],
        bottom,
        &transform,
      ),
      Wall::new(
        [v(-0.5, -0.5, 0.5), v(0.5, -0.5, 0.5), v(-0.5, 0.5, 0.5), v(0.5, 0.5, 0.5)],
        front,
        &transform,
      ),
    ];

    Self {
      walls,
      bounds: Aabb3::from_center_half_extents(Vec3::ZERO, Vec3::splat(Self::BOUNDS_HALF_EXTENT)),
      transform,
    }
  }

  #[inline]
  pub fn walls(&self) -> &[Wall; 6] {
    &self.walls
  }

  #[inline]
  pub fn transform(&self) -> &GridTransform {
    &self.transform
  }
}

impl ShadeableObject for Room {
  fn transformed_bounding_volume(&self) -> Aabb3 {
    self.bounds.transformed(&self.transform)
  }

  fn cast_ray(&self, ray: &Ray) -> Option<RayHit<'_>> {
    nearest_hit(&self.walls, ray)
  }
}

// =============================================================================
// BoundsProxy
// =============================================================================

/// Dynamic object known only by its world-space bounds.
///
/// Drives grid subdivision without contributing radiance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundsProxy {
  pub bounds: Aabb3,
}

impl BoundsProxy {
  pub fn new(bounds: Aabb3) -> Self {
    Self { bounds }
  }

  pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
    Self::new(Aabb3::from_center_half_extents(center, half_extents))
  }
}

impl ShadeableObject for BoundsProxy {
  fn transformed_bounding_volume(&self) -> Aabb3 {
    self.bounds
  }

  fn cast_ray(&self, _ray: &Ray) -> Option<RayHit<'_>> {
    None
  }
}

#[cfg(test)]
#[path = "shapes_test.rs"]
mod shapes_test;
