//! Cell - one lattice cell of a subgrid, owning its eight corner samples.

use glam::{IVec3, Vec3};

use super::data::GridData;
use super::sample::SampleHandle;
use super::subgrid::SubGrid;
use crate::bounds::Aabb3;
use crate::gpu::GpuBuffer;
use crate::transform::GridTransform;

/// Corner `k` of a cell: bit 2 selects max x, bit 1 max y, bit 0 max z.
#[inline]
pub fn corner_position(bounds: &Aabb3, corner: usize) -> Vec3 {
  debug_assert!(corner < 8);
  Vec3::new(
    if corner & 0b100 != 0 { bounds.max.x } else { bounds.min.x },
    if corner & 0b010 != 0 { bounds.max.y } else { bounds.min.y },
    if corner & 0b001 != 0 { bounds.max.z } else { bounds.min.z },
  )
}

#[derive(Debug)]
pub struct Cell {
  bounds: Aabb3,
  transformed_bounds: Aabb3,
  corners: [SampleHandle; 8],
  position: IVec3,
  pub(crate) child: Option<Box<SubGrid>>,
}

impl Cell {
  /// Take a reference on all eight corners.
  pub(crate) fn new<B: GpuBuffer>(bounds: Aabb3, position: IVec3, data: &mut GridData<B>) -> Self {
    let transform = *data.transform();
    let corners =
      std::array::from_fn(|k| data.cache.get_or_create(corner_position(&bounds, k), &transform));
    Self {
      bounds,
      transformed_bounds: bounds.transformed(&transform),
      corners,
      position,
      child: None,
    }
  }

  /// Release the corners and tear down the child, if any.
  pub(crate) fn destroy<B: GpuBuffer>(self, data: &mut GridData<B>) {
    for handle in self.corners {
      data.cache.release(handle);
    }
    if let Some(child) = self.child {
      child.destroy(data);
    }
  }

  pub(crate) fn apply_transform(&mut self, transform: &GridTransform) {
    self.transformed_bounds = self.bounds.transformed(transform);
    if let Some(child) = self.child.as_mut() {
      child.apply_transform(transform);
    }
  }

  #[inline]
  pub fn bounds(&self) -> &Aabb3 {
    &self.bounds
  }

  #[inline]
  pub fn transformed_bounds(&self) -> &Aabb3 {
    &self.transformed_bounds
  }

  #[inline]
  pub fn corners(&self) -> &[SampleHandle; 8] {
    &self.corners
  }

  /// Lattice coordinate inside the owning subgrid.
  #[inline]
  pub fn position(&self) -> IVec3 {
    self.position
  }

  #[inline]
  pub fn child(&self) -> Option<&SubGrid> {
    self.child.as_deref()
  }
}
