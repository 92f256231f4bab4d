//! SubGrid - one level of the adaptive hierarchy.
//!
//! A subgrid slices its bounds into `division` cells per axis. Cells that
//! overlap a scene object get a child subgrid one level deeper, up to the
//! grid's maximum level.
//!
//! ```text
//! level 0   +-----+-----+
//!           |     |  x  |    x = object
//!           +-----+--+--+
//! level 1   |     |  |x |
//!           +-----+--+--+
//! ```
//!
//! Cells are stored x-major, then y, then z.

use glam::{IVec3, Vec3};
use smallvec::SmallVec;

use super::cell::{Cell, corner_position};
use super::data::GridData;
use crate::bounds::Aabb3;
use crate::gpu::GpuBuffer;
use crate::scene::ShadeableObject;
use crate::transform::GridTransform;

/// Per-cell flags; 64 covers divisions up to 4x4x4 without spilling.
type CellFlags = SmallVec<[bool; 64]>;

#[derive(Debug)]
pub struct SubGrid {
  level: i32,
  index: u32,
  bounds: Aabb3,
  division: IVec3,
  cells: Vec<Cell>,
}

/// Plane coordinates along one axis: accumulated from `min`, last pinned to
/// `max`. Shared planes of neighbouring subgrids come out bit-identical.
fn lattice_planes(min: f32, max: f32, segments: i32) -> SmallVec<[f32; 9]> {
  let step = (max - min) / segments as f32;
  let mut planes = SmallVec::with_capacity(segments as usize + 1);
  let mut value = min;
  for _ in 0..segments {
    planes.push(value);
    value += step;
  }
  planes.push(max);
  planes
}

impl SubGrid {
  /// Build the cells of a subgrid covering `bounds` and take an index.
  ///
  /// # Panics
  /// Panics if any division component is not positive.
  pub(crate) fn new<B: GpuBuffer>(level: i32, bounds: Aabb3, data: &mut GridData<B>) -> Self {
    let division = data.division();
    assert!(division.cmpgt(IVec3::ZERO).all(), "grid division must be positive, got {division}");

    let index = data.subgrid_indices.acquire();
    let xs = lattice_planes(bounds.min.x, bounds.max.x, division.x);
    let ys = lattice_planes(bounds.min.y, bounds.max.y, division.y);
    let zs = lattice_planes(bounds.min.z, bounds.max.z, division.z);

    let mut cells = Vec::with_capacity((division.x * division.y * division.z) as usize);
    for x in 0..division.x as usize {
      for y in 0..division.y as usize {
        for z in 0..division.z as usize {
          let cell_bounds = Aabb3::new(
            Vec3::new(xs[x], ys[y], zs[z]),
            Vec3::new(xs[x + 1], ys[y + 1], zs[z + 1]),
          );
          let position = IVec3::new(x as i32, y as i32, z as i32);
          cells.push(Cell::new(cell_bounds, position, data));
        }
      }
    }

    tracing::trace!(level, index, %division, "subgrid created");
    Self { level, index, bounds, division, cells }
  }

  /// Release every corner and index of this subgrid and its descendants.
  pub(crate) fn destroy<B: GpuBuffer>(self, data: &mut GridData<B>) {
    tracing::trace!(level = self.level, index = self.index, "subgrid destroyed");
    data.subgrid_indices.release(self.index);
    for cell in self.cells {
      cell.destroy(data);
    }
  }

  /// Add or remove children so that exactly the cells overlapping an object
  /// are subdivided. Returns whether anything changed at any depth.
  pub(crate) fn update_structure<O, B>(&mut self, objects: &[O], data: &mut GridData<B>) -> bool
  where
    O: ShadeableObject,
    B: GpuBuffer,
  {
    if self.level >= data.max_level() {
      return false;
    }

    let has_child: CellFlags = self.cells.iter().map(|cell| cell.child.is_some()).collect();
    let needs_child = self.cells_needing_children(objects);

    let mut changed = false;
    for (i, cell) in self.cells.iter_mut().enumerate() {
      match (has_child[i], needs_child[i]) {
        (true, false) => {
          if let Some(child) = cell.child.take() {
            child.destroy(data);
          }
          changed = true;
        }
        (false, true) => {
          let child = SubGrid::new(self.level + 1, *cell.bounds(), data);
          cell.child = Some(Box::new(child));
          changed = true;
        }
        _ => {}
      }
    }

    for cell in &mut self.cells {
      if let Some(child) = cell.child.as_mut() {
        changed |= child.update_structure(objects, data);
      }
    }
    changed
  }

  fn cells_needing_children<O: ShadeableObject>(&self, objects: &[O]) -> CellFlags {
    let mut needs: CellFlags = SmallVec::from_elem(false, self.cells.len());
    let mut remaining = self.cells.len();
    for object in objects {
      let volume = object.transformed_bounding_volume();
      for (flag, cell) in needs.iter_mut().zip(&self.cells) {
        if !*flag && cell.transformed_bounds().intersects(&volume) {
          *flag = true;
          remaining -= 1;
        }
      }
      if remaining == 0 {
        break;
      }
    }
    needs
  }

  /// Pack this subtree's indices into the allocator's live range and write
  /// the corner slots and parent cells of every subgrid.
  pub(crate) fn correct_indexes<B: GpuBuffer>(&mut self, data: &mut GridData<B>) {
    self.index = data.subgrid_indices.correct(self.index);

    let subgrid = self.index as usize;
    for cell in &self.cells {
      for (corner, &handle) in cell.corners().iter().enumerate() {
        let slot = data.cache.slot_of(handle);
        data.info.set_cell_offset(subgrid, cell.position(), corner, slot);
      }
    }

    let d = self.division;
    let cells_per_subgrid = (d.x * d.y * d.z) as u32;
    for cell in &mut self.cells {
      let p = cell.position();
      let Some(child) = cell.child.as_mut() else {
        continue;
      };
      child.correct_indexes(data);
      let local = (p.x * d.y * d.z + p.y * d.z + p.z) as u32;
      data.set_parent_cell(child.index, self.index * cells_per_subgrid + local);
    }
  }

  pub(crate) fn apply_transform(&mut self, transform: &GridTransform) {
    for cell in &mut self.cells {
      cell.apply_transform(transform);
    }
  }

  #[inline]
  pub fn level(&self) -> i32 {
    self.level
  }

  /// Dense index; the root is always 0.
  #[inline]
  pub fn index(&self) -> u32 {
    self.index
  }

  #[inline]
  pub fn bounds(&self) -> &Aabb3 {
    &self.bounds
  }

  #[inline]
  pub fn division(&self) -> IVec3 {
    self.division
  }

  #[inline]
  pub fn cells(&self) -> &[Cell] {
    &self.cells
  }

  /// Cell at a lattice coordinate.
  pub fn cell(&self, position: IVec3) -> Option<&Cell> {
    let d = self.division;
    if position.cmplt(IVec3::ZERO).any() || position.cmpge(d).any() {
      return None;
    }
    self.cells.get((position.x * d.y * d.z + position.y * d.z + position.z) as usize)
  }

  /// This subgrid plus all descendants.
  pub fn subgrid_count(&self) -> usize {
    1 + self
      .cells
      .iter()
      .filter_map(Cell::child)
      .map(SubGrid::subgrid_count)
      .sum::<usize>()
  }

  /// Deepest level reached below (or at) this subgrid.
  pub fn depth(&self) -> i32 {
    self
      .cells
      .iter()
      .filter_map(Cell::child)
      .map(SubGrid::depth)
      .max()
      .unwrap_or(self.level)
  }

  /// Visit this subgrid and every descendant, parents first.
  pub fn for_each(&self, visit: &mut impl FnMut(&SubGrid)) {
    visit(self);
    for child in self.cells.iter().filter_map(Cell::child) {
      child.for_each(visit);
    }
  }

  /// Sample positions of one cell's corners, in corner order.
  pub fn corner_positions(cell: &Cell) -> [Vec3; 8] {
    std::array::from_fn(|k| corner_position(cell.bounds(), k))
  }
}

#[cfg(test)]
#[path = "subgrid_test.rs"]
mod subgrid_test;
