use super::*;

use std::collections::HashSet;

use crate::gpu::{GridBuffers, HostBuffer};
use crate::grid::test_utils::*;
use crate::scene::BoundsProxy;

fn grid_data(max_level: i32) -> GridData<HostBuffer> {
  GridData::new(
    unit_bounds(),
    GridTransform::IDENTITY,
    IVec3::splat(2),
    max_level,
    false,
    GridBuffers::host(),
  )
  .unwrap()
}

fn root(data: &mut GridData<HostBuffer>) -> SubGrid {
  SubGrid::new(0, unit_bounds(), data)
}

// =========================================================================
// Construction
// =========================================================================

#[test]
fn test_lattice_planes_pin_last_plane() {
  let planes = lattice_planes(0.1, 0.7, 3);
  assert_eq!(planes.len(), 4);
  assert_eq!(planes[0], 0.1);
  assert_eq!(planes[3], 0.7);
  assert!(planes.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_root_cells_share_corners() {
  let mut data = grid_data(0);
  let root = root(&mut data);

  assert_eq!(root.index(), 0);
  assert_eq!(root.cells().len(), 8);
  assert_eq!(data.cache.live_count(), 27);

  let handles: HashSet<_> = root.cells().iter().flat_map(|c| c.corners().iter().copied()).collect();
  assert_eq!(handles.len(), 27);

  // The centre point is shared by all eight cells.
  let centre = data.cache.find(Vec3::splat(0.5)).unwrap();
  assert_eq!(data.cache.get(centre).ref_count(), 8);
  data.cache.debug_validate();
}

#[test]
fn test_cells_are_x_major() {
  let mut data = grid_data(0);
  let root = root(&mut data);
  let positions: Vec<IVec3> = root.cells().iter().map(Cell::position).collect();
  assert_eq!(positions[1], IVec3::new(0, 0, 1));
  assert_eq!(positions[2], IVec3::new(0, 1, 0));
  assert_eq!(positions[4], IVec3::new(1, 0, 0));
  assert_eq!(root.cell(IVec3::new(1, 0, 1)).unwrap().bounds().min, Vec3::new(0.5, 0.0, 0.5));
  assert!(root.cell(IVec3::new(2, 0, 0)).is_none());
}

#[test]
fn test_corner_order() {
  let mut data = grid_data(0);
  let root = root(&mut data);
  let cell = &root.cells()[0];
  let corners = SubGrid::corner_positions(cell);
  assert_eq!(corners[0], Vec3::ZERO);
  assert_eq!(corners[0b001], Vec3::new(0.0, 0.0, 0.5));
  assert_eq!(corners[0b010], Vec3::new(0.0, 0.5, 0.0));
  assert_eq!(corners[0b100], Vec3::new(0.5, 0.0, 0.0));
  assert_eq!(corners[0b111], Vec3::splat(0.5));
  for (k, handle) in cell.corners().iter().enumerate() {
    assert_eq!(data.cache.get(*handle).position(), corners[k]);
  }
}

#[test]
#[should_panic(expected = "grid division must be positive")]
fn test_zero_division_panics() {
  let mut data = GridData::new(
    unit_bounds(),
    GridTransform::IDENTITY,
    IVec3::new(2, 0, 2),
    0,
    false,
    GridBuffers::host(),
  )
  .unwrap();
  let _ = SubGrid::new(0, unit_bounds(), &mut data);
}

// =========================================================================
// Structure updates
// =========================================================================

#[test]
fn test_no_subdivision_at_max_level() {
  let mut data = grid_data(0);
  let mut root = root(&mut data);
  assert!(!root.update_structure(&[covering_proxy()], &mut data));
  assert_eq!(root.subgrid_count(), 1);
}

#[test]
fn test_subdivides_only_overlapping_cells() {
  let mut data = grid_data(1);
  let mut root = root(&mut data);
  assert!(root.update_structure(&[corner_proxy()], &mut data));

  assert!(root.cells()[0].child().is_some());
  assert!(root.cells()[1..].iter().all(|c| c.child().is_none()));
  assert_eq!(root.subgrid_count(), 2);
  assert_eq!(data.subgrid_count(), 2);
  assert_eq!(root.depth(), 1);

  // The child reuses the parent's corner points.
  assert_eq!(data.cache.live_count(), 27 + 27 - 8);
}

#[test]
fn test_update_structure_is_idempotent() {
  let mut data = grid_data(2);
  let mut root = root(&mut data);
  let objects = [corner_proxy(), far_corner_proxy()];
  assert!(root.update_structure(&objects, &mut data));
  let live = data.cache.live_count();
  assert!(!root.update_structure(&objects, &mut data));
  assert_eq!(data.cache.live_count(), live);
  assert_eq!(root.subgrid_count(), 5);
  assert_eq!(root.depth(), 2);
}

#[test]
fn test_empty_objects_remove_children() {
  let mut data = grid_data(2);
  let mut root = root(&mut data);
  root.update_structure(&[corner_proxy()], &mut data);
  assert!(root.update_structure::<BoundsProxy, _>(&[], &mut data));
  assert_eq!(root.subgrid_count(), 1);
  assert_eq!(data.subgrid_count(), 1);

  let stats = data.cache.compact();
  assert_eq!(stats.removed, (27 - 8) + (27 - 8));
  assert_eq!(data.cache.live_count(), 27);
  data.cache.debug_validate();
}

#[test]
fn test_covering_object_subdivides_every_cell() {
  let mut data = grid_data(1);
  let mut root = root(&mut data);
  root.update_structure(&[covering_proxy()], &mut data);
  assert_eq!(root.subgrid_count(), 9);
  // A 4x4x4 lattice of cells: 5^3 points.
  assert_eq!(data.cache.live_count(), 125);
}

#[test]
fn test_destroy_releases_everything() {
  let mut data = grid_data(1);
  let mut root = root(&mut data);
  root.update_structure(&[corner_proxy()], &mut data);
  root.destroy(&mut data);
  assert_eq!(data.subgrid_count(), 0);
  assert!(data.cache.iter().all(|point| point.ref_count() == 0));
  data.cache.compact();
  assert!(data.cache.is_empty());
}

// =========================================================================
// Index correction
// =========================================================================

#[test]
fn test_correct_indexes_packs_subgrids() {
  let mut data = grid_data(1);
  let mut root = root(&mut data);
  // Children for cells 0 and 7 get indices 1 and 2.
  root.update_structure(&[corner_proxy(), far_corner_proxy()], &mut data);
  // Drop the first child; index 1 becomes a hole.
  root.update_structure(&[far_corner_proxy()], &mut data);
  assert_eq!(root.cells()[7].child().unwrap().index(), 2);

  data.cache.compact();
  data.prepare_indices(data.subgrid_count()).unwrap();
  root.correct_indexes(&mut data);
  data.subgrid_indices.settle();

  assert_eq!(root.index(), 0);
  assert_eq!(root.cells()[7].child().unwrap().index(), 1);
  assert_eq!(data.subgrid_indices.holes(), 0);
  // Parent cell of subgrid 1 is global cell 7 of the root.
  assert_eq!(data.subgrid_info()[0], 7);
}

#[test]
fn test_transform_moves_cell_bounds() {
  let mut data = grid_data(0);
  let mut root = root(&mut data);
  root.apply_transform(&GridTransform::from_translation(Vec3::new(10.0, 0.0, 0.0)));
  let cell = &root.cells()[0];
  assert_eq!(cell.bounds().min, Vec3::ZERO);
  assert_eq!(cell.transformed_bounds().min, Vec3::new(10.0, 0.0, 0.0));
}
