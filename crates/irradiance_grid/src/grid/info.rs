//! Grid info buffer: a fixed header followed by the corner to slot mapping.
//!
//! ```text
//! byte 0    GridInfoHeader (128 bytes)
//! byte 128  i32 mapping[subgrid][x][y][z][corner]
//! ```
//!
//! A renderer finds the 8 sample slots of any cell with one lookup, then
//! reads `N` irradiance values per slot.

use bytemuck::{Pod, Zeroable};
use glam::{IVec3, Vec3};

use crate::bounds::Aabb3;
use crate::error::{BufferKind, GridError};
use crate::gpu::{ensure_size, GpuBuffer};
use crate::transform::GridTransform;

/// Corner slots stored per cell.
pub const CORNERS_PER_CELL: usize = 8;

/// Header at the start of the grid info buffer. Layout matches a std430
/// struct of four `vec4`-aligned rows plus a `mat4`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GridInfoHeader {
  pub grid_min: [f32; 3],
  _pad0: f32,
  pub grid_max: [f32; 3],
  _pad1: f32,
  pub cells_per_dimension: [i32; 3],
  _pad2: i32,
  /// Column-major grid transform matrix.
  pub transform: [f32; 16],
  pub samples_per_point: i32,
  _pad3: [i32; 3],
}

impl GridInfoHeader {
  /// Size in bytes; the mapping starts right after it.
  pub const SIZE: usize = std::mem::size_of::<Self>();
}

const _: () = assert!(GridInfoHeader::SIZE == 128);

/// Host copy of the grid info buffer, mirrored into a [`GpuBuffer`].
#[derive(Debug)]
pub struct GridInfoBuffer<B> {
  header: GridInfoHeader,
  mapping: Vec<i32>,
  division: IVec3,
  sink: B,
}

impl<B: GpuBuffer> GridInfoBuffer<B> {
  /// Write the initial header into `sink`.
  pub fn new(
    mut sink: B,
    bounds: Aabb3,
    division: IVec3,
    transform: &GridTransform,
  ) -> Result<Self, GridError> {
    ensure_size(&mut sink, BufferKind::GridInfo, GridInfoHeader::SIZE)?;
    let mut buffer = Self {
      header: GridInfoHeader::zeroed(),
      mapping: Vec::new(),
      division,
      sink,
    };
    buffer.header.grid_min = bounds.min.to_array();
    buffer.header.grid_max = bounds.max.to_array();
    buffer.header.cells_per_dimension = division.to_array();
    buffer.header.transform = transform.matrix().to_cols_array();
    buffer.flush_header();
    Ok(buffer)
  }

  #[inline]
  pub fn header(&self) -> &GridInfoHeader {
    &self.header
  }

  /// Host copy of the mapping. Only the first
  /// `subgrid_count * cells_per_subgrid * 8` entries are meaningful.
  #[inline]
  pub fn mapping(&self) -> &[i32] {
    &self.mapping
  }

  #[inline]
  pub fn sink(&self) -> &B {
    &self.sink
  }

  #[inline]
  pub fn sink_mut(&mut self) -> &mut B {
    &mut self.sink
  }

  pub fn write_bounds(&mut self, bounds: Aabb3) {
    self.header.grid_min = bounds.min.to_array();
    self.header.grid_max = bounds.max.to_array();
    self.flush_header();
  }

  /// Record a new division. Mapping entries are rewritten by the next
  /// index republication.
  pub fn write_cells_per_dimension(&mut self, division: IVec3) {
    self.division = division;
    self.header.cells_per_dimension = division.to_array();
    self.flush_header();
  }

  pub fn write_transform(&mut self, transform: &GridTransform) {
    self.header.transform = transform.matrix().to_cols_array();
    self.flush_header();
  }

  /// Skipped when unchanged.
  pub fn write_samples_count(&mut self, samples: usize) {
    let samples = samples as i32;
    if self.header.samples_per_point == samples {
      return;
    }
    self.header.samples_per_point = samples;
    self.flush_header();
  }

  /// Make room for the mapping of `subgrid_count` subgrids. Grow-only.
  pub fn ensure_mapping_space(&mut self, subgrid_count: usize) -> Result<(), GridError> {
    let entries = subgrid_count * self.entries_per_subgrid();
    let bytes = GridInfoHeader::SIZE + entries * std::mem::size_of::<i32>();
    if ensure_size(&mut self.sink, BufferKind::GridInfo, bytes)? {
      // A resize rebinds and may drop the old contents.
      self.flush_header();
    }
    if self.mapping.len() < entries {
      self.mapping.resize(entries, 0);
    }
    Ok(())
  }

  /// Index of one corner entry in the mapping.
  #[inline]
  pub fn mapping_index(&self, subgrid: usize, cell: IVec3, corner: usize) -> usize {
    let d = self.division;
    debug_assert!(corner < CORNERS_PER_CELL);
    debug_assert!(cell.cmpge(IVec3::ZERO).all() && cell.cmplt(d).all(), "cell {cell} outside {d}");
    let per_x = (d.y * d.z) as usize * CORNERS_PER_CELL;
    let per_y = d.z as usize * CORNERS_PER_CELL;
    subgrid * self.entries_per_subgrid()
      + cell.x as usize * per_x
      + cell.y as usize * per_y
      + cell.z as usize * CORNERS_PER_CELL
      + corner
  }

  /// Store the slot of one cell corner in the host copy; `-1` if unassigned.
  pub fn set_cell_offset(&mut self, subgrid: usize, cell: IVec3, corner: usize, slot: Option<u32>) {
    let index = self.mapping_index(subgrid, cell, corner);
    self.mapping[index] = slot.map_or(-1, |slot| slot as i32);
  }

  /// Upload the meaningful part of the mapping.
  pub fn flush_mapping(&mut self, subgrid_count: usize) {
    let entries = (subgrid_count * self.entries_per_subgrid()).min(self.mapping.len());
    self
      .sink
      .write(GridInfoHeader::SIZE, bytemuck::cast_slice(&self.mapping[..entries]));
  }

  #[inline]
  fn entries_per_subgrid(&self) -> usize {
    let d = self.division;
    (d.x * d.y * d.z) as usize * CORNERS_PER_CELL
  }

  fn flush_header(&mut self) {
    self.sink.write(0, bytemuck::bytes_of(&self.header));
  }
}

impl GridInfoHeader {
  /// Grid minimum as a vector.
  pub fn min(&self) -> Vec3 {
    Vec3::from_array(self.grid_min)
  }

  /// Grid maximum as a vector.
  pub fn max(&self) -> Vec3 {
    Vec3::from_array(self.grid_max)
  }
}
