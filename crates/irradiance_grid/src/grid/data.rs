//! GridData - state shared by every level of the hierarchy.
//!
//! Subgrids and cells borrow it mutably while they build, destroy and index
//! themselves. It owns the sample cache, the subgrid index allocator, the
//! host copies of the three GPU-facing buffers and their sinks.

use glam::{IVec3, Vec4};
use rayon::prelude::*;

use super::cache::SampleCache;
use super::index::IndexAllocator;
use super::info::GridInfoBuffer;
use super::listeners::{ListenerToken, TransformListeners};
use crate::bounds::Aabb3;
use crate::error::{BufferKind, GridError};
use crate::gpu::{ensure_size, GpuBuffer, GridBuffers, HostBuffer};
use crate::sampler::IrradianceSampler;
use crate::transform::GridTransform;

/// Marks the end of the subgrid info entries.
pub const SUBGRID_INFO_SENTINEL: i32 = -1;

pub struct GridData<B: GpuBuffer = HostBuffer> {
  transform: GridTransform,
  max_level: i32,
  division: IVec3,
  debug_colors: bool,
  listeners: TransformListeners,
  pub(crate) cache: SampleCache,
  pub(crate) subgrid_indices: IndexAllocator,
  irradiance: Vec<Vec4>,
  irradiance_len: usize,
  irradiance_sink: B,
  pub(crate) info: GridInfoBuffer<B>,
  subgrid_info: Vec<i32>,
  subgrid_info_sink: B,
}

impl<B: GpuBuffer> GridData<B> {
  pub(crate) fn new(
    bounds: Aabb3,
    transform: GridTransform,
    division: IVec3,
    max_level: i32,
    debug_colors: bool,
    buffers: GridBuffers<B>,
  ) -> Result<Self, GridError> {
    let GridBuffers { irradiance, info, subgrid_info } = buffers;
    Ok(Self {
      transform,
      max_level: max_level.max(0),
      division,
      debug_colors,
      listeners: TransformListeners::new(),
      cache: SampleCache::new(),
      subgrid_indices: IndexAllocator::new(),
      irradiance: Vec::new(),
      irradiance_len: 0,
      irradiance_sink: irradiance,
      info: GridInfoBuffer::new(info, bounds, division, &transform)?,
      subgrid_info: Vec::new(),
      subgrid_info_sink: subgrid_info,
    })
  }

  // =========================================================================
  // Settings
  // =========================================================================

  #[inline]
  pub fn transform(&self) -> &GridTransform {
    &self.transform
  }

  /// Notify listeners, then move every sample point.
  pub(crate) fn set_transform(&mut self, transform: GridTransform) {
    self.transform = transform;
    self.listeners.notify(&transform);
    self.cache.apply_transform(&transform);
    self.info.write_transform(&transform);
  }

  pub fn register_listener<F>(&mut self, listener: F) -> ListenerToken
  where
    F: FnMut(&GridTransform) + Send + 'static,
  {
    self.listeners.register(listener)
  }

  pub fn unregister_listener(&mut self, token: ListenerToken) -> bool {
    self.listeners.unregister(token)
  }

  #[inline]
  pub fn max_level(&self) -> i32 {
    self.max_level
  }

  pub(crate) fn set_max_level(&mut self, level: i32) {
    self.max_level = level.max(0);
  }

  #[inline]
  pub fn division(&self) -> IVec3 {
    self.division
  }

  pub(crate) fn set_division(&mut self, division: IVec3) {
    self.division = division;
    self.info.write_cells_per_dimension(division);
  }

  #[inline]
  pub fn debug_colors(&self) -> bool {
    self.debug_colors
  }

  pub(crate) fn set_debug_colors(&mut self, enabled: bool) {
    self.debug_colors = enabled;
  }

  /// Drop every sample point and subgrid index. The caller discards the old
  /// hierarchy without destroying it.
  pub(crate) fn reset_structure(&mut self) {
    self.cache = SampleCache::new();
    self.subgrid_indices = IndexAllocator::new();
  }

  // =========================================================================
  // Accessors
  // =========================================================================

  #[inline]
  pub fn cache(&self) -> &SampleCache {
    &self.cache
  }

  #[inline]
  pub fn subgrid_count(&self) -> usize {
    self.subgrid_indices.count() as usize
  }

  /// Irradiance published by the last update, slot-major.
  #[inline]
  pub fn irradiance(&self) -> &[Vec4] {
    &self.irradiance[..self.irradiance_len]
  }

  #[inline]
  pub fn info(&self) -> &GridInfoBuffer<B> {
    &self.info
  }

  /// Parent cell of every non-root subgrid, then the sentinel.
  #[inline]
  pub fn subgrid_info(&self) -> &[i32] {
    &self.subgrid_info
  }

  #[inline]
  pub fn irradiance_sink(&self) -> &B {
    &self.irradiance_sink
  }

  #[inline]
  pub fn subgrid_info_sink(&self) -> &B {
    &self.subgrid_info_sink
  }

  // =========================================================================
  // Index republication
  // =========================================================================

  /// Size the mapping and subgrid info for `subgrid_count` subgrids. Runs
  /// before the hierarchy walk writes into them.
  pub(crate) fn prepare_indices(&mut self, subgrid_count: usize) -> Result<(), GridError> {
    self.info.ensure_mapping_space(subgrid_count)?;
    let bytes = subgrid_count * std::mem::size_of::<i32>();
    ensure_size(&mut self.subgrid_info_sink, BufferKind::SubGridInfo, bytes)?;
    self.subgrid_info.clear();
    self.subgrid_info.resize(subgrid_count, SUBGRID_INFO_SENTINEL);
    Ok(())
  }

  /// Record the global parent cell of subgrid `child_index` (never the root).
  pub(crate) fn set_parent_cell(&mut self, child_index: u32, global_cell: u32) {
    debug_assert!(child_index > 0, "the root has no parent cell");
    self.subgrid_info[child_index as usize - 1] = global_cell as i32;
  }

  /// Write the sentinel and upload the mapping and subgrid info.
  pub(crate) fn publish_indices(&mut self) {
    let count = self.subgrid_info.len();
    if let Some(last) = self.subgrid_info.last_mut() {
      *last = SUBGRID_INFO_SENTINEL;
    }
    self.info.flush_mapping(count);
    self
      .subgrid_info_sink
      .write(0, bytemuck::cast_slice(&self.subgrid_info));
  }

  // =========================================================================
  // Irradiance
  // =========================================================================

  /// Grow the irradiance buffer to hold `values` entries. Never shrinks.
  pub(crate) fn ensure_irradiance_capacity(&mut self, values: usize) -> Result<(), GridError> {
    let bytes = values * std::mem::size_of::<Vec4>();
    ensure_size(&mut self.irradiance_sink, BufferKind::Irradiance, bytes)?;
    if self.irradiance.len() < values {
      self.irradiance.resize(values, Vec4::ZERO);
    }
    Ok(())
  }

  /// Recompute every live point's range of the dense buffer.
  pub(crate) fn resample<S: IrradianceSampler + ?Sized>(&mut self, sampler: &S, parallel: bool) {
    let n = sampler.directions_count();
    let live = self.cache.slot_count();
    self.irradiance_len = live * n;
    if n == 0 || live == 0 {
      return;
    }

    let cache = &self.cache;
    let debug_colors = self.debug_colors;
    let dense = &mut self.irradiance[..live * n];
    if parallel {
      dense
        .par_chunks_mut(n)
        .zip(cache.slots().par_iter())
        .for_each(|(range, handle)| {
          if let Some(handle) = handle {
            cache.get(*handle).write_range(sampler, range, debug_colors);
          }
        });
    } else {
      for (range, handle) in dense.chunks_mut(n).zip(cache.slots()) {
        if let Some(handle) = handle {
          cache.get(*handle).write_range(sampler, range, debug_colors);
        }
      }
    }
    self.cache.set_sample_counts(n);
  }

  /// Upload the values written by the last resample.
  pub(crate) fn publish_irradiance(&mut self) {
    let values = &self.irradiance[..self.irradiance_len];
    debug_assert!(
      values.iter().all(|v| v.cmpge(Vec4::ZERO).all()),
      "negative irradiance"
    );
    self.irradiance_sink.write(0, bytemuck::cast_slice(values));
  }
}

impl<B: GpuBuffer> std::fmt::Debug for GridData<B> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GridData")
      .field("transform", &self.transform)
      .field("max_level", &self.max_level)
      .field("division", &self.division)
      .field("debug_colors", &self.debug_colors)
      .field("live_samples", &self.cache.live_count())
      .field("subgrids", &self.subgrid_indices.count())
      .field("listeners", &self.listeners)
      .finish()
  }
}
