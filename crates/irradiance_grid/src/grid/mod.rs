//! Grid - adaptive irradiance sample grid.
//!
//! The grid owns a root [`SubGrid`] over its bounds and refines it around
//! scene objects. Every distinct cell corner is one [`SamplePoint`] in the
//! [`SampleCache`], with a dense slot in the irradiance buffer.
//!
//! # Tick
//!
//! ```text
//! update(objects, sampler)
//!   refresh subdivision   add/remove children around objects
//!   compact (if changed)  trim + align the cache, repack subgrid indices,
//!                         rewrite corner mapping and parent cells
//!   ensure capacity       live samples * directions, grow-only
//!   resample              every live point writes its slot range
//!   publish               mirror into the GPU sinks
//! ```

mod cache;
mod cell;
mod config;
mod data;
mod index;
mod info;
mod listeners;
mod sample;
mod subgrid;

#[cfg(test)]
pub mod test_utils;

pub use cache::{CompactionStats, SampleCache};
pub use cell::{corner_position, Cell};
pub use config::GridConfig;
pub use data::{GridData, SUBGRID_INFO_SENTINEL};
pub use index::IndexAllocator;
pub use info::{GridInfoBuffer, GridInfoHeader, CORNERS_PER_CELL};
pub use listeners::{ListenerToken, TransformListeners};
pub use sample::{SampleHandle, SamplePoint};
pub use subgrid::SubGrid;

use glam::{IVec3, Vec4};
use web_time::Instant;

use crate::bounds::Aabb3;
use crate::error::GridError;
use crate::gpu::{GpuBuffer, GridBuffers, HostBuffer};
#[cfg(feature = "metrics")]
use crate::metrics::GridMetrics;
use crate::sampler::{IrradianceSampler, RadianceSampler};
use crate::scene::ShadeableObject;
use crate::transform::GridTransform;

/// What one [`Grid::update`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateStats {
  pub structure_changed: bool,
  pub live_samples: usize,
  pub subgrids: usize,
  pub compaction: CompactionStats,
  pub elapsed_us: u64,
  pub resample_us: u64,
}

pub struct Grid<B: GpuBuffer = HostBuffer> {
  bounds: Aabb3,
  parallel_update: bool,
  data: GridData<B>,
  root: SubGrid,
  /// Set while the hierarchy has moved past the published indices.
  needs_republish: bool,
  #[cfg(feature = "metrics")]
  metrics: GridMetrics,
}

impl Grid<HostBuffer> {
  /// Grid mirrored into in-memory buffers.
  pub fn new(bounds: Aabb3, config: GridConfig) -> Result<Self, GridError> {
    Self::with_buffers(bounds, config, GridBuffers::host())
  }
}

impl<B: GpuBuffer> Grid<B> {
  /// Build the root subgrid and publish its indices into `buffers`.
  ///
  /// # Panics
  /// Panics if any division component is not positive.
  pub fn with_buffers(
    bounds: Aabb3,
    config: GridConfig,
    buffers: GridBuffers<B>,
  ) -> Result<Self, GridError> {
    assert!(
      config.division.cmpgt(IVec3::ZERO).all(),
      "grid division must be positive, got {}",
      config.division
    );
    let mut data = GridData::new(
      bounds,
      config.transform,
      config.division,
      config.max_subgrid_level,
      config.debug_colors,
      buffers,
    )?;
    let root = SubGrid::new(0, bounds, &mut data);
    let mut grid = Self {
      bounds,
      parallel_update: config.parallel_update,
      data,
      root,
      needs_republish: false,
      #[cfg(feature = "metrics")]
      metrics: GridMetrics::new(),
    };
    grid.republish()?;
    tracing::debug!(
      samples = grid.data.cache.live_count(),
      division = %config.division,
      max_level = grid.data.max_level(),
      "grid created"
    );
    Ok(grid)
  }

  /// Run one tick against `objects`, sampling with `sampler`.
  pub fn update<O, S>(&mut self, objects: &[O], sampler: &S) -> Result<UpdateStats, GridError>
  where
    O: ShadeableObject,
    S: IrradianceSampler + ?Sized,
  {
    let _span = tracing::debug_span!("grid::update").entered();
    let start = Instant::now();
    let directions = sampler.directions_count();
    self.data.info.write_samples_count(directions);

    let structure_changed = {
      let _span = tracing::trace_span!("refresh_subdivision").entered();
      self.root.update_structure(objects, &mut self.data)
    };
    let compaction = if structure_changed || self.needs_republish {
      self.republish()?
    } else {
      CompactionStats::default()
    };

    #[cfg(debug_assertions)]
    self.data.cache.debug_validate();

    let live_samples = self.data.cache.live_count();
    self.data.ensure_irradiance_capacity(live_samples * directions)?;

    let resample_start = Instant::now();
    {
      let _span = tracing::trace_span!("resample", live_samples, directions).entered();
      self.data.resample(sampler, self.parallel_update);
    }
    let resample_us = resample_start.elapsed().as_micros() as u64;
    self.data.publish_irradiance();

    let stats = UpdateStats {
      structure_changed,
      live_samples,
      subgrids: self.data.subgrid_count(),
      compaction,
      elapsed_us: start.elapsed().as_micros() as u64,
      resample_us,
    };
    #[cfg(feature = "metrics")]
    self.metrics.record_update(&stats);
    tracing::trace!(?stats, "grid updated");
    Ok(stats)
  }

  /// [`update`](Self::update) with a ray-casting sampler over the same objects.
  pub fn update_scene<O: ShadeableObject>(
    &mut self,
    objects: &[O],
    sampler: &RadianceSampler,
  ) -> Result<UpdateStats, GridError> {
    self.update(objects, &sampler.bind(objects))
  }

  /// Trim and align the cache, repack subgrid indices and rewrite the
  /// mapping and parent cells. On error the grid stays marked and the next
  /// update retries.
  fn republish(&mut self) -> Result<CompactionStats, GridError> {
    let _span = tracing::trace_span!("compact").entered();
    self.needs_republish = true;
    let compaction = self.data.cache.compact();
    let subgrids = self.data.subgrid_count();
    self.data.prepare_indices(subgrids)?;
    self.root.correct_indexes(&mut self.data);
    self.data.subgrid_indices.settle();
    debug_assert_eq!(self.data.subgrid_indices.holes(), 0, "subgrid indices not packed");
    debug_assert_eq!(self.root.index(), 0, "root index moved");
    self.data.publish_indices();
    self.needs_republish = false;
    tracing::debug!(
      removed = compaction.removed,
      moved = compaction.moved,
      live = self.data.cache.live_count(),
      subgrids,
      "grid compacted"
    );
    Ok(compaction)
  }

  /// Tear down the hierarchy and build a fresh root. Transform, depth limit,
  /// debug colours and listeners survive.
  fn rebuild(&mut self) -> Result<(), GridError> {
    tracing::debug!(
      division = %self.data.division(),
      max_level = self.data.max_level(),
      "rebuilding grid"
    );
    self.data.reset_structure();
    self.root = SubGrid::new(0, self.bounds, &mut self.data);
    self.republish()?;
    Ok(())
  }

  /// Rebuild under new settings; if they do not fit the buffers, undo them
  /// with `rollback`, rebuild the previous hierarchy and return the error.
  fn rebuild_or_rollback(
    &mut self,
    rollback: impl FnOnce(&mut GridData<B>),
  ) -> Result<(), GridError> {
    let Err(err) = self.rebuild() else {
      return Ok(());
    };
    tracing::warn!(error = %err, "grid rebuild failed, restoring previous settings");
    rollback(&mut self.data);
    self.rebuild()?;
    Err(err)
  }

  // =========================================================================
  // Settings
  // =========================================================================

  /// Notify listeners, then move every sample point and cell bounds.
  pub fn set_transform(&mut self, transform: GridTransform) {
    self.data.set_transform(transform);
    self.root.apply_transform(&transform);
  }

  /// Change the cells per axis. Rebuilds the whole hierarchy.
  ///
  /// # Panics
  /// Panics if any component is not positive.
  pub fn set_grid_division(&mut self, division: IVec3) -> Result<(), GridError> {
    assert!(division.cmpgt(IVec3::ZERO).all(), "grid division must be positive, got {division}");
    if division == self.data.division() {
      return Ok(());
    }
    let previous = self.data.division();
    self.data.set_division(division);
    self.rebuild_or_rollback(|data| data.set_division(previous))
  }

  /// Change the deepest subgrid level. Negative levels clamp to 0; the same
  /// level is a no-op, anything else rebuilds the hierarchy.
  pub fn set_max_subgrid_level(&mut self, level: i32) -> Result<(), GridError> {
    let level = level.max(0);
    if level == self.data.max_level() {
      return Ok(());
    }
    let previous = self.data.max_level();
    self.data.set_max_level(level);
    self.rebuild_or_rollback(|data| data.set_max_level(previous))
  }

  pub fn set_parallel_update(&mut self, parallel: bool) {
    self.parallel_update = parallel;
  }

  /// Takes effect on the next update.
  pub fn set_debug_color_enabled(&mut self, enabled: bool) {
    self.data.set_debug_colors(enabled);
  }

  pub fn on_transform_changed<F>(&mut self, listener: F) -> ListenerToken
  where
    F: FnMut(&GridTransform) + Send + 'static,
  {
    self.data.register_listener(listener)
  }

  pub fn remove_transform_listener(&mut self, token: ListenerToken) -> bool {
    self.data.unregister_listener(token)
  }

  // =========================================================================
  // Accessors
  // =========================================================================

  #[inline]
  pub fn bounds(&self) -> &Aabb3 {
    &self.bounds
  }

  #[inline]
  pub fn transform(&self) -> &GridTransform {
    self.data.transform()
  }

  #[inline]
  pub fn division(&self) -> IVec3 {
    self.data.division()
  }

  #[inline]
  pub fn max_subgrid_level(&self) -> i32 {
    self.data.max_level()
  }

  #[inline]
  pub fn parallel_update(&self) -> bool {
    self.parallel_update
  }

  #[inline]
  pub fn debug_color_enabled(&self) -> bool {
    self.data.debug_colors()
  }

  #[inline]
  pub fn root(&self) -> &SubGrid {
    &self.root
  }

  #[inline]
  pub fn data(&self) -> &GridData<B> {
    &self.data
  }

  #[inline]
  pub fn cache(&self) -> &SampleCache {
    self.data.cache()
  }

  #[inline]
  pub fn subgrid_count(&self) -> usize {
    self.data.subgrid_count()
  }

  /// Irradiance published by the last update, slot-major.
  #[inline]
  pub fn irradiance(&self) -> &[Vec4] {
    self.data.irradiance()
  }

  /// Corner to slot mapping for the live subgrids. After a failed update
  /// this is the last published mapping.
  pub fn mapping(&self) -> &[i32] {
    let d = self.division();
    let entries = self.subgrid_count() * (d.x * d.y * d.z) as usize * CORNERS_PER_CELL;
    let mapping = self.data.info().mapping();
    &mapping[..entries.min(mapping.len())]
  }

  #[inline]
  pub fn subgrid_info(&self) -> &[i32] {
    self.data.subgrid_info()
  }

  #[inline]
  pub fn info_header(&self) -> &GridInfoHeader {
    self.data.info().header()
  }

  #[inline]
  pub fn irradiance_sink(&self) -> &B {
    self.data.irradiance_sink()
  }

  #[inline]
  pub fn info_sink(&self) -> &B {
    self.data.info().sink()
  }

  #[inline]
  pub fn subgrid_info_sink(&self) -> &B {
    self.data.subgrid_info_sink()
  }

  #[cfg(feature = "metrics")]
  #[inline]
  pub fn metrics(&self) -> &GridMetrics {
    &self.metrics
  }
}

impl<B: GpuBuffer> std::fmt::Debug for Grid<B> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Grid")
      .field("bounds", &self.bounds)
      .field("parallel_update", &self.parallel_update)
      .field("data", &self.data)
      .finish_non_exhaustive()
  }
}
