//! Engine-agnostic metrics for grid updates.
//!
//! Feature-gated and runtime-toggled: without the `metrics` feature every
//! `record_*` call is a no-op.
//!
//! # Usage
//!
//! ```ignore
//! use irradiance_grid::metrics::{GridMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! let stats = grid.update(&objects, &sampler)?;
//! grid.metrics().avg_tick_us();
//! ```

use std::collections::VecDeque;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;
use std::sync::atomic::AtomicBool;

use crate::grid::UpdateStats;

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Whether metrics are collected (compile-time feature and runtime toggle).
#[inline]
pub fn is_enabled() -> bool {
  #[cfg(feature = "metrics")]
  {
    COLLECT_METRICS.load(Ordering::Relaxed)
  }
  #[cfg(not(feature = "metrics"))]
  {
    false
  }
}

/// Fixed-capacity window of the most recent values.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
  buffer: VecDeque<T>,
  capacity: usize,
}

impl<T> RollingWindow<T> {
  pub fn new(capacity: usize) -> Self {
    Self {
      buffer: VecDeque::with_capacity(capacity),
      capacity,
    }
  }

  /// Push a value, evicting the oldest at capacity.
  pub fn push(&mut self, value: T) {
    if self.buffer.len() >= self.capacity {
      self.buffer.pop_front();
    }
    self.buffer.push_back(value);
  }

  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  pub fn clear(&mut self) {
    self.buffer.clear();
  }

  /// Oldest to newest.
  pub fn iter(&self) -> impl Iterator<Item = &T> {
    self.buffer.iter()
  }

  pub fn last(&self) -> Option<&T> {
    self.buffer.back()
  }
}

impl RollingWindow<u64> {
  pub fn sum(&self) -> u64 {
    self.buffer.iter().sum()
  }

  pub fn average(&self) -> f64 {
    if self.buffer.is_empty() {
      0.0
    } else {
      self.sum() as f64 / self.buffer.len() as f64
    }
  }

  pub fn min_max(&self) -> Option<(u64, u64)> {
    let min = *self.buffer.iter().min()?;
    let max = *self.buffer.iter().max()?;
    Some((min, max))
  }
}

impl Default for RollingWindow<u64> {
  fn default() -> Self {
    Self::new(128)
  }
}

/// Statistics of recent grid updates.
#[derive(Debug, Clone, Default)]
pub struct GridMetrics {
  /// Whole-tick times in microseconds.
  pub tick_timings: RollingWindow<u64>,
  /// Resample phase times in microseconds.
  pub resample_timings: RollingWindow<u64>,

  pub last_tick_us: u64,
  pub live_samples: usize,
  pub subgrids: usize,

  /// Ticks whose structure changed.
  pub structure_changes: u64,
  /// Cumulative points trimmed.
  pub samples_removed: u64,
  /// Cumulative points moved by compaction.
  pub samples_moved: u64,
  pub total_ticks: u64,
}

impl GridMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record one finished update.
  pub fn record_update(&mut self, stats: &UpdateStats) {
    if !is_enabled() {
      return;
    }
    self.tick_timings.push(stats.elapsed_us);
    self.resample_timings.push(stats.resample_us);
    self.last_tick_us = stats.elapsed_us;
    self.live_samples = stats.live_samples;
    self.subgrids = stats.subgrids;
    self.total_ticks += 1;
    if stats.structure_changed {
      self.structure_changes += 1;
    }
    self.samples_removed += stats.compaction.removed as u64;
    self.samples_moved += stats.compaction.moved as u64;
  }

  pub fn avg_tick_us(&self) -> f64 {
    self.tick_timings.average()
  }

  pub fn avg_resample_us(&self) -> f64 {
    self.resample_timings.average()
  }

  /// Clear timings and snapshots. Cumulative counters stay.
  pub fn reset(&mut self) {
    self.tick_timings.clear();
    self.resample_timings.clear();
    self.last_tick_us = 0;
    self.live_samples = 0;
    self.subgrids = 0;
  }
}
