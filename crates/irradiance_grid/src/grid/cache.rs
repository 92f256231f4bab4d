//! SampleCache - deduplicating, reference-counted store of sample points with
//! a dense slot space.
//!
//! # Layout
//!
//! ```text
//! points:      arena of Option<SamplePoint>, addressed by SampleHandle
//! by_position: exact position -> handle
//! slots:       dense slot -> handle (holes only between trim and align)
//! free_slots:  min-heap of vacant slots
//! ```
//!
//! Cells add a reference on [`get_or_create`](SampleCache::get_or_create) and
//! drop it on [`release`](SampleCache::release). Unreferenced points linger
//! until [`trim`](SampleCache::trim), so a structure change that destroys and
//! recreates a neighbour in the same pass keeps the point and its slot.
//! [`align`](SampleCache::align) then packs the live slots into `[0, live)`.
//!
//! Mutation is single-threaded; the grid finishes compaction before any
//! parallel resampling reads the cache.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use glam::Vec3;

use super::sample::{SampleHandle, SamplePoint};
use crate::transform::GridTransform;

/// Exact-match key for a position. `-0.0` and `+0.0` share a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PositionKey([u32; 3]);

impl PositionKey {
  #[inline]
  fn new(position: Vec3) -> Self {
    // Adding +0.0 turns -0.0 into +0.0 and leaves every other value alone.
    let p = position + Vec3::ZERO;
    Self([p.x.to_bits(), p.y.to_bits(), p.z.to_bits()])
  }
}

/// Result of one trim + align pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompactionStats {
  /// Points removed because no cell referenced them.
  pub removed: usize,
  /// Live points moved to a lower slot.
  pub moved: usize,
}

/// Deduplicating sample point cache.
#[derive(Debug, Default)]
pub struct SampleCache {
  points: Vec<Option<SamplePoint>>,
  free_handles: Vec<u32>,
  by_position: HashMap<PositionKey, SampleHandle>,
  slots: Vec<Option<SampleHandle>>,
  free_slots: BinaryHeap<Reverse<u32>>,
}

impl SampleCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Look up the point at `position`, creating it if needed, and add one
  /// reference.
  ///
  /// New points take the smallest free slot, or the next unused one.
  pub fn get_or_create(&mut self, position: Vec3, transform: &GridTransform) -> SampleHandle {
    let key = PositionKey::new(position);
    if let Some(&handle) = self.by_position.get(&key) {
      if let Some(point) = self.points[handle.0 as usize].as_mut() {
        point.refs += 1;
      }
      return handle;
    }

    let slot = match self.free_slots.pop() {
      Some(Reverse(slot)) => slot,
      None => self.slots.len() as u32,
    };
    let color = Vec3::new(rand::random(), rand::random(), rand::random());
    let point = SamplePoint::new(position, transform, slot, color);

    let handle = match self.free_handles.pop() {
      Some(index) => {
        self.points[index as usize] = Some(point);
        SampleHandle(index)
      }
      None => {
        self.points.push(Some(point));
        SampleHandle(self.points.len() as u32 - 1)
      }
    };

    let slot = slot as usize;
    if slot == self.slots.len() {
      self.slots.push(Some(handle));
    } else {
      debug_assert!(self.slots[slot].is_none(), "free slot {slot} is still occupied");
      self.slots[slot] = Some(handle);
    }
    self.by_position.insert(key, handle);
    handle
  }

  /// Drop one reference. The point stays until the next [`trim`](Self::trim).
  ///
  /// # Panics
  /// Panics on a stale handle; debug-asserts the point was referenced.
  pub fn release(&mut self, handle: SampleHandle) {
    let point = self.points[handle.0 as usize]
      .as_mut()
      .unwrap_or_else(|| panic!("released a trimmed sample handle {handle:?}"));
    debug_assert!(point.refs > 0, "sample at {} released too often", point.position());
    point.refs = point.refs.saturating_sub(1);
  }

  /// Remove every point no cell references. Their slots become free and the
  /// dense sequence is left with holes until [`align`](Self::align).
  ///
  /// Returns the number of removed points.
  pub fn trim(&mut self) -> usize {
    let mut removed = 0;
    for index in 0..self.points.len() {
      let unreferenced = matches!(&self.points[index], Some(point) if point.refs == 0);
      if !unreferenced {
        continue;
      }
      let Some(point) = self.points[index].take() else {
        continue;
      };
      self.by_position.remove(&PositionKey::new(point.position()));
      if let Some(slot) = point.slot {
        self.slots[slot as usize] = None;
        self.free_slots.push(Reverse(slot));
      }
      self.free_handles.push(index as u32);
      removed += 1;
    }
    removed
  }

  /// Move every live point whose slot is at or beyond the live count into the
  /// smallest free slot, then shrink the dense sequence to the live count.
  ///
  /// Returns the number of moved points.
  pub fn align(&mut self) -> usize {
    let live = self.by_position.len();
    let mut moved = 0;

    for slot in live..self.slots.len() {
      let Some(handle) = self.slots[slot].take() else {
        continue;
      };
      // Holes below `live` are at least as many as live points above it.
      let Some(Reverse(target)) = self.free_slots.pop() else {
        unreachable!("no free slot below {live} for sample in slot {slot}");
      };
      debug_assert!((target as usize) < live, "free slot {target} is not below {live}");

      self.slots[target as usize] = Some(handle);
      if let Some(point) = self.points[handle.0 as usize].as_mut() {
        point.slot = Some(target);
      }
      self.free_slots.push(Reverse(slot as u32));
      moved += 1;
    }

    self.slots.truncate(live);
    // Whatever is left points past the end of the dense sequence.
    self.free_slots.retain(|Reverse(slot)| (*slot as usize) < live);
    debug_assert!(self.free_slots.is_empty(), "holes left after align");
    moved
  }

  /// [`trim`](Self::trim) followed by [`align`](Self::align).
  pub fn compact(&mut self) -> CompactionStats {
    let removed = self.trim();
    let moved = self.align();
    CompactionStats { removed, moved }
  }

  /// Recompute every transformed position.
  pub fn apply_transform(&mut self, transform: &GridTransform) {
    for point in self.points.iter_mut().flatten() {
      point.apply_transform(transform);
    }
  }

  /// Record how many values each live point wrote in the last resample.
  pub(crate) fn set_sample_counts(&mut self, count: usize) {
    for point in self.points.iter_mut().flatten() {
      point.set_sample_count(count);
    }
  }

  /// Point behind a handle.
  ///
  /// # Panics
  /// Panics on a trimmed handle.
  #[inline]
  pub fn get(&self, handle: SampleHandle) -> &SamplePoint {
    self.points[handle.0 as usize]
      .as_ref()
      .unwrap_or_else(|| panic!("sample handle {handle:?} was trimmed"))
  }

  /// Handle of the point at `position`, if one exists.
  pub fn find(&self, position: Vec3) -> Option<SampleHandle> {
    self.by_position.get(&PositionKey::new(position)).copied()
  }

  /// Slot currently assigned to the point behind `handle`.
  #[inline]
  pub fn slot_of(&self, handle: SampleHandle) -> Option<u32> {
    self.get(handle).slot
  }

  /// Number of live points (referenced or awaiting trim).
  #[inline]
  pub fn live_count(&self) -> usize {
    self.by_position.len()
  }

  /// Length of the dense slot sequence. Equals
  /// [`live_count`](Self::live_count) outside a pending compaction.
  #[inline]
  pub fn slot_count(&self) -> usize {
    self.slots.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.by_position.is_empty()
  }

  /// Dense slot sequence.
  #[inline]
  pub fn slots(&self) -> &[Option<SampleHandle>] {
    &self.slots
  }

  /// Live points in slot order.
  pub fn iter(&self) -> impl Iterator<Item = &SamplePoint> + '_ {
    self.slots.iter().flatten().map(|&handle| self.get(handle))
  }

  /// Check the cache invariants, panicking with a description on violation.
  ///
  /// - the dense sequence is exactly as long as the live set
  /// - every live point sits in the slot it records
  /// - no slot is shared
  /// - every live point is referenced by at least one cell
  pub fn debug_validate(&self) {
    assert_eq!(
      self.slots.len(),
      self.by_position.len(),
      "dense sequence length differs from live count"
    );
    let mut seen = vec![false; self.slots.len()];
    for (&key, &handle) in &self.by_position {
      let point = self.get(handle);
      assert_eq!(PositionKey::new(point.position()), key, "position map out of sync");
      assert!(point.refs >= 1, "live sample at {} has no references", point.position());
      let Some(slot) = point.slot else {
        panic!("live sample at {} has no slot", point.position());
      };
      let slot = slot as usize;
      assert!(slot < self.slots.len(), "slot {slot} out of range");
      assert!(!seen[slot], "slot {slot} shared by two samples");
      seen[slot] = true;
      assert_eq!(self.slots[slot], Some(handle), "slot {slot} does not hold its sample");
    }
  }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;
