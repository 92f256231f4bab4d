//! IndexAllocator - dense subgrid indices with lowest-first reuse.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Hands out subgrid indices so that live indices can be packed back into
/// `[0, count)` after removals.
///
/// Between a release and the next [`settle`](Self::settle) the free heap holds
/// exactly the holes below the high-water mark.
#[derive(Clone, Debug, Default)]
pub struct IndexAllocator {
  count: u32,
  free: BinaryHeap<Reverse<u32>>,
}

impl IndexAllocator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of live indices.
  #[inline]
  pub fn count(&self) -> u32 {
    self.count
  }

  /// Take the smallest free index, or the next unused one.
  pub fn acquire(&mut self) -> u32 {
    let index = match self.free.pop() {
      Some(Reverse(index)) => index,
      None => self.count,
    };
    self.count += 1;
    index
  }

  pub fn release(&mut self, index: u32) {
    debug_assert!(self.count > 0, "released index {index} with nothing live");
    self.count -= 1;
    self.free.push(Reverse(index));
  }

  /// Move `index` below `count` if it sits at or above it. Returns the index
  /// to use from now on.
  pub fn correct(&mut self, index: u32) -> u32 {
    if index < self.count {
      return index;
    }
    let Some(Reverse(target)) = self.free.pop() else {
      unreachable!("no free index below {} for {index}", self.count);
    };
    debug_assert!(target < self.count, "free index {target} is not below {}", self.count);
    self.free.push(Reverse(index));
    target
  }

  /// Drop free entries at or beyond `count`. Call after every live index
  /// went through [`correct`](Self::correct).
  pub fn settle(&mut self) {
    let count = self.count;
    self.free.retain(|Reverse(index)| *index < count);
  }

  /// Free indices still below `count`. Zero after a full correct + settle.
  #[inline]
  pub fn holes(&self) -> usize {
    self.free.len()
  }
}
