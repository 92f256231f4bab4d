//! Thread-safe pool of scratch buffers for the sampler.
//!
//! Buffers are rented for the duration of one `sample` call and returned on
//! drop. A pooled buffer of the wrong size is discarded and a fresh one is
//! allocated; a miss is never an error.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

use glam::Vec4;

/// Mutex-protected free list of `Vec4` buffers.
#[derive(Debug, Default)]
pub struct ScratchPool {
  available: Mutex<Vec<Vec<Vec4>>>,
}

impl ScratchPool {
  pub fn new() -> Self {
    Self::default()
  }

  /// Rent a buffer of exactly `len` entries.
  ///
  /// `init` runs only on freshly allocated buffers, so work that is identical
  /// across rents (writing the fixed directions) is paid once per buffer.
  pub fn rent<F>(&self, len: usize, init: F) -> ScratchBuffer<'_>
  where
    F: FnOnce(&mut [Vec4]),
  {
    let pooled = self.lock().pop();
    let buffer = match pooled {
      Some(buffer) if buffer.len() == len => buffer,
      _ => {
        let mut buffer = vec![Vec4::ZERO; len];
        init(&mut buffer);
        buffer
      }
    };
    ScratchBuffer {
      pool: self,
      buffer: Some(buffer),
    }
  }

  /// Number of idle buffers.
  pub fn idle_count(&self) -> usize {
    self.lock().len()
  }

  /// Drop every idle buffer.
  pub fn clear(&self) {
    self.lock().clear();
  }

  fn give_back(&self, buffer: Vec<Vec4>) {
    self.lock().push(buffer);
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Vec<Vec4>>> {
    // A panic while holding the lock cannot leave the list half-updated.
    self.available.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Rented buffer; returns itself to the pool when dropped.
pub struct ScratchBuffer<'a> {
  pool: &'a ScratchPool,
  buffer: Option<Vec<Vec4>>,
}

impl Deref for ScratchBuffer<'_> {
  type Target = [Vec4];

  fn deref(&self) -> &[Vec4] {
    self.buffer.as_deref().unwrap_or(&[])
  }
}

impl DerefMut for ScratchBuffer<'_> {
  fn deref_mut(&mut self) -> &mut [Vec4] {
    self.buffer.as_deref_mut().unwrap_or(&mut [])
  }
}

impl Drop for ScratchBuffer<'_> {
  fn drop(&mut self) {
    if let Some(buffer) = self.buffer.take() {
      self.pool.give_back(buffer);
    }
  }
}
