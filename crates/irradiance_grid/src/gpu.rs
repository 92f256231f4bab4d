//! GPU buffer seam.
//!
//! The grid never talks to a graphics API. It owns host copies of its three
//! buffers and mirrors every change into a [`GpuBuffer`] sink. A renderer
//! implements the trait over its own buffer type; [`HostBuffer`] keeps the
//! bytes in memory for tools and tests.

use crate::error::{BufferKind, GridError};

/// Byte sink mirrored by the grid.
///
/// The grid checks `max_size` before every `resize`, so implementations may
/// treat an oversized request as a bug.
pub trait GpuBuffer: Send {
  /// Largest size in bytes this buffer may grow to.
  fn max_size(&self) -> usize;

  /// Current size in bytes.
  fn size(&self) -> usize;

  /// Resize to `byte_len` and rebind. Contents may be discarded.
  fn resize(&mut self, byte_len: usize);

  /// Upload `bytes` at `offset`. `offset + bytes.len()` never exceeds `size()`.
  fn write(&mut self, offset: usize, bytes: &[u8]);
}

/// In-memory [`GpuBuffer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostBuffer {
  bytes: Vec<u8>,
  max_size: usize,
}

impl HostBuffer {
  /// 128 MiB, the usual storage buffer binding limit.
  pub const DEFAULT_MAX_SIZE: usize = 1 << 27;

  pub fn new() -> Self {
    Self::with_max_size(Self::DEFAULT_MAX_SIZE)
  }

  pub fn with_max_size(max_size: usize) -> Self {
    Self { bytes: Vec::new(), max_size }
  }

  /// Mirrored contents.
  #[inline]
  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }
}

impl Default for HostBuffer {
  fn default() -> Self {
    Self::new()
  }
}

impl GpuBuffer for HostBuffer {
  fn max_size(&self) -> usize {
    self.max_size
  }

  fn size(&self) -> usize {
    self.bytes.len()
  }

  fn resize(&mut self, byte_len: usize) {
    debug_assert!(byte_len <= self.max_size, "resize past max size");
    self.bytes.resize(byte_len, 0);
  }

  fn write(&mut self, offset: usize, bytes: &[u8]) {
    self.bytes[offset..offset + bytes.len()].copy_from_slice(bytes);
  }
}

/// Grow `sink` to at least `byte_len` bytes. Never shrinks.
///
/// Returns `Ok(true)` when the sink was resized, which discards its contents.
pub(crate) fn ensure_size<B: GpuBuffer + ?Sized>(
  sink: &mut B,
  buffer: BufferKind,
  byte_len: usize,
) -> Result<bool, GridError> {
  if byte_len <= sink.size() {
    return Ok(false);
  }
  let max = sink.max_size();
  if byte_len > max {
    tracing::warn!(%buffer, requested = byte_len, max, "buffer resize refused");
    return Err(GridError::CapacityExceeded { buffer, requested: byte_len, max });
  }
  tracing::debug!(%buffer, from = sink.size(), to = byte_len, "growing buffer");
  sink.resize(byte_len);
  Ok(true)
}

/// The three sinks a [`Grid`](crate::Grid) mirrors into.
#[derive(Clone, Debug, Default)]
pub struct GridBuffers<B> {
  pub irradiance: B,
  pub info: B,
  pub subgrid_info: B,
}

impl GridBuffers<HostBuffer> {
  /// Host buffers with the default size limit.
  pub fn host() -> Self {
    Self::default()
  }

  /// Host buffers sharing one size limit.
  pub fn host_with_max_size(max_size: usize) -> Self {
    Self {
      irradiance: HostBuffer::with_max_size(max_size),
      info: HostBuffer::with_max_size(max_size),
      subgrid_info: HostBuffer::with_max_size(max_size),
    }
  }
}
