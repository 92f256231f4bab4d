//! Error types surfaced by the grid.
//!
//! Only capacity problems are recoverable. Malformed input (unordered bounds,
//! non-positive divisions, sampling an unassigned slot) is a programming error
//! and panics instead.

use thiserror::Error;

/// Which GPU-facing buffer a capacity error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
  /// Dense per-slot irradiance values.
  Irradiance,
  /// Grid info header followed by the cell corner to slot mapping.
  GridInfo,
  /// Parent cell index of every non-root subgrid.
  SubGridInfo,
}

impl std::fmt::Display for BufferKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      BufferKind::Irradiance => "irradiance",
      BufferKind::GridInfo => "grid info",
      BufferKind::SubGridInfo => "subgrid info",
    };
    f.write_str(name)
  }
}

/// Errors returned by grid operations that resize GPU-facing buffers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
  /// A buffer would have to grow beyond the maximum size its sink accepts.
  ///
  /// Not retried: reduce the sampler resolution, the grid division or the
  /// maximum subgrid level.
  #[error("{buffer} buffer needs {requested} bytes but the sink accepts at most {max}")]
  CapacityExceeded {
    buffer: BufferKind,
    requested: usize,
    max: usize,
  },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_capacity_message_names_buffer() {
    let err = GridError::CapacityExceeded {
      buffer: BufferKind::Irradiance,
      requested: 2048,
      max: 1024,
    };
    let message = err.to_string();
    assert!(message.contains("irradiance"), "got: {message}");
    assert!(message.contains("2048"));
    assert!(message.contains("1024"));
  }
}
