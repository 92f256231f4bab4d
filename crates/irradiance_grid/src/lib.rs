//! irradiance_grid - adaptive irradiance sample grid
//!
//! Places irradiance sample points on the corners of an axis-aligned grid,
//! refines the grid around dynamic objects and keeps the sampled irradiance in
//! a dense, slot-indexed buffer that a renderer can bind directly.
//!
//! # Features
//!
//! - **Adaptive subdivision**: cells overlapping an object get a child
//!   subgrid, up to a configurable depth
//! - **Deduplicated samples**: neighbouring cells share corner points; a
//!   reference-counted cache keeps slots dense after removals
//! - **Hemispherical irradiance**: octahedral direction set, ray-cast radiance
//!   and a cosine-weighted integral with scalar and vectorized paths
//! - **GPU-facing buffers**: irradiance, corner mapping and subgrid hierarchy
//!   mirrored into any [`GpuBuffer`]
//!
//! # Example
//!
//! ```ignore
//! use irradiance_grid::{Aabb3, Grid, GridConfig, Room};
//!
//! let config = GridConfig::default().with_max_subgrid_level(2);
//! let mut grid = Grid::new(Aabb3::new(Vec3::splat(-4.0), Vec3::splat(4.0)), config.clone())?;
//! let sampler = config.sampler();
//!
//! let scene = [Room::with_default_scale()];
//! let stats = grid.update_scene(&scene, &sampler)?;
//! println!("{} samples in {} subgrids", stats.live_samples, stats.subgrids);
//! ```

pub mod bounds;
pub mod error;
pub mod gpu;
pub mod transform;

pub use bounds::Aabb3;
pub use error::{BufferKind, GridError};
pub use gpu::{GpuBuffer, GridBuffers, HostBuffer};
pub use transform::GridTransform;

// Direction set and its square mapping
pub mod hemisphere;
pub use hemisphere::{hemisphere_to_point, point_to_hemisphere, HemisphereDirections};

// Scene objects the grid refines around and samples
pub mod scene;
pub use scene::{BoundsProxy, Ray, RayHit, Reflection, Room, ShadeableObject, Surface, Wall};

// Radiance gathering and integration
pub mod sampler;
pub use sampler::{IntegrationMode, IrradianceSampler, RadianceSampler, ScratchPool};

// Hierarchy, sample cache and tick
pub mod grid;
pub use grid::{
  Cell, CompactionStats, Grid, GridConfig, GridData, GridInfoHeader, ListenerToken, SampleCache,
  SampleHandle, SamplePoint, SubGrid, TransformListeners, UpdateStats,
};

pub mod metrics;
