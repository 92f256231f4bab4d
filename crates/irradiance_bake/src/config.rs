//! Scene description parsing for irradiance baking.

use anyhow::{Context, Result};
use glam::{IVec3, Vec3};
use irradiance_grid::{
	Aabb3, BoundsProxy, GridConfig, GridTransform, IntegrationMode, Room, Surface,
};
use serde::Deserialize;
use std::path::Path;

/// Deepest subdivision the tool accepts; every level multiplies the sample
/// count by up to the cell count of a subgrid.
const MAX_SUBGRID_LEVEL: i32 = 8;

/// Root of a scene TOML file.
#[derive(Debug, Deserialize)]
pub struct SceneConfig {
	pub grid: GridSection,
	#[serde(default)]
	pub sampler: SamplerSection,
	#[serde(default)]
	pub room: RoomSection,
	/// Bounds-only objects that drive subdivision.
	#[serde(default)]
	pub proxies: Vec<ProxyConfig>,
}

/// Grid bounds and subdivision.
#[derive(Debug, Deserialize)]
pub struct GridSection {
	pub min: [f32; 3],
	pub max: [f32; 3],
	#[serde(default = "default_division")]
	pub division: [i32; 3],
	#[serde(default)]
	pub max_subgrid_level: i32,
	#[serde(default)]
	pub parallel: bool,
	#[serde(default)]
	pub debug_colors: bool,
	#[serde(default)]
	pub transform: TransformConfig,
}

/// Translation, per-axis scale and Y rotation in degrees.
#[derive(Debug, Deserialize)]
pub struct TransformConfig {
	#[serde(default)]
	pub translation: [f32; 3],
	#[serde(default = "default_scale")]
	pub scale: [f32; 3],
	#[serde(default)]
	pub y_rotation: f32,
}

#[derive(Debug, Deserialize)]
pub struct SamplerSection {
	#[serde(default = "default_resolution")]
	pub resolution: u32,
	#[serde(default)]
	pub mode: ModeConfig,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeConfig {
	Scalar,
	Vectorized,
	#[default]
	Auto,
}

/// The room the grid sits in.
#[derive(Debug, Deserialize)]
pub struct RoomSection {
	#[serde(default = "default_room_scale")]
	pub scale: f32,
	#[serde(default)]
	pub center: [f32; 3],
	/// Radiance per wall: left, right, back, top, bottom, front.
	/// Omitted: red left, blue right, grey elsewhere.
	pub walls: Option<[[f32; 3]; 6]>,
}

#[derive(Debug, Deserialize)]
pub struct ProxyConfig {
	pub center: [f32; 3],
	pub half_extents: [f32; 3],
	/// Offset applied each tick.
	#[serde(default)]
	pub velocity: [f32; 3],
}

fn default_division() -> [i32; 3] {
	[2, 2, 2]
}

fn default_scale() -> [f32; 3] {
	[1.0, 1.0, 1.0]
}

fn default_resolution() -> u32 {
	irradiance_grid::RadianceSampler::DEFAULT_RESOLUTION
}

fn default_room_scale() -> f32 {
	Room::DEFAULT_SCALE
}

impl Default for TransformConfig {
	fn default() -> Self {
		Self {
			translation: [0.0; 3],
			scale: default_scale(),
			y_rotation: 0.0,
		}
	}
}

impl Default for SamplerSection {
	fn default() -> Self {
		Self {
			resolution: default_resolution(),
			mode: ModeConfig::default(),
		}
	}
}

impl Default for RoomSection {
	fn default() -> Self {
		Self {
			scale: default_room_scale(),
			center: [0.0; 3],
			walls: None,
		}
	}
}

impl SceneConfig {
	/// Load and validate a scene from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read scene file: {}", path.display()))?;
		Self::parse(&content)
	}

	/// Parse and validate scene TOML.
	pub fn parse(content: &str) -> Result<Self> {
		let config: SceneConfig = toml::from_str(content).context("Failed to parse scene TOML")?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<()> {
		let grid = &self.grid;
		if (0..3).any(|i| grid.min[i] >= grid.max[i]) {
			anyhow::bail!("grid.min must be below grid.max on every axis, got {:?} and {:?}", grid.min, grid.max);
		}
		if grid.division.iter().any(|&d| d <= 0) {
			anyhow::bail!("grid.division must be positive, got {:?}", grid.division);
		}
		if !(0..=MAX_SUBGRID_LEVEL).contains(&grid.max_subgrid_level) {
			anyhow::bail!(
				"grid.max_subgrid_level must be within 0..={MAX_SUBGRID_LEVEL}, got {}",
				grid.max_subgrid_level
			);
		}
		if grid.transform.scale.iter().any(|&s| s == 0.0) {
			anyhow::bail!("grid.transform.scale must be non-zero, got {:?}", grid.transform.scale);
		}
		if self.sampler.resolution == 0 {
			anyhow::bail!("sampler.resolution must be positive");
		}
		if self.room.scale <= 0.0 {
			anyhow::bail!("room.scale must be positive, got {}", self.room.scale);
		}
		if let Some(walls) = &self.room.walls {
			if walls.iter().flatten().any(|&c| c < 0.0) {
				anyhow::bail!("room.walls radiance must be non-negative");
			}
		}
		for (i, proxy) in self.proxies.iter().enumerate() {
			if proxy.half_extents.iter().any(|&h| h < 0.0) {
				anyhow::bail!("proxies[{i}].half_extents must be non-negative, got {:?}", proxy.half_extents);
			}
		}
		Ok(())
	}

	pub fn bounds(&self) -> Aabb3 {
		Aabb3::new(Vec3::from_array(self.grid.min), Vec3::from_array(self.grid.max))
	}

	pub fn grid_config(&self) -> GridConfig {
		let transform = &self.grid.transform;
		let mode = match self.sampler.mode {
			ModeConfig::Scalar => IntegrationMode::Scalar,
			ModeConfig::Vectorized => IntegrationMode::Vectorized,
			ModeConfig::Auto => IntegrationMode::Auto,
		};
		GridConfig::default()
			.with_division(IVec3::from_array(self.grid.division))
			.with_max_subgrid_level(self.grid.max_subgrid_level)
			.with_parallel_update(self.grid.parallel)
			.with_debug_colors(self.grid.debug_colors)
			.with_transform(GridTransform::new(
				Vec3::from_array(transform.translation),
				Vec3::from_array(transform.scale),
				transform.y_rotation,
			))
			.with_sampler_resolution(self.sampler.resolution)
			.with_integration_mode(mode)
	}

	pub fn room(&self) -> Room {
		let transform = GridTransform::from_scale(self.room.scale)
			.with_translation(Vec3::from_array(self.room.center));
		match self.room.walls {
			Some(walls) => Room::with_surfaces(
				transform,
				walls.map(|c| Surface::with_radiance(Vec3::from_array(c))),
			),
			None => Room::new(transform),
		}
	}

	/// Proxies after `tick` ticks of motion.
	pub fn proxies_at(&self, tick: u32) -> Vec<BoundsProxy> {
		self.proxies
			.iter()
			.map(|proxy| {
				let offset = Vec3::from_array(proxy.velocity) * tick as f32;
				BoundsProxy::from_center_half_extents(
					Vec3::from_array(proxy.center) + offset,
					Vec3::from_array(proxy.half_extents),
				)
			})
			.collect()
	}
}
