//! Offline irradiance grid baker.
//!
//! Builds a room and a set of moving bounds proxies from a TOML scene, ticks an
//! irradiance grid over them and optionally dumps the final irradiance buffer.
//!
//! Output layout: one RGBA little-endian f32 quadruple per value, slot-major,
//! `samples_per_point` values per slot.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use config::SceneConfig;
use irradiance_grid::{Grid, UpdateStats};

/// Irradiance grid baker.
#[derive(Parser, Debug)]
#[command(name = "bake_irradiance")]
#[command(about = "Bakes an adaptive irradiance grid for a TOML scene")]
struct Args {
	/// Path to scene TOML file.
	#[arg(short, long)]
	config: PathBuf,

	/// Number of grid updates to run.
	#[arg(short, long, default_value_t = 1)]
	ticks: u32,

	/// Write the final irradiance buffer here.
	#[arg(short, long)]
	output: Option<PathBuf>,
}

fn main() -> Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let args = Args::parse();
	tracing::info!(config = %args.config.display(), "loading scene");
	let scene = SceneConfig::load(&args.config)?;

	let grid_config = scene.grid_config();
	let sampler = grid_config.sampler();
	let mut grid = Grid::new(scene.bounds(), grid_config).context("Failed to create grid")?;

	// Only the proxies drive subdivision; rays see the room.
	let room = [scene.room()];
	let radiance = sampler.bind(&room);

	tracing::info!(
		ticks = args.ticks,
		resolution = sampler.resolution(),
		directions = sampler.samples_count(),
		proxies = scene.proxies.len(),
		"baking"
	);

	let mut last = UpdateStats::default();
	for tick in 0..args.ticks {
		let proxies = scene.proxies_at(tick);
		last = grid
			.update(&proxies, &radiance)
			.with_context(|| format!("Grid update failed at tick {tick}"))?;
		tracing::info!(
			tick,
			samples = last.live_samples,
			subgrids = last.subgrids,
			changed = last.structure_changed,
			removed = last.compaction.removed,
			moved = last.compaction.moved,
			elapsed_us = last.elapsed_us,
			"tick"
		);
	}

	let irradiance = grid.irradiance();
	let peak = irradiance.iter().fold(0.0f32, |acc, v| acc.max(v.max_element()));
	tracing::info!(
		samples = last.live_samples,
		subgrids = last.subgrids,
		values = irradiance.len(),
		peak,
		"bake finished"
	);

	if let Some(output) = &args.output {
		write_irradiance(output, irradiance)?;
		tracing::info!(output = %output.display(), bytes = irradiance.len() * 16, "irradiance written");
	}

	Ok(())
}

/// Dump values as little-endian f32 RGBA.
fn write_irradiance(path: &Path, values: &[glam::Vec4]) -> Result<()> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		std::fs::create_dir_all(parent)
			.with_context(|| format!("Failed to create output dir: {}", parent.display()))?;
	}
	let file = std::fs::File::create(path)
		.with_context(|| format!("Failed to create output file: {}", path.display()))?;
	let mut writer = std::io::BufWriter::new(file);
	let floats: &[f32] = bytemuck::cast_slice(values);
	for value in floats {
		writer.write_all(&value.to_le_bytes())?;
	}
	writer
		.flush()
		.with_context(|| format!("Failed to write: {}", path.display()))?;
	Ok(())
}
