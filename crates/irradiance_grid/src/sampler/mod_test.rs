use super::*;

use std::f32::consts::PI;

use approx::assert_abs_diff_eq;
use rayon::prelude::*;

use crate::scene::{BoundsProxy, Room, Surface};
use crate::transform::GridTransform;

fn uniform_room(radiance: Vec3) -> Room {
  Room::with_surfaces(GridTransform::from_scale(10.0), [Surface::with_radiance(radiance); 6])
}

#[test]
fn test_samples_count_matches_directions() {
  let sampler = RadianceSampler::new(9);
  assert_eq!(sampler.samples_count(), 162);
  assert_eq!(sampler.resolution(), 9);
  assert_eq!(RadianceSampler::default().resolution(), RadianceSampler::DEFAULT_RESOLUTION);
}

#[test]
#[should_panic(expected = "one value per sampling direction")]
fn test_wrong_output_size_panics() {
  let sampler = RadianceSampler::new(3);
  let mut out = vec![Vec4::ZERO; 5];
  sampler.sample::<Room>(Vec3::ZERO, &[], &mut out);
}

/// No objects: every ray misses and the result is dark.
#[test]
fn test_empty_scene_is_dark() {
  let sampler = RadianceSampler::new(4);
  let mut out = vec![Vec4::ONE; sampler.samples_count()];
  sampler.sample::<Room>(Vec3::ZERO, &[], &mut out);
  assert!(out.iter().all(|v| *v == Vec4::ZERO));
}

/// Objects without radiance contribute nothing.
#[test]
fn test_dark_surfaces_contribute_nothing() {
  let sampler = RadianceSampler::new(4);
  let room = Room::with_surfaces(GridTransform::from_scale(4.0), [Surface::DARK; 6]);
  let mut out = vec![Vec4::ONE; sampler.samples_count()];
  sampler.sample(Vec3::ZERO, &[room], &mut out);
  assert!(out.iter().all(|v| *v == Vec4::ZERO));
}

/// Inside a uniformly lit closed room every direction sees about pi * L.
#[test]
fn test_uniform_room_irradiance() {
  let radiance = Vec3::new(0.2, 0.4, 0.8);
  let room = uniform_room(radiance);
  let sampler = RadianceSampler::new(16);
  let mut out = vec![Vec4::ZERO; sampler.samples_count()];
  sampler.sample(Vec3::new(1.0, -2.0, 0.5), &[room], &mut out);

  for v in &out {
    assert_abs_diff_eq!(v.x, radiance.x * PI, epsilon = radiance.x * PI * 0.05);
    assert_abs_diff_eq!(v.y, radiance.y * PI, epsilon = radiance.y * PI * 0.05);
    assert_abs_diff_eq!(v.z, radiance.z * PI, epsilon = radiance.z * PI * 0.05);
    assert_eq!(v.w, 0.0);
  }
}

/// The red left wall lights directions pointing at it more than the opposite ones.
#[test]
fn test_coloured_walls_tint_matching_directions() {
  let room = Room::new(GridTransform::from_scale(Room::DEFAULT_SCALE));
  let sampler = RadianceSampler::new(9);
  let mut out = vec![Vec4::ZERO; sampler.samples_count()];
  sampler.sample(Vec3::ZERO, &[room], &mut out);

  let dirs = sampler.directions().directions();
  let (towards_left, towards_right): (Vec<_>, Vec<_>) = dirs
    .iter()
    .zip(&out)
    .filter(|(d, _)| d.x.abs() > 0.8)
    .partition(|(d, _)| d.x < 0.0);
  let red_left: f32 = towards_left.iter().map(|(_, v)| v.x).sum::<f32>() / towards_left.len() as f32;
  let red_right: f32 = towards_right.iter().map(|(_, v)| v.x).sum::<f32>() / towards_right.len() as f32;
  let blue_left: f32 = towards_left.iter().map(|(_, v)| v.z).sum::<f32>() / towards_left.len() as f32;
  let blue_right: f32 = towards_right.iter().map(|(_, v)| v.z).sum::<f32>() / towards_right.len() as f32;
  assert!(red_left > red_right, "red left {red_left}, red right {red_right}");
  assert!(blue_right > blue_left, "blue left {blue_left}, blue right {blue_right}");
}

/// Sampling never produces negative components or a non-zero w.
#[test]
fn test_sample_output_invariants() {
  let room = Room::with_default_scale();
  let proxy = BoundsProxy::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
  let objects: Vec<Box<dyn ShadeableObject>> = vec![Box::new(room), Box::new(proxy)];
  let sampler = RadianceSampler::new(7);
  for point in [Vec3::ZERO, Vec3::new(5.0, 5.0, -5.0), Vec3::new(-7.0, 0.0, 7.0)] {
    let mut out = vec![Vec4::ZERO; sampler.samples_count()];
    sampler.sample(point, &objects, &mut out);
    for v in &out {
      assert!(v.x >= 0.0 && v.y >= 0.0 && v.z >= 0.0, "negative irradiance {v} at {point}");
      assert_eq!(v.w, 0.0);
    }
  }
}

/// Forcing either integration mode gives the same answer.
#[test]
fn test_modes_agree_on_real_scene() {
  let room = Room::with_default_scale();
  let scalar = RadianceSampler::new(15).with_mode(IntegrationMode::Scalar);
  let vectorized = RadianceSampler::new(15).with_mode(IntegrationMode::Vectorized);
  let mut a = vec![Vec4::ZERO; scalar.samples_count()];
  let mut b = vec![Vec4::ZERO; vectorized.samples_count()];
  scalar.sample(Vec3::new(2.0, 1.0, -3.0), std::slice::from_ref(&room), &mut a);
  vectorized.sample(Vec3::new(2.0, 1.0, -3.0), std::slice::from_ref(&room), &mut b);

  for (x, y) in a.iter().zip(&b) {
    for k in 0..3 {
      let scale = x[k].abs().max(y[k].abs()).max(1e-6);
      assert!((x[k] - y[k]).abs() <= 1e-5 * scale, "{x} vs {y}");
    }
  }
}

/// Scratch buffers go back to the pool after sampling.
#[test]
fn test_scratch_buffer_is_reused() {
  let room = Room::with_default_scale();
  let sampler = RadianceSampler::new(5);
  let mut out = vec![Vec4::ZERO; sampler.samples_count()];
  sampler.sample(Vec3::ZERO, std::slice::from_ref(&room), &mut out);
  sampler.sample(Vec3::ONE, std::slice::from_ref(&room), &mut out);
  assert_eq!(sampler.pool().idle_count(), 1);
}

/// Changing the resolution resizes the output and drops stale buffers.
#[test]
fn test_set_resolution() {
  let room = Room::with_default_scale();
  let mut sampler = RadianceSampler::new(3);
  let mut out = vec![Vec4::ZERO; sampler.samples_count()];
  sampler.sample(Vec3::ZERO, std::slice::from_ref(&room), &mut out);

  sampler.set_resolution(6);
  assert_eq!(sampler.samples_count(), 72);
  assert_eq!(sampler.pool().idle_count(), 0);
  let mut out = vec![Vec4::ZERO; sampler.samples_count()];
  sampler.sample(Vec3::ZERO, std::slice::from_ref(&room), &mut out);
  assert!(out.iter().any(|v| v.x > 0.0));
}

/// Parallel sampling through the bound seam matches serial sampling.
#[test]
fn test_parallel_matches_serial() {
  let room = Room::with_default_scale();
  let sampler = RadianceSampler::new(6);
  let objects = [room];
  let bound = sampler.bind(&objects);
  let n = bound.directions_count();
  let points: Vec<Vec3> = (0..32).map(|i| Vec3::new(i as f32 * 0.4 - 6.0, 1.0, -2.0)).collect();

  let mut serial = vec![Vec4::ZERO; n * points.len()];
  for (chunk, p) in serial.chunks_mut(n).zip(&points) {
    bound.sample(*p, chunk);
  }

  let mut parallel = vec![Vec4::ZERO; n * points.len()];
  parallel
    .par_chunks_mut(n)
    .zip(points.par_iter())
    .for_each(|(chunk, p)| bound.sample(*p, chunk));

  assert_eq!(serial, parallel);
}
