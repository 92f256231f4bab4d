use super::*;

use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::hemisphere::HemisphereDirections;

/// Interleave a direction set with per-direction radiance.
fn interleave(directions: &[Vec3], radiance: impl Fn(usize, Vec3) -> Vec3) -> Vec<Vec4> {
  directions
    .iter()
    .enumerate()
    .flat_map(|(i, d)| [d.extend(0.0), radiance(i, *d).extend(0.0)])
    .collect()
}

fn random_radiance(seed: u64, directions: &[Vec3]) -> Vec<Vec4> {
  let mut rng = StdRng::seed_from_u64(seed);
  let values: Vec<Vec3> = (0..directions.len())
    .map(|_| Vec3::new(rng.random::<f32>(), rng.random::<f32>(), rng.random::<f32>()) * 3.0)
    .collect();
  interleave(directions, |i, _| values[i])
}

fn assert_relative_eq_vec(a: Vec4, b: Vec4, relative: f32) {
  for k in 0..4 {
    let (x, y) = (a[k], b[k]);
    let scale = x.abs().max(y.abs()).max(1e-6);
    assert!(
      (x - y).abs() <= relative * scale,
      "component {k}: {x} vs {y} (relative error {})",
      (x - y).abs() / scale
    );
  }
}

// =========================================================================
// Mode selection
// =========================================================================

#[test]
fn test_auto_switches_at_threshold() {
  assert_eq!(IntegrationMode::Auto.resolve(9), IntegrationMode::Scalar);
  assert_eq!(IntegrationMode::Auto.resolve(14), IntegrationMode::Scalar);
  assert_eq!(IntegrationMode::Auto.resolve(15), IntegrationMode::Vectorized);
  assert_eq!(IntegrationMode::Auto.resolve(29), IntegrationMode::Vectorized);
  assert_eq!(IntegrationMode::Scalar.resolve(29), IntegrationMode::Scalar);
  assert_eq!(IntegrationMode::Vectorized.resolve(2), IntegrationMode::Vectorized);
}

#[test]
#[should_panic(expected = "two entries per output value")]
fn test_length_mismatch_panics() {
  let input = vec![Vec4::ZERO; 6];
  let mut out = vec![Vec4::ZERO; 4];
  integrate_scalar(&input, &mut out);
}

// =========================================================================
// Invariants
// =========================================================================

/// Random inputs never produce negative components, and w is exactly zero.
#[test]
fn test_non_negative_and_zero_w() {
  for (seed, r) in [(1u64, 3u32), (2, 9), (3, 15)] {
    let set = HemisphereDirections::new(r);
    let input = random_radiance(seed, set.directions());
    let mut scalar = vec![Vec4::ONE; set.len()];
    let mut vectorized = vec![Vec4::ONE; set.len()];
    integrate_scalar(&input, &mut scalar);
    integrate_vectorized(&input, &mut vectorized);

    for v in scalar.iter().chain(vectorized.iter()) {
      assert!(v.x >= 0.0 && v.y >= 0.0 && v.z >= 0.0, "negative irradiance {v}");
      assert_eq!(v.w, 0.0);
    }
  }
}

/// Scalar and vectorized agree within 1e-5 relative error.
#[test]
fn test_scalar_vectorized_equivalence() {
  for (seed, r) in [(7u64, 2u32), (8, 9), (9, 16), (10, 21)] {
    let set = HemisphereDirections::new(r);
    let input = random_radiance(seed, set.directions());
    let mut scalar = vec![Vec4::ZERO; set.len()];
    let mut vectorized = vec![Vec4::ZERO; set.len()];
    integrate_scalar(&input, &mut scalar);
    integrate_vectorized(&input, &mut vectorized);

    for (a, b) in scalar.iter().zip(&vectorized) {
      assert_relative_eq_vec(*a, *b, 1e-5);
    }
  }
}

/// Radiance only in the lower hemisphere mostly lights downward directions.
#[test]
fn test_directional_radiance() {
  let set = HemisphereDirections::new(8);
  let input = interleave(set.directions(), |_, d| {
    if d.y < 0.0 {
      Vec3::ONE
    } else {
      Vec3::ZERO
    }
  });
  let mut out = vec![Vec4::ZERO; set.len()];
  integrate_vectorized(&input, &mut out);

  let half = set.len() / 2;
  let up_total: f32 = out[..half].iter().map(|v| v.x).sum();
  let down_total: f32 = out[half..].iter().map(|v| v.x).sum();
  assert!(down_total > up_total * 2.0, "up {up_total}, down {down_total}");
}

/// Uniform radiance L over the sphere integrates to roughly pi * L.
#[test]
fn test_uniform_radiance_integrates_to_pi() {
  let set = HemisphereDirections::new(16);
  let radiance = Vec3::new(0.5, 1.0, 2.0);
  let input = interleave(set.directions(), |_, _| radiance);

  let mut scalar = vec![Vec4::ZERO; set.len()];
  integrate_scalar(&input, &mut scalar);
  for v in &scalar {
    let expected = radiance * PI;
    assert_abs_diff_eq!(v.x, expected.x, epsilon = expected.x * 0.05);
    assert_abs_diff_eq!(v.y, expected.y, epsilon = expected.y * 0.05);
    assert_abs_diff_eq!(v.z, expected.z, epsilon = expected.z * 0.05);
  }
}

/// Zero radiance in, zero irradiance out.
#[test]
fn test_dark_input_is_dark() {
  let set = HemisphereDirections::new(4);
  let input = interleave(set.directions(), |_, _| Vec3::ZERO);
  let mut out = vec![Vec4::ONE; set.len()];
  integrate(IntegrationMode::Auto, 4, &input, &mut out);
  assert!(out.iter().all(|v| *v == Vec4::ZERO));
}
