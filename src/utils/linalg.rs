// src/utils/linalg.rs

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// How fractional differences are treated before measuring a distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
  /// Plain difference, no periodic images. An atom at 0.999 and one at
  /// 0.001 along the same axis are a full cell apart.
  #[default]
  Open,
  /// Minimum image convention: each fractional difference is wrapped into
  /// [-0.5, 0.5) first.
  MinimumImage,
}

fn lattice_matrix(lattice: [[f64; 3]; 3]) -> Matrix3<f64> {
  Matrix3::from_row_slice(&[
    lattice[0][0],
    lattice[0][1],
    lattice[0][2],
    lattice[1][0],
    lattice[1][1],
    lattice[1][2],
    lattice[2][0],
    lattice[2][1],
    lattice[2][2],
  ])
}

/// Convert fractional coordinates to Cartesian using lattice matrix
///
/// # Arguments
/// * `frac` - Fractional coordinates [x, y, z]
/// * `lattice` - Lattice vectors as row matrix [[ax, ay, az], [bx, by, bz], [cx, cy, cz]]
///
/// # Formula
/// ```text
/// Cartesian = Lattice^T × Fractional   (i.e. the row vector frac · Lattice)
/// ```
pub fn frac_to_cart(frac: [f64; 3], lattice: [[f64; 3]; 3]) -> [f64; 3] {
  let cart_vec = lattice_matrix(lattice).transpose() * Vector3::from(frac);
  [cart_vec.x, cart_vec.y, cart_vec.z]
}

/// Convert Cartesian coordinates to fractional, or None if the lattice is singular
///
/// # Formula
/// ```text
/// Fractional = (Lattice^T)^-1 × Cartesian
/// ```
pub fn cart_to_frac(cart: [f64; 3], lattice: [[f64; 3]; 3]) -> Option<[f64; 3]> {
  let inv_lat = lattice_matrix(lattice).transpose().try_inverse()?;
  let frac_vec = inv_lat * Vector3::from(cart);
  Some([frac_vec.x, frac_vec.y, frac_vec.z])
}

/// Cell volume in Angstrom^3 (absolute value of the lattice determinant).
pub fn cell_volume(lattice: [[f64; 3]; 3]) -> f64 {
  lattice_matrix(lattice).determinant().abs()
}

/// Wrap a fractional difference into [-0.5, 0.5) per component.
pub fn wrap_fractional(delta: [f64; 3]) -> [f64; 3] {
  delta.map(|d| d - (d + 0.5).floor())
}

/// Cartesian distance (Angstrom) between two fractional positions.
///
/// Both positions are mapped through the same lattice; the result is the
/// Euclidean norm of the cartesian difference.
pub fn cartesian_distance(
  frac_a: [f64; 3],
  frac_b: [f64; 3],
  lattice: [[f64; 3]; 3],
  mode: BoundaryMode,
) -> f64 {
  let delta = [frac_a[0] - frac_b[0], frac_a[1] - frac_b[1], frac_a[2] - frac_b[2]];
  let delta = match mode {
    BoundaryMode::Open => delta,
    BoundaryMode::MinimumImage => wrap_fractional(delta),
  };
  let d = frac_to_cart(delta, lattice);
  Vector3::from(d).norm()
}

/// True when the lattices agree component-wise within `tol`.
pub fn lattices_match(a: [[f64; 3]; 3], b: [[f64; 3]; 3], tol: f64) -> bool {
  (lattice_matrix(a) - lattice_matrix(b)).amax() <= tol
}

#[cfg(test)]
mod tests {
  use super::*;

  const CUBIC_10: [[f64; 3]; 3] = [[10.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]];

  #[test]
  fn test_cubic_lattice() {
    // Simple cubic lattice 5.0 Å
    let lattice = [[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]];

    let cart = frac_to_cart([0.5, 0.5, 0.5], lattice);

    assert!((cart[0] - 2.5).abs() < 1e-10);
    assert!((cart[1] - 2.5).abs() < 1e-10);
    assert!((cart[2] - 2.5).abs() < 1e-10);
  }

  #[test]
  fn test_roundtrip() {
    // Non-orthogonal lattice
    let lattice = [[4.0, 0.0, 0.0], [2.0, 3.46, 0.0], [0.0, 0.0, 5.0]];

    let frac_orig = [0.333, 0.667, 0.25];
    let cart = frac_to_cart(frac_orig, lattice);
    let frac_back = cart_to_frac(cart, lattice).unwrap();

    for k in 0..3 {
      assert!((frac_back[k] - frac_orig[k]).abs() < 1e-10);
    }
  }

  #[test]
  fn test_cell_volume() {
    let lattice = [[4.0, 0.0, 0.0], [2.0, 3.0, 0.0], [0.0, 0.0, 5.0]];
    assert!((cell_volume(lattice) - 60.0).abs() < 1e-10);
  }

  #[test]
  fn test_singular_lattice() {
    let flat = [[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
    assert!(cart_to_frac([1.0, 1.0, 1.0], flat).is_none());
  }

  #[test]
  fn test_self_distance_is_zero() {
    let lattice = [[4.0, 0.0, 0.0], [2.0, 3.46, 0.0], [0.3, 0.1, 5.0]];
    for p in [[0.0, 0.0, 0.0], [0.123, 0.987, 0.5], [0.999, 0.001, 0.25]] {
      assert_eq!(cartesian_distance(p, p, lattice, BoundaryMode::Open), 0.0);
      assert_eq!(cartesian_distance(p, p, lattice, BoundaryMode::MinimumImage), 0.0);
    }
  }

  #[test]
  fn test_distance_is_symmetric() {
    let lattice = [[4.0, 0.0, 0.0], [2.0, 3.46, 0.0], [0.3, 0.1, 5.0]];
    let a = [0.1, 0.2, 0.3];
    let b = [0.7, 0.05, 0.9];
    let ab = cartesian_distance(a, b, lattice, BoundaryMode::Open);
    let ba = cartesian_distance(b, a, lattice, BoundaryMode::Open);
    assert!((ab - ba).abs() < 1e-12);
  }

  #[test]
  fn test_distance_uses_row_basis() {
    // Half a body diagonal of a 10 Å cube.
    let d = cartesian_distance([0.0; 3], [0.5; 3], CUBIC_10, BoundaryMode::Open);
    assert!((d - 75.0_f64.sqrt()).abs() < 1e-10);

    // b = (2, 3, 0): moving 1 along b is |b|, not 3.
    let lattice = [[4.0, 0.0, 0.0], [2.0, 3.0, 0.0], [0.0, 0.0, 5.0]];
    let d = cartesian_distance([0.0; 3], [0.0, 1.0, 0.0], lattice, BoundaryMode::Open);
    assert!((d - 13.0_f64.sqrt()).abs() < 1e-10);
  }

  #[test]
  fn test_open_boundary_does_not_wrap() {
    let a = [0.999, 0.0, 0.0];
    let b = [0.001, 0.0, 0.0];
    let open = cartesian_distance(a, b, CUBIC_10, BoundaryMode::Open);
    let wrapped = cartesian_distance(a, b, CUBIC_10, BoundaryMode::MinimumImage);
    assert!((open - 9.98).abs() < 1e-9);
    assert!((wrapped - 0.02).abs() < 1e-9);
  }

  #[test]
  fn test_wrap_range() {
    let w = wrap_fractional([0.5, -0.5, 1.25]);
    assert_eq!(w[0], -0.5);
    assert_eq!(w[1], -0.5);
    assert!((w[2] - 0.25).abs() < 1e-12);
  }

  #[test]
  fn test_lattices_match() {
    let mut other = CUBIC_10;
    other[2][2] += 0.0005;
    assert!(lattices_match(CUBIC_10, other, 0.001));
    other[2][2] += 0.01;
    assert!(!lattices_match(CUBIC_10, other, 0.001));
  }
}
