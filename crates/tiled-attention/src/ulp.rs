//! Floating-point comparison for checking tiled output against the direct
//! reference computation.
//!
//! Two notions of "close" are supported through [`Tolerance`]: a count of
//! representable doubles between the values, or a relative error with an
//! absolute floor of 1.0 on the denominator.

/// How far apart two values may be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// At most this many representable `f64`s between the values.
    Ulps(u64),
    /// `|a - b| / max(|a|, |b|, 1)` at most this value.
    Relative(f64),
}

impl Tolerance {
    /// Whether `a` and `b` are within this tolerance. NaN is never within.
    #[must_use]
    pub fn admits(self, a: f64, b: f64) -> bool {
        match self {
            Self::Ulps(max) => ulp_distance(a, b) <= max,
            Self::Relative(tol) => relative_error(a, b, 1.0) <= tol,
        }
    }
}

/// Position of `x` on the number line of doubles: adjacent doubles map to
/// adjacent integers, and `-0.0` and `+0.0` both map to 0.
fn lattice_index(x: f64) -> i64 {
    let bits = x.to_bits() as i64;
    if bits < 0 {
        i64::MIN - bits
    } else {
        bits
    }
}

/// Number of representable doubles between `a` and `b`, counted across
/// zero. `u64::MAX` if either value is NaN.
#[must_use]
pub fn ulp_distance(a: f64, b: f64) -> u64 {
    if a.is_nan() || b.is_nan() {
        return u64::MAX;
    }
    lattice_index(a).abs_diff(lattice_index(b))
}

/// `|a - b| / max(|a|, |b|, floor)`. NaN in, NaN out.
#[must_use]
pub fn relative_error(a: f64, b: f64, floor: f64) -> f64 {
    (a - b).abs() / a.abs().max(b.abs()).max(floor)
}

/// Assert two slices agree elementwise under `tol`.
///
/// # Panics
///
/// Panics on length mismatch or at the first pair outside `tol`.
pub fn assert_within(a: &[f64], b: &[f64], tol: Tolerance) {
    assert_eq!(
        a.len(),
        b.len(),
        "slice length mismatch: {} vs {}",
        a.len(),
        b.len()
    );
    if let Some((i, (&va, &vb))) = a
        .iter()
        .zip(b.iter())
        .enumerate()
        .find(|(_, (&va, &vb))| !tol.admits(va, vb))
    {
        panic!(
            "mismatch at index {i}: {va} vs {vb} ({} ulps, relative error {}, allowed {tol:?})",
            ulp_distance(va, vb),
            relative_error(va, vb, 1.0)
        );
    }
}
