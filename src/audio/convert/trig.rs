//! Table-driven trigonometry for the interpolation kernel.
//!
//! Phases are expressed in *turns*: `fast_cos01(x) == cos(2πx)`. The table
//! covers one quarter turn and every other phase is folded into it through
//! the quadrant symmetries of cosine, so no transcendental call happens per
//! sample.

use std::sync::LazyLock;

use crate::audio::constants::{COS_TABLE_LEN, SINC_EPSILON};

/// `COS_TABLE[i] = cos(i · (π/2) / COS_TABLE_LEN)`, built once per process.
static COS_TABLE: LazyLock<Box<[f64]>> = LazyLock::new(|| {
    (0..COS_TABLE_LEN)
        .map(|i| (i as f64 * std::f64::consts::FRAC_PI_2 / COS_TABLE_LEN as f64).cos())
        .collect()
});

/// Forces the table to be built now instead of on the first sample.
pub fn warm_up() {
    LazyLock::force(&COS_TABLE);
}

/// `cos(2πx)` from the quarter-period table.
///
/// Quadrant boundaries are exact: phases of a quarter or three quarters of a
/// turn return `0.0`, whole turns return `1.0`, half turns `-1.0`.
pub fn fast_cos01(x: f64) -> f64 {
    const N: usize = COS_TABLE_LEN;

    let mut i = (4.0 * N as f64 * x.abs()) as usize;
    if i >= 4 * N {
        i %= 4 * N;
    }

    let (index, sign) = match i {
        i if i < N => (i, 1.0),
        i if i < 2 * N => (2 * N - i, -1.0),
        i if i < 3 * N => (i - 2 * N, -1.0),
        i => (4 * N - i, 1.0),
    };

    if index == N {
        return 0.0;
    }
    sign * COS_TABLE[index]
}

/// `sin(2πx)`: cosine a quarter turn behind.
#[inline]
pub fn fast_sin01(x: f64) -> f64 {
    fast_cos01(x - 0.25)
}

/// `sin(2πx) / (2πx)`, equal to 1 at the origin.
#[inline]
pub fn sinc01(x: f64) -> f64 {
    if x.abs() < SINC_EPSILON {
        return 1.0;
    }
    fast_sin01(x) / (x * 2.0 * std::f64::consts::PI)
}
