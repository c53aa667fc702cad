//! Word scoring curve.
use crate::constants::{LENGTH_POINTS, LEVEL_SCALE_CAP, LEVEL_SCALE_DENOMINATOR};

/// Points for a word of `len` characters found on `level`.
///
/// Non-decreasing in both length and level. Lengths past the table reuse the
/// last entry; words below the minimum length score nothing.
#[must_use]
pub fn word_score(len: usize, level: u32) -> u32 {
    let last = LENGTH_POINTS.len() - 1;
    let base = LENGTH_POINTS[len.min(last)];
    let scale = LEVEL_SCALE_DENOMINATOR + level.saturating_sub(1).min(LEVEL_SCALE_CAP);
    base.saturating_mul(scale) / LEVEL_SCALE_DENOMINATOR
}
