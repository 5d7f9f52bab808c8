use ndarray::Array2;

use crate::frame::Slice;
use crate::stats::GlobalStats;

/// Linear map of `[stats.min, stats.max]` onto `[0, 255]`, clipped and truncated.
///
/// Degenerate stats give an all-zero image instead of dividing by zero.
/// NaN samples map to 0.
pub fn normalize_to_u8(slice: &Slice, stats: &GlobalStats) -> Array2<u8> {
    if stats.is_degenerate() {
        return Array2::zeros(slice.dim());
    }
    let min = stats.min;
    let range = stats.range();
    slice.mapv(|v| (((v - min) / range).clamp(0.0, 1.0) * 255.0) as u8)
}
