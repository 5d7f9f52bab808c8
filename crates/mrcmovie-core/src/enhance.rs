use serde::{Deserialize, Serialize};

use crate::consts::{
    ADAPTIVE_CLIP_HIGH_RANGE, ADAPTIVE_CLIP_LOW_RANGE, DEFAULT_CLIP_LIMIT, DEFAULT_TILE_GRID_SIZE,
};
use crate::error::{MovieError, Result};
use crate::filters::clahe::clahe;
use crate::filters::normalize::normalize_to_u8;
use crate::frame::{Frame, Slice};
use crate::stats::GlobalStats;

/// CLAHE parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnhanceParams {
    pub clip_limit: f32,
    pub tile_grid_size: usize,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self {
            clip_limit: DEFAULT_CLIP_LIMIT,
            tile_grid_size: DEFAULT_TILE_GRID_SIZE,
        }
    }
}

impl EnhanceParams {
    /// Scale the clip limit to the volume's dynamic range.
    ///
    /// | range | clip limit |
    /// |---|---|
    /// | < 1000 | `clip` clamped to [1, 5] |
    /// | < 10000 | `2 * clip` clamped to [5, 50] |
    /// | otherwise | `10 * clip` clamped to [30, 1000] |
    pub fn adapted_to(self, stats: &GlobalStats) -> Self {
        Self {
            clip_limit: adaptive_clip_limit(self.clip_limit, stats.range()),
            ..self
        }
    }
}

pub fn adaptive_clip_limit(clip_limit: f32, data_range: f32) -> f32 {
    if data_range < ADAPTIVE_CLIP_LOW_RANGE {
        clip_limit.clamp(1.0, 5.0)
    } else if data_range < ADAPTIVE_CLIP_HIGH_RANGE {
        (clip_limit * 2.0).clamp(5.0, 50.0)
    } else {
        (clip_limit * 10.0).clamp(30.0, 1000.0)
    }
}

/// Maps slices of one volume to 8-bit frames with fixed global statistics.
///
/// Holds only immutable values, so one instance is shared by every worker.
#[derive(Clone, Copy, Debug)]
pub struct ContrastEnhancer {
    stats: GlobalStats,
    params: EnhanceParams,
    shape: (usize, usize),
}

impl ContrastEnhancer {
    /// `shape` is the (height, width) every slice must have.
    pub fn new(stats: GlobalStats, params: EnhanceParams, shape: (usize, usize)) -> Self {
        Self {
            stats,
            params,
            shape,
        }
    }

    /// Normalize against the global bounds, then apply CLAHE.
    ///
    /// A degenerate range (`min == max`) yields an all-zero frame and skips
    /// CLAHE, so every frame of such a volume is identical.
    pub fn enhance(&self, slice: &Slice, slice_index: usize) -> Result<Frame> {
        let (h, w) = slice.dim();
        if h == 0 || w == 0 || (h, w) != self.shape {
            return Err(MovieError::Processing(format!(
                "slice {slice_index} has shape {h}x{w}, expected {}x{}",
                self.shape.0, self.shape.1
            )));
        }

        if self.stats.is_degenerate() {
            return Ok(Frame::filled(h, w, 0, slice_index));
        }

        let normalized = normalize_to_u8(slice, &self.stats);
        let equalized = clahe(
            &normalized,
            self.params.tile_grid_size,
            self.params.clip_limit,
        );
        Ok(Frame::new(equalized, slice_index))
    }
}
