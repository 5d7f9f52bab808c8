use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::frame::Slice;

/// Normalization bounds shared by every frame of a retained range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub min: f32,
    pub max: f32,
}

impl GlobalStats {
    /// `min == max`: every retained sample has the same value.
    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    pub fn range(&self) -> f32 {
        self.max - self.min
    }
}

/// Running min/max over slices fed one at a time.
///
/// Non-finite samples are skipped.
#[derive(Clone, Debug, Default)]
pub struct RunningMinMax {
    bounds: Option<(f32, f32)>,
    slices_seen: usize,
}

impl RunningMinMax {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, slice: &Slice) {
        let local = slice
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f32, f32)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            });
        if let Some((lo, hi)) = local {
            self.bounds = Some(match self.bounds {
                None => (lo, hi),
                Some((a, b)) => (a.min(lo), b.max(hi)),
            });
        }
        self.slices_seen += 1;
    }

    pub fn slices_seen(&self) -> usize {
        self.slices_seen
    }

    /// Bounds seen so far; `{0, 0}` when no finite sample was seen.
    pub fn finish(&self) -> GlobalStats {
        let (min, max) = self.bounds.unwrap_or((0.0, 0.0));
        GlobalStats { min, max }
    }
}

/// Single streaming pass over decoded slices.
///
/// Only the slice currently yielded by `slices` is resident, so the pass
/// needs one slice of memory regardless of depth. `on_slice` is called with
/// the count of slices consumed so far.
pub fn compute_global_stats<I>(slices: I, on_slice: impl Fn(usize)) -> Result<GlobalStats>
where
    I: IntoIterator<Item = Result<(usize, Slice)>>,
{
    let mut acc = RunningMinMax::new();
    for item in slices {
        let (_, slice) = item?;
        acc.update(&slice);
        on_slice(acc.slices_seen());
    }
    let stats = acc.finish();
    debug!(
        min = stats.min,
        max = stats.max,
        slices = acc.slices_seen(),
        "Global statistics"
    );
    Ok(stats)
}
