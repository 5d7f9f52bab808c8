use ndarray::Array2;

use crate::consts::HISTOGRAM_BINS;

type Lut = [u8; HISTOGRAM_BINS];

/// Contrast-limited adaptive histogram equalization of an 8-bit image.
///
/// The image is split into a `tile_grid_size x tile_grid_size` grid (fewer
/// tiles along an axis shorter than the grid). Each tile gets a clipped
/// histogram equalization LUT; pixels are mapped by bilinear interpolation
/// between the LUTs of the four nearest tile centers. `clip_limit <= 0`
/// disables clipping (plain tiled equalization).
pub fn clahe(image: &Array2<u8>, tile_grid_size: usize, clip_limit: f32) -> Array2<u8> {
    let (h, w) = image.dim();
    if h == 0 || w == 0 {
        return image.clone();
    }

    let grid_y = tile_grid_size.clamp(1, h);
    let grid_x = tile_grid_size.clamp(1, w);
    let row_bounds = tile_bounds(h, grid_y);
    let col_bounds = tile_bounds(w, grid_x);

    let mut luts: Vec<Lut> = Vec::with_capacity(grid_y * grid_x);
    for ty in 0..grid_y {
        for tx in 0..grid_x {
            let rows = row_bounds[ty]..row_bounds[ty + 1];
            let cols = col_bounds[tx]..col_bounds[tx + 1];
            let mut hist = [0u32; HISTOGRAM_BINS];
            for r in rows.clone() {
                for c in cols.clone() {
                    hist[image[[r, c]] as usize] += 1;
                }
            }
            let area = (rows.len() * cols.len()) as u32;
            if clip_limit > 0.0 {
                let limit = ((clip_limit * area as f32 / HISTOGRAM_BINS as f32) as u32).max(1);
                clip_histogram(&mut hist, limit);
            }
            luts.push(equalization_lut(&hist, area));
        }
    }

    let row_weights = interpolation_weights(&row_bounds);
    let col_weights = interpolation_weights(&col_bounds);

    let mut out = Array2::<u8>::zeros((h, w));
    for (r, &(ty0, ty1, wy)) in row_weights.iter().enumerate() {
        for (c, &(tx0, tx1, wx)) in col_weights.iter().enumerate() {
            let v = image[[r, c]] as usize;
            let l00 = luts[ty0 * grid_x + tx0][v] as f32;
            let l01 = luts[ty0 * grid_x + tx1][v] as f32;
            let l10 = luts[ty1 * grid_x + tx0][v] as f32;
            let l11 = luts[ty1 * grid_x + tx1][v] as f32;
            let top = l00 + (l01 - l00) * wx;
            let bottom = l10 + (l11 - l10) * wx;
            let value = top + (bottom - top) * wy;
            out[[r, c]] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Boundaries of `grid` near-equal, non-empty tiles over `len` pixels.
/// Requires `1 <= grid <= len`.
fn tile_bounds(len: usize, grid: usize) -> Vec<usize> {
    (0..=grid).map(|t| t * len / grid).collect()
}

/// Cap every bin at `limit` and spread the excess over all bins: an equal
/// share to each, then the remainder one count at a time at a fixed stride.
fn clip_histogram(hist: &mut [u32; HISTOGRAM_BINS], limit: u32) {
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    if excess == 0 {
        return;
    }

    let share = excess / HISTOGRAM_BINS as u32;
    let mut residual = excess % HISTOGRAM_BINS as u32;
    for bin in hist.iter_mut() {
        *bin += share;
    }
    if residual > 0 {
        let stride = (HISTOGRAM_BINS / residual as usize).max(1);
        for i in (0..HISTOGRAM_BINS).step_by(stride) {
            if residual == 0 {
                break;
            }
            hist[i] += 1;
            residual -= 1;
        }
    }
}

/// Cumulative-distribution LUT scaled to [0, 255].
fn equalization_lut(hist: &[u32; HISTOGRAM_BINS], area: u32) -> Lut {
    let scale = 255.0 / area.max(1) as f32;
    let mut lut = [0u8; HISTOGRAM_BINS];
    let mut cumulative = 0u32;
    for (entry, &count) in lut.iter_mut().zip(hist.iter()) {
        cumulative += count;
        *entry = (cumulative as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

/// For each pixel along one axis: the two neighbouring tiles and the weight
/// of the second one. Pixels outside the outermost tile centers clamp to
/// the edge tile.
fn interpolation_weights(bounds: &[usize]) -> Vec<(usize, usize, f32)> {
    let tiles = bounds.len() - 1;
    let len = bounds[tiles];
    let centers: Vec<f32> = (0..tiles)
        .map(|t| (bounds[t] + bounds[t + 1]) as f32 / 2.0 - 0.5)
        .collect();

    (0..len)
        .map(|p| {
            let p = p as f32;
            if p <= centers[0] {
                return (0, 0, 0.0);
            }
            if p >= centers[tiles - 1] {
                return (tiles - 1, tiles - 1, 0.0);
            }
            let t0 = centers.iter().rposition(|&c| c <= p).unwrap_or(0);
            let t1 = (t0 + 1).min(tiles - 1);
            let span = centers[t1] - centers[t0];
            let weight = if span > 0.0 { (p - centers[t0]) / span } else { 0.0 };
            (t0, t1, weight)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_preserves_total_count() {
        let mut hist = [0u32; HISTOGRAM_BINS];
        hist[10] = 500;
        hist[200] = 37;
        let total: u32 = hist.iter().sum();

        clip_histogram(&mut hist, 4);

        assert_eq!(hist.iter().sum::<u32>(), total);
        // 529 excess counts: 2 to every bin, 17 spread at stride 15.
        assert_eq!(hist[10], 4 + 2);
        assert_eq!(hist[15], 2 + 1);
        assert_eq!(hist[1], 2);
    }

    #[test]
    fn test_tile_bounds_partition() {
        assert_eq!(tile_bounds(10, 3), vec![0, 3, 6, 10]);
        assert_eq!(tile_bounds(8, 8), (0..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_lut_is_monotonic() {
        let mut hist = [1u32; HISTOGRAM_BINS];
        hist[0] = 100;
        let lut = equalization_lut(&hist, hist.iter().sum());
        assert!(lut.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(lut[HISTOGRAM_BINS - 1], 255);
    }

    #[test]
    fn test_weights_clamp_at_edges() {
        let weights = interpolation_weights(&[0, 4, 8]);
        assert_eq!(weights[0], (0, 0, 0.0));
        assert_eq!(weights[7], (1, 1, 0.0));
        let (t0, t1, w) = weights[4];
        assert_eq!((t0, t1), (0, 1));
        assert!(w > 0.0 && w < 1.0);
    }
}
