use ndarray::Array2;

/// Output size for an image whose longer side is bounded by `output_size`.
///
/// Aspect ratio is preserved and dimensions are truncated, never below 1.
/// Without `allow_upscale`, images already within the bound keep their size.
pub fn fit_dimensions(
    height: usize,
    width: usize,
    output_size: usize,
    allow_upscale: bool,
) -> (usize, usize) {
    let longer = height.max(width);
    if longer == 0 || output_size == 0 || (longer <= output_size && !allow_upscale) {
        return (height, width);
    }
    // Integer arithmetic keeps the truncation exact.
    let scaled = |d: usize| ((d as u128 * output_size as u128 / longer as u128) as usize).max(1);
    (scaled(height), scaled(width))
}

/// Area-averaging resample: every output pixel is the coverage-weighted mean
/// of the source pixels under its footprint. Separable, deterministic.
pub fn resize_area(image: &Array2<u8>, new_height: usize, new_width: usize) -> Array2<u8> {
    let (h, w) = image.dim();
    if (h, w) == (new_height, new_width) {
        return image.clone();
    }
    if h == 0 || w == 0 || new_height == 0 || new_width == 0 {
        return Array2::zeros((new_height, new_width));
    }

    let col_weights = area_weights(w, new_width);
    let row_weights = area_weights(h, new_height);

    let mut horizontal = Array2::<f32>::zeros((h, new_width));
    for r in 0..h {
        for (c, taps) in col_weights.iter().enumerate() {
            horizontal[[r, c]] = taps
                .iter()
                .map(|&(src, weight)| image[[r, src]] as f32 * weight)
                .sum();
        }
    }

    let mut out = Array2::<u8>::zeros((new_height, new_width));
    for (r, taps) in row_weights.iter().enumerate() {
        for c in 0..new_width {
            let value: f32 = taps
                .iter()
                .map(|&(src, weight)| horizontal[[src, c]] * weight)
                .sum();
            out[[r, c]] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Per output index: (source index, normalized coverage weight) pairs.
fn area_weights(src_len: usize, dst_len: usize) -> Vec<Vec<(usize, f32)>> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|o| {
            let start = o as f64 * scale;
            let end = ((o + 1) as f64 * scale).min(src_len as f64);
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src_len);
            (first..last)
                .filter_map(|s| {
                    let overlap = end.min(s as f64 + 1.0) - start.max(s as f64);
                    (overlap > 1e-9).then(|| (s, (overlap / (end - start)) as f32))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_weights_sum_to_one() {
        for (src, dst) in [(10, 3), (7, 7), (3, 10), (2000, 512)] {
            for taps in area_weights(src, dst) {
                let total: f32 = taps.iter().map(|&(_, w)| w).sum();
                assert!((total - 1.0).abs() < 1e-4, "{src}->{dst}: {total}");
            }
        }
    }
}
