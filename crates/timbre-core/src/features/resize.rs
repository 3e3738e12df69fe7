//! 2D image-style resize of a spectrogram
//!
//! Reproduces the resize the classifier's training data went through:
//!
//! 1. When an axis shrinks, Gaussian anti-aliasing along it with
//!    `sigma = (factor - 1) / 2`, kernel truncated at 4 sigma
//! 2. Bilinear interpolation on pixel-centre aligned coordinates:
//!    `x_in = (x_out + 0.5) * factor - 0.5`
//! 3. Clip to the value range of the input
//!
//! Boundaries mirror about the edge sample (`d c b | a b c d | c b a`) in both
//! the filter and the interpolation. Values are resampled, never rescaled.
//!
//! Smoothing and sampling along one axis commute with both steps along the
//! other, so each axis is resampled in a single pass. Interpolation reads at
//! most two inputs per output, so the smoothed value is only computed at those
//! positions: cost is `O(out_len * kernel_len)` per lane regardless of how long
//! the clip is.

use ndarray::{Array2, ArrayView1, ArrayViewMut1, Axis};

/// Kernel truncation in standard deviations
const TRUNCATE: f64 = 4.0;

/// Resize `input` to `(rows, cols)`.
pub fn resize(input: &Array2<f32>, (rows, cols): (usize, usize)) -> Array2<f32> {
    let (in_rows, in_cols) = input.dim();
    if in_rows == 0 || in_cols == 0 || rows == 0 || cols == 0 {
        return Array2::zeros((rows, cols));
    }

    // Time axis first: it usually shrinks the most, so the second pass is small
    let work = resample_axis(input, Axis(1), cols);
    let mut out = resample_axis(&work, Axis(0), rows);

    let (lo, hi) = value_range(input);
    out.mapv_inplace(|v| v.clamp(lo, hi));
    out
}

/// Anti-aliasing sigma for resampling `in_len` samples to `out_len`
fn antialias_sigma(in_len: usize, out_len: usize) -> Option<f64> {
    let factor = in_len as f64 / out_len as f64;
    let sigma = ((factor - 1.0) / 2.0).max(0.0);
    (sigma > 1e-15).then_some(sigma)
}

/// Reflect an out-of-range index about the edge samples
fn mirror_index(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let i = i.rem_euclid(period);
    if i >= len as isize {
        (period - i) as usize
    } else {
        i as usize
    }
}

/// Reflect an out-of-range coordinate about the edge samples
fn mirror_coord(x: f64, len: usize) -> f64 {
    if len == 1 {
        return 0.0;
    }
    let period = 2.0 * (len as f64 - 1.0);
    let x = x.rem_euclid(period);
    if x > len as f64 - 1.0 {
        period - x
    } else {
        x
    }
}

fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (TRUNCATE * sigma + 0.5) as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x * x) as f64 / (sigma * sigma)).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Where output sample `o` reads from: `src[lo] * (1 - frac) + src[hi] * frac`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Tap {
    lo: usize,
    hi: usize,
    frac: f64,
}

fn interpolation_taps(in_len: usize, out_len: usize) -> Vec<Tap> {
    let factor = in_len as f64 / out_len as f64;
    (0..out_len)
        .map(|o| {
            let x = mirror_coord((o as f64 + 0.5) * factor - 0.5, in_len);
            let lo = x.floor() as usize;
            Tap {
                lo,
                hi: mirror_index(lo as isize + 1, in_len),
                frac: x - lo as f64,
            }
        })
        .collect()
}

/// A lane extended by `radius` mirrored samples on each side
struct PaddedLane {
    samples: Vec<f32>,
    radius: usize,
}

impl PaddedLane {
    fn new(radius: usize) -> Self {
        Self {
            samples: Vec::new(),
            radius,
        }
    }

    fn fill(&mut self, src: ArrayView1<f32>) {
        let len = src.len();
        let r = self.radius as isize;
        self.samples.clear();
        self.samples
            .extend((-r..len as isize + r).map(|j| src[mirror_index(j, len)]));
    }

    /// Gaussian-smoothed value at input index `i`
    fn smoothed(&self, kernel: &[f64], i: usize) -> f32 {
        let window = &self.samples[i..i + kernel.len()];
        let acc: f64 = window
            .iter()
            .zip(kernel)
            .map(|(&s, &w)| w * s as f64)
            .sum();
        acc as f32
    }
}

/// Resample every lane along `axis` to `out_len`, smoothing first if it shrinks
fn resample_axis(input: &Array2<f32>, axis: Axis, out_len: usize) -> Array2<f32> {
    let in_len = input.len_of(axis);
    let mut shape = [input.nrows(), input.ncols()];
    shape[axis.index()] = out_len;
    let mut out = Array2::<f32>::zeros(shape);

    let taps = interpolation_taps(in_len, out_len);

    match antialias_sigma(in_len, out_len) {
        Some(sigma) => {
            let kernel = gaussian_kernel(sigma);
            let mut lane = PaddedLane::new(kernel.len() / 2);
            for (src, dst) in input.lanes(axis).into_iter().zip(out.lanes_mut(axis)) {
                lane.fill(src);
                interpolate_lane(&taps, dst, |i| lane.smoothed(&kernel, i));
            }
        }
        None => {
            for (src, dst) in input.lanes(axis).into_iter().zip(out.lanes_mut(axis)) {
                interpolate_lane(&taps, dst, |i| src[i]);
            }
        }
    }

    out
}

fn interpolate_lane(taps: &[Tap], mut dst: ArrayViewMut1<f32>, sample: impl Fn(usize) -> f32) {
    for (value, tap) in dst.iter_mut().zip(taps) {
        let a = sample(tap.lo) as f64;
        let b = if tap.frac == 0.0 { 0.0 } else { sample(tap.hi) as f64 };
        *value = (a * (1.0 - tap.frac) + b * tap.frac) as f32;
    }
}

fn value_range(input: &Array2<f32>) -> (f32, f32) {
    input.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    /// Straightforward form: smooth whole lanes on both axes, then zoom
    fn resize_full_filter(input: &Array2<f32>, (rows, cols): (usize, usize)) -> Array2<f32> {
        let mut work = input.clone();
        for (axis, out_len) in [(Axis(0), rows), (Axis(1), cols)] {
            if let Some(sigma) = antialias_sigma(work.len_of(axis), out_len) {
                let kernel = gaussian_kernel(sigma);
                let radius = (kernel.len() / 2) as isize;
                let mut smoothed = Array2::<f32>::zeros(work.dim());
                for (src, mut dst) in work.lanes(axis).into_iter().zip(smoothed.lanes_mut(axis)) {
                    let len = src.len();
                    for i in 0..len {
                        let acc: f64 = kernel
                            .iter()
                            .enumerate()
                            .map(|(k, &w)| w * src[mirror_index(i as isize + k as isize - radius, len)] as f64)
                            .sum();
                        dst[i] = acc as f32;
                    }
                }
                work = smoothed;
            }
        }
        for (axis, out_len) in [(Axis(0), rows), (Axis(1), cols)] {
            let taps = interpolation_taps(work.len_of(axis), out_len);
            let mut shape = [work.nrows(), work.ncols()];
            shape[axis.index()] = out_len;
            let mut zoomed = Array2::<f32>::zeros(shape);
            for (src, dst) in work.lanes(axis).into_iter().zip(zoomed.lanes_mut(axis)) {
                interpolate_lane(&taps, dst, |i| src[i]);
            }
            work = zoomed;
        }
        let (lo, hi) = value_range(input);
        work.mapv_inplace(|v| v.clamp(lo, hi));
        work
    }

    fn textured(shape: (usize, usize)) -> Array2<f32> {
        Array2::from_shape_fn(shape, |(r, c)| {
            ((r * 7 + c * 13) % 17) as f32 + (c as f32 * 0.01).sin() * 3.0
        })
    }

    #[test]
    fn test_mirror_index() {
        assert_eq!(mirror_index(-1, 4), 1);
        assert_eq!(mirror_index(-3, 4), 3);
        assert_eq!(mirror_index(4, 4), 2);
        assert_eq!(mirror_index(5, 4), 1);
        assert_eq!(mirror_index(7, 1), 0);
    }

    #[test]
    fn test_kernel_is_normalized() {
        let k = gaussian_kernel(0.14);
        assert_eq!(k.len(), 3);
        assert!((k.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(k[1] > k[0] && (k[0] - k[2]).abs() < 1e-15);
    }

    #[test]
    fn test_padded_lane_mirrors_edges() {
        let src = ndarray::arr1(&[1.0f32, 2.0, 3.0, 4.0]);
        let mut lane = PaddedLane::new(2);
        lane.fill(src.view());
        assert_eq!(lane.samples, vec![3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0]);

        // Kernel wider than the lane still reflects correctly
        let short = ndarray::arr1(&[5.0f32, 9.0]);
        let mut lane = PaddedLane::new(3);
        lane.fill(short.view());
        assert_eq!(lane.samples, vec![9.0, 5.0, 9.0, 5.0, 9.0, 5.0, 9.0, 5.0]);
    }

    #[test]
    fn test_matches_full_filter() {
        for (shape, target) in [
            ((128, 431), (100, 100)),
            ((128, 37), (100, 100)),
            ((40, 2600), (100, 100)),
            ((9, 5), (4, 3)),
        ] {
            let input = textured(shape);
            let fast = resize(&input, target);
            let reference = resize_full_filter(&input, target);
            assert_eq!(fast.dim(), reference.dim());
            let worst = fast
                .iter()
                .zip(reference.iter())
                .fold(0.0f32, |m, (a, b)| m.max((a - b).abs()));
            assert!(worst < 1e-4, "{:?} -> {:?}: max diff {}", shape, target, worst);
        }
    }

    #[test]
    fn test_long_input_is_fast() {
        // Ten minutes at 44.1 kHz is about 52k frames
        let input = textured((128, 50_000));
        let start = Instant::now();
        let out = resize(&input, (100, 100));
        let elapsed = start.elapsed();

        assert_eq!(out.dim(), (100, 100));
        assert!(out.iter().all(|v| v.is_finite()));
        assert!(elapsed < Duration::from_secs(10), "resize took {:?}", elapsed);
    }

    #[test]
    fn test_constant_stays_constant() {
        for shape in [(128, 1292), (128, 40), (50, 7)] {
            let input = Array2::from_elem(shape, 3.5f32);
            let out = resize(&input, (100, 100));
            assert_eq!(out.dim(), (100, 100));
            assert!(out.iter().all(|&v| (v - 3.5).abs() < 1e-5), "shape {:?}", shape);
        }
    }

    #[test]
    fn test_identity_size_without_filter() {
        let input = Array2::from_shape_fn((100, 100), |(r, c)| (r * 100 + c) as f32);
        let out = resize(&input, (100, 100));
        assert_eq!(out, input);
    }

    #[test]
    fn test_upsample_interpolates_linearly() {
        // 2 -> 4 along columns: pixel centres at -0.25, 0.25, 0.75, 1.25
        let input = Array2::from_shape_vec((1, 2), vec![0.0f32, 4.0]).unwrap();
        let out = resize(&input, (1, 4));
        let expected = [1.0f32, 1.0, 3.0, 3.0];
        for (got, want) in out.iter().zip(expected) {
            assert!((got - want).abs() < 1e-5, "{:?}", out);
        }
    }

    #[test]
    fn test_output_within_input_range() {
        let input = Array2::from_shape_fn((128, 431), |(r, c)| ((r * 7 + c * 13) % 17) as f32);
        let out = resize(&input, (100, 100));
        assert!(out.iter().all(|&v| (0.0..=16.0).contains(&v)));
    }

    #[test]
    fn test_downsample_averages_alternating_pattern() {
        // Anti-aliasing should pull a 0/1 stripe pattern towards its mean
        let input = Array2::from_shape_fn((1, 1000), |(_, c)| (c % 2) as f32);
        let out = resize(&input, (1, 100));
        assert!(out.iter().all(|&v| (v - 0.5).abs() < 0.05), "{:?}", out);
    }
}
