//! Threshold-based dispatch between sequential and rayon execution
//!
//! Only work whose result does not depend on evaluation order goes through
//! these helpers: per-pixel point operations and integer accumulations.
//! Floating-point reductions stay sequential so that repeated runs are
//! bit-identical.

use rayon::prelude::*;

/// Minimum number of pixels to trigger parallel processing
pub(crate) const PARALLEL_THRESHOLD: usize = 30_000;

/// Apply `f` to every pixel (a chunk of `channels` samples) in place.
///
/// Each invocation sees exactly one pixel, so the output does not depend on
/// whether the sequential or the parallel path runs.
pub(crate) fn for_each_pixel_mut<F>(data: &mut [u16], channels: usize, f: F)
where
    F: Fn(&mut [u16]) + Sync,
{
    let num_pixels = data.len() / channels;

    if num_pixels >= PARALLEL_THRESHOLD {
        data.par_chunks_exact_mut(channels).for_each(&f);
    } else {
        for pixel in data.chunks_exact_mut(channels) {
            f(pixel);
        }
    }
}

/// Fold pixels into an accumulator and merge partial accumulators.
///
/// Callers must only use this with associative, order-independent merges
/// (integer counts), never with float sums.
pub(crate) fn fold_pixels<A, I, F, R>(
    data: &[u16],
    channels: usize,
    init: I,
    fold_fn: F,
    reduce_fn: R,
) -> A
where
    A: Send,
    I: Fn() -> A + Sync + Send,
    F: Fn(A, &[u16]) -> A + Sync + Send,
    R: Fn(A, A) -> A + Sync + Send,
{
    let num_pixels = data.len() / channels;

    if num_pixels >= PARALLEL_THRESHOLD {
        data.par_chunks_exact(channels)
            .fold(&init, &fold_fn)
            .reduce(&init, &reduce_fn)
    } else {
        let mut acc = init();
        for pixel in data.chunks_exact(channels) {
            acc = fold_fn(acc, pixel);
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_each_pixel_mut_small() {
        let mut data = vec![1u16, 2, 3, 4, 5, 6];
        for_each_pixel_mut(&mut data, 3, |pixel| pixel.swap(0, 2));
        assert_eq!(data, vec![3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn test_for_each_pixel_mut_large_matches_sequential() {
        let num_pixels = PARALLEL_THRESHOLD + 1000;
        let mut data: Vec<u16> = (0..num_pixels * 3).map(|i| (i % 60000) as u16).collect();
        let expected: Vec<u16> = data.iter().map(|v| v / 2).collect();

        for_each_pixel_mut(&mut data, 3, |pixel| {
            for v in pixel.iter_mut() {
                *v /= 2;
            }
        });

        assert_eq!(data, expected);
    }

    #[test]
    fn test_fold_pixels_counts_are_exact() {
        let num_pixels = PARALLEL_THRESHOLD + 17;
        let data = vec![7u16; num_pixels * 3];

        let count = fold_pixels(
            &data,
            3,
            || 0usize,
            |acc, pixel| acc + pixel.iter().filter(|&&v| v == 7).count(),
            |a, b| a + b,
        );

        assert_eq!(count, num_pixels * 3);
    }
}
