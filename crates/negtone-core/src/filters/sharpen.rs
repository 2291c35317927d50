//! Edge-weighted unsharp mask
//!
//! Each colour plane is blurred with a separable Gaussian and the detail
//! (`original - blurred`) is added back, scaled per pixel by the Sobel edge
//! magnitude of the luma plane. Flat regions have no edge response and are
//! left untouched, which keeps film grain and sensor noise from being
//! amplified.

use rayon::prelude::*;

use crate::buffer::{from_unit, to_unit, ColorLayout, PixelBuffer};
use crate::error::{Error, Result};
use crate::filters::color::luma;
use crate::parallel::PARALLEL_THRESHOLD;

/// Detail gain at the strongest edge
const SHARPEN_AMOUNT: f32 = 1.0;

/// Largest kernel radius, in pixels
const MAX_KERNEL_RADIUS: usize = 256;

/// Normalised Gaussian weights for offsets `-radius..=radius`.
///
/// Weights are computed in f64. A sigma too small to produce a usable sum
/// yields the identity kernel.
fn gaussian_kernel(radius: usize, sigma: f64) -> Vec<f32> {
    let two_sigma_sq = 2.0 * sigma * sigma;
    let weights: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-(x * x) / two_sigma_sq).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();

    if !sum.is_finite() || sum <= 0.0 || weights.iter().any(|w| !w.is_finite()) {
        let mut identity = vec![0.0f32; weights.len()];
        identity[radius] = 1.0;
        return identity;
    }
    weights.into_iter().map(|w| (w / sum) as f32).collect()
}

/// Kernel radius for the requested `radius`/`sigma`, capped by the image size.
fn kernel_radius(radius: f64, sigma: f64, width: usize, height: usize) -> usize {
    let requested = if radius > 0.0 {
        radius.round()
    } else {
        (3.0 * sigma).ceil()
    };
    let cap = width.max(height).min(MAX_KERNEL_RADIUS);
    // Float-to-int casts saturate, so the clamp happens in f64 first
    (requested.clamp(1.0, cap as f64) as usize).max(1)
}

/// Run `row_fn(y, row)` over every row of `out`, in parallel for large planes.
///
/// Each row is computed from read-only input only, so both paths produce
/// identical output.
fn for_each_row<F>(out: &mut [f32], width: usize, row_fn: F)
where
    F: Fn(usize, &mut [f32]) + Sync,
{
    if out.len() >= PARALLEL_THRESHOLD {
        out.par_chunks_exact_mut(width)
            .enumerate()
            .for_each(|(y, row)| row_fn(y, row));
    } else {
        for (y, row) in out.chunks_exact_mut(width).enumerate() {
            row_fn(y, row);
        }
    }
}

#[inline]
fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// Separable Gaussian blur with edge clamping.
fn blur_plane(plane: &[f32], width: usize, height: usize, kernel: &[f32]) -> Vec<f32> {
    let radius = (kernel.len() / 2) as isize;

    let mut horizontal = vec![0.0f32; plane.len()];
    for_each_row(&mut horizontal, width, |y, row| {
        let src = &plane[y * width..(y + 1) * width];
        for (x, out) in row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &w) in kernel.iter().enumerate() {
                let sx = clamp_index(x as isize + k as isize - radius, width);
                acc += src[sx] * w;
            }
            *out = acc;
        }
    });

    let mut blurred = vec![0.0f32; plane.len()];
    for_each_row(&mut blurred, width, |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &w) in kernel.iter().enumerate() {
                let sy = clamp_index(y as isize + k as isize - radius, height);
                acc += horizontal[sy * width + x] * w;
            }
            *out = acc;
        }
    });

    blurred
}

/// Sobel gradient magnitude, scaled so the strongest edge is 1.0.
///
/// Returns `None` for a plane without any edge.
fn edge_weights(luma: &[f32], width: usize, height: usize) -> Option<Vec<f32>> {
    let at = |x: isize, y: isize| luma[clamp_index(y, height) * width + clamp_index(x, width)];

    let mut magnitude = vec![0.0f32; luma.len()];
    for_each_row(&mut magnitude, width, |y, row| {
        let y = y as isize;
        for (x, out) in row.iter_mut().enumerate() {
            let x = x as isize;
            let gx = (at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x - 1, y) + at(x - 1, y + 1));
            let gy = (at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x, y - 1) + at(x + 1, y - 1));
            *out = (gx * gx + gy * gy).sqrt();
        }
    });

    let max = magnitude.iter().copied().fold(0.0f32, f32::max);
    if max <= f32::EPSILON {
        return None;
    }

    for m in magnitude.iter_mut() {
        *m /= max;
    }
    Some(magnitude)
}

/// Sharpen colour channels in place.
///
/// A `radius` of 0 derives the kernel size from `sigma` (three sigma). The
/// radius never exceeds the larger image dimension or [`MAX_KERNEL_RADIUS`].
/// A non-positive `sigma` leaves the buffer unchanged.
pub fn adaptive_sharpen(buffer: &mut PixelBuffer, radius: f64, sigma: f64) -> Result<()> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "sharpen radius must be a non-negative number, got {}",
            radius
        )));
    }
    if !sigma.is_finite() {
        return Err(Error::InvalidParameter(format!(
            "sharpen sigma must be finite, got {}",
            sigma
        )));
    }
    if sigma <= 0.0 {
        return Ok(());
    }

    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let channels = buffer.channels();
    let color_channels = buffer.layout().color_channels();

    let radius = kernel_radius(radius, sigma, width, height);
    let kernel = gaussian_kernel(radius, sigma);

    let luma_plane: Vec<f32> = buffer
        .pixels()
        .map(|p| {
            if buffer.layout() == ColorLayout::Gray {
                to_unit(p[0])
            } else {
                luma([to_unit(p[0]), to_unit(p[1]), to_unit(p[2])])
            }
        })
        .collect();

    let Some(weights) = edge_weights(&luma_plane, width, height) else {
        tracing::debug!("no edges found, skipping sharpen");
        return Ok(());
    };

    for c in 0..color_channels {
        let plane: Vec<f32> = buffer.pixels().map(|p| to_unit(p[c])).collect();
        let blurred = blur_plane(&plane, width, height, &kernel);

        let samples = buffer.samples_mut();
        for (i, ((&original, &soft), &weight)) in
            plane.iter().zip(blurred.iter()).zip(weights.iter()).enumerate()
        {
            let sharpened = original + SHARPEN_AMOUNT * weight * (original - soft);
            samples[i * channels + c] = from_unit(sharpened);
        }
    }

    Ok(())
}
