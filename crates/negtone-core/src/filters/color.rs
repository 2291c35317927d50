//! Colour operations: channel matrix, HSL modulation, grayscale conversion

use crate::buffer::{from_unit, to_unit, ColorLayout, PixelBuffer};
use crate::parallel::for_each_pixel_mut;

/// Rec.709 luma weights
pub const REC709_LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// 3x3 identity matrix
pub const IDENTITY_MATRIX: [[f32; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// HSL colour, hue in degrees (0-360), saturation and lightness 0.0-1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

/// Convert normalised RGB to HSL.
#[inline]
pub fn rgb_to_hsl(r: f32, g: f32, b: f32) -> Hsl {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let l = (max + min) / 2.0;

    if delta < 1e-6 {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let s = if l < 0.5 {
        delta / (max + min)
    } else {
        delta / (2.0 - max - min)
    };

    let h = if max == r {
        let h = (g - b) / delta;
        if h < 0.0 {
            h + 6.0
        } else {
            h
        }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    Hsl {
        h: (h * 60.0) % 360.0,
        s,
        l,
    }
}

/// Convert HSL back to normalised RGB.
#[inline]
pub fn hsl_to_rgb(hsl: Hsl) -> [f32; 3] {
    let s = hsl.s.clamp(0.0, 1.0);
    let l = hsl.l.clamp(0.0, 1.0);

    if s < 1e-6 {
        return [l, l, l];
    }

    let h = hsl.h.rem_euclid(360.0) / 360.0;
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    [
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    ]
}

#[inline]
fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Rec.709 luma of a normalised RGB triple.
#[inline]
pub fn luma(rgb: [f32; 3]) -> f32 {
    REC709_LUMA[0] * rgb[0] + REC709_LUMA[1] * rgb[1] + REC709_LUMA[2] * rgb[2]
}

/// Single-channel Rec.709 rendering of `buffer`.
///
/// Gray input is copied unchanged.
pub fn to_grayscale(buffer: &PixelBuffer) -> PixelBuffer {
    if buffer.layout() == ColorLayout::Gray {
        return buffer.clone();
    }

    let data: Vec<u16> = buffer
        .pixels()
        .map(|p| from_unit(luma([to_unit(p[0]), to_unit(p[1]), to_unit(p[2])])))
        .collect();

    PixelBuffer::reshaped(buffer, ColorLayout::Gray, data)
}

/// Multiply each RGB pixel by `matrix`.
///
/// Gray pixels are expanded to (v, v, v), transformed, and stored as luma.
pub fn apply_color_matrix(buffer: &mut PixelBuffer, matrix: &[[f32; 3]; 3]) {
    let layout = buffer.layout();
    let channels = buffer.channels();

    for_each_pixel_mut(buffer.samples_mut(), channels, |pixel| {
        let rgb = if layout == ColorLayout::Gray {
            let v = to_unit(pixel[0]);
            [v, v, v]
        } else {
            [to_unit(pixel[0]), to_unit(pixel[1]), to_unit(pixel[2])]
        };

        let out: [f32; 3] = std::array::from_fn(|row| {
            matrix[row][0] * rgb[0] + matrix[row][1] * rgb[1] + matrix[row][2] * rgb[2]
        });

        if layout == ColorLayout::Gray {
            pixel[0] = from_unit(luma(out));
        } else {
            pixel[0] = from_unit(out[0]);
            pixel[1] = from_unit(out[1]);
            pixel[2] = from_unit(out[2]);
        }
    });
}

/// Scale lightness and saturation and rotate hue, all given in percent.
///
/// 100% is neutral for every argument. A hue of 200% rotates by 180 degrees.
pub fn modulate(buffer: &mut PixelBuffer, brightness: f32, saturation: f32, hue: f32) {
    let l_scale = brightness / 100.0;
    let s_scale = saturation / 100.0;
    let rotation = (hue - 100.0) * 1.8;

    if buffer.layout() == ColorLayout::Gray {
        let channels = buffer.channels();
        for_each_pixel_mut(buffer.samples_mut(), channels, |pixel| {
            pixel[0] = from_unit(to_unit(pixel[0]) * l_scale);
        });
        return;
    }

    let channels = buffer.channels();
    for_each_pixel_mut(buffer.samples_mut(), channels, |pixel| {
        let mut hsl = rgb_to_hsl(to_unit(pixel[0]), to_unit(pixel[1]), to_unit(pixel[2]));
        hsl.l = (hsl.l * l_scale).clamp(0.0, 1.0);
        hsl.s = (hsl.s * s_scale).clamp(0.0, 1.0);
        hsl.h += rotation;

        let rgb = hsl_to_rgb(hsl);
        pixel[0] = from_unit(rgb[0]);
        pixel[1] = from_unit(rgb[1]);
        pixel[2] = from_unit(rgb[2]);
    });
}
