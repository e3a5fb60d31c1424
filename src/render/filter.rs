use std::sync::Arc;

use rayon::prelude::*;
use smallvec::SmallVec;

use crate::media::video::VideoFrame;
use crate::model::settings::ColorFilter;

/// Affine color transform on normalized RGB: `out = M * rgb + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorMatrix {
    /// Row-major 3x3 matrix followed by a 3-component offset.
    pub m: [f32; 12],
}

impl ColorMatrix {
    fn linear(rows: [[f32; 3]; 3]) -> Self {
        Self::affine(rows, [0.0; 3])
    }

    fn affine(rows: [[f32; 3]; 3], offset: [f32; 3]) -> Self {
        let mut m = [0.0f32; 12];
        for (r, row) in rows.iter().enumerate() {
            m[r * 3..r * 3 + 3].copy_from_slice(row);
        }
        m[9..12].copy_from_slice(&offset);
        Self { m }
    }

    /// `grayscale(amount)`.
    pub fn grayscale(amount: f32) -> Self {
        let a = 1.0 - amount.clamp(0.0, 1.0);
        Self::linear([
            [0.2126 + 0.7874 * a, 0.7152 - 0.7152 * a, 0.0722 - 0.0722 * a],
            [0.2126 - 0.2126 * a, 0.7152 + 0.2848 * a, 0.0722 - 0.0722 * a],
            [0.2126 - 0.2126 * a, 0.7152 - 0.7152 * a, 0.0722 + 0.9278 * a],
        ])
    }

    /// `sepia(amount)`.
    pub fn sepia(amount: f32) -> Self {
        let a = 1.0 - amount.clamp(0.0, 1.0);
        Self::linear([
            [0.393 + 0.607 * a, 0.769 - 0.769 * a, 0.189 - 0.189 * a],
            [0.349 - 0.349 * a, 0.686 + 0.314 * a, 0.168 - 0.168 * a],
            [0.272 - 0.272 * a, 0.534 - 0.534 * a, 0.131 + 0.869 * a],
        ])
    }

    /// `saturate(s)`.
    pub fn saturate(s: f32) -> Self {
        let s = s.max(0.0);
        Self::linear([
            [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
            [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
            [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
        ])
    }

    /// `hue-rotate(deg)`.
    pub fn hue_rotate(deg: f32) -> Self {
        let (sin, cos) = deg.to_radians().sin_cos();
        Self::linear([
            [
                0.213 + cos * 0.787 - sin * 0.213,
                0.715 - cos * 0.715 - sin * 0.715,
                0.072 - cos * 0.072 + sin * 0.928,
            ],
            [
                0.213 - cos * 0.213 + sin * 0.143,
                0.715 + cos * 0.285 + sin * 0.140,
                0.072 - cos * 0.072 - sin * 0.283,
            ],
            [
                0.213 - cos * 0.213 - sin * 0.787,
                0.715 - cos * 0.715 + sin * 0.715,
                0.072 + cos * 0.928 + sin * 0.072,
            ],
        ])
    }

    /// `brightness(b)`.
    pub fn brightness(b: f32) -> Self {
        let b = b.max(0.0);
        Self::linear([[b, 0.0, 0.0], [0.0, b, 0.0], [0.0, 0.0, b]])
    }

    /// `contrast(c)`.
    pub fn contrast(c: f32) -> Self {
        let c = c.max(0.0);
        let o = 0.5 - 0.5 * c;
        Self::affine([[c, 0.0, 0.0], [0.0, c, 0.0], [0.0, 0.0, c]], [o, o, o])
    }

    /// Apply to one normalized RGB triple and clamp to `[0, 1]`.
    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let m = &self.m;
        let mut out = [0.0f32; 3];
        for (r, o) in out.iter_mut().enumerate() {
            let v = m[r * 3] * rgb[0] + m[r * 3 + 1] * rgb[1] + m[r * 3 + 2] * rgb[2] + m[9 + r];
            *o = v.clamp(0.0, 1.0);
        }
        out
    }
}

/// Filter steps for a look, applied in order.
pub fn filter_steps(filter: ColorFilter) -> SmallVec<[ColorMatrix; 3]> {
    let mut steps = SmallVec::new();
    match filter {
        ColorFilter::None => {}
        ColorFilter::Cinematic => {
            steps.push(ColorMatrix::contrast(1.18));
            steps.push(ColorMatrix::saturate(0.82));
            steps.push(ColorMatrix::brightness(0.97));
        }
        ColorFilter::BlackWhite => {
            steps.push(ColorMatrix::grayscale(1.0));
            steps.push(ColorMatrix::contrast(1.08));
            steps.push(ColorMatrix::brightness(1.02));
        }
        ColorFilter::Warm => {
            steps.push(ColorMatrix::sepia(0.15));
            steps.push(ColorMatrix::saturate(1.1));
            steps.push(ColorMatrix::hue_rotate(-8.0));
        }
        ColorFilter::Cool => {
            steps.push(ColorMatrix::saturate(1.05));
            steps.push(ColorMatrix::hue_rotate(10.0));
            steps.push(ColorMatrix::brightness(0.95));
        }
    }
    steps
}

/// Apply `steps` to opaque RGBA8 pixels in place, one row per rayon task.
pub fn apply_steps_rgba8(data: &mut [u8], width: u32, steps: &[ColorMatrix]) {
    if steps.is_empty() || width == 0 {
        return;
    }
    let row = (width as usize) * 4;
    data.par_chunks_mut(row).for_each(|line| {
        for px in line.chunks_exact_mut(4) {
            let mut rgb = [
                f32::from(px[0]) / 255.0,
                f32::from(px[1]) / 255.0,
                f32::from(px[2]) / 255.0,
            ];
            for step in steps {
                rgb = step.apply(rgb);
            }
            px[0] = (rgb[0] * 255.0).round() as u8;
            px[1] = (rgb[1] * 255.0).round() as u8;
            px[2] = (rgb[2] * 255.0).round() as u8;
        }
    });
}

/// Filtered copy of `frame`. `ColorFilter::None` returns the same shared buffer.
pub fn apply_filter(frame: &VideoFrame, filter: ColorFilter) -> VideoFrame {
    let steps = filter_steps(filter);
    if steps.is_empty() {
        return frame.clone();
    }
    let mut data = frame.data.as_ref().clone();
    apply_steps_rgba8(&mut data, frame.width, &steps);
    VideoFrame {
        width: frame.width,
        height: frame.height,
        data: Arc::new(data),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/filter.rs"]
mod tests;
