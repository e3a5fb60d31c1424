use std::sync::Arc;

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{CaptioncastError, CaptioncastResult};
use crate::foundation::math::{blend_over_premul, mul_div255_u8};

/// Single-channel coverage mask.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageMask {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major coverage, 0 = empty, 255 = fully covered.
    pub alpha: Vec<u8>,
}

impl CoverageMask {
    /// Empty mask of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: vec![0; (width as usize) * (height as usize)],
        }
    }

    /// Copy of this mask centered in a canvas grown by `pad` on every side.
    pub fn padded(&self, pad: u32) -> Self {
        let mut out = Self::new(self.width + 2 * pad, self.height + 2 * pad);
        let ow = out.width as usize;
        for y in 0..self.height as usize {
            let src = &self.alpha[y * self.width as usize..(y + 1) * self.width as usize];
            let off = (y + pad as usize) * ow + pad as usize;
            out.alpha[off..off + src.len()].copy_from_slice(src);
        }
        out
    }

    /// Grow coverage by `radius` px with a round structuring element.
    pub fn dilate(&self, radius: f32) -> Self {
        if !(radius > 0.0) {
            return self.clone();
        }
        let r = radius.ceil() as i32;
        let r2 = radius * radius;
        let mut offsets = Vec::new();
        for dy in -r..=r {
            for dx in -r..=r {
                if (dx * dx + dy * dy) as f32 <= r2 + 0.25 {
                    offsets.push((dx, dy));
                }
            }
        }
        let (w, h) = (self.width as i32, self.height as i32);
        let mut out = Self::new(self.width, self.height);
        for y in 0..h {
            for x in 0..w {
                let mut m = 0u8;
                for &(dx, dy) in &offsets {
                    let (sx, sy) = (x + dx, y + dy);
                    if sx < 0 || sy < 0 || sx >= w || sy >= h {
                        continue;
                    }
                    m = m.max(self.alpha[(sy * w + sx) as usize]);
                    if m == 255 {
                        break;
                    }
                }
                out.alpha[(y * w + x) as usize] = m;
            }
        }
        out
    }

    /// Separable gaussian blur with standard deviation `sigma`.
    pub fn blur(&self, sigma: f32) -> CaptioncastResult<Self> {
        if !(sigma > 0.0) {
            return Ok(self.clone());
        }
        let radius = (sigma * 3.0).ceil() as u32;
        let k = gaussian_kernel_q16(radius, sigma)?;
        let mut tmp = vec![0u8; self.alpha.len()];
        let mut out = Self::new(self.width, self.height);
        blur_pass_q16(&self.alpha, &mut tmp, self.width, self.height, &k, true);
        blur_pass_q16(&tmp, &mut out.alpha, self.width, self.height, &k, false);
        Ok(out)
    }
}

/// Premultiplied RGBA8 raster.
#[derive(Clone, Debug, PartialEq)]
pub struct RgbaLayer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major premultiplied RGBA8.
    pub data: Vec<u8>,
}

impl RgbaLayer {
    /// Fully transparent layer.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    /// Paint `mask` in `color` over this layer with its top-left at `(x, y)`.
    pub fn paint_mask(&mut self, mask: &CoverageMask, x: i32, y: i32, color: Rgba8Premul) {
        if color.a == 0 {
            return;
        }
        let c = color.to_array();
        for my in 0..mask.height as i32 {
            let dy = y + my;
            if dy < 0 || dy >= self.height as i32 {
                continue;
            }
            for mx in 0..mask.width as i32 {
                let dx = x + mx;
                if dx < 0 || dx >= self.width as i32 {
                    continue;
                }
                let cov = mask.alpha[(my as u32 * mask.width + mx as u32) as usize];
                if cov == 0 {
                    continue;
                }
                let cov = u16::from(cov);
                let src = [
                    mul_div255_u8(u16::from(c[0]), cov),
                    mul_div255_u8(u16::from(c[1]), cov),
                    mul_div255_u8(u16::from(c[2]), cov),
                    mul_div255_u8(u16::from(c[3]), cov),
                ];
                let i = ((dy as u32 * self.width + dx as u32) * 4) as usize;
                blend_over_premul(&mut self.data[i..i + 4], src);
            }
        }
    }

    /// Whether any pixel has non-zero alpha.
    pub fn has_coverage(&self) -> bool {
        self.data.chunks_exact(4).any(|px| px[3] != 0)
    }

    /// Image paint for drawing this layer with vello_cpu.
    pub fn to_image(&self) -> CaptioncastResult<vello_cpu::Image> {
        premul_image(&self.data, self.width, self.height)
    }
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> CaptioncastResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CaptioncastError::validation("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CaptioncastError::validation("pixmap height exceeds u16"))?;
    if bytes.len() != (width as usize) * (height as usize) * 4 {
        return Err(CaptioncastError::validation(format!(
            "pixmap byte len {} does not match {width}x{height}",
            bytes.len()
        )));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

/// Image paint over premultiplied RGBA8 bytes.
pub(crate) fn premul_image(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> CaptioncastResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

/// Quantized gaussian weights summing to exactly `1 << 16`.
pub(crate) fn gaussian_kernel_q16(radius: u32, sigma: f32) -> CaptioncastResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CaptioncastError::validation(
            "blur sigma must be finite and > 0",
        ));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| (-(f64::from(i) * f64::from(i)) / denom).exp())
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(CaptioncastError::validation("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn blur_pass_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], horiz: bool) {
    let radius = (k.len() / 2) as i32;
    let (w, h) = (width as i32, height as i32);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u64;
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i32 - radius;
                // Outside the mask counts as empty so shadows fade at the edges.
                let (sx, sy) = if horiz { (x + d, y) } else { (x, y + d) };
                if sx < 0 || sy < 0 || sx >= w || sy >= h {
                    continue;
                }
                acc += u64::from(kw) * u64::from(src[(sy * w + sx) as usize]);
            }
            dst[(y * w + x) as usize] = ((acc + 32768) >> 16).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
