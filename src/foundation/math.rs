pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Source-over blend of one premultiplied RGBA8 pixel onto another.
pub(crate) fn blend_over_premul(dst: &mut [u8], src: [u8; 4]) {
    let sa = src[3];
    if sa == 0 {
        return;
    }
    if sa == 255 {
        dst.copy_from_slice(&src);
        return;
    }
    let inv = 255 - u16::from(sa);
    for c in 0..4 {
        let v = u16::from(src[c]) + mul_div255_u16(u16::from(dst[c]), inv);
        dst[c] = v.min(255) as u8;
    }
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
