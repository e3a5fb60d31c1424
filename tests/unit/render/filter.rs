use super::*;

fn close(a: [f32; 3], b: [f32; 3]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-3)
}

#[test]
fn identity_parameters_are_identity() {
    let px = [0.2, 0.5, 0.9];
    for m in [
        ColorMatrix::grayscale(0.0),
        ColorMatrix::sepia(0.0),
        ColorMatrix::saturate(1.0),
        ColorMatrix::hue_rotate(0.0),
        ColorMatrix::brightness(1.0),
        ColorMatrix::contrast(1.0),
    ] {
        assert!(close(m.apply(px), px), "{m:?}");
    }
}

#[test]
fn grayscale_equalizes_channels() {
    let out = ColorMatrix::grayscale(1.0).apply([1.0, 0.0, 0.0]);
    assert!((out[0] - out[1]).abs() < 1e-6 && (out[1] - out[2]).abs() < 1e-6);
    assert!((out[0] - 0.2126).abs() < 1e-4);
}

#[test]
fn contrast_pivots_on_mid_gray_and_clamps() {
    let m = ColorMatrix::contrast(1.18);
    assert!(close(m.apply([0.5, 0.5, 0.5]), [0.5, 0.5, 0.5]));
    assert_eq!(m.apply([1.0, 0.0, 1.0]), [1.0, 0.0, 1.0]);
}

#[test]
fn none_filter_shares_the_buffer() {
    let f = VideoFrame::solid(2, 2, [10, 20, 30, 255]);
    let out = apply_filter(&f, ColorFilter::None);
    assert!(Arc::ptr_eq(&f.data, &out.data));
}

#[test]
fn black_white_removes_color() {
    let f = VideoFrame::solid(3, 2, [200, 40, 90, 255]);
    let out = apply_filter(&f, ColorFilter::BlackWhite);
    for px in out.data.chunks_exact(4) {
        assert!((i16::from(px[0]) - i16::from(px[1])).abs() <= 1);
        assert!((i16::from(px[1]) - i16::from(px[2])).abs() <= 1);
        assert_eq!(px[3], 255);
    }
}

#[test]
fn warm_and_cool_shift_in_opposite_directions() {
    let gray = VideoFrame::solid(1, 1, [128, 128, 160, 255]);
    let warm = apply_filter(&gray, ColorFilter::Warm);
    let cool = apply_filter(&gray, ColorFilter::Cool);
    let warm_rb = i16::from(warm.data[0]) - i16::from(warm.data[2]);
    let cool_rb = i16::from(cool.data[0]) - i16::from(cool.data[2]);
    assert!(warm_rb > cool_rb);
}

#[test]
fn every_look_keeps_pixels_in_range_and_opaque() {
    let mut data = Vec::new();
    for i in 0..64u32 {
        data.extend_from_slice(&[(i * 4) as u8, (255 - i * 4) as u8, (i * 13 % 256) as u8, 255]);
    }
    for filter in [
        ColorFilter::Cinematic,
        ColorFilter::BlackWhite,
        ColorFilter::Warm,
        ColorFilter::Cool,
    ] {
        let mut d = data.clone();
        apply_steps_rgba8(&mut d, 8, &filter_steps(filter));
        assert!(d.chunks_exact(4).all(|px| px[3] == 255));
        assert_ne!(d, data, "{filter:?} changed nothing");
    }
}
