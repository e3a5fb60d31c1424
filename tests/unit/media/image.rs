use super::*;

#[test]
fn decodes_png_and_premultiplies() {
    let mut img = image::RgbaImage::new(2, 1);
    img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
    img.put_pixel(1, 0, image::Rgba([255, 255, 255, 128]));
    let mut bytes = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut bytes),
        image::ImageFormat::Png,
    )
    .unwrap();

    let prepared = decode_image(&bytes).unwrap();
    assert_eq!((prepared.width, prepared.height), (2, 1));
    assert_eq!(&prepared.rgba8_premul[0..4], &[255, 0, 0, 255]);
    assert_eq!(&prepared.rgba8_premul[4..8], &[128, 128, 128, 128]);
}

#[test]
fn rasterizes_svg_to_requested_size() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
        <rect x="0" y="0" width="10" height="10" fill="#00ff00"/>
    </svg>"##;
    let prepared = rasterize_svg(svg, 20, 8).unwrap();
    assert_eq!((prepared.width, prepared.height), (20, 8));
    let center = ((4 * 20 + 10) * 4) as usize;
    assert_eq!(&prepared.rgba8_premul[center..center + 4], &[0, 255, 0, 255]);
}

#[test]
fn garbage_is_rejected() {
    assert!(decode_image(b"definitely not an image").is_err());
    assert!(rasterize_svg(b"<nope", 4, 4).is_err());
}

#[test]
fn missing_file_is_a_source_error() {
    let err = load_image(Path::new("/nonexistent/logo.png"), (1, 1)).unwrap_err();
    assert!(matches!(err, CaptioncastError::SourceLoad(_)));
}
