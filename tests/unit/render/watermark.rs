use std::path::PathBuf;
use std::sync::Arc;

use super::*;

fn config(x: f64, y: f64, w: f64, h: f64) -> WatermarkConfig {
    WatermarkConfig {
        image: PathBuf::from("logo.png"),
        x,
        y,
        width: w,
        height: h,
        opacity: 0.5,
    }
}

#[test]
fn rect_scales_each_axis_from_source_to_output() {
    let r = source_to_output_rect(
        &config(100.0, 50.0, 200.0, 100.0),
        (1920, 1080),
        Resolution::new(1080, 1920),
    );
    assert!((r.x0 - 56.25).abs() < 1e-9);
    assert!((r.y0 - 50.0 * 1920.0 / 1080.0).abs() < 1e-9);
    assert!((r.width() - 112.5).abs() < 1e-9);
}

#[test]
fn zero_source_maps_one_to_one() {
    let r = source_to_output_rect(&config(10.0, 20.0, 30.0, 40.0), (0, 0), Resolution::new(1080, 1080));
    assert_eq!((r.x0, r.y0, r.x1, r.y1), (10.0, 20.0, 40.0, 60.0));
}

#[test]
fn new_rejects_empty_images_and_clamps_opacity() {
    let empty = PreparedImage {
        width: 0,
        height: 0,
        rgba8_premul: Arc::new(Vec::new()),
    };
    let out = Resolution::new(1080, 1080);
    assert!(Watermark::new(&empty, &config(0.0, 0.0, 1.0, 1.0), (10, 10), out).is_err());

    let img = PreparedImage {
        width: 1,
        height: 1,
        rgba8_premul: Arc::new(vec![255, 255, 255, 255]),
    };
    let mut cfg = config(0.0, 0.0, 1.0, 1.0);
    cfg.opacity = 3.0;
    let wm = Watermark::new(&img, &cfg, (10, 10), out).unwrap();
    assert_eq!(wm.opacity, 1.0);
    assert_eq!((wm.image_width, wm.image_height), (1, 1));
}

#[test]
fn load_reports_missing_files() {
    let mut cfg = config(0.0, 0.0, 10.0, 10.0);
    cfg.image = PathBuf::from("tests/data/does-not-exist.png");
    let err = Watermark::load(&cfg, (100, 100), Resolution::new(1080, 1080)).unwrap_err();
    assert!(matches!(err, CaptioncastError::SourceLoad(_)));
}
