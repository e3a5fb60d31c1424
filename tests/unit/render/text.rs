use super::*;

const FONT: &str = "tests/data/fonts/DejaVuSans.ttf";

/// Every char is `size / 2` wide.
struct HalfEm;

impl TextShaper for HalfEm {
    fn measure(&mut self, _role: FontRole, size_px: f32, text: &str) -> CaptioncastResult<f64> {
        Ok(text.chars().count() as f64 * f64::from(size_px) / 2.0)
    }

    fn rasterize(
        &mut self,
        _role: FontRole,
        size_px: f32,
        text: &str,
    ) -> CaptioncastResult<CoverageMask> {
        let w = self.measure(FontRole::Primary, size_px, text)?.ceil() as u32;
        Ok(CoverageMask::new(w.max(1), size_px.ceil() as u32))
    }
}

struct Broken;

impl TextShaper for Broken {
    fn measure(&mut self, _: FontRole, _: f32, _: &str) -> CaptioncastResult<f64> {
        Err(CaptioncastError::validation("no font"))
    }

    fn rasterize(&mut self, _: FontRole, _: f32, _: &str) -> CaptioncastResult<CoverageMask> {
        Err(CaptioncastError::validation("no font"))
    }
}

fn parley() -> ParleyShaper {
    let mut s = ParleyShaper::new();
    s.register_file(FontRole::Primary, Path::new(FONT)).unwrap();
    s.register_file(FontRole::Secondary, Path::new(FONT)).unwrap();
    s
}

#[test]
fn prepare_wraps_each_author_line_independently() {
    let lines = vec![
        "aaaa bbbb cccc".to_string(),
        "   ".to_string(),
        "short".to_string(),
    ];
    // 10 px per char, so "aaaa bbbb" (90 px) fits in 100 px but adding "cccc" does not.
    let out = prepare_caption_lines(&mut HalfEm, FontRole::Secondary, 20.0, &lines, 100.0).unwrap();
    assert_eq!(out, vec!["aaaa bbbb", "cccc", "short"]);
}

#[test]
fn prepare_surfaces_measurement_errors() {
    let lines = vec!["x".to_string()];
    let err = prepare_caption_lines(&mut Broken, FontRole::Primary, 20.0, &lines, 100.0).unwrap_err();
    assert!(err.to_string().contains("no font"));
}

#[test]
fn missing_role_is_a_validation_error() {
    let mut s = ParleyShaper::new();
    assert!(!s.has_font(FontRole::Banner));
    let err = s.measure(FontRole::Banner, 16.0, "x").unwrap_err();
    assert!(matches!(err, CaptioncastError::Validation(_)));
}

#[test]
fn unreadable_font_file_is_a_load_error() {
    let mut s = ParleyShaper::new();
    let err = s
        .register_file(FontRole::Primary, Path::new("tests/data/fonts/missing.ttf"))
        .unwrap_err();
    assert!(matches!(err, CaptioncastError::SourceLoad(_)));
}

#[test]
fn parley_widths_grow_with_text_and_size() {
    let mut s = parley();
    let a = s.measure(FontRole::Secondary, 32.0, "Hello").unwrap();
    let b = s.measure(FontRole::Secondary, 32.0, "Hello world").unwrap();
    let c = s.measure(FontRole::Secondary, 64.0, "Hello").unwrap();
    assert!(a > 0.0);
    assert!(b > a);
    assert!((c / a - 2.0).abs() < 0.05);
    assert_eq!(a, s.measure(FontRole::Secondary, 32.0, "Hello").unwrap());
}

#[test]
fn parley_rasterizes_visible_coverage() {
    let mut s = parley();
    let m = s.rasterize(FontRole::Primary, 40.0, "Hi").unwrap();
    assert!(m.width >= 20 && m.height >= 40);
    assert_eq!(m.alpha.len(), (m.width * m.height) as usize);
    assert!(m.alpha.iter().any(|a| *a > 200));
    assert!(m.alpha.iter().any(|a| *a == 0));
}

#[test]
fn parley_rejects_bad_sizes() {
    let mut s = parley();
    assert!(s.measure(FontRole::Primary, 0.0, "x").is_err());
    assert!(s.rasterize(FontRole::Primary, f32::NAN, "x").is_err());
}
