use super::*;
use crate::render::raster::CoverageMask;

/// Solid box per line, `size / 2` px per char.
struct BoxShaper;

impl TextShaper for BoxShaper {
    fn measure(&mut self, _role: FontRole, size_px: f32, text: &str) -> CaptioncastResult<f64> {
        Ok(text.chars().count() as f64 * f64::from(size_px) / 2.0)
    }

    fn rasterize(
        &mut self,
        role: FontRole,
        size_px: f32,
        text: &str,
    ) -> CaptioncastResult<CoverageMask> {
        let w = self.measure(role, size_px, text)?.ceil().max(1.0) as u32;
        let mut m = CoverageMask::new(w, size_px.ceil() as u32);
        m.alpha.fill(255);
        Ok(m)
    }
}

fn meta(title: Option<&str>, subtitle: Option<&str>) -> Metadata {
    Metadata {
        title: title.map(str::to_string),
        subtitle: subtitle.map(str::to_string),
    }
}

fn px(layer: &RgbaLayer, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * layer.width + x) * 4) as usize;
    [
        layer.data[i],
        layer.data[i + 1],
        layer.data[i + 2],
        layer.data[i + 3],
    ]
}

#[test]
fn geometry_centers_the_pill_and_scales_constants() {
    let g = banner_geometry(Resolution::new(1920, 1080), 9.0, 58.5, 40.0);
    assert_eq!(g.width, 117.5);
    assert_eq!(g.x, 901.25);
    assert_eq!((g.y, g.height, g.center_y), (12.0, 44.0, 34.0));
    assert_eq!(g.radius, 22.0);
    assert_eq!(g.icon_x, 921.25);
    assert_eq!(g.text_x, 940.25);

    let tall = banner_geometry(Resolution::new(1080, 2160), 0.0, 0.0, 0.0);
    assert_eq!(tall.y, 24.0);
    assert_eq!(tall.height, 88.0);
    assert_eq!(tall.width, 100.0);
}

#[test]
fn sizes_scale_with_output_height() {
    let s = BannerSizes::at_scale(2.0);
    assert_eq!((s.icon, s.title, s.subtitle), (36.0, 26.0, 20.0));
}

#[test]
fn no_title_means_no_banner() {
    let r = Resolution::new(1920, 1080);
    assert!(render_banner(&mut BoxShaper, &meta(None, Some("x")), r).unwrap().is_none());
    assert!(render_banner(&mut BoxShaper, &meta(Some("  "), None), r).unwrap().is_none());
}

#[test]
fn banner_layer_holds_pill_icon_and_text() {
    let b = render_banner(
        &mut BoxShaper,
        &meta(Some("Al-Fatiha"), Some("Ayah 1-7")),
        Resolution::new(1920, 1080),
    )
    .unwrap()
    .unwrap();
    assert_eq!((b.x, b.y), (901, 12));
    assert_eq!((b.layer.width, b.layer.height), (118, 44));

    let pill = px(&b.layer, 5, 22);
    assert!((139..=141).contains(&pill[3]), "{pill:?}");
    assert_eq!(&pill[..3], &[0, 0, 0]);
    assert_eq!(px(&b.layer, 0, 0)[3], 0);

    let icon = px(&b.layer, 24, 20);
    assert!(icon[0] > 200 && icon[1] > 150 && icon[2] < 10);

    assert_eq!(px(&b.layer, 45, 14), [255, 255, 255, 255]);
    let sub = px(&b.layer, 45, 27);
    assert_eq!(sub[0], 153);
    assert!(sub[3] > 153);
}

#[test]
fn title_drops_when_subtitle_is_absent() {
    let with = render_banner(&mut BoxShaper, &meta(Some("T"), Some("S")), Resolution::new(1920, 1080))
        .unwrap()
        .unwrap();
    let without = render_banner(&mut BoxShaper, &meta(Some("T"), None), Resolution::new(1920, 1080))
        .unwrap()
        .unwrap();
    let first_white_row = |b: &Banner| {
        let x = (b.geometry.text_x - f64::from(b.x)).round() as u32 + 1;
        (0..b.layer.height).find(|&y| px(&b.layer, x, y) == [255, 255, 255, 255])
    };
    // Title bottom sits at center - 1 with a subtitle and center + 6 without.
    assert_eq!(first_white_row(&with), Some(8));
    assert_eq!(first_white_row(&without), Some(15));
}
