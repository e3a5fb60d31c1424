use super::*;
use serde_json::json;

#[test]
fn parses_hex_forms() {
    assert_eq!(Color::parse("#ffffff").unwrap(), Color::WHITE);
    assert_eq!(Color::parse("#000").unwrap(), Color::BLACK);
    assert_eq!(
        Color::parse("#f0e68c").unwrap().to_rgba8_straight(),
        [0xf0, 0xe6, 0x8c, 255]
    );
    let c = Color::parse("#0000ff80").unwrap();
    assert!((c.a - 128.0 / 255.0).abs() < 1e-9);
    assert!(Color::parse("#12345").is_err());
    assert!(Color::parse("#zzzzzz").is_err());
}

#[test]
fn parses_css_functions() {
    let c = Color::parse("rgba(0,0,0,0.8)").unwrap();
    assert_eq!(c, Color::rgba(0.0, 0.0, 0.0, 0.8));
    let c = Color::parse("rgb(255, 215, 0)").unwrap();
    assert_eq!(c.to_rgba8_straight(), [255, 215, 0, 255]);
    assert!(Color::parse("rgba(1,2)").is_err());
    assert!(Color::parse("rgba(1,2,3").is_err());
}

#[test]
fn deserializes_all_representations() {
    let c: Color = serde_json::from_value(json!("rgba(255, 255, 255, 0.6)")).unwrap();
    assert!((c.a - 0.6).abs() < 1e-9);
    let c: Color = serde_json::from_value(json!({"r": 0.25, "g": 0.5, "b": 0.75})).unwrap();
    assert_eq!(c, Color::rgba(0.25, 0.5, 0.75, 1.0));
    let c: Color = serde_json::from_value(json!([0.25, 0.5, 0.75, 0.9])).unwrap();
    assert_eq!(c, Color::rgba(0.25, 0.5, 0.75, 0.9));
    assert!(serde_json::from_value::<Color>(json!([1.0])).is_err());
}

#[test]
fn premul_conversion_scales_channels() {
    let c = Color::rgba(1.0, 1.0, 1.0, 0.5).to_rgba8_premul();
    assert_eq!(c.a, 128);
    assert_eq!(c.r, 128);
}
