use super::*;

#[test]
fn start_is_transparent_for_every_animated_kind() {
    for kind in AnimationKind::ALL {
        let s = resolve(kind, 0.0, 1.0);
        if kind == AnimationKind::None {
            assert_eq!(s, AnimationState::SETTLED);
        } else {
            assert_eq!(s.alpha, 0.0, "{kind:?}");
        }
    }
}

#[test]
fn settles_exactly_at_base_duration() {
    for kind in AnimationKind::ALL {
        for extra in [0.0, 0.01, 5.0] {
            let s = resolve(kind, kind.base_duration() + extra, 1.777);
            assert_eq!(s, AnimationState::SETTLED, "{kind:?} +{extra}");
        }
    }
}

#[test]
fn negative_elapsed_is_start() {
    assert_eq!(
        resolve(AnimationKind::SlideUp, -3.0, 1.0),
        resolve(AnimationKind::SlideUp, 0.0, 1.0)
    );
}

#[test]
fn start_offsets_scale_with_output() {
    let s = resolve(AnimationKind::SlideUp, 0.0, 2.0);
    assert_eq!(s.y_offset, 120.0);
    let s = resolve(AnimationKind::SlideRight, 0.0, 1.0);
    assert_eq!(s.x_offset, -120.0);
    let s = resolve(AnimationKind::ElasticLeft, 0.0, 1.0);
    assert_eq!(s.x_offset, 80.0);
    let s = resolve(AnimationKind::BounceDown, 0.0, 1.0);
    assert_eq!(s.y_offset, -50.0);
}

#[test]
fn size_multipliers_start_at_extremes() {
    assert!((resolve(AnimationKind::ZoomIn, 0.0, 1.0).size_multiplier - 0.4).abs() < 1e-12);
    assert!((resolve(AnimationKind::ZoomOut, 0.0, 1.0).size_multiplier - 1.6).abs() < 1e-12);
    let pop = resolve(AnimationKind::PopIn, 0.0, 1.0);
    assert!((pop.size_multiplier - 0.3).abs() < 1e-12);
    assert_eq!(pop.y_offset, 15.0);
}

#[test]
fn midway_values_follow_out_cubic() {
    // Halfway through a 0.7 s slide: t = 1 - 0.5^3 = 0.875.
    let s = resolve(AnimationKind::SlideLeft, 0.35, 1.0);
    assert!((s.alpha - 0.5).abs() < 1e-12);
    assert!((s.x_offset - 0.125 * 120.0).abs() < 1e-9);
    assert_eq!(s.y_offset, 0.0);
}

#[test]
fn fade_only_kinds_do_not_move() {
    for kind in [
        AnimationKind::FadeIn,
        AnimationKind::Cinematic,
        AnimationKind::Typewriter,
    ] {
        let s = resolve(kind, 0.1, 1.0);
        assert_eq!((s.x_offset, s.y_offset, s.size_multiplier), (0.0, 0.0, 1.0));
        assert!(s.alpha > 0.0 && s.alpha < 1.0);
    }
}
