use super::*;

fn seg(id: u32, start: f64, end: f64) -> CaptionSegment {
    CaptionSegment {
        id,
        start,
        end,
        primary_lines: vec![format!("p{id}")],
        secondary_lines: vec![format!("s{id}")],
    }
}

fn spans(v: &[CaptionSegment]) -> Vec<(u32, f64, f64)> {
    v.iter().map(|c| (c.id, c.start, c.end)).collect()
}

#[test]
fn sanitize_drops_garbage_and_clamps() {
    let input = vec![
        seg(1, 5.0, 4.0),
        seg(2, f64::NAN, 3.0),
        seg(3, -2.0, 1.0),
        seg(4, 0.5, 6.0),
    ];
    let out = sanitize_captions(&input);
    assert_eq!(spans(&out), vec![(3, 0.0, 0.5), (4, 0.5, 5.0), (1, 5.0, 5.0)]);
}

#[test]
fn sanitize_keeps_valid_input_unchanged() {
    let input = vec![seg(1, 0.0, 1.0), seg(2, 1.5, 3.0)];
    assert_eq!(sanitize_captions(&input), input);
}

#[test]
fn resolve_fills_short_gaps_only() {
    let input = vec![seg(1, 0.0, 2.0), seg(2, 3.0, 5.0), seg(3, 30.0, 31.0)];
    let out = resolve_timing(&input);
    assert_eq!(spans(&out), vec![(1, 0.0, 3.0), (2, 3.0, 5.0), (3, 30.0, 31.0)]);
}

#[test]
fn resolve_clamps_overlap_before_filling() {
    let input = vec![seg(1, 0.0, 4.0), seg(3, 3.0, 3.0), seg(2, 3.0, 5.0)];
    let out = resolve_timing(&input);
    // Zero-length segment 3 is dropped.
    assert_eq!(spans(&out), vec![(1, 0.0, 3.0), (2, 3.0, 5.0)]);
}

#[test]
fn resolved_captions_never_overlap() {
    let input = vec![
        seg(1, 0.0, 10.0),
        seg(2, 2.0, 3.0),
        seg(3, 2.5, 9.0),
        seg(4, 40.0, 41.0),
    ];
    let out = resolve_timing(&input);
    for w in out.windows(2) {
        assert!(w[0].end <= w[1].start);
        assert!(w[0].start < w[0].end);
    }
}
