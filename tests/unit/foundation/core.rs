use super::*;

#[test]
fn fps_rejects_zero() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert_eq!(Fps::new(30, 1).unwrap(), Fps::OUTPUT);
}

#[test]
fn frame_timestamps_floor_to_micros() {
    let fps = Fps::OUTPUT;
    assert_eq!(fps.frame_timestamp(FrameIndex(0)), Timestamp::ZERO);
    assert_eq!(fps.frame_timestamp(FrameIndex(1)), Timestamp(33_333));
    assert_eq!(fps.frame_timestamp(FrameIndex(3)), Timestamp(100_000));
    assert_eq!(fps.frame_timestamp(FrameIndex(303)), Timestamp(10_100_000));
}

#[test]
fn frame_count_rounds_up() {
    assert_eq!(Fps::OUTPUT.secs_to_frames_ceil(10.0), 300);
    assert_eq!(Fps::OUTPUT.secs_to_frames_ceil(62.0), 1860);
    assert_eq!(Fps::OUTPUT.secs_to_frames_ceil(1.01), 31);
}

#[test]
fn timestamp_from_secs_clamps_garbage() {
    assert_eq!(Timestamp::from_secs_f64(f64::NAN), Timestamp::ZERO);
    assert_eq!(Timestamp::from_secs_f64(-3.0), Timestamp::ZERO);
    assert_eq!(Timestamp::from_secs_f64(1.5), Timestamp(1_500_000));
}

#[test]
fn premul_from_straight_rounds() {
    let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(c.to_array(), [128, 64, 0, 128]);
}

#[test]
fn overlay_scale_is_relative_to_1080() {
    assert_eq!(Resolution::new(1080, 1920).overlay_scale(), 1920.0 / 1080.0);
    assert_eq!(Resolution::new(1920, 1080).overlay_scale(), 1.0);
}

#[test]
fn format_timestamp_pads_fields() {
    assert_eq!(format_timestamp(0.0), "00:00.00");
    assert_eq!(format_timestamp(62.34), "01:02.34");
    assert_eq!(format_timestamp(-1.0), "00:00.00");
}
