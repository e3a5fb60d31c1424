use super::*;

fn ramp(sample_rate: u32, secs: f64) -> AudioBuffer {
    let n = (f64::from(sample_rate) * secs) as usize;
    let left: Vec<f32> = (0..n).map(|i| i as f32).collect();
    let right: Vec<f32> = (0..n).map(|i| -(i as f32)).collect();
    AudioBuffer {
        sample_rate,
        channels: vec![left, right],
    }
}

#[test]
fn deinterleaves_and_caps_channels() {
    let interleaved = [1.0, 2.0, 3.0, 10.0, 20.0, 30.0];
    let buf = AudioBuffer::from_interleaved(8, 3, &interleaved, 2);
    assert_eq!(buf.channel_count(), 2);
    assert_eq!(buf.channels[0], vec![1.0, 10.0]);
    assert_eq!(buf.channels[1], vec![2.0, 20.0]);

    let mono = AudioBuffer::from_interleaved(8, 1, &[0.5, 0.25], 2);
    assert_eq!(mono.channel_count(), 1);
    assert_eq!(mono.len_samples(), 2);
}

#[test]
fn secs_range_floors_both_ends() {
    let buf = ramp(48_000, 1.0);
    assert_eq!(buf.sample_range(0.0, 0.25), 0..12_000);
    assert_eq!(buf.sample_range(0.5, 0.25), 24_000..36_000);
    assert_eq!(buf.sample_range(-1.0, 0.0), 0..0);
}

#[test]
fn past_end_is_short_or_empty() {
    let buf = ramp(1000, 1.0);
    assert_eq!(buf.sample_range(0.99, 0.1), 990..1000);
    assert!(buf.slice_secs(1.0, 0.1).is_none());
    assert!(buf.slice_secs(5.0, 0.1).is_none());
    let tail = buf.slice_secs(0.99, 0.1).unwrap();
    assert_eq!(tail.frames(), 10);
    assert_eq!(tail.start_sample, 990);
}

#[test]
fn frame_ranges_tile_without_gaps() {
    let buf = ramp(44_100, 2.0);
    let fps = Fps::OUTPUT;
    let mut expected_start = 0usize;
    let mut f = 0u64;
    while let Some(slice) = buf.slice_for_frame(FrameIndex(f), fps) {
        assert_eq!(slice.start_sample as usize, expected_start);
        assert_eq!(slice.channels[0][0], expected_start as f32);
        expected_start += slice.frames();
        f += 1;
    }
    assert_eq!(expected_start, buf.len_samples());
    assert_eq!(f, 60);
}

#[test]
fn interleaving_restores_sample_order() {
    let buf = ramp(10, 1.0);
    let s = buf.slice(2..4).unwrap();
    assert_eq!(s.interleaved(), vec![2.0, -2.0, 3.0, -3.0]);
}
