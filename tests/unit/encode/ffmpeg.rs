use super::*;
use crate::foundation::core::Fps;
use crate::model::settings::Bitrate;

const ENCODERS: &str = "\
Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10 (codec h264)
 V....D h264_nvenc           NVIDIA NVENC H.264 encoder (codec h264)
 A....D aac                  AAC (Advanced Audio Coding)
";

#[test]
fn encoder_table_rows_are_parsed_after_separator() {
    let names = parse_encoder_list(ENCODERS);
    assert_eq!(names, vec!["libx264", "h264_nvenc", "aac"]);
}

#[test]
fn encoder_table_without_separator_is_empty() {
    assert!(parse_encoder_list("Encoders:\n V..... = Video\n").is_empty());
}

#[test]
fn odd_video_size_is_rejected_before_spawning() {
    let cfg = VideoEncoderConfig {
        width: 31,
        height: 32,
        fps: Fps::OUTPUT,
        bitrate: Bitrate::DEFAULT,
        codec: CodecPair::default(),
    };
    let err = FfmpegVideoEncoder::spawn(&cfg, "libx264")
        .err()
        .expect("odd width must fail");
    assert!(matches!(err, CaptioncastError::Validation(_)), "{err}");
}

#[test]
fn zero_channel_audio_is_rejected_before_spawning() {
    let cfg = AudioEncoderConfig {
        sample_rate: 48_000,
        channels: 0,
        bitrate_bps: 192_000,
    };
    assert!(FfmpegAudioEncoder::spawn(&cfg).is_err());
}

#[test]
fn ensure_parent_dir_creates_nested_directories() {
    let root = std::env::temp_dir().join(format!("captioncast_parent_{}", std::process::id()));
    let target = root.join("a").join("b").join("out.mp4");
    ensure_parent_dir(&target).unwrap();
    assert!(target.parent().unwrap().is_dir());
    std::fs::remove_dir_all(&root).unwrap();
}
