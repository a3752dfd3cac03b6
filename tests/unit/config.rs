use super::*;
use crate::animation::ease::Ease;

#[test]
fn empty_object_is_the_default_config() {
    let cfg = EngineConfig::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(cfg, EngineConfig::default());
    cfg.validate().unwrap();
    assert_eq!(cfg.trace.concurrency, 4);
    assert_eq!(cfg.output.bitrate_kbps, 8000);
    assert_eq!(cfg.output.fps, Fps { num: 30, den: 1 });
}

#[test]
fn nested_sections_parse() {
    let json = r##"{
        "palette": { "use_color": false },
        "timeline": { "mode": "scaled_to_target", "target_secs": 60 },
        "reveal": { "ease": "linear", "pen_width_px": 10 },
        "output": {
            "aspect": "9:16",
            "quality": "720p",
            "background": "#fafafa",
            "watermark": { "image": "logo.png" }
        },
        "trace": { "concurrency": 2, "timeout_secs": 5 }
    }"##;
    let cfg = EngineConfig::from_reader(json.as_bytes()).unwrap();
    cfg.validate().unwrap();
    assert!(!cfg.palette.use_color);
    assert_eq!(
        cfg.timeline,
        TimelinePolicy::ScaledToTarget { target_secs: 60.0 }
    );
    assert_eq!(cfg.reveal.ease, Ease::Linear);
    assert_eq!(cfg.output.frame_size(), Canvas::new(720, 1280));
    assert_eq!(cfg.output.background, Rgb8::new(0xfa, 0xfa, 0xfa));
    let wm = cfg.output.watermark.as_ref().unwrap();
    assert_eq!(wm.image, PathBuf::from("logo.png"));
    assert!((wm.opacity - 0.8).abs() < 1e-6);
    assert_eq!(cfg.trace.options().timeout, Duration::from_secs(5));
    assert_eq!(cfg.scene_build().trace.timeout, Duration::from_secs(5));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = EngineConfig::from_reader(r#"{ "fit": 0.5 }"#.as_bytes()).unwrap_err();
    assert!(matches!(err, QuillError::Validation(_)));
    let err =
        EngineConfig::from_reader(r#"{ "output": { "codec": "vp9" } }"#.as_bytes()).unwrap_err();
    assert!(matches!(err, QuillError::Validation(_)));
}

#[test]
fn frame_size_table() {
    let size = |aspect, quality| {
        OutputConfig {
            aspect,
            quality,
            ..OutputConfig::default()
        }
        .frame_size()
    };
    assert_eq!(size(AspectRatio::Landscape, Quality::Hd1080), Canvas::new(1920, 1080));
    assert_eq!(size(AspectRatio::Landscape, Quality::Hd720), Canvas::new(1280, 720));
    assert_eq!(size(AspectRatio::Portrait, Quality::Hd1080), Canvas::new(1080, 1920));
    assert_eq!(size(AspectRatio::Portrait, Quality::Hd720), Canvas::new(720, 1280));
    assert_eq!(size(AspectRatio::Square, Quality::Hd1080), Canvas::new(1080, 1080));
    assert_eq!(size(AspectRatio::Square, Quality::Hd720), Canvas::new(1080, 1080));
}

#[test]
fn validate_rejects_out_of_range_values() {
    let mut cfg = EngineConfig {
        fit_fraction: 0.0,
        ..EngineConfig::default()
    };
    assert!(cfg.validate().is_err());

    cfg = EngineConfig::default();
    cfg.trace.concurrency = 0;
    assert!(cfg.validate().is_err());

    cfg = EngineConfig::default();
    cfg.output.fps = Fps { num: 30, den: 0 };
    assert!(cfg.validate().is_err());

    cfg = EngineConfig::default();
    cfg.reveal.draw_fraction = 0.2;
    assert!(cfg.validate().is_err());

    cfg = EngineConfig::default();
    cfg.sequencer.sample_points = 1;
    assert!(cfg.validate().is_err());

    cfg = EngineConfig::default();
    cfg.output.watermark = Some(WatermarkConfig {
        image: PathBuf::from("logo.png"),
        width_fraction: 0.1,
        margin_px: 8.0,
        opacity: 1.5,
    });
    assert!(cfg.validate().is_err());
}

#[test]
fn render_settings_follow_output() {
    let mut cfg = EngineConfig::default();
    cfg.output.aspect = AspectRatio::Square;
    let s = cfg.render_settings();
    assert_eq!(s.frame, Canvas::new(1080, 1080));
    assert_eq!(s.background, Rgb8::WHITE);
    assert!((s.fit_fraction - 0.85).abs() < 1e-12);
}

#[test]
fn from_path_reports_missing_file() {
    let err = EngineConfig::from_path("/definitely/not/here/quill.json").unwrap_err();
    assert!(err.to_string().contains("quill.json"));
}
