use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert_eq!(Fps::new(30000, 1001).unwrap(), Fps { num: 30000, den: 1001 });
}

#[test]
fn rgb8_hex_parsing_accepts_short_and_long_forms() {
    assert_eq!(Rgb8::from_hex("#1d4ed8"), Some(Rgb8::new(0x1d, 0x4e, 0xd8)));
    assert_eq!(Rgb8::from_hex("FFF"), Some(Rgb8::WHITE));
    assert_eq!(Rgb8::from_hex("#00000080"), Some(Rgb8::BLACK));
    assert_eq!(Rgb8::from_hex("#12"), None);
    assert_eq!(Rgb8::from_hex("#zzzzzz"), None);
    assert_eq!(Rgb8::from_hex("#ééé"), None);
}

#[test]
fn rgb8_serde_uses_hex_strings() {
    let c = Rgb8::new(185, 28, 28);
    let json = serde_json::to_string(&c).unwrap();
    assert_eq!(json, "\"#b91c1c\"");
    let back: Rgb8 = serde_json::from_str(&json).unwrap();
    assert_eq!(back, c);
    assert!(serde_json::from_str::<Rgb8>("\"red\"").is_err());
}

#[test]
fn canvas_rect_is_anchored_at_origin() {
    let c = Canvas::new(640, 360);
    assert_eq!(c.rect(), Rect::new(0.0, 0.0, 640.0, 360.0));
    assert!(!c.is_empty());
    assert!(Canvas::new(0, 10).is_empty());
}

#[test]
fn frame_pixel_lookup_is_bounds_checked() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![1, 2, 3, 4, 5, 6, 7, 8],
        premultiplied: true,
    };
    assert_eq!(frame.pixel(1, 0), Some([5, 6, 7, 8]));
    assert_eq!(frame.pixel(2, 0), None);
}
