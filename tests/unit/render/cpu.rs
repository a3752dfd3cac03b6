use super::*;
use crate::animation::ease::Ease;
use crate::foundation::core::{Canvas, SceneId};
use crate::ink::sequence::{SequenceStats, SequencedStrokes};
use crate::render::plan::plan_frame;
use crate::render::reveal::RevealConfig;

const RED: [u8; 4] = [0xb9, 0x1c, 0x1c, 255];
const BLUE: [u8; 4] = [0x1d, 0x4e, 0xd8, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

fn settings() -> RenderSettings {
    RenderSettings {
        frame: Canvas::new(100, 100),
        background: Rgb8::WHITE,
        fit_fraction: 1.0,
        reveal: RevealConfig {
            draw_fraction: 1.0,
            min_draw_secs: 0.0,
            ease: Ease::Linear,
            ..RevealConfig::default()
        },
    }
}

fn square(x: f64, y: f64, side: f64, color: [u8; 4]) -> Stroke {
    let mut p = BezPath::new();
    p.move_to((x, y));
    p.line_to((x + side, y));
    p.line_to((x + side, y + side));
    p.line_to((x, y + side));
    p.close_path();
    Stroke::new(p, Rgb8::new(color[0], color[1], color[2]), 16)
}

/// Red square then blue square; fitted so red covers (0,0)-(50,50) in the frame.
fn asset(id: u32) -> SceneAsset {
    let strokes = vec![square(10.0, 10.0, 40.0, RED), square(60.0, 60.0, 30.0, BLUE)];
    let total_arc_length = strokes.iter().map(Stroke::arc_length).sum();
    SceneAsset::from_strokes(
        SceneId(id),
        Canvas::new(100, 100),
        SequencedStrokes {
            strokes,
            total_arc_length,
            stats: SequenceStats::default(),
        },
    )
}

fn frame_at(r: &mut FrameRenderer, a: &SceneAsset, t: f64) -> FrameRGBA {
    let plan = plan_frame(a, t, 10.0, r.settings());
    r.render(&plan, Some(a)).unwrap()
}

#[test]
fn strokes_appear_as_they_complete() {
    let a = asset(1);
    let mut r = FrameRenderer::new(settings(), Overlays::default()).unwrap();

    let f0 = frame_at(&mut r, &a, 0.0);
    assert_eq!(f0.pixel(25, 25), Some(WHITE));
    assert!(f0.premultiplied);

    let f6 = frame_at(&mut r, &a, 6.0);
    assert_eq!(f6.pixel(25, 25), Some(RED));
    assert_eq!(f6.pixel(85, 85), Some(WHITE));
    assert_eq!(r.cursor().baked(), 1);
    assert_eq!(r.cursor().last_fully_drawn_index(), Some(0));

    let f10 = frame_at(&mut r, &a, 10.0);
    assert_eq!(f10.pixel(25, 25), Some(RED));
    assert_eq!(f10.pixel(85, 85), Some(BLUE));
    assert_eq!(r.cursor().baked(), 2);
    assert_eq!(r.cursor().resets(), 1);
}

#[test]
fn incremental_frames_match_fresh_renders() {
    let a = asset(1);
    let mut incremental = FrameRenderer::new(settings(), Overlays::default()).unwrap();
    frame_at(&mut incremental, &a, 3.0);
    frame_at(&mut incremental, &a, 6.0);
    let warm = frame_at(&mut incremental, &a, 10.0);

    let mut fresh = FrameRenderer::new(settings(), Overlays::default()).unwrap();
    let cold = frame_at(&mut fresh, &a, 10.0);
    assert_eq!(warm.data, cold.data);
}

#[test]
fn seeking_backwards_rebuilds_the_cache() {
    let a = asset(1);
    let mut r = FrameRenderer::new(settings(), Overlays::default()).unwrap();
    frame_at(&mut r, &a, 10.0);
    let back = frame_at(&mut r, &a, 0.0);
    assert_eq!(back.pixel(25, 25), Some(WHITE));
    assert_eq!(r.cursor().baked(), 0);
    assert_eq!(r.cursor().resets(), 2);
}

#[test]
fn scene_change_resets_the_cursor() {
    let a = asset(1);
    let b = asset(2);
    let mut r = FrameRenderer::new(settings(), Overlays::default()).unwrap();
    frame_at(&mut r, &a, 10.0);
    let f = frame_at(&mut r, &b, 0.0);
    assert_eq!(r.cursor().scene(), Some(SceneId(2)));
    assert_eq!(r.cursor().baked(), 0);
    assert_eq!(f.pixel(25, 25), Some(WHITE));
}

/// Same scene id, different strokes: a rebuilt scene must not inherit the old ink.
fn rebuilt_asset(id: u32) -> SceneAsset {
    let strokes = vec![square(10.0, 60.0, 30.0, BLUE), square(60.0, 10.0, 30.0, BLUE)];
    let total_arc_length = strokes.iter().map(Stroke::arc_length).sum();
    SceneAsset::from_strokes(
        SceneId(id),
        Canvas::new(100, 100),
        SequencedStrokes {
            strokes,
            total_arc_length,
            stats: SequenceStats::default(),
        },
    )
}

#[test]
fn rebuilt_asset_under_the_same_scene_resets_the_cursor() {
    let old = asset(1);
    let new = rebuilt_asset(1);
    assert_ne!(old.generation(), new.generation());

    let mut r = FrameRenderer::new(settings(), Overlays::default()).unwrap();
    frame_at(&mut r, &old, 6.0);
    assert_eq!(r.cursor().baked(), 1);
    let warm = frame_at(&mut r, &new, 10.0);
    assert_eq!(r.cursor().asset(), Some(new.generation()));
    assert_eq!(r.cursor().resets(), 2);

    let mut fresh = FrameRenderer::new(settings(), Overlays::default()).unwrap();
    let cold = frame_at(&mut fresh, &new, 10.0);
    assert_eq!(warm.pixel(25, 25), Some(WHITE));
    assert_eq!(warm.pixel(25, 75), Some(BLUE));
    assert_eq!(warm.data, cold.data);
}

#[test]
fn plan_from_a_replaced_asset_is_rejected() {
    let old = asset(1);
    let new = rebuilt_asset(1);
    let mut r = FrameRenderer::new(settings(), Overlays::default()).unwrap();
    let stale = plan_frame(&old, 10.0, 10.0, r.settings());
    assert!(r.render(&stale, Some(&new)).is_err());
}

#[test]
fn blank_and_gap_frames_are_background_only() {
    let mut s = settings();
    s.background = Rgb8::new(10, 20, 30);
    let mut r = FrameRenderer::new(s.clone(), Overlays::default()).unwrap();

    let blank = SceneAsset::blank(SceneId(9), Canvas::new(10, 10));
    let f = r.render(&plan_frame(&blank, 1.0, 5.0, &s), Some(&blank)).unwrap();
    assert!(f.data.chunks_exact(4).all(|px| px == [10, 20, 30, 255]));

    let gap = FramePlan::background_only(&s, None);
    let f = r.render(&gap, None).unwrap();
    assert!(f.data.chunks_exact(4).all(|px| px == [10, 20, 30, 255]));
}

#[test]
fn raster_fallback_fills_the_fitted_area() {
    let bmp = Arc::new(SourceBitmap::from_rgba8(2, 2, [0, 255, 0, 255].repeat(4)).unwrap());
    let a = SceneAsset::raster_only(SceneId(3), bmp);
    let mut r = FrameRenderer::new(settings(), Overlays::default()).unwrap();
    let f = r.render(&plan_frame(&a, 0.0, 5.0, r.settings()), Some(&a)).unwrap();
    assert_eq!(f.pixel(50, 50), Some([0, 255, 0, 255]));
}

#[test]
fn pen_marker_is_drawn_at_the_pen() {
    let a = asset(1);
    let mut r = FrameRenderer::new(settings(), Overlays::default()).unwrap();
    let f = frame_at(&mut r, &a, 0.0);
    assert_eq!(f.pixel(3, 3), Some([0, 0, 0, 255]));

    let sprite = PreparedImage {
        width: 4,
        height: 4,
        rgba8_premul: Arc::new([0, 0, 255, 255].repeat(16)),
    };
    let mut r = FrameRenderer::new(
        settings(),
        Overlays {
            pen_sprite: Some(sprite),
            watermark: None,
        },
    )
    .unwrap();
    let f = frame_at(&mut r, &a, 0.0);
    assert_eq!(f.pixel(5, 5), Some([0, 0, 255, 255]));
}

#[test]
fn watermark_sits_in_the_bottom_right_corner() {
    let logo = PreparedImage {
        width: 10,
        height: 10,
        rgba8_premul: Arc::new(RED.repeat(100)),
    };
    let overlays = Overlays {
        pen_sprite: None,
        watermark: Some(Watermark {
            image: logo,
            width_fraction: 0.2,
            margin_px: 0.0,
            opacity: 1.0,
        }),
    };
    let s = settings();
    let mut r = FrameRenderer::new(s.clone(), overlays).unwrap();
    let f = r.render(&FramePlan::background_only(&s, None), None).unwrap();
    assert_eq!(f.pixel(90, 90), Some(RED));
    assert_eq!(f.pixel(50, 50), Some(WHITE));
}

#[test]
fn oversized_frames_are_rejected() {
    let mut s = settings();
    s.frame = Canvas::new(70_000, 10);
    assert!(FrameRenderer::new(s, Overlays::default()).is_err());
}
