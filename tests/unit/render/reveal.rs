use super::*;
use crate::foundation::core::{BezPath, Rgb8};

/// Horizontal line strokes of the given lengths, one per row.
fn strokes(lengths: &[f64]) -> Vec<Stroke> {
    lengths
        .iter()
        .enumerate()
        .map(|(i, len)| {
            let y = 10.0 * i as f64;
            let mut p = BezPath::new();
            p.move_to((0.0, y));
            p.line_to((*len, y));
            Stroke::new(p, Rgb8::BLACK, 16)
        })
        .collect()
}

#[test]
fn boundary_target_fully_draws_matching_strokes() {
    let s = strokes(&[10.0, 20.0, 30.0]);
    let st = reveal_at(&s, 5.0, 10.0, Ease::Linear);
    assert_eq!(st.linear, 0.5);
    assert!((st.target_length - 30.0).abs() < 1e-9);
    assert_eq!(st.fully_drawn, 2);
    assert!(st.active.is_none());
    let pen = st.pen.unwrap();
    assert!((pen.x - 20.0).abs() < 1e-6 && (pen.y - 10.0).abs() < 1e-9);
}

#[test]
fn active_stroke_gets_the_remainder_and_pen_interpolates() {
    let s = strokes(&[10.0, 20.0, 30.0]);
    let st = reveal_at(&s, 6.0, 10.0, Ease::Linear);
    assert_eq!(st.fully_drawn, 2);
    let a = st.active.unwrap();
    assert_eq!(a.index, 2);
    assert!((a.drawn - 6.0).abs() < 1e-9);
    let pen = st.pen.unwrap();
    assert!((pen.x - 6.0).abs() < 1e-6 && (pen.y - 20.0).abs() < 1e-9);
}

#[test]
fn completion_is_exact_at_and_after_draw_duration() {
    let s = strokes(&[10.0, 20.0, 30.0]);
    for ease in [Ease::Linear, Ease::InOutQuad, Ease::OutCubic] {
        for t in [10.0, 10.5, 1e6] {
            let st = reveal_at(&s, t, 10.0, ease);
            assert_eq!(st.eased, 1.0);
            assert!(st.is_complete(3));
            assert!(st.pen.is_none());
        }
    }
}

#[test]
fn start_of_scene_shows_pen_at_first_stroke() {
    let s = strokes(&[10.0, 20.0]);
    let st = reveal_at(&s, 0.0, 10.0, Ease::InOutQuad);
    assert_eq!(st.target_length, 0.0);
    assert_eq!(st.fully_drawn, 0);
    assert!(st.active.is_none());
    assert_eq!(st.pen, Some(Point::new(0.0, 0.0)));
}

#[test]
fn reveal_is_monotonic() {
    let s = strokes(&[3.0, 17.0, 8.0, 40.0, 2.5]);
    let mut prev = reveal_at(&s, 0.0, 7.0, Ease::InOutQuad);
    for i in 1..=200 {
        let t = 7.5 * f64::from(i) / 200.0;
        let st = reveal_at(&s, t, 7.0, Ease::InOutQuad);
        assert!(st.target_length >= prev.target_length);
        assert!(st.fully_drawn >= prev.fully_drawn);
        prev = st;
    }
}

#[test]
fn repeated_passes_are_identical() {
    let s = strokes(&[3.0, 17.0, 8.0]);
    let times: Vec<f64> = (0..50).map(|i| f64::from(i) * 0.13).collect();
    let a: Vec<RevealState> = times.iter().map(|t| reveal_at(&s, *t, 5.0, Ease::InOutQuad)).collect();
    let b: Vec<RevealState> = times.iter().map(|t| reveal_at(&s, *t, 5.0, Ease::InOutQuad)).collect();
    assert_eq!(a, b);
}

#[test]
fn empty_scene_has_no_pen() {
    let st = reveal_at(&[], 1.0, 10.0, Ease::Linear);
    assert_eq!(st.fully_drawn, 0);
    assert!(st.active.is_none());
    assert!(st.pen.is_none());
}

#[test]
fn zero_draw_duration_is_complete_immediately() {
    let s = strokes(&[10.0]);
    let st = reveal_at(&s, 0.0, 0.0, Ease::Linear);
    assert!(st.is_complete(1));
}

#[test]
fn draw_duration_honors_fraction_and_floor() {
    let cfg = RevealConfig::default();
    assert!((cfg.draw_duration(10.0) - 9.0).abs() < 1e-12);
    assert_eq!(cfg.draw_duration(0.4), 0.4);
    assert_eq!(cfg.draw_duration(0.52), 0.5);
    assert_eq!(cfg.draw_duration(0.0), 0.0);
}

#[test]
fn config_validation() {
    assert!(RevealConfig::default().validate().is_ok());
    let bad = RevealConfig {
        draw_fraction: 0.2,
        ..RevealConfig::default()
    };
    assert!(bad.validate().is_err());
    let bad = RevealConfig {
        pen_width_px: 0.0,
        ..RevealConfig::default()
    };
    assert!(bad.validate().is_err());
}
