use super::*;
use crate::foundation::core::BezPath;

fn rect_path(x: f64, y: f64, w: f64, h: f64) -> BezPath {
    let mut p = BezPath::new();
    p.move_to((x, y));
    p.line_to((x + w, y));
    p.line_to((x + w, y + h));
    p.line_to((x, y + h));
    p.close_path();
    p
}

fn traced(x: f64, y: f64, w: f64, h: f64, fill: &str) -> TracedPath {
    TracedPath {
        geometry: rect_path(x, y, w, h),
        fill: fill.to_owned(),
    }
}

fn run(paths: Vec<TracedPath>) -> SequencedStrokes {
    sequence_strokes(
        paths,
        Canvas::new(1000, 800),
        &PaletteConfig::default(),
        &SequencerConfig::default(),
    )
}

fn origins(seq: &SequencedStrokes) -> Vec<(f64, f64)> {
    seq.strokes
        .iter()
        .map(|s| (s.bounds().x0, s.bounds().y0))
        .collect()
}

#[test]
fn background_colors_never_become_strokes() {
    let seq = run(vec![
        traced(10.0, 10.0, 50.0, 50.0, "#ffffff"),
        traced(10.0, 10.0, 50.0, 50.0, "#f0f0f0"),
        traced(100.0, 10.0, 50.0, 50.0, "#1d4ed8"),
    ]);
    assert_eq!(seq.strokes.len(), 1);
    assert_eq!(seq.stats.background, 2);
    assert_eq!(seq.strokes[0].color(), Rgb8::new(0x1d, 0x4e, 0xd8));
}

#[test]
fn specks_and_empty_paths_are_dropped() {
    let seq = run(vec![
        traced(10.0, 10.0, 0.2, 0.2, "#000"),
        TracedPath {
            geometry: BezPath::new(),
            fill: "#000".to_owned(),
        },
        traced(10.0, 10.0, 5.0, 5.0, "#000"),
    ]);
    assert_eq!(seq.strokes.len(), 1);
    assert_eq!(seq.stats.degenerate, 2);
}

#[test]
fn letterbox_artifacts_are_dropped_but_colored_frames_are_kept() {
    let seq = run(vec![
        traced(0.0, 0.0, 1000.0, 20.0, "#000000"),
        traced(0.0, 0.0, 1000.0, 20.0, "#b91c1c"),
        traced(100.0, 300.0, 950.0, 20.0, "#000000"),
        traced(50.0, 100.0, 100.0, 100.0, "#000000"),
    ]);
    assert_eq!(seq.stats.artifacts, 2);
    assert_eq!(seq.strokes.len(), 2);
}

#[test]
fn wide_black_stroke_away_from_edges_is_kept() {
    let seq = run(vec![traced(40.0, 300.0, 920.0, 20.0, "#000000")]);
    assert_eq!(seq.strokes.len(), 1);
}

#[test]
fn reading_order_is_top_to_bottom_then_left_to_right() {
    let seq = run(vec![
        traced(500.0, 400.0, 20.0, 20.0, "#000"),
        traced(300.0, 110.0, 20.0, 20.0, "#000"),
        traced(100.0, 100.0, 20.0, 20.0, "#000"),
        traced(50.0, 420.0, 20.0, 20.0, "#000"),
        traced(200.0, 130.0, 20.0, 20.0, "#000"),
    ]);
    assert_eq!(
        origins(&seq),
        vec![
            (100.0, 100.0),
            (200.0, 130.0),
            (300.0, 110.0),
            (50.0, 420.0),
            (500.0, 400.0),
        ]
    );
}

#[test]
fn output_does_not_depend_on_emission_order_for_distinct_strokes() {
    let a = vec![
        traced(10.0, 10.0, 20.0, 20.0, "#000"),
        traced(400.0, 200.0, 20.0, 20.0, "#15803d"),
        traced(200.0, 30.0, 20.0, 20.0, "#b91c1c"),
    ];
    let mut b = a.clone();
    b.reverse();
    assert_eq!(origins(&run(a)), origins(&run(b)));
}

#[test]
fn total_arc_length_is_sum_of_strokes() {
    let seq = run(vec![
        traced(10.0, 10.0, 10.0, 10.0, "#000"),
        traced(100.0, 10.0, 20.0, 5.0, "#000"),
    ]);
    assert!((seq.total_arc_length - 90.0).abs() < 1e-6);
    let sum: f64 = seq.strokes.iter().map(Stroke::arc_length).sum();
    assert_eq!(seq.total_arc_length, sum);
}

#[test]
fn identical_inputs_produce_identical_sequences() {
    let input = vec![
        traced(10.0, 50.0, 10.0, 10.0, "#1d4ed8"),
        traced(10.0, 10.0, 10.0, 10.0, "#000"),
        traced(90.0, 12.0, 10.0, 10.0, "#c2410c"),
    ];
    let a = run(input.clone());
    let b = run(input);
    assert_eq!(origins(&a), origins(&b));
    assert_eq!(a.stats, b.stats);
}

#[test]
fn config_validation_rejects_bad_values() {
    assert!(SequencerConfig::default().validate().is_ok());
    let cfg = SequencerConfig {
        sample_points: 1,
        ..SequencerConfig::default()
    };
    assert!(cfg.validate().is_err());
    let cfg = SequencerConfig {
        artifact_coverage: 0.0,
        ..SequencerConfig::default()
    };
    assert!(cfg.validate().is_err());
}
