use std::collections::BTreeMap;

use super::*;
use crate::timeline::TimelinePolicy;

fn timeline(narr: &[f64], padding: f64) -> Timeline {
    let scenes: Vec<(SceneId, f64)> = narr
        .iter()
        .enumerate()
        .map(|(i, d)| (SceneId(i as u32), *d))
        .collect();
    Timeline::build(&scenes, TimelinePolicy::Natural { padding_secs: padding }).unwrap()
}

#[test]
fn clips_start_at_their_scene_offsets() {
    let tl = timeline(&[1.0, 1.0], 1.0);
    let mut clips = BTreeMap::new();
    clips.insert(SceneId(0), NarrationClip::from_samples(10, vec![0.5; 10]).unwrap());
    clips.insert(SceneId(1), NarrationClip::from_samples(10, vec![-0.5; 10]).unwrap());

    let out = mix_narration(&tl, |id| clips.get(&id), 10);
    assert_eq!(out.len(), 40);
    assert!(out[..10].iter().all(|s| *s == 0.5));
    assert!(out[10..20].iter().all(|s| *s == 0.0));
    assert!(out[20..30].iter().all(|s| *s == -0.5));
    assert!(out[30..].iter().all(|s| *s == 0.0));
}

#[test]
fn missing_clips_are_silent_and_output_is_clamped() {
    let tl = timeline(&[0.5, 0.5], 0.0);
    let loud = NarrationClip::from_samples(10, vec![3.0; 5]).unwrap();
    let out = mix_narration(&tl, |id| (id == SceneId(1)).then_some(&loud), 10);
    assert_eq!(out.len(), 10);
    assert!(out[..5].iter().all(|s| *s == 0.0));
    assert!(out[5..].iter().all(|s| *s == 1.0));
}

#[test]
fn clips_at_other_rates_are_resampled() {
    let tl = timeline(&[1.0], 0.0);
    let clip = NarrationClip::from_samples(20, (0..20).map(|i| i as f32 / 20.0).collect()).unwrap();
    let out = mix_narration(&tl, |_| Some(&clip), 10);
    assert_eq!(out.len(), 10);
    assert!((out[1] - 0.1).abs() < 1e-6);
    assert!((out[9] - 0.9).abs() < 1e-6);
}

#[test]
fn frame_to_sample_uses_rational_fps() {
    let ntsc = Fps {
        num: 30_000,
        den: 1001,
    };
    assert_eq!(frame_to_sample(0, ntsc, 24_000), 0);
    assert_eq!(frame_to_sample(30_000, ntsc, 24_000), 1001 * 24_000);
    let thirty = Fps { num: 30, den: 1 };
    assert_eq!(frame_to_sample(1, thirty, 24_000), 800);
}

#[test]
fn f32le_file_round_trips() {
    let path = crate::foundation::temp::unique_temp_path("mix_test", "f32le");
    let _guard = crate::foundation::temp::TempFileGuard(Some(path.clone()));
    write_mix_to_f32le_file(&[0.25, -1.0], &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 8);
    assert_eq!(f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), -1.0);
}
