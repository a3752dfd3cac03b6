use super::*;

#[test]
fn duration_follows_sample_count() {
    let clip = NarrationClip::from_samples(24_000, vec![0.0; 36_000]).unwrap();
    assert_eq!(clip.duration_secs(), 1.5);
    assert_eq!(NarrationClip::silence(24_000, 2.0).unwrap().samples().len(), 48_000);
}

#[test]
fn zero_sample_rate_is_rejected() {
    assert!(NarrationClip::from_samples(0, Vec::new()).is_err());
    assert!(NarrationClip::silence(24_000, -1.0).is_err());
}

#[test]
fn f32le_bytes_decode_in_order() {
    let mut bytes = Vec::new();
    for v in [0.5f32, -0.25, 1.0] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    assert_eq!(f32le_to_samples(&bytes).unwrap(), vec![0.5, -0.25, 1.0]);
    assert!(f32le_to_samples(&bytes[..5]).is_err());
}

#[test]
fn missing_file_is_an_asset_load_failure() {
    if !crate::encode::ffmpeg::is_ffmpeg_on_path() {
        return;
    }
    let err = decode_narration(Path::new("/definitely/missing/narration.wav"), 24_000).unwrap_err();
    assert!(matches!(err, QuillError::AssetLoadFailed(_)));
}
