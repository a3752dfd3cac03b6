use super::*;

#[test]
fn opaque_source_replaces_destination() {
    assert_eq!(over([10, 20, 30, 255], [200, 100, 50, 255], 1.0), [200, 100, 50, 255]);
}

#[test]
fn transparent_source_or_zero_opacity_keeps_destination() {
    assert_eq!(over([10, 20, 30, 255], [0, 0, 0, 0], 1.0), [10, 20, 30, 255]);
    assert_eq!(over([10, 20, 30, 255], [200, 100, 50, 255], 0.0), [10, 20, 30, 255]);
}

#[test]
fn half_alpha_black_over_white_is_mid_gray() {
    let out = over([255, 255, 255, 255], [0, 0, 0, 128], 1.0);
    assert_eq!(out, [127, 127, 127, 255]);
}

#[test]
fn over_in_place_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], 1.0).is_err());
}

#[test]
fn fill_opaque_sets_every_pixel() {
    let mut buf = vec![0u8; 12];
    fill_opaque(&mut buf, [1, 2, 3, 255]);
    assert_eq!(buf, [1, 2, 3, 255, 1, 2, 3, 255, 1, 2, 3, 255]);
}
