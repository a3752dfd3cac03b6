use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::Canvas;
use crate::foundation::error::{QuillError, QuillResult};
use crate::foundation::math::mul_div255_u16;

/// A scene illustration flattened onto white paper.
///
/// Pixels are opaque RGBA8, so straight and premultiplied representations coincide.
#[derive(Clone, Debug)]
pub struct SourceBitmap {
    pub width: u32,
    pub height: u32,
    pub rgba8: Arc<Vec<u8>>,
}

impl SourceBitmap {
    /// Wrap straight-alpha RGBA8 pixels, compositing any transparency over white.
    pub fn from_rgba8(width: u32, height: u32, mut rgba8: Vec<u8>) -> QuillResult<Self> {
        if width == 0 || height == 0 {
            return Err(QuillError::asset_load("bitmap has zero width or height"));
        }
        if rgba8.len() != (width as usize) * (height as usize) * 4 {
            return Err(QuillError::asset_load(format!(
                "bitmap byte length {} does not match {width}x{height}",
                rgba8.len()
            )));
        }
        flatten_over_white_in_place(&mut rgba8);
        Ok(Self {
            width,
            height,
            rgba8: Arc::new(rgba8),
        })
    }

    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }

    /// Encode as PNG, for handing to out-of-process tracers.
    pub fn to_png(&self) -> QuillResult<Vec<u8>> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.rgba8.to_vec())
            .ok_or_else(|| QuillError::asset_load("bitmap buffer size mismatch"))?;
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode bitmap as png")?;
        Ok(buf)
    }
}

/// Premultiplied RGBA8 image used for sprites and overlays.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

pub fn decode_bitmap(bytes: &[u8]) -> QuillResult<SourceBitmap> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| QuillError::asset_load(format!("decode bitmap: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    SourceBitmap::from_rgba8(width, height, rgba.into_raw())
}

pub fn load_bitmap(path: &Path) -> QuillResult<SourceBitmap> {
    let bytes = std::fs::read(path).map_err(|e| {
        QuillError::asset_load(format!("failed to read bitmap '{}': {e}", path.display()))
    })?;
    decode_bitmap(&bytes)
}

/// Decode an image keeping its alpha channel (premultiplied).
pub fn decode_image(bytes: &[u8]) -> QuillResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| QuillError::asset_load(format!("decode image: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

pub fn load_image(path: &Path) -> QuillResult<PreparedImage> {
    let bytes = std::fs::read(path).map_err(|e| {
        QuillError::asset_load(format!("failed to read image '{}': {e}", path.display()))
    })?;
    decode_image(&bytes)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255_u16(u16::from(px[0]), a) as u8;
        px[1] = mul_div255_u16(u16::from(px[1]), a) as u8;
        px[2] = mul_div255_u16(u16::from(px[2]), a) as u8;
    }
}

fn flatten_over_white_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        let inv = 255 - a;
        for c in &mut px[..3] {
            *c = (mul_div255_u16(u16::from(*c), a) + inv).min(255) as u8;
        }
        px[3] = 255;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
