// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image decoding for the canvas.
//!
//! Image files arrive from the file channel as base64 text and are decoded
//! into RGBA pixels suitable for an egui texture.

use anyhow::{Context, Result};
use base64::Engine;

/// Decoded image ready for upload.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decode base64 image content.
pub fn decode_base64(data: &str) -> Result<LoadedImage> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .context("image content is not valid base64")?;
    decode_bytes(&bytes)
}

pub fn decode_bytes(bytes: &[u8]) -> Result<LoadedImage> {
    let img = image::load_from_memory(bytes).context("unsupported or corrupt image")?;
    let rgba = img.to_rgba8();
    Ok(LoadedImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_base64(width: u32, height: u32) -> String {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn test_decode_png() {
        let loaded = decode_base64(&png_base64(3, 2)).unwrap();
        assert_eq!((loaded.width, loaded.height), (3, 2));
        assert_eq!(loaded.pixels.len(), 3 * 2 * 4);
        assert_eq!(&loaded.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_base64("not base64 at all!").is_err());
        assert!(decode_base64("AQID").is_err());
    }
}
