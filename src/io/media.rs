// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image decoding for backgrounds and icon glyphs.
//!
//! Backgrounds are decoded with `image`; icon glyphs are SVG fragments
//! rasterized with resvg. Both produce straight-alpha RGBA buffers that
//! the canvas and the flattened export share.

use crate::error::{EditorError, Result};
use crate::models::icon::glyph_document;
use image::RgbaImage;
use std::sync::Arc;

/// A decoded background image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub pixels: Arc<RgbaImage>,
    /// File extension matching the encoded bytes (e.g. "png")
    pub extension: &'static str,
    /// MIME type of the encoded bytes
    pub content_type: &'static str,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Decode an uploaded or fetched background image.
pub fn decode_background(bytes: &[u8]) -> Result<DecodedImage> {
    let format = image::guess_format(bytes).map_err(|e| EditorError::decode("background", e))?;
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| EditorError::decode("background", e))?;
    let pixels = decoded.to_rgba8();
    log::info!(
        "Decoded background ({}x{}, {:?})",
        pixels.width(),
        pixels.height(),
        format
    );
    Ok(DecodedImage {
        pixels: Arc::new(pixels),
        extension: format.extensions_str().first().copied().unwrap_or("img"),
        content_type: format.to_mime_type(),
    })
}

/// Rasterize an icon glyph fragment to a square RGBA image.
pub fn rasterize_glyph(markup: &str, size: u32, color: &str) -> Result<RgbaImage> {
    let svg = glyph_document(markup, size, color);
    let tree = resvg::usvg::Tree::from_str(&svg, &resvg::usvg::Options::default())
        .map_err(|e| EditorError::decode("icon glyph", e))?;

    let mut pixmap = tiny_skia::Pixmap::new(size, size)
        .ok_or_else(|| EditorError::decode("icon glyph", format!("invalid size {size}")))?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
    log::debug!("Rasterized icon glyph at {size}px");

    Ok(demultiply(&pixmap))
}

/// Convert a premultiplied pixmap to a straight-alpha image.
pub fn demultiply(pixmap: &tiny_skia::Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

/// Convert a straight-alpha image to a premultiplied pixmap.
pub fn to_pixmap(image: &RgbaImage) -> Option<tiny_skia::Pixmap> {
    let mut pixmap = tiny_skia::Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::icon::IconCatalog;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_background_reports_dimensions() {
        let decoded = decode_background(&png_bytes(40, 30)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
        assert_eq!(decoded.extension, "png");
        assert_eq!(decoded.content_type, "image/png");
    }

    #[test]
    fn test_decode_background_rejects_garbage() {
        let err = decode_background(b"definitely not an image").unwrap_err();
        assert!(matches!(err, EditorError::Decode { .. }));
    }

    #[test]
    fn test_rasterize_glyph_draws_something() {
        let catalog = IconCatalog::builtin();
        let markup = catalog.glyph_for("smoke_detector").unwrap();
        let img = rasterize_glyph(markup, 48, "#000000").unwrap();
        assert_eq!(img.dimensions(), (48, 48));
        assert!(img.pixels().any(|p| p.0[3] > 0));
    }

    #[test]
    fn test_rasterize_glyph_rejects_broken_markup() {
        assert!(rasterize_glyph("<g><path d=", 24, "#000000").is_err());
    }

    #[test]
    fn test_pixmap_conversion_roundtrip_opaque() {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([200, 100, 50, 255]));
        let back = demultiply(&to_pixmap(&img).unwrap());
        assert_eq!(back, img);
    }
}
