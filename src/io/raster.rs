// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Flattened export of a scene.
//!
//! The background is drawn straight onto a tiny-skia pixmap at its fit
//! scale; the annotations are then laid out as an SVG document on the
//! logical canvas and composited on top with resvg, in z-order. The
//! result is encoded as PNG.

use crate::error::{EditorError, Result};
use crate::io::media;
use crate::models::annotation::{AnnotationObject, Point, Shape, CAPTION_FONT_SIZE};
use crate::models::icon::{IconCatalog, GLYPH_VIEWBOX};
use crate::models::scene::{Scene, LOGICAL_CANVAS};
use image::RgbaImage;
use resvg::usvg;
use std::fmt::Write;
use std::sync::Arc;

/// Color icon glyphs are drawn in.
pub const ICON_COLOR: &str = "#1a1a1a";

/// Font family used for labels and captions.
const FONT_FAMILY: &str = "sans-serif";

/// Baseline offset below a text anchor, as a fraction of font size.
const ASCENT_RATIO: f64 = 0.8;

/// Line advance as a fraction of font size.
const LINE_HEIGHT_RATIO: f64 = 1.2;

/// Composites a scene into image bytes.
pub trait Rasterizer: Send + Sync {
    /// Render `scene` over `background` at `scale` times the logical canvas,
    /// returning PNG bytes.
    fn rasterize(&self, scene: &Scene, background: Option<&RgbaImage>, scale: f32) -> Result<Vec<u8>>;
}

/// resvg/tiny-skia implementation of [`Rasterizer`].
pub struct SvgRasterizer {
    catalog: Arc<IconCatalog>,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl SvgRasterizer {
    /// Rasterizer using the system fonts for labels.
    pub fn new(catalog: Arc<IconCatalog>) -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        log::debug!("Loaded {} font faces for export", fontdb.len());
        Self {
            catalog,
            fontdb: Arc::new(fontdb),
        }
    }

    /// SVG document of the annotations on the logical canvas.
    pub fn annotation_svg(&self, scene: &Scene, pixel_width: u32, pixel_height: u32) -> Result<String> {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{pixel_width}" height="{pixel_height}" viewBox="0 0 {} {}">"#,
            LOGICAL_CANVAS.width, LOGICAL_CANVAS.height
        );
        for object in scene.annotations() {
            self.write_object(&mut svg, object)?;
        }
        svg.push_str("</svg>");
        Ok(svg)
    }

    fn write_object(&self, svg: &mut String, object: &AnnotationObject) -> Result<()> {
        let pivot = object.shape.pivot();
        let p = object.placement;
        // Placement maps p -> R(S(p - pivot)) + pivot + offset.
        let _ = write!(
            svg,
            r#"<g transform="translate({} {}) rotate({}) scale({}) translate({} {})">"#,
            num(pivot.x + p.offset.x),
            num(pivot.y + p.offset.y),
            num(p.rotation.to_degrees()),
            num(p.scale),
            num(-pivot.x),
            num(-pivot.y),
        );

        match &object.shape {
            Shape::Stroke(stroke) => {
                let color = stroke.color.to_hex();
                if let [only] = stroke.points.as_slice() {
                    let _ = write!(
                        svg,
                        r#"<circle cx="{}" cy="{}" r="{}" fill="{color}" fill-opacity="{}"/>"#,
                        num(only.x),
                        num(only.y),
                        num(stroke.width / 2.0),
                        num(stroke.color.opacity()),
                    );
                } else {
                    let _ = write!(
                        svg,
                        r#"<polyline points="{}" fill="none" stroke="{color}" stroke-opacity="{}" stroke-width="{}" stroke-linecap="round" stroke-linejoin="round"/>"#,
                        points_attr(&stroke.points),
                        num(stroke.color.opacity()),
                        num(stroke.width),
                    );
                }
            }
            Shape::Arrow(arrow) => {
                let color = arrow.color().to_hex();
                let (start, end) = (arrow.start(), arrow.end());
                let _ = write!(
                    svg,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{color}" stroke-opacity="{}" stroke-width="{}" stroke-linecap="round"/><polygon points="{}" fill="{color}" fill-opacity="{}"/>"#,
                    num(start.x),
                    num(start.y),
                    num(end.x),
                    num(end.y),
                    num(arrow.color().opacity()),
                    num(arrow.width()),
                    points_attr(&arrow.head()),
                    num(arrow.color().opacity()),
                );
            }
            Shape::Text(label) => {
                write_text(
                    svg,
                    label.anchor,
                    &label.content,
                    label.font_size,
                    &label.color.to_hex(),
                    "start",
                );
            }
            Shape::Icon(marker) => {
                let glyph = self.catalog.glyph_for(marker.template_id())?;
                let origin = marker.icon_origin();
                let _ = write!(
                    svg,
                    r#"<svg x="{}" y="{}" width="{}" height="{}" viewBox="0 0 {vb} {vb}" color="{ICON_COLOR}">{glyph}</svg>"#,
                    num(origin.x),
                    num(origin.y),
                    num(marker.size()),
                    num(marker.size()),
                    vb = GLYPH_VIEWBOX,
                );
                write_text(
                    svg,
                    marker.caption_anchor(),
                    marker.caption(),
                    CAPTION_FONT_SIZE,
                    ICON_COLOR,
                    "middle",
                );
            }
        }

        svg.push_str("</g>");
        Ok(())
    }
}

impl Rasterizer for SvgRasterizer {
    fn rasterize(&self, scene: &Scene, background: Option<&RgbaImage>, scale: f32) -> Result<Vec<u8>> {
        let width = (LOGICAL_CANVAS.width * scale as f64).round() as u32;
        let height = (LOGICAL_CANVAS.height * scale as f64).round() as u32;
        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| EditorError::Render(format!("invalid export size {width}x{height}")))?;
        pixmap.fill(tiny_skia::Color::WHITE);

        if let (Some(bg), Some(image)) = (scene.background(), background) {
            let fit = bg.fit(LOGICAL_CANVAS);
            let source = media::to_pixmap(image)
                .ok_or_else(|| EditorError::Render("empty background image".to_string()))?;
            let s = (fit.scale * scale as f64) as f32;
            let paint = tiny_skia::PixmapPaint {
                quality: tiny_skia::FilterQuality::Bilinear,
                ..tiny_skia::PixmapPaint::default()
            };
            pixmap.draw_pixmap(
                0,
                0,
                source.as_ref(),
                &paint,
                tiny_skia::Transform::from_scale(s, s),
                None,
            );
        }

        let svg = self.annotation_svg(scene, width, height)?;
        let mut options = usvg::Options::default();
        options.fontdb = self.fontdb.clone();
        let tree = usvg::Tree::from_str(&svg, &options).map_err(|e| EditorError::Render(e.to_string()))?;
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

        let png = pixmap.encode_png().map_err(|e| EditorError::Render(e.to_string()))?;
        log::info!(
            "Rendered flattened export {}x{} ({} annotations, {} bytes)",
            width,
            height,
            scene.len(),
            png.len()
        );
        Ok(png)
    }
}

fn write_text(svg: &mut String, anchor: Point, content: &str, font_size: f64, color: &str, align: &str) {
    let _ = write!(
        svg,
        r#"<text xml:space="preserve" font-family="{FONT_FAMILY}" font-size="{}" fill="{color}" text-anchor="{align}">"#,
        num(font_size)
    );
    for (i, line) in content.lines().enumerate() {
        let y = anchor.y + font_size * (ASCENT_RATIO + i as f64 * LINE_HEIGHT_RATIO);
        let _ = write!(
            svg,
            r#"<tspan x="{}" y="{}">{}</tspan>"#,
            num(anchor.x),
            num(y),
            escape_xml(line)
        );
    }
    svg.push_str("</text>");
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", num(p.x), num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trim coordinates to a fixed precision for the SVG.
fn num(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
