// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! Arrowhead orientation, rotation about a pivot, axis-aligned bounds and
//! the uniform background fit used by the scene.

use crate::models::annotation::Point;

/// Average glyph advance as a fraction of font size, used to estimate
/// text extents without a font.
const CHAR_WIDTH_RATIO: f64 = 0.6;

/// Line height as a fraction of font size.
const LINE_HEIGHT_RATIO: f64 = 1.2;

/// Rotation of an arrowhead placed at `end` of a segment from `start`.
pub fn arrow_angle(start: Point, end: Point) -> f64 {
    (end.y - start.y).atan2(end.x - start.x)
}

/// Rotate `point` by `angle` radians around `pivot`.
pub fn rotate_about(point: Point, pivot: Point, angle: f64) -> Point {
    if angle == 0.0 {
        return point;
    }
    let (sin, cos) = angle.sin_cos();
    let dx = point.x - pivot.x;
    let dy = point.y - pivot.y;
    Point {
        x: pivot.x + dx * cos - dy * sin,
        y: pivot.y + dx * sin + dy * cos,
    }
}

/// Uniform scale that fits an image inside a canvas without cropping.
pub fn fit_scale(image_width: f64, image_height: f64, canvas_width: f64, canvas_height: f64) -> f64 {
    if image_width <= 0.0 || image_height <= 0.0 {
        return 1.0;
    }
    (canvas_width / image_width).min(canvas_height / image_height)
}

/// Estimated (width, height) of a single-line text run.
pub fn text_extent(content: &str, font_size: f64) -> (f64, f64) {
    let lines: Vec<&str> = content.lines().collect();
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let line_count = lines.len().max(1);
    (
        longest as f64 * font_size * CHAR_WIDTH_RATIO,
        line_count as f64 * font_size * LINE_HEIGHT_RATIO,
    )
}

/// Axis-aligned bounding box in logical canvas units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Smallest box containing every point, or `None` for an empty set.
    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Bounds { min: first, max: first };
        for p in iter {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    pub fn center(&self) -> Point {
        Point::new((self.min.x + self.max.x) / 2.0, (self.min.y + self.max.y) / 2.0)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Grow the box by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Bounds {
            min: Point::new(self.min.x - margin, self.min.y - margin),
            max: Point::new(self.max.x + margin, self.max.y + margin),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}
