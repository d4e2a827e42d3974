// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the objects drawn over a site plan: freehand
//! strokes, arrows, text labels and equipment icon markers. Composite
//! objects (arrow, icon marker) carry all of their parts in one value so
//! that the parts can never be manipulated independently.

use crate::util::geometry::{self, Bounds};
use serde::{Deserialize, Serialize};

/// Stable identifier of an annotation, unique within a scene.
pub type AnnotationId = u64;

/// Gap between the bottom of an icon glyph and the top of its caption.
pub const CAPTION_GAP: f64 = 6.0;

/// Font size of icon captions.
pub const CAPTION_FONT_SIZE: f64 = 14.0;

/// A 2D point in logical canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// An sRGB color with straight alpha, serialized as `#rrggbb[aa]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0x1a, 0x1a, 0x1a);
    pub const RED: Rgba = Rgba::rgb(0xe5, 0x39, 0x35);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        match digits.len() {
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => None,
        }
    }

    /// `#rrggbb`, ignoring alpha.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(&self) -> f64 {
        self.a as f64 / 255.0
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgba::from_hex(&value).ok_or_else(|| format!("invalid color '{value}'"))
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        if color.a == 255 {
            color.to_hex()
        } else {
            format!("{}{:02x}", color.to_hex(), color.a)
        }
    }
}

/// Move/scale/rotate applied to a whole annotation about its pivot.
///
/// The rendering engine reports select-mode manipulations as a new
/// placement; every part of a composite is transformed through it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub offset: Point,
    /// Radians, clockwise in canvas space (y grows downward)
    pub rotation: f64,
    pub scale: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Placement {
    pub const IDENTITY: Placement = Placement {
        offset: Point::new(0.0, 0.0),
        rotation: 0.0,
        scale: 1.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Map a point given in the object's own coordinates.
    pub fn apply(&self, pivot: Point, p: Point) -> Point {
        let scaled = Point::new(
            pivot.x + (p.x - pivot.x) * self.scale,
            pivot.y + (p.y - pivot.y) * self.scale,
        );
        geometry::rotate_about(scaled, pivot, self.rotation).offset(self.offset.x, self.offset.y)
    }
}

/// A freehand stroke captured from one continuous drag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<Point>,
    pub color: Rgba,
    pub width: f64,
}

/// A line with an arrowhead at its end, always handled as one unit.
///
/// Fields are private: an arrow is built once and then only moved as a
/// whole through its [`Placement`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowGroup {
    start: Point,
    end: Point,
    color: Rgba,
    width: f64,
}

impl ArrowGroup {
    pub fn new(start: Point, end: Point, color: Rgba, width: f64) -> Self {
        Self {
            start,
            end,
            color,
            width,
        }
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Rotation of the arrowhead, `atan2(dy, dx)` of the segment.
    pub fn head_angle(&self) -> f64 {
        geometry::arrow_angle(self.start, self.end)
    }

    /// Length of the arrowhead along the shaft.
    pub fn head_length(&self) -> f64 {
        (self.width * 4.0).max(12.0)
    }

    /// Triangle (tip, left, right) of the arrowhead, tip at `end`.
    pub fn head(&self) -> [Point; 3] {
        let len = self.head_length();
        let half = len * 0.5;
        let angle = self.head_angle();
        let base = Point::new(self.end.x - len, self.end.y);
        [
            self.end,
            geometry::rotate_about(base.offset(0.0, -half), self.end, angle),
            geometry::rotate_about(base.offset(0.0, half), self.end, angle),
        ]
    }
}

/// A text label anchored at its top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLabel {
    pub anchor: Point,
    pub content: String,
    pub font_size: f64,
    pub color: Rgba,
}

impl TextLabel {
    pub fn extent(&self) -> (f64, f64) {
        geometry::text_extent(&self.content, self.font_size)
    }
}

/// An equipment icon with its caption underneath, always handled as one
/// unit. The caption position is derived from the icon, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconMarker {
    template_id: String,
    caption: String,
    center: Point,
    size: f64,
}

impl IconMarker {
    pub fn new(template_id: impl Into<String>, caption: impl Into<String>, center: Point, size: f64) -> Self {
        Self {
            template_id: template_id.into(),
            caption: caption.into(),
            center,
            size,
        }
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Center of the icon glyph.
    pub fn center(&self) -> Point {
        self.center
    }

    /// Edge length of the square glyph box.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Top-left corner of the glyph box.
    pub fn icon_origin(&self) -> Point {
        self.center.offset(-self.size / 2.0, -self.size / 2.0)
    }

    /// Top-center of the caption, a fixed offset below the glyph.
    pub fn caption_anchor(&self) -> Point {
        self.center.offset(0.0, self.size / 2.0 + CAPTION_GAP)
    }
}

/// The drawable part of an annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Stroke(Stroke),
    Arrow(ArrowGroup),
    Text(TextLabel),
    Icon(IconMarker),
}

impl Shape {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Stroke(_) => "stroke",
            Shape::Arrow(_) => "arrow",
            Shape::Text(_) => "text",
            Shape::Icon(_) => "icon",
        }
    }

    /// Point the placement rotates and scales about.
    pub fn pivot(&self) -> Point {
        match self {
            Shape::Stroke(stroke) => Bounds::from_points(stroke.points.iter().copied())
                .map(|b| b.center())
                .unwrap_or(Point::new(0.0, 0.0)),
            Shape::Arrow(arrow) => Point::new(
                (arrow.start.x + arrow.end.x) / 2.0,
                (arrow.start.y + arrow.end.y) / 2.0,
            ),
            Shape::Text(label) => label.anchor,
            Shape::Icon(marker) => marker.center,
        }
    }

    /// Untransformed outline points used for bounds and hit testing.
    fn outline(&self) -> Vec<Point> {
        match self {
            Shape::Stroke(stroke) => stroke.points.clone(),
            Shape::Arrow(arrow) => {
                let mut points = vec![arrow.start];
                points.extend(arrow.head());
                points
            }
            Shape::Text(label) => {
                let (w, h) = label.extent();
                corners(label.anchor, w, h).to_vec()
            }
            Shape::Icon(marker) => {
                let (cw, ch) = geometry::text_extent(&marker.caption, CAPTION_FONT_SIZE);
                let caption = marker.caption_anchor();
                let mut points = corners(marker.icon_origin(), marker.size, marker.size).to_vec();
                points.extend(corners(caption.offset(-cw / 2.0, 0.0), cw, ch));
                points
            }
        }
    }
}

fn corners(origin: Point, w: f64, h: f64) -> [Point; 4] {
    [
        origin,
        origin.offset(w, 0.0),
        origin.offset(w, h),
        origin.offset(0.0, h),
    ]
}

/// One object in the scene: identity, placement and shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationObject {
    pub id: AnnotationId,
    #[serde(default, skip_serializing_if = "Placement::is_identity")]
    pub placement: Placement,
    pub shape: Shape,
}

impl AnnotationObject {
    pub fn new(id: AnnotationId, shape: Shape) -> Self {
        Self {
            id,
            placement: Placement::IDENTITY,
            shape,
        }
    }

    /// Map a point from shape coordinates to canvas coordinates.
    pub fn to_canvas(&self, p: Point) -> Point {
        self.placement.apply(self.shape.pivot(), p)
    }

    /// Canvas-space bounding box after placement.
    pub fn bounds(&self) -> Option<Bounds> {
        let pivot = self.shape.pivot();
        Bounds::from_points(
            self.shape
                .outline()
                .into_iter()
                .map(|p| self.placement.apply(pivot, p)),
        )
    }

    pub fn as_text(&self) -> Option<&TextLabel> {
        match &self.shape {
            Shape::Text(label) => Some(label),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn close(a: Point, b: Point) -> bool {
        a.distance_to(b) < 1e-9
    }

    #[test]
    fn test_rgba_hex_roundtrip() {
        let c = Rgba::from_hex("#e53935").unwrap();
        assert_eq!(c, Rgba::RED);
        assert_eq!(c.to_hex(), "#e53935");
        assert_eq!(Rgba::from_hex("#00000080").unwrap().a, 0x80);
        assert!(Rgba::from_hex("#12").is_none());
        assert!(Rgba::from_hex("zzzzzz").is_none());
    }

    #[test]
    fn test_rgba_serializes_as_hex() {
        let json = serde_json::to_string(&Rgba { r: 0, g: 0, b: 0, a: 0x80 }).unwrap();
        assert_eq!(json, "\"#00000080\"");
        let red: Rgba = serde_json::from_str("\"#e53935\"").unwrap();
        assert_eq!(red, Rgba::RED);
        assert!(serde_json::from_str::<Rgba>("\"red\"").is_err());
    }

    #[test]
    fn test_arrow_head_points_along_shaft() {
        let arrow = ArrowGroup::new(Point::new(100.0, 100.0), Point::new(300.0, 100.0), Rgba::RED, 3.0);
        assert_eq!(arrow.head_angle(), 0.0);
        let [tip, left, right] = arrow.head();
        assert_eq!(tip, Point::new(300.0, 100.0));
        assert!(left.x < tip.x && right.x < tip.x);
        assert!((left.y - 94.0).abs() < 1e-9);
        assert!((right.y - 106.0).abs() < 1e-9);
    }

    #[test]
    fn test_icon_caption_sits_below_glyph() {
        let marker = IconMarker::new("camera", "Camera", Point::new(200.0, 200.0), 48.0);
        assert_eq!(marker.icon_origin(), Point::new(176.0, 176.0));
        assert_eq!(marker.caption_anchor(), Point::new(200.0, 230.0));
    }

    #[test]
    fn test_icon_parts_move_and_rotate_together() {
        let marker = IconMarker::new("camera", "Camera", Point::new(200.0, 200.0), 48.0);
        let mut object = AnnotationObject::new(1, Shape::Icon(marker.clone()));
        object.placement = Placement {
            offset: Point::new(50.0, -20.0),
            rotation: FRAC_PI_2,
            scale: 1.0,
        };

        let icon = object.to_canvas(marker.center());
        let caption = object.to_canvas(marker.caption_anchor());
        assert!(close(icon, Point::new(250.0, 180.0)));
        // A quarter turn swings the caption from below the icon to its left.
        assert!(close(caption, Point::new(220.0, 180.0)));
        assert!((icon.distance_to(caption) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_placement_scale_about_pivot() {
        let p = Placement {
            offset: Point::new(0.0, 0.0),
            rotation: 0.0,
            scale: 2.0,
        };
        assert!(close(p.apply(Point::new(10.0, 10.0), Point::new(15.0, 10.0)), Point::new(20.0, 10.0)));
    }

    #[test]
    fn test_bounds_follow_placement() {
        let stroke = Stroke {
            points: vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
            color: Rgba::BLACK,
            width: 2.0,
        };
        let mut object = AnnotationObject::new(7, Shape::Stroke(stroke));
        object.placement.offset = Point::new(100.0, 0.0);
        let b = object.bounds().unwrap();
        assert_eq!(b.min, Point::new(100.0, 0.0));
        assert_eq!(b.max, Point::new(110.0, 10.0));
    }

    #[test]
    fn test_identity_placement_not_serialized() {
        let object = AnnotationObject::new(
            3,
            Shape::Text(TextLabel {
                anchor: Point::new(1.0, 2.0),
                content: "Gate".to_string(),
                font_size: 20.0,
                color: Rgba::BLACK,
            }),
        );
        let json = serde_json::to_string(&object).unwrap();
        assert!(!json.contains("placement"));
        assert!(json.contains("\"type\":\"text\""));
    }
}
