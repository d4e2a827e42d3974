// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The scene: one optional background plus annotations in z-order.
//!
//! Annotations are positioned in logical canvas units, so swapping the
//! background never moves them.

use super::annotation::{AnnotationId, AnnotationObject, Placement, Point, Shape};
use crate::util::geometry;
use serde::{Deserialize, Serialize};

/// Logical canvas dimensions every scene is laid out on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

/// The fixed 900x600 logical canvas.
pub const LOGICAL_CANVAS: CanvasSize = CanvasSize {
    width: 900.0,
    height: 600.0,
};

/// Floor-plan image the annotations are drawn over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Background {
    /// Object storage reference of the original image
    pub reference: String,
    /// Intrinsic pixel width
    pub width: u32,
    /// Intrinsic pixel height
    pub height: u32,
}

/// Where and how large the background is drawn on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundFit {
    pub scale: f64,
    pub width: f64,
    pub height: f64,
}

impl Background {
    /// Uniform fit into `canvas`, anchored top-left, letterboxed if needed.
    pub fn fit(&self, canvas: CanvasSize) -> BackgroundFit {
        let scale = geometry::fit_scale(
            self.width as f64,
            self.height as f64,
            canvas.width,
            canvas.height,
        );
        BackgroundFit {
            scale,
            width: self.width as f64 * scale,
            height: self.height as f64 * scale,
        }
    }
}

/// In-memory site-plan document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    background: Option<Background>,
    #[serde(default)]
    annotations: Vec<AnnotationObject>,
    /// Next identifier handed out by [`Scene::add`]
    #[serde(default = "first_id")]
    next_id: AnnotationId,
}

fn first_id() -> AnnotationId {
    1
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            background: None,
            annotations: Vec::new(),
            next_id: first_id(),
        }
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    /// Replace (or remove) the background; annotations are untouched.
    pub fn set_background(&mut self, background: Option<Background>) {
        self.background = background;
    }

    /// Annotations in z-order, bottom first.
    pub fn annotations(&self) -> &[AnnotationObject] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn get(&self, id: AnnotationId) -> Option<&AnnotationObject> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.get(id).is_some()
    }

    /// Append a shape on top of the stack, returning its new id.
    pub fn add(&mut self, shape: Shape) -> AnnotationId {
        let id = self.next_id.max(self.max_id() + 1);
        self.next_id = id + 1;
        self.annotations.push(AnnotationObject::new(id, shape));
        id
    }

    /// Remove every listed annotation, returning how many were removed.
    pub fn remove_many(&mut self, ids: &[AnnotationId]) -> usize {
        let before = self.annotations.len();
        self.annotations.retain(|a| !ids.contains(&a.id));
        before - self.annotations.len()
    }

    /// Remove all annotations, keeping the background.
    pub fn clear_annotations(&mut self) {
        self.annotations.clear();
    }

    /// Replace an annotation's placement. Returns false if unknown.
    pub fn set_placement(&mut self, id: AnnotationId, placement: Placement) -> bool {
        match self.annotations.iter_mut().find(|a| a.id == id) {
            Some(object) => {
                object.placement = placement;
                true
            }
            None => false,
        }
    }

    /// Replace a text label's content. Returns false if `id` is not a label.
    pub fn set_text(&mut self, id: AnnotationId, content: &str) -> bool {
        let label = self
            .annotations
            .iter_mut()
            .find(|a| a.id == id)
            .and_then(|a| match &mut a.shape {
                Shape::Text(label) => Some(label),
                _ => None,
            });
        match label {
            Some(label) => {
                label.content = content.to_string();
                true
            }
            None => false,
        }
    }

    /// Topmost annotation whose bounds contain `p`, with a hit margin.
    pub fn hit_test(&self, p: Point, margin: f64) -> Option<AnnotationId> {
        self.annotations
            .iter()
            .rev()
            .find(|a| a.bounds().is_some_and(|b| b.expand(margin).contains(p)))
            .map(|a| a.id)
    }

    fn max_id(&self) -> AnnotationId {
        self.annotations.iter().map(|a| a.id).max().unwrap_or(0)
    }
}
