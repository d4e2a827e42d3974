// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tool modes and input handling.
//!
//! Exactly one [`ToolMode`] is active. Raw pointer and keyboard input is
//! turned into committed scene mutations here; half-finished work (a
//! stroke being dragged, an arrow waiting for its end point) lives in a
//! single pending slot that every mode change wipes.

use crate::document::Document;
use crate::error::Result;
use crate::models::annotation::{
    AnnotationId, ArrowGroup, IconMarker, Placement, Point, Rgba, Shape, Stroke, TextLabel,
};
use crate::models::icon::IconTemplate;
use serde::{Deserialize, Serialize};

/// Current interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    Select,
    FreehandDraw,
    Arrow,
    TextLabel,
    IconPlacement,
}

impl ToolMode {
    pub const ALL: [ToolMode; 5] = [
        ToolMode::Select,
        ToolMode::FreehandDraw,
        ToolMode::Arrow,
        ToolMode::TextLabel,
        ToolMode::IconPlacement,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ToolMode::Select => "Select",
            ToolMode::FreehandDraw => "Draw",
            ToolMode::Arrow => "Arrow",
            ToolMode::TextLabel => "Text",
            ToolMode::IconPlacement => "Icon",
        }
    }
}

/// Pointer input in logical canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Z,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    /// Ctrl on Linux/Windows, Cmd on macOS
    pub command: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        Self { key, command: false }
    }

    pub fn command(key: Key) -> Self {
        Self { key, command: true }
    }
}

/// What an input did.
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// Nothing changed (declined input, or handled by the rendering engine)
    Ignored,
    /// Tool-local state changed; the scene did not
    Pending,
    /// A new or modified annotation was committed
    Committed(AnnotationId),
    /// Several annotations were modified in one commit
    Modified(usize),
    /// Annotations were removed in one commit
    Removed(usize),
    /// The text tool needs label content for this point
    TextRequested(Point),
    /// The key belongs to the label being edited, not to the editor
    TextInput,
    /// The previous snapshot was restored
    Undone,
}

/// Color and width for new strokes and arrows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub width: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Rgba::RED,
            width: 3.0,
        }
    }
}

/// Font size and fill for new text labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size: f64,
    pub color: Rgba,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 20.0,
            color: Rgba::BLACK,
        }
    }
}

/// Half-finished work owned by the active mode.
#[derive(Debug, Clone, PartialEq)]
enum Pending {
    Idle,
    Stroke(Vec<Point>),
    ArrowStart(Point),
}

/// A label in its re-enterable edit state.
#[derive(Debug, Clone, PartialEq)]
struct TextEdit {
    id: AnnotationId,
    buffer: String,
}

/// Owns the active mode and converts input into scene mutations.
#[derive(Debug, Clone)]
pub struct ToolController {
    mode: ToolMode,
    pending: Pending,
    stroke_style: StrokeStyle,
    /// Style the in-progress stroke was started with
    active_stroke_style: StrokeStyle,
    text_style: TextStyle,
    icon_template: Option<IconTemplate>,
    icon_size: f64,
    editing: Option<TextEdit>,
}

impl ToolController {
    pub fn new(stroke_style: StrokeStyle, text_style: TextStyle, icon_size: f64) -> Self {
        Self {
            mode: ToolMode::Select,
            pending: Pending::Idle,
            stroke_style,
            active_stroke_style: stroke_style,
            text_style,
            icon_template: None,
            icon_size,
            editing: None,
        }
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    /// Activate `mode`, discarding pending work. Never touches the scene.
    ///
    /// Re-activating the current mode also discards, so pressing the Arrow
    /// button twice drops a dangling start point.
    pub fn set_mode(&mut self, mode: ToolMode) {
        if self.pending != Pending::Idle {
            log::debug!("Discarding pending {:?} work", self.mode);
        }
        self.pending = Pending::Idle;
        self.editing = None;
        self.mode = mode;
        log::debug!("Tool mode: {:?}", mode);
    }

    /// Choose an icon template, which also activates icon placement.
    pub fn select_icon_template(&mut self, template: IconTemplate) {
        self.set_mode(ToolMode::IconPlacement);
        log::info!("Selected icon template '{}'", template.id);
        self.icon_template = Some(template);
    }

    pub fn icon_template(&self) -> Option<&IconTemplate> {
        self.icon_template.as_ref()
    }

    pub fn stroke_style(&self) -> StrokeStyle {
        self.stroke_style
    }

    /// Style for strokes and arrows started after this call.
    pub fn set_stroke_style(&mut self, style: StrokeStyle) {
        self.stroke_style = style;
    }

    pub fn text_style(&self) -> TextStyle {
        self.text_style
    }

    pub fn set_text_style(&mut self, style: TextStyle) {
        self.text_style = style;
    }

    /// Start point of an arrow waiting for its end point.
    pub fn pending_arrow_start(&self) -> Option<Point> {
        match self.pending {
            Pending::ArrowStart(p) => Some(p),
            _ => None,
        }
    }

    /// Stroke being dragged, for live feedback.
    pub fn stroke_in_progress(&self) -> Option<(&[Point], StrokeStyle)> {
        match &self.pending {
            Pending::Stroke(points) => Some((points, self.active_stroke_style)),
            _ => None,
        }
    }

    /// Help text for the current mode.
    pub fn status_text(&self) -> String {
        if self.editing.is_some() {
            return "Editing label: type to change it, click elsewhere to finish".to_string();
        }
        match self.mode {
            ToolMode::Select => "Click to select, drag to move, Delete to remove".to_string(),
            ToolMode::FreehandDraw => "Drag to draw a freehand stroke".to_string(),
            ToolMode::Arrow => match self.pending {
                Pending::ArrowStart(_) => "Click the arrow end point".to_string(),
                _ => "Click the arrow start point".to_string(),
            },
            ToolMode::TextLabel => "Click where the label should go".to_string(),
            ToolMode::IconPlacement => match &self.icon_template {
                Some(t) => format!("Click to place {}", t.display_name),
                None => "Choose an icon from the catalog".to_string(),
            },
        }
    }

    /// Handle pointer input for the active mode.
    pub fn on_pointer(&mut self, doc: &mut Document, event: PointerEvent) -> Result<InputOutcome> {
        let mut finished = InputOutcome::Ignored;
        if let PointerEvent::Down(_) = event {
            if self.editing.is_some() {
                finished = self.finish_text_edit(doc)?;
            }
        }

        match (self.mode, event) {
            // Selection, dragging and handles belong to the rendering engine.
            (ToolMode::Select, _) => Ok(finished),

            (ToolMode::FreehandDraw, PointerEvent::Down(p)) => {
                self.active_stroke_style = self.stroke_style;
                self.pending = Pending::Stroke(vec![p]);
                Ok(InputOutcome::Pending)
            }
            (ToolMode::FreehandDraw, PointerEvent::Move(p)) => match &mut self.pending {
                Pending::Stroke(points) => {
                    if points.last() != Some(&p) {
                        points.push(p);
                    }
                    Ok(InputOutcome::Pending)
                }
                _ => Ok(InputOutcome::Ignored),
            },
            (ToolMode::FreehandDraw, PointerEvent::Up(p)) => {
                let Pending::Stroke(mut points) = std::mem::replace(&mut self.pending, Pending::Idle)
                else {
                    return Ok(InputOutcome::Ignored);
                };
                if points.last() != Some(&p) {
                    points.push(p);
                }
                let style = self.active_stroke_style;
                let id = doc.commit("stroke", |scene| {
                    scene.add(Shape::Stroke(Stroke {
                        points,
                        color: style.color,
                        width: style.width,
                    }))
                })?;
                Ok(InputOutcome::Committed(id))
            }

            (ToolMode::Arrow, PointerEvent::Down(p)) => match self.pending {
                Pending::ArrowStart(start) => {
                    self.pending = Pending::Idle;
                    let style = self.stroke_style;
                    let id = doc.commit("arrow", |scene| {
                        scene.add(Shape::Arrow(ArrowGroup::new(start, p, style.color, style.width)))
                    })?;
                    Ok(InputOutcome::Committed(id))
                }
                _ => {
                    self.pending = Pending::ArrowStart(p);
                    Ok(InputOutcome::Pending)
                }
            },

            (ToolMode::TextLabel, PointerEvent::Down(p)) => Ok(InputOutcome::TextRequested(p)),

            (ToolMode::IconPlacement, PointerEvent::Down(p)) => {
                let Some(template) = self.icon_template.clone() else {
                    log::debug!("Icon placement ignored: no template selected");
                    return Ok(InputOutcome::Ignored);
                };
                let size = self.icon_size;
                let id = doc.commit("icon marker", |scene| {
                    scene.add(Shape::Icon(IconMarker::new(
                        template.id,
                        template.display_name,
                        p,
                        size,
                    )))
                })?;
                Ok(InputOutcome::Committed(id))
            }

            _ => Ok(InputOutcome::Ignored),
        }
    }

    /// Create a label from prompt input. `None` means the prompt was cancelled.
    pub fn place_text(&mut self, doc: &mut Document, at: Point, input: Option<&str>) -> Result<InputOutcome> {
        let Some(content) = input.filter(|s| !s.trim().is_empty()) else {
            log::debug!("Text label declined: empty input");
            return Ok(InputOutcome::Ignored);
        };
        let style = self.text_style;
        let id = doc.commit("text label", |scene| {
            scene.add(Shape::Text(TextLabel {
                anchor: at,
                content: content.to_string(),
                font_size: style.font_size,
                color: style.color,
            }))
        })?;
        self.editing = Some(TextEdit {
            id,
            buffer: content.to_string(),
        });
        Ok(InputOutcome::Committed(id))
    }

    /// Re-enter edit state on an existing label. Returns false if `id` is
    /// not a label.
    pub fn begin_text_edit(&mut self, doc: &Document, id: AnnotationId) -> bool {
        let Some(label) = doc.scene().get(id).and_then(|o| o.as_text()) else {
            return false;
        };
        self.editing = Some(TextEdit {
            id,
            buffer: label.content.clone(),
        });
        true
    }

    pub fn is_editing_text(&self) -> bool {
        self.editing.is_some()
    }

    pub fn editing_label(&self) -> Option<AnnotationId> {
        self.editing.as_ref().map(|e| e.id)
    }

    /// Text being typed into the label under edit.
    pub fn edit_buffer_mut(&mut self) -> Option<&mut String> {
        self.editing.as_mut().map(|e| &mut e.buffer)
    }

    /// Leave edit state, committing the buffer if it changed and is not empty.
    pub fn finish_text_edit(&mut self, doc: &mut Document) -> Result<InputOutcome> {
        let Some(edit) = self.editing.take() else {
            return Ok(InputOutcome::Ignored);
        };
        let unchanged = doc
            .scene()
            .get(edit.id)
            .and_then(|o| o.as_text())
            .map_or(true, |label| label.content == edit.buffer);
        if unchanged || edit.buffer.trim().is_empty() {
            return Ok(InputOutcome::Ignored);
        }
        doc.commit("label edit", |scene| scene.set_text(edit.id, &edit.buffer))?;
        Ok(InputOutcome::Committed(edit.id))
    }

    /// Leave edit state without changing the label.
    pub fn cancel_text_edit(&mut self) {
        self.editing = None;
    }

    /// Commit a select-mode manipulation of one annotation.
    pub fn apply_placement(
        &mut self,
        doc: &mut Document,
        id: AnnotationId,
        placement: Placement,
    ) -> Result<InputOutcome> {
        match self.apply_placements(doc, &[(id, placement)])? {
            InputOutcome::Modified(_) => Ok(InputOutcome::Committed(id)),
            other => Ok(other),
        }
    }

    /// Commit a select-mode manipulation of several annotations at once.
    pub fn apply_placements(
        &mut self,
        doc: &mut Document,
        changes: &[(AnnotationId, Placement)],
    ) -> Result<InputOutcome> {
        let changes: Vec<_> = changes
            .iter()
            .filter(|(id, placement)| {
                doc.scene()
                    .get(*id)
                    .is_some_and(|o| o.placement != *placement)
            })
            .copied()
            .collect();
        if changes.is_empty() {
            return Ok(InputOutcome::Ignored);
        }
        let count = doc.commit("transform", |scene| {
            changes
                .iter()
                .filter(|(id, placement)| scene.set_placement(*id, *placement))
                .count()
        })?;
        Ok(InputOutcome::Modified(count))
    }

    /// Remove every selected annotation in one commit.
    pub fn delete_selected(&mut self, doc: &mut Document, selected: &[AnnotationId]) -> Result<InputOutcome> {
        let ids: Vec<_> = selected
            .iter()
            .copied()
            .filter(|id| doc.scene().contains(*id))
            .collect();
        if ids.is_empty() {
            return Ok(InputOutcome::Ignored);
        }
        if self.editing_label().is_some_and(|id| ids.contains(&id)) {
            self.editing = None;
        }
        let removed = doc.commit("delete", |scene| scene.remove_many(&ids))?;
        log::info!("Deleted {} annotation(s), {} left", removed, doc.scene().len());
        Ok(InputOutcome::Removed(removed))
    }

    /// Remove all annotations but keep the background. Requires the user's
    /// confirmation; an empty scene is left alone.
    pub fn clear_annotations(&mut self, doc: &mut Document, confirmed: bool) -> Result<InputOutcome> {
        if !confirmed || doc.scene().is_empty() {
            return Ok(InputOutcome::Ignored);
        }
        self.editing = None;
        let removed = doc.commit("clear", |scene| {
            let count = scene.len();
            scene.clear_annotations();
            count
        })?;
        log::info!("Cleared {} annotation(s)", removed);
        Ok(InputOutcome::Removed(removed))
    }

    /// Restore the previous snapshot. Mode and pending work are kept.
    pub fn undo(&mut self, doc: &mut Document) -> Result<InputOutcome> {
        if !doc.undo()? {
            return Ok(InputOutcome::Ignored);
        }
        if let Some(id) = self.editing_label() {
            if !doc.scene().contains(id) {
                self.editing = None;
            }
        }
        Ok(InputOutcome::Undone)
    }

    /// Global keyboard handling.
    ///
    /// Delete/Backspace removes the selection unless a label is being
    /// edited, in which case the key is text input. Ctrl+Z undoes in every
    /// mode.
    pub fn on_key(&mut self, doc: &mut Document, key: KeyPress, selected: &[AnnotationId]) -> Result<InputOutcome> {
        match (key.key, key.command) {
            (Key::Z, true) => self.undo(doc),
            (Key::Delete | Key::Backspace, false) => {
                if self.is_editing_text() {
                    Ok(InputOutcome::TextInput)
                } else {
                    self.delete_selected(doc, selected)
                }
            }
            (Key::Escape, _) if self.pending != Pending::Idle => {
                self.pending = Pending::Idle;
                Ok(InputOutcome::Pending)
            }
            _ => Ok(InputOutcome::Ignored),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::icon::IconCatalog;
    use crate::models::scene::{Background, Scene};

    fn setup() -> (ToolController, Document) {
        (
            ToolController::new(StrokeStyle::default(), TextStyle::default(), 48.0),
            Document::new(Scene::new(), 30).unwrap(),
        )
    }

    fn click(tools: &mut ToolController, doc: &mut Document, x: f64, y: f64) -> InputOutcome {
        tools.on_pointer(doc, PointerEvent::Down(Point::new(x, y))).unwrap()
    }

    fn draw_stroke(tools: &mut ToolController, doc: &mut Document, y: f64) -> InputOutcome {
        tools.on_pointer(doc, PointerEvent::Down(Point::new(0.0, y))).unwrap();
        for x in 1..10 {
            tools.on_pointer(doc, PointerEvent::Move(Point::new(x as f64 * 5.0, y))).unwrap();
        }
        tools.on_pointer(doc, PointerEvent::Up(Point::new(50.0, y))).unwrap()
    }

    #[test]
    fn test_starts_in_select_mode() {
        let (tools, _) = setup();
        assert_eq!(tools.mode(), ToolMode::Select);
    }

    #[test]
    fn test_select_mode_leaves_scene_to_engine() {
        let (mut tools, mut doc) = setup();
        assert_eq!(click(&mut tools, &mut doc, 10.0, 10.0), InputOutcome::Ignored);
        assert_eq!(doc.history().len(), 1);
    }

    #[test]
    fn test_freehand_snapshots_once_per_stroke() {
        let (mut tools, mut doc) = setup();
        tools.set_mode(ToolMode::FreehandDraw);
        let outcome = draw_stroke(&mut tools, &mut doc, 10.0);
        assert!(matches!(outcome, InputOutcome::Committed(_)));
        assert_eq!(doc.scene().len(), 1);
        assert_eq!(doc.history().len(), 2);

        let Shape::Stroke(stroke) = &doc.scene().annotations()[0].shape else {
            panic!("expected stroke");
        };
        assert_eq!(stroke.points.len(), 11);
    }

    #[test]
    fn test_style_change_applies_to_later_strokes_only() {
        let (mut tools, mut doc) = setup();
        tools.set_mode(ToolMode::FreehandDraw);
        tools.on_pointer(&mut doc, PointerEvent::Down(Point::new(0.0, 0.0))).unwrap();
        let blue = StrokeStyle {
            color: Rgba::rgb(0, 0, 255),
            width: 8.0,
        };
        tools.set_stroke_style(blue);
        tools.on_pointer(&mut doc, PointerEvent::Up(Point::new(5.0, 5.0))).unwrap();
        draw_stroke(&mut tools, &mut doc, 40.0);

        let widths: Vec<f64> = doc
            .scene()
            .annotations()
            .iter()
            .map(|o| match &o.shape {
                Shape::Stroke(s) => s.width,
                _ => 0.0,
            })
            .collect();
        assert_eq!(widths, vec![3.0, 8.0]);
    }

    #[test]
    fn test_arrow_two_clicks_then_new_arrow() {
        let (mut tools, mut doc) = setup();
        tools.set_mode(ToolMode::Arrow);

        assert_eq!(click(&mut tools, &mut doc, 100.0, 100.0), InputOutcome::Pending);
        assert!(doc.scene().is_empty());
        assert_eq!(doc.history().len(), 1);
        assert_eq!(tools.mode(), ToolMode::Arrow);

        assert!(matches!(click(&mut tools, &mut doc, 300.0, 100.0), InputOutcome::Committed(_)));
        assert_eq!(doc.scene().len(), 1);
        assert_eq!(doc.history().len(), 2);
        let Shape::Arrow(arrow) = &doc.scene().annotations()[0].shape else {
            panic!("expected arrow");
        };
        assert_eq!(arrow.start(), Point::new(100.0, 100.0));
        assert_eq!(arrow.end(), Point::new(300.0, 100.0));
        assert_eq!(arrow.head_angle(), 0.0);

        assert_eq!(click(&mut tools, &mut doc, 50.0, 50.0), InputOutcome::Pending);
        assert_eq!(tools.pending_arrow_start(), Some(Point::new(50.0, 50.0)));
        assert_eq!(doc.scene().len(), 1);
    }

    #[test]
    fn test_mode_switch_discards_pending_arrow() {
        let (mut tools, mut doc) = setup();
        tools.set_mode(ToolMode::Arrow);
        click(&mut tools, &mut doc, 100.0, 100.0);
        tools.set_mode(ToolMode::Arrow);
        assert_eq!(tools.pending_arrow_start(), None);

        assert_eq!(click(&mut tools, &mut doc, 200.0, 200.0), InputOutcome::Pending);
        tools.set_mode(ToolMode::Select);
        tools.set_mode(ToolMode::Arrow);
        assert_eq!(click(&mut tools, &mut doc, 10.0, 10.0), InputOutcome::Pending);
        assert!(doc.scene().is_empty());
        assert_eq!(doc.history().len(), 1);
    }

    #[test]
    fn test_text_prompt_cancel_and_empty_decline() {
        let (mut tools, mut doc) = setup();
        tools.set_mode(ToolMode::TextLabel);
        let at = Point::new(40.0, 40.0);
        assert_eq!(click(&mut tools, &mut doc, 40.0, 40.0), InputOutcome::TextRequested(at));
        assert_eq!(tools.place_text(&mut doc, at, None).unwrap(), InputOutcome::Ignored);
        assert_eq!(tools.place_text(&mut doc, at, Some("   ")).unwrap(), InputOutcome::Ignored);
        assert!(doc.scene().is_empty());
        assert_eq!(doc.history().len(), 1);
    }

    #[test]
    fn test_text_label_created_in_edit_state() {
        let (mut tools, mut doc) = setup();
        tools.set_mode(ToolMode::TextLabel);
        let at = Point::new(40.0, 40.0);
        let InputOutcome::Committed(id) = tools.place_text(&mut doc, at, Some("Gate A")).unwrap() else {
            panic!("expected commit");
        };
        assert_eq!(tools.editing_label(), Some(id));
        let label = doc.scene().get(id).and_then(|o| o.as_text()).unwrap();
        assert_eq!(label.anchor, at);
        assert_eq!(label.content, "Gate A");

        tools.edit_buffer_mut().unwrap().push_str(" (rear)");
        assert_eq!(tools.finish_text_edit(&mut doc).unwrap(), InputOutcome::Committed(id));
        assert_eq!(doc.scene().get(id).and_then(|o| o.as_text()).unwrap().content, "Gate A (rear)");
        assert_eq!(doc.history().len(), 3);

        assert!(tools.begin_text_edit(&doc, id));
        assert_eq!(tools.finish_text_edit(&mut doc).unwrap(), InputOutcome::Ignored);
        assert_eq!(doc.history().len(), 3);
    }

    #[test]
    fn test_backspace_is_text_input_while_editing() {
        let (mut tools, mut doc) = setup();
        tools.set_mode(ToolMode::TextLabel);
        let InputOutcome::Committed(id) = tools.place_text(&mut doc, Point::new(1.0, 1.0), Some("Gate")).unwrap()
        else {
            panic!("expected commit");
        };
        let outcome = tools.on_key(&mut doc, KeyPress::plain(Key::Backspace), &[id]).unwrap();
        assert_eq!(outcome, InputOutcome::TextInput);
        assert_eq!(doc.scene().len(), 1);

        tools.cancel_text_edit();
        let outcome = tools.on_key(&mut doc, KeyPress::plain(Key::Delete), &[id]).unwrap();
        assert_eq!(outcome, InputOutcome::Removed(1));
        assert!(doc.scene().is_empty());
    }

    #[test]
    fn test_icon_requires_template() {
        let (mut tools, mut doc) = setup();
        tools.set_mode(ToolMode::IconPlacement);
        assert_eq!(click(&mut tools, &mut doc, 10.0, 10.0), InputOutcome::Ignored);
        assert_eq!(doc.history().len(), 1);

        let catalog = IconCatalog::builtin();
        tools.set_mode(ToolMode::Select);
        tools.select_icon_template(catalog.require("siren").unwrap().clone());
        assert_eq!(tools.mode(), ToolMode::IconPlacement);
        let InputOutcome::Committed(id) = click(&mut tools, &mut doc, 200.0, 150.0) else {
            panic!("expected commit");
        };
        let Shape::Icon(marker) = &doc.scene().get(id).unwrap().shape else {
            panic!("expected icon");
        };
        assert_eq!(marker.template_id(), "siren");
        assert_eq!(marker.caption(), "Siren");
        assert_eq!(marker.center(), Point::new(200.0, 150.0));
    }

    #[test]
    fn test_delete_selected_single_snapshot() {
        let (mut tools, mut doc) = setup();
        tools.set_mode(ToolMode::FreehandDraw);
        let mut ids = Vec::new();
        for i in 0..3 {
            if let InputOutcome::Committed(id) = draw_stroke(&mut tools, &mut doc, i as f64 * 20.0) {
                ids.push(id);
            }
        }
        let before = doc.history().len();
        let outcome = tools.delete_selected(&mut doc, &ids[..2]).unwrap();
        assert_eq!(outcome, InputOutcome::Removed(2));
        assert_eq!(doc.history().len(), before + 1);

        assert_eq!(tools.delete_selected(&mut doc, &[]).unwrap(), InputOutcome::Ignored);
        assert_eq!(tools.delete_selected(&mut doc, &[999]).unwrap(), InputOutcome::Ignored);
        assert_eq!(doc.history().len(), before + 1);
    }

    #[test]
    fn test_clear_requires_confirmation_and_keeps_background() {
        let background = Background {
            reference: "objects/plan.png".to_string(),
            width: 1000,
            height: 800,
        };
        let mut scene = Scene::new();
        scene.set_background(Some(background.clone()));
        let mut doc = Document::new(scene, 30).unwrap();
        let mut tools = ToolController::new(StrokeStyle::default(), TextStyle::default(), 48.0);
        tools.set_mode(ToolMode::FreehandDraw);
        for i in 0..5 {
            draw_stroke(&mut tools, &mut doc, i as f64 * 10.0);
        }

        assert_eq!(tools.clear_annotations(&mut doc, false).unwrap(), InputOutcome::Ignored);
        assert_eq!(doc.scene().len(), 5);

        let before = doc.history().len();
        assert_eq!(tools.clear_annotations(&mut doc, true).unwrap(), InputOutcome::Removed(5));
        assert!(doc.scene().is_empty());
        assert_eq!(doc.scene().background(), Some(&background));
        assert_eq!(doc.history().len(), before + 1);
    }

    #[test]
    fn test_undo_keeps_mode_and_pending_arrow() {
        let (mut tools, mut doc) = setup();
        tools.set_mode(ToolMode::FreehandDraw);
        draw_stroke(&mut tools, &mut doc, 0.0);
        let after_first = doc.scene().clone();
        draw_stroke(&mut tools, &mut doc, 20.0);

        tools.set_mode(ToolMode::Arrow);
        click(&mut tools, &mut doc, 5.0, 5.0);
        let outcome = tools.on_key(&mut doc, KeyPress::command(Key::Z), &[]).unwrap();
        assert_eq!(outcome, InputOutcome::Undone);
        assert_eq!(doc.scene(), &after_first);
        assert_eq!(tools.mode(), ToolMode::Arrow);
        assert_eq!(tools.pending_arrow_start(), Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_apply_placement_moves_icon_as_unit() {
        let (mut tools, mut doc) = setup();
        let catalog = IconCatalog::builtin();
        tools.select_icon_template(catalog.require("keypad").unwrap().clone());
        let InputOutcome::Committed(id) = click(&mut tools, &mut doc, 100.0, 100.0) else {
            panic!("expected commit");
        };
        let placement = Placement {
            offset: Point::new(25.0, 10.0),
            rotation: 0.5,
            scale: 1.0,
        };
        assert_eq!(tools.apply_placement(&mut doc, id, placement).unwrap(), InputOutcome::Committed(id));
        assert_eq!(tools.apply_placement(&mut doc, id, placement).unwrap(), InputOutcome::Ignored);

        let object = doc.scene().get(id).unwrap();
        let Shape::Icon(marker) = &object.shape else {
            panic!("expected icon");
        };
        let icon = object.to_canvas(marker.center());
        let caption = object.to_canvas(marker.caption_anchor());
        let gap = marker.caption_anchor().distance_to(marker.center());
        assert!((icon.distance_to(caption) - gap).abs() < 1e-9);
        assert_eq!(icon, Point::new(125.0, 110.0));
    }

    #[test]
    fn test_escape_drops_pending_stroke() {
        let (mut tools, mut doc) = setup();
        tools.set_mode(ToolMode::FreehandDraw);
        tools.on_pointer(&mut doc, PointerEvent::Down(Point::new(0.0, 0.0))).unwrap();
        assert!(tools.stroke_in_progress().is_some());
        assert_eq!(tools.on_key(&mut doc, KeyPress::plain(Key::Escape), &[]).unwrap(), InputOutcome::Pending);
        assert_eq!(
            tools.on_pointer(&mut doc, PointerEvent::Up(Point::new(1.0, 1.0))).unwrap(),
            InputOutcome::Ignored
        );
        assert!(doc.scene().is_empty());
    }

    #[test]
    fn test_status_text_tracks_mode() {
        let (mut tools, mut doc) = setup();
        tools.set_mode(ToolMode::Arrow);
        assert_eq!(tools.status_text(), "Click the arrow start point");
        click(&mut tools, &mut doc, 1.0, 1.0);
        assert_eq!(tools.status_text(), "Click the arrow end point");
        tools.set_mode(ToolMode::IconPlacement);
        assert_eq!(tools.status_text(), "Choose an icon from the catalog");
    }

    #[test]
    fn test_select_click_finishes_label_edit() {
        let (mut tools, mut doc) = setup();
        tools.set_mode(ToolMode::TextLabel);
        let InputOutcome::Committed(id) = tools.place_text(&mut doc, Point::new(1.0, 1.0), Some("Gate")).unwrap()
        else {
            panic!("expected commit");
        };
        tools.set_mode(ToolMode::Select);
        assert!(tools.begin_text_edit(&doc, id));
        tools.edit_buffer_mut().unwrap().push_str(" 2");

        assert_eq!(click(&mut tools, &mut doc, 400.0, 300.0), InputOutcome::Committed(id));
        assert!(!tools.is_editing_text());
        assert_eq!(doc.scene().get(id).and_then(|o| o.as_text()).unwrap().content, "Gate 2");
        assert_eq!(click(&mut tools, &mut doc, 400.0, 300.0), InputOutcome::Ignored);
    }
}
