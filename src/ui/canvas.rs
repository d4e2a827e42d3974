// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for the site plan.
//!
//! Paints the background and every annotation from the scene, turns pointer
//! input into editor events for the drawing modes, and handles selection,
//! drag-move and rotation preview in select mode. Select-mode changes are
//! returned as placements for the session to commit.

use super::icons::IconCache;
use super::toolbar::to_color32;
use image::RgbaImage;
use siteplan::models::annotation::{AnnotationId, AnnotationObject, Placement, Point, Shape, CAPTION_FONT_SIZE};
use siteplan::models::scene::LOGICAL_CANVAS;
use siteplan::tools::{PointerEvent, ToolMode};
use siteplan::EditorSession;
use std::sync::Arc;

/// Hit-test tolerance in logical units.
const HIT_MARGIN: f64 = 6.0;

const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(30, 136, 229);

/// Result of canvas interaction.
pub enum CanvasAction {
    Pointer(PointerEvent),
    Transform(Vec<(AnnotationId, Placement)>),
    EditLabel(AnnotationId),
}

/// Mapping between the logical canvas and screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasView {
    pub rect: egui::Rect,
    pub scale: f32,
}

impl CanvasView {
    /// Largest logical canvas that fits `available`, centered.
    pub fn fit(available: egui::Rect) -> Self {
        let (w, h) = (LOGICAL_CANVAS.width as f32, LOGICAL_CANVAS.height as f32);
        let scale = (available.width() / w).min(available.height() / h).max(0.01);
        let rect = egui::Rect::from_center_size(available.center(), egui::vec2(w * scale, h * scale));
        Self { rect, scale }
    }

    pub fn to_screen(&self, p: Point) -> egui::Pos2 {
        self.rect.min + egui::vec2(p.x as f32 * self.scale, p.y as f32 * self.scale)
    }

    pub fn to_logical(&self, pos: egui::Pos2) -> Point {
        let rel = pos - self.rect.min;
        Point::new((rel.x / self.scale) as f64, (rel.y / self.scale) as f64)
    }
}

/// Select-mode drag in progress.
#[derive(Debug, Clone, Copy)]
struct Drag {
    origin: Point,
    current: Point,
}

impl Drag {
    fn delta(&self) -> (f64, f64) {
        (self.current.x - self.origin.x, self.current.y - self.origin.y)
    }
}

/// Canvas state kept between frames.
#[derive(Default)]
pub struct CanvasState {
    pub selection: Vec<AnnotationId>,
    pub icons: IconCache,
    drag: Option<Drag>,
    background: Option<(String, egui::TextureHandle)>,
}

impl CanvasState {
    /// Upload the background texture when the scene's background changes.
    fn sync_background(&mut self, ctx: &egui::Context, reference: Option<&str>, pixels: Option<Arc<RgbaImage>>) {
        let current = self.background.as_ref().map(|(r, _)| r.as_str());
        if current == reference {
            return;
        }
        self.background = match (reference, pixels) {
            (Some(reference), Some(pixels)) => {
                let size = [pixels.width() as usize, pixels.height() as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_raw());
                let texture = ctx.load_texture("background", color_image, egui::TextureOptions::LINEAR);
                Some((reference.to_string(), texture))
            }
            _ => None,
        };
    }

    /// Placement of `object` including any drag preview.
    fn preview_placement(&self, object: &AnnotationObject) -> Placement {
        let mut placement = object.placement;
        if let Some(drag) = self.drag {
            if self.selection.contains(&object.id) {
                let (dx, dy) = drag.delta();
                placement.offset = placement.offset.offset(dx, dy);
            }
        }
        placement
    }
}

/// Display the canvas and handle pointer input.
pub fn show(ui: &mut egui::Ui, session: &EditorSession, state: &mut CanvasState) -> Vec<CanvasAction> {
    let mut actions = Vec::new();
    let scene = session.scene();
    state.selection.retain(|id| scene.contains(*id));

    let view = CanvasView::fit(ui.available_rect_before_wrap());
    let response = ui.allocate_rect(view.rect, egui::Sense::click_and_drag());
    let painter = ui.painter_at(view.rect);

    painter.rect_filled(view.rect, 0.0, egui::Color32::WHITE);

    state.sync_background(
        ui.ctx(),
        scene.background().map(|b| b.reference.as_str()),
        session.background_pixels(),
    );
    if let (Some(bg), Some((_, texture))) = (scene.background(), &state.background) {
        let fit = bg.fit(LOGICAL_CANVAS);
        let rect = egui::Rect::from_min_max(
            view.to_screen(Point::new(0.0, 0.0)),
            view.to_screen(Point::new(fit.width, fit.height)),
        );
        painter.image(
            texture.id(),
            rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    } else if scene.background().is_some() {
        painter.text(
            view.rect.center(),
            egui::Align2::CENTER_CENTER,
            "Loading background...",
            egui::FontId::proportional(16.0),
            egui::Color32::from_gray(150),
        );
    }

    for object in scene.annotations() {
        let placement = state.preview_placement(object);
        paint_object(ui.ctx(), &painter, view, session, &mut state.icons, object, placement);
    }

    // Selection outlines
    let editing = session.tools().editing_label();
    for object in scene.annotations() {
        let selected = state.selection.contains(&object.id);
        if !selected && editing != Some(object.id) {
            continue;
        }
        let mut preview = object.clone();
        preview.placement = state.preview_placement(object);
        if let Some(bounds) = preview.bounds() {
            let rect = egui::Rect::from_min_max(view.to_screen(bounds.min), view.to_screen(bounds.max)).expand(3.0);
            let color = if selected { SELECTION_COLOR } else { egui::Color32::from_rgb(251, 140, 0) };
            painter.rect_stroke(rect, 2.0, egui::Stroke::new(1.5, color));
        }
    }

    paint_pending(&painter, view, session, response.hover_pos());

    match session.mode() {
        ToolMode::Select => select_input(ui, &response, view, session, state, &mut actions),
        ToolMode::FreehandDraw => freehand_input(ui, &response, view, &mut actions),
        _ => {
            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    actions.push(CanvasAction::Pointer(PointerEvent::Down(view.to_logical(pos))));
                }
            }
        }
    }

    actions
}

fn freehand_input(ui: &egui::Ui, response: &egui::Response, view: CanvasView, actions: &mut Vec<CanvasAction>) {
    let latest = ui.input(|i| i.pointer.latest_pos());
    if response.drag_started() {
        if let Some(origin) = ui.input(|i| i.pointer.press_origin()) {
            actions.push(CanvasAction::Pointer(PointerEvent::Down(view.to_logical(origin))));
        }
    }
    if response.dragged() {
        if let Some(pos) = response.interact_pointer_pos() {
            actions.push(CanvasAction::Pointer(PointerEvent::Move(view.to_logical(pos))));
        }
    }
    if response.drag_stopped() {
        if let Some(pos) = response.interact_pointer_pos().or(latest) {
            actions.push(CanvasAction::Pointer(PointerEvent::Up(view.to_logical(pos))));
        }
    } else if response.clicked() {
        // A click without movement leaves a dot.
        if let Some(pos) = response.interact_pointer_pos() {
            let p = view.to_logical(pos);
            actions.push(CanvasAction::Pointer(PointerEvent::Down(p)));
            actions.push(CanvasAction::Pointer(PointerEvent::Up(p)));
        }
    }
}

fn select_input(
    ui: &egui::Ui,
    response: &egui::Response,
    view: CanvasView,
    session: &EditorSession,
    state: &mut CanvasState,
    actions: &mut Vec<CanvasAction>,
) {
    let scene = session.scene();
    let additive = ui.input(|i| i.modifiers.shift);
    let pointer = response.interact_pointer_pos().map(|pos| view.to_logical(pos));

    if response.double_clicked() {
        if let Some(id) = pointer.and_then(|p| scene.hit_test(p, HIT_MARGIN)) {
            if scene.get(id).and_then(|o| o.as_text()).is_some() {
                state.selection = vec![id];
                actions.push(CanvasAction::EditLabel(id));
            }
        }
    } else if response.clicked() {
        if let Some(p) = pointer {
            actions.push(CanvasAction::Pointer(PointerEvent::Down(p)));
        }
        match pointer.and_then(|p| scene.hit_test(p, HIT_MARGIN)) {
            Some(id) if additive => {
                if let Some(index) = state.selection.iter().position(|s| *s == id) {
                    state.selection.remove(index);
                } else {
                    state.selection.push(id);
                }
            }
            Some(id) => state.selection = vec![id],
            None if !additive => state.selection.clear(),
            None => {}
        }
    }

    if response.drag_started() {
        let origin = ui.input(|i| i.pointer.press_origin()).map(|pos| view.to_logical(pos));
        if let Some(origin) = origin {
            actions.push(CanvasAction::Pointer(PointerEvent::Down(origin)));
            if let Some(id) = scene.hit_test(origin, HIT_MARGIN) {
                if !state.selection.contains(&id) {
                    state.selection = vec![id];
                }
                state.drag = Some(Drag { origin, current: origin });
            }
        }
    }

    if let (Some(drag), Some(p)) = (state.drag.as_mut(), pointer) {
        if response.dragged() {
            drag.current = p;
        }
    }

    if response.drag_stopped() {
        if let Some(drag) = state.drag.take() {
            let (dx, dy) = drag.delta();
            if dx != 0.0 || dy != 0.0 {
                let changes = state
                    .selection
                    .iter()
                    .filter_map(|id| scene.get(*id))
                    .map(|object| {
                        let mut placement = object.placement;
                        placement.offset = placement.offset.offset(dx, dy);
                        (object.id, placement)
                    })
                    .collect();
                actions.push(CanvasAction::Transform(changes));
            }
        }
    }
}

/// Draw one annotation with `placement` in place of its own.
fn paint_object(
    ctx: &egui::Context,
    painter: &egui::Painter,
    view: CanvasView,
    session: &EditorSession,
    icons: &mut IconCache,
    object: &AnnotationObject,
    placement: Placement,
) {
    let pivot = object.shape.pivot();
    let map = |p: Point| view.to_screen(placement.apply(pivot, p));
    let zoom = view.scale * placement.scale as f32;
    let angle = placement.rotation as f32;

    match &object.shape {
        Shape::Stroke(stroke) => {
            let color = to_color32(stroke.color);
            let width = stroke.width as f32 * zoom;
            if let [only] = stroke.points.as_slice() {
                painter.circle_filled(map(*only), width / 2.0, color);
            } else {
                let points = stroke.points.iter().map(|p| map(*p)).collect();
                painter.add(egui::Shape::line(points, egui::Stroke::new(width, color)));
            }
        }
        Shape::Arrow(arrow) => {
            let color = to_color32(arrow.color());
            painter.line_segment(
                [map(arrow.start()), map(arrow.end())],
                egui::Stroke::new(arrow.width() as f32 * zoom, color),
            );
            let head = arrow.head().iter().map(|p| map(*p)).collect();
            painter.add(egui::Shape::convex_polygon(head, color, egui::Stroke::NONE));
        }
        Shape::Text(label) => {
            let galley = painter.layout_no_wrap(
                label.content.clone(),
                egui::FontId::proportional(label.font_size as f32 * zoom),
                to_color32(label.color),
            );
            let shape = egui::epaint::TextShape::new(map(label.anchor), galley, to_color32(label.color))
                .with_angle(angle);
            painter.add(shape);
        }
        Shape::Icon(marker) => {
            let origin = marker.icon_origin();
            let size = marker.size();
            let corners = [
                origin,
                origin.offset(size, 0.0),
                origin.offset(size, size),
                origin.offset(0.0, size),
            ];
            match icons.texture(ctx, session.catalog(), marker.template_id()) {
                Some(texture) => {
                    let mut mesh = egui::Mesh::with_texture(texture);
                    let uvs = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
                    for (corner, (u, v)) in corners.iter().zip(uvs) {
                        mesh.vertices.push(egui::epaint::Vertex {
                            pos: map(*corner),
                            uv: egui::pos2(u, v),
                            color: egui::Color32::WHITE,
                        });
                    }
                    mesh.add_triangle(0, 1, 2);
                    mesh.add_triangle(0, 2, 3);
                    painter.add(egui::Shape::mesh(mesh));
                }
                None => {
                    let outline = corners.iter().map(|p| map(*p)).collect();
                    painter.add(egui::Shape::closed_line(
                        outline,
                        egui::Stroke::new(1.0, egui::Color32::from_gray(60)),
                    ));
                }
            }

            let caption_color = egui::Color32::from_gray(26);
            let galley = painter.layout_no_wrap(
                marker.caption().to_string(),
                egui::FontId::proportional(CAPTION_FONT_SIZE as f32 * zoom),
                caption_color,
            );
            let half_width = (galley.size().x / zoom / 2.0) as f64;
            let anchor = marker.caption_anchor();
            let top_left = map(Point::new(anchor.x - half_width, anchor.y));
            let shape = egui::epaint::TextShape::new(top_left, galley, caption_color).with_angle(angle);
            painter.add(shape);
        }
    }
}

/// Live feedback for a stroke or arrow that is not committed yet.
fn paint_pending(painter: &egui::Painter, view: CanvasView, session: &EditorSession, hover: Option<egui::Pos2>) {
    let tools = session.tools();
    if let Some((points, style)) = tools.stroke_in_progress() {
        let color = to_color32(style.color);
        let screen: Vec<_> = points.iter().map(|p| view.to_screen(*p)).collect();
        painter.add(egui::Shape::line(screen, egui::Stroke::new(style.width as f32 * view.scale, color)));
    }
    if let Some(start) = tools.pending_arrow_start() {
        let style = tools.stroke_style();
        let color = to_color32(style.color);
        let start = view.to_screen(start);
        painter.circle_filled(start, 4.0, color);
        if let Some(hover) = hover {
            painter.line_segment([start, hover], egui::Stroke::new(1.0, color.gamma_multiply(0.6)));
        }
    }
}
