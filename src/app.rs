// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns at most one editing session and forwards menu, toolbar,
//! keyboard and canvas input to it. Prompts and confirmations are shown
//! as windows and answered on a later frame.

use crate::ui::{canvas, icons, toolbar};
use siteplan::models::annotation::Point;
use siteplan::{
    EditorConfig, EditorSession, InputOutcome, Key, KeyPress, SessionEvent, SessionServices, ToolMode,
};
use std::f64::consts::PI;

/// Rotation applied by one Q/E press.
const ROTATE_STEP: f64 = PI / 12.0;

/// A text label waiting for its content.
struct TextPrompt {
    at: Point,
    buffer: String,
}

/// Main application state.
pub struct SitePlanApp {
    owner: String,
    config: EditorConfig,
    services: SessionServices,

    /// Open session; `None` after Close
    session: Option<EditorSession>,

    canvas: canvas::CanvasState,

    text_prompt: Option<TextPrompt>,
    confirm_clear: bool,

    /// Last notable event, shown in the status bar
    message: Option<String>,
}

impl SitePlanApp {
    pub fn new(owner: String, config: EditorConfig) -> anyhow::Result<Self> {
        let services = SessionServices::filesystem(&config);
        let session = EditorSession::open(&owner, &services, &config)?;
        Ok(Self {
            owner,
            config,
            services,
            session: Some(session),
            canvas: canvas::CanvasState::default(),
            text_prompt: None,
            confirm_clear: false,
            message: None,
        })
    }

    fn reopen(&mut self) {
        match EditorSession::open(&self.owner, &self.services, &self.config) {
            Ok(session) => {
                self.session = Some(session);
                self.message = Some("Reopened".to_string());
            }
            Err(e) => {
                log::error!("Failed to reopen {}: {}", self.owner, e);
                self.message = Some(format!("Open failed: {e}"));
            }
        }
    }

    fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
        self.canvas = canvas::CanvasState::default();
        self.text_prompt = None;
        self.confirm_clear = false;
        self.message = Some("Closed".to_string());
    }

    fn save(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.request_save() {
            Ok(()) => self.message = Some("Saving...".to_string()),
            Err(e) if e.is_busy() => self.message = Some("A save is already in progress".to_string()),
            Err(e) => {
                log::error!("Save failed to start: {e}");
                self.message = Some(format!("Save failed: {e}"));
            }
        }
    }

    fn open_background(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "gif", "webp", "tif", "tiff"])
            .pick_file()
        else {
            return;
        };
        match std::fs::read(&path) {
            Ok(bytes) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                session.load_background(&name, bytes);
                self.message = Some(format!("Loading {name}..."));
            }
            Err(e) => {
                log::error!("Failed to read {}: {}", path.display(), e);
                self.message = Some(format!("Could not read {}", path.display()));
            }
        }
    }

    fn delete_selected(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let result = session.delete_selected(&self.canvas.selection);
        if let Some(InputOutcome::Removed(_)) = report(&mut self.message, result) {
            self.canvas.selection.clear();
        }
    }

    fn undo(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let result = session.undo();
        report(&mut self.message, result);
    }

    /// Rotate every selected annotation about its own pivot.
    fn rotate_selection(&mut self, step: f64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let changes: Vec<_> = self
            .canvas
            .selection
            .iter()
            .filter_map(|id| session.scene().get(*id))
            .map(|object| {
                let mut placement = object.placement;
                placement.rotation += step;
                (object.id, placement)
            })
            .collect();
        let result = session.apply_placements(&changes);
        report(&mut self.message, result);
    }

    /// Drain finished background work from the session.
    fn poll_session(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        for event in session.poll() {
            self.message = Some(match event {
                SessionEvent::Saved { reference } => format!("Saved ({reference})"),
                SessionEvent::SaveFailed(e) => format!("Save failed: {e}"),
                SessionEvent::BackgroundReady { .. } => "Background ready".to_string(),
                SessionEvent::BackgroundFailed(e) => format!("Background failed: {e}"),
            });
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (delete, undo, escape, save, rotate_left, rotate_right) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace),
                i.modifiers.command && i.key_pressed(egui::Key::Z),
                i.key_pressed(egui::Key::Escape),
                i.modifiers.command && i.key_pressed(egui::Key::S),
                !i.modifiers.command && i.key_pressed(egui::Key::Q),
                !i.modifiers.command && i.key_pressed(egui::Key::E),
            )
        });

        if save {
            self.save();
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if undo {
            let result = session.key(KeyPress::command(Key::Z), &[]);
            report(&mut self.message, result);
        }
        if delete {
            let result = session.key(KeyPress::plain(Key::Delete), &self.canvas.selection);
            if let Some(InputOutcome::Removed(_)) = report(&mut self.message, result) {
                self.canvas.selection.clear();
            }
        }
        if escape {
            let result = session.key(KeyPress::plain(Key::Escape), &[]);
            if let Some(InputOutcome::Ignored) = report(&mut self.message, result) {
                self.canvas.selection.clear();
            }
        }
        if self.session.as_ref().is_some_and(|s| s.mode() == ToolMode::Select) {
            if rotate_left {
                self.rotate_selection(-ROTATE_STEP);
            }
            if rotate_right {
                self.rotate_selection(ROTATE_STEP);
            }
        }
    }

    fn handle_canvas(&mut self, actions: Vec<canvas::CanvasAction>) {
        for action in actions {
            let Some(session) = self.session.as_mut() else {
                return;
            };
            let result = match action {
                canvas::CanvasAction::Pointer(event) => session.pointer(event),
                canvas::CanvasAction::Transform(changes) => session.apply_placements(&changes),
                canvas::CanvasAction::EditLabel(id) => {
                    if let Err(e) = session.finish_text_edit() {
                        log::error!("{e}");
                    }
                    session.begin_text_edit(id);
                    Ok(InputOutcome::Pending)
                }
            };
            if let Some(InputOutcome::TextRequested(at)) = report(&mut self.message, result) {
                self.text_prompt = Some(TextPrompt {
                    at,
                    buffer: String::new(),
                });
            }
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            let open = self.session.is_some();
            ui.menu_button("File", |ui| {
                if ui.add_enabled(open, egui::Button::new("Open Background...")).clicked() {
                    ui.close_menu();
                    self.open_background();
                }
                let has_background = self
                    .session
                    .as_ref()
                    .is_some_and(|s| s.scene().background().is_some());
                if ui.add_enabled(has_background, egui::Button::new("Remove Background")).clicked() {
                    if let Some(session) = self.session.as_mut() {
                        let result = session.remove_background();
                        report(&mut self.message, result);
                    }
                    ui.close_menu();
                }
                ui.separator();
                let saving = self.session.as_ref().is_some_and(|s| s.is_saving());
                if ui.add_enabled(open && !saving, egui::Button::new("Save (Ctrl+S)")).clicked() {
                    self.save();
                    ui.close_menu();
                }
                ui.separator();
                if open {
                    if ui.button("Close").clicked() {
                        self.close();
                        ui.close_menu();
                    }
                } else if ui.button("Reopen").clicked() {
                    self.reopen();
                    ui.close_menu();
                }
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("Edit", |ui| {
                let can_undo = self
                    .session
                    .as_ref()
                    .is_some_and(|s| s.document().history().can_undo());
                if ui.add_enabled(can_undo, egui::Button::new("Undo (Ctrl+Z)")).clicked() {
                    self.undo();
                    ui.close_menu();
                }

                ui.separator();

                let has_selection = !self.canvas.selection.is_empty();
                if ui.add_enabled(has_selection, egui::Button::new("Delete Selected")).clicked() {
                    self.delete_selected();
                    ui.close_menu();
                }
                let has_annotations = self.session.as_ref().is_some_and(|s| !s.scene().is_empty());
                if ui.add_enabled(has_annotations, egui::Button::new("Clear Annotations...")).clicked() {
                    self.confirm_clear = true;
                    ui.close_menu();
                }
            });
        });
    }

    fn dialogs(&mut self, ctx: &egui::Context) {
        // Text prompt for a new label
        if let Some(prompt) = self.text_prompt.as_mut() {
            let mut answer: Option<Option<String>> = None;
            egui::Window::new("New Label")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    let edit = ui.text_edit_multiline(&mut prompt.buffer);
                    edit.request_focus();
                    ui.horizontal(|ui| {
                        if ui.button("Place").clicked() {
                            answer = Some(Some(prompt.buffer.clone()));
                        }
                        if ui.button("Cancel").clicked() {
                            answer = Some(None);
                        }
                    });
                });
            if let Some(answer) = answer {
                let at = prompt.at;
                self.text_prompt = None;
                if let Some(session) = self.session.as_mut() {
                    let result = session.place_text(at, answer.as_deref());
                    report(&mut self.message, result);
                }
            }
        }

        // Edit window for the label in edit state
        if let Some(session) = self.session.as_mut() {
            let mut finish = false;
            let mut cancel = false;
            if let Some(buffer) = session.edit_buffer_mut() {
                egui::Window::new("Edit Label")
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -40.0))
                    .show(ctx, |ui| {
                        ui.text_edit_multiline(buffer);
                        ui.horizontal(|ui| {
                            finish = ui.button("Done").clicked();
                            cancel = ui.button("Cancel").clicked();
                        });
                    });
            }
            if finish {
                let result = session.finish_text_edit();
                report(&mut self.message, result);
            } else if cancel {
                session.cancel_text_edit();
            }
        }

        // Confirmation before clearing
        if self.confirm_clear {
            let mut confirmed = None;
            egui::Window::new("Clear Annotations")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.label("Remove every annotation? The background is kept.");
                    ui.horizontal(|ui| {
                        if ui.button("Clear").clicked() {
                            confirmed = Some(true);
                        }
                        if ui.button("Cancel").clicked() {
                            confirmed = Some(false);
                        }
                    });
                });
            if let Some(confirmed) = confirmed {
                self.confirm_clear = false;
                if let Some(session) = self.session.as_mut() {
                    let result = session.clear_annotations(confirmed);
                    if let Some(InputOutcome::Removed(_)) = report(&mut self.message, result) {
                        self.canvas.selection.clear();
                    }
                }
            }
        }
    }
}

/// Log a failed editor operation and show it in the status bar.
fn report(message: &mut Option<String>, result: siteplan::Result<InputOutcome>) -> Option<InputOutcome> {
    match result {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            log::error!("{e}");
            *message = Some(e.to_string());
            None
        }
    }
}

impl eframe::App for SitePlanApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_session();

        // Keep polling while work is in flight
        if self
            .session
            .as_ref()
            .is_some_and(|s| s.is_saving() || s.is_decoding())
        {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ctx, ui);
        });

        if let Some(session) = self.session.as_ref() {
            let tools = session.tools();
            let action = egui::TopBottomPanel::top("toolbar")
                .show(ctx, |ui| {
                    toolbar::show(
                        ui,
                        session.mode(),
                        tools.stroke_style(),
                        tools.text_style(),
                        &session.status_text(),
                    )
                })
                .inner;
            if let Some(session) = self.session.as_mut() {
                if let Some(mode) = action.mode {
                    let result = session.set_mode(mode).map(|_| InputOutcome::Pending);
                    report(&mut self.message, result);
                    self.canvas.selection.clear();
                }
                if let Some(stroke) = action.stroke {
                    session.set_stroke_style(stroke);
                }
                if let Some(text) = action.text {
                    session.set_text_style(text);
                }
            }
        }

        let picked = self.session.as_ref().and_then(|session| {
            let active = session.tools().icon_template().map(|t| t.id.clone());
            egui::SidePanel::right("icon_catalog")
                .default_width(200.0)
                .show(ctx, |ui| icons::show(ui, session.catalog(), &mut self.canvas.icons, active.as_deref()))
                .inner
        });
        if let (Some(id), Some(session)) = (picked, self.session.as_mut()) {
            if let Err(e) = session.select_icon_template(&id) {
                log::error!("{e}");
                self.message = Some(e.to_string());
            }
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Plan: {}", self.owner));
                ui.separator();
                match self.session.as_ref() {
                    Some(session) => {
                        ui.label(format!("{} annotations", session.scene().len()));
                        if let Some(reference) = session.last_saved_reference() {
                            ui.separator();
                            ui.label(format!("Export: {reference}"));
                        }
                        if session.is_saving() {
                            ui.separator();
                            ui.spinner();
                            ui.label("Saving");
                        }
                    }
                    None => {
                        ui.label("Closed");
                    }
                }
                if let Some(message) = &self.message {
                    ui.separator();
                    ui.label(egui::RichText::new(message).weak());
                }
            });
        });

        self.dialogs(ctx);
        self.handle_keys(ctx);

        let actions = egui::CentralPanel::default()
            .show(ctx, |ui| match self.session.as_ref() {
                Some(session) => canvas::show(ui, session, &mut self.canvas),
                None => {
                    ui.centered_and_justified(|ui| {
                        ui.label(
                            egui::RichText::new("Session closed. File → Reopen to continue editing.")
                                .color(egui::Color32::from_gray(160)),
                        );
                    });
                    Vec::new()
                }
            })
            .inner;
        self.handle_canvas(actions);
    }
}
