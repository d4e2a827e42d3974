// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar: mode selection and drawing style.

use siteplan::models::annotation::Rgba;
use siteplan::tools::{StrokeStyle, TextStyle, ToolMode};

/// Changes requested from the toolbar this frame.
#[derive(Default)]
pub struct ToolbarAction {
    pub mode: Option<ToolMode>,
    pub stroke: Option<StrokeStyle>,
    pub text: Option<TextStyle>,
}

/// Display the toolbar with mode buttons and style controls.
pub fn show(
    ui: &mut egui::Ui,
    current: ToolMode,
    stroke: StrokeStyle,
    text: TextStyle,
    help: &str,
) -> ToolbarAction {
    let mut action = ToolbarAction::default();

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tools:");
        ui.separator();

        for mode in ToolMode::ALL {
            let label = format!("{} {}", mode_symbol(mode), mode.label());
            if ui.selectable_label(current == mode, label).clicked() {
                action.mode = Some(mode);
            }
        }

        ui.separator();

        let mut stroke_edit = stroke;
        let mut color = to_color32(stroke.color);
        ui.label("Line:");
        if ui.color_edit_button_srgba(&mut color).changed() {
            stroke_edit.color = from_color32(color);
        }
        ui.add(egui::Slider::new(&mut stroke_edit.width, 1.0..=20.0).text("width"));
        if stroke_edit != stroke {
            action.stroke = Some(stroke_edit);
        }

        ui.separator();

        let mut text_edit = text;
        let mut color = to_color32(text.color);
        ui.label("Text:");
        if ui.color_edit_button_srgba(&mut color).changed() {
            text_edit.color = from_color32(color);
        }
        ui.add(egui::Slider::new(&mut text_edit.font_size, 8.0..=72.0).text("size"));
        if text_edit != text {
            action.text = Some(text_edit);
        }

        ui.separator();

        ui.label(egui::RichText::new(help).italics().weak());
    });

    action
}

fn mode_symbol(mode: ToolMode) -> &'static str {
    match mode {
        ToolMode::Select => "⬆",
        ToolMode::FreehandDraw => "✏",
        ToolMode::Arrow => "➡",
        ToolMode::TextLabel => "T",
        ToolMode::IconPlacement => "⊕",
    }
}

pub fn to_color32(c: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

pub fn from_color32(c: egui::Color32) -> Rgba {
    let [r, g, b, a] = c.to_srgba_unmultiplied();
    Rgba { r, g, b, a }
}
