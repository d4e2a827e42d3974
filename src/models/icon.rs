// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Security-equipment icon catalog.
//!
//! The catalog is closed and loaded once at startup. Each template points
//! at a glyph: an SVG fragment drawn in a 24x24 box with `currentColor`.

use crate::error::{EditorError, Result};
use serde::{Deserialize, Serialize};

/// Side of the square box glyph fragments are drawn in.
pub const GLYPH_VIEWBOX: f64 = 24.0;

/// One placeable icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconTemplate {
    pub id: String,
    pub display_name: String,
    pub glyph_reference: String,
}

/// The closed list of icon templates and their glyphs.
#[derive(Debug, Clone)]
pub struct IconCatalog {
    templates: Vec<IconTemplate>,
    glyphs: Vec<(String, String)>,
}

const BUILTIN: &[(&str, &str, &str)] = &[
    (
        "bullet_camera",
        "Bullet Camera",
        r#"<g fill="none" stroke="currentColor" stroke-width="1.5" stroke-linejoin="round"><rect x="2" y="7" width="14" height="8" rx="1.5"/><path d="M16 9l5-2.5v9L16 13z"/><path d="M6 15v4h6"/></g>"#,
    ),
    (
        "dome_camera",
        "Dome Camera",
        r#"<g fill="none" stroke="currentColor" stroke-width="1.5"><path d="M3 8h18"/><path d="M5 8a7 7 0 0 0 14 0"/><circle cx="12" cy="11" r="2.5" fill="currentColor"/></g>"#,
    ),
    (
        "motion_sensor",
        "Motion Sensor",
        r#"<g fill="none" stroke="currentColor" stroke-width="1.5" stroke-linecap="round"><circle cx="12" cy="14" r="2.5" fill="currentColor"/><path d="M7.5 9.5a6.5 6.5 0 0 1 9 0"/><path d="M4.5 6.5a10.5 10.5 0 0 1 15 0"/></g>"#,
    ),
    (
        "door_contact",
        "Door Contact",
        r#"<g fill="none" stroke="currentColor" stroke-width="1.5"><rect x="4" y="3" width="10" height="18"/><circle cx="11" cy="12" r="1" fill="currentColor"/><rect x="17" y="8" width="3" height="8" fill="currentColor"/></g>"#,
    ),
    (
        "keypad",
        "Keypad",
        r#"<g stroke="currentColor" stroke-width="1.5"><rect x="5" y="2" width="14" height="20" rx="2" fill="none"/><g fill="currentColor" stroke="none"><circle cx="9" cy="8" r="1.2"/><circle cx="12" cy="8" r="1.2"/><circle cx="15" cy="8" r="1.2"/><circle cx="9" cy="12" r="1.2"/><circle cx="12" cy="12" r="1.2"/><circle cx="15" cy="12" r="1.2"/><circle cx="9" cy="16" r="1.2"/><circle cx="12" cy="16" r="1.2"/><circle cx="15" cy="16" r="1.2"/></g></g>"#,
    ),
    (
        "siren",
        "Siren",
        r#"<g fill="none" stroke="currentColor" stroke-width="1.5" stroke-linecap="round"><path d="M6 18v-6a6 6 0 0 1 12 0v6z"/><path d="M4 21h16"/><path d="M12 2v2M3.5 5.5l1.5 1.5M20.5 5.5L19 7"/></g>"#,
    ),
    (
        "control_panel",
        "Control Panel",
        r#"<g fill="none" stroke="currentColor" stroke-width="1.5"><rect x="3" y="3" width="18" height="18" rx="1.5"/><rect x="6" y="6" width="12" height="5"/><path d="M7 15h2M11 15h2M15 15h2M7 18h10"/></g>"#,
    ),
    (
        "smoke_detector",
        "Smoke Detector",
        r#"<g fill="none" stroke="currentColor" stroke-width="1.5"><circle cx="12" cy="12" r="9"/><circle cx="12" cy="12" r="4"/><circle cx="12" cy="12" r="1" fill="currentColor"/></g>"#,
    ),
    (
        "glass_break",
        "Glass Break",
        r#"<g fill="none" stroke="currentColor" stroke-width="1.5" stroke-linejoin="round"><rect x="3" y="3" width="18" height="18"/><path d="M12 3l-2 6 4 3-3 9M10 9l-7 2M14 12l7-1"/></g>"#,
    ),
    (
        "card_reader",
        "Card Reader",
        r#"<g fill="none" stroke="currentColor" stroke-width="1.5"><rect x="7" y="2" width="10" height="20" rx="1.5"/><path d="M10 6h4"/><rect x="9.5" y="10" width="5" height="7" rx="0.5"/></g>"#,
    ),
];

impl IconCatalog {
    /// The catalog shipped with the editor.
    pub fn builtin() -> Self {
        let templates = BUILTIN
            .iter()
            .map(|(id, name, _)| IconTemplate {
                id: id.to_string(),
                display_name: name.to_string(),
                glyph_reference: format!("builtin:{id}"),
            })
            .collect();
        let glyphs = BUILTIN
            .iter()
            .map(|(id, _, markup)| (format!("builtin:{id}"), markup.to_string()))
            .collect();
        log::debug!("Loaded {} built-in icon templates", BUILTIN.len());
        Self { templates, glyphs }
    }

    pub fn templates(&self) -> &[IconTemplate] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&IconTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Look up a template, failing for ids outside the catalog.
    pub fn require(&self, id: &str) -> Result<&IconTemplate> {
        self.get(id).ok_or_else(|| EditorError::UnknownIcon(id.to_string()))
    }

    /// SVG fragment for a glyph reference.
    pub fn glyph(&self, reference: &str) -> Result<&str> {
        self.glyphs
            .iter()
            .find(|(r, _)| r == reference)
            .map(|(_, markup)| markup.as_str())
            .ok_or_else(|| EditorError::UnknownIcon(reference.to_string()))
    }

    /// SVG fragment for the template with `id`.
    pub fn glyph_for(&self, id: &str) -> Result<&str> {
        let template = self.require(id)?;
        self.glyph(&template.glyph_reference)
    }
}

/// Wrap a glyph fragment as a standalone SVG document of `size` pixels.
pub fn glyph_document(markup: &str, size: u32, color: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {vb} {vb}" color="{color}">{markup}</svg>"#,
        vb = GLYPH_VIEWBOX
    )
}
