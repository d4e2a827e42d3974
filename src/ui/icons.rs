// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Icon catalog panel and glyph textures.

use siteplan::io::media;
use siteplan::io::raster::ICON_COLOR;
use siteplan::models::icon::IconCatalog;
use std::collections::HashMap;

/// Pixel size glyphs are rasterized at before upload.
const GLYPH_PIXELS: u32 = 96;

/// Glyph textures by template id. Failed glyphs are cached as `None` so
/// they are only rasterized (and logged) once.
#[derive(Default)]
pub struct IconCache {
    textures: HashMap<String, Option<egui::TextureHandle>>,
}

impl IconCache {
    pub fn texture(
        &mut self,
        ctx: &egui::Context,
        catalog: &IconCatalog,
        template_id: &str,
    ) -> Option<egui::TextureId> {
        self.textures
            .entry(template_id.to_string())
            .or_insert_with(|| {
                let glyph = catalog
                    .glyph_for(template_id)
                    .and_then(|markup| media::rasterize_glyph(markup, GLYPH_PIXELS, ICON_COLOR));
                match glyph {
                    Ok(image) => {
                        let size = [image.width() as usize, image.height() as usize];
                        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
                        Some(ctx.load_texture(
                            format!("icon-{template_id}"),
                            color_image,
                            egui::TextureOptions::LINEAR,
                        ))
                    }
                    Err(e) => {
                        log::error!("Icon {template_id} unavailable: {e}");
                        None
                    }
                }
            })
            .as_ref()
            .map(|t| t.id())
    }
}

/// Display the catalog. Returns the template id the user picked.
pub fn show(
    ui: &mut egui::Ui,
    catalog: &IconCatalog,
    cache: &mut IconCache,
    active: Option<&str>,
) -> Option<String> {
    let mut picked = None;

    ui.heading("Equipment");
    ui.separator();

    egui::ScrollArea::vertical().show(ui, |ui| {
        for template in catalog.templates() {
            ui.horizontal(|ui| {
                match cache.texture(ui.ctx(), catalog, &template.id) {
                    Some(texture) => {
                        ui.image((texture, egui::vec2(24.0, 24.0)));
                    }
                    None => {
                        ui.add_space(24.0);
                    }
                }
                let selected = active == Some(template.id.as_str());
                if ui.selectable_label(selected, &template.display_name).clicked() {
                    picked = Some(template.id.clone());
                }
            });
        }
    });

    picked
}
