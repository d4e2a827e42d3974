// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Site-plan editor desktop host.
//!
//! Usage: `siteplan [owning-document-id]`. Configuration is read from
//! `siteplan.yaml` in the working directory when present.

mod app;
mod ui;

use anyhow::Result;
use app::SitePlanApp;
use siteplan::config::{EditorConfig, DEFAULT_CONFIG_FILE};
use std::path::Path;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let owner = std::env::args().nth(1).unwrap_or_else(|| "draft".to_string());
    let config = EditorConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE));
    let app = SitePlanApp::new(owner.clone(), config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([960.0, 680.0])
            .with_title(format!("Site Plan - {owner}")),
        ..Default::default()
    };

    eframe::run_native("siteplan", options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
