// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor configuration.
//!
//! Read from a YAML file; every field has a default so a partial (or
//! missing) file still yields a usable editor.

use crate::error::{EditorError, Result};
use crate::history::DEFAULT_HISTORY_DEPTH;
use crate::tools::{StrokeStyle, TextStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "siteplan.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Number of undo snapshots kept
    pub history_depth: usize,
    /// Upscale factor of the flattened export
    pub export_scale: f32,
    /// Edge length of placed icon glyphs, in logical units
    pub icon_size: f64,
    /// Initial style for strokes and arrows
    pub stroke: StrokeStyle,
    /// Initial style for text labels
    pub text: TextStyle,
    /// Directory holding stored objects and plan records
    pub storage_root: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_HISTORY_DEPTH,
            export_scale: 2.0,
            icon_size: 48.0,
            stroke: StrokeStyle::default(),
            text: TextStyle::default(),
            storage_root: PathBuf::from("siteplan-data"),
        }
    }
}

impl EditorConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| EditorError::Config(e.to_string()))
    }

    /// Load from `path`, failing if it cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| EditorError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_yaml(&yaml)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path`, falling back to defaults with a warning.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No configuration at {}, using defaults", path.display());
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("{e}; using default configuration");
            Self::default()
        })
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.storage_root.join("objects")
    }

    pub fn plans_dir(&self) -> PathBuf {
        self.storage_root.join("plans")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::Rgba;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.history_depth, 30);
        assert_eq!(config.export_scale, 2.0);
        assert_eq!(config.stroke.color, Rgba::RED);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EditorConfig::from_yaml(
            "history_depth: 10\nstroke:\n  color: '#0000ff'\n  width: 5.0\n",
        )
        .unwrap();
        assert_eq!(config.history_depth, 10);
        assert_eq!(config.stroke.color, Rgba::rgb(0, 0, 255));
        assert_eq!(config.stroke.width, 5.0);
        assert_eq!(config.icon_size, 48.0);
        assert_eq!(config.text, TextStyle::default());
    }

    #[test]
    fn test_bad_yaml_is_config_error() {
        let err = EditorConfig::from_yaml("history_depth: [oops").unwrap_err();
        assert!(matches!(err, EditorError::Config(_)));
        let err = EditorConfig::from_yaml("stroke:\n  color: purple\n  width: 1.0\n").unwrap_err();
        assert!(matches!(err, EditorError::Config(_)));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = EditorConfig::load_or_default(Path::new("/nonexistent/siteplan.yaml"));
        assert_eq!(config, EditorConfig::default());
        assert!(EditorConfig::load(Path::new("/nonexistent/siteplan.yaml")).is_err());
    }
}
