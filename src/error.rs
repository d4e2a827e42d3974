// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the site-plan editor.
//!
//! Input mistakes (an empty label, a click with no icon chosen) are not
//! errors: the tool controller simply declines them. Everything here is
//! recoverable within the session.

use thiserror::Error;

/// Errors surfaced by the editor to its caller.
#[derive(Error, Debug)]
pub enum EditorError {
    /// A background or icon image could not be decoded
    #[error("Failed to decode {what}: {message}")]
    Decode {
        /// What was being decoded (e.g. "background", "icon glyph")
        what: String,
        /// Decoder message
        message: String,
    },

    /// Upload or record store failure while saving or loading
    #[error("Persistence error: {0}")]
    Persistence(#[source] anyhow::Error),

    /// A save is already in flight for this session
    #[error("A save is already in progress")]
    Busy,

    /// The editable form could not be read or written
    #[error("Invalid plan document: {message}")]
    Format {
        /// Description of the format problem
        message: String,
    },

    /// The flattened export could not be rendered or encoded
    #[error("Failed to render flattened export: {0}")]
    Render(String),

    /// Icon template or glyph reference not present in the catalog
    #[error("Unknown icon: {0}")]
    UnknownIcon(String),

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EditorError {
    /// Create a decode error.
    pub fn decode(what: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            what: what.into(),
            message: message.to_string(),
        }
    }

    /// Create a format error.
    pub fn format(message: impl std::fmt::Display) -> Self {
        Self::Format {
            message: message.to_string(),
        }
    }

    /// Whether the error came from the save mutual-exclusion guard.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(err: serde_json::Error) -> Self {
        Self::format(err)
    }
}

/// Result type for editor operations.
pub type Result<T> = std::result::Result<T, EditorError>;
