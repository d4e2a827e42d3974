// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Site-plan annotation editor core.
//!
//! Freehand strokes, arrows, text labels and equipment icon markers drawn
//! over a floor-plan background, with snapshot undo and a save path that
//! stores both an editable form and a flattened PNG.

pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod io;
pub mod models;
pub mod session;
pub mod tools;
pub mod util;

pub use config::EditorConfig;
pub use error::{EditorError, Result};
pub use session::{EditorSession, SessionEvent, SessionServices};
pub use tools::{InputOutcome, Key, KeyPress, PointerEvent, ToolMode};
