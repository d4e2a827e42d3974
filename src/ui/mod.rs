// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the site-plan editor.

pub mod canvas;
pub mod icons;
pub mod toolbar;
