// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model for the site-plan editor.

pub mod annotation;
pub mod icon;
pub mod scene;
