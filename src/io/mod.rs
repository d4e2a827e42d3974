// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O: the editable form, flattened export, image decoding and the
//! storage collaborators a plan is persisted through.

pub mod codec;
pub mod gateway;
pub mod media;
pub mod raster;
pub mod storage;
