// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Saving and loading plans.
//!
//! A save flattens the scene, uploads the PNG, and upserts the plan record
//! on a worker thread; the result comes back over a channel that the UI
//! polls each frame. Only one save may be in flight: a second request is
//! refused with [`EditorError::Busy`] rather than queued.

use crate::error::{EditorError, Result};
use crate::io::codec;
use crate::io::media;
use crate::io::raster::Rasterizer;
use crate::io::storage::{ObjectStore, PersistedPlan, PlanRepository};
use crate::models::scene::Scene;
use image::RgbaImage;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;

/// A plan restored from the record store.
#[derive(Debug, Clone)]
pub struct LoadedPlan {
    pub scene: Scene,
    pub has_background: bool,
    pub flattened_reference: String,
}

/// Everything a save worker needs, detached from the session.
struct SaveJob {
    owner: String,
    scene: Scene,
    editable: String,
    background: Option<Arc<RgbaImage>>,
    scale: f32,
    store: Arc<dyn ObjectStore>,
    plans: Arc<dyn PlanRepository>,
    rasterizer: Arc<dyn Rasterizer>,
}

pub struct PersistenceGateway {
    store: Arc<dyn ObjectStore>,
    plans: Arc<dyn PlanRepository>,
    rasterizer: Arc<dyn Rasterizer>,
    export_scale: f32,
    /// Receiver for the save currently in flight
    in_flight: Option<Receiver<Result<String>>>,
}

impl PersistenceGateway {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        plans: Arc<dyn PlanRepository>,
        rasterizer: Arc<dyn Rasterizer>,
        export_scale: f32,
    ) -> Self {
        Self {
            store,
            plans,
            rasterizer,
            export_scale,
            in_flight: None,
        }
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    /// Fetch and decode the plan for `owner`, or `None` if it has none yet.
    pub fn load(&self, owner: &str) -> Result<Option<LoadedPlan>> {
        let Some(plan) = self.plans.find_by_owner(owner).map_err(EditorError::Persistence)? else {
            log::info!("No saved plan for {owner}");
            return Ok(None);
        };
        let scene = codec::decode(&plan.editable)?;
        log::info!("Loaded plan for {owner}: {} annotations", scene.len());
        Ok(Some(LoadedPlan {
            has_background: scene.background().is_some(),
            scene,
            flattened_reference: plan.flattened_reference,
        }))
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start saving `scene` for `owner`.
    ///
    /// The editable form is produced here, on the caller's thread; the
    /// raster, upload and record upsert run on a worker.
    pub fn begin_save(&mut self, scene: &Scene, background: Option<Arc<RgbaImage>>, owner: &str) -> Result<()> {
        if self.in_flight.is_some() {
            log::warn!("Save refused for {owner}: another save is in progress");
            return Err(EditorError::Busy);
        }
        let job = SaveJob {
            owner: owner.to_string(),
            scene: scene.clone(),
            editable: codec::encode(scene)?,
            background,
            scale: self.export_scale,
            store: Arc::clone(&self.store),
            plans: Arc::clone(&self.plans),
            rasterizer: Arc::clone(&self.rasterizer),
        };

        let (sender, receiver) = channel();
        self.in_flight = Some(receiver);
        log::info!("Saving plan for {owner}");

        std::thread::spawn(move || {
            let result = run_save(job);
            let _ = sender.send(result);
        });
        Ok(())
    }

    /// Result of the in-flight save, if it has finished.
    pub fn poll_save(&mut self) -> Option<Result<String>> {
        let receiver = self.in_flight.as_ref()?;
        match receiver.try_recv() {
            Ok(result) => {
                self.in_flight = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.in_flight = None;
                Some(Err(EditorError::Persistence(anyhow::anyhow!("save worker stopped"))))
            }
        }
    }

    /// Block until the in-flight save finishes. `None` if nothing is saving.
    pub fn wait_save(&mut self) -> Option<Result<String>> {
        let receiver = self.in_flight.take()?;
        Some(receiver.recv().unwrap_or_else(|_| {
            Err(EditorError::Persistence(anyhow::anyhow!("save worker stopped")))
        }))
    }
}

/// Storage path for an uploaded object belonging to `owner`.
pub fn object_path(owner: &str, kind: &str, extension: &str) -> String {
    let owner: String = owner
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S%3f");
    format!("site-plans/{owner}/{kind}-{stamp}.{extension}")
}

/// Pixels for the scene's background: the caller's decoded copy, or a
/// fresh fetch and decode when the caller has none yet.
fn background_pixels(job: &SaveJob) -> Result<Option<Arc<RgbaImage>>> {
    let Some(background) = job.scene.background() else {
        return Ok(None);
    };
    if let Some(pixels) = &job.background {
        return Ok(Some(Arc::clone(pixels)));
    }
    log::debug!("Fetching background {} for export", background.reference);
    let bytes = job
        .store
        .fetch(&background.reference)
        .map_err(EditorError::Persistence)?;
    Ok(Some(media::decode_background(&bytes)?.pixels))
}

fn run_save(job: SaveJob) -> Result<String> {
    let background = background_pixels(&job)?;
    let png = job
        .rasterizer
        .rasterize(&job.scene, background.as_deref(), job.scale)?;

    let path = object_path(&job.owner, "flattened", "png");
    let flattened_reference = job
        .store
        .upload(&path, &png, "image/png")
        .map_err(EditorError::Persistence)?;

    let plan = PersistedPlan {
        owning_document_id: job.owner.clone(),
        editable: job.editable,
        flattened_reference: flattened_reference.clone(),
        background_reference: job.scene.background().map(|b| b.reference.clone()),
    };
    let existing = job
        .plans
        .find_by_owner(&job.owner)
        .map_err(EditorError::Persistence)?;
    if existing.is_some() {
        job.plans.update(&plan).map_err(EditorError::Persistence)?;
    } else {
        job.plans.insert(&plan).map_err(EditorError::Persistence)?;
    }

    log::info!("Saved plan for {} -> {}", job.owner, flattened_reference);
    Ok(flattened_reference)
}
