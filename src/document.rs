// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! A scene paired with its undo history.
//!
//! All mutations go through [`Document::commit`], which snapshots exactly
//! once after the change, however many objects it touched.

use crate::error::Result;
use crate::history::HistoryManager;
use crate::models::scene::Scene;

#[derive(Debug, Clone)]
pub struct Document {
    scene: Scene,
    history: HistoryManager,
}

impl Document {
    /// Start a document whose history is seeded with `scene`.
    pub fn new(scene: Scene, history_depth: usize) -> Result<Self> {
        let history = HistoryManager::seeded(&scene, history_depth)?;
        Ok(Self { scene, history })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Apply `mutate` to the scene and record one snapshot.
    pub fn commit<T>(&mut self, what: &str, mutate: impl FnOnce(&mut Scene) -> T) -> Result<T> {
        let result = mutate(&mut self.scene);
        self.history.snapshot(&self.scene)?;
        log::debug!("Committed {what}, {} annotations", self.scene.len());
        Ok(result)
    }

    /// Restore the previous snapshot. Returns false if there is none.
    pub fn undo(&mut self) -> Result<bool> {
        match self.history.undo()? {
            Some(scene) => {
                self.scene = scene;
                log::info!("Undo, {} annotations", self.scene.len());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
