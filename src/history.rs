// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Bounded undo history of full scene snapshots.
//!
//! The log is a sequence of snapshots with a cursor on the current state.
//! A new snapshot drops everything after the cursor, so there is no way
//! forward once an undone state has been edited.

use crate::error::Result;
use crate::io::codec;
use crate::models::scene::Scene;
use std::collections::VecDeque;

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_DEPTH: usize = 30;

/// A self-contained serialized copy of a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySnapshot(String);

impl HistorySnapshot {
    pub fn capture(scene: &Scene) -> Result<Self> {
        Ok(Self(codec::encode(scene)?))
    }

    pub fn restore(&self) -> Result<Scene> {
        codec::decode(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// History system for undo.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    /// Snapshots, oldest first
    entries: VecDeque<HistorySnapshot>,
    /// Index of the snapshot matching the current scene
    cursor: usize,
    /// Maximum history size
    max_size: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl HistoryManager {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size),
            cursor: 0,
            max_size: max_size.max(1),
        }
    }

    /// A history whose first entry is `scene`.
    pub fn seeded(scene: &Scene, max_size: usize) -> Result<Self> {
        let mut history = Self::new(max_size);
        history.snapshot(scene)?;
        Ok(history)
    }

    /// Record the state after a committed mutation.
    pub fn snapshot(&mut self, scene: &Scene) -> Result<()> {
        let snapshot = HistorySnapshot::capture(scene)?;
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(snapshot);
        while self.entries.len() > self.max_size {
            self.entries.pop_front();
            log::debug!("History full, evicted oldest snapshot");
        }
        self.cursor = self.entries.len() - 1;
        log::debug!("Snapshot {} of {}", self.cursor + 1, self.max_size);
        Ok(())
    }

    /// Step back one snapshot and return the scene to restore.
    ///
    /// Returns `None` when already at the oldest entry.
    pub fn undo(&mut self) -> Result<Option<Scene>> {
        if !self.can_undo() {
            return Ok(None);
        }
        let scene = self.entries[self.cursor - 1].restore()?;
        self.cursor -= 1;
        Ok(Some(scene))
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Snapshots in order, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistorySnapshot> {
        self.entries.iter()
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Point, Rgba, Shape, Stroke};
    use proptest::prelude::*;

    fn stroke_at(x: f64) -> Shape {
        Shape::Stroke(Stroke {
            points: vec![Point::new(x, x), Point::new(x + 1.0, x + 2.0)],
            color: Rgba::RED,
            width: 3.0,
        })
    }

    #[test]
    fn test_undo_on_fresh_history_is_noop() {
        let scene = Scene::new();
        let mut history = HistoryManager::seeded(&scene, 30).unwrap();
        assert!(history.undo().unwrap().is_none());
        assert_eq!(history.len(), 1);

        let mut empty = HistoryManager::default();
        assert!(empty.undo().unwrap().is_none());
    }

    #[test]
    fn test_undo_restores_state_after_first_stroke() {
        let mut scene = Scene::new();
        let mut history = HistoryManager::seeded(&scene, 30).unwrap();

        scene.add(stroke_at(1.0));
        history.snapshot(&scene).unwrap();
        let after_first = scene.clone();

        scene.add(stroke_at(2.0));
        history.snapshot(&scene).unwrap();

        let restored = history.undo().unwrap().unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored, after_first);
    }

    #[test]
    fn test_new_snapshot_truncates_forward_entries() {
        let mut scene = Scene::new();
        let mut history = HistoryManager::seeded(&scene, 30).unwrap();
        for i in 0..3 {
            scene.add(stroke_at(i as f64));
            history.snapshot(&scene).unwrap();
        }
        history.undo().unwrap();
        let mut scene = history.undo().unwrap().unwrap();
        assert_eq!(history.cursor(), 1);

        scene.add(stroke_at(50.0));
        history.snapshot(&scene).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);
    }

    #[test]
    fn test_history_keeps_latest_thirty() {
        let mut scene = Scene::new();
        let mut history = HistoryManager::seeded(&scene, 30).unwrap();
        let mut snapshots = vec![HistorySnapshot::capture(&scene).unwrap()];
        for i in 0..40 {
            scene.add(stroke_at(i as f64));
            history.snapshot(&scene).unwrap();
            snapshots.push(HistorySnapshot::capture(&scene).unwrap());
        }
        assert_eq!(history.len(), 30);
        let kept: Vec<_> = history.entries().cloned().collect();
        assert_eq!(kept, snapshots[snapshots.len() - 30..].to_vec());

        let mut undone = 0;
        while history.undo().unwrap().is_some() {
            undone += 1;
        }
        assert_eq!(undone, 29);
    }

    proptest! {
        #[test]
        fn prop_history_never_exceeds_depth(commits in 0usize..80, depth in 1usize..40) {
            let mut scene = Scene::new();
            let mut history = HistoryManager::seeded(&scene, depth).unwrap();
            for i in 0..commits {
                scene.add(stroke_at(i as f64));
                history.snapshot(&scene).unwrap();
            }
            prop_assert_eq!(history.len(), (commits + 1).min(depth));
            prop_assert_eq!(history.cursor(), history.len() - 1);
            let last = history.entries().last().unwrap().restore().unwrap();
            prop_assert_eq!(last, scene);
        }
    }
}
