// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Object storage and plan record contracts.
//!
//! The editor talks to two collaborators: an object store for image bytes
//! and a record store holding one [`PersistedPlan`] per owning document.
//! Filesystem-backed versions are provided for the desktop binary.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Durable record tying an owning document to its plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedPlan {
    pub owning_document_id: String,
    /// Editable serialization of the scene
    pub editable: String,
    /// Reference of the latest flattened export
    pub flattened_reference: String,
    /// Reference of the original background image
    pub background_reference: Option<String>,
}

/// Byte storage addressed by path, returning durable references.
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path` and return a reference to them.
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String>;

    /// Read back bytes previously uploaded.
    fn fetch(&self, reference: &str) -> Result<Vec<u8>>;
}

/// Record store with one plan per owning document.
pub trait PlanRepository: Send + Sync {
    fn find_by_owner(&self, owning_document_id: &str) -> Result<Option<PersistedPlan>>;

    fn insert(&self, plan: &PersistedPlan) -> Result<()>;

    fn update(&self, plan: &PersistedPlan) -> Result<()>;
}

/// Object store rooted at a local directory.
///
/// References are the upload paths relative to the root.
#[derive(Debug, Clone)]
pub struct DirObjectStore {
    root: PathBuf,
}

impl DirObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let path = Path::new(relative);
        if !path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            bail!("Invalid object path: {relative}");
        }
        Ok(self.root.join(path))
    }
}

impl ObjectStore for DirObjectStore {
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&target, bytes)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        log::debug!("Stored {} bytes ({content_type}) at {}", bytes.len(), target.display());
        Ok(path.to_string())
    }

    fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        let target = self.resolve(reference)?;
        std::fs::read(&target).with_context(|| format!("Failed to read {}", target.display()))
    }
}

/// Plan records stored as one pretty JSON file per owning document.
#[derive(Debug, Clone)]
pub struct JsonPlanRepository {
    dir: PathBuf,
}

impl JsonPlanRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// One file per owner. Every byte outside `[A-Za-z0-9_-]` is
    /// percent-encoded, so distinct owners never share a file.
    fn record_path(&self, owning_document_id: &str) -> PathBuf {
        let mut name = String::with_capacity(owning_document_id.len());
        for byte in owning_document_id.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                name.push(byte as char);
            } else {
                name.push_str(&format!("%{byte:02X}"));
            }
        }
        self.dir.join(format!("{name}.json"))
    }

    fn write(&self, plan: &PersistedPlan) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let json = serde_json::to_string_pretty(plan)?;
        let path = self.record_path(&plan.owning_document_id);
        std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

impl PlanRepository for JsonPlanRepository {
    fn find_by_owner(&self, owning_document_id: &str) -> Result<Option<PersistedPlan>> {
        let path = self.record_path(owning_document_id);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let plan: PersistedPlan = serde_json::from_str(&json)
            .with_context(|| format!("Corrupt plan record {}", path.display()))?;
        if plan.owning_document_id != owning_document_id {
            log::warn!(
                "Plan record {} belongs to {}, not {}",
                path.display(),
                plan.owning_document_id,
                owning_document_id
            );
            return Ok(None);
        }
        Ok(Some(plan))
    }

    fn insert(&self, plan: &PersistedPlan) -> Result<()> {
        if self.record_path(&plan.owning_document_id).exists() {
            bail!("Plan for {} already exists", plan.owning_document_id);
        }
        self.write(plan)
    }

    fn update(&self, plan: &PersistedPlan) -> Result<()> {
        if self.find_by_owner(&plan.owning_document_id)?.is_none() {
            bail!("No plan for {} to update", plan.owning_document_id);
        }
        self.write(plan)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("siteplan-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn plan(owner: &str, reference: &str) -> PersistedPlan {
        PersistedPlan {
            owning_document_id: owner.to_string(),
            editable: "{}".to_string(),
            flattened_reference: reference.to_string(),
            background_reference: None,
        }
    }

    #[test]
    fn test_dir_object_store_roundtrip() {
        let dir = scratch_dir("objects");
        let store = DirObjectStore::new(&dir);
        let reference = store
            .upload("site-plans/Q-1/export.png", b"png bytes", "image/png")
            .unwrap();
        assert_eq!(reference, "site-plans/Q-1/export.png");
        assert_eq!(store.fetch(&reference).unwrap(), b"png bytes");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_dir_object_store_rejects_escaping_paths() {
        let store = DirObjectStore::new(scratch_dir("escape"));
        assert!(store.upload("../outside.png", b"x", "image/png").is_err());
        assert!(store.fetch("/etc/passwd").is_err());
    }

    #[test]
    fn test_json_repository_create_then_update() {
        let dir = scratch_dir("plans");
        let repo = JsonPlanRepository::new(&dir);
        assert!(repo.find_by_owner("Q/1001").unwrap().is_none());
        assert!(repo.update(&plan("Q/1001", "a.png")).is_err());

        repo.insert(&plan("Q/1001", "a.png")).unwrap();
        assert!(repo.insert(&plan("Q/1001", "b.png")).is_err());
        repo.update(&plan("Q/1001", "b.png")).unwrap();

        let stored = repo.find_by_owner("Q/1001").unwrap().unwrap();
        assert_eq!(stored.flattened_reference, "b.png");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_json_repository_keeps_similar_owners_apart() {
        let dir = scratch_dir("owners");
        let repo = JsonPlanRepository::new(&dir);
        repo.insert(&plan("Q/1", "slash.png")).unwrap();

        assert!(repo.find_by_owner("Q_1").unwrap().is_none());
        assert!(repo.find_by_owner("Q 1").unwrap().is_none());
        assert!(repo.update(&plan("Q_1", "x.png")).is_err());

        repo.insert(&plan("Q_1", "underscore.png")).unwrap();
        repo.insert(&plan("Q 1", "space.png")).unwrap();
        repo.insert(&plan("Q%2F1", "literal.png")).unwrap();

        let reference = |owner: &str| repo.find_by_owner(owner).unwrap().unwrap().flattened_reference;
        assert_eq!(reference("Q/1"), "slash.png");
        assert_eq!(reference("Q_1"), "underscore.png");
        assert_eq!(reference("Q 1"), "space.png");
        assert_eq!(reference("Q%2F1"), "literal.png");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_json_repository_ignores_record_of_other_owner() {
        let dir = scratch_dir("foreign");
        let repo = JsonPlanRepository::new(&dir);
        repo.insert(&plan("Q-2", "a.png")).unwrap();
        // A record whose content names a different owner than its file.
        std::fs::copy(dir.join("Q-2.json"), dir.join("Q-3.json")).unwrap();
        assert!(repo.find_by_owner("Q-3").unwrap().is_none());
        assert!(repo.find_by_owner("Q-2").unwrap().is_some());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
