// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! One editing session: open, edit, save, close.
//!
//! The session ties the document, the tool controller and the persistence
//! gateway together for one owning document. Slow work (background
//! decode, saving) runs on worker threads and reports back through
//! channels drained by [`EditorSession::poll`]. Dropping the session drops
//! the receivers, so late results from abandoned workers go nowhere.

use crate::config::EditorConfig;
use crate::document::Document;
use crate::error::{EditorError, Result};
use crate::io::gateway::{object_path, PersistenceGateway};
use crate::io::media;
use crate::io::raster::{Rasterizer, SvgRasterizer};
use crate::io::storage::{DirObjectStore, JsonPlanRepository, ObjectStore, PlanRepository};
use crate::models::annotation::{AnnotationId, Placement, Point};
use crate::models::icon::IconCatalog;
use crate::models::scene::{Background, Scene};
use crate::tools::{InputOutcome, KeyPress, PointerEvent, StrokeStyle, TextStyle, ToolController, ToolMode};
use image::RgbaImage;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;

/// External collaborators a session works with.
#[derive(Clone)]
pub struct SessionServices {
    pub store: Arc<dyn ObjectStore>,
    pub plans: Arc<dyn PlanRepository>,
    pub rasterizer: Arc<dyn Rasterizer>,
    pub catalog: Arc<IconCatalog>,
}

impl SessionServices {
    /// Local-directory storage under `config.storage_root`.
    pub fn filesystem(config: &EditorConfig) -> Self {
        let catalog = Arc::new(IconCatalog::builtin());
        Self {
            store: Arc::new(DirObjectStore::new(config.objects_dir())),
            plans: Arc::new(JsonPlanRepository::new(config.plans_dir())),
            rasterizer: Arc::new(SvgRasterizer::new(Arc::clone(&catalog))),
            catalog,
        }
    }
}

/// Completed asynchronous work reported to the surrounding application.
#[derive(Debug)]
pub enum SessionEvent {
    /// A save finished; `reference` is the new flattened export
    Saved { reference: String },
    /// A save failed; the scene and history are unchanged
    SaveFailed(EditorError),
    /// A background image is decoded and ready to draw
    BackgroundReady { reference: String },
    /// A background image could not be fetched, decoded or stored
    BackgroundFailed(EditorError),
}

/// Result of a background worker.
struct DecodedBackground {
    background: Background,
    pixels: Arc<RgbaImage>,
    /// Newly uploaded by the user (commit it) rather than restored on open
    replaces_current: bool,
}

pub struct EditorSession {
    owner: String,
    document: Document,
    tools: ToolController,
    gateway: PersistenceGateway,
    catalog: Arc<IconCatalog>,
    /// Decoded pixels by background reference
    backgrounds: HashMap<String, Arc<RgbaImage>>,
    decodes: Vec<Receiver<Result<DecodedBackground>>>,
    last_saved: Option<String>,
}

impl EditorSession {
    /// Open the plan for `owner`, or start an empty one.
    pub fn open(owner: &str, services: &SessionServices, config: &EditorConfig) -> Result<Self> {
        let gateway = PersistenceGateway::new(
            Arc::clone(&services.store),
            Arc::clone(&services.plans),
            Arc::clone(&services.rasterizer),
            config.export_scale,
        );
        let loaded = gateway.load(owner)?;
        let (scene, restore, last_saved) = match loaded {
            Some(plan) => (plan.scene, plan.has_background, Some(plan.flattened_reference)),
            None => (Scene::new(), false, None),
        };

        let mut session = Self {
            owner: owner.to_string(),
            document: Document::new(scene, config.history_depth)?,
            tools: ToolController::new(config.stroke, config.text, config.icon_size),
            gateway,
            catalog: Arc::clone(&services.catalog),
            backgrounds: HashMap::new(),
            decodes: Vec::new(),
            last_saved,
        };
        if restore {
            if let Some(background) = session.document.scene().background().cloned() {
                session.restore_background(background);
            }
        }
        log::info!(
            "Opened session for {} ({} annotations)",
            owner,
            session.document.scene().len()
        );
        Ok(session)
    }

    /// End the session without saving. A save still in flight finishes on
    /// its own; call [`EditorSession::wait_for_save`] first to observe it.
    pub fn close(self) {
        if self.gateway.is_saving() {
            log::warn!("Closing session for {} with a save in flight", self.owner);
        }
        log::info!("Closed session for {}", self.owner);
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn scene(&self) -> &Scene {
        self.document.scene()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn tools(&self) -> &ToolController {
        &self.tools
    }

    pub fn catalog(&self) -> &IconCatalog {
        &self.catalog
    }

    pub fn mode(&self) -> ToolMode {
        self.tools.mode()
    }

    /// Help text for the current mode, for the status line.
    pub fn status_text(&self) -> String {
        if self.gateway.is_saving() {
            return format!("Saving... | {}", self.tools.status_text());
        }
        self.tools.status_text()
    }

    /// Switch modes, finishing any label edit first.
    pub fn set_mode(&mut self, mode: ToolMode) -> Result<()> {
        self.tools.finish_text_edit(&mut self.document)?;
        self.tools.set_mode(mode);
        Ok(())
    }

    /// Choose a template from the catalog and switch to icon placement.
    pub fn select_icon_template(&mut self, id: &str) -> Result<()> {
        let template = self.catalog.require(id)?.clone();
        self.catalog.glyph(&template.glyph_reference)?;
        self.tools.finish_text_edit(&mut self.document)?;
        self.tools.select_icon_template(template);
        Ok(())
    }

    pub fn set_stroke_style(&mut self, style: StrokeStyle) {
        self.tools.set_stroke_style(style);
    }

    pub fn set_text_style(&mut self, style: TextStyle) {
        self.tools.set_text_style(style);
    }

    pub fn pointer(&mut self, event: PointerEvent) -> Result<InputOutcome> {
        self.tools.on_pointer(&mut self.document, event)
    }

    pub fn key(&mut self, key: KeyPress, selected: &[AnnotationId]) -> Result<InputOutcome> {
        self.tools.on_key(&mut self.document, key, selected)
    }

    pub fn place_text(&mut self, at: Point, input: Option<&str>) -> Result<InputOutcome> {
        self.tools.place_text(&mut self.document, at, input)
    }

    pub fn begin_text_edit(&mut self, id: AnnotationId) -> bool {
        self.tools.begin_text_edit(&self.document, id)
    }

    pub fn edit_buffer_mut(&mut self) -> Option<&mut String> {
        self.tools.edit_buffer_mut()
    }

    pub fn finish_text_edit(&mut self) -> Result<InputOutcome> {
        self.tools.finish_text_edit(&mut self.document)
    }

    pub fn cancel_text_edit(&mut self) {
        self.tools.cancel_text_edit();
    }

    pub fn apply_placements(&mut self, changes: &[(AnnotationId, Placement)]) -> Result<InputOutcome> {
        self.tools.apply_placements(&mut self.document, changes)
    }

    pub fn delete_selected(&mut self, selected: &[AnnotationId]) -> Result<InputOutcome> {
        self.tools.delete_selected(&mut self.document, selected)
    }

    pub fn clear_annotations(&mut self, confirmed: bool) -> Result<InputOutcome> {
        self.tools.clear_annotations(&mut self.document, confirmed)
    }

    pub fn undo(&mut self) -> Result<InputOutcome> {
        self.tools.undo(&mut self.document)
    }

    /// Decode and upload a new background image off-thread. The scene is
    /// updated when [`EditorSession::poll`] sees the worker finish.
    pub fn load_background(&mut self, name: &str, bytes: Vec<u8>) {
        let store = self.gateway.store();
        let owner = self.owner.clone();
        let name = name.to_string();
        let (sender, receiver) = channel();
        self.decodes.push(receiver);

        std::thread::spawn(move || {
            let result = (|| -> Result<DecodedBackground> {
                let decoded = media::decode_background(&bytes)?;
                let path = object_path(&owner, "background", decoded.extension);
                let reference = store
                    .upload(&path, &bytes, decoded.content_type)
                    .map_err(EditorError::Persistence)?;
                log::info!("Uploaded background {name} as {reference}");
                Ok(DecodedBackground {
                    background: Background {
                        reference,
                        width: decoded.width(),
                        height: decoded.height(),
                    },
                    pixels: decoded.pixels,
                    replaces_current: true,
                })
            })();
            let _ = sender.send(result);
        });
    }

    /// Fetch and decode a background already referenced by the scene.
    fn restore_background(&mut self, background: Background) {
        let store = self.gateway.store();
        let (sender, receiver) = channel();
        self.decodes.push(receiver);

        std::thread::spawn(move || {
            let result = (|| -> Result<DecodedBackground> {
                let bytes = store
                    .fetch(&background.reference)
                    .map_err(EditorError::Persistence)?;
                let decoded = media::decode_background(&bytes)?;
                Ok(DecodedBackground {
                    background,
                    pixels: decoded.pixels,
                    replaces_current: false,
                })
            })();
            let _ = sender.send(result);
        });
    }

    /// Drop the background, keeping the annotations.
    pub fn remove_background(&mut self) -> Result<InputOutcome> {
        if self.document.scene().background().is_none() {
            return Ok(InputOutcome::Ignored);
        }
        self.document.commit("remove background", |scene| scene.set_background(None))?;
        Ok(InputOutcome::Modified(1))
    }

    /// Decoded pixels of the current background, once available.
    pub fn background_pixels(&self) -> Option<Arc<RgbaImage>> {
        let background = self.document.scene().background()?;
        self.backgrounds.get(&background.reference).cloned()
    }

    pub fn is_decoding(&self) -> bool {
        !self.decodes.is_empty()
    }

    pub fn is_saving(&self) -> bool {
        self.gateway.is_saving()
    }

    /// Start saving. Refused with [`EditorError::Busy`] while a save is in
    /// flight; the in-flight save is not affected. A background still
    /// decoding is fetched again by the save worker.
    pub fn request_save(&mut self) -> Result<()> {
        let background = self.background_pixels();
        if self.document.scene().background().is_some() && background.is_none() {
            log::debug!("Background not decoded yet; the save will fetch it");
        }
        self.gateway
            .begin_save(self.document.scene(), background, &self.owner)
    }

    /// Block until the in-flight save finishes.
    pub fn wait_for_save(&mut self) -> Option<Result<String>> {
        let result = self.gateway.wait_save()?;
        Some(self.record_save(result))
    }

    pub fn last_saved_reference(&self) -> Option<&str> {
        self.last_saved.as_deref()
    }

    /// Drain finished asynchronous work.
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if let Some(result) = self.gateway.poll_save() {
            match self.record_save(result) {
                Ok(reference) => events.push(SessionEvent::Saved { reference }),
                Err(err) => events.push(SessionEvent::SaveFailed(err)),
            }
        }

        let mut finished = Vec::new();
        self.decodes.retain(|receiver| match receiver.try_recv() {
            Ok(result) => {
                finished.push(result);
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => false,
        });
        for result in finished {
            match result.and_then(|decoded| self.accept_background(decoded)) {
                Ok(reference) => events.push(SessionEvent::BackgroundReady { reference }),
                Err(err) => {
                    log::error!("Background failed: {err}");
                    events.push(SessionEvent::BackgroundFailed(err));
                }
            }
        }

        events
    }

    fn accept_background(&mut self, decoded: DecodedBackground) -> Result<String> {
        let reference = decoded.background.reference.clone();
        self.backgrounds.insert(reference.clone(), decoded.pixels);
        if decoded.replaces_current {
            let background = decoded.background;
            self.document
                .commit("background", |scene| scene.set_background(Some(background)))?;
        }
        Ok(reference)
    }

    fn record_save(&mut self, result: Result<String>) -> Result<String> {
        match result {
            Ok(reference) => {
                self.last_saved = Some(reference.clone());
                Ok(reference)
            }
            Err(err) => {
                log::error!("Save failed for {}: {err}", self.owner);
                Err(err)
            }
        }
    }
}
