// SPDX-License-Identifier: MIT OR Apache-2.0
//! Temp-folder mirror of editor sources.
//!
//! The editor pushes typings, behaviors, materials and post-processes; they
//! are written under the temp root so an external IDE can edit them. Each
//! written source is bound to the editor item it came from, so a change on
//! disk can be sent back as an update.

use crate::error::Result;
use crate::protocol::{
    BehaviorCode, ClientMessage, CodeUpdate, MaterialCode, OneOrMany, PostProcessCode,
    ProjectTypings, ServerEvent,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory of behavior scripts
pub const BEHAVIORS_DIR: &str = "behaviors";
/// Directory of materials
pub const MATERIALS_DIR: &str = "materials";
/// Directory of post-processes
pub const POST_PROCESSES_DIR: &str = "post-processes";
/// Directory of typings
pub const TYPINGS_DIR: &str = "typings";

/// Kind of mirrored item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Behavior script
    Behavior,
    /// Custom material
    Material,
    /// Custom post-process
    PostProcess,
}

/// Field of the item a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceField {
    /// TypeScript source
    Code,
    /// Fragment shader
    Pixel,
    /// Vertex shader
    Vertex,
    /// JSON configuration
    Config,
}

/// Link between a mirrored file and its editor item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBinding {
    /// Item kind
    pub kind: SourceKind,
    /// Item ID
    pub id: String,
    /// Item name
    pub name: String,
    /// Field held by the file
    pub field: SourceField,
}

impl FileBinding {
    /// Build the update message carrying `content`
    pub fn to_message(&self, content: String) -> ClientMessage {
        let mut update = CodeUpdate {
            id: self.id.clone(),
            name: self.name.clone(),
            ..Default::default()
        };
        let slot = match self.field {
            SourceField::Code => &mut update.code,
            SourceField::Pixel => &mut update.pixel,
            SourceField::Vertex => &mut update.vertex,
            SourceField::Config => &mut update.config,
        };
        *slot = Some(content);

        match self.kind {
            SourceKind::Behavior => ClientMessage::UpdateBehaviorCode(update),
            SourceKind::Material => ClientMessage::UpdateMaterialCode(update),
            SourceKind::PostProcess => ClientMessage::UpdatePostProcessCode(update),
        }
    }
}

/// Mirror folder
#[derive(Debug)]
pub struct TempFileSystem {
    root: PathBuf,
    bindings: HashMap<PathBuf, FileBinding>,
    contents: HashMap<PathBuf, String>,
}

impl TempFileSystem {
    /// Create a mirror rooted at `root` (nothing is written yet)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            bindings: HashMap::new(),
            contents: HashMap::new(),
        }
    }

    /// Root folder
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Binding of a mirrored file
    pub fn binding(&self, path: &Path) -> Option<&FileBinding> {
        self.bindings.get(path)
    }

    /// Number of bound files
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Create the folder structure
    pub fn init(&self) -> Result<()> {
        self.create_directory("")?;
        self.create_directory(BEHAVIORS_DIR)?;
        self.create_directory(MATERIALS_DIR)?;
        self.create_directory(POST_PROCESSES_DIR)?;
        tracing::info!("Temp folder ready at {:?}", self.root);
        Ok(())
    }

    /// Apply an editor event
    pub fn handle_event(&mut self, event: ServerEvent) -> Result<()> {
        match event {
            ServerEvent::Project(typings) => self.write_project(&typings),
            ServerEvent::BehaviorCodes(items) => self.write_behaviors(items),
            ServerEvent::MaterialCodes(items) => self.write_materials(items),
            ServerEvent::PostProcessCodes(items) => self.write_post_processes(items),
            ServerEvent::Disconnect => {
                self.remove_directory(BEHAVIORS_DIR)?;
                self.remove_directory(MATERIALS_DIR)?;
                self.remove_directory(POST_PROCESSES_DIR)?;
                tracing::info!("Editor disconnected, sources removed");
                Ok(())
            }
        }
    }

    fn write_project(&mut self, typings: &ProjectTypings) -> Result<()> {
        self.clear_directory(TYPINGS_DIR)?;
        self.create_directory(TYPINGS_DIR)?;

        let files = [
            ("tsconfig.json", &typings.tsconfig),
            ("typings/babylon.module.d.ts", &typings.babylonjs),
            ("typings/babylonjs.materials.module.d.ts", &typings.babylonjs_materials),
            ("typings/tools.d.ts", &typings.tools),
            ("typings/mobile.d.ts", &typings.mobile),
            ("typings/path-finder.d.ts", &typings.path_finder),
        ];
        for (relative, content) in files {
            self.write_file(self.root.join(relative), content, None);
        }
        tracing::debug!("Project typings written");
        Ok(())
    }

    fn write_behaviors(&mut self, items: OneOrMany<BehaviorCode>) -> Result<()> {
        if items.is_full_list() {
            self.clear_directory(BEHAVIORS_DIR)?;
        }
        self.create_directory(BEHAVIORS_DIR)?;

        for script in items.into_vec() {
            if !is_plain_name(&script.name) {
                tracing::warn!("Skipping behavior with unsafe name {:?}", script.name);
                continue;
            }
            let path = self.root.join(BEHAVIORS_DIR).join(format!("{}.ts", script.name));
            let binding = FileBinding {
                kind: SourceKind::Behavior,
                id: script.id,
                name: script.name,
                field: SourceField::Code,
            };
            self.write_file(path, &script.code, Some(binding));
        }
        Ok(())
    }

    fn write_materials(&mut self, items: OneOrMany<MaterialCode>) -> Result<()> {
        if items.is_full_list() {
            self.clear_directory(MATERIALS_DIR)?;
        }

        for material in items.into_vec() {
            if !is_plain_name(&material.name) {
                tracing::warn!("Skipping material with unsafe name {:?}", material.name);
                continue;
            }
            let dir = format!("{MATERIALS_DIR}/{}", material.name);
            if let Err(e) = self.create_directory(&dir) {
                tracing::warn!("Cannot create {dir}: {e}");
                continue;
            }

            let files = [
                ("ts", SourceField::Code, &material.code),
                ("fragment.fx", SourceField::Pixel, &material.pixel),
                ("vertex.fx", SourceField::Vertex, &material.vertex),
                ("config.json", SourceField::Config, &material.config),
            ];
            for (extension, field, content) in files {
                let path = self.root.join(&dir).join(format!("{}.{extension}", material.name));
                let binding = FileBinding {
                    kind: SourceKind::Material,
                    id: material.id.clone(),
                    name: material.name.clone(),
                    field,
                };
                self.write_file(path, content, Some(binding));
            }
        }
        Ok(())
    }

    fn write_post_processes(&mut self, items: OneOrMany<PostProcessCode>) -> Result<()> {
        if items.is_full_list() {
            self.clear_directory(POST_PROCESSES_DIR)?;
        }

        for post_process in items.into_vec() {
            if !is_plain_name(&post_process.name) {
                tracing::warn!("Skipping post-process with unsafe name {:?}", post_process.name);
                continue;
            }
            let dir = format!("{POST_PROCESSES_DIR}/{}", post_process.name);
            if let Err(e) = self.create_directory(&dir) {
                tracing::warn!("Cannot create {dir}: {e}");
                continue;
            }

            let files = [
                ("ts", SourceField::Code, &post_process.code),
                ("fragment.fx", SourceField::Pixel, &post_process.pixel),
                ("config.json", SourceField::Config, &post_process.config),
            ];
            for (extension, field, content) in files {
                let path = self.root.join(&dir).join(format!("{}.{extension}", post_process.name));
                let binding = FileBinding {
                    kind: SourceKind::PostProcess,
                    id: post_process.id.clone(),
                    name: post_process.name.clone(),
                    field,
                };
                self.write_file(path, content, Some(binding));
            }
        }
        Ok(())
    }

    /// Write one file, logging failures, and bind it
    fn write_file(&mut self, path: PathBuf, content: &str, binding: Option<FileBinding>) {
        if let Err(e) = fs::write(&path, content) {
            tracing::warn!("Failed to write {:?}: {e}", path);
            return;
        }

        if let Some(binding) = binding {
            self.contents.insert(path.clone(), content.to_string());
            self.bindings.insert(path, binding);
        }
    }

    /// Update messages for changed files.
    ///
    /// Unbound paths and files whose content matches what was last written
    /// or sent are skipped.
    pub fn updates_for(&mut self, paths: impl IntoIterator<Item = PathBuf>) -> Vec<ClientMessage> {
        let mut messages = Vec::new();

        for path in paths {
            let Some(binding) = self.bindings.get(&path) else {
                continue;
            };

            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Failed to read {:?}: {e}", path);
                    continue;
                }
            };

            if self.contents.get(&path) == Some(&content) {
                tracing::trace!("Unchanged content for {:?}", path);
                continue;
            }

            tracing::debug!("Source changed: {:?}", path);
            messages.push(binding.to_message(content.clone()));
            self.contents.insert(path, content);
        }

        messages
    }

    fn create_directory(&self, relative: &str) -> Result<()> {
        let path = self.root.join(relative);
        if !path.exists() {
            fs::create_dir_all(&path)?;
        }
        Ok(())
    }

    /// Delete everything inside a directory, keeping the directory
    fn clear_directory(&mut self, relative: &str) -> Result<()> {
        let path = self.root.join(relative);
        if !path.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
        self.forget_under(&path);
        Ok(())
    }

    fn remove_directory(&mut self, relative: &str) -> Result<()> {
        let path = self.root.join(relative);
        if path.exists() {
            fs::remove_dir_all(&path)?;
        }
        self.forget_under(&path);
        Ok(())
    }

    fn forget_under(&mut self, dir: &Path) {
        self.bindings.retain(|path, _| !path.starts_with(dir));
        self.contents.retain(|path, _| !path.starts_with(dir));
    }
}

/// Item names become file and folder names under the root and must not
/// leave it.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && !name.contains("..") && !name.contains(['/', '\\', ':'])
}
