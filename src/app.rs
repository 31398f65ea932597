// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns the annotation store, the box editor and the receiving end
//! of the disk backend's completion channel. Each frame it drains finished
//! file operations into the store, refreshes the image texture and routes
//! panel, toolbar, keyboard and canvas input to the store or the editor.

use crate::config::AppConfig;
use crate::editor::BoxEditor;
use crate::error::StoreError;
use crate::io::channel::FileEvent;
use crate::io::disk::{self, DiskAccess};
use crate::io::media;
use crate::models::store::AnnotationStore;
use crate::ui::{canvas, properties, toolbar};
use anyhow::Result;
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// Main application state.
pub struct AnnotateApp {
    config: AppConfig,
    store: AnnotationStore,
    editor: BoxEditor,

    /// Completions from the disk backend
    file_events: Receiver<FileEvent>,

    /// Texture of the current image and the path it was decoded from
    image_texture: Option<egui::TextureHandle>,
    texture_path: Option<String>,

    panel: properties::PropertiesState,

    /// Whether the marker file has seeded the file filter yet
    filter_seeded: bool,

    /// Last warning or error shown in the status bar
    status: Option<String>,
}

impl Default for AnnotateApp {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl AnnotateApp {
    pub fn new(config: AppConfig) -> Self {
        let (access, file_events) = DiskAccess::new(config.files.clone());
        let store = AnnotationStore::new(
            config.files.clone(),
            config.parsing.malformed_lines,
            Box::new(access),
        );
        let editor = BoxEditor::new(config.editor.handle_radius);

        Self {
            config,
            store,
            editor,
            file_events,
            image_texture: None,
            texture_path: None,
            panel: properties::PropertiesState::new(),
            filter_seeded: false,
            status: None,
        }
    }

    /// Log a failed store operation and surface it in the status bar.
    fn report<T>(&mut self, result: std::result::Result<T, StoreError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("{}", e);
                self.status = Some(e.to_string());
                None
            }
        }
    }

    fn open_folder(&mut self) {
        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };
        if let Err(e) = self.load_directory(&dir) {
            log::warn!("Could not open {}: {:#}", dir.display(), e);
            self.status = Some(format!("{:#}", e));
        }
    }

    /// List a directory, start a session on it and load its first image.
    fn load_directory(&mut self, dir: &Path) -> Result<()> {
        let files = disk::scan_directory(dir)?;

        self.editor.clear();
        self.image_texture = None;
        self.texture_path = None;
        self.filter_seeded = false;
        self.panel.filter.clear();

        let dir_path = self.store.load_files(files)?;
        self.store.select_index(0, true)?;
        log::info!("Session opened on {}", dir_path);
        self.status = None;
        Ok(())
    }

    fn save(&mut self) {
        if self.store.has_change() && !self.editor.is_dragging() {
            let result = self.store.save();
            self.report(result);
        }
    }

    fn undo(&mut self) {
        if !self.editor.is_dragging() {
            self.store.undo();
        }
    }

    fn step(&mut self, delta: isize) {
        if self.editor.is_dragging() {
            return;
        }
        if self.store.has_change() {
            self.status = Some("Save or undo your changes first".to_string());
            return;
        }
        let result = self.store.step(delta);
        self.report(result);
    }

    fn drain_file_events(&mut self) {
        while let Ok(event) = self.file_events.try_recv() {
            self.store.dispatch(event);
        }

        if !self.filter_seeded && self.store.flags().last_loaded {
            self.panel.filter = self.store.filter_value().to_string();
            self.filter_seeded = true;
        }
    }

    /// Decode a newly arrived image and size the editor to it.
    fn sync_image(&mut self, ctx: &egui::Context) {
        let path = self.store.image_data().map(|d| d.path.clone());
        if path == self.texture_path {
            return;
        }
        self.texture_path = path;

        let Some(data) = self.store.image_data() else {
            self.image_texture = None;
            self.editor.clear();
            return;
        };

        match media::decode_base64(&data.base64) {
            Ok(loaded) => {
                let size = [loaded.width as usize, loaded.height as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &loaded.pixels);
                self.image_texture =
                    Some(ctx.load_texture("current_image", color_image, egui::TextureOptions::LINEAR));
                self.editor.load_image(loaded.width, loaded.height, &self.store);
                log::info!("Displaying {} ({}x{})", data.path, loaded.width, loaded.height);
            }
            Err(e) => {
                log::error!("Failed to decode {}: {:#}", data.path, e);
                self.status = Some(format!("Cannot display {}", data.path));
                self.image_texture = None;
                self.editor.clear();
            }
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (save, undo, previous, next) = ctx.input(|i| {
            let command = i.modifiers.command;
            (
                command && i.key_pressed(egui::Key::S),
                command && i.key_pressed(egui::Key::Z),
                command && i.key_pressed(egui::Key::Q),
                command && i.key_pressed(egui::Key::D),
            )
        });

        if save {
            self.save();
        }
        if undo {
            self.undo();
        }
        if previous {
            self.step(-1);
        }
        if next {
            self.step(1);
        }
    }

    fn apply_toolbar(&mut self, action: toolbar::ToolbarAction) {
        match action {
            toolbar::ToolbarAction::OpenFolder => self.open_folder(),
            toolbar::ToolbarAction::Save => self.save(),
            toolbar::ToolbarAction::Undo => self.undo(),
            toolbar::ToolbarAction::Previous => self.step(-1),
            toolbar::ToolbarAction::Next => self.step(1),
            toolbar::ToolbarAction::None => {}
        }
    }

    fn apply_properties(&mut self, action: properties::PropertiesAction) {
        use properties::PropertiesAction;

        if self.editor.is_dragging() {
            return;
        }
        let result = match action {
            PropertiesAction::SelectFile(position) => {
                if self.store.has_change() {
                    self.status = Some("Save or undo your changes first".to_string());
                }
                self.store.navigate(position, false).map(|_| ())
            }
            PropertiesAction::RemoveImage(name) => self.store.remove_image(&name),
            PropertiesAction::SetBoxLabel { index, label } => {
                self.store.edit_annotation(index, label)
            }
            PropertiesAction::SetBoxVisible { index, visible } => {
                self.store.set_visible(index, visible)
            }
            PropertiesAction::DuplicateBox(index) => self.store.duplicate_annotation(index),
            PropertiesAction::RemoveBox(index) => self.store.remove_annotation(index).map(|_| ()),
            PropertiesAction::AddLabel => {
                self.store.add_label();
                Ok(())
            }
            PropertiesAction::RemoveLabel(index) => self.store.remove_label(index).map(|_| ()),
            PropertiesAction::RenameLabel { index, name } => self.store.rename_label(index, name),
            PropertiesAction::SetDefaultLabel(index) => self.store.set_default_label(index),
            PropertiesAction::None => Ok(()),
        };
        self.report(result);
    }

    fn apply_canvas(&mut self, action: canvas::CanvasAction) {
        match action {
            canvas::CanvasAction::Pointer(events) => {
                for event in events {
                    let result = self.editor.handle(event, &mut self.store);
                    self.report(result);
                }
            }
            canvas::CanvasAction::OpenFolder => self.open_folder(),
            canvas::CanvasAction::None => {}
        }
    }

    /// Work is in flight on the disk backend.
    fn waiting(&self) -> bool {
        let flags = self.store.flags();
        self.store.is_saving()
            || (self.store.current_entry().is_some()
                && !(flags.image_loaded && flags.annotations_loaded && flags.labels_loaded))
    }
}

impl eframe::App for AnnotateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_file_events();
        self.sync_image(ctx);
        self.editor.sync(&self.store);

        if self.waiting() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Directory...").clicked() {
                        self.open_folder();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(self.store.has_change(), egui::Button::new("Save (Ctrl+S)"))
                        .clicked()
                    {
                        self.save();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    if ui
                        .add_enabled(self.store.has_change(), egui::Button::new("Undo (Ctrl+Z)"))
                        .clicked()
                    {
                        self.undo();
                        ui.close_menu();
                    }
                });
            });
        });

        // Toolbar
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, &self.store))
            .inner;
        self.apply_toolbar(toolbar_action);

        // Status bar
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                match &self.status {
                    Some(message) => ui.label(egui::RichText::new(message).color(egui::Color32::YELLOW)),
                    None => ui.label(egui::RichText::new("Ready").weak()),
                };
                if !self.store.dir_path().is_empty() {
                    ui.separator();
                    ui.label(self.store.dir_path());
                }
            });
        });

        // Properties panel (right side)
        let properties_action = egui::SidePanel::right("properties")
            .default_width(280.0)
            .show(ctx, |ui| properties::show(ui, &self.store, &mut self.panel))
            .inner;
        self.apply_properties(properties_action);

        self.handle_keyboard(ctx);

        // Main canvas (center)
        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                canvas::show(
                    ui,
                    &self.editor,
                    &self.image_texture,
                    &self.config.editor,
                    !self.store.files().is_empty(),
                )
            })
            .inner;
        self.apply_canvas(canvas_action);
    }
}
