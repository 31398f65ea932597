// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with file navigation, save and undo.

use crate::models::store::AnnotationStore;

pub enum ToolbarAction {
    None,
    OpenFolder,
    Save,
    Undo,
    Previous,
    Next,
}

/// Display the toolbar and the session status.
pub fn show(ui: &mut egui::Ui, store: &AnnotationStore) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        if ui.button("📂 Open").clicked() {
            action = ToolbarAction::OpenFolder;
        }

        ui.separator();

        let has_files = !store.files().is_empty();
        let can_move = has_files && !store.has_change();
        if ui
            .add_enabled(can_move, egui::Button::new("◀ Prev"))
            .on_hover_text("Ctrl+Q")
            .clicked()
        {
            action = ToolbarAction::Previous;
        }
        if ui
            .add_enabled(can_move, egui::Button::new("Next ▶"))
            .on_hover_text("Ctrl+D")
            .clicked()
        {
            action = ToolbarAction::Next;
        }

        ui.separator();

        if ui
            .add_enabled(store.has_change(), egui::Button::new("💾 Save"))
            .on_hover_text("Ctrl+S")
            .clicked()
        {
            action = ToolbarAction::Save;
        }
        if ui
            .add_enabled(store.has_change(), egui::Button::new("↺ Undo"))
            .on_hover_text("Ctrl+Z")
            .clicked()
        {
            action = ToolbarAction::Undo;
        }

        ui.separator();

        if let (Some(index), Some(entry)) = (store.current_index(), store.current_entry()) {
            ui.label(format!("{} ({}/{})", entry.name, index + 1, store.files().len()));
        } else if has_files {
            ui.label(store.dir_path());
        }

        if store.is_saving() {
            ui.spinner();
            ui.label("Saving...");
        } else if store.has_change() {
            ui.label(egui::RichText::new("● unsaved changes").color(egui::Color32::YELLOW));
        }

        if let Some(err) = store.load_error() {
            ui.label(egui::RichText::new(err.to_string()).color(egui::Color32::LIGHT_RED));
        }
    });

    action
}
