// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Side panel with the file list, the current image's boxes and the labels.

use crate::models::store::AnnotationStore;

/// Result of properties panel interaction.
pub enum PropertiesAction {
    None,
    /// 1-based position in the file list.
    SelectFile(usize),
    RemoveImage(String),
    SetBoxLabel { index: usize, label: usize },
    SetBoxVisible { index: usize, visible: bool },
    DuplicateBox(usize),
    RemoveBox(usize),
    AddLabel,
    RemoveLabel(usize),
    RenameLabel { index: usize, name: String },
    SetDefaultLabel(usize),
}

/// Panel state that outlives a frame.
#[derive(Default)]
pub struct PropertiesState {
    pub filter: String,
    /// Ask before deleting an image from disk.
    pub confirm_delete: bool,
    pending_delete: Option<String>,
}

impl PropertiesState {
    pub fn new() -> Self {
        Self {
            confirm_delete: true,
            ..Default::default()
        }
    }
}

/// Case-insensitive substring match; an empty filter matches everything.
pub fn matches_filter(name: &str, filter: &str) -> bool {
    filter.is_empty() || name.to_lowercase().contains(&filter.to_lowercase())
}

pub fn show(
    ui: &mut egui::Ui,
    store: &AnnotationStore,
    state: &mut PropertiesState,
) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    egui::ScrollArea::vertical().show(ui, |ui| {
        ui.heading("Files");
        ui.horizontal(|ui| {
            ui.label("Filter:");
            ui.text_edit_singleline(&mut state.filter);
        });
        ui.checkbox(&mut state.confirm_delete, "Confirm before deleting");

        let current = store.current_index();
        egui::ScrollArea::vertical()
            .id_source("file_list")
            .max_height(220.0)
            .show(ui, |ui| {
                for (index, entry) in store.files().iter().enumerate() {
                    if !matches_filter(&entry.name, &state.filter) {
                        continue;
                    }
                    ui.horizontal(|ui| {
                        let label = format!("{}. {}", index + 1, entry.name);
                        if ui.selectable_label(current == Some(index), label).clicked() {
                            action = PropertiesAction::SelectFile(index + 1);
                        }
                        if ui.small_button("🗑").on_hover_text("Delete image").clicked() {
                            if state.confirm_delete {
                                state.pending_delete = Some(entry.name.clone());
                            } else {
                                action = PropertiesAction::RemoveImage(entry.name.clone());
                            }
                        }
                    });
                }
            });

        if let Some(name) = state.pending_delete.clone() {
            ui.horizontal(|ui| {
                ui.label(format!("Delete {} from disk?", name));
                if ui.button("Delete").clicked() {
                    action = PropertiesAction::RemoveImage(name);
                    state.pending_delete = None;
                }
                if ui.button("Cancel").clicked() {
                    state.pending_delete = None;
                }
            });
        }

        ui.separator();
        show_boxes(ui, store, &mut action);

        ui.separator();
        show_labels(ui, store, &mut action);
    });

    action
}

fn show_boxes(ui: &mut egui::Ui, store: &AnnotationStore, action: &mut PropertiesAction) {
    ui.heading(format!("Boxes ({})", store.annotations().len()));
    if !store.is_file_loaded() {
        ui.label(egui::RichText::new("No image loaded").weak());
        return;
    }

    let labels = store.labels();
    for (index, annotation) in store.annotations().iter().enumerate() {
        ui.horizontal(|ui| {
            let mut visible = annotation.visible;
            if ui.checkbox(&mut visible, "").changed() {
                *action = PropertiesAction::SetBoxVisible { index, visible };
            }

            let selected = labels
                .get(annotation.label_index)
                .map(|l| l.name.clone())
                .unwrap_or_else(|| annotation.label_index.to_string());
            egui::ComboBox::from_id_source(("box_label", index))
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for label in labels {
                        if ui
                            .selectable_label(label.id == annotation.label_index, &label.name)
                            .clicked()
                        {
                            *action = PropertiesAction::SetBoxLabel {
                                index,
                                label: label.id,
                            };
                        }
                    }
                });

            if ui.small_button("⧉").on_hover_text("Duplicate").clicked() {
                *action = PropertiesAction::DuplicateBox(index);
            }
            if ui.small_button("✖").on_hover_text("Remove").clicked() {
                *action = PropertiesAction::RemoveBox(index);
            }
        });
    }
}

fn show_labels(ui: &mut egui::Ui, store: &AnnotationStore, action: &mut PropertiesAction) {
    ui.horizontal(|ui| {
        ui.heading("Labels");
        if ui.button("+ Add").clicked() {
            *action = PropertiesAction::AddLabel;
        }
    });

    for label in store.labels() {
        ui.horizontal(|ui| {
            let color = egui::Color32::from_rgb(label.color.r, label.color.g, label.color.b);
            let (swatch, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
            ui.painter().rect_filled(swatch, 2.0, color);

            if ui
                .radio(store.default_label() == label.id, "")
                .on_hover_text("Label for new boxes")
                .clicked()
            {
                *action = PropertiesAction::SetDefaultLabel(label.id);
            }

            let mut name = label.name.clone();
            let response = ui.add(egui::TextEdit::singleline(&mut name).desired_width(120.0));
            if response.changed() {
                *action = PropertiesAction::RenameLabel {
                    index: label.id,
                    name,
                };
            }

            let removable = store.can_remove_label(label.id);
            if ui
                .add_enabled(removable, egui::Button::new("✖").small())
                .on_disabled_hover_text("Still used by a box, or the last label")
                .clicked()
            {
                *action = PropertiesAction::RemoveLabel(label.id);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matching() {
        assert!(matches_filter("IMG_0001", ""));
        assert!(matches_filter("IMG_0001", "img_00"));
        assert!(!matches_filter("IMG_0001", "0002"));
    }
}
