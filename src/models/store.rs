// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation and label store.
//!
//! The store owns the boxes of the current image, the label list shared by
//! the directory, and the directory session. Every mutation ends by bumping
//! the revision counter and recomputing the unsaved-changes flag against the
//! [`ChangeTracker`] baseline. File contents arrive asynchronously through
//! [`FileEvent`] completions; nothing here blocks.

use super::annotation::{sort_by_label, Annotation, Label};
use super::history::ChangeTracker;
use super::session::{group_files, AnnotateImage, DirFile};
use crate::config::{FilesConfig, MalformedLines};
use crate::error::{Result, StoreError};
use crate::io::channel::{classify, FileAccess, FileEvent, FileKind};
use crate::io::serialization;
use crate::util::geometry::NormBox;
use crate::util::path;

/// Per-resource loaded and saving flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadFlags {
    pub image_loaded: bool,
    pub annotations_loaded: bool,
    pub labels_loaded: bool,
    pub last_loaded: bool,
    pub annotations_saving: bool,
    pub labels_saving: bool,
}

/// Raw image payload of the current entry, still base64 encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub path: String,
    pub mime_type: String,
    pub base64: String,
}

pub struct AnnotationStore {
    files_config: FilesConfig,
    malformed_lines: MalformedLines,
    access: Box<dyn FileAccess>,

    annotations: Vec<Annotation>,
    labels: Vec<Label>,
    tracker: ChangeTracker,
    has_change: bool,
    default_label: usize,

    entries: Vec<AnnotateImage>,
    current: Option<String>,
    dir_path: String,
    labels_path: String,
    last_path: String,
    filter_value: String,
    image_data: Option<ImageData>,
    flags: LoadFlags,
    load_error: Option<StoreError>,
    revision: u64,
}

impl AnnotationStore {
    pub fn new(
        files_config: FilesConfig,
        malformed_lines: MalformedLines,
        access: Box<dyn FileAccess>,
    ) -> Self {
        Self {
            files_config,
            malformed_lines,
            access,
            annotations: Vec::new(),
            labels: Vec::new(),
            tracker: ChangeTracker::new(),
            has_change: false,
            default_label: 0,
            entries: Vec::new(),
            current: None,
            dir_path: String::new(),
            labels_path: String::new(),
            last_path: String::new(),
            filter_value: String::new(),
            image_data: None,
            flags: LoadFlags::default(),
            load_error: None,
            revision: 0,
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn files(&self) -> &[AnnotateImage] {
        &self.entries
    }

    pub fn current_entry(&self) -> Option<&AnnotateImage> {
        let name = self.current.as_deref()?;
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn current_index(&self) -> Option<usize> {
        let name = self.current.as_deref()?;
        self.entries.iter().position(|e| e.name == name)
    }

    pub fn dir_path(&self) -> &str {
        &self.dir_path
    }

    pub fn labels_path(&self) -> &str {
        &self.labels_path
    }

    pub fn last_path(&self) -> &str {
        &self.last_path
    }

    /// Content of the last-opened marker, once loaded.
    pub fn filter_value(&self) -> &str {
        &self.filter_value
    }

    pub fn image_data(&self) -> Option<&ImageData> {
        self.image_data.as_ref()
    }

    pub fn flags(&self) -> LoadFlags {
        self.flags
    }

    /// Image and boxes of the current entry are both available.
    pub fn is_file_loaded(&self) -> bool {
        self.flags.image_loaded && self.flags.annotations_loaded
    }

    /// True while any write of the last save is outstanding.
    pub fn is_saving(&self) -> bool {
        self.flags.annotations_saving || self.flags.labels_saving
    }

    pub fn has_change(&self) -> bool {
        self.has_change
    }

    pub fn default_label(&self) -> usize {
        self.default_label
    }

    pub fn load_error(&self) -> Option<&StoreError> {
        self.load_error.as_ref()
    }

    /// Increases on every change to boxes, labels or session state.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn ready(&self) -> bool {
        self.flags.annotations_loaded && self.flags.labels_loaded
    }

    // ------------------------------------------------------------------
    // Box operations
    // ------------------------------------------------------------------

    fn check_box(&self, index: usize) -> Result<()> {
        if index < self.annotations.len() {
            Ok(())
        } else {
            Err(StoreError::IndexOutOfRange {
                kind: "box",
                index,
                len: self.annotations.len(),
            })
        }
    }

    fn check_label(&self, index: usize) -> Result<()> {
        if index < self.labels.len() {
            Ok(())
        } else {
            Err(StoreError::IndexOutOfRange {
                kind: "label",
                index,
                len: self.labels.len(),
            })
        }
    }

    /// Box edits need the current file's boxes in place.
    fn check_annotations_loaded(&self) -> Result<()> {
        if self.flags.annotations_loaded {
            Ok(())
        } else {
            Err(StoreError::NoFileLoaded)
        }
    }

    /// Append a box with the default label. The box is not sorted into
    /// place, so it stays last until the next sorting mutation.
    pub fn add_annotation(&mut self, norm: NormBox) -> Result<Annotation> {
        self.check_annotations_loaded()?;
        let annotation = Annotation::new(self.default_label, norm);
        self.annotations.push(annotation.clone());
        if self.flags.labels_loaded {
            self.check_labels();
        }
        self.check_changes();
        self.touch();
        Ok(annotation)
    }

    /// Assign a label to a box and regroup boxes by label.
    pub fn edit_annotation(&mut self, index: usize, label_index: usize) -> Result<()> {
        self.check_box(index)?;
        self.check_label(label_index)?;
        self.annotations[index].label_index = label_index;
        sort_by_label(&mut self.annotations);
        self.check_changes();
        self.touch();
        Ok(())
    }

    pub fn remove_annotation(&mut self, index: usize) -> Result<Annotation> {
        self.check_box(index)?;
        let removed = self.annotations.remove(index);
        self.check_changes();
        self.touch();
        Ok(removed)
    }

    /// Append an independent visible copy of a box.
    pub fn duplicate_annotation(&mut self, index: usize) -> Result<()> {
        self.check_box(index)?;
        let source = &self.annotations[index];
        let copy = Annotation {
            label_index: source.label_index,
            points: source.points,
            visible: true,
        };
        self.annotations.push(copy);
        sort_by_label(&mut self.annotations);
        self.check_changes();
        self.touch();
        Ok(())
    }

    /// Replace the geometry of every box, in list order, keeping labels.
    pub fn update_annotations(&mut self, boxes: &[NormBox]) -> Result<()> {
        self.check_annotations_loaded()?;
        if boxes.len() != self.annotations.len() {
            return Err(StoreError::LengthMismatch {
                expected: self.annotations.len(),
                actual: boxes.len(),
            });
        }
        for (annotation, norm) in self.annotations.iter_mut().zip(boxes) {
            annotation.points = norm.to_points();
        }
        sort_by_label(&mut self.annotations);
        self.check_changes();
        self.touch();
        Ok(())
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) -> Result<()> {
        self.check_box(index)?;
        self.annotations[index].visible = visible;
        self.check_changes();
        self.touch();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Label operations
    // ------------------------------------------------------------------

    /// Append a label named after its position.
    pub fn add_label(&mut self) -> usize {
        let position = self.labels.len();
        self.labels.push(Label::new(position, position.to_string()));
        self.check_changes();
        self.touch();
        position
    }

    /// Whether [`Self::remove_label`] would accept `index`.
    pub fn can_remove_label(&self, index: usize) -> bool {
        index < self.labels.len()
            && self.labels.len() > 1
            && !self.annotations.iter().any(|a| a.label_index >= index)
    }

    /// Remove a label. Refused for the last remaining label and for any
    /// label a box still references at or above its position; surviving
    /// labels are renumbered so ids keep matching positions.
    pub fn remove_label(&mut self, index: usize) -> Result<Label> {
        self.check_label(index)?;
        if self.labels.len() == 1 {
            return Err(StoreError::LastLabel);
        }
        if self.annotations.iter().any(|a| a.label_index >= index) {
            return Err(StoreError::LabelInUse(index));
        }

        let removed = self.labels.remove(index);
        for (position, label) in self.labels.iter_mut().enumerate() {
            label.id = position;
        }
        if self.default_label >= self.labels.len() {
            self.default_label = 0;
        }
        self.check_changes();
        self.touch();
        Ok(removed)
    }

    /// Rename a label. Names are one non-blank line of the labels file.
    pub fn rename_label(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        self.check_label(index)?;
        let name = name.into();
        if name.trim().is_empty() || name.contains(['\n', '\r']) {
            return Err(StoreError::InvalidLabelName(name));
        }
        self.labels[index].name = name;
        self.check_changes();
        self.touch();
        Ok(())
    }

    /// Label given to boxes drawn from now on.
    pub fn set_default_label(&mut self, index: usize) -> Result<()> {
        self.check_label(index)?;
        self.default_label = index;
        self.touch();
        Ok(())
    }

    /// Synthesize labels until every box's label index is a valid position.
    pub fn check_labels(&mut self) {
        let needed = self
            .annotations
            .iter()
            .map(|a| a.label_index + 1)
            .max()
            .unwrap_or(0);
        while self.labels.len() < needed {
            self.add_label();
        }
    }

    // ------------------------------------------------------------------
    // Change tracking
    // ------------------------------------------------------------------

    /// Recompute the unsaved-changes flag. A no-op until both the boxes and
    /// the labels of the current file have loaded.
    pub fn check_changes(&mut self) {
        if self.ready() {
            self.has_change = self.tracker.is_dirty(&self.labels, &self.annotations);
        }
    }

    /// Restore the boxes and labels of the last load or save.
    pub fn undo(&mut self) {
        let Some(baseline) = self.tracker.restore() else {
            return;
        };
        self.labels = baseline.labels;
        self.annotations = baseline.annotations;
        if self.default_label >= self.labels.len() {
            self.default_label = 0;
        }
        self.check_labels();
        self.check_changes();
        self.touch();
        log::info!("Reverted to last saved state");
    }

    /// Run once both halves of a file load have arrived. Labels synthesized
    /// for boxes that reference missing classes come from the files, so they
    /// join the baseline.
    fn settle(&mut self) {
        if !self.ready() {
            return;
        }
        let before = self.labels.len();
        self.check_labels();
        if self.labels.len() != before {
            log::warn!(
                "Synthesized {} missing labels",
                self.labels.len() - before
            );
            self.tracker.rebase_labels(&self.labels);
        }
        self.check_changes();
    }

    // ------------------------------------------------------------------
    // Directory session
    // ------------------------------------------------------------------

    /// Forget the directory session and every loaded value.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.current = None;
        self.labels.clear();
        self.annotations.clear();
        self.tracker.clear();
        self.has_change = false;
        self.default_label = 0;
        self.image_data = None;
        self.flags = LoadFlags::default();
        self.load_error = None;
        self.dir_path.clear();
        self.labels_path.clear();
        self.last_path.clear();
        self.filter_value.clear();
        self.touch();
    }

    /// Replace the session with a freshly listed directory and start loading
    /// its shared sidecars. Returns the common directory.
    pub fn load_files(&mut self, files: Vec<DirFile>) -> Result<String> {
        self.reset();
        let intake = group_files(files, &self.files_config);

        if intake.entries.is_empty() {
            log::warn!("No images found in the selected directory");
            self.reset();
            return Err(StoreError::EmptyDirectory);
        }

        self.entries = intake.entries;
        self.dir_path = intake.dir_path;

        match intake.labels_path {
            Some(labels_path) => {
                self.access.request_read(&labels_path);
                self.labels_path = labels_path;
            }
            None => {
                self.labels_path =
                    path::join(&self.dir_path, self.files_config.default_label_file());
                self.flags.labels_loaded = true;
            }
        }

        match intake.last_path {
            Some(last_path) => {
                self.access.request_read(&last_path);
                self.last_path = last_path;
            }
            None => {
                self.last_path = path::join(&self.dir_path, self.files_config.default_last_file());
                self.flags.last_loaded = true;
            }
        }

        log::info!(
            "Opened {} with {} images ({} duplicates dropped)",
            self.dir_path,
            self.entries.len(),
            intake.duplicates.len()
        );
        self.touch();
        Ok(self.dir_path.clone())
    }

    /// Start loading the boxes and image of one entry.
    pub fn load_file(&mut self, name: &str) -> Result<()> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownFile(name.to_string()))?;

        self.current = Some(entry.name.clone());
        self.flags.annotations_loaded = false;
        self.annotations.clear();
        self.load_error = None;
        self.tracker.snapshot(&self.labels, &self.annotations);
        self.has_change = false;

        match &entry.annotations_path {
            Some(annotations_path) => self.access.request_read(annotations_path),
            None => self.flags.annotations_loaded = true,
        }

        self.flags.image_loaded = false;
        self.image_data = None;
        self.access.request_read(&entry.image_path);

        log::info!("Loading {}", entry.name);
        self.settle();
        self.touch();
        Ok(())
    }

    /// Load the entry at `index` (clamped). Refused while there are unsaved
    /// changes, and a no-op for the current entry unless `force` is set.
    pub fn select_index(&mut self, index: usize, force: bool) -> Result<bool> {
        if self.entries.is_empty() {
            return Err(StoreError::EmptyDirectory);
        }
        if self.has_change {
            log::warn!("Unsaved changes, staying on the current image");
            return Ok(false);
        }
        let index = index.min(self.entries.len() - 1);
        if !force && self.current_index() == Some(index) {
            return Ok(false);
        }
        let name = self.entries[index].name.clone();
        self.load_file(&name)?;
        Ok(true)
    }

    /// Select by 1-based list position, as shown to the user.
    pub fn navigate(&mut self, position: usize, force: bool) -> Result<bool> {
        self.select_index(position.saturating_sub(1), force)
    }

    /// Move `delta` entries from the current one.
    pub fn step(&mut self, delta: isize) -> Result<bool> {
        let base = self.current_index().unwrap_or(0) as isize;
        let target = (base + delta).max(0) as usize;
        self.select_index(target, false)
    }

    /// Write the boxes, the label list and the marker for the current entry,
    /// then make the live state the new baseline.
    pub fn save(&mut self) -> Result<()> {
        let entry = self.current_entry().cloned().ok_or(StoreError::NoFileLoaded)?;
        if !self.ready() {
            return Err(StoreError::NoFileLoaded);
        }

        if !self.annotations.is_empty() {
            let target = entry.annotations_target(&self.files_config.annotation_extension);
            self.flags.annotations_saving = true;
            self.access
                .request_write(&target, serialization::format_annotations(&self.annotations));
        } else if let Some(existing) = &entry.annotations_path {
            self.flags.annotations_saving = true;
            self.access.request_delete(existing);
        }

        self.flags.labels_saving = true;
        self.access
            .request_write(&self.labels_path, serialization::format_labels(&self.labels));
        self.access
            .request_write(&self.last_path, format!("{}\n", entry.name));

        self.tracker.snapshot(&self.labels, &self.annotations);
        self.check_changes();
        self.touch();
        log::info!("Saving {} ({} boxes)", entry.name, self.annotations.len());
        Ok(())
    }

    /// Delete an image and its annotation file. The entry leaves the session
    /// when the image deletion completes.
    pub fn remove_image(&mut self, name: &str) -> Result<()> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownFile(name.to_string()))?;

        if let Some(annotations_path) = &entry.annotations_path {
            self.access.request_delete(annotations_path);
        }
        self.access.request_delete(&entry.image_path);
        log::info!("Deleting {}", entry.name);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Completions
    // ------------------------------------------------------------------

    pub fn dispatch(&mut self, event: FileEvent) {
        log::trace!("Completion for {}", event.path());
        match event {
            FileEvent::ReadComplete { path, content } => self.on_read_complete(&path, content),
            FileEvent::WriteComplete { path } => self.on_write_complete(&path),
            FileEvent::DeleteComplete { path } => self.on_delete_complete(&path),
        }
    }

    fn discard(&self, what: &str, file_path: &str) {
        log::debug!("Discarding stale {} completion for {}", what, file_path);
    }

    pub fn on_read_complete(&mut self, file_path: &str, content: Option<String>) {
        match classify(file_path, &self.files_config) {
            FileKind::Annotations => {
                let expected = self
                    .current_entry()
                    .and_then(|e| e.annotations_path.as_deref())
                    == Some(file_path);
                if !expected || self.flags.annotations_loaded {
                    return self.discard("annotation read", file_path);
                }
                let text = content.unwrap_or_else(|| {
                    log::warn!("No content for {}, treating as empty", file_path);
                    String::new()
                });
                match serialization::parse_annotations(&text, self.malformed_lines) {
                    Ok(mut annotations) => {
                        sort_by_label(&mut annotations);
                        log::info!("Loaded {} boxes from {}", annotations.len(), file_path);
                        self.tracker.rebase_annotations(&annotations);
                        self.annotations = annotations;
                        self.flags.annotations_loaded = true;
                        self.settle();
                    }
                    Err(err) => {
                        log::error!("Failed to load {}: {}", file_path, err);
                        self.load_error = Some(err);
                    }
                }
            }
            FileKind::Labels => {
                if file_path != self.labels_path || self.flags.labels_loaded {
                    return self.discard("label read", file_path);
                }
                let text = content.unwrap_or_else(|| {
                    log::warn!("No content for {}, treating as empty", file_path);
                    String::new()
                });
                self.labels = serialization::parse_labels(&text);
                log::info!("Loaded {} labels from {}", self.labels.len(), file_path);
                self.tracker.rebase_labels(&self.labels);
                self.flags.labels_loaded = true;
                self.settle();
            }
            FileKind::LastOpened => {
                if file_path != self.last_path || self.flags.last_loaded {
                    return self.discard("marker read", file_path);
                }
                self.filter_value = content
                    .as_deref()
                    .map(serialization::parse_marker)
                    .unwrap_or_default();
                self.flags.last_loaded = true;
            }
            FileKind::Image => {
                let Some(entry) = self.current_entry() else {
                    return self.discard("image read", file_path);
                };
                if entry.image_path != file_path {
                    return self.discard("image read", file_path);
                }
                let mime_type = entry.image_type.clone();
                match content {
                    Some(base64) => {
                        self.image_data = Some(ImageData {
                            path: file_path.to_string(),
                            mime_type,
                            base64,
                        });
                        self.flags.image_loaded = true;
                    }
                    None => log::error!("Failed to read image {}", file_path),
                }
            }
        }
        self.touch();
    }

    pub fn on_write_complete(&mut self, file_path: &str) {
        match classify(file_path, &self.files_config) {
            FileKind::Annotations => {
                let extension = &self.files_config.annotation_extension;
                let Some(entry) = self
                    .entries
                    .iter_mut()
                    .find(|e| e.annotations_target(extension) == file_path)
                else {
                    return self.discard("annotation write", file_path);
                };
                entry.annotations_path = Some(file_path.to_string());
                self.flags.annotations_saving = false;
            }
            FileKind::Labels => {
                if file_path != self.labels_path {
                    return self.discard("label write", file_path);
                }
                self.flags.labels_saving = false;
            }
            FileKind::LastOpened => log::debug!("Marker written to {}", file_path),
            FileKind::Image => return self.discard("image write", file_path),
        }
        self.touch();
    }

    pub fn on_delete_complete(&mut self, file_path: &str) {
        match classify(file_path, &self.files_config) {
            FileKind::Annotations => {
                let Some(entry) = self
                    .entries
                    .iter_mut()
                    .find(|e| e.annotations_path.as_deref() == Some(file_path))
                else {
                    return self.discard("annotation delete", file_path);
                };
                entry.annotations_path = None;
                self.flags.annotations_saving = false;
            }
            FileKind::Image => {
                let Some(position) = self.entries.iter().position(|e| e.image_path == file_path)
                else {
                    return self.discard("image delete", file_path);
                };
                let removed = self.entries.remove(position);
                log::info!("Removed {}", removed.name);

                if self.current.as_deref() == Some(removed.name.as_str()) {
                    self.current = None;
                    self.annotations.clear();
                    self.image_data = None;
                    self.tracker.clear();
                    self.has_change = false;
                    self.flags.image_loaded = false;
                    self.flags.annotations_loaded = false;
                    if !self.entries.is_empty() {
                        if let Err(err) = self.select_index(position, true) {
                            log::error!("Failed to load the next image: {}", err);
                        }
                    }
                }
            }
            FileKind::Labels | FileKind::LastOpened => {
                return self.discard("sidecar delete", file_path)
            }
        }
        self.touch();
    }
}
