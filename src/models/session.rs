// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Directory session data.
//!
//! A directory is read as a flat list of file descriptors. Images and their
//! annotation files are grouped by capture name into [`AnnotateImage`]
//! entries; the shared label file and the last-opened marker are picked out
//! by name.

use crate::config::FilesConfig;
use crate::util::path;
use serde::{Deserialize, Serialize};

/// One file found in the selected directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirFile {
    pub path: String,
    pub name: String,
    /// MIME type such as `image/png`; empty when unknown.
    pub mime_type: String,
    pub size: u64,
}

/// An image and its optional annotation sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotateImage {
    /// Capture name: the image file name without its extension.
    pub name: String,
    pub image_path: String,
    pub image_type: String,
    pub annotations_path: Option<String>,
}

impl AnnotateImage {
    /// Where the annotation file lives, or would be written: next to the image.
    pub fn annotations_target(&self, extension: &str) -> String {
        self.annotations_path.clone().unwrap_or_else(|| {
            path::join(
                path::parent_dir(&self.image_path),
                &format!("{}.{}", self.name, extension),
            )
        })
    }
}

#[derive(Debug, Default)]
struct PendingEntry {
    name: String,
    image: Option<(String, String)>,
    annotations_path: Option<String>,
}

/// Result of grouping a directory listing.
#[derive(Debug, Default)]
pub struct Intake {
    pub entries: Vec<AnnotateImage>,
    /// Common directory of every file that joined an entry.
    pub dir_path: String,
    pub labels_path: Option<String>,
    pub last_path: Option<String>,
    /// Files dropped because their slot was already filled.
    pub duplicates: Vec<String>,
}

/// Group a directory listing into entries keyed by capture name.
///
/// Files are visited in name order. Only entries with an image survive.
pub fn group_files(mut files: Vec<DirFile>, config: &FilesConfig) -> Intake {
    files.sort_by(|a, b| a.name.cmp(&b.name));

    let mut intake = Intake::default();
    let mut pending: Vec<PendingEntry> = Vec::new();
    let mut dirs: Vec<String> = Vec::new();

    for file in files {
        if config.label_file_names.contains(&file.name) {
            intake.labels_path = Some(file.path);
            continue;
        }
        if config.last_file_names.contains(&file.name) {
            intake.last_path = Some(file.path);
            continue;
        }

        let is_image = file.mime_type.split('/').next() == Some("image");
        let is_annotation =
            !is_image && path::extension(&file.name) == Some(config.annotation_extension.as_str());
        if !is_image && !is_annotation {
            continue;
        }

        let name = path::capture_name(&file.name).to_string();
        let idx = match pending.iter().position(|p| p.name == name) {
            Some(idx) => idx,
            None => {
                pending.push(PendingEntry {
                    name: name.clone(),
                    ..Default::default()
                });
                pending.len() - 1
            }
        };
        let entry = &mut pending[idx];

        if (is_annotation && entry.annotations_path.is_some()) || (is_image && entry.image.is_some())
        {
            log::error!("Duplicate file for {}: {}", name, file.path);
            intake.duplicates.push(file.path);
            continue;
        }

        dirs.push(path::parent_dir(&file.path).to_string());
        if is_image {
            entry.image = Some((file.path, file.mime_type));
        } else {
            entry.annotations_path = Some(file.path);
        }
    }

    intake.entries = pending
        .into_iter()
        .filter_map(|p| {
            let (image_path, image_type) = p.image?;
            Some(AnnotateImage {
                name: p.name,
                image_path,
                image_type,
                annotations_path: p.annotations_path,
            })
        })
        .collect();

    dirs.sort();
    dirs.dedup();
    intake.dir_path = path::find_common_path(&dirs);
    intake
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_file(path: &str, mime_type: &str) -> DirFile {
        DirFile {
            path: path.to_string(),
            name: path::file_name(path).to_string(),
            mime_type: mime_type.to_string(),
            size: 1,
        }
    }

    #[test]
    fn test_groups_image_and_sidecar() {
        let files = vec![
            dir_file("/set/b.txt", "text/plain"),
            dir_file("/set/a.png", "image/png"),
            dir_file("/set/b.jpg", "image/jpeg"),
            dir_file("/set/a.txt", "text/plain"),
            dir_file("/set/classes.labels", ""),
            dir_file("/set/search.last", ""),
        ];
        let intake = group_files(files, &FilesConfig::default());

        assert_eq!(intake.entries.len(), 2);
        assert_eq!(intake.entries[0].name, "a");
        assert_eq!(intake.entries[0].annotations_path.as_deref(), Some("/set/a.txt"));
        assert_eq!(intake.entries[1].image_type, "image/jpeg");
        assert_eq!(intake.dir_path, "/set");
        assert_eq!(intake.labels_path.as_deref(), Some("/set/classes.labels"));
        assert_eq!(intake.last_path.as_deref(), Some("/set/search.last"));
    }

    #[test]
    fn test_duplicate_image_dropped() {
        let files = vec![
            dir_file("/set/a.png", "image/png"),
            dir_file("/set/a.jpg", "image/jpeg"),
        ];
        let intake = group_files(files, &FilesConfig::default());
        assert_eq!(intake.entries.len(), 1);
        assert_eq!(intake.entries[0].image_path, "/set/a.jpg");
        assert_eq!(intake.duplicates, vec!["/set/a.png".to_string()]);
    }

    #[test]
    fn test_sidecar_without_image_dropped() {
        let files = vec![
            dir_file("/set/orphan.txt", "text/plain"),
            dir_file("/set/notes.md", "text/markdown"),
        ];
        let intake = group_files(files, &FilesConfig::default());
        assert!(intake.entries.is_empty());
    }

    #[test]
    fn test_annotations_target_next_to_image() {
        let entry = AnnotateImage {
            name: "cat".to_string(),
            image_path: "/set/train/cat.png".to_string(),
            image_type: "image/png".to_string(),
            annotations_path: None,
        };
        assert_eq!(entry.annotations_target("txt"), "/set/train/cat.txt");
    }
}
