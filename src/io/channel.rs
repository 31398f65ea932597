// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! File synchronization channel.
//!
//! The store never touches a filesystem. It sends fire-and-forget read,
//! write and delete requests through an injected [`FileAccess`] and receives
//! [`FileEvent`] completions that echo the requested path. There are no
//! request ids and no timeouts; completions are routed by the path alone.

use crate::config::FilesConfig;
use crate::util::path;

/// Outbound half of the channel, implemented by the file-access collaborator.
pub trait FileAccess {
    fn request_read(&mut self, path: &str);
    fn request_write(&mut self, path: &str, content: String);
    fn request_delete(&mut self, path: &str);
}

/// Completion notification for an earlier request.
#[derive(Debug, Clone, PartialEq)]
pub enum FileEvent {
    /// `content` is `None` when the read failed. Images arrive base64 encoded.
    ReadComplete {
        path: String,
        content: Option<String>,
    },
    WriteComplete {
        path: String,
    },
    DeleteComplete {
        path: String,
    },
}

impl FileEvent {
    pub fn path(&self) -> &str {
        match self {
            FileEvent::ReadComplete { path, .. }
            | FileEvent::WriteComplete { path }
            | FileEvent::DeleteComplete { path } => path,
        }
    }
}

/// What a path refers to, for routing completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Annotations,
    Labels,
    LastOpened,
    Image,
}

impl FileKind {
    /// Sidecars travel as UTF-8 text, images as base64.
    pub fn is_text(self) -> bool {
        !matches!(self, FileKind::Image)
    }
}

pub fn classify(file_path: &str, files: &FilesConfig) -> FileKind {
    let name = path::file_name(file_path);

    if path::extension(file_path) == Some(files.annotation_extension.as_str()) {
        FileKind::Annotations
    } else if files.label_file_names.iter().any(|n| n == name) {
        FileKind::Labels
    } else if files.last_file_names.iter().any(|n| n == name) {
        FileKind::LastOpened
    } else {
        FileKind::Image
    }
}
