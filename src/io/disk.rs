// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Local-disk backend for the file channel.
//!
//! Requests are queued to one worker thread and run in the order they were
//! made, so a write followed by a delete of the same path lands in that
//! order. Completions go back over an mpsc channel that the UI thread drains
//! each frame. Failed writes and deletes are logged and never complete.

use super::channel::{classify, FileAccess, FileEvent};
use crate::config::FilesConfig;
use crate::models::session::DirFile;
use anyhow::{bail, Context, Result};
use base64::Engine;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};
use walkdir::WalkDir;

/// Work item for the disk worker.
#[derive(Debug)]
enum DiskRequest {
    Read { path: String, as_text: bool },
    Write { path: String, content: String },
    Delete { path: String },
}

impl DiskRequest {
    fn path(&self) -> &str {
        match self {
            DiskRequest::Read { path, .. }
            | DiskRequest::Write { path, .. }
            | DiskRequest::Delete { path } => path,
        }
    }

    /// Perform the request. `None` when a write or delete failed.
    fn run(self) -> Option<FileEvent> {
        match self {
            DiskRequest::Read { path, as_text } => {
                let content = match read_content(&path, as_text) {
                    Ok(content) => Some(content),
                    Err(e) => {
                        log::error!("Failed to read {}: {:#}", path, e);
                        None
                    }
                };
                Some(FileEvent::ReadComplete { path, content })
            }
            DiskRequest::Write { path, content } => match std::fs::write(&path, content) {
                Ok(()) => Some(FileEvent::WriteComplete { path }),
                Err(e) => {
                    log::error!("Failed to write {}: {}", path, e);
                    None
                }
            },
            DiskRequest::Delete { path } => match std::fs::remove_file(&path) {
                Ok(()) => Some(FileEvent::DeleteComplete { path }),
                Err(e) => {
                    log::error!("Failed to delete {}: {}", path, e);
                    None
                }
            },
        }
    }
}

pub struct DiskAccess {
    files: FilesConfig,
    requests: Sender<DiskRequest>,
}

impl DiskAccess {
    /// Start the worker and return the receiving end of its completion
    /// channel. The worker exits once the backend is dropped.
    pub fn new(files: FilesConfig) -> (Self, Receiver<FileEvent>) {
        let (requests, queue) = channel::<DiskRequest>();
        let (events, receiver) = channel();

        std::thread::spawn(move || {
            for request in queue {
                if let Some(event) = request.run() {
                    if events.send(event).is_err() {
                        break;
                    }
                }
            }
            log::debug!("Disk worker stopped");
        });

        (Self { files, requests }, receiver)
    }

    fn submit(&self, request: DiskRequest) {
        log::trace!("Queueing request for {}", request.path());
        if let Err(e) = self.requests.send(request) {
            log::error!("Disk worker is gone, dropped request for {}", e.0.path());
        }
    }
}

impl FileAccess for DiskAccess {
    fn request_read(&mut self, path: &str) {
        let as_text = classify(path, &self.files).is_text();
        self.submit(DiskRequest::Read {
            path: path.to_string(),
            as_text,
        });
    }

    fn request_write(&mut self, path: &str, content: String) {
        self.submit(DiskRequest::Write {
            path: path.to_string(),
            content,
        });
    }

    fn request_delete(&mut self, path: &str) {
        self.submit(DiskRequest::Delete {
            path: path.to_string(),
        });
    }
}

/// Sidecars come back as UTF-8 text, images as base64.
fn read_content(path: &str, as_text: bool) -> Result<String> {
    if as_text {
        return std::fs::read_to_string(path).with_context(|| format!("reading {}", path));
    }
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// MIME type guessed from a file extension, empty when unknown.
pub fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("bmp") => "image/bmp",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("txt") => "text/plain",
        _ => "",
    }
}

/// List every regular file under `dir`, subdirectories included.
/// Entries that cannot be read are logged and skipped.
pub fn scan_directory(dir: &Path) -> Result<Vec<DirFile>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                log::warn!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };
        let path = entry.path();
        files.push(DirFile {
            path: path.to_string_lossy().to_string(),
            name: entry.file_name().to_string_lossy().to_string(),
            mime_type: mime_type(path).to_string(),
            size,
        });
    }
    log::debug!("Found {} files under {}", files.len(), dir.display());
    Ok(files)
}
