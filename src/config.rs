// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Settings are read from a YAML or JSON file, picked by extension. Every
//! section falls back to defaults, so a partial file is fine.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "ANNOTATE_CONFIG";

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "annotate.yaml";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub editor: EditorConfig,
    pub files: FilesConfig,
    pub parsing: ParsingConfig,
}

/// Canvas geometry and drawing settings, in image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Half-size of the square hit region around each corner handle.
    pub handle_radius: f64,
    pub line_width: f32,
    pub fill_opacity: f32,
    pub font_size: f32,
    pub label_padding: f32,
    pub label_stick_length: f32,
    pub label_stick_width: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            handle_radius: 6.0,
            line_width: 3.0,
            fill_opacity: 0.2,
            font_size: 16.0,
            label_padding: 8.0,
            label_stick_length: 20.0,
            label_stick_width: 8.0,
        }
    }
}

/// Names of the sidecar files shared by a directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Recognized label file names; the first is used when none exists.
    pub label_file_names: Vec<String>,
    /// Recognized last-opened marker names; the first is used when none exists.
    pub last_file_names: Vec<String>,
    pub annotation_extension: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            label_file_names: vec!["classes.labels".to_string()],
            last_file_names: vec!["search.last".to_string()],
            annotation_extension: "txt".to_string(),
        }
    }
}

impl FilesConfig {
    pub fn default_label_file(&self) -> &str {
        self.label_file_names
            .first()
            .map(String::as_str)
            .unwrap_or("classes.labels")
    }

    pub fn default_last_file(&self) -> &str {
        self.last_file_names
            .first()
            .map(String::as_str)
            .unwrap_or("search.last")
    }
}

/// What to do with an annotation line that does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedLines {
    /// Drop the line with a warning and keep the rest of the file.
    #[default]
    Skip,
    /// Fail the whole file load.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    pub malformed_lines: MalformedLines,
}

impl AppConfig {
    /// Load a configuration file in YAML or JSON format.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let extension = path.extension().and_then(|s| s.to_str());
        let config = match extension {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&text)?,
            Some("json") => serde_json::from_str(&text)?,
            _ => bail!("Unsupported config extension: {:?}", extension),
        };
        Ok(config)
    }

    /// Resolve the configuration from `$ANNOTATE_CONFIG`, then
    /// `./annotate.yaml`, then built-in defaults.
    pub fn discover() -> Result<Self> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            log::info!("Loading config from {}", explicit);
            return Self::load(Path::new(&explicit));
        }

        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            log::info!("Loading config from {}", local.display());
            return Self::load(&local);
        }

        log::debug!("No config file, using defaults");
        Ok(Self::default())
    }
}
