// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotate - bounding box annotation for image directories
//!
//! A desktop application for drawing labelled boxes on every image of a
//! directory, stored as YOLO-style text files next to the images.

mod app;
mod config;
mod editor;
mod error;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::AnnotateApp;
use config::AppConfig;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = AppConfig::discover()?;
    log::debug!("Configuration: {:?}", config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Annotate"),
        ..Default::default()
    };

    eframe::run_native(
        "Annotate",
        options,
        Box::new(|_cc| Ok(Box::new(AnnotateApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
