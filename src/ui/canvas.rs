// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for the current image and its boxes.
//!
//! The canvas fits the image into the available space, paints the editor's
//! boxes on top and turns egui pointer state into [`PointerEvent`]s in image
//! pixel coordinates. All sizes in [`EditorConfig`] are image pixels and are
//! scaled with the image.

use crate::config::EditorConfig;
use crate::editor::{BoxEditor, EditorBox, PointerButton, PointerEvent};
use crate::models::annotation::Rgb;
use crate::util::geometry::{PixelRect, Point};

/// Result of canvas interaction.
pub enum CanvasAction {
    None,
    Pointer(Vec<PointerEvent>),
    OpenFolder,
}

/// Display the main canvas area and collect pointer input.
pub fn show(
    ui: &mut egui::Ui,
    editor: &BoxEditor,
    image_texture: &Option<egui::TextureHandle>,
    config: &EditorConfig,
    has_session: bool,
) -> CanvasAction {
    let mut action = CanvasAction::None;
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        match (image_texture, editor.image_size()) {
            (Some(texture), Some(image_size)) => {
                let available = egui::Rect::from_min_size(ui.min_rect().min, ui.available_size());
                let image_rect = fit_rect(available, image_size);

                let response = ui.allocate_rect(image_rect, egui::Sense::click_and_drag());
                ui.painter().image(
                    texture.id(),
                    image_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );

                let painter = ui.painter().clone();
                let view = View::new(image_rect, image_size);
                for b in editor.boxes().iter().filter(|b| b.visible) {
                    draw_box(&painter, &view, b, editor.handle_radius(), config);
                }
                if let Some(point) = editor.crosshair() {
                    draw_crosshair(&painter, &view, point);
                }

                let events = collect_events(ui, &response, &view, editor);
                if !events.is_empty() {
                    action = CanvasAction::Pointer(events);
                }
            }
            _ if has_session => {
                ui.centered_and_justified(|ui| {
                    ui.label(egui::RichText::new("Loading image...").color(egui::Color32::WHITE));
                });
            }
            _ => {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.heading(
                            egui::RichText::new("Annotate")
                                .size(32.0)
                                .color(egui::Color32::from_gray(200)),
                        );
                        ui.label(
                            egui::RichText::new("Bounding boxes for image directories")
                                .size(14.0)
                                .color(egui::Color32::from_gray(150)),
                        );
                        ui.add_space(20.0);
                        if ui.button("Open Directory...").clicked() {
                            action = CanvasAction::OpenFolder;
                        }
                    });
                });
            }
        }
    });

    action
}

/// Largest rect with the image's aspect ratio, centered in `available`.
pub fn fit_rect(available: egui::Rect, (width, height): (u32, u32)) -> egui::Rect {
    let img_aspect = width as f32 / height as f32;
    let available_aspect = available.width() / available.height();

    let (display_width, display_height) = if img_aspect > available_aspect {
        (available.width(), available.width() / img_aspect)
    } else {
        (available.height() * img_aspect, available.height())
    };

    let offset = egui::vec2(
        (available.width() - display_width) / 2.0,
        (available.height() - display_height) / 2.0,
    );
    egui::Rect::from_min_size(available.min + offset, egui::vec2(display_width, display_height))
}

/// Mapping between screen points and image pixels.
#[derive(Debug, Clone, Copy)]
pub struct View {
    rect: egui::Rect,
    scale: f32,
}

impl View {
    pub fn new(rect: egui::Rect, (width, _height): (u32, u32)) -> Self {
        Self {
            rect,
            scale: rect.width() / width as f32,
        }
    }

    pub fn to_image(&self, pos: egui::Pos2) -> Point {
        Point::new(
            ((pos.x - self.rect.min.x) / self.scale) as f64,
            ((pos.y - self.rect.min.y) / self.scale) as f64,
        )
    }

    pub fn to_screen(&self, point: Point) -> egui::Pos2 {
        egui::pos2(
            self.rect.min.x + point.x as f32 * self.scale,
            self.rect.min.y + point.y as f32 * self.scale,
        )
    }

    fn rect_to_screen(&self, rect: &PixelRect) -> egui::Rect {
        egui::Rect::from_min_max(
            self.to_screen(Point::new(rect.left, rect.top)),
            self.to_screen(Point::new(rect.right(), rect.bottom())),
        )
    }

    fn scaled(&self, pixels: f32) -> f32 {
        pixels * self.scale
    }
}

fn color32(color: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(color.r, color.g, color.b)
}

fn draw_box(
    painter: &egui::Painter,
    view: &View,
    b: &EditorBox,
    handle_radius: f64,
    config: &EditorConfig,
) {
    let color = color32(b.color);
    let rect = view.rect_to_screen(&b.rect);
    let alpha = (config.fill_opacity.clamp(0.0, 1.0) * 255.0).round() as u8;

    painter.rect_filled(
        rect,
        0.0,
        egui::Color32::from_rgba_unmultiplied(b.color.r, b.color.g, b.color.b, alpha),
    );
    painter.rect_stroke(rect, 0.0, egui::Stroke::new(view.scaled(config.line_width), color));

    for corner in [rect.left_top(), rect.right_top(), rect.right_bottom(), rect.left_bottom()] {
        painter.circle_filled(corner, view.scaled(handle_radius as f32), color);
    }

    draw_label(painter, view, b, config);
}

/// Label chip above the box's top-left corner, held by a short stick.
fn draw_label(painter: &egui::Painter, view: &View, b: &EditorBox, config: &EditorConfig) {
    let color = color32(b.color);
    let text_color = if b.color.is_light() {
        egui::Color32::BLACK
    } else {
        egui::Color32::WHITE
    };

    let font = egui::FontId::proportional(view.scaled(config.font_size));
    let galley = painter.layout_no_wrap(b.label.clone(), font, text_color);
    let padding = view.scaled(config.label_padding);
    let stick_length = view.scaled(config.label_stick_length);

    let top_left = view.to_screen(Point::new(b.rect.left, b.rect.top));
    let stick = egui::Rect::from_min_size(
        top_left - egui::vec2(0.0, stick_length),
        egui::vec2(view.scaled(config.label_stick_width), stick_length),
    );
    painter.rect_filled(stick, 0.0, color);

    let chip_size = galley.size() + egui::vec2(padding, padding);
    let chip = egui::Rect::from_min_size(stick.min - egui::vec2(0.0, chip_size.y), chip_size);
    painter.rect_filled(chip, 0.0, color);
    painter.galley(chip.min + egui::vec2(padding, padding) / 2.0, galley, text_color);
}

/// Dashed lines through `point` across the whole image.
fn draw_crosshair(painter: &egui::Painter, view: &View, point: Point) {
    let center = view.to_screen(point);
    let stroke = egui::Stroke::new(1.0, egui::Color32::BLACK);
    let horizontal = [
        egui::pos2(view.rect.min.x, center.y),
        egui::pos2(view.rect.max.x, center.y),
    ];
    let vertical = [
        egui::pos2(center.x, view.rect.min.y),
        egui::pos2(center.x, view.rect.max.y),
    ];
    painter.extend(egui::Shape::dashed_line(&horizontal, stroke, 10.0, 5.0));
    painter.extend(egui::Shape::dashed_line(&vertical, stroke, 10.0, 5.0));
}

/// Fold this frame's pointer state into editor events.
fn collect_events(
    ui: &egui::Ui,
    response: &egui::Response,
    view: &View,
    editor: &BoxEditor,
) -> Vec<PointerEvent> {
    let mut events = Vec::new();
    let dragging = editor.is_dragging();
    let active = dragging || editor.crosshair().is_some();
    let (latest, pressed_primary, pressed_secondary, released, moved) = ui.input(|i| {
        (
            i.pointer.latest_pos(),
            i.pointer.primary_pressed(),
            i.pointer.secondary_pressed(),
            i.pointer.primary_released(),
            i.pointer.is_moving(),
        )
    });
    let Some(pos) = latest else {
        return events;
    };
    let point = view.to_image(pos);
    let inside = view.rect.contains(pos);

    if inside && response.hovered() {
        if pressed_primary {
            events.push(PointerEvent::down(point.x, point.y, PointerButton::Primary));
        } else if pressed_secondary {
            events.push(PointerEvent::down(point.x, point.y, PointerButton::Secondary));
        }
    }

    if moved && (inside || dragging) {
        events.push(PointerEvent::moved(point.x, point.y));
    }

    if released {
        events.push(PointerEvent::up(point.x, point.y));
    } else if active && !inside {
        events.push(PointerEvent::leave(point.x, point.y));
    }

    events
}
