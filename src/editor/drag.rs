// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Hit-testing and the drag/resize state machine.
//!
//! The editor mirrors the store's boxes as pixel rectangles. A pointer press
//! picks a corner handle or a box interior, or starts a new box; moves
//! reshape a working copy of that one rectangle; the release commits it back
//! to the store in normalized form.

use super::input::{PointerButton, PointerEvent, PointerKind};
use crate::error::Result;
use crate::models::annotation::{Annotation, Rgb};
use crate::models::store::AnnotationStore;
use crate::util::geometry::{
    handle_contains, to_normalized, to_pixels, Corner, NormBox, PixelCorners, PixelRect, Point,
};

/// Drag state of the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    DraggingCorner { corner: Corner, index: usize },
    DraggingWhole { index: usize },
}

/// A box as rendered: pixel geometry plus its label's name and color.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorBox {
    pub rect: PixelRect,
    pub label: String,
    pub color: Rgb,
    pub visible: bool,
}

/// Result of a pointer move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// Not dragging; draw reference lines through this point.
    Crosshair(Point),
    /// The working rectangle changed.
    Moved,
    /// The move would leave the image; geometry is unchanged.
    Rejected,
}

const MISSING_LABEL_COLOR: Rgb = Rgb::new(128, 128, 128);

pub struct BoxEditor {
    boxes: Vec<EditorBox>,
    state: DragState,
    /// Pointer position at drag start.
    start: Point,
    /// Geometry of the dragged box at drag start.
    origin: PixelRect,
    moved: bool,
    /// Store boxes at drag start; the commit is dropped if they change.
    drag_annotations: Vec<Annotation>,
    image_size: Option<(u32, u32)>,
    handle_radius: f64,
    crosshair: Option<Point>,
    synced_revision: Option<u64>,
}

impl BoxEditor {
    pub fn new(handle_radius: f64) -> Self {
        Self {
            boxes: Vec::new(),
            state: DragState::Idle,
            start: Point::default(),
            origin: PixelRect::default(),
            moved: false,
            drag_annotations: Vec::new(),
            image_size: None,
            handle_radius,
            crosshair: None,
            synced_revision: None,
        }
    }

    pub fn boxes(&self) -> &[EditorBox] {
        &self.boxes
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state != DragState::Idle
    }

    pub fn crosshair(&self) -> Option<Point> {
        self.crosshair
    }

    pub fn image_size(&self) -> Option<(u32, u32)> {
        self.image_size
    }

    pub fn handle_radius(&self) -> f64 {
        self.handle_radius
    }

    /// Set the pixel size of the displayed image and rebuild the boxes.
    pub fn load_image(&mut self, width: u32, height: u32, store: &AnnotationStore) {
        self.state = DragState::Idle;
        self.crosshair = None;
        self.image_size = (width > 0 && height > 0).then_some((width, height));
        self.rebuild(store);
    }

    /// Forget the image, e.g. when the session is reset.
    pub fn clear(&mut self) {
        self.boxes.clear();
        self.state = DragState::Idle;
        self.crosshair = None;
        self.image_size = None;
        self.synced_revision = None;
    }

    /// Rebuild when the store changed since the last rebuild. Never rebuilds
    /// mid-drag, the working rectangle owns that box until release.
    pub fn sync(&mut self, store: &AnnotationStore) {
        if !self.is_dragging() && self.synced_revision != Some(store.revision()) {
            self.rebuild(store);
        }
    }

    /// Recompute every rectangle from the store's boxes and labels.
    pub fn rebuild(&mut self, store: &AnnotationStore) {
        self.synced_revision = Some(store.revision());
        let Some((width, height)) = self.image_size else {
            self.boxes.clear();
            return;
        };

        let labels = store.labels();
        self.boxes = store
            .annotations()
            .iter()
            .map(|annotation| {
                let (label, color) = match labels.get(annotation.label_index) {
                    Some(label) => (label.name.clone(), label.color),
                    None => (annotation.label_index.to_string(), MISSING_LABEL_COLOR),
                };
                EditorBox {
                    rect: PixelRect::from_corners(&to_pixels(&annotation.norm_box(), width, height)),
                    label,
                    color,
                    visible: annotation.visible,
                }
            })
            .collect();
    }

    /// Route a unified pointer event.
    pub fn handle(&mut self, event: PointerEvent, store: &mut AnnotationStore) -> Result<()> {
        match event.kind {
            PointerKind::Down => {
                self.pointer_down(event.position(), event.button, store);
            }
            PointerKind::Move => {
                self.pointer_move(event.position());
            }
            PointerKind::Up | PointerKind::Leave => {
                self.crosshair = None;
                self.pointer_up(store)?;
            }
        }
        Ok(())
    }

    /// First visible box under `pos`, corners before interior.
    fn hit_test(&self, pos: Point) -> Option<DragState> {
        self.boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.visible)
            .find_map(|(index, b)| {
                Corner::ALL
                    .iter()
                    .find(|&&corner| handle_contains(b.rect.corner(corner), pos, self.handle_radius))
                    .map(|&corner| DragState::DraggingCorner { corner, index })
                    .or_else(|| b.rect.contains(pos).then_some(DragState::DraggingWhole { index }))
            })
    }

    /// Start a drag. Returns `false` only for the secondary button, which
    /// leaves the press to the caller. Presses are ignored until both the
    /// image and its boxes have loaded.
    pub fn pointer_down(
        &mut self,
        pos: Point,
        button: PointerButton,
        store: &mut AnnotationStore,
    ) -> bool {
        if button == PointerButton::Secondary {
            return false;
        }
        if self.is_dragging() {
            return true;
        }
        let Some((width, height)) = self.image_size else {
            return true;
        };
        if !store.is_file_loaded() {
            return true;
        }

        self.start = pos;
        self.moved = false;
        self.crosshair = None;

        if let Some(state) = self.hit_test(pos) {
            let index = match state {
                DragState::DraggingCorner { index, .. } | DragState::DraggingWhole { index } => index,
                DragState::Idle => return true,
            };
            self.origin = self.boxes[index].rect;
            self.state = state;
            self.drag_annotations = store.annotations().to_vec();
            return true;
        }

        let corners = PixelCorners {
            x1: pos.x,
            y1: pos.y,
            x2: pos.x,
            y2: pos.y,
        };
        if let Err(e) = store.add_annotation(to_normalized(&corners, width, height)) {
            log::warn!("Cannot start a box: {}", e);
            return true;
        }
        self.rebuild(store);

        let Some(index) = self.boxes.len().checked_sub(1) else {
            return true;
        };
        self.origin = self.boxes[index].rect;
        self.drag_annotations = store.annotations().to_vec();
        self.state = DragState::DraggingCorner {
            corner: Corner::BottomRight,
            index,
        };
        true
    }

    pub fn pointer_move(&mut self, pos: Point) -> MoveOutcome {
        let (index, rect) = match self.state {
            DragState::Idle => {
                self.crosshair = Some(pos);
                return MoveOutcome::Crosshair(pos);
            }
            DragState::DraggingWhole { index } => (
                index,
                self.origin
                    .translate(pos.x - self.start.x, pos.y - self.start.y),
            ),
            DragState::DraggingCorner { corner, index } => {
                let anchor = self.origin.corner(corner.opposite());
                (index, PixelRect::from_points(anchor, pos))
            }
        };

        let Some((width, height)) = self.image_size else {
            return MoveOutcome::Rejected;
        };
        if !rect.within(width, height) {
            return MoveOutcome::Rejected;
        }

        self.boxes[index].rect = rect;
        self.moved = true;
        MoveOutcome::Moved
    }

    /// Commit the active drag, if any. Boxes other than the dragged one keep
    /// their stored points exactly, as does the dragged one when no move was
    /// accepted. A drag whose boxes were replaced in the store meanwhile is
    /// dropped.
    pub fn pointer_up(&mut self, store: &mut AnnotationStore) -> Result<bool> {
        let index = match self.state {
            DragState::Idle => return Ok(false),
            DragState::DraggingCorner { index, .. } | DragState::DraggingWhole { index } => index,
        };
        self.state = DragState::Idle;
        let started_from = std::mem::take(&mut self.drag_annotations);

        if store.annotations() != started_from.as_slice() {
            log::debug!("Boxes changed during the drag, dropping it");
            self.rebuild(store);
            return Ok(false);
        }

        let mut boxes: Vec<NormBox> = store.annotations().iter().map(|a| a.norm_box()).collect();
        if self.moved {
            if let (Some((width, height)), Some(slot)) = (self.image_size, boxes.get_mut(index)) {
                *slot = to_normalized(&self.boxes[index].rect.corners(), width, height);
            }
        }

        let result = store.update_annotations(&boxes);
        self.rebuild(store);
        result.map(|_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FilesConfig, MalformedLines};
    use crate::io::channel::testing::RecordingAccess;
    use crate::io::channel::FileEvent;
    use crate::models::session::DirFile;

    fn store_with(annotation_text: &str) -> AnnotationStore {
        let mut store = AnnotationStore::new(
            FilesConfig::default(),
            MalformedLines::Skip,
            Box::new(RecordingAccess::new()),
        );
        let file = |path: &str, mime: &str| DirFile {
            path: path.to_string(),
            name: crate::util::path::file_name(path).to_string(),
            mime_type: mime.to_string(),
            size: 1,
        };
        store
            .load_files(vec![file("/d/img.png", "image/png"), file("/d/img.txt", "text/plain")])
            .unwrap();
        store.load_file("img").unwrap();
        store.dispatch(FileEvent::ReadComplete {
            path: "/d/img.txt".to_string(),
            content: Some(annotation_text.to_string()),
        });
        store.dispatch(FileEvent::ReadComplete {
            path: "/d/img.png".to_string(),
            content: Some("aGVsbG8=".to_string()),
        });
        store
    }

    /// One box spanning 40..60 on a 100x100 image.
    fn setup() -> (BoxEditor, AnnotationStore) {
        let store = store_with("0 0.5 0.5 0.2 0.2\n");
        let mut editor = BoxEditor::new(6.0);
        editor.load_image(100, 100, &store);
        (editor, store)
    }

    fn assert_norm(actual: [f64; 4], expected: [f64; 4]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn test_rebuild_from_store() {
        let (editor, _store) = setup();
        assert_eq!(editor.boxes().len(), 1);
        let rect = editor.boxes()[0].rect;
        assert!((rect.left - 40.0).abs() < 1e-9);
        assert!((rect.width - 20.0).abs() < 1e-9);
        // No label file: the box's label was synthesized on load.
        assert_eq!(editor.boxes()[0].label, "0");
    }

    #[test]
    fn test_corner_drag_crossing_opposite_corner() {
        let (mut editor, mut store) = setup();
        assert!(editor.pointer_down(Point::new(60.0, 60.0), PointerButton::Primary, &mut store));
        assert_eq!(
            editor.state(),
            DragState::DraggingCorner {
                corner: Corner::BottomRight,
                index: 0
            }
        );

        assert_eq!(editor.pointer_move(Point::new(20.0, 30.0)), MoveOutcome::Moved);
        assert!(editor.pointer_up(&mut store).unwrap());
        assert_eq!(editor.state(), DragState::Idle);

        let points = store.annotations()[0].points;
        assert!(points[2] > 0.0 && points[3] > 0.0);
        assert_norm(points, [0.3, 0.35, 0.2, 0.1]);
        assert!(store.has_change());
    }

    #[test]
    fn test_whole_drag_outside_image_rejected() {
        let (mut editor, mut store) = setup();
        editor.pointer_down(Point::new(50.0, 50.0), PointerButton::Primary, &mut store);
        assert_eq!(editor.state(), DragState::DraggingWhole { index: 0 });

        let before = editor.boxes()[0].rect;
        assert_eq!(editor.pointer_move(Point::new(95.0, 50.0)), MoveOutcome::Rejected);
        assert_eq!(editor.boxes()[0].rect, before);

        editor.pointer_up(&mut store).unwrap();
        assert_eq!(store.annotations()[0].points, [0.5, 0.5, 0.2, 0.2]);
        assert!(!store.has_change());
    }

    #[test]
    fn test_whole_drag_translates() {
        let (mut editor, mut store) = setup();
        editor.pointer_down(Point::new(50.0, 50.0), PointerButton::Primary, &mut store);
        assert_eq!(editor.pointer_move(Point::new(95.0, 50.0)), MoveOutcome::Rejected);
        assert_eq!(editor.pointer_move(Point::new(60.0, 55.0)), MoveOutcome::Moved);
        editor.pointer_up(&mut store).unwrap();
        assert_norm(store.annotations()[0].points, [0.6, 0.55, 0.2, 0.2]);
    }

    #[test]
    fn test_click_without_move_keeps_points() {
        let store_text = "0 0.123456789 0.5 0.2 0.2\n";
        let mut store = store_with(store_text);
        let mut editor = BoxEditor::new(6.0);
        editor.load_image(333, 777, &store);

        editor.pointer_down(Point::new(41.0, 388.0), PointerButton::Primary, &mut store);
        assert_eq!(editor.state(), DragState::DraggingWhole { index: 0 });
        editor.pointer_up(&mut store).unwrap();
        assert_eq!(store.annotations()[0].points, [0.123456789, 0.5, 0.2, 0.2]);
        assert!(!store.has_change());
    }

    #[test]
    fn test_miss_creates_box_dragged_from_bottom_right() {
        let (mut editor, mut store) = setup();
        editor.pointer_down(Point::new(10.0, 10.0), PointerButton::Primary, &mut store);
        assert_eq!(store.annotations().len(), 2);
        assert_eq!(
            editor.state(),
            DragState::DraggingCorner {
                corner: Corner::BottomRight,
                index: 1
            }
        );

        editor.pointer_move(Point::new(30.0, 20.0));
        editor.pointer_up(&mut store).unwrap();
        assert_norm(store.annotations()[1].points, [0.2, 0.15, 0.2, 0.1]);
        assert_eq!(store.annotations()[1].label_index, 0);
    }

    #[test]
    fn test_overlapping_corners_resolve_to_top_left() {
        let mut store = store_with("0 0.5 0.5 0 0\n");
        let mut editor = BoxEditor::new(6.0);
        editor.load_image(100, 100, &store);

        editor.pointer_down(Point::new(51.0, 51.0), PointerButton::Primary, &mut store);
        assert_eq!(
            editor.state(),
            DragState::DraggingCorner {
                corner: Corner::TopLeft,
                index: 0
            }
        );
    }

    #[test]
    fn test_first_box_in_list_wins() {
        let mut store = store_with("0 0.5 0.5 0.4 0.4\n0 0.5 0.5 0.2 0.2\n");
        let mut editor = BoxEditor::new(6.0);
        editor.load_image(100, 100, &store);

        editor.pointer_down(Point::new(50.0, 50.0), PointerButton::Primary, &mut store);
        assert_eq!(editor.state(), DragState::DraggingWhole { index: 0 });
    }

    #[test]
    fn test_hidden_boxes_are_not_hit() {
        let (mut editor, mut store) = setup();
        store.set_visible(0, false).unwrap();
        editor.sync(&store);

        editor.pointer_down(Point::new(50.0, 50.0), PointerButton::Primary, &mut store);
        assert_eq!(store.annotations().len(), 2);
    }

    #[test]
    fn test_secondary_button_ignored() {
        let (mut editor, mut store) = setup();
        assert!(!editor.pointer_down(Point::new(10.0, 10.0), PointerButton::Secondary, &mut store));
        assert_eq!(editor.state(), DragState::Idle);
        assert_eq!(store.annotations().len(), 1);
    }

    #[test]
    fn test_second_press_while_dragging_ignored() {
        let (mut editor, mut store) = setup();
        editor.pointer_down(Point::new(50.0, 50.0), PointerButton::Primary, &mut store);
        assert!(editor.pointer_down(Point::new(5.0, 5.0), PointerButton::Primary, &mut store));
        assert_eq!(editor.state(), DragState::DraggingWhole { index: 0 });
        assert_eq!(store.annotations().len(), 1);
    }

    #[test]
    fn test_idle_move_shows_crosshair() {
        let (mut editor, mut store) = setup();
        let pos = Point::new(12.0, 34.0);
        assert_eq!(editor.pointer_move(pos), MoveOutcome::Crosshair(pos));
        assert_eq!(editor.crosshair(), Some(pos));

        editor
            .handle(PointerEvent::leave(12.0, 34.0), &mut store)
            .unwrap();
        assert_eq!(editor.crosshair(), None);
        assert!(!store.has_change());
    }

    #[test]
    fn test_leave_commits_drag() {
        let (mut editor, mut store) = setup();
        editor
            .handle(PointerEvent::down(60.0, 60.0, PointerButton::Primary), &mut store)
            .unwrap();
        editor.handle(PointerEvent::moved(70.0, 80.0), &mut store).unwrap();
        editor.handle(PointerEvent::leave(70.0, 80.0), &mut store).unwrap();

        assert_eq!(editor.state(), DragState::Idle);
        assert_norm(store.annotations()[0].points, [0.55, 0.6, 0.3, 0.4]);
    }

    #[test]
    fn test_sync_waits_for_drag_end() {
        let (mut editor, mut store) = setup();
        editor.pointer_down(Point::new(50.0, 50.0), PointerButton::Primary, &mut store);
        store.add_label();
        editor.sync(&store);
        assert_eq!(editor.state(), DragState::DraggingWhole { index: 0 });
        editor.pointer_up(&mut store).unwrap();
        editor.sync(&store);
        assert_eq!(editor.boxes().len(), 1);
    }

    #[test]
    fn test_press_before_boxes_load_is_ignored() {
        let mut store = AnnotationStore::new(
            FilesConfig::default(),
            MalformedLines::Skip,
            Box::new(RecordingAccess::new()),
        );
        let file = |path: &str, mime: &str| DirFile {
            path: path.to_string(),
            name: crate::util::path::file_name(path).to_string(),
            mime_type: mime.to_string(),
            size: 1,
        };
        store
            .load_files(vec![file("/d/img.png", "image/png"), file("/d/img.txt", "text/plain")])
            .unwrap();
        store.load_file("img").unwrap();
        store.dispatch(FileEvent::ReadComplete {
            path: "/d/img.png".to_string(),
            content: Some("aGVsbG8=".to_string()),
        });
        let mut editor = BoxEditor::new(6.0);
        editor.load_image(100, 100, &store);

        assert!(editor.pointer_down(Point::new(10.0, 10.0), PointerButton::Primary, &mut store));
        assert_eq!(editor.state(), DragState::Idle);
        assert!(store.annotations().is_empty());

        store.dispatch(FileEvent::ReadComplete {
            path: "/d/img.txt".to_string(),
            content: Some("0 0.5 0.5 0.2 0.2\n".to_string()),
        });
        editor.sync(&store);
        assert_eq!(editor.boxes().len(), 1);
        assert_eq!(store.annotations()[0].points, [0.5, 0.5, 0.2, 0.2]);
        assert!(!store.has_change());
    }

    #[test]
    fn test_undo_during_drag_drops_the_drag() {
        let mut store = store_with("0 0.5 0.5 0.2 0.2\n0 0.2 0.2 0.1 0.1\n");
        let mut editor = BoxEditor::new(6.0);
        editor.load_image(100, 100, &store);

        store.remove_annotation(0).unwrap();
        editor.sync(&store);
        assert_eq!(editor.boxes().len(), 1);

        editor.pointer_down(Point::new(20.0, 20.0), PointerButton::Primary, &mut store);
        assert_eq!(editor.state(), DragState::DraggingWhole { index: 0 });
        assert_eq!(editor.pointer_move(Point::new(30.0, 30.0)), MoveOutcome::Moved);
        store.undo();

        assert!(!editor.pointer_up(&mut store).unwrap());
        assert_eq!(editor.state(), DragState::Idle);
        let points: Vec<[f64; 4]> = store.annotations().iter().map(|a| a.points).collect();
        assert_eq!(points, vec![[0.5, 0.5, 0.2, 0.2], [0.2, 0.2, 0.1, 0.1]]);
        assert!(!store.has_change());
        assert_eq!(editor.boxes().len(), 2);
    }
}
