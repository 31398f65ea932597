// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Change tracking for unsaved-changes detection and undo.
//!
//! The tracker keeps one baseline copy of the labels and boxes, taken when a
//! file finishes loading and moved forward on every save. The live state is
//! dirty whenever it differs from that baseline; undo restores it.

use super::annotation::{Annotation, Label};

/// Owned copy of the labels and boxes at a point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub labels: Vec<Label>,
    pub annotations: Vec<Annotation>,
}

impl Snapshot {
    pub fn new(labels: &[Label], annotations: &[Annotation]) -> Self {
        Self {
            labels: labels.to_vec(),
            annotations: annotations.to_vec(),
        }
    }

    /// Ordered comparison against live state, box visibility included.
    pub fn matches(&self, labels: &[Label], annotations: &[Annotation]) -> bool {
        self.labels == labels && self.annotations == annotations
    }
}

/// Baseline holder for the currently loaded file.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    baseline: Option<Snapshot>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self { baseline: None }
    }

    /// Replace the whole baseline with a copy of the given state.
    pub fn snapshot(&mut self, labels: &[Label], annotations: &[Annotation]) {
        self.baseline = Some(Snapshot::new(labels, annotations));
    }

    /// Move only the label half of the baseline, used when the label file
    /// finishes loading independently of the annotation file.
    pub fn rebase_labels(&mut self, labels: &[Label]) {
        self.baseline.get_or_insert_with(Snapshot::default).labels = labels.to_vec();
    }

    /// Move only the box half of the baseline.
    pub fn rebase_annotations(&mut self, annotations: &[Annotation]) {
        self.baseline
            .get_or_insert_with(Snapshot::default)
            .annotations = annotations.to_vec();
    }

    /// Whether the live state differs from the baseline. Without a baseline
    /// nothing can be unsaved.
    pub fn is_dirty(&self, labels: &[Label], annotations: &[Annotation]) -> bool {
        self.baseline
            .as_ref()
            .is_some_and(|baseline| !baseline.matches(labels, annotations))
    }

    /// Copy of the baseline for undo.
    pub fn restore(&self) -> Option<Snapshot> {
        self.baseline.clone()
    }

    pub fn clear(&mut self) {
        self.baseline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::geometry::NormBox;

    fn boxes() -> Vec<Annotation> {
        vec![
            Annotation::new(0, NormBox::new(0.5, 0.5, 0.2, 0.2)),
            Annotation::new(1, NormBox::new(0.1, 0.1, 0.05, 0.05)),
        ]
    }

    #[test]
    fn test_no_baseline_is_clean() {
        let tracker = ChangeTracker::new();
        assert!(!tracker.is_dirty(&[], &boxes()));
    }

    #[test]
    fn test_dirty_on_geometry_label_and_order() {
        let labels = vec![Label::new(0, "cat"), Label::new(1, "dog")];
        let mut tracker = ChangeTracker::new();
        tracker.snapshot(&labels, &boxes());
        assert!(!tracker.is_dirty(&labels, &boxes()));

        let mut moved = boxes();
        moved[0].points[0] = 0.6;
        assert!(tracker.is_dirty(&labels, &moved));

        let mut relabeled = boxes();
        relabeled[1].label_index = 0;
        assert!(tracker.is_dirty(&labels, &relabeled));

        let mut reordered = boxes();
        reordered.swap(0, 1);
        assert!(tracker.is_dirty(&labels, &reordered));

        let mut renamed = labels.clone();
        renamed[1].name = "wolf".to_string();
        assert!(tracker.is_dirty(&renamed, &boxes()));
    }

    #[test]
    fn test_visibility_is_a_change() {
        let mut tracker = ChangeTracker::new();
        tracker.snapshot(&[], &boxes());
        let mut hidden = boxes();
        hidden[0].visible = false;
        assert!(tracker.is_dirty(&[], &hidden));
        hidden[0].visible = true;
        assert!(!tracker.is_dirty(&[], &hidden));
    }

    #[test]
    fn test_rebase_halves_independently() {
        let labels = vec![Label::new(0, "cat")];
        let mut tracker = ChangeTracker::new();
        tracker.snapshot(&labels, &[]);
        tracker.rebase_annotations(&boxes());
        assert!(!tracker.is_dirty(&labels, &boxes()));

        let more = vec![Label::new(0, "cat"), Label::new(1, "dog")];
        tracker.rebase_labels(&more);
        assert!(!tracker.is_dirty(&more, &boxes()));
        assert!(tracker.is_dirty(&labels, &boxes()));
    }

    #[test]
    fn test_restore_is_an_independent_copy() {
        let mut tracker = ChangeTracker::new();
        tracker.snapshot(&[], &boxes());
        let mut restored = tracker.restore().unwrap();
        restored.annotations.clear();
        assert_eq!(tracker.restore().unwrap().annotations.len(), 2);
    }
}
