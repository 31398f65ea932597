// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the bounding boxes drawn over an image and the class
//! labels they refer to.

use crate::util::geometry::NormBox;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self::new(rng.gen(), rng.gen(), rng.gen())
    }

    /// Perceived brightness test used to pick dark or light text.
    pub fn is_light(&self) -> bool {
        let brightness =
            (self.r as u32 * 299 + self.g as u32 * 587 + self.b as u32 * 114) / 1000;
        brightness >= 128
    }
}

/// Colors given to the first labels; later labels get a random color.
pub const LABEL_PALETTE: [Rgb; 3] = [
    Rgb::new(111, 78, 55), // coffee
    Rgb::new(226, 61, 40), // chill red
    Rgb::new(255, 191, 0), // amber
];

/// Color for the label at `position`.
pub fn label_color(position: usize) -> Rgb {
    LABEL_PALETTE
        .get(position)
        .copied()
        .unwrap_or_else(Rgb::random)
}

/// A class label. `id` equals the label's position in the label list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: usize,
    pub name: String,
    pub color: Rgb,
}

impl Label {
    /// Create the label that belongs at `position`.
    pub fn new(position: usize, name: impl Into<String>) -> Self {
        Self {
            id: position,
            name: name.into(),
            color: label_color(position),
        }
    }
}

/// A bounding box tagged with a label index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub label_index: usize,
    /// `[x_center, y_center, width, height]`, normalized.
    pub points: [f64; 4],
    pub visible: bool,
}

impl Annotation {
    pub fn new(label_index: usize, norm: NormBox) -> Self {
        Self {
            label_index,
            points: norm.to_points(),
            visible: true,
        }
    }

    pub fn norm_box(&self) -> NormBox {
        NormBox::from_points(self.points)
    }
}

/// Stable sort grouping boxes by label index.
pub fn sort_by_label(annotations: &mut [Annotation]) {
    annotations.sort_by_key(|a| a.label_index);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_then_random() {
        assert_eq!(Label::new(0, "a").color, Rgb::new(111, 78, 55));
        assert_eq!(Label::new(1, "b").color, Rgb::new(226, 61, 40));
        assert_eq!(Label::new(2, "c").color, Rgb::new(255, 191, 0));
        // Past the palette any color is acceptable; only the id is fixed.
        assert_eq!(Label::new(3, "d").id, 3);
    }

    #[test]
    fn test_is_light() {
        assert!(Rgb::new(255, 191, 0).is_light());
        assert!(!Rgb::new(111, 78, 55).is_light());
    }

    #[test]
    fn test_sort_by_label_is_stable() {
        let mut boxes = vec![
            Annotation::new(1, NormBox::new(0.1, 0.1, 0.1, 0.1)),
            Annotation::new(0, NormBox::new(0.2, 0.2, 0.1, 0.1)),
            Annotation::new(1, NormBox::new(0.3, 0.3, 0.1, 0.1)),
            Annotation::new(0, NormBox::new(0.4, 0.4, 0.1, 0.1)),
        ];
        sort_by_label(&mut boxes);
        let centers: Vec<f64> = boxes.iter().map(|a| a.points[0]).collect();
        assert_eq!(centers, vec![0.2, 0.4, 0.1, 0.3]);
    }
}
