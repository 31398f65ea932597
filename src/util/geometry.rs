// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the coordinate transformations between normalized
//! boxes (center and size as fractions of the image) and pixel rectangles,
//! plus the small rectangle algebra the box editor works with.

use serde::{Deserialize, Serialize};

/// A point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A box in normalized center form, every component a fraction of the image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormBox {
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl NormBox {
    pub fn new(x_center: f64, y_center: f64, width: f64, height: f64) -> Self {
        Self {
            x_center,
            y_center,
            width,
            height,
        }
    }

    /// Build from the stored `[x_center, y_center, width, height]` order.
    pub fn from_points(points: [f64; 4]) -> Self {
        Self::new(points[0], points[1], points[2], points[3])
    }

    pub fn to_points(self) -> [f64; 4] {
        [self.x_center, self.y_center, self.width, self.height]
    }
}

/// Two opposite corners in pixels, in no particular order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelCorners {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// One of the four resize handles of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Hit-test order: overlapping handles resolve to the first entry.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }
}

/// An axis-aligned rectangle in pixels with non-negative size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rectangle spanned by two arbitrary points; crossing is canonicalized.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn from_corners(corners: &PixelCorners) -> Self {
        Self::from_points(
            Point::new(corners.x1, corners.y1),
            Point::new(corners.x2, corners.y2),
        )
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn corners(&self) -> PixelCorners {
        PixelCorners {
            x1: self.left,
            y1: self.top,
            x2: self.right(),
            y2: self.bottom(),
        }
    }

    pub fn corner(&self, corner: Corner) -> Point {
        match corner {
            Corner::TopLeft => Point::new(self.left, self.top),
            Corner::TopRight => Point::new(self.right(), self.top),
            Corner::BottomLeft => Point::new(self.left, self.bottom()),
            Corner::BottomRight => Point::new(self.right(), self.bottom()),
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.left + dx, self.top + dy, self.width, self.height)
    }

    /// Strict interior test; points on the border are not inside.
    pub fn contains(&self, point: Point) -> bool {
        point.x > self.left && point.x < self.right() && point.y > self.top && point.y < self.bottom()
    }

    /// Whether the whole rectangle lies within `[0, width] x [0, height]`.
    pub fn within(&self, width: u32, height: u32) -> bool {
        self.left >= 0.0
            && self.top >= 0.0
            && self.right() <= width as f64
            && self.bottom() <= height as f64
    }
}

/// Whether `point` falls in the open square of half-size `radius` around `center`.
pub fn handle_contains(center: Point, point: Point, radius: f64) -> bool {
    point.x > center.x - radius
        && point.x < center.x + radius
        && point.y > center.y - radius
        && point.y < center.y + radius
}

/// Convert a normalized box to pixel corners. No clamping is applied.
pub fn to_pixels(norm: &NormBox, width: u32, height: u32) -> PixelCorners {
    let (w_img, h_img) = (width as f64, height as f64);
    let w_box = norm.width * w_img;
    let h_box = norm.height * h_img;

    PixelCorners {
        x1: norm.x_center * w_img - w_box / 2.0,
        y1: norm.y_center * h_img - h_box / 2.0,
        x2: norm.x_center * w_img + w_box / 2.0,
        y2: norm.y_center * h_img + h_box / 2.0,
    }
}

/// Convert pixel corners to a normalized box.
///
/// Corners are canonicalized first, so a drag that crossed over itself still
/// yields a positive size. `width` and `height` must be non-zero.
pub fn to_normalized(corners: &PixelCorners, width: u32, height: u32) -> NormBox {
    let (w_img, h_img) = (width as f64, height as f64);
    let x_tl = corners.x1.min(corners.x2);
    let x_br = corners.x1.max(corners.x2);
    let y_tl = corners.y1.min(corners.y2);
    let y_br = corners.y1.max(corners.y2);

    let w_box = x_br - x_tl;
    let h_box = y_br - y_tl;

    NormBox {
        x_center: (x_tl + w_box / 2.0) / w_img,
        y_center: (y_tl + h_box / 2.0) / h_img,
        width: w_box / w_img,
        height: h_box / h_img,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &NormBox, b: &NormBox) {
        assert!((a.x_center - b.x_center).abs() < 1e-9, "{:?} != {:?}", a, b);
        assert!((a.y_center - b.y_center).abs() < 1e-9, "{:?} != {:?}", a, b);
        assert!((a.width - b.width).abs() < 1e-9, "{:?} != {:?}", a, b);
        assert!((a.height - b.height).abs() < 1e-9, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_to_pixels_center_box() {
        let corners = to_pixels(&NormBox::new(0.5, 0.5, 0.2, 0.4), 1000, 500);
        assert!((corners.x1 - 400.0).abs() < 1e-9);
        assert!((corners.x2 - 600.0).abs() < 1e-9);
        assert!((corners.y1 - 150.0).abs() < 1e-9);
        assert!((corners.y2 - 350.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_denormalize_roundtrip() {
        let boxes = [
            NormBox::new(0.5, 0.5, 0.2, 0.2),
            NormBox::new(0.1, 0.1, 0.05, 0.05),
            NormBox::new(0.73, 0.31, 0.4, 0.6),
        ];
        for (width, height) in [(1920, 1080), (7, 3), (640, 640)] {
            for norm in &boxes {
                let back = to_normalized(&to_pixels(norm, width, height), width, height);
                assert_close(&back, norm);
            }
        }
    }

    #[test]
    fn test_to_normalized_tolerates_crossed_corners() {
        let crossed = PixelCorners {
            x1: 300.0,
            y1: 200.0,
            x2: 100.0,
            y2: 50.0,
        };
        let norm = to_normalized(&crossed, 400, 400);
        assert!(norm.width > 0.0 && norm.height > 0.0);
        assert_close(&norm, &NormBox::new(0.5, 0.3125, 0.5, 0.375));
    }

    #[test]
    fn test_rect_from_points_canonicalizes() {
        let rect = PixelRect::from_points(Point::new(10.0, 40.0), Point::new(2.0, 8.0));
        assert_eq!(rect, PixelRect::new(2.0, 8.0, 8.0, 32.0));
        assert_eq!(rect.corner(Corner::BottomRight), Point::new(10.0, 40.0));
    }

    #[test]
    fn test_rect_within_bounds() {
        assert!(PixelRect::new(0.0, 0.0, 100.0, 50.0).within(100, 50));
        assert!(!PixelRect::new(-0.5, 0.0, 10.0, 10.0).within(100, 50));
        assert!(!PixelRect::new(95.0, 0.0, 10.0, 10.0).within(100, 50));
    }

    #[test]
    fn test_handle_contains_is_open_square() {
        let center = Point::new(10.0, 10.0);
        assert!(handle_contains(center, Point::new(15.9, 4.1), 6.0));
        assert!(!handle_contains(center, Point::new(16.0, 10.0), 6.0));
    }
}
