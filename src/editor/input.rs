// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Unified pointer input.
//!
//! Mouse and touch input are folded into one event shape by the canvas
//! adapter, already converted to image pixel coordinates.

use crate::util::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Left mouse button or a touch.
    Primary,
    /// Right mouse button; never starts a drag.
    Secondary,
    /// No button involved, as for moves and leaves.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub button: PointerButton,
    pub kind: PointerKind,
}

impl PointerEvent {
    pub fn down(x: f64, y: f64, button: PointerButton) -> Self {
        Self {
            x,
            y,
            button,
            kind: PointerKind::Down,
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            button: PointerButton::None,
            kind: PointerKind::Move,
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            button: PointerButton::None,
            kind: PointerKind::Up,
        }
    }

    pub fn leave(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            button: PointerButton::None,
            kind: PointerKind::Leave,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}
