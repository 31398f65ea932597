// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Box editing: pointer input and the drag state machine.

pub mod drag;
pub mod input;

pub use drag::{BoxEditor, EditorBox};
pub use input::{PointerButton, PointerEvent};
