// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Coordinate and path helpers shared by the editor and the store.

pub mod geometry;
pub mod path;
