// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for boxes, labels and the directory session.

pub mod annotation;
pub mod history;
pub mod session;
pub mod store;
