// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! File access: the request/completion channel, its disk backend, image
//! decoding and the text formats.

pub mod channel;
pub mod disk;
pub mod media;
pub mod serialization;
