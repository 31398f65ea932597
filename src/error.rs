// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Errors raised by the annotation store and the text formats.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{kind} index {index} is out of range (len {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    #[error("label {0} is still referenced by a box at or above its position")]
    LabelInUse(usize),

    #[error("the last remaining label cannot be removed")]
    LastLabel,

    #[error("no images in this directory")]
    EmptyDirectory,

    #[error("expected {expected} boxes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("no file is loaded")]
    NoFileLoaded,

    #[error("invalid label name {0:?}")]
    InvalidLabelName(String),

    #[error("unknown image {0:?}")]
    UnknownFile(String),

    #[error("malformed annotation on line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
