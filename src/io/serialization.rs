// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation, label and marker file formats.
//!
//! Annotation files hold one box per line as
//! `label x_center y_center width height`; label files hold one class name
//! per line, the line position being the label id; the marker file holds the
//! capture name of the last saved image.

use crate::config::MalformedLines;
use crate::error::{Result, StoreError};
use crate::models::annotation::{Annotation, Label};
use crate::util::geometry::NormBox;

fn parse_line(line: &str) -> Option<Annotation> {
    let mut tokens = line.split_whitespace();
    let label_index = tokens.next()?.parse::<usize>().ok()?;

    let mut points = [0.0; 4];
    for slot in points.iter_mut() {
        let value = tokens.next()?.parse::<f64>().ok()?;
        if !value.is_finite() {
            return None;
        }
        *slot = value;
    }
    if tokens.next().is_some() {
        return None;
    }

    Some(Annotation::new(label_index, NormBox::from_points(points)))
}

/// Parse annotation text. Blank lines are skipped; malformed lines are
/// skipped or rejected according to `policy`.
pub fn parse_annotations(text: &str, policy: MalformedLines) -> Result<Vec<Annotation>> {
    let mut annotations = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(annotation) => annotations.push(annotation),
            None => match policy {
                MalformedLines::Skip => {
                    log::warn!("Skipping malformed annotation line {}: {:?}", idx + 1, line);
                }
                MalformedLines::Reject => {
                    return Err(StoreError::MalformedLine {
                        line: idx + 1,
                        content: line.to_string(),
                    });
                }
            },
        }
    }

    Ok(annotations)
}

/// Format boxes as annotation text, one newline-terminated line per box.
pub fn format_annotations(annotations: &[Annotation]) -> String {
    annotations
        .iter()
        .map(|a| {
            let [x, y, w, h] = a.points;
            format!("{} {} {} {} {}\n", a.label_index, x, y, w, h)
        })
        .collect()
}

/// Parse a label file; blank lines are skipped and positions become ids.
pub fn parse_labels(text: &str) -> Vec<Label> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(position, name)| Label::new(position, name))
        .collect()
}

pub fn format_labels(labels: &[Label]) -> String {
    labels.iter().map(|l| format!("{}\n", l.name)).collect()
}

/// First non-blank line of the marker file.
pub fn parse_marker(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "0 0.5 0.5 0.2 0.2\n1 0.1 0.1 0.05 0.05\n";

    #[test]
    fn test_parse_annotations() {
        let boxes = parse_annotations(SAMPLE, MalformedLines::Skip).unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].label_index, 0);
        assert_eq!(boxes[1].points, [0.1, 0.1, 0.05, 0.05]);
        assert!(boxes.iter().all(|b| b.visible));
    }

    #[test]
    fn test_format_reproduces_input() {
        let boxes = parse_annotations(SAMPLE, MalformedLines::Skip).unwrap();
        assert_eq!(format_annotations(&boxes), SAMPLE);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let text = "\n0 0.5 0.5 0.2 0.2\n   \n\n";
        let boxes = parse_annotations(text, MalformedLines::Reject).unwrap();
        assert_eq!(boxes.len(), 1);
    }

    #[test]
    fn test_malformed_line_skip() {
        let text = "0 0.5 0.5 0.2 0.2\n1 abc 0.1 0.05 0.05\n2 0.3 0.3 0.1\n";
        let boxes = parse_annotations(text, MalformedLines::Skip).unwrap();
        assert_eq!(boxes.len(), 1);
    }

    #[test]
    fn test_malformed_line_reject() {
        let text = "0 0.5 0.5 0.2 0.2\n1 NaN 0.1 0.05 0.05\n";
        let err = parse_annotations(text, MalformedLines::Reject).unwrap_err();
        assert_eq!(
            err,
            StoreError::MalformedLine {
                line: 2,
                content: "1 NaN 0.1 0.05 0.05".to_string()
            }
        );
    }

    #[test]
    fn test_labels_roundtrip() {
        let labels = parse_labels("cat\r\ndog\n\n");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1].id, 1);
        assert_eq!(labels[1].name, "dog");
        assert_eq!(format_labels(&labels), "cat\ndog\n");
    }

    #[test]
    fn test_parse_marker() {
        assert_eq!(parse_marker("\nimg_004\n"), "img_004");
        assert_eq!(parse_marker(""), "");
    }
}
