// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Path string helpers.
//!
//! Paths cross the file channel as plain strings and completions are matched
//! by string equality, so these helpers work on `&str` and accept both `/`
//! and `\` separators.

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Last path segment.
pub fn file_name(path: &str) -> &str {
    path.rsplit(is_separator).next().unwrap_or(path)
}

/// Text after the last `.` of the file name, if any.
pub fn extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    name.rsplit_once('.').map(|(_, ext)| ext)
}

/// File name with its extension stripped; images and their sidecar
/// annotation files share this name.
pub fn capture_name(path: &str) -> &str {
    let name = file_name(path);
    match name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => name,
    }
}

/// Directory part of `path`, without the trailing separator.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind(is_separator) {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Join a directory and a file name with `/`.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Longest run of leading segments shared by every path, joined with `/`.
pub fn find_common_path<S: AsRef<str>>(paths: &[S]) -> String {
    let split: Vec<Vec<&str>> = paths
        .iter()
        .map(|p| p.as_ref().split(is_separator).collect())
        .collect();

    let Some(first) = split.first() else {
        return String::new();
    };
    let min_len = split.iter().map(Vec::len).min().unwrap_or(0);

    let common: Vec<&str> = (0..min_len)
        .take_while(|&i| split.iter().all(|segments| segments[i] == first[i]))
        .map(|i| first[i])
        .collect();

    common.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_name_and_extension() {
        assert_eq!(file_name("/data/set/cat_01.jpg"), "cat_01.jpg");
        assert_eq!(extension("/data/set/cat_01.jpg"), Some("jpg"));
        assert_eq!(capture_name("/data/set/cat_01.jpg"), "cat_01");
        assert_eq!(capture_name("/data/set/archive.tar.gz"), "archive.tar");
        assert_eq!(capture_name("C:\\set\\dog.txt"), "dog");
        assert_eq!(extension("/data/README"), None);
        assert_eq!(capture_name("/data/README"), "README");
    }

    #[test]
    fn test_parent_dir_and_join() {
        assert_eq!(parent_dir("/data/set/a.png"), "/data/set");
        assert_eq!(parent_dir("a.png"), "");
        assert_eq!(join("/data/set", "classes.labels"), "/data/set/classes.labels");
    }

    #[test]
    fn test_find_common_path() {
        let dirs = ["/data/set/train", "/data/set/val", "/data/set"];
        assert_eq!(find_common_path(&dirs), "/data/set");
        assert_eq!(find_common_path(&["/data/set"]), "/data/set");
        assert_eq!(find_common_path::<&str>(&[]), "");
    }
}
