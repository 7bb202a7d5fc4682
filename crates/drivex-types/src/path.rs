//! Slash-delimited path helpers.
//!
//! Leading, trailing, and repeated slashes are insignificant: `"/a//b/"` and
//! `"a/b"` both split into `["a", "b"]`.

/// Split a path into its non-empty segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// The folder part of a file path.
///
/// Keeps a leading `/` when the input has one.
///
/// ```
/// use drivex_types::folder_from;
///
/// assert_eq!(folder_from("/a/b/r.txt"), "/a/b");
/// assert_eq!(folder_from("a//b/r.txt"), "a/b");
/// assert_eq!(folder_from("/r.txt"), "/");
/// ```
pub fn folder_from(path: &str) -> String {
    let parts = segments(path);
    let prefix = if path.starts_with('/') { "/" } else { "" };
    let folder = match parts.split_last() {
        Some((_, rest)) => rest.join("/"),
        None => String::new(),
    };
    format!("{prefix}{folder}")
}

/// The final segment of a path, if any.
pub fn name_from(path: &str) -> Option<&str> {
    segments(path).last().copied()
}
