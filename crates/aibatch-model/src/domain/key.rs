//! Object key helpers.
//!
//! Bucket object keys always use `/` separators, never start or end with one
//! and contain no empty, `.` or `..` segments.

/// Normalize a user supplied object path into key form.
///
/// `\` is treated as a separator, empty and `.` segments are dropped and `..`
/// removes the previous segment (never escaping the root).
pub fn normalize_key(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Join a user supplied base path and a relative key.
///
/// Only `base` is normalized. `rel` must already be in key form (built from
/// path components), so characters such as `\` inside a file name survive.
pub fn join_key(base: &str, rel: &str) -> String {
    let base = normalize_key(base);
    match (base.is_empty(), rel.is_empty()) {
        (true, _) => rel.to_string(),
        (false, true) => base,
        (false, false) => format!("{base}/{rel}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_and_duplicate_separators() {
        assert_eq!(normalize_key("model/"), "model");
        assert_eq!(normalize_key("/a//b/"), "a/b");
        assert_eq!(normalize_key("a\\b\\c"), "a/b/c");
    }

    #[test]
    fn resolves_dot_segments() {
        assert_eq!(normalize_key("./a/./b"), "a/b");
        assert_eq!(normalize_key("a/../b"), "b");
        assert_eq!(normalize_key("../../a"), "a");
    }

    #[test]
    fn join_handles_empty_sides() {
        assert_eq!(join_key("", "saved_model.pb"), "saved_model.pb");
        assert_eq!(join_key("model/", ""), "model");
        assert_eq!(join_key("model/", "variables/v.data"), "model/variables/v.data");
    }

    #[test]
    fn join_keeps_relative_key_verbatim() {
        assert_eq!(join_key("model", "a\\b.txt"), "model/a\\b.txt");
        assert_eq!(join_key("./model//", "x..y/z.pb"), "model/x..y/z.pb");
    }
}
